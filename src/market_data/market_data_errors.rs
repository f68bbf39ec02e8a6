use thiserror::Error;

#[derive(Error, Debug)]
pub enum MarketDataError {
    #[error("Network error: {0}")]
    NetworkError(#[from] reqwest::Error),

    #[error("Provider error: {0}")]
    ProviderError(String),

    #[error("Rate limit exceeded{0}")]
    RateLimitExceeded(String),

    #[error("Parsing error: {0}")]
    ParsingError(String),

    #[error("Market data source unavailable: {0}")]
    Unavailable(String),
}
