use chrono::NaiveDate;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum FxError {
    #[error("No exchange rate found for {currency} on {date}")]
    RateNotFound { currency: String, date: NaiveDate },

    #[error("Invalid currency code: {0}")]
    InvalidCurrency(String),

    #[error("Currency catalog is unavailable")]
    CatalogUnavailable,

    #[error("Conversion error: {0}")]
    ConversionError(String),
}
