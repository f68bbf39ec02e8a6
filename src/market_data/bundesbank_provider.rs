use async_trait::async_trait;
use chrono::NaiveDate;
use log::{debug, error, info, warn};
use reqwest::header::HeaderMap;
use reqwest::StatusCode;
use std::time::Duration;

use super::market_data_errors::MarketDataError;
use super::market_data_provider::MarketDataProvider;

const DEFAULT_BASE_URL: &str = "https://api.statistiken.bundesbank.de/rest";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
const MAX_ATTEMPTS: u32 = 3;
const INITIAL_BACKOFF: Duration = Duration::from_secs(1);
const MAX_BACKOFF: Duration = Duration::from_secs(10);

/// Client for the Bundesbank SDMX REST API. Retries and backoff live here;
/// callers never retry on top of this boundary.
pub struct BundesbankProvider {
    client: reqwest::Client,
    base_url: String,
}

impl BundesbankProvider {
    pub fn new() -> Result<Self, MarketDataError> {
        Self::with_base_url(
            std::env::var("BUNDESBANK_API_BASE_URL")
                .unwrap_or_else(|_| DEFAULT_BASE_URL.to_string()),
        )
    }

    pub fn with_base_url(base_url: impl Into<String>) -> Result<Self, MarketDataError> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(MarketDataError::NetworkError)?;

        Ok(BundesbankProvider {
            client,
            base_url: base_url.into(),
        })
    }

    async fn execute_get(&self, path: &str) -> Result<String, MarketDataError> {
        let url = format!("{}{}", self.base_url, path);
        let mut backoff = INITIAL_BACKOFF;

        for attempt in 1..=MAX_ATTEMPTS {
            info!("Executing Bundesbank API request: {}", url);

            match self.client.get(&url).send().await {
                Ok(response) => {
                    log_rate_limit_headers(response.headers());
                    let status = response.status();

                    if status.is_success() {
                        return response.text().await.map_err(MarketDataError::NetworkError);
                    }

                    if status == StatusCode::TOO_MANY_REQUESTS {
                        let retry_after = response
                            .headers()
                            .get("Retry-After")
                            .and_then(|v| v.to_str().ok())
                            .map(|v| format!(", retry after {} seconds", v))
                            .unwrap_or_default();
                        error!("Bundesbank API rate limit exceeded{}", retry_after);
                        return Err(MarketDataError::RateLimitExceeded(retry_after));
                    }

                    let body = response.text().await.unwrap_or_default();
                    error!("Bundesbank API error: {} - {}", status, body);

                    if !status.is_server_error() || attempt == MAX_ATTEMPTS {
                        return Err(MarketDataError::ProviderError(format!(
                            "API error: {} - {}",
                            status, body
                        )));
                    }
                }
                Err(e) => {
                    error!("Failed to fetch data from Bundesbank API: {}", e);
                    if attempt == MAX_ATTEMPTS {
                        return Err(MarketDataError::Unavailable(e.to_string()));
                    }
                }
            }

            debug!(
                "Retrying Bundesbank API request in {:?} (attempt {}/{})",
                backoff, attempt, MAX_ATTEMPTS
            );
            tokio::time::sleep(backoff).await;
            backoff = std::cmp::min(backoff * 2, MAX_BACKOFF);
        }

        Err(MarketDataError::Unavailable(
            "retry attempts exhausted".to_string(),
        ))
    }
}

#[async_trait]
impl MarketDataProvider for BundesbankProvider {
    async fn fetch_currencies(&self) -> Result<String, MarketDataError> {
        debug!("Fetching currencies from Bundesbank API");
        self.execute_get("/metadata/codelist/BBK/CL_BBK_STD_CURRENCY")
            .await
    }

    async fn fetch_rate(
        &self,
        currency: &str,
        date: NaiveDate,
    ) -> Result<String, MarketDataError> {
        debug!("Fetching exchange rate for {} on {}", currency, date);
        let path = format!(
            "/data/BBEX3/D.{}.EUR.BB.AC.000?startPeriod={}&endPeriod={}",
            currency.to_uppercase(),
            date,
            date
        );
        self.execute_get(&path).await
    }

    async fn fetch_rate_history(
        &self,
        currency: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<String, MarketDataError> {
        debug!(
            "Fetching exchange rates for {} from {} to {}",
            currency, start_date, end_date
        );
        // The series key wildcards the currency dimension, so the response
        // carries every currency that matches the query shape.
        let path = format!(
            "/data/BBEX3/D..{}.BB.AC.000?startPeriod={}&endPeriod={}",
            currency.to_uppercase(),
            start_date,
            end_date
        );
        self.execute_get(&path).await
    }

    async fn fetch_rates_on_date(&self, date: NaiveDate) -> Result<String, MarketDataError> {
        debug!("Fetching all exchange rates on {}", date);
        let path = format!(
            "/data/BBEX3/D..EUR.BB.AC.000?startPeriod={}&endPeriod={}",
            date, date
        );
        self.execute_get(&path).await
    }
}

fn log_rate_limit_headers(headers: &HeaderMap) {
    let header = |name: &str| headers.get(name).and_then(|v| v.to_str().ok());

    if let Some(remaining) = header("X-RateLimit-Remaining") {
        info!(
            "Bundesbank API rate limit: {}/{}, resets at {}",
            remaining,
            header("X-RateLimit-Limit").unwrap_or("?"),
            header("X-RateLimit-Reset").unwrap_or("?")
        );
        if let Ok(remaining_val) = remaining.parse::<i64>() {
            if remaining_val < 10 {
                warn!(
                    "Approaching Bundesbank API rate limit! {} requests remaining",
                    remaining
                );
            }
        }
    }
}
