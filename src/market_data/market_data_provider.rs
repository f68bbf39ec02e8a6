use async_trait::async_trait;
use chrono::NaiveDate;

use super::market_data_errors::MarketDataError;

/// Contract for the external market data source. Implementations return the
/// raw document body; parsing lives in [`super::sdmx_parser`].
#[async_trait]
pub trait MarketDataProvider: Send + Sync {
    /// Fetch the full currency code list.
    async fn fetch_currencies(&self) -> Result<String, MarketDataError>;

    /// Fetch the quote for one currency on one date (zero-or-one observation).
    async fn fetch_rate(&self, currency: &str, date: NaiveDate)
        -> Result<String, MarketDataError>;

    /// Fetch all observations in a date range. The response is a single
    /// multi-currency batch, not filtered to the requested currency.
    async fn fetch_rate_history(
        &self,
        currency: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<String, MarketDataError>;

    /// Fetch the quotes of every currency on one date.
    async fn fetch_rates_on_date(&self, date: NaiveDate) -> Result<String, MarketDataError>;
}
