use async_trait::async_trait;
use chrono::NaiveDate;
use rust_decimal::Decimal;

use super::fx_model::{ConversionResult, DatePage, ExchangeRate, RatesHistoryPage, RatesOnDate};
use crate::errors::Result;

/// Contract for exchange rate persistence.
pub trait FxRepositoryTrait: Send + Sync {
    /// The quote for one pair on one date, if stored.
    fn find_rate(&self, base: &str, target: &str, date: NaiveDate)
        -> Result<Option<ExchangeRate>>;

    /// Every stored quote against `base` on `date`.
    fn find_rates_on_date(&self, base: &str, date: NaiveDate) -> Result<Vec<ExchangeRate>>;

    /// Every stored quote against `base` on any of `dates`.
    fn find_rates_for_dates(&self, base: &str, dates: &[NaiveDate]) -> Result<Vec<ExchangeRate>>;

    /// One page of distinct quote dates in `[start, end]`, newest first.
    fn distinct_dates_in_range(
        &self,
        base: &str,
        start: NaiveDate,
        end: NaiveDate,
        page: i64,
        size: i64,
    ) -> Result<DatePage>;

    /// Earliest and latest stored quote date in `[start, end]`.
    fn min_max_date_in_range(
        &self,
        base: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<(Option<NaiveDate>, Option<NaiveDate>)>;

    /// Insert a quote unless the pair/date row already exists. Returns
    /// whether a row was written.
    fn save_if_absent(&self, rate: &ExchangeRate) -> Result<bool>;

    /// Batch variant of [`Self::save_if_absent`]. Returns the number of
    /// rows written.
    fn save_all_if_absent(&self, rates: &[ExchangeRate]) -> Result<usize>;
}

/// Contract for rate resolution and conversion.
#[async_trait]
pub trait FxServiceTrait: Send + Sync {
    /// Bootstrap the currency catalog.
    async fn initialize(&self) -> Result<()>;

    /// Resolve the base-to-`currency` quote on `date`, consulting the store
    /// first and the external source on a miss.
    async fn get_rate(&self, currency: &str, date: NaiveDate) -> Result<ExchangeRate>;

    /// All quotes against the base currency on `date`. The currency is
    /// validated but the response spans every quoted currency.
    async fn get_rates_on_date(&self, currency: &str, date: NaiveDate) -> Result<RatesOnDate>;

    /// Paginated rate history over `[start_date, end_date]`.
    async fn get_rate_history(
        &self,
        currency: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
        page: i64,
        size: i64,
    ) -> Result<RatesHistoryPage>;

    /// Convert `amount` from one currency to another using the quotes
    /// of `date`.
    async fn convert(
        &self,
        amount: Decimal,
        from_currency: &str,
        to_currency: &str,
        date: NaiveDate,
    ) -> Result<ConversionResult>;
}
