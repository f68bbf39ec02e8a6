use async_trait::async_trait;

use super::currency_model::Currency;
use crate::errors::Result;

/// Contract for currency persistence.
pub trait CurrencyRepositoryTrait: Send + Sync {
    fn get_all(&self) -> Result<Vec<Currency>>;
    fn save_all(&self, currencies: &[Currency]) -> Result<usize>;
}

/// Contract for the currency catalog.
#[async_trait]
pub trait CurrencyServiceTrait: Send + Sync {
    /// Bootstrap the catalog from the market data source if the store is
    /// empty, then refresh the in-memory valid-code set.
    async fn load(&self) -> Result<()>;

    /// Reload the valid-code set from the store.
    fn refresh(&self) -> Result<()>;

    /// Normalize a currency code and check it against the loaded catalog.
    fn validate(&self, code: &str) -> Result<String>;

    fn get_currencies(&self) -> Result<Vec<Currency>>;
}
