use dashmap::DashMap;
use log::{debug, error, info};
use std::sync::Arc;

use super::currency_model::Currency;
use super::currency_traits::{CurrencyRepositoryTrait, CurrencyServiceTrait};
use crate::errors::Result;
use crate::fx::FxError;
use crate::market_data::{parse_currencies, MarketDataProvider};

/// Currency catalog backed by the store, with an in-memory valid-code set
/// for cheap validation on the request path.
pub struct CurrencyService {
    repository: Arc<dyn CurrencyRepositoryTrait>,
    provider: Arc<dyn MarketDataProvider>,
    valid_codes: DashMap<String, String>,
}

impl CurrencyService {
    pub fn new(
        repository: Arc<dyn CurrencyRepositoryTrait>,
        provider: Arc<dyn MarketDataProvider>,
    ) -> Self {
        CurrencyService {
            repository,
            provider,
            valid_codes: DashMap::new(),
        }
    }

    async fn bootstrap_from_provider(&self) -> Result<()> {
        let xml = match self.provider.fetch_currencies().await {
            Ok(xml) => xml,
            Err(e) => {
                // A dead source must not block startup; validation will
                // report the catalog as unavailable until a later refresh.
                error!("Failed to fetch currency catalog: {}", e);
                return Ok(());
            }
        };

        let currencies = parse_currencies(&xml);
        if currencies.is_empty() {
            error!("Currency catalog response contained no usable currencies");
            return Ok(());
        }

        let inserted = self.repository.save_all(&currencies)?;
        info!(
            "Bootstrapped currency catalog: {} currencies ({} inserted)",
            currencies.len(),
            inserted
        );
        Ok(())
    }
}

#[async_trait::async_trait]
impl CurrencyServiceTrait for CurrencyService {
    async fn load(&self) -> Result<()> {
        if self.repository.get_all()?.is_empty() {
            self.bootstrap_from_provider().await?;
        }
        self.refresh()
    }

    fn refresh(&self) -> Result<()> {
        let currencies = self.repository.get_all()?;

        self.valid_codes.clear();
        for currency in &currencies {
            self.valid_codes
                .insert(currency.code.clone(), currency.name.clone());
        }

        debug!("Loaded {} currencies into catalog", self.valid_codes.len());
        Ok(())
    }

    fn validate(&self, code: &str) -> Result<String> {
        let code = code.trim().to_uppercase();

        if self.valid_codes.is_empty() {
            return Err(FxError::CatalogUnavailable.into());
        }
        if !self.valid_codes.contains_key(&code) {
            return Err(FxError::InvalidCurrency(code).into());
        }
        Ok(code)
    }

    fn get_currencies(&self) -> Result<Vec<Currency>> {
        let currencies = self.repository.get_all()?;
        if currencies.is_empty() {
            return Err(FxError::CatalogUnavailable.into());
        }
        Ok(currencies)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::market_data::MarketDataError;
    use async_trait::async_trait;
    use chrono::NaiveDate;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    struct MockCurrencyRepository {
        currencies: Mutex<Vec<Currency>>,
    }

    impl MockCurrencyRepository {
        fn new(currencies: Vec<Currency>) -> Self {
            MockCurrencyRepository {
                currencies: Mutex::new(currencies),
            }
        }
    }

    impl CurrencyRepositoryTrait for MockCurrencyRepository {
        fn get_all(&self) -> Result<Vec<Currency>> {
            Ok(self.currencies.lock().unwrap().clone())
        }

        fn save_all(&self, items: &[Currency]) -> Result<usize> {
            let mut stored = self.currencies.lock().unwrap();
            let mut inserted = 0;
            for item in items {
                if !stored.iter().any(|c| c.code == item.code) {
                    stored.push(item.clone());
                    inserted += 1;
                }
            }
            Ok(inserted)
        }
    }

    struct MockProvider {
        currencies_xml: std::result::Result<String, MarketDataError>,
        fetch_count: AtomicUsize,
    }

    impl MockProvider {
        fn with_xml(xml: &str) -> Self {
            MockProvider {
                currencies_xml: Ok(xml.to_string()),
                fetch_count: AtomicUsize::new(0),
            }
        }

        fn unavailable() -> Self {
            MockProvider {
                currencies_xml: Err(MarketDataError::Unavailable("down".to_string())),
                fetch_count: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl MarketDataProvider for MockProvider {
        async fn fetch_currencies(&self) -> std::result::Result<String, MarketDataError> {
            self.fetch_count.fetch_add(1, Ordering::SeqCst);
            match &self.currencies_xml {
                Ok(xml) => Ok(xml.clone()),
                Err(_) => Err(MarketDataError::Unavailable("down".to_string())),
            }
        }

        async fn fetch_rate(
            &self,
            _currency: &str,
            _date: NaiveDate,
        ) -> std::result::Result<String, MarketDataError> {
            unimplemented!()
        }

        async fn fetch_rate_history(
            &self,
            _currency: &str,
            _start_date: NaiveDate,
            _end_date: NaiveDate,
        ) -> std::result::Result<String, MarketDataError> {
            unimplemented!()
        }

        async fn fetch_rates_on_date(&self, _date: NaiveDate) -> std::result::Result<String, MarketDataError> {
            unimplemented!()
        }
    }

    const CODELIST_XML: &str = "<Structure><Structures><Codelists><Codelist>\
        <Code id=\"USD\"><Name lang=\"en\">US Dollar</Name></Code>\
        <Code id=\"GBP\"><Name lang=\"en\">British Pound</Name></Code>\
        </Codelist></Codelists></Structures></Structure>";

    #[tokio::test]
    async fn load_empty_store_bootstraps_from_provider() {
        let repository = Arc::new(MockCurrencyRepository::new(vec![]));
        let provider = Arc::new(MockProvider::with_xml(CODELIST_XML));
        let service = CurrencyService::new(repository.clone(), provider.clone());

        service.load().await.unwrap();

        assert_eq!(provider.fetch_count.load(Ordering::SeqCst), 1);
        assert_eq!(repository.get_all().unwrap().len(), 2);
        assert_eq!(service.validate("usd").unwrap(), "USD");
    }

    #[tokio::test]
    async fn load_populated_store_skips_provider() {
        let repository = Arc::new(MockCurrencyRepository::new(vec![Currency::new(
            "CHF",
            "Swiss Franc",
        )]));
        let provider = Arc::new(MockProvider::with_xml(CODELIST_XML));
        let service = CurrencyService::new(repository, provider.clone());

        service.load().await.unwrap();

        assert_eq!(provider.fetch_count.load(Ordering::SeqCst), 0);
        assert_eq!(service.validate("chf").unwrap(), "CHF");
    }

    #[tokio::test]
    async fn load_survives_unavailable_provider() {
        let repository = Arc::new(MockCurrencyRepository::new(vec![]));
        let provider = Arc::new(MockProvider::unavailable());
        let service = CurrencyService::new(repository, provider);

        service.load().await.unwrap();

        assert!(matches!(
            service.validate("USD"),
            Err(crate::errors::Error::Fx(FxError::CatalogUnavailable))
        ));
    }

    #[tokio::test]
    async fn validate_unknown_code_is_rejected() {
        let repository = Arc::new(MockCurrencyRepository::new(vec![Currency::new(
            "USD",
            "US Dollar",
        )]));
        let provider = Arc::new(MockProvider::with_xml(CODELIST_XML));
        let service = CurrencyService::new(repository, provider);
        service.load().await.unwrap();

        assert!(matches!(
            service.validate("ZZZ"),
            Err(crate::errors::Error::Fx(FxError::InvalidCurrency(code))) if code == "ZZZ"
        ));
    }

    #[tokio::test]
    async fn get_currencies_empty_store_reports_unavailable() {
        let repository = Arc::new(MockCurrencyRepository::new(vec![]));
        let provider = Arc::new(MockProvider::unavailable());
        let service = CurrencyService::new(repository, provider);

        assert!(matches!(
            service.get_currencies(),
            Err(crate::errors::Error::Fx(FxError::CatalogUnavailable))
        ));
    }
}
