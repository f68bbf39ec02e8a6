use async_trait::async_trait;
use chrono::NaiveDate;
use log::{debug, info, warn};
use rust_decimal::Decimal;
use std::collections::BTreeMap;
use std::sync::Arc;

use super::completeness::is_range_complete;
use super::conversion::{Conversion, CurrencyConverter};
use super::fx_errors::FxError;
use super::fx_model::{ConversionResult, ExchangeRate, RatesHistoryPage, RatesOnDate};
use super::fx_traits::{FxRepositoryTrait, FxServiceTrait};
use super::history_cache::{history_key, HistoryCache};
use crate::constants::{BASE_CURRENCY, MIN_SUPPORTED_DATE};
use crate::currencies::CurrencyServiceTrait;
use crate::errors::{Result, ValidationError};
use crate::market_data::{parse_exchange_rates, MarketDataProvider};

const NO_RATES_MESSAGE: &str =
    "No rates available for this date. It may be a weekend or public holiday.";

/// Rate resolution and conversion, orchestrated cache-aside: the store is
/// consulted first, the external source only on a miss, and fetched quotes
/// are persisted for the next caller.
pub struct FxService {
    repository: Arc<dyn FxRepositoryTrait>,
    provider: Arc<dyn MarketDataProvider>,
    currency_service: Arc<dyn CurrencyServiceTrait>,
    history_cache: HistoryCache<RatesHistoryPage>,
}

impl FxService {
    pub fn new(
        repository: Arc<dyn FxRepositoryTrait>,
        provider: Arc<dyn MarketDataProvider>,
        currency_service: Arc<dyn CurrencyServiceTrait>,
    ) -> Self {
        Self::with_history_cache(repository, provider, currency_service, HistoryCache::new())
    }

    pub fn with_history_cache(
        repository: Arc<dyn FxRepositoryTrait>,
        provider: Arc<dyn MarketDataProvider>,
        currency_service: Arc<dyn CurrencyServiceTrait>,
        history_cache: HistoryCache<RatesHistoryPage>,
    ) -> Self {
        FxService {
            repository,
            provider,
            currency_service,
            history_cache,
        }
    }

    async fn fetch_and_store_rate(
        &self,
        currency: &str,
        date: NaiveDate,
    ) -> Result<ExchangeRate> {
        info!("Rate for {} on {} not stored, fetching", currency, date);

        let xml = self.provider.fetch_rate(currency, date).await?;
        let rate = parse_exchange_rates(&xml)
            .into_iter()
            .find(|r| r.target_currency == currency && r.date == date)
            .ok_or_else(|| FxError::RateNotFound {
                currency: currency.to_string(),
                date,
            })?;

        self.repository.save_if_absent(&rate)?;
        Ok(rate)
    }

    async fn resolve_rate(&self, currency: &str, date: NaiveDate) -> Result<ExchangeRate> {
        if let Some(rate) = self.repository.find_rate(BASE_CURRENCY, currency, date)? {
            debug!("Rate for {} on {} served from store", currency, date);
            return Ok(rate);
        }
        self.fetch_and_store_rate(currency, date).await
    }

    fn validate_range(
        start_date: NaiveDate,
        end_date: NaiveDate,
        page: i64,
        size: i64,
    ) -> Result<()> {
        if start_date > end_date {
            return Err(ValidationError::InvalidInput(format!(
                "start date {} is after end date {}",
                start_date, end_date
            ))
            .into());
        }
        if start_date < MIN_SUPPORTED_DATE {
            return Err(ValidationError::InvalidInput(format!(
                "start date {} is before the earliest supported date {}",
                start_date, MIN_SUPPORTED_DATE
            ))
            .into());
        }
        if page < 0 || size <= 0 {
            return Err(ValidationError::InvalidInput(format!(
                "invalid pagination window: page {}, size {}",
                page, size
            ))
            .into());
        }
        Ok(())
    }

    async fn ensure_range_stored(
        &self,
        currency: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<()> {
        let (min_stored, max_stored) =
            self.repository
                .min_max_date_in_range(BASE_CURRENCY, start_date, end_date)?;

        if is_range_complete(start_date, end_date, min_stored, max_stored) {
            debug!(
                "Range {} to {} already covered by the store",
                start_date, end_date
            );
            return Ok(());
        }

        info!(
            "Range {} to {} not fully stored, fetching from source",
            start_date, end_date
        );
        let xml = self
            .provider
            .fetch_rate_history(currency, start_date, end_date)
            .await?;

        let rates = parse_exchange_rates(&xml);
        if rates.is_empty() {
            warn!("Source returned no rates for {} to {}", start_date, end_date);
            return Ok(());
        }

        let inserted = self.repository.save_all_if_absent(&rates)?;
        debug!("Stored {} of {} fetched rates", inserted, rates.len());
        Ok(())
    }
}

#[async_trait]
impl FxServiceTrait for FxService {
    async fn initialize(&self) -> Result<()> {
        self.currency_service.load().await
    }

    async fn get_rate(&self, currency: &str, date: NaiveDate) -> Result<ExchangeRate> {
        let currency = self.currency_service.validate(currency)?;
        self.resolve_rate(&currency, date).await
    }

    async fn get_rates_on_date(&self, currency: &str, date: NaiveDate) -> Result<RatesOnDate> {
        self.currency_service.validate(currency)?;

        let mut stored = self.repository.find_rates_on_date(BASE_CURRENCY, date)?;

        if stored.is_empty() {
            info!("No rates stored for {}, fetching from source", date);
            let xml = self.provider.fetch_rates_on_date(date).await?;
            let fetched = parse_exchange_rates(&xml);
            if !fetched.is_empty() {
                self.repository.save_all_if_absent(&fetched)?;
            }
            stored = fetched;
        }

        let rates: BTreeMap<String, Decimal> = stored
            .into_iter()
            .filter(|r| r.date == date)
            .map(|r| (r.target_currency, r.rate))
            .collect();

        let message = rates.is_empty().then(|| NO_RATES_MESSAGE.to_string());

        Ok(RatesOnDate {
            base_currency: BASE_CURRENCY.to_string(),
            date,
            rates,
            message,
        })
    }

    async fn get_rate_history(
        &self,
        currency: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
        page: i64,
        size: i64,
    ) -> Result<RatesHistoryPage> {
        Self::validate_range(start_date, end_date, page, size)?;
        let currency = self.currency_service.validate(currency)?;

        let key = history_key(start_date, end_date, page, size);
        if let Some(cached) = self.history_cache.get(&key) {
            debug!("Rate history served from cache: {}", key);
            return Ok(cached);
        }

        self.ensure_range_stored(&currency, start_date, end_date).await?;

        let date_page =
            self.repository
                .distinct_dates_in_range(BASE_CURRENCY, start_date, end_date, page, size)?;

        let mut rates: BTreeMap<NaiveDate, BTreeMap<String, Decimal>> = date_page
            .dates
            .iter()
            .map(|d| (*d, BTreeMap::new()))
            .collect();

        for rate in self
            .repository
            .find_rates_for_dates(BASE_CURRENCY, &date_page.dates)?
        {
            if let Some(by_currency) = rates.get_mut(&rate.date) {
                by_currency.insert(rate.target_currency, rate.rate);
            }
        }

        let total_pages = if date_page.total_elements == 0 {
            0
        } else {
            (date_page.total_elements + size - 1) / size
        };

        let response = RatesHistoryPage {
            base_currency: BASE_CURRENCY.to_string(),
            start_date,
            end_date,
            rates,
            page,
            size,
            total_elements: date_page.total_elements,
            total_pages,
        };

        self.history_cache.put(key, response.clone());
        Ok(response)
    }

    async fn convert(
        &self,
        amount: Decimal,
        from_currency: &str,
        to_currency: &str,
        date: NaiveDate,
    ) -> Result<ConversionResult> {
        if amount <= Decimal::ZERO {
            return Err(
                ValidationError::InvalidInput("amount must be positive".to_string()).into(),
            );
        }

        let from = from_currency.trim().to_uppercase();
        let to = to_currency.trim().to_uppercase();

        let conversion: Conversion = if from == BASE_CURRENCY {
            let rate = self.get_rate(&to, date).await?;
            CurrencyConverter::from_base(amount, rate.rate)
        } else if to == BASE_CURRENCY {
            let rate = self.get_rate(&from, date).await?;
            CurrencyConverter::to_base(amount, rate.rate)?
        } else {
            let from_rate = self.get_rate(&from, date).await?;
            let to_rate = self.get_rate(&to, date).await?;
            CurrencyConverter::cross(amount, from_rate.rate, to_rate.rate)?
        };

        Ok(ConversionResult {
            from_currency: from,
            to_currency: to,
            original_amount: amount,
            converted_amount: conversion.converted_amount,
            exchange_rate: conversion.exchange_rate,
            date,
        })
    }
}
