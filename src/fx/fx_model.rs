use chrono::{NaiveDate, NaiveDateTime, Utc};
use diesel::prelude::*;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;
use std::str::FromStr;

use crate::constants::RATE_DECIMAL_PRECISION;
use crate::schema::exchange_rates;

/// One daily quote: 1 unit of `base_currency` = `rate` units of
/// `target_currency`. At most one quote per currency pair per day;
/// rows are append-only.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ExchangeRate {
    pub id: String,
    pub base_currency: String,
    pub target_currency: String,
    #[serde(
        deserialize_with = "deserialize_rate",
        serialize_with = "serialize_rate"
    )]
    pub rate: Decimal,
    pub date: NaiveDate,
}

impl ExchangeRate {
    pub fn new(
        base_currency: impl Into<String>,
        target_currency: impl Into<String>,
        rate: Decimal,
        date: NaiveDate,
    ) -> Self {
        let base_currency = base_currency.into();
        let target_currency = target_currency.into();
        ExchangeRate {
            id: Self::make_rate_id(&base_currency, &target_currency, date),
            base_currency,
            target_currency,
            rate,
            date,
        }
    }

    pub fn make_rate_id(base: &str, target: &str, date: NaiveDate) -> String {
        format!("{}_{}_{}", date.format("%Y%m%d"), base, target)
    }
}

#[derive(Queryable, Identifiable, Insertable, Selectable, Debug, Clone)]
#[diesel(table_name = exchange_rates)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct ExchangeRateDB {
    pub id: String,
    pub base_currency: String,
    pub target_currency: String,
    pub rate: String,
    pub date: NaiveDate,
    pub created_at: NaiveDateTime,
}

impl From<ExchangeRateDB> for ExchangeRate {
    fn from(db: ExchangeRateDB) -> Self {
        let rate = Decimal::from_str(&db.rate).unwrap_or_else(|e| {
            log::error!("Invalid stored rate '{}' for {}: {}", db.rate, db.id, e);
            Decimal::ZERO
        });

        ExchangeRate {
            id: db.id,
            base_currency: db.base_currency,
            target_currency: db.target_currency,
            rate,
            date: db.date,
        }
    }
}

impl From<&ExchangeRate> for ExchangeRateDB {
    fn from(rate: &ExchangeRate) -> Self {
        ExchangeRateDB {
            id: rate.id.clone(),
            base_currency: rate.base_currency.clone(),
            target_currency: rate.target_currency.clone(),
            rate: rate.rate.to_string(),
            date: rate.date,
            created_at: Utc::now().naive_utc(),
        }
    }
}

/// One page of distinct quote dates plus the total count over the range.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatePage {
    pub dates: Vec<NaiveDate>,
    pub total_elements: i64,
}

/// Assembled range response: dates paginated descending, each date carrying
/// the rates of every target currency quoted on it.
#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RatesHistoryPage {
    pub base_currency: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub rates: BTreeMap<NaiveDate, BTreeMap<String, Decimal>>,
    pub page: i64,
    pub size: i64,
    pub total_elements: i64,
    pub total_pages: i64,
}

/// All rates quoted against the base currency on a single date.
#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RatesOnDate {
    pub base_currency: String,
    pub date: NaiveDate,
    pub rates: BTreeMap<String, Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ConversionResult {
    pub from_currency: String,
    pub to_currency: String,
    pub original_amount: Decimal,
    pub converted_amount: Decimal,
    pub exchange_rate: Decimal,
    pub date: NaiveDate,
}

fn deserialize_rate<'de, D>(deserializer: D) -> Result<Decimal, D::Error>
where
    D: Deserializer<'de>,
{
    let decimal = <Decimal as Deserialize>::deserialize(deserializer)?;
    Ok(decimal.round_dp_with_strategy(
        RATE_DECIMAL_PRECISION,
        RoundingStrategy::MidpointAwayFromZero,
    ))
}

fn serialize_rate<S>(rate: &Decimal, serializer: S) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    // Stored rates carry at most 6 decimal places
    Serialize::serialize(
        &rate.round_dp_with_strategy(
            RATE_DECIMAL_PRECISION,
            RoundingStrategy::MidpointAwayFromZero,
        ),
        serializer,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn day15() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, 15).unwrap()
    }

    #[test]
    fn exchange_rate_serializes_camel_case_with_six_decimal_rate() {
        let rate = ExchangeRate::new("EUR", "USD", dec!(1.08564789), day15());

        let value = serde_json::to_value(&rate).unwrap();

        assert_eq!(value["id"], "20240115_EUR_USD");
        assert_eq!(value["baseCurrency"], "EUR");
        assert_eq!(value["targetCurrency"], "USD");
        assert_eq!(value["date"], "2024-01-15");
        let serialized_rate = value["rate"].as_f64().unwrap();
        assert!((serialized_rate - 1.085648).abs() < 1e-9);
    }

    #[test]
    fn exchange_rate_deserializes_and_rounds_the_rate_half_up() {
        let json = r#"{
            "id": "20240115_EUR_USD",
            "baseCurrency": "EUR",
            "targetCurrency": "USD",
            "rate": 1.08564789,
            "date": "2024-01-15"
        }"#;

        let rate: ExchangeRate = serde_json::from_str(json).unwrap();

        assert_eq!(rate.rate, dec!(1.085648));
        assert_eq!(rate.target_currency, "USD");
    }

    #[test]
    fn conversion_result_serializes_camel_case() {
        let result = ConversionResult {
            from_currency: "USD".to_string(),
            to_currency: "EUR".to_string(),
            original_amount: dec!(10),
            converted_amount: dec!(9.2115),
            exchange_rate: dec!(1.0856),
            date: day15(),
        };

        let value = serde_json::to_value(&result).unwrap();

        assert_eq!(value["fromCurrency"], "USD");
        assert_eq!(value["toCurrency"], "EUR");
        assert!((value["convertedAmount"].as_f64().unwrap() - 9.2115).abs() < 1e-9);
        assert!((value["exchangeRate"].as_f64().unwrap() - 1.0856).abs() < 1e-9);
    }

    #[test]
    fn rates_on_date_omits_the_message_when_rates_exist() {
        let mut rates = BTreeMap::new();
        rates.insert("USD".to_string(), dec!(1.0856));
        let response = RatesOnDate {
            base_currency: "EUR".to_string(),
            date: day15(),
            rates,
            message: None,
        };

        let value = serde_json::to_value(&response).unwrap();

        assert_eq!(value["baseCurrency"], "EUR");
        assert!(value.get("message").is_none());
    }
}
