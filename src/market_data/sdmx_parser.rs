use chrono::NaiveDate;
use log::{error, warn};
use rust_decimal::Decimal;
use serde::Deserialize;
use std::str::FromStr;

use crate::constants::BASE_CURRENCY;
use crate::currencies::Currency;
use crate::fx::ExchangeRate;

const CURRENCY_DIMENSION_ID: &str = "BBK_STD_CURRENCY";
const ENGLISH_LANG: &str = "en";

// Structure document (codelist metadata)

#[derive(Deserialize, Debug)]
struct StructureXml {
    #[serde(rename = "Structures")]
    structures: Option<StructuresXml>,
}

#[derive(Deserialize, Debug)]
struct StructuresXml {
    #[serde(rename = "Codelists")]
    codelists: Option<CodelistsXml>,
}

#[derive(Deserialize, Debug)]
struct CodelistsXml {
    #[serde(rename = "Codelist", default)]
    codelists: Vec<CodelistXml>,
}

#[derive(Deserialize, Debug)]
struct CodelistXml {
    #[serde(rename = "Code", default)]
    codes: Vec<CodeXml>,
}

#[derive(Deserialize, Debug)]
struct CodeXml {
    id: Option<String>,
    #[serde(rename = "Name", default)]
    names: Vec<NameXml>,
}

#[derive(Deserialize, Debug)]
struct NameXml {
    lang: Option<String>,
    #[serde(rename = "$value")]
    value: Option<String>,
}

impl CodeXml {
    fn english_name(&self) -> Option<&str> {
        self.names
            .iter()
            .find(|n| n.lang.as_deref() == Some(ENGLISH_LANG))
            .and_then(|n| n.value.as_deref())
    }
}

// GenericData document (rate observations)

#[derive(Deserialize, Debug)]
struct GenericDataXml {
    #[serde(rename = "DataSet")]
    data_set: Option<DataSetXml>,
}

#[derive(Deserialize, Debug)]
struct DataSetXml {
    #[serde(rename = "Series", default)]
    series: Vec<SeriesXml>,
}

#[derive(Deserialize, Debug)]
struct SeriesXml {
    #[serde(rename = "SeriesKey")]
    series_key: Option<SeriesKeyXml>,
    #[serde(rename = "Obs", default)]
    observations: Vec<ObservationXml>,
}

#[derive(Deserialize, Debug)]
struct SeriesKeyXml {
    #[serde(rename = "Value", default)]
    values: Vec<KeyValueXml>,
}

#[derive(Deserialize, Debug)]
struct KeyValueXml {
    id: Option<String>,
    value: Option<String>,
}

#[derive(Deserialize, Debug)]
struct ObservationXml {
    #[serde(rename = "ObsDimension")]
    dimension: Option<ObsDimensionXml>,
    #[serde(rename = "ObsValue")]
    obs_value: Option<ObsValueXml>,
}

#[derive(Deserialize, Debug)]
struct ObsDimensionXml {
    value: Option<String>,
}

#[derive(Deserialize, Debug)]
struct ObsValueXml {
    value: Option<String>,
}

impl SeriesXml {
    fn currency(&self) -> Option<&str> {
        self.series_key.as_ref().and_then(|key| {
            key.values
                .iter()
                .find(|v| v.id.as_deref() == Some(CURRENCY_DIMENSION_ID))
                .and_then(|v| v.value.as_deref())
        })
    }
}

/// Parse a Bundesbank codelist document into currencies. Malformed input
/// yields an empty list, never an error.
pub fn parse_currencies(xml: &str) -> Vec<Currency> {
    let structure: StructureXml = match serde_xml_rs::from_str(xml) {
        Ok(parsed) => parsed,
        Err(e) => {
            error!("Failed to parse currencies XML: {}", e);
            return Vec::new();
        }
    };

    structure
        .structures
        .and_then(|s| s.codelists)
        .map(|c| c.codelists)
        .unwrap_or_default()
        .iter()
        .flat_map(|codelist| &codelist.codes)
        .filter_map(|code| {
            let id = code.id.as_deref()?;
            if !is_valid_currency_code(id) {
                return None;
            }
            let name = code.english_name()?;
            Some(Currency::new(id, name))
        })
        .collect()
}

/// Parse a Bundesbank GenericData document into exchange rates. Malformed
/// documents yield an empty list; malformed individual observations are
/// skipped with a warning.
pub fn parse_exchange_rates(xml: &str) -> Vec<ExchangeRate> {
    let data: GenericDataXml = match serde_xml_rs::from_str(xml) {
        Ok(parsed) => parsed,
        Err(e) => {
            error!("Failed to parse exchange rates XML: {}", e);
            return Vec::new();
        }
    };

    let series = data.data_set.map(|d| d.series).unwrap_or_default();

    let mut rates = Vec::new();
    for entry in &series {
        let Some(currency) = entry.currency() else {
            continue;
        };

        for obs in &entry.observations {
            match parse_observation(obs, currency) {
                Some(rate) => rates.push(rate),
                None => warn!("Failed to parse observation for targetCurrency={}", currency),
            }
        }
    }
    rates
}

fn parse_observation(obs: &ObservationXml, target_currency: &str) -> Option<ExchangeRate> {
    let date = obs.dimension.as_ref()?.value.as_deref()?;
    let value = obs.obs_value.as_ref()?.value.as_deref()?;

    let date = NaiveDate::from_str(date).ok()?;
    let rate = Decimal::from_str(value).ok()?;

    Some(ExchangeRate::new(BASE_CURRENCY, target_currency, rate, date))
}

fn is_valid_currency_code(code: &str) -> bool {
    code.len() == 3 && !code.starts_with('_') && code.chars().all(|c| c.is_alphabetic())
}
