use diesel::prelude::*;
use serde::{Deserialize, Serialize};

use crate::schema::currencies;

/// A currency known to the catalog. Created once at bootstrap and immutable
/// afterwards.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Currency {
    pub code: String,
    pub name: String,
}

impl Currency {
    pub fn new(code: impl Into<String>, name: impl Into<String>) -> Self {
        Currency {
            code: code.into(),
            name: name.into(),
        }
    }
}

#[derive(
    Queryable, Identifiable, Insertable, Selectable, Debug, Clone, PartialEq, Eq,
)]
#[diesel(table_name = currencies)]
#[diesel(primary_key(code))]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct CurrencyDB {
    pub code: String,
    pub name: String,
}

impl From<CurrencyDB> for Currency {
    fn from(db: CurrencyDB) -> Self {
        Currency {
            code: db.code,
            name: db.name,
        }
    }
}

impl From<&Currency> for CurrencyDB {
    fn from(currency: &Currency) -> Self {
        CurrencyDB {
            code: currency.code.clone(),
            name: currency.name.clone(),
        }
    }
}
