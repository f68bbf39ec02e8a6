use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, Pool};
use diesel::sqlite::SqliteConnection;
use std::sync::Arc;

use super::currency_model::{Currency, CurrencyDB};
use super::currency_traits::CurrencyRepositoryTrait;
use crate::db::get_connection;
use crate::errors::Result;
use crate::schema::currencies;

pub struct CurrencyRepository {
    pool: Arc<Pool<ConnectionManager<SqliteConnection>>>,
}

impl CurrencyRepository {
    pub fn new(pool: Arc<Pool<ConnectionManager<SqliteConnection>>>) -> Self {
        Self { pool }
    }
}

impl CurrencyRepositoryTrait for CurrencyRepository {
    fn get_all(&self) -> Result<Vec<Currency>> {
        let mut conn = get_connection(&self.pool)?;

        let rows = currencies::table
            .order(currencies::code.asc())
            .load::<CurrencyDB>(&mut conn)?;

        Ok(rows.into_iter().map(Currency::from).collect())
    }

    fn save_all(&self, items: &[Currency]) -> Result<usize> {
        if items.is_empty() {
            return Ok(0);
        }

        let mut conn = get_connection(&self.pool)?;

        let rows: Vec<CurrencyDB> = items.iter().map(CurrencyDB::from).collect();

        // Currencies are immutable once created; re-running the bootstrap
        // must not touch existing rows.
        let inserted = diesel::insert_or_ignore_into(currencies::table)
            .values(&rows)
            .execute(&mut conn)?;

        Ok(inserted)
    }
}
