use chrono::NaiveDate;
use diesel::dsl::{count_distinct, max, min};
use diesel::prelude::*;
use std::sync::Arc;

use super::fx_model::{DatePage, ExchangeRate, ExchangeRateDB};
use super::fx_traits::FxRepositoryTrait;
use crate::db::{get_connection, DbPool, DbTransactionExecutor};
use crate::errors::Result;
use crate::schema::exchange_rates::dsl::*;

pub struct FxRepository {
    pool: Arc<DbPool>,
}

impl FxRepository {
    pub fn new(pool: Arc<DbPool>) -> Self {
        Self { pool }
    }
}

impl FxRepositoryTrait for FxRepository {
    fn find_rate(
        &self,
        base: &str,
        target: &str,
        quote_date: NaiveDate,
    ) -> Result<Option<ExchangeRate>> {
        let mut conn = get_connection(&self.pool)?;

        let row = exchange_rates
            .filter(base_currency.eq(base))
            .filter(target_currency.eq(target))
            .filter(date.eq(quote_date))
            .first::<ExchangeRateDB>(&mut conn)
            .optional()?;

        Ok(row.map(ExchangeRate::from))
    }

    fn find_rates_on_date(&self, base: &str, quote_date: NaiveDate) -> Result<Vec<ExchangeRate>> {
        let mut conn = get_connection(&self.pool)?;

        let rows = exchange_rates
            .filter(base_currency.eq(base))
            .filter(date.eq(quote_date))
            .order(target_currency.asc())
            .load::<ExchangeRateDB>(&mut conn)?;

        Ok(rows.into_iter().map(ExchangeRate::from).collect())
    }

    fn find_rates_for_dates(&self, base: &str, dates: &[NaiveDate]) -> Result<Vec<ExchangeRate>> {
        if dates.is_empty() {
            return Ok(Vec::new());
        }

        let mut conn = get_connection(&self.pool)?;

        let rows = exchange_rates
            .filter(base_currency.eq(base))
            .filter(date.eq_any(dates))
            .order((date.desc(), target_currency.asc()))
            .load::<ExchangeRateDB>(&mut conn)?;

        Ok(rows.into_iter().map(ExchangeRate::from).collect())
    }

    fn distinct_dates_in_range(
        &self,
        base: &str,
        start: NaiveDate,
        end: NaiveDate,
        page: i64,
        size: i64,
    ) -> Result<DatePage> {
        let mut conn = get_connection(&self.pool)?;

        let dates = exchange_rates
            .filter(base_currency.eq(base))
            .filter(date.ge(start))
            .filter(date.le(end))
            .select(date)
            .distinct()
            .order(date.desc())
            .limit(size)
            .offset(page * size)
            .load::<NaiveDate>(&mut conn)?;

        let total_elements = exchange_rates
            .filter(base_currency.eq(base))
            .filter(date.ge(start))
            .filter(date.le(end))
            .select(count_distinct(date))
            .first::<i64>(&mut conn)?;

        Ok(DatePage {
            dates,
            total_elements,
        })
    }

    fn min_max_date_in_range(
        &self,
        base: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<(Option<NaiveDate>, Option<NaiveDate>)> {
        let mut conn = get_connection(&self.pool)?;

        let bounds = exchange_rates
            .filter(base_currency.eq(base))
            .filter(date.ge(start))
            .filter(date.le(end))
            .select((min(date), max(date)))
            .first::<(Option<NaiveDate>, Option<NaiveDate>)>(&mut conn)?;

        Ok(bounds)
    }

    fn save_if_absent(&self, rate_to_save: &ExchangeRate) -> Result<bool> {
        let mut conn = get_connection(&self.pool)?;

        // The unique (base, target, date) index makes concurrent writers of
        // the same quote converge on a single row.
        let inserted = diesel::insert_into(exchange_rates)
            .values(ExchangeRateDB::from(rate_to_save))
            .on_conflict_do_nothing()
            .execute(&mut conn)?;

        Ok(inserted > 0)
    }

    fn save_all_if_absent(&self, rates: &[ExchangeRate]) -> Result<usize> {
        if rates.is_empty() {
            return Ok(0);
        }

        let rows: Vec<ExchangeRateDB> = rates.iter().map(ExchangeRateDB::from).collect();

        self.pool.execute(|conn| {
            diesel::insert_or_ignore_into(exchange_rates)
                .values(&rows)
                .execute(conn)
                .map_err(crate::errors::Error::from)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::run_migrations;
    use diesel::r2d2::{ConnectionManager, Pool};
    use rust_decimal_macros::dec;

    fn setup_pool() -> Arc<DbPool> {
        let manager = ConnectionManager::<SqliteConnection>::new(":memory:");
        let pool = Pool::builder()
            .max_size(1)
            .build(manager)
            .expect("Failed to create test pool");
        run_migrations(&pool).expect("Failed to run migrations");
        Arc::new(pool)
    }

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, d).unwrap()
    }

    #[test]
    fn save_if_absent_is_idempotent() {
        let repository = FxRepository::new(setup_pool());
        let quote = ExchangeRate::new("EUR", "USD", dec!(1.0856), day(15));

        assert!(repository.save_if_absent(&quote).unwrap());

        let replay = ExchangeRate::new("EUR", "USD", dec!(9.9999), day(15));
        assert!(!repository.save_if_absent(&replay).unwrap());

        let stored = repository.find_rate("EUR", "USD", day(15)).unwrap().unwrap();
        assert_eq!(stored.rate, dec!(1.0856));
    }

    #[test]
    fn find_rate_misses_other_dates() {
        let repository = FxRepository::new(setup_pool());
        let quote = ExchangeRate::new("EUR", "USD", dec!(1.0856), day(15));
        repository.save_if_absent(&quote).unwrap();

        assert!(repository.find_rate("EUR", "USD", day(16)).unwrap().is_none());
        assert!(repository.find_rate("EUR", "GBP", day(15)).unwrap().is_none());
    }

    #[test]
    fn save_all_if_absent_skips_existing_rows() {
        let repository = FxRepository::new(setup_pool());
        repository
            .save_if_absent(&ExchangeRate::new("EUR", "USD", dec!(1.0856), day(15)))
            .unwrap();

        let batch = vec![
            ExchangeRate::new("EUR", "USD", dec!(1.0999), day(15)),
            ExchangeRate::new("EUR", "GBP", dec!(0.8599), day(15)),
            ExchangeRate::new("EUR", "USD", dec!(1.0877), day(16)),
        ];
        let inserted = repository.save_all_if_absent(&batch).unwrap();

        assert_eq!(inserted, 2);
        let stored = repository.find_rate("EUR", "USD", day(15)).unwrap().unwrap();
        assert_eq!(stored.rate, dec!(1.0856));
    }

    #[test]
    fn distinct_dates_are_paginated_newest_first() {
        let repository = FxRepository::new(setup_pool());
        for d in 1..=25 {
            repository
                .save_if_absent(&ExchangeRate::new("EUR", "USD", dec!(1.1), day(d)))
                .unwrap();
            repository
                .save_if_absent(&ExchangeRate::new("EUR", "GBP", dec!(0.9), day(d)))
                .unwrap();
        }

        let first = repository
            .distinct_dates_in_range("EUR", day(1), day(25), 0, 20)
            .unwrap();
        assert_eq!(first.total_elements, 25);
        assert_eq!(first.dates.len(), 20);
        assert_eq!(first.dates[0], day(25));
        assert_eq!(first.dates[19], day(6));

        let second = repository
            .distinct_dates_in_range("EUR", day(1), day(25), 1, 20)
            .unwrap();
        assert_eq!(second.dates.len(), 5);
        assert_eq!(second.dates[0], day(5));
        assert_eq!(second.dates[4], day(1));
    }

    #[test]
    fn min_max_date_covers_only_the_requested_range() {
        let repository = FxRepository::new(setup_pool());
        for d in [3, 10, 20] {
            repository
                .save_if_absent(&ExchangeRate::new("EUR", "USD", dec!(1.1), day(d)))
                .unwrap();
        }

        let (lo, hi) = repository
            .min_max_date_in_range("EUR", day(5), day(25))
            .unwrap();
        assert_eq!(lo, Some(day(10)));
        assert_eq!(hi, Some(day(20)));

        let (lo, hi) = repository
            .min_max_date_in_range("EUR", day(21), day(25))
            .unwrap();
        assert_eq!(lo, None);
        assert_eq!(hi, None);
    }

    #[test]
    fn find_rates_for_dates_groups_all_currencies() {
        let repository = FxRepository::new(setup_pool());
        repository
            .save_all_if_absent(&[
                ExchangeRate::new("EUR", "USD", dec!(1.0856), day(15)),
                ExchangeRate::new("EUR", "GBP", dec!(0.8599), day(15)),
                ExchangeRate::new("EUR", "USD", dec!(1.0877), day(16)),
            ])
            .unwrap();

        let rates = repository
            .find_rates_for_dates("EUR", &[day(15), day(16)])
            .unwrap();
        assert_eq!(rates.len(), 3);
        assert_eq!(rates[0].date, day(16));

        assert!(repository.find_rates_for_dates("EUR", &[]).unwrap().is_empty());
    }
}
