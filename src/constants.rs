use chrono::NaiveDate;
use std::time::Duration;

/// Base currency all stored rates are expressed against
pub const BASE_CURRENCY: &str = "EUR";

/// Earliest date for which rate history may be requested
pub const MIN_SUPPORTED_DATE: NaiveDate = match NaiveDate::from_ymd_opt(2020, 1, 1) {
    Some(date) => date,
    None => panic!("invalid MIN_SUPPORTED_DATE"),
};

/// Decimal precision for stored exchange rates
pub const RATE_DECIMAL_PRECISION: u32 = 6;

/// Decimal precision for converted amounts
pub const AMOUNT_DECIMAL_PRECISION: u32 = 4;

/// Tolerance in calendar days when judging whether a persisted date range is
/// complete. The source only quotes business days, so persisted boundary
/// dates may legitimately trail the requested boundary by a long weekend
/// plus a holiday.
pub const RANGE_TOLERANCE_DAYS: i64 = 4;

/// Default page size for history pagination
pub const DEFAULT_PAGE_SIZE: i64 = 20;

/// History cache entry lifetime
pub const HISTORY_CACHE_TTL: Duration = Duration::from_secs(3600);

/// Maximum number of history cache entries
pub const HISTORY_CACHE_CAPACITY: usize = 100;
