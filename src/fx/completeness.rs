use chrono::NaiveDate;

use crate::constants::RANGE_TOLERANCE_DAYS;

/// Decide whether stored data already covers `[start, end]` well enough to
/// skip the external source. Quotes only exist on trading days, so each end
/// of the range may fall short by a few calendar days without the range
/// being incomplete.
pub fn is_range_complete(
    start: NaiveDate,
    end: NaiveDate,
    min_stored: Option<NaiveDate>,
    max_stored: Option<NaiveDate>,
) -> bool {
    let (Some(min_stored), Some(max_stored)) = (min_stored, max_stored) else {
        return false;
    };

    (min_stored - start).num_days() <= RANGE_TOLERANCE_DAYS
        && (end - max_stored).num_days() <= RANGE_TOLERANCE_DAYS
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, d).unwrap()
    }

    #[test]
    fn exact_coverage_is_complete() {
        assert!(is_range_complete(day(1), day(31), Some(day(1)), Some(day(31))));
    }

    #[test]
    fn gaps_within_tolerance_are_complete() {
        // Four days short on each end, the widest acceptable gap.
        assert!(is_range_complete(day(1), day(31), Some(day(5)), Some(day(27))));
    }

    #[test]
    fn gap_beyond_tolerance_is_incomplete() {
        assert!(!is_range_complete(day(1), day(31), Some(day(6)), Some(day(31))));
        assert!(!is_range_complete(day(1), day(31), Some(day(1)), Some(day(26))));
    }

    #[test]
    fn missing_boundaries_are_incomplete() {
        assert!(!is_range_complete(day(1), day(31), None, None));
        assert!(!is_range_complete(day(1), day(31), Some(day(1)), None));
        assert!(!is_range_complete(day(1), day(31), None, Some(day(31))));
    }

    #[test]
    fn stored_data_wider_than_the_range_is_complete() {
        assert!(is_range_complete(day(10), day(20), Some(day(10)), Some(day(20))));
    }
}
