//! Working-day arithmetic
//!
//! The unit of SLA measurement is the working day: a calendar day that is
//! neither Saturday nor Sunday. Holiday calendars are not consulted.

use chrono::{Datelike, DateTime, NaiveDate, Utc, Weekday};

/// Check if a date falls on a weekend
#[inline]
pub fn is_weekend(date: NaiveDate) -> bool {
    matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
}

/// Signed count of working days between two dates
///
/// Counts the non-weekend days in the span `(from, to]`, so the starting
/// date itself is never counted. Positive when `to` is after `from`,
/// negative otherwise, and antisymmetric under argument swap:
/// `working_days_between(a, b) == -working_days_between(b, a)`.
pub fn working_days_between(from: NaiveDate, to: NaiveDate) -> i64 {
    if to < from {
        return -working_days_between(to, from);
    }
    from.iter_days()
        .skip(1)
        .take_while(|day| *day <= to)
        .filter(|day| !is_weekend(*day))
        .count() as i64
}

/// Working-day count between two timestamps, truncated to calendar dates
#[inline]
pub fn working_days_between_at(from: DateTime<Utc>, to: DateTime<Utc>) -> i64 {
    working_days_between(from.date_naive(), to.date_naive())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_same_day_is_zero() {
        let d = date(2024, 1, 3);
        assert_eq!(working_days_between(d, d), 0);
    }

    #[test]
    fn test_monday_to_friday_is_four() {
        // 2024-01-01 is a Monday, 2024-01-05 a Friday
        assert_eq!(working_days_between(date(2024, 1, 1), date(2024, 1, 5)), 4);
    }

    #[test]
    fn test_weekend_days_are_skipped() {
        // Friday to the following Monday: only Monday counts
        assert_eq!(working_days_between(date(2024, 1, 5), date(2024, 1, 8)), 1);
        // Full week Monday to Monday
        assert_eq!(working_days_between(date(2024, 1, 1), date(2024, 1, 8)), 5);
    }

    #[test]
    fn test_span_entirely_on_weekend() {
        // Saturday to Sunday
        assert_eq!(working_days_between(date(2024, 1, 6), date(2024, 1, 7)), 0);
    }

    #[test]
    fn test_negative_direction() {
        assert_eq!(working_days_between(date(2024, 1, 5), date(2024, 1, 1)), -4);
        assert_eq!(working_days_between(date(2024, 1, 8), date(2024, 1, 5)), -1);
    }

    #[test]
    fn test_is_weekend() {
        assert!(is_weekend(date(2024, 1, 6)));
        assert!(is_weekend(date(2024, 1, 7)));
        assert!(!is_weekend(date(2024, 1, 8)));
    }

    proptest! {
        #[test]
        fn prop_antisymmetric(a in 0i64..20_000, b in 0i64..20_000) {
            let epoch = date(1990, 1, 1);
            let da = epoch + chrono::Duration::days(a);
            let db = epoch + chrono::Duration::days(b);
            prop_assert_eq!(working_days_between(da, db), -working_days_between(db, da));
        }

        #[test]
        fn prop_bounded_by_calendar_span(a in 0i64..20_000, b in 0i64..20_000) {
            let epoch = date(1990, 1, 1);
            let da = epoch + chrono::Duration::days(a);
            let db = epoch + chrono::Duration::days(b);
            prop_assert!(working_days_between(da, db).abs() <= (a - b).abs());
        }
    }
}
