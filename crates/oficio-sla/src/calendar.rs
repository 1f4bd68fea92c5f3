//! Business-day calendar.
//!
//! Saturdays, Sundays and configured holidays are not business days. The
//! intake date itself is never counted and is not adjusted when it falls on
//! a non-business day.

use std::collections::BTreeSet;

use chrono::{Datelike, NaiveDate, Weekday};

/// Calendar of non-business dates.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BusinessCalendar {
    holidays: BTreeSet<NaiveDate>,
}

impl BusinessCalendar {
    /// Weekends only.
    pub fn weekends_only() -> Self {
        Self::default()
    }

    /// Weekends plus the given holidays.
    pub fn with_holidays(holidays: impl IntoIterator<Item = NaiveDate>) -> Self {
        Self {
            holidays: holidays.into_iter().collect(),
        }
    }

    /// Whether `date` is a business day.
    pub fn is_business_day(&self, date: NaiveDate) -> bool {
        !matches!(date.weekday(), Weekday::Sat | Weekday::Sun) && !self.holidays.contains(&date)
    }

    /// Walk `days_plazo` business days forward from `intake_date`.
    ///
    /// Zero days returns the intake date.
    pub fn compute_deadline(&self, intake_date: NaiveDate, days_plazo: u32) -> NaiveDate {
        let mut date = intake_date;
        let mut remaining = days_plazo;
        while remaining > 0 {
            date = match date.succ_opt() {
                Some(next) => next,
                None => break,
            };
            if self.is_business_day(date) {
                remaining -= 1;
            }
        }
        date
    }
}

/// [`BusinessCalendar::compute_deadline`] on a weekends-only calendar.
pub fn compute_deadline(intake_date: NaiveDate, days_plazo: u32) -> NaiveDate {
    BusinessCalendar::weekends_only().compute_deadline(intake_date, days_plazo)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn zero_days_is_intake() {
        assert_eq!(compute_deadline(d(2025, 1, 15), 0), d(2025, 1, 15));
        assert_eq!(compute_deadline(d(2025, 1, 18), 0), d(2025, 1, 18));
    }

    #[test]
    fn midweek_intake() {
        assert_eq!(compute_deadline(d(2025, 1, 15), 1), d(2025, 1, 16));
        assert_eq!(compute_deadline(d(2025, 1, 15), 5), d(2025, 1, 22));
    }

    #[test]
    fn friday_plus_one_is_monday() {
        assert_eq!(compute_deadline(d(2025, 1, 17), 1), d(2025, 1, 20));
    }

    #[test]
    fn weekend_intake_is_not_adjusted() {
        // Saturday intake: Sunday is skipped, Monday is day one.
        assert_eq!(compute_deadline(d(2025, 1, 18), 1), d(2025, 1, 20));
        assert_eq!(compute_deadline(d(2025, 1, 19), 1), d(2025, 1, 20));
    }

    #[test]
    fn holidays_are_skipped() {
        // 2025-02-03 is Constitution Day (first Monday of February).
        let cal = BusinessCalendar::with_holidays([d(2025, 2, 3)]);
        assert_eq!(cal.compute_deadline(d(2025, 1, 31), 1), d(2025, 2, 4));
        assert!(!cal.is_business_day(d(2025, 2, 3)));
        assert!(cal.is_business_day(d(2025, 2, 4)));
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn deadline_is_a_business_day(offset in 0i64..3650, days in 1u32..60) {
                let intake = d(2020, 1, 1) + chrono::Duration::days(offset);
                let deadline = compute_deadline(intake, days);
                prop_assert!(deadline > intake);
                prop_assert!(BusinessCalendar::weekends_only().is_business_day(deadline));
            }

            #[test]
            fn deadline_grows_with_days(offset in 0i64..3650, days in 0u32..60) {
                let intake = d(2020, 1, 1) + chrono::Duration::days(offset);
                let a = compute_deadline(intake, days);
                let b = compute_deadline(intake, days + 1);
                prop_assert!(b > a);
                // Never more than a weekend between consecutive business days.
                prop_assert!((b - a).num_days() <= 3);
            }
        }
    }
}
