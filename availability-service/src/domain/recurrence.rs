//! Weekly recurring pattern expansion.
//!
//! Patterns are stored as rules and expanded into concrete single-day
//! instances at query time; nothing here is ever persisted per instance.

use chrono::{Datelike, NaiveDate};
use shared::types::RecurringPattern;
use uuid::Uuid;

/// A single blocked day produced by expanding a [`RecurringPattern`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecurringInstance {
    pub pattern_id: Uuid,
    pub date: NaiveDate,
    pub reason: Option<String>,
}

/// Weekday index with Sunday = 0, matching the stored `days_of_week` sets.
pub fn weekday_index(date: NaiveDate) -> i16 {
    date.weekday().num_days_from_sunday() as i16
}

/// Expands `pattern` over `[window_start, window_end]` into ascending
/// single-day instances.
///
/// The effective range is the intersection of the pattern's active window
/// and the query window; a disjoint intersection yields an empty vector,
/// never an error. Open-ended patterns are bounded by the query window.
pub fn expand(
    pattern: &RecurringPattern,
    window_start: NaiveDate,
    window_end: NaiveDate,
) -> Vec<RecurringInstance> {
    let start = pattern.start_date.max(window_start);
    let end = pattern.end_date.map_or(window_end, |e| e.min(window_end));

    super::interval::days_between(start, end)
        .filter(|day| pattern.days_of_week.contains(&weekday_index(*day)))
        .map(|date| RecurringInstance {
            pattern_id: pattern.id,
            date,
            reason: pattern.reason.clone(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use shared::types::ListingType;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn pattern(days: Vec<i16>, start: NaiveDate, end: Option<NaiveDate>) -> RecurringPattern {
        let now = Utc::now();
        RecurringPattern {
            id: Uuid::new_v4(),
            listing_id: Uuid::new_v4(),
            listing_type: ListingType::Vehicle,
            days_of_week: days,
            start_date: start,
            end_date: end,
            reason: Some("Weekly maintenance".to_string()),
            created_by: Uuid::new_v4(),
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn sunday_is_zero() {
        // 2024-01-07 was a Sunday
        assert_eq!(weekday_index(d(2024, 1, 7)), 0);
        assert_eq!(weekday_index(d(2024, 1, 1)), 1); // Monday
        assert_eq!(weekday_index(d(2024, 1, 6)), 6); // Saturday
    }

    #[test]
    fn mon_wed_fri_over_first_week_of_2024() {
        let p = pattern(vec![1, 3, 5], d(2024, 1, 1), None);
        let instances = expand(&p, d(2024, 1, 1), d(2024, 1, 7));

        let dates: Vec<_> = instances.iter().map(|i| i.date).collect();
        assert_eq!(dates, vec![d(2024, 1, 1), d(2024, 1, 3), d(2024, 1, 5)]);
        assert!(instances.iter().all(|i| i.pattern_id == p.id));
    }

    #[test]
    fn single_day_instances() {
        let p = pattern(vec![1], d(2024, 1, 1), None);
        let instances = expand(&p, d(2024, 1, 1), d(2024, 1, 14));
        assert_eq!(instances.len(), 2);
        for i in &instances {
            assert_eq!(i.reason.as_deref(), Some("Weekly maintenance"));
        }
    }

    #[test]
    fn disjoint_window_yields_nothing() {
        let p = pattern(vec![1, 3, 5], d(2024, 2, 1), Some(d(2024, 2, 29)));
        assert!(expand(&p, d(2024, 1, 1), d(2024, 1, 31)).is_empty());
        assert!(expand(&p, d(2024, 3, 1), d(2024, 3, 31)).is_empty());
    }

    #[test]
    fn pattern_end_date_caps_expansion() {
        let p = pattern(vec![1], d(2024, 1, 1), Some(d(2024, 1, 7)));
        let instances = expand(&p, d(2024, 1, 1), d(2024, 1, 31));
        assert_eq!(instances.len(), 1);
        assert_eq!(instances[0].date, d(2024, 1, 1));
    }

    #[test]
    fn window_start_trims_past_instances() {
        let p = pattern(vec![1], d(2024, 1, 1), None);
        let instances = expand(&p, d(2024, 1, 9), d(2024, 1, 21));
        let dates: Vec<_> = instances.iter().map(|i| i.date).collect();
        assert_eq!(dates, vec![d(2024, 1, 15)]);
    }
}
