//! Day-by-day calendar rendering and occupancy aggregation.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use shared::types::{
    AvailabilityBlock, Booking, CalendarAnalytics, CalendarDay, DayStatus, RecurringPattern,
};

use crate::domain::interval::{contains_day, days_between};
use crate::domain::recurrence::{self, RecurringInstance};

/// Renders one entry per day in `[window_start, window_end]` inclusive.
///
/// Per day, exactly one status wins by precedence: booked > blocked >
/// available. One-off blocks take precedence over recurring instances within
/// the blocked tier, and only the winning match contributes detail.
pub fn render_days(
    window_start: NaiveDate,
    window_end: NaiveDate,
    bookings: &[Booking],
    blocks: &[AvailabilityBlock],
    patterns: &[RecurringPattern],
) -> Vec<CalendarDay> {
    // Expand each pattern once over the whole window, then index by day.
    let mut recurring_by_day: BTreeMap<NaiveDate, RecurringInstance> = BTreeMap::new();
    for pattern in patterns {
        for instance in recurrence::expand(pattern, window_start, window_end) {
            recurring_by_day.entry(instance.date).or_insert(instance);
        }
    }

    days_between(window_start, window_end)
        .map(|date| resolve_day(date, bookings, blocks, &recurring_by_day))
        .collect()
}

fn resolve_day(
    date: NaiveDate,
    bookings: &[Booking],
    blocks: &[AvailabilityBlock],
    recurring_by_day: &BTreeMap<NaiveDate, RecurringInstance>,
) -> CalendarDay {
    let booked = bookings
        .iter()
        .filter(|b| b.status.is_conflict_source())
        .find(|b| contains_day(b.start_date, b.end_date, date));
    if let Some(booking) = booked {
        return CalendarDay {
            date,
            status: DayStatus::Booked,
            reference_id: Some(booking.id),
            detail: Some(booking.booking_number.clone()),
        };
    }

    let blocked = blocks
        .iter()
        .find(|b| contains_day(b.start_date, b.end_date, date));
    if let Some(block) = blocked {
        return CalendarDay {
            date,
            status: DayStatus::Blocked,
            reference_id: Some(block.id),
            detail: block.reason.clone(),
        };
    }

    if let Some(instance) = recurring_by_day.get(&date) {
        return CalendarDay {
            date,
            status: DayStatus::Blocked,
            reference_id: Some(instance.pattern_id),
            detail: instance.reason.clone(),
        };
    }

    CalendarDay {
        date,
        status: DayStatus::Available,
        reference_id: None,
        detail: None,
    }
}

/// Aggregates day counts and the booked-share occupancy ratio over a
/// rendered window.
pub fn summarize(
    window_start: NaiveDate,
    window_end: NaiveDate,
    days: &[CalendarDay],
) -> CalendarAnalytics {
    let total_days = days.len() as u32;
    let booked_days = days
        .iter()
        .filter(|d| d.status == DayStatus::Booked)
        .count() as u32;
    let blocked_days = days
        .iter()
        .filter(|d| d.status == DayStatus::Blocked)
        .count() as u32;
    let available_days = total_days - booked_days - blocked_days;

    let occupancy_rate = if total_days == 0 {
        0.0
    } else {
        f64::from(booked_days) / f64::from(total_days)
    };

    CalendarAnalytics {
        window_start,
        window_end,
        total_days,
        booked_days,
        blocked_days,
        available_days,
        occupancy_rate,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use shared::types::{BookingStatus, ListingType};
    use uuid::Uuid;

    fn d(m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, m, day).unwrap()
    }

    fn booking(start: NaiveDate, end: NaiveDate, status: BookingStatus) -> Booking {
        Booking {
            id: Uuid::new_v4(),
            listing_id: Uuid::new_v4(),
            listing_type: ListingType::Vehicle,
            booking_number: "BK-7".to_string(),
            start_date: start,
            end_date: end,
            status,
        }
    }

    fn block(start: NaiveDate, end: NaiveDate, reason: Option<&str>) -> AvailabilityBlock {
        let now = Utc::now();
        AvailabilityBlock {
            id: Uuid::new_v4(),
            listing_id: Uuid::new_v4(),
            listing_type: ListingType::Vehicle,
            start_date: start,
            end_date: end,
            reason: reason.map(str::to_string),
            is_recurring: false,
            recurring_pattern_id: None,
            created_by: Uuid::new_v4(),
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn one_entry_per_day_ascending() {
        let days = render_days(d(1, 1), d(1, 31), &[], &[], &[]);
        assert_eq!(days.len(), 31);
        for pair in days.windows(2) {
            assert!(pair[0].date < pair[1].date);
        }
        assert!(days.iter().all(|e| e.status == DayStatus::Available));
    }

    #[test]
    fn booked_wins_over_blocked() {
        let b = booking(d(1, 2), d(1, 4), BookingStatus::Active);
        let blk = block(d(1, 1), d(1, 10), Some("Maintenance"));
        let days = render_days(d(1, 1), d(1, 5), &[b.clone()], &[blk], &[]);

        assert_eq!(days[0].status, DayStatus::Blocked);
        assert_eq!(days[1].status, DayStatus::Booked);
        // only the booking's detail is attached on the contested day
        assert_eq!(days[1].reference_id, Some(b.id));
        assert_eq!(days[1].detail.as_deref(), Some("BK-7"));
        assert_eq!(days[4].status, DayStatus::Blocked);
    }

    #[test]
    fn pending_booking_does_not_mark_booked() {
        let b = booking(d(1, 2), d(1, 4), BookingStatus::Pending);
        let days = render_days(d(1, 1), d(1, 5), &[b], &[], &[]);
        assert!(days.iter().all(|e| e.status == DayStatus::Available));
    }

    #[test]
    fn recurring_instance_marks_blocked_days() {
        let now = Utc::now();
        let pattern = RecurringPattern {
            id: Uuid::new_v4(),
            listing_id: Uuid::new_v4(),
            listing_type: ListingType::Driver,
            days_of_week: vec![0, 6], // weekends
            start_date: d(1, 1),
            end_date: None,
            reason: Some("Weekend off".to_string()),
            created_by: Uuid::new_v4(),
            created_at: now,
            updated_at: now,
        };
        let days = render_days(d(1, 1), d(1, 7), &[], &[], &[pattern.clone()]);
        let blocked: Vec<_> = days
            .iter()
            .filter(|e| e.status == DayStatus::Blocked)
            .collect();
        // 2024-01-06 Sat, 2024-01-07 Sun
        assert_eq!(blocked.len(), 2);
        assert_eq!(blocked[0].date, d(1, 6));
        assert_eq!(blocked[1].date, d(1, 7));
        assert!(blocked.iter().all(|e| e.reference_id == Some(pattern.id)));
    }

    #[test]
    fn summarize_counts_and_occupancy() {
        let b = booking(d(1, 1), d(1, 3), BookingStatus::Completed);
        let blk = block(d(1, 5), d(1, 6), None);
        let days = render_days(d(1, 1), d(1, 10), &[b], &[blk], &[]);
        let analytics = summarize(d(1, 1), d(1, 10), &days);

        assert_eq!(analytics.total_days, 10);
        assert_eq!(analytics.booked_days, 3);
        assert_eq!(analytics.blocked_days, 2);
        assert_eq!(analytics.available_days, 5);
        assert!((analytics.occupancy_rate - 0.3).abs() < 1e-9);
    }
}
