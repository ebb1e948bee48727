//! Conflict collection over bookings, blocks, and recurring instances.

use chrono::NaiveDate;
use shared::types::{AvailabilityBlock, Booking, ConflictDescriptor, ConflictKind, RecurringPattern};

use crate::domain::interval::overlaps;
use crate::domain::recurrence;

/// Label attached to a block conflict when the block carries no reason.
const UNNAMED_BLOCK: &str = "Blocked";

pub fn booking_conflict(booking: &Booking) -> ConflictDescriptor {
    ConflictDescriptor {
        kind: ConflictKind::Booking,
        start_date: booking.start_date,
        end_date: booking.end_date,
        reference_id: booking.id,
        reference_label: booking.booking_number.clone(),
    }
}

fn block_conflict(block: &AvailabilityBlock) -> ConflictDescriptor {
    ConflictDescriptor {
        kind: ConflictKind::Block,
        start_date: block.start_date,
        end_date: block.end_date,
        reference_id: block.id,
        reference_label: block
            .reason
            .clone()
            .unwrap_or_else(|| UNNAMED_BLOCK.to_string()),
    }
}

/// Booking conflicts only, for the conflict gate on block creation where
/// overlapping blocks are legal.
pub fn booking_conflicts(
    start: NaiveDate,
    end: NaiveDate,
    bookings: &[Booking],
) -> Vec<ConflictDescriptor> {
    bookings
        .iter()
        .filter(|b| b.status.is_conflict_source())
        .filter(|b| overlaps(start, end, b.start_date, b.end_date))
        .map(booking_conflict)
        .collect()
}

/// Collects every conflict the candidate range `[start, end]` has with
/// active bookings, one-off blocks, and expanded recurring instances.
///
/// Pure over its inputs; the repositories pre-filter by listing and window,
/// the overlap tests here are authoritative.
pub fn collect_conflicts(
    start: NaiveDate,
    end: NaiveDate,
    bookings: &[Booking],
    blocks: &[AvailabilityBlock],
    patterns: &[RecurringPattern],
) -> Vec<ConflictDescriptor> {
    let mut conflicts = booking_conflicts(start, end, bookings);

    conflicts.extend(
        blocks
            .iter()
            .filter(|b| overlaps(start, end, b.start_date, b.end_date))
            .map(block_conflict),
    );

    for pattern in patterns {
        for instance in recurrence::expand(pattern, start, end) {
            conflicts.push(ConflictDescriptor {
                kind: ConflictKind::Block,
                start_date: instance.date,
                end_date: instance.date,
                reference_id: instance.pattern_id,
                reference_label: instance
                    .reason
                    .unwrap_or_else(|| UNNAMED_BLOCK.to_string()),
            });
        }
    }

    conflicts
}
