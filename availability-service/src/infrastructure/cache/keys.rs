//! Cache key layout for derived availability views.
//!
//! All keys for one listing share the `availability:{type}:{id}:` prefix so
//! a single pattern delete invalidates every cached view after a write.

use chrono::NaiveDate;
use shared::types::ListingRef;

/// TTL in seconds for cached calendar windows.
pub const TTL_CALENDAR: u64 = 300;
/// TTL in seconds for cached analytics windows.
pub const TTL_ANALYTICS: u64 = 600;

fn listing_prefix(listing: ListingRef) -> String {
    format!("availability:{}:{}", listing.kind, listing.id)
}

pub fn calendar_key(listing: ListingRef, start: NaiveDate, end: NaiveDate) -> String {
    format!("{}:calendar:{start}:{end}", listing_prefix(listing))
}

pub fn analytics_key(listing: ListingRef, start: NaiveDate, end: NaiveDate) -> String {
    format!("{}:analytics:{start}:{end}", listing_prefix(listing))
}

/// Match-all pattern for one listing's cached views.
pub fn listing_pattern(listing: ListingRef) -> String {
    format!("{}:*", listing_prefix(listing))
}
