use async_trait::async_trait;
use chrono::NaiveDate;
use shared::types::{Booking, ListingRef};

use crate::error::AvailabilityServiceError;

/// Read-only view over bookings. The booking service owns the rows.
#[cfg_attr(feature = "test-support", mockall::automock)]
#[async_trait]
pub trait BookingRepository: Send + Sync {
    /// Bookings for the listing in a conflict-source status (ACCEPTED,
    /// ACTIVE, COMPLETED) whose range overlaps `[start, end]`.
    async fn find_active_overlapping(
        &self,
        listing: ListingRef,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<Booking>, AvailabilityServiceError>;
}
