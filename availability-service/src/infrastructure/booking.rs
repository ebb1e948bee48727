use async_trait::async_trait;
use chrono::NaiveDate;
use shared::types::{Booking, BookingStatus, ListingRef};
use sqlx::PgPool;

use crate::domain::booking::BookingRepository;
use crate::error::AvailabilityServiceError;

/// Read-only access to the `bookings` table, which the booking service owns.
pub struct PgBookingRepository {
    pool: PgPool,
}

impl PgBookingRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl BookingRepository for PgBookingRepository {
    #[tracing::instrument(skip(self))]
    async fn find_active_overlapping(
        &self,
        listing: ListingRef,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<Booking>, AvailabilityServiceError> {
        let statuses: Vec<String> = BookingStatus::CONFLICT_SOURCES
            .iter()
            .map(|s| s.as_str().to_string())
            .collect();

        let output = sqlx::query_as::<_, Booking>(
            r#"
            SELECT id, listing_id, listing_type, booking_number, start_date, end_date, status
            FROM bookings
            WHERE listing_id = $1 AND listing_type = $2
              AND status = ANY($3)
              AND start_date <= $5 AND end_date >= $4
            ORDER BY start_date
            "#,
        )
        .bind(listing.id)
        .bind(listing.kind.as_str())
        .bind(statuses)
        .bind(start)
        .bind(end)
        .fetch_all(&self.pool)
        .await?;

        Ok(output)
    }
}
