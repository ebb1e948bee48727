use async_trait::async_trait;
use chrono::NaiveDate;
use shared::types::{AvailabilityBlock, ListingRef};
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::block::{BlockRepository, NewBlock};
use crate::error::AvailabilityServiceError;

pub struct PgBlockRepository {
    pool: PgPool,
}

impl PgBlockRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl BlockRepository for PgBlockRepository {
    #[tracing::instrument(skip(self))]
    async fn find_by_id(
        &self,
        id: Uuid,
    ) -> Result<Option<AvailabilityBlock>, AvailabilityServiceError> {
        let output = sqlx::query_as::<_, AvailabilityBlock>(
            r#"
            SELECT id, listing_id, listing_type, start_date, end_date, reason,
                   is_recurring, recurring_pattern_id, created_by, created_at, updated_at
            FROM availability_blocks
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(output)
    }

    #[tracing::instrument(skip(self))]
    async fn find_for_listing(
        &self,
        listing: ListingRef,
    ) -> Result<Vec<AvailabilityBlock>, AvailabilityServiceError> {
        let output = sqlx::query_as::<_, AvailabilityBlock>(
            r#"
            SELECT id, listing_id, listing_type, start_date, end_date, reason,
                   is_recurring, recurring_pattern_id, created_by, created_at, updated_at
            FROM availability_blocks
            WHERE listing_id = $1 AND listing_type = $2
            ORDER BY start_date
            "#,
        )
        .bind(listing.id)
        .bind(listing.kind.as_str())
        .fetch_all(&self.pool)
        .await?;

        Ok(output)
    }

    #[tracing::instrument(skip(self))]
    async fn find_overlapping(
        &self,
        listing: ListingRef,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<AvailabilityBlock>, AvailabilityServiceError> {
        let output = sqlx::query_as::<_, AvailabilityBlock>(
            r#"
            SELECT id, listing_id, listing_type, start_date, end_date, reason,
                   is_recurring, recurring_pattern_id, created_by, created_at, updated_at
            FROM availability_blocks
            WHERE listing_id = $1 AND listing_type = $2
              AND start_date <= $4 AND end_date >= $3
            ORDER BY start_date
            "#,
        )
        .bind(listing.id)
        .bind(listing.kind.as_str())
        .bind(start)
        .bind(end)
        .fetch_all(&self.pool)
        .await?;

        Ok(output)
    }

    #[tracing::instrument(skip(self))]
    async fn insert(
        &self,
        block: NewBlock,
    ) -> Result<AvailabilityBlock, AvailabilityServiceError> {
        let output = sqlx::query_as::<_, AvailabilityBlock>(
            r#"
            INSERT INTO availability_blocks
                (listing_id, listing_type, start_date, end_date, reason, created_by)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, listing_id, listing_type, start_date, end_date, reason,
                      is_recurring, recurring_pattern_id, created_by, created_at, updated_at
            "#,
        )
        .bind(block.listing.id)
        .bind(block.listing.kind.as_str())
        .bind(block.start_date)
        .bind(block.end_date)
        .bind(block.reason)
        .bind(block.created_by)
        .fetch_one(&self.pool)
        .await?;

        Ok(output)
    }

    #[tracing::instrument(skip(self))]
    async fn delete(&self, id: Uuid) -> Result<(), AvailabilityServiceError> {
        let output = sqlx::query(
            r#"
            DELETE FROM availability_blocks
            WHERE id = $1
            "#,
        )
        .bind(id)
        .execute(&self.pool)
        .await?;

        if output.rows_affected() == 0 {
            return Err(AvailabilityServiceError::BlockNotFound(id));
        }

        Ok(())
    }

    #[tracing::instrument(skip(self))]
    async fn delete_by_pattern_id(
        &self,
        pattern_id: Uuid,
    ) -> Result<u64, AvailabilityServiceError> {
        let output = sqlx::query(
            r#"
            DELETE FROM availability_blocks
            WHERE recurring_pattern_id = $1
            "#,
        )
        .bind(pattern_id)
        .execute(&self.pool)
        .await?;

        Ok(output.rows_affected())
    }
}
