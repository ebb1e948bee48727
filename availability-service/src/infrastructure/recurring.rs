use async_trait::async_trait;
use chrono::NaiveDate;
use shared::types::{ListingRef, RecurringPattern};
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::recurring::{
    NewRecurringPattern, RecurringPatternChanges, RecurringPatternRepository,
};
use crate::error::AvailabilityServiceError;

pub struct PgRecurringPatternRepository {
    pool: PgPool,
}

impl PgRecurringPatternRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RecurringPatternRepository for PgRecurringPatternRepository {
    #[tracing::instrument(skip(self))]
    async fn find_by_id(
        &self,
        id: Uuid,
    ) -> Result<Option<RecurringPattern>, AvailabilityServiceError> {
        let output = sqlx::query_as::<_, RecurringPattern>(
            r#"
            SELECT id, listing_id, listing_type, days_of_week, start_date, end_date,
                   reason, created_by, created_at, updated_at
            FROM recurring_patterns
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
    ) -> Result<Vec<RecurringPattern>, AvailabilityServiceError> {
        let output = sqlx::query_as::<_, RecurringPattern>(
            r#"
            SELECT id, listing_id, listing_type, days_of_week, start_date, end_date,
                   reason, created_by, created_at, updated_at
            FROM recurring_patterns
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
    ) -> Result<Vec<RecurringPattern>, AvailabilityServiceError> {
        // Open-ended patterns (end_date NULL) overlap every future window.
        let output = sqlx::query_as::<_, RecurringPattern>(
            r#"
            SELECT id, listing_id, listing_type, days_of_week, start_date, end_date,
                   reason, created_by, created_at, updated_at
            FROM recurring_patterns
            WHERE listing_id = $1 AND listing_type = $2
              AND start_date <= $4
              AND (end_date IS NULL OR end_date >= $3)
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
        pattern: NewRecurringPattern,
    ) -> Result<RecurringPattern, AvailabilityServiceError> {
        let output = sqlx::query_as::<_, RecurringPattern>(
            r#"
            INSERT INTO recurring_patterns
                (listing_id, listing_type, days_of_week, start_date, end_date, reason, created_by)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING id, listing_id, listing_type, days_of_week, start_date, end_date,
                      reason, created_by, created_at, updated_at
            "#,
        )
        .bind(pattern.listing.id)
        .bind(pattern.listing.kind.as_str())
        .bind(pattern.days_of_week)
        .bind(pattern.start_date)
        .bind(pattern.end_date)
        .bind(pattern.reason)
        .bind(pattern.created_by)
        .fetch_one(&self.pool)
        .await?;

        Ok(output)
    }

    #[tracing::instrument(skip(self))]
    async fn update(
        &self,
        id: Uuid,
        changes: RecurringPatternChanges,
    ) -> Result<RecurringPattern, AvailabilityServiceError> {
        let output = sqlx::query_as::<_, RecurringPattern>(
            r#"
            UPDATE recurring_patterns
            SET days_of_week = COALESCE($2, days_of_week),
                end_date = COALESCE($3, end_date),
                reason = COALESCE($4, reason),
                updated_at = now()
            WHERE id = $1
            RETURNING id, listing_id, listing_type, days_of_week, start_date, end_date,
                      reason, created_by, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(changes.days_of_week)
        .bind(changes.end_date)
        .bind(changes.reason)
        .fetch_optional(&self.pool)
        .await?;

        output.ok_or(AvailabilityServiceError::RecurringBlockNotFound(id))
    }

    #[tracing::instrument(skip(self))]
    async fn truncate(
        &self,
        id: Uuid,
        new_end: NaiveDate,
    ) -> Result<RecurringPattern, AvailabilityServiceError> {
        // LEAST keeps an already-shorter series from being extended.
        let output = sqlx::query_as::<_, RecurringPattern>(
            r#"
            UPDATE recurring_patterns
            SET end_date = LEAST(COALESCE(end_date, $2), $2), updated_at = now()
            WHERE id = $1
            RETURNING id, listing_id, listing_type, days_of_week, start_date, end_date,
                      reason, created_by, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(new_end)
        .fetch_optional(&self.pool)
        .await?;

        output.ok_or(AvailabilityServiceError::RecurringBlockNotFound(id))
    }

    #[tracing::instrument(skip(self, replacement))]
    async fn split(
        &self,
        id: Uuid,
        cutoff: NaiveDate,
        replacement: NewRecurringPattern,
    ) -> Result<RecurringPattern, AvailabilityServiceError> {
        let mut tx = self.pool.begin().await?;

        let original = sqlx::query_as::<_, RecurringPattern>(
            r#"
            SELECT id, listing_id, listing_type, days_of_week, start_date, end_date,
                   reason, created_by, created_at, updated_at
            FROM recurring_patterns
            WHERE id = $1
            FOR UPDATE
            "#,
        )
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(AvailabilityServiceError::RecurringBlockNotFound(id))?;

        if cutoff < original.start_date {
            // nothing of the original series precedes the cutoff
            sqlx::query("DELETE FROM recurring_patterns WHERE id = $1")
                .bind(id)
                .execute(&mut *tx)
                .await?;
        } else {
            sqlx::query(
                r#"
                UPDATE recurring_patterns
                SET end_date = LEAST(COALESCE(end_date, $2), $2), updated_at = now()
                WHERE id = $1
                "#,
            )
            .bind(id)
            .bind(cutoff)
            .execute(&mut *tx)
            .await?;
        }

        let inserted = sqlx::query_as::<_, RecurringPattern>(
            r#"
            INSERT INTO recurring_patterns
                (listing_id, listing_type, days_of_week, start_date, end_date, reason, created_by)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING id, listing_id, listing_type, days_of_week, start_date, end_date,
                      reason, created_by, created_at, updated_at
            "#,
        )
        .bind(replacement.listing.id)
        .bind(replacement.listing.kind.as_str())
        .bind(replacement.days_of_week)
        .bind(replacement.start_date)
        .bind(replacement.end_date)
        .bind(replacement.reason)
        .bind(replacement.created_by)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(inserted)
    }

    #[tracing::instrument(skip(self))]
    async fn delete(&self, id: Uuid) -> Result<(), AvailabilityServiceError> {
        let output = sqlx::query(
            r#"
            DELETE FROM recurring_patterns
            WHERE id = $1
            "#,
        )
        .bind(id)
        .execute(&self.pool)
        .await?;

        if output.rows_affected() == 0 {
            return Err(AvailabilityServiceError::RecurringBlockNotFound(id));
        }

        Ok(())
    }
}
