use async_trait::async_trait;
use chrono::NaiveDate;
use serde::Deserialize;
use shared::types::{ListingRef, RecurringPattern};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::error::AvailabilityServiceError;

/// Whether a pattern mutation applies to the whole series or only from an
/// effective date forward.
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum EditScope {
    All,
    Future,
}

/// A pattern to persist, after weekday and date validation.
#[derive(Debug, Clone)]
pub struct NewRecurringPattern {
    pub listing: ListingRef,
    pub days_of_week: Vec<i16>,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    pub reason: Option<String>,
    pub created_by: Uuid,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateRecurringBlockRequest {
    pub days_of_week: Vec<i16>,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    pub reason: Option<String>,
    pub created_by: Uuid,
}

impl CreateRecurringBlockRequest {
    pub fn into_new_pattern(self, listing: ListingRef) -> NewRecurringPattern {
        NewRecurringPattern {
            listing,
            days_of_week: self.days_of_week,
            start_date: self.start_date,
            end_date: self.end_date,
            reason: self.reason,
            created_by: self.created_by,
        }
    }
}

/// Field overrides for a pattern update. Unset fields keep their current
/// value (scope `all`) or are carried over from the original (scope
/// `future`).
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct RecurringPatternChanges {
    pub days_of_week: Option<Vec<i16>>,
    pub end_date: Option<NaiveDate>,
    pub reason: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateRecurringBlockRequest {
    pub scope: EditScope,
    /// Effective date for scope `future`; first day the new series applies.
    pub update_date: Option<NaiveDate>,
    pub requested_by: Uuid,
    #[serde(flatten)]
    pub changes: RecurringPatternChanges,
}

#[cfg_attr(feature = "test-support", mockall::automock)]
#[async_trait]
pub trait RecurringPatternRepository: Send + Sync {
    async fn find_by_id(
        &self,
        id: Uuid,
    ) -> Result<Option<RecurringPattern>, AvailabilityServiceError>;

    async fn find_for_listing(
        &self,
        listing: ListingRef,
    ) -> Result<Vec<RecurringPattern>, AvailabilityServiceError>;

    /// Patterns for the listing whose active window (open-ended counts as
    /// unbounded) intersects `[start, end]`.
    async fn find_overlapping(
        &self,
        listing: ListingRef,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<RecurringPattern>, AvailabilityServiceError>;

    async fn insert(
        &self,
        pattern: NewRecurringPattern,
    ) -> Result<RecurringPattern, AvailabilityServiceError>;

    /// In-place update for scope `all`; unset change fields keep current
    /// values.
    async fn update(
        &self,
        id: Uuid,
        changes: RecurringPatternChanges,
    ) -> Result<RecurringPattern, AvailabilityServiceError>;

    /// Caps the pattern's end date at `new_end`. Never extends a series
    /// that already ends earlier.
    async fn truncate(
        &self,
        id: Uuid,
        new_end: NaiveDate,
    ) -> Result<RecurringPattern, AvailabilityServiceError>;

    /// Future-scope split as one atomic unit: closes the original series at
    /// `cutoff` (removing it entirely when nothing precedes the cutoff) and
    /// inserts `replacement`, returning the inserted pattern. Neither half
    /// persists without the other.
    async fn split(
        &self,
        id: Uuid,
        cutoff: NaiveDate,
        replacement: NewRecurringPattern,
    ) -> Result<RecurringPattern, AvailabilityServiceError>;

    async fn delete(&self, id: Uuid) -> Result<(), AvailabilityServiceError>;
}
