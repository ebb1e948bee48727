use async_trait::async_trait;
use chrono::NaiveDate;
use serde::Deserialize;
use shared::types::{AvailabilityBlock, ListingRef, ListingType};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::error::AvailabilityServiceError;

/// A block to persist, after validation and conflict gating.
#[derive(Debug, Clone)]
pub struct NewBlock {
    pub listing: ListingRef,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub reason: Option<String>,
    pub created_by: Uuid,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateBlockRequest {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub reason: Option<String>,
    pub created_by: Uuid,
}

impl CreateBlockRequest {
    pub fn into_new_block(self, listing: ListingRef) -> NewBlock {
        NewBlock {
            listing,
            start_date: self.start_date,
            end_date: self.end_date,
            reason: self.reason,
            created_by: self.created_by,
        }
    }
}

/// One block request applied across many listings of the same type.
#[derive(Debug, Deserialize, ToSchema)]
pub struct BulkBlockRequest {
    pub listing_ids: Vec<Uuid>,
    pub listing_type: ListingType,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub reason: Option<String>,
    pub created_by: Uuid,
}

#[cfg_attr(feature = "test-support", mockall::automock)]
#[async_trait]
pub trait BlockRepository: Send + Sync {
    async fn find_by_id(
        &self,
        id: Uuid,
    ) -> Result<Option<AvailabilityBlock>, AvailabilityServiceError>;

    async fn find_for_listing(
        &self,
        listing: ListingRef,
    ) -> Result<Vec<AvailabilityBlock>, AvailabilityServiceError>;

    /// Blocks for the listing whose inclusive range overlaps `[start, end]`.
    async fn find_overlapping(
        &self,
        listing: ListingRef,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<AvailabilityBlock>, AvailabilityServiceError>;

    async fn insert(
        &self,
        block: NewBlock,
    ) -> Result<AvailabilityBlock, AvailabilityServiceError>;

    async fn delete(&self, id: Uuid) -> Result<(), AvailabilityServiceError>;

    /// Removes materialized instances of a pattern; used when a recurring
    /// pattern is deleted with scope `all`. Returns the number removed.
    async fn delete_by_pattern_id(
        &self,
        pattern_id: Uuid,
    ) -> Result<u64, AvailabilityServiceError>;
}
