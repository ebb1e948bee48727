use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, Query, State},
};
use chrono::NaiveDate;
use serde::Deserialize;
use shared::{
    responses::{ApiResponse, EmptyApiResponse},
    types::{ListingRef, ListingType, RecurringPattern},
};
use uuid::Uuid;

use crate::{
    api::state::AvailabilityAppState,
    domain::recurring::{CreateRecurringBlockRequest, EditScope, UpdateRecurringBlockRequest},
    error::AvailabilityServiceError,
    infrastructure::cache::keys,
};

async fn invalidate_listing(state: &AvailabilityAppState, listing: ListingRef) {
    if let Some(cache) = &state.cache {
        cache.delete_by_pattern(&keys::listing_pattern(listing)).await;
    }
}

#[utoipa::path(
    get,
    path = "/api/v1/listings/{listing_type}/{listing_id}/recurring-blocks",
    tag = "Recurring blocks",
    operation_id = "list_recurring_blocks",
    params(
        ("listing_type" = ListingType, Path, description = "Listing type"),
        ("listing_id" = Uuid, Path, description = "Listing ID"),
    ),
    responses(
        (status = 200, description = "Patterns for the listing", body = ApiResponse<Vec<RecurringPattern>>)
    )
)]
#[tracing::instrument(skip(state))]
pub async fn list_recurring_blocks(
    State(state): State<Arc<AvailabilityAppState>>,
    Path((listing_type, listing_id)): Path<(ListingType, Uuid)>,
) -> Result<Json<ApiResponse<Vec<RecurringPattern>>>, AvailabilityServiceError> {
    let listing = ListingRef::new(listing_type, listing_id);
    let output = state.availability.list_recurring_blocks(listing).await?;

    Ok(Json(ApiResponse::ok(output)))
}

#[utoipa::path(
    post,
    path = "/api/v1/listings/{listing_type}/{listing_id}/recurring-blocks",
    tag = "Recurring blocks",
    operation_id = "create_recurring_block",
    request_body = CreateRecurringBlockRequest,
    params(
        ("listing_type" = ListingType, Path, description = "Listing type"),
        ("listing_id" = Uuid, Path, description = "Listing ID"),
    ),
    responses(
        (status = 200, description = "Pattern created", body = ApiResponse<RecurringPattern>),
        (status = 400, description = "INVALID_DAYS_OF_WEEK or INVALID_DATE_RANGE")
    )
)]
#[tracing::instrument(skip(state))]
pub async fn create_recurring_block(
    State(state): State<Arc<AvailabilityAppState>>,
    Path((listing_type, listing_id)): Path<(ListingType, Uuid)>,
    Json(request): Json<CreateRecurringBlockRequest>,
) -> Result<Json<ApiResponse<RecurringPattern>>, AvailabilityServiceError> {
    let listing = ListingRef::new(listing_type, listing_id);
    let output = state
        .availability
        .create_recurring_block(request.into_new_pattern(listing))
        .await?;

    invalidate_listing(&state, listing).await;

    Ok(Json(ApiResponse::ok(output)))
}

#[utoipa::path(
    put,
    path = "/api/v1/recurring-blocks/{id}",
    tag = "Recurring blocks",
    operation_id = "update_recurring_block",
    request_body = UpdateRecurringBlockRequest,
    params(
        ("id" = Uuid, Path, description = "Recurring pattern ID"),
    ),
    responses(
        (status = 200, description = "The updated pattern (scope=all) or the new series (scope=future)", body = ApiResponse<RecurringPattern>),
        (status = 403, description = "UNAUTHORIZED"),
        (status = 404, description = "RECURRING_BLOCK_NOT_FOUND")
    )
)]
#[tracing::instrument(skip(state))]
pub async fn update_recurring_block(
    State(state): State<Arc<AvailabilityAppState>>,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateRecurringBlockRequest>,
) -> Result<Json<ApiResponse<RecurringPattern>>, AvailabilityServiceError> {
    let output = state
        .availability
        .update_recurring_block(
            id,
            request.requested_by,
            request.scope,
            request.update_date,
            request.changes,
        )
        .await?;

    invalidate_listing(&state, output.listing()).await;

    Ok(Json(ApiResponse::ok(output)))
}

#[derive(Debug, Deserialize)]
pub struct DeleteRecurringQuery {
    pub requested_by: Uuid,
    pub scope: EditScope,
    pub delete_date: Option<NaiveDate>,
}

#[utoipa::path(
    delete,
    path = "/api/v1/recurring-blocks/{id}",
    tag = "Recurring blocks",
    operation_id = "delete_recurring_block",
    params(
        ("id" = Uuid, Path, description = "Recurring pattern ID"),
        ("requested_by" = Uuid, Query, description = "Requesting user; must be the creator"),
        ("scope" = EditScope, Query, description = "all removes the series; future truncates it"),
        ("delete_date" = Option<NaiveDate>, Query, description = "First day the deletion applies; required for scope=future"),
    ),
    responses(
        (status = 200, description = "Pattern deleted or truncated", body = EmptyApiResponse),
        (status = 403, description = "UNAUTHORIZED"),
        (status = 404, description = "RECURRING_BLOCK_NOT_FOUND")
    )
)]
#[tracing::instrument(skip(state))]
pub async fn delete_recurring_block(
    State(state): State<Arc<AvailabilityAppState>>,
    Path(id): Path<Uuid>,
    Query(query): Query<DeleteRecurringQuery>,
) -> Result<Json<ApiResponse<()>>, AvailabilityServiceError> {
    let deleted = state
        .availability
        .delete_recurring_block(id, query.requested_by, query.scope, query.delete_date)
        .await?;

    invalidate_listing(&state, deleted.listing()).await;

    Ok(Json(ApiResponse::ok(())))
}
