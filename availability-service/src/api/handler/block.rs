use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, Query, State},
};
use chrono::NaiveDate;
use serde::Deserialize;
use shared::{
    responses::{ApiResponse, EmptyApiResponse},
    types::{AvailabilityBlock, BulkBlockResult, ListingRef, ListingType},
};
use uuid::Uuid;

use crate::{
    api::handler::availability::WindowQuery,
    api::state::AvailabilityAppState,
    domain::block::{BulkBlockRequest, CreateBlockRequest},
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
    path = "/api/v1/listings/{listing_type}/{listing_id}/blocks",
    tag = "Blocks",
    operation_id = "list_blocks",
    params(
        ("listing_type" = ListingType, Path, description = "Listing type"),
        ("listing_id" = Uuid, Path, description = "Listing ID"),
        ("start_date" = Option<NaiveDate>, Query, description = "Window start; both bounds or neither"),
        ("end_date" = Option<NaiveDate>, Query, description = "Window end; both bounds or neither"),
    ),
    responses(
        (status = 200, description = "Blocks for the listing", body = ApiResponse<Vec<AvailabilityBlock>>)
    )
)]
#[tracing::instrument(skip(state))]
pub async fn list_blocks(
    State(state): State<Arc<AvailabilityAppState>>,
    Path((listing_type, listing_id)): Path<(ListingType, Uuid)>,
    Query(query): Query<WindowQuery>,
) -> Result<Json<ApiResponse<Vec<AvailabilityBlock>>>, AvailabilityServiceError> {
    let listing = ListingRef::new(listing_type, listing_id);
    let window = query.into_window()?;
    let output = state.availability.list_blocks(listing, window).await?;

    Ok(Json(ApiResponse::ok(output)))
}

#[utoipa::path(
    post,
    path = "/api/v1/listings/{listing_type}/{listing_id}/blocks",
    tag = "Blocks",
    operation_id = "create_block",
    request_body = CreateBlockRequest,
    params(
        ("listing_type" = ListingType, Path, description = "Listing type"),
        ("listing_id" = Uuid, Path, description = "Listing ID"),
    ),
    responses(
        (status = 200, description = "Block created", body = ApiResponse<AvailabilityBlock>),
        (status = 400, description = "INVALID_DATE_RANGE"),
        (status = 409, description = "BOOKING_CONFLICT with conflict list")
    )
)]
#[tracing::instrument(skip(state))]
pub async fn create_block(
    State(state): State<Arc<AvailabilityAppState>>,
    Path((listing_type, listing_id)): Path<(ListingType, Uuid)>,
    Json(request): Json<CreateBlockRequest>,
) -> Result<Json<ApiResponse<AvailabilityBlock>>, AvailabilityServiceError> {
    let listing = ListingRef::new(listing_type, listing_id);
    let output = state
        .availability
        .create_block(request.into_new_block(listing))
        .await?;

    invalidate_listing(&state, listing).await;

    Ok(Json(ApiResponse::ok(output)))
}

#[derive(Debug, Deserialize)]
pub struct DeleteBlockQuery {
    pub requested_by: Uuid,
}

#[utoipa::path(
    delete,
    path = "/api/v1/blocks/{id}",
    tag = "Blocks",
    operation_id = "delete_block",
    params(
        ("id" = Uuid, Path, description = "Block ID"),
        ("requested_by" = Uuid, Query, description = "Requesting user; must be the creator"),
    ),
    responses(
        (status = 200, description = "Block deleted", body = EmptyApiResponse),
        (status = 403, description = "UNAUTHORIZED"),
        (status = 404, description = "BLOCK_NOT_FOUND")
    )
)]
#[tracing::instrument(skip(state))]
pub async fn delete_block(
    State(state): State<Arc<AvailabilityAppState>>,
    Path(id): Path<Uuid>,
    Query(query): Query<DeleteBlockQuery>,
) -> Result<Json<ApiResponse<()>>, AvailabilityServiceError> {
    let deleted = state
        .availability
        .delete_block(id, query.requested_by)
        .await?;

    invalidate_listing(&state, deleted.listing()).await;

    Ok(Json(ApiResponse::ok(())))
}

#[utoipa::path(
    post,
    path = "/api/v1/blocks/bulk",
    tag = "Blocks",
    operation_id = "create_bulk_blocks",
    request_body = BulkBlockRequest,
    responses(
        (status = 200, description = "Per-listing results in input order", body = ApiResponse<BulkBlockResult>),
        (status = 400, description = "INVALID_DATE_RANGE (global precondition)")
    )
)]
#[tracing::instrument(skip(state, request), fields(listings = request.listing_ids.len()))]
pub async fn create_bulk_blocks(
    State(state): State<Arc<AvailabilityAppState>>,
    Json(request): Json<BulkBlockRequest>,
) -> Result<Json<ApiResponse<BulkBlockResult>>, AvailabilityServiceError> {
    let listing_type = request.listing_type;
    let output = state.availability.create_bulk_blocks(request).await?;

    for listing_id in &output.successful_listing_ids {
        invalidate_listing(&state, ListingRef::new(listing_type, *listing_id)).await;
    }

    Ok(Json(ApiResponse::ok(output)))
}
