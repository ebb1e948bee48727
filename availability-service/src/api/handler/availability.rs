use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, Query, State},
    http::header,
    response::IntoResponse,
};
use chrono::NaiveDate;
use serde::Deserialize;
use shared::{
    responses::ApiResponse,
    types::{AvailabilityCheck, CalendarAnalytics, CalendarDay, ListingRef, ListingType},
};
use uuid::Uuid;

use crate::{
    api::state::AvailabilityAppState,
    error::AvailabilityServiceError,
    infrastructure::cache::keys,
};

/// Optional window; either both bounds or neither.
#[derive(Debug, Deserialize)]
pub struct WindowQuery {
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

impl WindowQuery {
    pub fn into_window(
        self,
    ) -> Result<Option<(NaiveDate, NaiveDate)>, AvailabilityServiceError> {
        match (self.start_date, self.end_date) {
            (Some(start), Some(end)) => Ok(Some((start, end))),
            (None, None) => Ok(None),
            _ => Err(AvailabilityServiceError::BadRequest(
                "start_date and end_date must be given together".to_string(),
            )),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct CheckQuery {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

#[utoipa::path(
    get,
    path = "/api/v1/listings/{listing_type}/{listing_id}/availability",
    tag = "Availability",
    operation_id = "check_availability",
    params(
        ("listing_type" = ListingType, Path, description = "Listing type"),
        ("listing_id" = Uuid, Path, description = "Listing ID"),
        ("start_date" = NaiveDate, Query, description = "Candidate range start (inclusive)"),
        ("end_date" = NaiveDate, Query, description = "Candidate range end (inclusive)"),
    ),
    responses(
        (status = 200, description = "Conflict check result", body = ApiResponse<AvailabilityCheck>),
        (status = 400, description = "INVALID_DATE_RANGE")
    )
)]
#[tracing::instrument(skip(state))]
pub async fn check_availability(
    State(state): State<Arc<AvailabilityAppState>>,
    Path((listing_type, listing_id)): Path<(ListingType, Uuid)>,
    Query(query): Query<CheckQuery>,
) -> Result<Json<ApiResponse<AvailabilityCheck>>, AvailabilityServiceError> {
    let listing = ListingRef::new(listing_type, listing_id);
    let output = state
        .availability
        .check_availability(listing, query.start_date, query.end_date)
        .await?;

    Ok(Json(ApiResponse::ok(output)))
}

#[utoipa::path(
    get,
    path = "/api/v1/listings/{listing_type}/{listing_id}/calendar",
    tag = "Availability",
    operation_id = "get_calendar",
    params(
        ("listing_type" = ListingType, Path, description = "Listing type"),
        ("listing_id" = Uuid, Path, description = "Listing ID"),
        ("start_date" = Option<NaiveDate>, Query, description = "Window start; defaults to today"),
        ("end_date" = Option<NaiveDate>, Query, description = "Window end; defaults to today + 90 days"),
    ),
    responses(
        (status = 200, description = "Day-by-day calendar", body = ApiResponse<Vec<CalendarDay>>)
    )
)]
#[tracing::instrument(skip(state))]
pub async fn get_calendar(
    State(state): State<Arc<AvailabilityAppState>>,
    Path((listing_type, listing_id)): Path<(ListingType, Uuid)>,
    Query(query): Query<WindowQuery>,
) -> Result<Json<ApiResponse<Vec<CalendarDay>>>, AvailabilityServiceError> {
    let listing = ListingRef::new(listing_type, listing_id);
    let window = query.into_window()?;

    let cache_key = window.map(|(start, end)| keys::calendar_key(listing, start, end));
    if let (Some(cache), Some(key)) = (&state.cache, &cache_key)
        && let Some(cached) = cache.get::<Vec<CalendarDay>>(key).await
    {
        return Ok(Json(ApiResponse::ok(cached)));
    }

    let days = state.availability.build_calendar(listing, window).await?;

    if let (Some(cache), Some(key)) = (&state.cache, &cache_key) {
        cache.set(key, &days, keys::TTL_CALENDAR).await;
    }

    Ok(Json(ApiResponse::ok(days)))
}

#[utoipa::path(
    get,
    path = "/api/v1/listings/{listing_type}/{listing_id}/analytics",
    tag = "Availability",
    operation_id = "get_analytics",
    params(
        ("listing_type" = ListingType, Path, description = "Listing type"),
        ("listing_id" = Uuid, Path, description = "Listing ID"),
        ("start_date" = Option<NaiveDate>, Query, description = "Window start; defaults to 30 days ago"),
        ("end_date" = Option<NaiveDate>, Query, description = "Window end; defaults to today"),
    ),
    responses(
        (status = 200, description = "Occupancy statistics", body = ApiResponse<CalendarAnalytics>)
    )
)]
#[tracing::instrument(skip(state))]
pub async fn get_analytics(
    State(state): State<Arc<AvailabilityAppState>>,
    Path((listing_type, listing_id)): Path<(ListingType, Uuid)>,
    Query(query): Query<WindowQuery>,
) -> Result<Json<ApiResponse<CalendarAnalytics>>, AvailabilityServiceError> {
    let listing = ListingRef::new(listing_type, listing_id);
    let window = query.into_window()?;

    let cache_key = window.map(|(start, end)| keys::analytics_key(listing, start, end));
    if let (Some(cache), Some(key)) = (&state.cache, &cache_key)
        && let Some(cached) = cache.get::<CalendarAnalytics>(key).await
    {
        return Ok(Json(ApiResponse::ok(cached)));
    }

    let analytics = state.availability.get_analytics(listing, window).await?;

    if let (Some(cache), Some(key)) = (&state.cache, &cache_key) {
        cache.set(key, &analytics, keys::TTL_ANALYTICS).await;
    }

    Ok(Json(ApiResponse::ok(analytics)))
}

#[utoipa::path(
    get,
    path = "/api/v1/listings/{listing_type}/{listing_id}/calendar.ics",
    tag = "Availability",
    operation_id = "export_calendar",
    params(
        ("listing_type" = ListingType, Path, description = "Listing type"),
        ("listing_id" = Uuid, Path, description = "Listing ID"),
        ("start_date" = Option<NaiveDate>, Query, description = "Window start; defaults to today"),
        ("end_date" = Option<NaiveDate>, Query, description = "Window end; defaults to today + 90 days"),
    ),
    responses(
        (status = 200, description = "iCalendar document", content_type = "text/calendar", body = String)
    )
)]
#[tracing::instrument(skip(state))]
pub async fn export_calendar(
    State(state): State<Arc<AvailabilityAppState>>,
    Path((listing_type, listing_id)): Path<(ListingType, Uuid)>,
    Query(query): Query<WindowQuery>,
) -> Result<impl IntoResponse, AvailabilityServiceError> {
    let listing = ListingRef::new(listing_type, listing_id);
    let window = query.into_window()?;

    let ics = state.availability.export_calendar(listing, window).await?;

    Ok((
        [(header::CONTENT_TYPE, "text/calendar; charset=utf-8")],
        ics,
    ))
}
