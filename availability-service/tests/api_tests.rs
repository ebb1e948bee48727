use std::sync::Arc;

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode},
    routing::{delete, get, post, put},
};
use chrono::{NaiveDate, Utc};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tower::ServiceExt;
use uuid::Uuid;

use availability_service::{
    api::{
        handler::{availability, block, recurring},
        state::AvailabilityAppState,
    },
    domain::{
        block::MockBlockRepository,
        booking::MockBookingRepository,
        recurring::MockRecurringPatternRepository,
        service::{AvailabilityConfig, AvailabilityService},
    },
};
use shared::types::{
    AvailabilityBlock, Booking, BookingStatus, ListingType, RecurringPattern,
};

fn build_test_app(
    mock_blocks: MockBlockRepository,
    mock_recurring: MockRecurringPatternRepository,
    mock_bookings: MockBookingRepository,
) -> Router {
    let service = Arc::new(AvailabilityService::new(
        Arc::new(mock_blocks),
        Arc::new(mock_recurring),
        Arc::new(mock_bookings),
        AvailabilityConfig::default(),
    ));
    let state = Arc::new(AvailabilityAppState {
        availability: service,
        cache: None,
    });

    Router::new()
        .route(
            "/api/v1/listings/{listing_type}/{listing_id}/availability",
            get(availability::check_availability),
        )
        .route(
            "/api/v1/listings/{listing_type}/{listing_id}/calendar",
            get(availability::get_calendar),
        )
        .route(
            "/api/v1/listings/{listing_type}/{listing_id}/analytics",
            get(availability::get_analytics),
        )
        .route(
            "/api/v1/listings/{listing_type}/{listing_id}/calendar.ics",
            get(availability::export_calendar),
        )
        .route(
            "/api/v1/listings/{listing_type}/{listing_id}/blocks",
            get(block::list_blocks).post(block::create_block),
        )
        .route("/api/v1/blocks/bulk", post(block::create_bulk_blocks))
        .route("/api/v1/blocks/{id}", delete(block::delete_block))
        .route(
            "/api/v1/listings/{listing_type}/{listing_id}/recurring-blocks",
            get(recurring::list_recurring_blocks).post(recurring::create_recurring_block),
        )
        .route(
            "/api/v1/recurring-blocks/{id}",
            put(recurring::update_recurring_block).delete(recurring::delete_recurring_block),
        )
        .with_state(state)
}

fn d(y: i32, m: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, day).unwrap()
}

fn make_booking(
    listing_id: Uuid,
    start: NaiveDate,
    end: NaiveDate,
    status: BookingStatus,
) -> Booking {
    Booking {
        id: Uuid::new_v4(),
        listing_id,
        listing_type: ListingType::Vehicle,
        booking_number: "BK-1001".to_string(),
        start_date: start,
        end_date: end,
        status,
    }
}

fn make_block(listing_id: Uuid, start: NaiveDate, end: NaiveDate) -> AvailabilityBlock {
    let now = Utc::now();
    AvailabilityBlock {
        id: Uuid::new_v4(),
        listing_id,
        listing_type: ListingType::Vehicle,
        start_date: start,
        end_date: end,
        reason: Some("Maintenance".to_string()),
        is_recurring: false,
        recurring_pattern_id: None,
        created_by: Uuid::new_v4(),
        created_at: now,
        updated_at: now,
    }
}

fn make_pattern(listing_id: Uuid, days: Vec<i16>, start: NaiveDate) -> RecurringPattern {
    let now = Utc::now();
    RecurringPattern {
        id: Uuid::new_v4(),
        listing_id,
        listing_type: ListingType::Vehicle,
        days_of_week: days,
        start_date: start,
        end_date: None,
        reason: Some("Weekly service".to_string()),
        created_by: Uuid::new_v4(),
        created_at: now,
        updated_at: now,
    }
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn check_availability_reports_booking_conflict() {
    let listing_id = Uuid::new_v4();
    let booking = make_booking(
        listing_id,
        d(2024, 1, 2),
        d(2024, 1, 4),
        BookingStatus::Accepted,
    );

    let mut mock_bookings = MockBookingRepository::new();
    let returned = booking.clone();
    mock_bookings
        .expect_find_active_overlapping()
        .returning(move |_, _, _| Ok(vec![returned.clone()]));

    let mut mock_blocks = MockBlockRepository::new();
    mock_blocks
        .expect_find_overlapping()
        .returning(|_, _, _| Ok(vec![]));

    let mut mock_recurring = MockRecurringPatternRepository::new();
    mock_recurring
        .expect_find_overlapping()
        .returning(|_, _, _| Ok(vec![]));

    let app = build_test_app(mock_blocks, mock_recurring, mock_bookings);

    let response = app
        .oneshot(
            Request::builder()
                .uri(format!(
                    "/api/v1/listings/vehicle/{listing_id}/availability?start_date=2024-01-03&end_date=2024-01-03"
                ))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["data"]["available"], json!(false));
    let conflicts = body["data"]["conflicts"].as_array().unwrap();
    assert_eq!(conflicts.len(), 1);
    assert_eq!(conflicts[0]["type"], json!("booking"));
    assert_eq!(conflicts[0]["reference_label"], json!("BK-1001"));
}

#[tokio::test]
async fn check_availability_rejects_inverted_range() {
    let app = build_test_app(
        MockBlockRepository::new(),
        MockRecurringPatternRepository::new(),
        MockBookingRepository::new(),
    );

    let response = app
        .oneshot(
            Request::builder()
                .uri(format!(
                    "/api/v1/listings/driver/{}/availability?start_date=2024-01-05&end_date=2024-01-01",
                    Uuid::new_v4()
                ))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["error"], json!("INVALID_DATE_RANGE"));
}

#[tokio::test]
async fn create_block_succeeds_without_booking_overlap() {
    let listing_id = Uuid::new_v4();
    let created = make_block(listing_id, d(2024, 2, 1), d(2024, 2, 5));

    let mut mock_bookings = MockBookingRepository::new();
    mock_bookings
        .expect_find_active_overlapping()
        .returning(|_, _, _| Ok(vec![]));

    let mut mock_blocks = MockBlockRepository::new();
    let returned = created.clone();
    mock_blocks
        .expect_insert()
        .withf(move |b| {
            b.listing.id == listing_id
                && b.start_date == d(2024, 2, 1)
                && b.end_date == d(2024, 2, 5)
        })
        .returning(move |_| Ok(returned.clone()));

    let app = build_test_app(
        mock_blocks,
        MockRecurringPatternRepository::new(),
        mock_bookings,
    );

    let body = json!({
        "start_date": "2024-02-01",
        "end_date": "2024-02-05",
        "reason": "Maintenance",
        "created_by": Uuid::new_v4(),
    });

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(format!("/api/v1/listings/vehicle/{listing_id}/blocks"))
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["success"], json!(true));
    assert_eq!(body["data"]["start_date"], json!("2024-02-01"));
    assert_eq!(body["data"]["end_date"], json!("2024-02-05"));
}

#[tokio::test]
async fn create_block_fails_on_booking_conflict() {
    let listing_id = Uuid::new_v4();
    let booking = make_booking(
        listing_id,
        d(2024, 1, 2),
        d(2024, 1, 4),
        BookingStatus::Accepted,
    );

    let mut mock_bookings = MockBookingRepository::new();
    let returned = booking.clone();
    mock_bookings
        .expect_find_active_overlapping()
        .returning(move |_, _, _| Ok(vec![returned.clone()]));

    // insert must never be called
    let app = build_test_app(
        MockBlockRepository::new(),
        MockRecurringPatternRepository::new(),
        mock_bookings,
    );

    let body = json!({
        "start_date": "2024-01-03",
        "end_date": "2024-01-06",
        "created_by": Uuid::new_v4(),
    });

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(format!("/api/v1/listings/vehicle/{listing_id}/blocks"))
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CONFLICT);
    let body = body_json(response).await;
    assert_eq!(body["error"], json!("BOOKING_CONFLICT"));
    let conflicts = body["data"].as_array().unwrap();
    assert_eq!(conflicts.len(), 1);
    assert_eq!(conflicts[0]["type"], json!("booking"));
    assert_eq!(conflicts[0]["reference_id"], json!(booking.id));
}

#[tokio::test]
async fn delete_block_requires_creator() {
    let existing = make_block(Uuid::new_v4(), d(2024, 1, 1), d(2024, 1, 2));
    let block_id = existing.id;

    let mut mock_blocks = MockBlockRepository::new();
    mock_blocks
        .expect_find_by_id()
        .returning(move |_| Ok(Some(existing.clone())));

    let app = build_test_app(
        mock_blocks,
        MockRecurringPatternRepository::new(),
        MockBookingRepository::new(),
    );

    let response = app
        .oneshot(
            Request::builder()
                .method("DELETE")
                .uri(format!(
                    "/api/v1/blocks/{block_id}?requested_by={}",
                    Uuid::new_v4()
                ))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    let body = body_json(response).await;
    assert_eq!(body["error"], json!("UNAUTHORIZED"));
}

#[tokio::test]
async fn delete_missing_block_returns_not_found() {
    let mut mock_blocks = MockBlockRepository::new();
    mock_blocks.expect_find_by_id().returning(|_| Ok(None));

    let app = build_test_app(
        mock_blocks,
        MockRecurringPatternRepository::new(),
        MockBookingRepository::new(),
    );

    let response = app
        .oneshot(
            Request::builder()
                .method("DELETE")
                .uri(format!(
                    "/api/v1/blocks/{}?requested_by={}",
                    Uuid::new_v4(),
                    Uuid::new_v4()
                ))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body = body_json(response).await;
    assert_eq!(body["error"], json!("BLOCK_NOT_FOUND"));
}

#[tokio::test]
async fn create_recurring_block_rejects_bad_weekdays() {
    let app = build_test_app(
        MockBlockRepository::new(),
        MockRecurringPatternRepository::new(),
        MockBookingRepository::new(),
    );

    let body = json!({
        "days_of_week": [1, 9],
        "start_date": "2024-01-01",
        "created_by": Uuid::new_v4(),
    });

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(format!(
                    "/api/v1/listings/driver/{}/recurring-blocks",
                    Uuid::new_v4()
                ))
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["error"], json!("INVALID_DAYS_OF_WEEK"));
}

#[tokio::test]
async fn future_scope_update_splits_the_series() {
    let listing_id = Uuid::new_v4();
    let original = make_pattern(listing_id, vec![1, 3, 5], d(2024, 1, 1));
    let pattern_id = original.id;
    let editor = original.created_by;

    let mut mock_recurring = MockRecurringPatternRepository::new();
    let found = original.clone();
    mock_recurring
        .expect_find_by_id()
        .returning(move |_| Ok(Some(found.clone())));

    // original series closes the day before the effective date, in the
    // same write as the replacement insert
    let mut replacement = make_pattern(listing_id, vec![2, 4], d(2024, 1, 15));
    replacement.created_by = editor;
    let inserted = replacement.clone();
    mock_recurring
        .expect_split()
        .withf(move |id, cutoff, p| {
            *id == pattern_id
                && *cutoff == d(2024, 1, 14)
                && p.start_date == d(2024, 1, 15)
                && p.days_of_week == vec![2, 4]
        })
        .times(1)
        .returning(move |_, _, _| Ok(inserted.clone()));

    let app = build_test_app(
        MockBlockRepository::new(),
        mock_recurring,
        MockBookingRepository::new(),
    );

    let body = json!({
        "scope": "future",
        "update_date": "2024-01-15",
        "requested_by": editor,
        "days_of_week": [2, 4],
    });

    let response = app
        .oneshot(
            Request::builder()
                .method("PUT")
                .uri(format!("/api/v1/recurring-blocks/{pattern_id}"))
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["data"]["start_date"], json!("2024-01-15"));
    assert_eq!(body["data"]["days_of_week"], json!([2, 4]));
}

#[tokio::test]
async fn bulk_blocks_isolate_per_listing_failures() {
    let clear_listing = Uuid::new_v4();
    let busy_listing = Uuid::new_v4();
    let booking = make_booking(
        busy_listing,
        d(2024, 3, 1),
        d(2024, 3, 3),
        BookingStatus::Active,
    );

    let mut mock_bookings = MockBookingRepository::new();
    let returned = booking.clone();
    mock_bookings
        .expect_find_active_overlapping()
        .returning(move |listing, _, _| {
            if listing.id == busy_listing {
                Ok(vec![returned.clone()])
            } else {
                Ok(vec![])
            }
        });

    let mut mock_blocks = MockBlockRepository::new();
    let created = make_block(clear_listing, d(2024, 3, 1), d(2024, 3, 5));
    mock_blocks
        .expect_insert()
        .withf(move |b| b.listing.id == clear_listing)
        .times(1)
        .returning(move |_| Ok(created.clone()));

    let app = build_test_app(
        mock_blocks,
        MockRecurringPatternRepository::new(),
        mock_bookings,
    );

    let body = json!({
        "listing_ids": [clear_listing, busy_listing],
        "listing_type": "vehicle",
        "start_date": "2024-03-01",
        "end_date": "2024-03-05",
        "reason": "Fleet recall",
        "created_by": Uuid::new_v4(),
    });

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/v1/blocks/bulk")
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(
        body["data"]["successful_listing_ids"],
        json!([clear_listing])
    );
    let failures = body["data"]["failures"].as_array().unwrap();
    assert_eq!(failures.len(), 1);
    assert_eq!(failures[0]["listing_id"], json!(busy_listing));
    assert_eq!(failures[0]["reason"], json!("BOOKING_CONFLICT"));
    assert_eq!(failures[0]["conflicts"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn bulk_blocks_reject_inverted_range_globally() {
    let app = build_test_app(
        MockBlockRepository::new(),
        MockRecurringPatternRepository::new(),
        MockBookingRepository::new(),
    );

    let body = json!({
        "listing_ids": [Uuid::new_v4()],
        "listing_type": "driver",
        "start_date": "2024-03-05",
        "end_date": "2024-03-01",
        "created_by": Uuid::new_v4(),
    });

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/v1/blocks/bulk")
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["error"], json!("INVALID_DATE_RANGE"));
}

#[tokio::test]
async fn calendar_is_complete_and_prefers_bookings() {
    let listing_id = Uuid::new_v4();
    let booking = make_booking(
        listing_id,
        d(2024, 1, 2),
        d(2024, 1, 4),
        BookingStatus::Accepted,
    );
    let blk = make_block(listing_id, d(2024, 1, 1), d(2024, 1, 10));

    let mut mock_bookings = MockBookingRepository::new();
    let returned = booking.clone();
    mock_bookings
        .expect_find_active_overlapping()
        .returning(move |_, _, _| Ok(vec![returned.clone()]));

    let mut mock_blocks = MockBlockRepository::new();
    let returned = blk.clone();
    mock_blocks
        .expect_find_overlapping()
        .returning(move |_, _, _| Ok(vec![returned.clone()]));

    let mut mock_recurring = MockRecurringPatternRepository::new();
    mock_recurring
        .expect_find_overlapping()
        .returning(|_, _, _| Ok(vec![]));

    let app = build_test_app(mock_blocks, mock_recurring, mock_bookings);

    let response = app
        .oneshot(
            Request::builder()
                .uri(format!(
                    "/api/v1/listings/vehicle/{listing_id}/calendar?start_date=2024-01-01&end_date=2024-01-05"
                ))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    let days = body["data"].as_array().unwrap();
    assert_eq!(days.len(), 5);
    assert_eq!(days[0]["date"], json!("2024-01-01"));
    assert_eq!(days[0]["status"], json!("blocked"));
    // day with both a booking and a block renders booked
    assert_eq!(days[1]["status"], json!("booked"));
    assert_eq!(days[1]["detail"], json!("BK-1001"));
    assert_eq!(days[4]["status"], json!("blocked"));
}

#[tokio::test]
async fn analytics_counts_days_and_occupancy() {
    let listing_id = Uuid::new_v4();
    let booking = make_booking(
        listing_id,
        d(2024, 1, 1),
        d(2024, 1, 3),
        BookingStatus::Completed,
    );

    let mut mock_bookings = MockBookingRepository::new();
    let returned = booking.clone();
    mock_bookings
        .expect_find_active_overlapping()
        .returning(move |_, _, _| Ok(vec![returned.clone()]));

    let mut mock_blocks = MockBlockRepository::new();
    mock_blocks
        .expect_find_overlapping()
        .returning(|_, _, _| Ok(vec![]));

    let mut mock_recurring = MockRecurringPatternRepository::new();
    mock_recurring
        .expect_find_overlapping()
        .returning(|_, _, _| Ok(vec![]));

    let app = build_test_app(mock_blocks, mock_recurring, mock_bookings);

    let response = app
        .oneshot(
            Request::builder()
                .uri(format!(
                    "/api/v1/listings/vehicle/{listing_id}/analytics?start_date=2024-01-01&end_date=2024-01-10"
                ))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["data"]["total_days"], json!(10));
    assert_eq!(body["data"]["booked_days"], json!(3));
    assert_eq!(body["data"]["available_days"], json!(7));
    let rate = body["data"]["occupancy_rate"].as_f64().unwrap();
    assert!((rate - 0.3).abs() < 1e-9);
}

#[tokio::test]
async fn export_calendar_returns_icalendar_document() {
    let listing_id = Uuid::new_v4();
    let blk = make_block(listing_id, d(2024, 1, 2), d(2024, 1, 3));

    let mut mock_bookings = MockBookingRepository::new();
    mock_bookings
        .expect_find_active_overlapping()
        .returning(|_, _, _| Ok(vec![]));

    let mut mock_blocks = MockBlockRepository::new();
    let returned = blk.clone();
    mock_blocks
        .expect_find_overlapping()
        .returning(move |_, _, _| Ok(vec![returned.clone()]));

    let mut mock_recurring = MockRecurringPatternRepository::new();
    mock_recurring
        .expect_find_overlapping()
        .returning(|_, _, _| Ok(vec![]));

    let app = build_test_app(mock_blocks, mock_recurring, mock_bookings);

    let response = app
        .oneshot(
            Request::builder()
                .uri(format!(
                    "/api/v1/listings/vehicle/{listing_id}/calendar.ics?start_date=2024-01-01&end_date=2024-01-05"
                ))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()["content-type"],
        "text/calendar; charset=utf-8"
    );
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let ics = String::from_utf8(bytes.to_vec()).unwrap();
    assert!(ics.starts_with("BEGIN:VCALENDAR\r\n"));
    assert!(ics.contains("DTSTART;VALUE=DATE:20240102"));
    assert!(ics.contains("DTEND;VALUE=DATE:20240104"));
    assert!(ics.contains("SUMMARY:Blocked: Maintenance"));
}
