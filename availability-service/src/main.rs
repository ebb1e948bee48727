use axum::{
    Router,
    routing::{delete, get, post, put},
};
use availability_service::{
    api::{
        handler::{availability, block, recurring},
        state::AvailabilityAppState,
    },
    domain::service::{AvailabilityConfig, AvailabilityService},
    infrastructure::{
        block::PgBlockRepository, booking::PgBookingRepository, cache::client::RedisCache,
        recurring::PgRecurringPatternRepository,
    },
};
use sqlx::postgres::PgPoolOptions;
use std::{env, net::SocketAddr, sync::Arc};
use tokio::net::TcpListener;
use tower_governor::{
    GovernorLayer, governor::GovernorConfigBuilder, key_extractor::SmartIpKeyExtractor,
};
use tower_http::trace::{DefaultOnRequest, DefaultOnResponse, TraceLayer};
use tracing::Level;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[derive(OpenApi)]
#[openapi(
    paths(
        availability::check_availability,
        availability::get_calendar,
        availability::get_analytics,
        availability::export_calendar,
        block::list_blocks,
        block::create_block,
        block::delete_block,
        block::create_bulk_blocks,
        recurring::list_recurring_blocks,
        recurring::create_recurring_block,
        recurring::update_recurring_block,
        recurring::delete_recurring_block,
    ),
    tags(
        (name = "Availability", description = "Conflict checks, calendar, analytics, export"),
        (name = "Blocks", description = "One-off availability blocks"),
        (name = "Recurring blocks", description = "Weekly recurring patterns"),
    )
)]
struct ApiDoc;

#[tokio::main]
async fn main() {
    let _guard = shared::telemetry::init_telemetry("availability-service");

    let database_url = env::var("DATABASE_URL").expect("DATABASE_URL must be set");
    let port = env::var("SERVER_PORT").unwrap_or_else(|_| "8082".to_string());

    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&database_url)
        .await
        .expect("Failed to establish connection into Postgres");

    sqlx::migrate!()
        .run(&pool)
        .await
        .expect("Failed to run database migrations");

    let cache = match env::var("REDIS_URL") {
        Ok(redis_url) => Some(
            RedisCache::new(&redis_url)
                .await
                .expect("Failed to connect to Redis"),
        ),
        Err(_) => {
            tracing::warn!("REDIS_URL not set, calendar caching disabled");
            None
        }
    };

    let config_path =
        env::var("AVAILABILITY_CONFIG_PATH").unwrap_or_else(|_| "availability.toml".to_string());
    let config = AvailabilityConfig::load(&config_path).expect("Failed to load availability config");

    let availability = Arc::new(AvailabilityService::new(
        Arc::new(PgBlockRepository::new(pool.clone())),
        Arc::new(PgRecurringPatternRepository::new(pool.clone())),
        Arc::new(PgBookingRepository::new(pool)),
        config,
    ));

    let state = Arc::new(AvailabilityAppState {
        availability,
        cache,
    });

    let governor_conf = GovernorConfigBuilder::default()
        .per_second(2)
        .burst_size(10)
        .key_extractor(SmartIpKeyExtractor)
        .use_headers()
        .finish()
        .expect("Failed to build governor config");

    let app = Router::new()
        .route(
            "/headpat",
            get(|| async {
                axum::Json(shared::responses::HeadpatResponse {
                    message: "nyaa~! calendars aligned, senpai! (=^-w-^=)",
                })
            }),
        )
        // Read endpoints
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
        // One-off blocks
        .route(
            "/api/v1/listings/{listing_type}/{listing_id}/blocks",
            get(block::list_blocks).post(block::create_block),
        )
        .route("/api/v1/blocks/bulk", post(block::create_bulk_blocks))
        .route("/api/v1/blocks/{id}", delete(block::delete_block))
        // Recurring patterns
        .route(
            "/api/v1/listings/{listing_type}/{listing_id}/recurring-blocks",
            get(recurring::list_recurring_blocks).post(recurring::create_recurring_block),
        )
        .route(
            "/api/v1/recurring-blocks/{id}",
            put(recurring::update_recurring_block).delete(recurring::delete_recurring_block),
        )
        // Swagger UI
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        // Rate limiting (per-IP, 2 req/s with burst of 10)
        .layer(GovernorLayer::new(governor_conf))
        // tracing log (turn request into info level)
        .layer(
            TraceLayer::new_for_http()
                .on_request(DefaultOnRequest::new().level(Level::INFO))
                .on_response(
                    DefaultOnResponse::new()
                        .level(Level::INFO)
                        .latency_unit(tower_http::LatencyUnit::Millis),
                ),
        )
        .with_state(state);

    tracing::info!("availability-service listening on 0.0.0.0:{port}");

    let listener = TcpListener::bind(format!("0.0.0.0:{port}"))
        .await
        .expect("Failed to bind");

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shared::shutdown::shutdown_signal())
    .await
    .expect("Oppsie! Server crashed!");

    tracing::info!("availability-service shut down");
}
