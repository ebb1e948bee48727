use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use shared::responses::ApiResponse;
use shared::types::ConflictDescriptor;
use thiserror::Error;
use uuid::Uuid;

/// Application-level errors for the availability service.
///
/// The stable error codes ([`Self::code`]) are part of the API contract:
/// callers branch on them, so they are carried verbatim in the response
/// envelope. Each variant maps to an HTTP status via [`IntoResponse`].
#[derive(Debug, Error)]
pub enum AvailabilityServiceError {
    /// `start_date` is after `end_date`, or an effective date is out of range.
    #[error("Invalid date range: {0}")]
    InvalidDateRange(String),

    /// The weekday set is empty or contains a value outside `0..=6`.
    #[error("Invalid days of week: {0}")]
    InvalidDaysOfWeek(String),

    /// The requested range overlaps at least one active booking.
    #[error("Booking conflict: {} overlapping booking(s)", .0.len())]
    BookingConflict(Vec<ConflictDescriptor>),

    /// No availability block with the given id.
    #[error("Block {0} not found")]
    BlockNotFound(Uuid),

    /// No recurring pattern with the given id.
    #[error("Recurring block {0} not found")]
    RecurringBlockNotFound(Uuid),

    /// Requester is not permitted to mutate this entity.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Malformed request shape (missing scope date, inconsistent params).
    #[error("Bad Request: {0}")]
    BadRequest(String),

    /// Database query or connection error.
    #[error("Database Error: {0}")]
    Database(#[from] sqlx::Error),
}

impl AvailabilityServiceError {
    /// Stable error code surfaced to callers.
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidDateRange(_) => "INVALID_DATE_RANGE",
            Self::InvalidDaysOfWeek(_) => "INVALID_DAYS_OF_WEEK",
            Self::BookingConflict(_) => "BOOKING_CONFLICT",
            Self::BlockNotFound(_) => "BLOCK_NOT_FOUND",
            Self::RecurringBlockNotFound(_) => "RECURRING_BLOCK_NOT_FOUND",
            Self::Unauthorized(_) => "UNAUTHORIZED",
            Self::BadRequest(_) => "BAD_REQUEST",
            Self::Database(_) => "INTERNAL_ERROR",
        }
    }
}

impl IntoResponse for AvailabilityServiceError {
    fn into_response(self) -> Response {
        let status = match &self {
            Self::InvalidDateRange(_) | Self::InvalidDaysOfWeek(_) | Self::BadRequest(_) => {
                StatusCode::BAD_REQUEST
            }
            Self::BookingConflict(_) => StatusCode::CONFLICT,
            Self::BlockNotFound(_) | Self::RecurringBlockNotFound(_) => StatusCode::NOT_FOUND,
            Self::Unauthorized(_) => StatusCode::FORBIDDEN,
            Self::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        if status.is_server_error() {
            tracing::error!(error = %self, %status, "Server error");
        } else {
            tracing::warn!(error = %self, %status, "Client error");
        }

        let code = self.code();
        let body = match self {
            // Conflict responses carry the conflict list so the caller can
            // render an actionable message.
            Self::BookingConflict(conflicts) => {
                ApiResponse::err_with_data(code, conflicts)
            }
            _ => ApiResponse::<Vec<ConflictDescriptor>>::err(code),
        };

        (status, axum::Json(body)).into_response()
    }
}
