use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Standard JSON response envelope.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(bound(deserialize = "T: serde::de::DeserializeOwned"))]
pub struct ApiResponse<T: Serialize> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<String>,
}

impl<T: Serialize> ApiResponse<T> {
    /// Creates a success response wrapping the given data.
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    /// Creates an error response with the given error code or message.
    pub fn err(error_msg: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(error_msg.into()),
        }
    }

    /// Creates an error response that still carries a payload, e.g. the
    /// conflict list accompanying a `BOOKING_CONFLICT`.
    pub fn err_with_data(error_msg: impl Into<String>, data: T) -> Self {
        Self {
            success: false,
            data: Some(data),
            error: Some(error_msg.into()),
        }
    }
}

/// Response envelope for operations that return no data.
#[derive(Debug, Serialize, ToSchema)]
pub struct EmptyApiResponse {
    pub success: bool,
    pub error: Option<String>,
}

/// Response for the `/headpat` health check endpoint.
#[derive(Debug, Serialize, ToSchema)]
pub struct HeadpatResponse {
    pub message: &'static str,
}
