//! Error types for the rooms HTTP API.
//!
//! [`ApiError`] is what every handler returns on failure. Its
//! [`IntoResponse`](axum::response::IntoResponse) implementation picks the
//! status code and renders the `{"status":"fail","error":...}` body that
//! chat clients expect.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use roomcast_db::DbError;
use roomcast_types::SelectorError;

/// Errors that can occur in the rooms API layer.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// The Room Store rejected or failed the operation.
    #[error(transparent)]
    Store(#[from] DbError),

    /// The `fields` query parameter could not be parsed.
    #[error("invalid query: {0}")]
    InvalidQuery(#[from] SelectorError),

    /// A dependency the service needs is not reachable.
    #[error("service unavailable: {0}")]
    Unavailable(String),
}

impl ApiError {
    /// The HTTP status this error is reported with.
    ///
    /// A malformed or unknown room id is `404`. Schema violations stay
    /// `500`, which existing clients already handle. Timeouts and driver
    /// faults are `500` too, and are no longer reported as `404`.
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::Store(e) if e.is_not_found() => StatusCode::NOT_FOUND,
            Self::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::InvalidQuery(_) => StatusCode::BAD_REQUEST,
            Self::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, status = status.as_u16(), "Request failed");
        } else {
            tracing::debug!(error = %self, status = status.as_u16(), "Request rejected");
        }

        let body = serde_json::json!({
            "status": "fail",
            "error": self.to_string(),
        });

        (status, axum::Json(body)).into_response()
    }
}
