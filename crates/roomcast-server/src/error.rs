//! Error types for the server binary.
//!
//! Uses `thiserror` to fold configuration, store, relay, and HTTP server
//! failures into one type that `main` can report.

use roomcast_db::DbError;
use roomcast_relay::RelayError;

/// Errors that can stop the server from starting or running.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    /// Configuration is invalid or missing.
    #[error("config error: {0}")]
    Config(String),

    /// The Room Store could not be reached or opened.
    #[error("store error: {0}")]
    Store(#[from] DbError),

    /// The relay client could not be built.
    #[error("relay error: {0}")]
    Relay(#[from] RelayError),

    /// The HTTP server failed to bind or serve.
    #[error("http error: {0}")]
    Http(#[from] roomcast_api::ServerError),
}
