//! Rooms HTTP API for the Roomcast chat backend.
//!
//! This crate exposes the Room Store over HTTP/JSON with Axum:
//!
//! - **REST endpoints** under `/api/v1/rooms` to list, create, fetch,
//!   append to, and patch rooms
//! - **Health check** at `/healthz`
//!
//! Responses are wrapped as `{"status":"success","data":...}`; failures
//! are `{"status":"fail","error":...}` with a status code chosen by
//! [`ApiError`].
//!
//! Live updates are not served here. The change notifier in
//! `roomcast-relay` pushes them to clients through the relay.

pub mod error;
pub mod handlers;
pub mod router;
pub mod server;
pub mod state;

// Re-export primary types for convenience.
pub use error::ApiError;
pub use router::build_router;
pub use server::{DEFAULT_PORT, ServerConfig, ServerError, serve, start_server};
pub use state::AppState;
