//! Axum router construction for the rooms API.
//!
//! Assembles every route into a single [`Router`] with CORS open to any
//! origin (browser chat clients call the API directly) and per-request
//! tracing.

use std::sync::Arc;

use axum::Router;
use axum::routing::get;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::state::AppState;

/// Build the complete Axum router.
///
/// The router includes:
/// - `GET /api/v1/rooms` -- list rooms (`?fields=` projection)
/// - `POST /api/v1/rooms` -- create a room
/// - `GET /api/v1/rooms/{id}` -- fetch a room
/// - `POST /api/v1/rooms/{id}` -- append a message
/// - `PATCH /api/v1/rooms/{id}` -- update room fields
/// - `GET /healthz` -- store health check
pub fn build_router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route(
            "/api/v1/rooms",
            get(handlers::list_rooms).post(handlers::create_room),
        )
        .route(
            "/api/v1/rooms/{id}",
            get(handlers::get_room)
                .post(handlers::append_message)
                .patch(handlers::patch_room),
        )
        .route("/healthz", get(handlers::healthz))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
