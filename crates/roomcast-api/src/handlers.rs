//! REST endpoint handlers for the rooms API.
//!
//! Each handler makes at most one Room Store call and wraps the result in
//! the `{"status":"success","data":...}` envelope.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET` | `/api/v1/rooms` | List rooms, optionally projected with `?fields=` |
//! | `POST` | `/api/v1/rooms` | Create a room |
//! | `GET` | `/api/v1/rooms/{id}` | Fetch one room |
//! | `POST` | `/api/v1/rooms/{id}` | Append a message |
//! | `PATCH` | `/api/v1/rooms/{id}` | Update `name`, `lastMessage`, or `messages` |
//! | `GET` | `/healthz` | Store reachability |

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use roomcast_types::{FieldSelector, Message, NewRoom, Room, RoomId, RoomPatch, RoomProjection};
use serde::Serialize;

use crate::error::ApiError;
use crate::state::AppState;

/// Success envelope around every response payload.
#[derive(Debug, Clone, Serialize)]
pub struct Envelope<T> {
    /// Always `"success"`.
    pub status: &'static str,
    /// The response payload.
    pub data: T,
}

impl<T> Envelope<T> {
    /// Wrap `data` in a success envelope.
    pub const fn success(data: T) -> Self {
        Self {
            status: "success",
            data,
        }
    }
}

/// Query parameters for `GET /api/v1/rooms`.
#[derive(Debug, serde::Deserialize)]
pub struct ListQuery {
    /// Comma-separated top-level fields to return. All fields when absent.
    pub fields: Option<String>,
}

// ---------------------------------------------------------------------------
// GET /api/v1/rooms
// ---------------------------------------------------------------------------

/// List every room, projected to the requested fields.
pub async fn list_rooms(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Envelope<Vec<RoomProjection>>>, ApiError> {
    let selector = query
        .fields
        .as_deref()
        .map(FieldSelector::parse)
        .transpose()?;

    let rooms = state.store.list_rooms(selector.as_ref()).await?;
    Ok(Json(Envelope::success(rooms)))
}

// ---------------------------------------------------------------------------
// POST /api/v1/rooms
// ---------------------------------------------------------------------------

/// Create a room. A missing or blank `name` is a validation failure.
pub async fn create_room(
    State(state): State<Arc<AppState>>,
    Json(input): Json<NewRoom>,
) -> Result<(StatusCode, Json<Envelope<Room>>), ApiError> {
    let room = state.store.create_room(input).await?;
    tracing::info!(room_id = %room.id, name = %room.name, "Room created");
    Ok((StatusCode::CREATED, Json(Envelope::success(room))))
}

// ---------------------------------------------------------------------------
// GET /api/v1/rooms/{id}
// ---------------------------------------------------------------------------

/// Fetch a single room with its full message list.
pub async fn get_room(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Envelope<Room>>, ApiError> {
    let room = state.store.get_room(&RoomId::new(id)).await?;
    Ok(Json(Envelope::success(room)))
}

// ---------------------------------------------------------------------------
// POST /api/v1/rooms/{id}
// ---------------------------------------------------------------------------

/// Append the request body as a message and return the updated room.
pub async fn append_message(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(message): Json<Message>,
) -> Result<(StatusCode, Json<Envelope<Room>>), ApiError> {
    let room = state
        .store
        .append_message(&RoomId::new(id), &message)
        .await?;
    tracing::debug!(room_id = %room.id, messages = room.messages.len(), "Message appended");
    Ok((StatusCode::CREATED, Json(Envelope::success(room))))
}

// ---------------------------------------------------------------------------
// PATCH /api/v1/rooms/{id}
// ---------------------------------------------------------------------------

/// Apply a shallow update and return the updated room.
pub async fn patch_room(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(patch): Json<RoomPatch>,
) -> Result<(StatusCode, Json<Envelope<Room>>), ApiError> {
    let room = state.store.patch_room(&RoomId::new(id), &patch).await?;
    tracing::debug!(room_id = %room.id, fields = ?patch.touched_fields(), "Room patched");
    Ok((StatusCode::CREATED, Json(Envelope::success(room))))
}

// ---------------------------------------------------------------------------
// GET /healthz
// ---------------------------------------------------------------------------

/// Report whether the store answers.
pub async fn healthz(
    State(state): State<Arc<AppState>>,
) -> Result<Json<serde_json::Value>, ApiError> {
    state
        .store
        .ping()
        .await
        .map_err(|e| ApiError::Unavailable(format!("{} store: {e}", state.store.backend_name())))?;

    Ok(Json(serde_json::json!({
        "status": "ok",
        "store": state.store.backend_name(),
    })))
}
