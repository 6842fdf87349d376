//! Integration tests for the rooms API endpoints.
//!
//! Tests use Axum's `Router` directly via `tower::ServiceExt` without
//! starting a TCP server, against the in-memory Room Store. The live
//! update tests also run the change notifier over the same store with an
//! in-memory relay.

#![allow(clippy::unwrap_used, clippy::indexing_slicing)]

use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use roomcast_api::router::build_router;
use roomcast_api::state::AppState;
use roomcast_db::{MemoryRoomStore, RoomStore};
use roomcast_relay::{MemoryRelay, ROOMS_CHANNEL, Relay, UPDATED_EVENT, spawn_notifier};
use serde_json::{Value, json};
use tower::ServiceExt;

fn make_test_router() -> (MemoryRoomStore, Router) {
    let memory = MemoryRoomStore::new();
    let state = Arc::new(AppState::new(RoomStore::memory(memory.clone())));
    (memory, build_router(state))
}

async fn body_to_json(body: Body) -> Value {
    let bytes = axum::body::to_bytes(body, usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

fn json_request(method: &str, uri: &str, body: &Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn send(router: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    (status, body_to_json(response.into_body()).await)
}

async fn create(router: &Router, body: &Value) -> String {
    let (status, json) = send(router, json_request("POST", "/api/v1/rooms", body)).await;
    assert_eq!(status, StatusCode::CREATED);
    json["data"]["_id"].as_str().unwrap().to_owned()
}

fn hello() -> Value {
    json!({
        "message": "hi",
        "name": "alice",
        "timestamp": "t1",
        "received": false
    })
}

// =========================================================================
// Create / fetch / append
// =========================================================================

#[tokio::test]
async fn test_create_append_fetch() {
    let (_, router) = make_test_router();

    let (status, created) = send(
        &router,
        json_request("POST", "/api/v1/rooms", &json!({ "name": "general" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["status"], "success");
    assert_eq!(created["data"]["name"], "general");
    assert_eq!(created["data"]["messages"], json!([]));
    let id = created["data"]["_id"].as_str().unwrap().to_owned();

    let uri = format!("/api/v1/rooms/{id}");
    let (status, appended) = send(&router, json_request("POST", &uri, &hello())).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(appended["data"]["messages"].as_array().unwrap().len(), 1);

    let (status, fetched) = send(&router, Request::get(&uri).body(Body::empty()).unwrap()).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched["status"], "success");
    assert_eq!(fetched["data"]["messages"], json!([hello()]));
}

#[tokio::test]
async fn test_create_without_name_is_server_error() {
    let (memory, router) = make_test_router();

    let (status, json) = send(
        &router,
        json_request("POST", "/api/v1/rooms", &json!({ "lastMessage": "x" })),
    )
    .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(json["status"], "fail");
    assert!(json["error"].as_str().unwrap().contains("name"));
    assert!(memory.is_empty().await);
}

#[tokio::test]
async fn test_create_keeps_supplied_messages() {
    let (_, router) = make_test_router();

    let (status, json) = send(
        &router,
        json_request(
            "POST",
            "/api/v1/rooms",
            &json!({ "name": "seeded", "lastMessage": "hi", "messages": [hello()] }),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(json["data"]["lastMessage"], "hi");
    assert_eq!(json["data"]["messages"][0]["name"], "alice");
}

#[tokio::test]
async fn test_messages_keep_append_order() {
    let (_, router) = make_test_router();
    let id = create(&router, &json!({ "name": "general" })).await;
    let uri = format!("/api/v1/rooms/{id}");

    for body in ["one", "two", "three"] {
        let (status, _) = send(
            &router,
            json_request("POST", &uri, &json!({ "message": body })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
    }

    let (_, fetched) = send(&router, Request::get(&uri).body(Body::empty()).unwrap()).await;
    let bodies: Vec<&str> = fetched["data"]["messages"]
        .as_array()
        .unwrap()
        .iter()
        .map(|m| m["message"].as_str().unwrap())
        .collect();
    assert_eq!(bodies, vec!["one", "two", "three"]);
}

// =========================================================================
// Not found
// =========================================================================

#[tokio::test]
async fn test_get_room_not_found() {
    let (_, router) = make_test_router();

    let (status, json) = send(
        &router,
        Request::get("/api/v1/rooms/65a1b2c3d4e5f60718293a4b")
            .body(Body::empty())
            .unwrap(),
    )
    .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["status"], "fail");
    assert!(json["error"].is_string());
}

#[tokio::test]
async fn test_malformed_id_is_not_found() {
    let (_, router) = make_test_router();

    let (status, _) = send(
        &router,
        Request::get("/api/v1/rooms/not-an-id")
            .body(Body::empty())
            .unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(
        &router,
        json_request("POST", "/api/v1/rooms/not-an-id", &hello()),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_patch_unknown_room_is_not_found() {
    let (_, router) = make_test_router();

    let (status, json) = send(
        &router,
        json_request(
            "PATCH",
            "/api/v1/rooms/65a1b2c3d4e5f60718293a4b",
            &json!({ "name": "x" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["status"], "fail");
}

// =========================================================================
// Patch
// =========================================================================

#[tokio::test]
async fn test_patch_then_fetch() {
    let (_, router) = make_test_router();
    let id = create(&router, &json!({ "name": "general" })).await;
    let uri = format!("/api/v1/rooms/{id}");
    send(&router, json_request("POST", &uri, &hello())).await;

    let (status, patched) = send(
        &router,
        json_request("PATCH", &uri, &json!({ "name": "random", "lastMessage": "hi" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(patched["data"]["name"], "random");
    assert_eq!(patched["data"]["lastMessage"], "hi");

    let (_, fetched) = send(&router, Request::get(&uri).body(Body::empty()).unwrap()).await;
    assert_eq!(fetched["data"]["name"], "random");
    assert_eq!(fetched["data"]["messages"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_patch_replaces_messages() {
    let (_, router) = make_test_router();
    let id = create(&router, &json!({ "name": "general", "messages": [hello()] })).await;
    let uri = format!("/api/v1/rooms/{id}");
    send(&router, json_request("POST", &uri, &json!({ "message": "two" }))).await;

    let (status, patched) = send(
        &router,
        json_request("PATCH", &uri, &json!({ "messages": [{ "message": "only" }] })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(patched["data"]["messages"], json!([{ "message": "only" }]));
    assert_eq!(patched["data"]["name"], "general");

    let (_, fetched) = send(&router, Request::get(&uri).body(Body::empty()).unwrap()).await;
    assert_eq!(fetched["data"]["messages"], json!([{ "message": "only" }]));
}

#[tokio::test]
async fn test_patch_blank_name_is_rejected() {
    let (_, router) = make_test_router();
    let id = create(&router, &json!({ "name": "general" })).await;
    let uri = format!("/api/v1/rooms/{id}");

    let (status, _) = send(&router, json_request("PATCH", &uri, &json!({ "name": "  " }))).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);

    let (_, fetched) = send(&router, Request::get(&uri).body(Body::empty()).unwrap()).await;
    assert_eq!(fetched["data"]["name"], "general");
}

// =========================================================================
// List
// =========================================================================

#[tokio::test]
async fn test_list_projects_selected_fields() {
    let (_, router) = make_test_router();
    create(&router, &json!({ "name": "general", "lastMessage": "bye" })).await;
    create(&router, &json!({ "name": "random" })).await;

    let (status, json) = send(
        &router,
        Request::get("/api/v1/rooms?fields=name")
            .body(Body::empty())
            .unwrap(),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let rooms = json["data"].as_array().unwrap();
    assert_eq!(rooms.len(), 2);
    assert_eq!(rooms[0]["name"], "general");
    assert!(rooms[0]["_id"].is_string());
    assert!(rooms[0].get("lastMessage").is_none());
    assert!(rooms[0].get("messages").is_none());
}

#[tokio::test]
async fn test_list_without_selector_returns_everything() {
    let (_, router) = make_test_router();
    create(&router, &json!({ "name": "general", "lastMessage": "bye" })).await;

    let (status, json) = send(
        &router,
        Request::get("/api/v1/rooms").body(Body::empty()).unwrap(),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"][0]["lastMessage"], "bye");
    assert_eq!(json["data"][0]["messages"], json!([]));
}

#[tokio::test]
async fn test_list_rejects_operator_selector() {
    let (_, router) = make_test_router();

    let (status, json) = send(
        &router,
        Request::get("/api/v1/rooms?fields=$where")
            .body(Body::empty())
            .unwrap(),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["status"], "fail");
}

// =========================================================================
// Health
// =========================================================================

#[tokio::test]
async fn test_healthz() {
    let (_, router) = make_test_router();

    let (status, json) = send(&router, Request::get("/healthz").body(Body::empty()).unwrap()).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "ok");
    assert_eq!(json["store"], "memory");
}

// =========================================================================
// Live updates
// =========================================================================

#[tokio::test]
async fn test_only_updates_reach_the_relay() {
    let (memory, router) = make_test_router();
    let relay = MemoryRelay::new();
    let mut received = relay.subscribe();
    let notifier = spawn_notifier(memory.watch(), Relay::Memory(relay.clone()));

    let id = create(&router, &json!({ "name": "general" })).await;
    let (status, _) = send(
        &router,
        json_request("POST", &format!("/api/v1/rooms/{id}"), &hello()),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let event = tokio::time::timeout(Duration::from_secs(5), received.recv())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(event.channel, ROOMS_CHANNEL);
    assert_eq!(event.event, UPDATED_EVENT);
    assert_eq!(
        event.data["name"]["updatedFields"]["messages.0"],
        hello()
    );

    // The insert produced nothing, so the append is the only event.
    assert_eq!(relay.published().len(), 1);
    notifier.abort();
}
