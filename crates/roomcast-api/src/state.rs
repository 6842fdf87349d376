//! Shared application state for the rooms API.

use roomcast_db::RoomStore;

/// State injected into every handler via Axum's `State` extractor.
///
/// Handlers keep nothing between requests; the store is the only shared
/// resource.
#[derive(Clone)]
pub struct AppState {
    /// The Room Store every handler talks to.
    pub store: RoomStore,
}

impl AppState {
    /// Create state around `store`.
    pub const fn new(store: RoomStore) -> Self {
        Self { store }
    }
}
