//! Room Store for the Roomcast chat backend (`MongoDB` + in-memory).
//!
//! `MongoDB` holds the `rooms` collection; its change stream feeds the
//! change notifier. The in-memory backend implements the same operations
//! and emits the same change events, for tests and local development.
//!
//! # Architecture
//!
//! ```text
//! HTTP handlers
//!     |
//!     +-- RoomStore (deadline per call)
//!         |-- MongoRoomStore   ($push / $set on the rooms collection)
//!         +-- MemoryRoomStore  (RwLock<Vec<Room>> + broadcast)
//!
//! RoomStore::watch() --> ChangeFeed --> change notifier
//! ```
//!
//! # Modules
//!
//! - [`mongo`] -- `MongoDB` client configuration and handle
//! - [`mongo_store`] -- Room operations on the `rooms` collection
//! - [`memory_store`] -- In-process room store
//! - [`room_store`] -- Backend dispatch with operation deadlines
//! - [`change_feed`] -- Change events as a stream
//! - [`documents`] -- Stored BSON document shapes
//! - [`error`] -- Shared error types

pub mod change_feed;
pub mod documents;
pub mod error;
pub mod memory_store;
pub mod mongo;
pub mod mongo_store;
pub mod room_store;

// Re-export primary types for convenience.
pub use change_feed::ChangeFeed;
pub use error::DbError;
pub use memory_store::MemoryRoomStore;
pub use mongo::{MongoConfig, MongoPool};
pub use mongo_store::{MongoRoomStore, ROOMS_COLLECTION};
pub use room_store::{DEFAULT_OPERATION_TIMEOUT_MS, RoomStore, StoreBackend};
