//! The Room Store: durable CRUD access to room documents.
//!
//! [`RoomStore`] dispatches to a concrete backend through the
//! [`StoreBackend`] enum (async methods are not dyn-compatible, so there
//! is no trait object here) and bounds every call with a deadline so a
//! hung server cannot stall a request forever.

use std::future::Future;
use std::time::Duration;

use roomcast_types::{FieldSelector, Message, NewRoom, Room, RoomId, RoomPatch, RoomProjection};

use crate::change_feed::ChangeFeed;
use crate::error::DbError;
use crate::memory_store::MemoryRoomStore;
use crate::mongo_store::MongoRoomStore;

/// Default per-operation deadline in milliseconds.
pub const DEFAULT_OPERATION_TIMEOUT_MS: u64 = 5_000;

/// A concrete room storage backend.
#[derive(Clone)]
pub enum StoreBackend {
    /// `MongoDB` `rooms` collection.
    Mongo(MongoRoomStore),
    /// In-process store.
    Memory(MemoryRoomStore),
}

/// Room operations with a per-call deadline.
#[derive(Clone)]
pub struct RoomStore {
    backend: StoreBackend,
    operation_timeout: Duration,
}

impl RoomStore {
    /// Wrap a backend with the default deadline.
    pub const fn new(backend: StoreBackend) -> Self {
        Self {
            backend,
            operation_timeout: Duration::from_millis(DEFAULT_OPERATION_TIMEOUT_MS),
        }
    }

    /// A store backed by `MongoDB`.
    pub const fn mongo(store: MongoRoomStore) -> Self {
        Self::new(StoreBackend::Mongo(store))
    }

    /// A store backed by memory.
    pub const fn memory(store: MemoryRoomStore) -> Self {
        Self::new(StoreBackend::Memory(store))
    }

    /// Set the per-operation deadline.
    #[must_use]
    pub const fn with_operation_timeout(mut self, timeout: Duration) -> Self {
        self.operation_timeout = timeout;
        self
    }

    /// The wrapped backend.
    pub const fn backend(&self) -> &StoreBackend {
        &self.backend
    }

    /// Human-readable backend name for logging.
    pub const fn backend_name(&self) -> &'static str {
        match self.backend {
            StoreBackend::Mongo(_) => "mongodb",
            StoreBackend::Memory(_) => "memory",
        }
    }

    /// List every room, projected to `selector` when given.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Timeout`] or a driver error if the store fails.
    pub async fn list_rooms(
        &self,
        selector: Option<&FieldSelector>,
    ) -> Result<Vec<RoomProjection>, DbError> {
        self.bounded("list_rooms", async {
            match &self.backend {
                StoreBackend::Mongo(store) => store.list_rooms(selector).await,
                StoreBackend::Memory(store) => store.list_rooms(selector).await,
            }
        })
        .await
    }

    /// Fetch one room.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::InvalidId`] for a malformed id and
    /// [`DbError::NotFound`] when no room has that id.
    pub async fn get_room(&self, id: &RoomId) -> Result<Room, DbError> {
        self.bounded("get_room", async {
            match &self.backend {
                StoreBackend::Mongo(store) => store.get_room(id).await,
                StoreBackend::Memory(store) => store.get_room(id).await,
            }
        })
        .await
    }

    /// Atomically append `message` to the room and return the updated room.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::InvalidId`] or [`DbError::NotFound`] for an
    /// unknown room.
    pub async fn append_message(&self, id: &RoomId, message: &Message) -> Result<Room, DbError> {
        self.bounded("append_message", async {
            match &self.backend {
                StoreBackend::Mongo(store) => store.append_message(id, message).await,
                StoreBackend::Memory(store) => store.append_message(id, message).await,
            }
        })
        .await
    }

    /// Apply a shallow patch and return the updated room.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Validation`] for a blank name, and
    /// [`DbError::InvalidId`] or [`DbError::NotFound`] for an unknown room.
    pub async fn patch_room(&self, id: &RoomId, patch: &RoomPatch) -> Result<Room, DbError> {
        self.bounded("patch_room", async {
            match &self.backend {
                StoreBackend::Mongo(store) => store.patch_room(id, patch).await,
                StoreBackend::Memory(store) => store.patch_room(id, patch).await,
            }
        })
        .await
    }

    /// Create a room.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Validation`] when `name` is missing or blank.
    pub async fn create_room(&self, input: NewRoom) -> Result<Room, DbError> {
        self.bounded("create_room", async {
            match &self.backend {
                StoreBackend::Mongo(store) => store.create_room(input).await,
                StoreBackend::Memory(store) => store.create_room(input).await,
            }
        })
        .await
    }

    /// Open the change feed for the rooms collection.
    ///
    /// Only opening the feed is bounded; the feed itself lives until the
    /// consumer drops it.
    ///
    /// # Errors
    ///
    /// Returns a driver error if the change stream cannot be opened (for
    /// example on a standalone `MongoDB` server).
    pub async fn watch(&self) -> Result<ChangeFeed, DbError> {
        self.bounded("watch", async {
            match &self.backend {
                StoreBackend::Mongo(store) => store.watch().await,
                StoreBackend::Memory(store) => Ok(store.watch()),
            }
        })
        .await
    }

    /// Check that the backend is reachable.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Timeout`] or a driver error when it is not.
    pub async fn ping(&self) -> Result<(), DbError> {
        self.bounded("ping", async {
            match &self.backend {
                StoreBackend::Mongo(store) => store.ping().await,
                StoreBackend::Memory(_) => Ok(()),
            }
        })
        .await
    }

    async fn bounded<T>(
        &self,
        operation: &'static str,
        fut: impl Future<Output = Result<T, DbError>>,
    ) -> Result<T, DbError> {
        if let Ok(result) = tokio::time::timeout(self.operation_timeout, fut).await {
            result
        } else {
            tracing::warn!(
                operation,
                timeout_ms = self.operation_timeout.as_millis(),
                "Store operation timed out"
            );
            Err(DbError::Timeout {
                operation,
                after: self.operation_timeout,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    #[tokio::test]
    async fn dispatches_to_memory_backend() {
        let store = RoomStore::memory(MemoryRoomStore::new());
        assert_eq!(store.backend_name(), "memory");

        let room = store.create_room(NewRoom::named("general")).await.unwrap();
        let fetched = store.get_room(&room.id).await.unwrap();
        assert_eq!(fetched, room);
        store.ping().await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn slow_operations_time_out() {
        let store = RoomStore::memory(MemoryRoomStore::new())
            .with_operation_timeout(Duration::from_millis(50));

        let result: Result<(), DbError> = store
            .bounded("sleepy", async {
                tokio::time::sleep(Duration::from_secs(10)).await;
                Ok(())
            })
            .await;

        assert!(matches!(
            result,
            Err(DbError::Timeout {
                operation: "sleepy",
                ..
            })
        ));
    }
}
