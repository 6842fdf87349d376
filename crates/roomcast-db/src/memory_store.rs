//! In-process backend for the Room Store.
//!
//! Holds rooms in insertion order behind a [`RwLock`] and reports every
//! write on a broadcast channel in the same shape a `MongoDB` change
//! stream would: `insert` for creates, `update` with dotted
//! `updatedFields` for appends and patches. Used by tests and by the
//! server's `memory` store mode.

use std::sync::Arc;

use mongodb::bson::oid::ObjectId;
use roomcast_types::{
    FieldSelector, Message, NewRoom, Room, RoomChange, RoomId, RoomPatch, RoomProjection,
    UpdateDescription, fields,
};
use tokio::sync::{RwLock, broadcast};

use crate::change_feed::{self, ChangeFeed};
use crate::documents::{parse_room_id, room_id_of};
use crate::error::DbError;

/// Capacity of the change broadcast channel.
///
/// A feed consumer that falls further behind than this skips ahead.
const CHANGE_CAPACITY: usize = 256;

/// Room store kept entirely in memory.
#[derive(Clone)]
pub struct MemoryRoomStore {
    rooms: Arc<RwLock<Vec<Room>>>,
    changes: broadcast::Sender<RoomChange>,
}

impl MemoryRoomStore {
    /// Create an empty store.
    pub fn new() -> Self {
        let (changes, _) = broadcast::channel(CHANGE_CAPACITY);
        Self {
            rooms: Arc::new(RwLock::new(Vec::new())),
            changes,
        }
    }

    /// List rooms in insertion order, projected to `selector` when given.
    pub async fn list_rooms(
        &self,
        selector: Option<&FieldSelector>,
    ) -> Result<Vec<RoomProjection>, DbError> {
        let rooms = self.rooms.read().await;
        Ok(rooms
            .iter()
            .map(|room| RoomProjection::from_room(room, selector))
            .collect())
    }

    /// Fetch one room by id.
    pub async fn get_room(&self, id: &RoomId) -> Result<Room, DbError> {
        let key = canonical_id(id)?;
        let rooms = self.rooms.read().await;
        rooms
            .iter()
            .find(|room| room.id == key)
            .cloned()
            .ok_or_else(|| DbError::NotFound(id.clone()))
    }

    /// Push `message` onto the room's list and return the updated room.
    ///
    /// The write lock is held across the read, the push and the change
    /// event, so concurrent appends are serialized and reported in the
    /// order they were applied.
    pub async fn append_message(&self, id: &RoomId, message: &Message) -> Result<Room, DbError> {
        let key = canonical_id(id)?;
        let mut rooms = self.rooms.write().await;
        let room = rooms
            .iter_mut()
            .find(|room| room.id == key)
            .ok_or_else(|| DbError::NotFound(id.clone()))?;

        let index = room.messages.len();
        room.messages.push(message.clone());

        let mut changed = serde_json::Map::new();
        changed.insert(
            format!("{}.{index}", fields::MESSAGES),
            serde_json::to_value(message).unwrap_or_default(),
        );
        self.emit(RoomChange::updated(
            room.id.clone(),
            UpdateDescription::updated(changed),
        ));

        Ok(room.clone())
    }

    /// Apply a shallow field update and return the updated room.
    ///
    /// An empty patch writes nothing and emits no change.
    pub async fn patch_room(&self, id: &RoomId, patch: &RoomPatch) -> Result<Room, DbError> {
        patch.validate()?;
        let key = canonical_id(id)?;
        let mut rooms = self.rooms.write().await;
        let room = rooms
            .iter_mut()
            .find(|room| room.id == key)
            .ok_or_else(|| DbError::NotFound(id.clone()))?;

        if patch.is_empty() {
            return Ok(room.clone());
        }

        patch.apply_to(room);

        let patched = serde_json::to_value(patch)
            .ok()
            .and_then(|value| value.as_object().cloned())
            .unwrap_or_default();
        self.emit(RoomChange::updated(
            room.id.clone(),
            UpdateDescription::updated(patched),
        ));

        Ok(room.clone())
    }

    /// Insert a new room and return it with its assigned id.
    pub async fn create_room(&self, input: NewRoom) -> Result<Room, DbError> {
        let room = input.into_room(room_id_of(ObjectId::new()))?;
        let mut rooms = self.rooms.write().await;
        rooms.push(room.clone());
        self.emit(RoomChange::inserted(room.id.clone()));
        drop(rooms);
        Ok(room)
    }

    /// Subscribe to changes made after this call.
    pub fn watch(&self) -> ChangeFeed {
        change_feed::from_broadcast(self.changes.subscribe())
    }

    /// Number of stored rooms.
    pub async fn len(&self) -> usize {
        self.rooms.read().await.len()
    }

    /// True when no room has been created.
    pub async fn is_empty(&self) -> bool {
        self.rooms.read().await.is_empty()
    }

    /// Publish `change`. Callers hold the write lock so events leave in
    /// commit order.
    fn emit(&self, change: RoomChange) {
        // Err only means nobody is watching.
        let _ = self.changes.send(change);
    }
}

impl Default for MemoryRoomStore {
    fn default() -> Self {
        Self::new()
    }
}

/// Validate `id` like the `MongoDB` backend and normalize its hex case.
fn canonical_id(id: &RoomId) -> Result<RoomId, DbError> {
    parse_room_id(id).map(room_id_of)
}
