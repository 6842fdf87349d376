//! BSON document shapes for the `rooms` collection.
//!
//! These mirror the stored layout (`_id` as an `ObjectId`) and convert to
//! the shared [`roomcast_types`] structs, which carry the id as hex text.
//! Extra stored keys (a `__v` version counter, per-message `_id`s written
//! by older clients) are ignored on read.

use mongodb::bson::oid::ObjectId;
use roomcast_types::{Message, NewRoom, Room, RoomId, RoomProjection, ValidationError};
use serde::{Deserialize, Serialize};

use crate::error::DbError;

/// Parse a [`RoomId`] into the store's native id.
///
/// # Errors
///
/// Returns [`DbError::InvalidId`] when the id is not a 24-digit hex string.
pub fn parse_room_id(id: &RoomId) -> Result<ObjectId, DbError> {
    ObjectId::parse_str(id.as_str()).map_err(|e| DbError::InvalidId(format!("{id}: {e}")))
}

/// Render a native id as a [`RoomId`].
pub fn room_id_of(oid: ObjectId) -> RoomId {
    RoomId::new(oid.to_hex())
}

/// A complete room as stored.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoomDocument {
    /// Store-assigned identity.
    #[serde(rename = "_id")]
    pub id: ObjectId,
    /// Room display name.
    pub name: String,
    /// Cached last message.
    #[serde(rename = "lastMessage", default, skip_serializing_if = "Option::is_none")]
    pub last_message: Option<String>,
    /// Embedded messages.
    #[serde(default)]
    pub messages: Vec<Message>,
}

impl From<RoomDocument> for Room {
    fn from(doc: RoomDocument) -> Self {
        Self {
            id: room_id_of(doc.id),
            name: doc.name,
            last_message: doc.last_message,
            messages: doc.messages,
        }
    }
}

/// A room to insert; the store assigns `_id`.
#[derive(Debug, Clone, Serialize)]
pub struct NewRoomDocument {
    /// Room display name.
    pub name: String,
    /// Cached last message.
    #[serde(rename = "lastMessage", skip_serializing_if = "Option::is_none")]
    pub last_message: Option<String>,
    /// Initial messages.
    pub messages: Vec<Message>,
}

impl NewRoomDocument {
    /// Validate the create input and build the insert document.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError`] if the input has no usable name.
    pub fn from_input(input: NewRoom) -> Result<Self, ValidationError> {
        input.validate()?;
        Ok(Self {
            name: input.name.unwrap_or_default(),
            last_message: input.last_message,
            messages: input.messages.unwrap_or_default(),
        })
    }

    /// Attach the id assigned by the insert.
    pub fn into_room(self, id: ObjectId) -> Room {
        Room {
            id: room_id_of(id),
            name: self.name,
            last_message: self.last_message,
            messages: self.messages,
        }
    }
}

/// A room read through a projection; any field but `_id` may be missing.
#[derive(Debug, Clone, Deserialize)]
pub struct ProjectedRoomDocument {
    /// Store-assigned identity.
    #[serde(rename = "_id")]
    pub id: ObjectId,
    /// Room display name, if projected.
    #[serde(default)]
    pub name: Option<String>,
    /// Cached last message, if projected.
    #[serde(rename = "lastMessage", default)]
    pub last_message: Option<String>,
    /// Messages, if projected.
    #[serde(default)]
    pub messages: Option<Vec<Message>>,
}

impl From<ProjectedRoomDocument> for RoomProjection {
    fn from(doc: ProjectedRoomDocument) -> Self {
        Self {
            id: room_id_of(doc.id),
            name: doc.name,
            last_message: doc.last_message,
            messages: doc.messages,
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::indexing_slicing)]

    use mongodb::bson::{self, doc};

    use super::*;

    #[test]
    fn reads_documents_with_legacy_keys() {
        let oid = ObjectId::new();
        let stored = doc! {
            "_id": oid,
            "name": "general",
            "messages": [
                { "_id": ObjectId::new(), "message": "hi", "name": "alice", "timestamp": "t1", "received": false },
            ],
            "__v": 0,
        };

        let room: Room = bson::from_document::<RoomDocument>(stored).unwrap().into();
        assert_eq!(room.id.as_str(), oid.to_hex());
        assert_eq!(room.messages.len(), 1);
        assert_eq!(room.messages[0].name.as_deref(), Some("alice"));
        assert_eq!(room.last_message, None);
    }

    #[test]
    fn projection_tolerates_missing_fields() {
        let oid = ObjectId::new();
        let projected: RoomProjection =
            bson::from_document::<ProjectedRoomDocument>(doc! { "_id": oid, "name": "general" })
                .unwrap()
                .into();
        assert_eq!(projected.name.as_deref(), Some("general"));
        assert!(projected.messages.is_none());
    }

    #[test]
    fn malformed_ids_are_rejected() {
        assert!(matches!(
            parse_room_id(&RoomId::new("not-an-id")),
            Err(DbError::InvalidId(_))
        ));
        let oid = ObjectId::new();
        assert_eq!(parse_room_id(&room_id_of(oid)).unwrap(), oid);
    }

    #[test]
    fn insert_document_defaults_messages() {
        let doc = NewRoomDocument::from_input(NewRoom::named("general")).unwrap();
        let encoded = bson::to_document(&doc).unwrap();
        assert_eq!(encoded.get_array("messages").unwrap().len(), 0);
        assert!(!encoded.contains_key("lastMessage"));
    }
}
