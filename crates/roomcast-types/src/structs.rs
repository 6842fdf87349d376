//! Room document shapes.
//!
//! A [`Room`] is the only stored entity. Its [`Message`] entries are
//! embedded records with no identity of their own; their order in
//! `messages` is the chronological order of the conversation.
//!
//! JSON keys follow the stored document (`_id`, `lastMessage`) so chat
//! clients see the same shape the store holds.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::ids::RoomId;
use crate::selector::FieldSelector;

/// Stored field names of a room document.
pub mod fields {
    /// Document identity.
    pub const ID: &str = "_id";
    /// Room display name.
    pub const NAME: &str = "name";
    /// Cached body of the most recent message.
    pub const LAST_MESSAGE: &str = "lastMessage";
    /// Embedded message list.
    pub const MESSAGES: &str = "messages";
}

// ---------------------------------------------------------------------------
// Message
// ---------------------------------------------------------------------------

/// A single chat utterance embedded in a room.
///
/// Every field is optional and unvalidated. `timestamp` is whatever text
/// the client supplied; the server never assigns or checks it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct Message {
    /// Message body.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[ts(optional)]
    pub message: Option<String>,
    /// Sender display name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[ts(optional)]
    pub name: Option<String>,
    /// Client-formatted send time.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[ts(optional)]
    pub timestamp: Option<String>,
    /// Client-defined delivery flag.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[ts(optional)]
    pub received: Option<bool>,
}

// ---------------------------------------------------------------------------
// Room
// ---------------------------------------------------------------------------

/// A named conversation holding an ordered list of messages.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct Room {
    /// Store-assigned identity.
    #[serde(rename = "_id")]
    pub id: RoomId,
    /// Room display name. Never empty.
    pub name: String,
    /// Cached last message body. Not kept in sync with `messages`.
    #[serde(rename = "lastMessage", default, skip_serializing_if = "Option::is_none")]
    #[ts(optional)]
    pub last_message: Option<String>,
    /// Messages in chronological (insertion) order.
    #[serde(default)]
    pub messages: Vec<Message>,
}

/// Errors raised when a room input violates the document schema.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    /// The `name` field was absent.
    #[error("A room must have a name")]
    MissingName,

    /// The `name` field was present but blank.
    #[error("A room name must not be empty")]
    EmptyName,
}

fn check_name(name: &str) -> Result<(), ValidationError> {
    if name.trim().is_empty() {
        return Err(ValidationError::EmptyName);
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Create input
// ---------------------------------------------------------------------------

/// Request body for creating a room.
///
/// `name` is optional at the type level so a missing name reaches
/// [`NewRoom::validate`] and is reported as a validation failure instead
/// of a deserialization error.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct NewRoom {
    /// Room display name (required).
    #[serde(default)]
    #[ts(optional)]
    pub name: Option<String>,
    /// Initial cached last message.
    #[serde(rename = "lastMessage", default, skip_serializing_if = "Option::is_none")]
    #[ts(optional)]
    pub last_message: Option<String>,
    /// Initial messages; defaults to empty.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[ts(optional)]
    pub messages: Option<Vec<Message>>,
}

impl NewRoom {
    /// Create an input with just a name.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::default()
        }
    }

    /// Check the schema rules and return the validated name.
    pub fn validate(&self) -> Result<&str, ValidationError> {
        let name = self.name.as_deref().ok_or(ValidationError::MissingName)?;
        check_name(name)?;
        Ok(name)
    }

    /// Build the stored room for the given identity.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError`] if the input has no usable name.
    pub fn into_room(self, id: RoomId) -> Result<Room, ValidationError> {
        self.validate()?;
        Ok(Room {
            id,
            name: self.name.unwrap_or_default(),
            last_message: self.last_message,
            messages: self.messages.unwrap_or_default(),
        })
    }
}

// ---------------------------------------------------------------------------
// Patch input
// ---------------------------------------------------------------------------

/// Shallow partial update of a room.
///
/// Any subset of the mutable fields may be present; `messages` replaces
/// the whole list when given. Absent and `null` fields are left alone.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct RoomPatch {
    /// New display name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[ts(optional)]
    pub name: Option<String>,
    /// New cached last message.
    #[serde(rename = "lastMessage", default, skip_serializing_if = "Option::is_none")]
    #[ts(optional)]
    pub last_message: Option<String>,
    /// Replacement message list.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[ts(optional)]
    pub messages: Option<Vec<Message>>,
}

impl RoomPatch {
    /// True when the patch touches no field.
    pub const fn is_empty(&self) -> bool {
        self.name.is_none() && self.last_message.is_none() && self.messages.is_none()
    }

    /// Check the schema rules for the fields that are present.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if let Some(name) = &self.name {
            check_name(name)?;
        }
        Ok(())
    }

    /// Apply the present fields to `room` in place.
    pub fn apply_to(&self, room: &mut Room) {
        if let Some(name) = &self.name {
            room.name.clone_from(name);
        }
        if let Some(last_message) = &self.last_message {
            room.last_message = Some(last_message.clone());
        }
        if let Some(messages) = &self.messages {
            room.messages.clone_from(messages);
        }
    }

    /// Names of the stored fields this patch writes, in document order.
    pub fn touched_fields(&self) -> Vec<&'static str> {
        let mut touched = Vec::with_capacity(3);
        if self.name.is_some() {
            touched.push(fields::NAME);
        }
        if self.last_message.is_some() {
            touched.push(fields::LAST_MESSAGE);
        }
        if self.messages.is_some() {
            touched.push(fields::MESSAGES);
        }
        touched
    }
}

// ---------------------------------------------------------------------------
// List projection
// ---------------------------------------------------------------------------

/// A room reduced to the fields requested by a [`FieldSelector`].
///
/// The identity is always present; every other field appears only when
/// selected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct RoomProjection {
    /// Store-assigned identity.
    #[serde(rename = "_id")]
    pub id: RoomId,
    /// Room display name, if selected.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[ts(optional)]
    pub name: Option<String>,
    /// Cached last message, if selected and set.
    #[serde(rename = "lastMessage", default, skip_serializing_if = "Option::is_none")]
    #[ts(optional)]
    pub last_message: Option<String>,
    /// Messages, if selected.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[ts(optional)]
    pub messages: Option<Vec<Message>>,
}

impl RoomProjection {
    /// Project `room` down to the fields in `selector`.
    ///
    /// `None` or an empty selector keeps every field.
    pub fn from_room(room: &Room, selector: Option<&FieldSelector>) -> Self {
        let keep = |field: &str| selector.is_none_or(|s| s.includes(field));
        Self {
            id: room.id.clone(),
            name: keep(fields::NAME).then(|| room.name.clone()),
            last_message: if keep(fields::LAST_MESSAGE) {
                room.last_message.clone()
            } else {
                None
            },
            messages: keep(fields::MESSAGES).then(|| room.messages.clone()),
        }
    }
}

impl From<Room> for RoomProjection {
    fn from(room: Room) -> Self {
        Self {
            id: room.id,
            name: Some(room.name),
            last_message: room.last_message,
            messages: Some(room.messages),
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    fn sample_room() -> Room {
        Room {
            id: RoomId::new("65a1f0c2e4b0a1b2c3d4e5f6"),
            name: String::from("general"),
            last_message: Some(String::from("see you")),
            messages: vec![Message {
                message: Some(String::from("hi")),
                name: Some(String::from("alice")),
                timestamp: Some(String::from("t1")),
                received: Some(false),
            }],
        }
    }

    #[test]
    fn room_uses_stored_field_names() {
        let json = serde_json::to_value(sample_room()).unwrap();
        assert_eq!(json["_id"], "65a1f0c2e4b0a1b2c3d4e5f6");
        assert_eq!(json["lastMessage"], "see you");
        assert_eq!(json["messages"][0]["received"], false);
    }

    #[test]
    fn message_omits_absent_fields() {
        let json = serde_json::to_value(Message {
            message: Some(String::from("hi")),
            ..Message::default()
        })
        .unwrap();
        assert_eq!(json, serde_json::json!({ "message": "hi" }));
    }

    #[test]
    fn message_accepts_empty_object() {
        let msg: Message = serde_json::from_str("{}").unwrap();
        assert_eq!(msg, Message::default());
    }

    #[test]
    fn new_room_requires_name() {
        let input: NewRoom = serde_json::from_str(r#"{"lastMessage":"x"}"#).unwrap();
        assert_eq!(input.validate(), Err(ValidationError::MissingName));

        let blank = NewRoom::named("   ");
        assert_eq!(blank.validate(), Err(ValidationError::EmptyName));
    }

    #[test]
    fn new_room_defaults_messages_to_empty() {
        let room = NewRoom::named("general")
            .into_room(RoomId::new("r1"))
            .unwrap();
        assert_eq!(room.name, "general");
        assert!(room.messages.is_empty());
        assert!(room.last_message.is_none());
    }

    #[test]
    fn patch_ignores_unknown_keys_and_nulls() {
        let patch: RoomPatch =
            serde_json::from_str(r#"{"_id":"other","lastMessage":null,"topic":"x"}"#).unwrap();
        assert!(patch.is_empty());
    }

    #[test]
    fn patch_leaves_messages_alone_unless_present() {
        let mut room = sample_room();
        let patch = RoomPatch {
            name: Some(String::from("random")),
            ..RoomPatch::default()
        };
        patch.apply_to(&mut room);
        assert_eq!(room.name, "random");
        assert_eq!(room.messages.len(), 1);
        assert_eq!(patch.touched_fields(), vec![fields::NAME]);
    }

    #[test]
    fn patch_rejects_blank_name() {
        let patch = RoomPatch {
            name: Some(String::new()),
            ..RoomPatch::default()
        };
        assert_eq!(patch.validate(), Err(ValidationError::EmptyName));
    }

    #[test]
    fn projection_keeps_only_selected_fields() {
        let selector = FieldSelector::parse("name").unwrap();
        let projected = RoomProjection::from_room(&sample_room(), Some(&selector));
        let json = serde_json::to_value(projected).unwrap();
        let keys: Vec<&String> = json.as_object().unwrap().keys().collect();
        assert_eq!(keys.len(), 2);
        assert_eq!(json["name"], "general");
        assert_eq!(json["_id"], "65a1f0c2e4b0a1b2c3d4e5f6");
    }

    #[test]
    fn projection_without_selector_is_full_room() {
        let room = sample_room();
        let projected = RoomProjection::from_room(&room, None);
        assert_eq!(projected, RoomProjection::from(room));
    }
}
