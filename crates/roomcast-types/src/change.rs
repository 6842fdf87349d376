//! Change-feed events observed on the rooms collection.
//!
//! The store reports every mutation of the rooms collection as a
//! [`RoomChange`]. Only [`ChangeKind::Update`] events carry an
//! [`UpdateDescription`], and only those are forwarded to chat clients,
//! wrapped in a [`RoomUpdatedPayload`].

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::ids::RoomId;

/// The kind of mutation a change event reports.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChangeKind {
    /// A new document was inserted.
    Insert,
    /// Fields of an existing document were modified in place.
    Update,
    /// A document was replaced wholesale.
    Replace,
    /// A document was removed.
    Delete,
    /// Any other stream event (drop, rename, invalidate, ...).
    Other(String),
}

impl core::fmt::Display for ChangeKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Insert => f.write_str("insert"),
            Self::Update => f.write_str("update"),
            Self::Replace => f.write_str("replace"),
            Self::Delete => f.write_str("delete"),
            Self::Other(kind) => f.write_str(kind),
        }
    }
}

/// An array field that an update shortened.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct TruncatedArray {
    /// Dotted path of the array.
    pub field: String,
    /// Length after truncation.
    #[serde(rename = "newSize")]
    pub new_size: i32,
}

/// What an update changed, in change-stream terms.
///
/// `updated_fields` maps dotted paths (e.g. `messages.3`) to their new
/// values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "bindings/")]
pub struct UpdateDescription {
    /// New values keyed by dotted field path.
    pub updated_fields: serde_json::Value,
    /// Paths of fields removed by the update.
    #[serde(default)]
    pub removed_fields: Vec<String>,
    /// Arrays shortened by the update.
    #[serde(default)]
    pub truncated_arrays: Vec<TruncatedArray>,
}

impl UpdateDescription {
    /// A description with only updated fields.
    pub fn updated(fields: serde_json::Map<String, serde_json::Value>) -> Self {
        Self {
            updated_fields: serde_json::Value::Object(fields),
            removed_fields: Vec::new(),
            truncated_arrays: Vec::new(),
        }
    }
}

/// One mutation observed on the rooms collection.
#[derive(Debug, Clone, PartialEq)]
pub struct RoomChange {
    /// What kind of mutation happened.
    pub kind: ChangeKind,
    /// The affected room, when the event identifies one.
    pub room_id: Option<RoomId>,
    /// Present for [`ChangeKind::Update`] events.
    pub update: Option<UpdateDescription>,
}

impl RoomChange {
    /// An update event for `room_id`.
    pub const fn updated(room_id: RoomId, update: UpdateDescription) -> Self {
        Self {
            kind: ChangeKind::Update,
            room_id: Some(room_id),
            update: Some(update),
        }
    }

    /// An insert event for `room_id`.
    pub const fn inserted(room_id: RoomId) -> Self {
        Self {
            kind: ChangeKind::Insert,
            room_id: Some(room_id),
            update: None,
        }
    }
}

/// Body of the `updated` event pushed to chat clients.
///
/// The update description sits under `name` to match what existing
/// clients already parse.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct RoomUpdatedPayload {
    /// The update that triggered the event.
    pub name: UpdateDescription,
}
