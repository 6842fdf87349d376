//! Opaque identifier for rooms.
//!
//! The store assigns the identifier on insert (a `MongoDB` `ObjectId`,
//! carried here as its 24-character hex form). Callers treat it as an
//! opaque string; only the store layer knows how to parse it.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// Unique identifier for a room, assigned by the store and never reused.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct RoomId(pub String);

impl RoomId {
    /// Wrap an identifier string.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Borrow the identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Return the inner string.
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl core::fmt::Display for RoomId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for RoomId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl From<&str> for RoomId {
    fn from(id: &str) -> Self {
        Self(id.to_owned())
    }
}

impl From<RoomId> for String {
    fn from(id: RoomId) -> Self {
        id.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_as_bare_string() {
        let id = RoomId::new("65a1f0c2e4b0a1b2c3d4e5f6");
        let json = serde_json::to_string(&id).unwrap_or_default();
        assert_eq!(json, "\"65a1f0c2e4b0a1b2c3d4e5f6\"");
    }

    #[test]
    fn into_inner_returns_the_raw_id() {
        let id = RoomId::new("65a1f0c2e4b0a1b2c3d4e5f6");
        assert_eq!(id.as_str(), "65a1f0c2e4b0a1b2c3d4e5f6");
        assert_eq!(id.into_inner(), "65a1f0c2e4b0a1b2c3d4e5f6");
    }
}
