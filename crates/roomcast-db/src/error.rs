//! Error types for the Room Store.
//!
//! All errors are propagated via [`DbError`] which wraps the underlying
//! [`mongodb`] driver and BSON errors with additional context about which
//! operation failed.

use std::time::Duration;

use roomcast_types::{RoomId, ValidationError};

/// Errors that can occur in the Room Store.
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    /// A `MongoDB` driver operation failed.
    #[error("MongoDB error: {0}")]
    Mongo(#[from] mongodb::error::Error),

    /// A value could not be encoded as BSON.
    #[error("BSON encode error: {0}")]
    BsonEncode(#[from] mongodb::bson::ser::Error),

    /// A stored document could not be decoded.
    #[error("BSON decode error: {0}")]
    BsonDecode(#[from] mongodb::bson::de::Error),

    /// The room identifier is not a well-formed store id.
    #[error("invalid room id: {0}")]
    InvalidId(String),

    /// No room exists with the given identifier.
    #[error("room not found: {0}")]
    NotFound(RoomId),

    /// The input violates the room schema.
    #[error("validation failed: {0}")]
    Validation(#[from] ValidationError),

    /// The store did not answer within the operation deadline.
    #[error("{operation} timed out after {after:?}")]
    Timeout {
        /// The store operation that was cut off.
        operation: &'static str,
        /// The deadline that elapsed.
        after: Duration,
    },

    /// A configuration error.
    #[error("configuration error: {0}")]
    Config(String),
}

impl DbError {
    /// True for errors that mean "no such room" from the caller's view:
    /// a malformed id or a missing document.
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::InvalidId(_) | Self::NotFound(_))
    }
}
