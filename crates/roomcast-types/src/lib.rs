//! Shared type definitions for the Roomcast chat backend.
//!
//! This crate is the single source of truth for the room document shape
//! used by the store, the HTTP API, and the change notifier. Types that
//! reach chat clients are exported to `TypeScript` via `ts-rs`.
//!
//! # Modules
//!
//! - [`ids`] -- Opaque room identifier
//! - [`structs`] -- `Room`, `Message`, and the create/patch/list shapes
//! - [`selector`] -- Field selector for projected room listings
//! - [`change`] -- Change-feed events observed on the rooms collection

pub mod change;
pub mod ids;
pub mod selector;
pub mod structs;

// Re-export all public types at crate root for convenience.
pub use change::{ChangeKind, RoomChange, RoomUpdatedPayload, TruncatedArray, UpdateDescription};
pub use ids::RoomId;
pub use selector::{FieldSelector, SelectorError};
pub use structs::{Message, NewRoom, Room, RoomPatch, RoomProjection, ValidationError, fields};
