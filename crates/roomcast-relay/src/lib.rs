//! Real-time relay client and change notifier for the Roomcast chat backend.
//!
//! Chat clients do not poll the HTTP API for new messages. Instead, every
//! update to a room is pushed to them through a hosted pub/sub relay:
//!
//! ```text
//!   RoomStore::watch() ──► ChangeNotifier ──► Relay ──► chat clients
//!      (ChangeFeed)         (updates only)     (rooms / updated)
//! ```
//!
//! # Modules
//!
//! - [`config`] -- Relay credentials and endpoint
//! - [`pusher`] -- Signed client for the Pusher Channels HTTP API
//! - [`relay`] -- [`Relay`] backends (Pusher, in-memory)
//! - [`notifier`] -- Change feed consumer that publishes room updates
//! - [`error`] -- Error types

pub mod config;
pub mod error;
pub mod notifier;
pub mod pusher;
pub mod relay;

pub use config::{DEFAULT_RELAY_TIMEOUT_MS, PusherConfig};
pub use error::RelayError;
pub use notifier::{
    ChangeNotifier, NotifierStats, Outcome, ROOMS_CHANNEL, UPDATED_EVENT, spawn_notifier,
};
pub use pusher::{MAX_EVENT_DATA_BYTES, PusherClient};
pub use relay::{MEMORY_RELAY_CAPACITY, MemoryRelay, PublishedEvent, Relay};
