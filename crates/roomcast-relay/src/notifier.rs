//! Change notifier: forwards room updates from the store to the relay.
//!
//! The notifier consumes the store's [`ChangeFeed`] in order. Every
//! [`ChangeKind::Update`] becomes one `updated` event on the `rooms`
//! channel whose body is the update description under `name`. Inserts,
//! deletes, and anything else are logged and dropped.
//!
//! A failed publish is logged and the loop moves on to the next change;
//! the loop only stops when the feed errors or ends.
//!
//! # Usage
//!
//! ```rust,ignore
//! let feed = store.watch().await?;
//! let handle = spawn_notifier(feed, relay);
//! // ...
//! handle.abort();
//! ```

use futures::StreamExt;
use roomcast_db::ChangeFeed;
use roomcast_types::{ChangeKind, RoomChange, RoomUpdatedPayload};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::error::RelayError;
use crate::relay::Relay;

/// Channel every room update is published on.
pub const ROOMS_CHANNEL: &str = "rooms";

/// Event name for room updates.
pub const UPDATED_EVENT: &str = "updated";

/// What happened to one change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Forwarded to the relay.
    Published,
    /// Not an update; nothing was sent.
    Dropped,
}

/// Counters for a finished notifier run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NotifierStats {
    /// Updates forwarded to the relay.
    pub published: u64,
    /// Events ignored because they were not updates.
    pub dropped: u64,
    /// Updates the relay refused or could not be reached for.
    pub failed: u64,
}

/// Forwards store changes to a [`Relay`].
#[derive(Debug, Clone)]
pub struct ChangeNotifier {
    relay: Relay,
}

impl ChangeNotifier {
    /// Create a notifier publishing through `relay`.
    pub const fn new(relay: Relay) -> Self {
        Self { relay }
    }

    /// The relay this notifier publishes through.
    pub const fn relay(&self) -> &Relay {
        &self.relay
    }

    /// Handle a single change.
    ///
    /// # Errors
    ///
    /// Returns the relay's error if an update could not be published.
    pub async fn handle(&self, change: RoomChange) -> Result<Outcome, RelayError> {
        let (ChangeKind::Update, Some(update)) = (&change.kind, change.update) else {
            error!(
                kind = %change.kind,
                room_id = ?change.room_id,
                "Unsupported change event, not forwarded"
            );
            return Ok(Outcome::Dropped);
        };

        let payload = RoomUpdatedPayload { name: update };
        self.relay
            .trigger(ROOMS_CHANNEL, UPDATED_EVENT, &payload)
            .await?;
        debug!(room_id = ?change.room_id, relay = self.relay.name(), "Room update forwarded");
        Ok(Outcome::Published)
    }

    /// Drain `feed` until it ends or fails, forwarding each update.
    pub async fn run(&self, mut feed: ChangeFeed) -> NotifierStats {
        let mut stats = NotifierStats::default();

        while let Some(next) = feed.next().await {
            let change = match next {
                Ok(change) => change,
                Err(e) => {
                    error!(error = %e, "Change feed failed, notifier stopping");
                    break;
                }
            };

            match self.handle(change).await {
                Ok(Outcome::Published) => stats.published = stats.published.saturating_add(1),
                Ok(Outcome::Dropped) => stats.dropped = stats.dropped.saturating_add(1),
                Err(e) => {
                    warn!(error = %e, relay = self.relay.name(), "Failed to publish room update");
                    stats.failed = stats.failed.saturating_add(1);
                }
            }
        }

        info!(
            published = stats.published,
            dropped = stats.dropped,
            failed = stats.failed,
            "Change notifier finished"
        );
        stats
    }
}

/// Run a [`ChangeNotifier`] over `feed` on a background task.
///
/// The task ends with the feed; abort the handle to stop it sooner.
pub fn spawn_notifier(feed: ChangeFeed, relay: Relay) -> JoinHandle<NotifierStats> {
    info!(relay = relay.name(), channel = ROOMS_CHANNEL, "Change notifier spawned");
    let notifier = ChangeNotifier::new(relay);
    tokio::spawn(async move { notifier.run(feed).await })
}
