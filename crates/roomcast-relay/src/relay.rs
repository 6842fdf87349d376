//! Relay backends that fan events out to connected chat clients.
//!
//! [`Relay`] is an enum over the concrete backends rather than a trait
//! object: the set is closed and the publish call is async.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, PoisonError};

use serde::Serialize;
use tokio::sync::broadcast;

use crate::error::RelayError;
use crate::pusher::PusherClient;

/// Capacity of the in-memory relay's subscriber channel, and the number of
/// recent events it keeps.
pub const MEMORY_RELAY_CAPACITY: usize = 256;

/// A publish target.
#[derive(Debug, Clone)]
pub enum Relay {
    /// Pusher Channels (or a server speaking its HTTP API).
    Pusher(PusherClient),
    /// In-process relay that logs events and keeps the most recent, for
    /// tests and local runs.
    Memory(MemoryRelay),
}

impl Relay {
    /// Publish `event` on `channel` with `data` encoded as JSON.
    ///
    /// # Errors
    ///
    /// Returns [`RelayError::Serde`] if `data` cannot be encoded, or the
    /// backend's own error if publishing fails.
    pub async fn trigger<T: Serialize + Sync>(
        &self,
        channel: &str,
        event: &str,
        data: &T,
    ) -> Result<(), RelayError> {
        match self {
            Self::Pusher(client) => {
                let encoded = serde_json::to_string(data)?;
                client.trigger(channel, event, &encoded).await
            }
            Self::Memory(relay) => {
                relay.record(channel, event, serde_json::to_value(data)?);
                Ok(())
            }
        }
    }

    /// Backend name for logging.
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Pusher(_) => "pusher",
            Self::Memory(_) => "memory",
        }
    }
}

/// One event handed to the in-memory relay.
#[derive(Debug, Clone, PartialEq)]
pub struct PublishedEvent {
    /// Channel name.
    pub channel: String,
    /// Event name.
    pub event: String,
    /// Event body.
    pub data: serde_json::Value,
}

/// Relay that logs each published event, keeps the most recent
/// [`MEMORY_RELAY_CAPACITY`] of them, and rebroadcasts them in-process.
#[derive(Debug, Clone)]
pub struct MemoryRelay {
    published: Arc<Mutex<VecDeque<PublishedEvent>>>,
    tx: broadcast::Sender<PublishedEvent>,
}

impl MemoryRelay {
    /// Create an empty relay.
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(MEMORY_RELAY_CAPACITY);
        Self {
            published: Arc::new(Mutex::new(VecDeque::with_capacity(MEMORY_RELAY_CAPACITY))),
            tx,
        }
    }

    /// The most recent events published, oldest first.
    pub fn published(&self) -> Vec<PublishedEvent> {
        self.published
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .cloned()
            .collect()
    }

    /// Receive events published after this call.
    pub fn subscribe(&self) -> broadcast::Receiver<PublishedEvent> {
        self.tx.subscribe()
    }

    fn record(&self, channel: &str, event: &str, data: serde_json::Value) {
        tracing::info!(channel, event, %data, "Relay event published");
        let published = PublishedEvent {
            channel: channel.to_owned(),
            event: event.to_owned(),
            data,
        };
        {
            let mut history = self.published.lock().unwrap_or_else(PoisonError::into_inner);
            if history.len() >= MEMORY_RELAY_CAPACITY {
                history.pop_front();
            }
            history.push_back(published.clone());
        }
        // No subscribers is fine.
        let _ = self.tx.send(published);
    }
}

impl Default for MemoryRelay {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    #![allow(
        clippy::unwrap_used,
        clippy::indexing_slicing,
        clippy::arithmetic_side_effects
    )]

    use super::*;

    #[tokio::test]
    async fn memory_relay_records_and_broadcasts() {
        let memory = MemoryRelay::new();
        let mut rx = memory.subscribe();
        let relay = Relay::Memory(memory.clone());
        assert_eq!(relay.name(), "memory");

        relay
            .trigger("rooms", "updated", &serde_json::json!({ "x": 1 }))
            .await
            .unwrap();

        let published = memory.published();
        assert_eq!(published.len(), 1);
        assert_eq!(published[0].channel, "rooms");
        assert_eq!(published[0].event, "updated");
        assert_eq!(published[0].data["x"], 1);

        let received = rx.recv().await.unwrap();
        assert_eq!(received, published[0]);
    }

    #[tokio::test]
    async fn memory_relay_keeps_only_recent_events() {
        let memory = MemoryRelay::new();
        let relay = Relay::Memory(memory.clone());

        let total = MEMORY_RELAY_CAPACITY + 10;
        for n in 0..total {
            relay
                .trigger("rooms", "updated", &serde_json::json!({ "n": n }))
                .await
                .unwrap();
        }

        let published = memory.published();
        assert_eq!(published.len(), MEMORY_RELAY_CAPACITY);
        assert_eq!(published[0].data["n"], 10);
        assert_eq!(published[MEMORY_RELAY_CAPACITY - 1].data["n"], total - 1);
    }
}
