//! Server entry point for the Roomcast chat backend.
//!
//! Wires the three long-lived pieces together in one process:
//!
//! ```text
//! HTTP clients --> rooms API --> RoomStore (MongoDB)
//!                                    |
//!                              change stream
//!                                    v
//!                           ChangeNotifier --> relay --> chat clients
//! ```
//!
//! The API and the notifier share nothing but the store. On Ctrl-C or
//! SIGTERM the HTTP server drains in-flight requests, the notifier task is
//! aborted, and the store connection is closed.

mod config;
mod error;

use std::sync::Arc;

use roomcast_api::AppState;
use roomcast_db::{MemoryRoomStore, MongoPool, MongoRoomStore, RoomStore};
use roomcast_relay::{MemoryRelay, PusherClient, Relay, spawn_notifier};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::config::{AppConfig, LogFormat, RelayMode, StoreMode};
use crate::error::ServerError;

/// Application entry point.
///
/// Loads `.env` and the environment, initializes logging, connects the
/// Room Store, starts the change notifier, then serves the rooms API
/// until a shutdown signal arrives.
///
/// # Errors
///
/// Returns an error if configuration is invalid, the store or relay
/// cannot be set up, or the HTTP server fails.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // A missing .env file is normal outside development.
    let dotenv = dotenvy::dotenv();

    let config = AppConfig::from_env()?;
    init_tracing(config.log_format);

    info!("roomcast-server starting");
    if let Ok(path) = dotenv {
        info!(path = %path.display(), "loaded .env file");
    }

    run(config).await?;

    info!("roomcast-server stopped");
    Ok(())
}

/// Initialize structured logging with an `info` default filter.
fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true);

    match format {
        LogFormat::Json => builder.json().init(),
        LogFormat::Text => builder.init(),
    }
}

async fn run(config: AppConfig) -> Result<(), ServerError> {
    let (store, pool) = match &config.store {
        StoreMode::Mongo(mongo) => {
            let pool = MongoPool::connect(mongo).await?;
            let store = RoomStore::mongo(MongoRoomStore::new(pool.clone()));
            (store, Some(pool))
        }
        StoreMode::Memory => {
            warn!("using in-memory room store; data will not survive a restart");
            (RoomStore::memory(MemoryRoomStore::new()), None)
        }
    };
    let store = store.with_operation_timeout(config.store_timeout);
    info!(
        backend = store.backend_name(),
        timeout_ms = config.store_timeout.as_millis(),
        "room store ready"
    );

    let relay = match &config.relay {
        RelayMode::Pusher(pusher) => Relay::Pusher(PusherClient::new(pusher.clone())?),
        RelayMode::Memory => Relay::Memory(MemoryRelay::new()),
    };
    info!(relay = relay.name(), "relay configured");

    let feed = store.watch().await?;
    let notifier = spawn_notifier(feed, relay);

    let state = Arc::new(AppState::new(store));
    let served = roomcast_api::start_server(&config.server, state, shutdown_signal()).await;

    // The change stream must be dropped before the client can shut down.
    notifier.abort();
    if let Ok(stats) = notifier.await {
        info!(?stats, "change notifier had already stopped");
    }
    if let Some(pool) = pool {
        pool.close().await;
    }

    served.map_err(ServerError::from)
}

/// Resolve on Ctrl-C, or SIGTERM on Unix.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    info!("shutdown signal received");
}
