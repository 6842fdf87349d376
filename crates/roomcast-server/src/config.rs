//! Configuration for the server process.
//!
//! All configuration is loaded from environment variables, after a `.env`
//! file in the working directory (if any) has been merged in. The server
//! needs to know where to listen, which Room Store backend to use, and
//! how to reach the real-time relay.

use std::time::Duration;

use roomcast_api::ServerConfig;
use roomcast_db::{DEFAULT_OPERATION_TIMEOUT_MS, MongoConfig};
use roomcast_relay::{DEFAULT_RELAY_TIMEOUT_MS, PusherConfig};

use crate::error::ServerError;

/// Complete process configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// HTTP listen address.
    pub server: ServerConfig,
    /// Room Store backend.
    pub store: StoreMode,
    /// Deadline for each store call.
    pub store_timeout: Duration,
    /// Relay backend.
    pub relay: RelayMode,
    /// Log output format.
    pub log_format: LogFormat,
}

/// Which Room Store backend to run.
#[derive(Debug, Clone)]
pub enum StoreMode {
    /// `MongoDB` at the given connection settings.
    Mongo(MongoConfig),
    /// In-process store; data is lost on exit.
    Memory,
}

/// Which relay backend to publish room updates through.
#[derive(Debug, Clone)]
pub enum RelayMode {
    /// Pusher Channels (or a compatible server).
    Pusher(PusherConfig),
    /// In-process relay; events are logged and the most recent are kept.
    Memory,
}

/// Log line format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// Human-readable text.
    Text,
    /// One JSON object per line.
    Json,
}

impl AppConfig {
    /// Load configuration from the process environment.
    ///
    /// Variables:
    /// - `PORT` -- listen port (default 9000)
    /// - `HOST` -- listen address (default `0.0.0.0`)
    /// - `ROOMCAST_STORE` -- `mongo` (default) or `memory`
    /// - `MONGO_DB` -- `MongoDB` connection string (required for `mongo`)
    /// - `MONGO_DATABASE` -- database name (default: from the URI, else `roomcast`)
    /// - `STORE_TIMEOUT_MS` -- per-call store deadline (default 5000)
    /// - `ROOMCAST_RELAY` -- `pusher` (default) or `memory`
    /// - `APP_ID`, `PUSHER_ID`, `PUSHER_SECRET`, `PUSHER_CLUSTER` -- relay
    ///   credentials (required for `pusher`)
    /// - `PUSHER_TLS` -- use TLS for relay calls (default `true`)
    /// - `PUSHER_HOST` -- relay host override
    /// - `RELAY_TIMEOUT_MS` -- relay request timeout (default 5000)
    /// - `LOG_FORMAT` -- `text` (default) or `json`
    pub fn from_env() -> Result<Self, ServerError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load configuration through `lookup`, which returns a variable's
    /// value or `None` when it is unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ServerError> {
        let env = Env(&lookup);

        let defaults = ServerConfig::default();
        let server = ServerConfig {
            host: env.optional("HOST").unwrap_or(defaults.host),
            port: env.parsed("PORT", defaults.port)?,
        };

        let store = match env.mode("ROOMCAST_STORE", "mongo").as_str() {
            "mongo" | "mongodb" => {
                let mut mongo = MongoConfig::new(&env.required("MONGO_DB")?);
                if let Some(database) = env.optional("MONGO_DATABASE") {
                    mongo = mongo.with_database(database);
                }
                StoreMode::Mongo(mongo)
            }
            "memory" => StoreMode::Memory,
            other => {
                return Err(ServerError::Config(format!(
                    "unknown ROOMCAST_STORE: {other}"
                )));
            }
        };

        let store_timeout =
            Duration::from_millis(env.parsed("STORE_TIMEOUT_MS", DEFAULT_OPERATION_TIMEOUT_MS)?);

        let relay = match env.mode("ROOMCAST_RELAY", "pusher").as_str() {
            "pusher" => {
                let mut pusher = PusherConfig::new(
                    env.required("APP_ID")?,
                    env.required("PUSHER_ID")?,
                    env.required("PUSHER_SECRET")?,
                    env.optional("PUSHER_CLUSTER").unwrap_or_default(),
                )
                .with_tls(env.parsed("PUSHER_TLS", true)?)
                .with_timeout(Duration::from_millis(
                    env.parsed("RELAY_TIMEOUT_MS", DEFAULT_RELAY_TIMEOUT_MS)?,
                ));
                match env.optional("PUSHER_HOST") {
                    Some(host) => pusher = pusher.with_host(host),
                    None if pusher.cluster.is_empty() => {
                        return Err(ServerError::Config(String::from(
                            "missing required env var PUSHER_CLUSTER (or PUSHER_HOST)",
                        )));
                    }
                    None => {}
                }
                RelayMode::Pusher(pusher)
            }
            "memory" => RelayMode::Memory,
            other => {
                return Err(ServerError::Config(format!(
                    "unknown ROOMCAST_RELAY: {other}"
                )));
            }
        };

        let log_format = match env.mode("LOG_FORMAT", "text").as_str() {
            "text" | "pretty" => LogFormat::Text,
            "json" => LogFormat::Json,
            other => {
                return Err(ServerError::Config(format!("unknown LOG_FORMAT: {other}")));
            }
        };

        Ok(Self {
            server,
            store,
            store_timeout,
            relay,
            log_format,
        })
    }
}

/// Typed accessors over a variable lookup.
struct Env<'a, F: Fn(&str) -> Option<String>>(&'a F);

impl<F: Fn(&str) -> Option<String>> Env<'_, F> {
    /// A set, non-blank variable.
    fn optional(&self, name: &str) -> Option<String> {
        (self.0)(name).filter(|value| !value.trim().is_empty())
    }

    /// A variable that must be present.
    fn required(&self, name: &str) -> Result<String, ServerError> {
        self.optional(name)
            .ok_or_else(|| ServerError::Config(format!("missing required env var {name}")))
    }

    /// A lowercased selector variable with a default.
    fn mode(&self, name: &str, default: &str) -> String {
        self.optional(name)
            .map_or_else(|| default.to_owned(), |value| value.trim().to_lowercase())
    }

    /// A parsed variable with a default.
    fn parsed<T>(&self, name: &str, default: T) -> Result<T, ServerError>
    where
        T: std::str::FromStr,
        T::Err: std::fmt::Display,
    {
        self.optional(name).map_or(Ok(default), |raw| {
            raw.trim()
                .parse()
                .map_err(|e| ServerError::Config(format!("invalid {name}: {e}")))
        })
    }
}
