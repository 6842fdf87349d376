//! Configuration for the Pusher-compatible relay.
//!
//! The relay needs the app credentials issued by the provider plus
//! either a cluster name (hosted Pusher) or an explicit host (self-hosted
//! servers that speak the same HTTP API).

use std::time::Duration;

/// Default request timeout in milliseconds.
pub const DEFAULT_RELAY_TIMEOUT_MS: u64 = 5_000;

/// Credentials and endpoint for the relay REST API.
#[derive(Clone)]
pub struct PusherConfig {
    /// Application id.
    pub app_id: String,
    /// Application key (public).
    pub key: String,
    /// Application secret, used to sign requests.
    pub secret: String,
    /// Cluster name, e.g. `eu` or `mt1`.
    pub cluster: String,
    /// Use `https` when true.
    pub use_tls: bool,
    /// Explicit `host[:port]`, overriding the cluster host.
    pub host: Option<String>,
    /// Per-request timeout.
    pub timeout: Duration,
}

impl PusherConfig {
    /// Configuration for a hosted cluster with TLS on and default timeout.
    pub fn new(
        app_id: impl Into<String>,
        key: impl Into<String>,
        secret: impl Into<String>,
        cluster: impl Into<String>,
    ) -> Self {
        Self {
            app_id: app_id.into(),
            key: key.into(),
            secret: secret.into(),
            cluster: cluster.into(),
            use_tls: true,
            host: None,
            timeout: Duration::from_millis(DEFAULT_RELAY_TIMEOUT_MS),
        }
    }

    /// Toggle TLS.
    #[must_use]
    pub const fn with_tls(mut self, use_tls: bool) -> Self {
        self.use_tls = use_tls;
        self
    }

    /// Send requests to `host` instead of the cluster host.
    #[must_use]
    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = Some(host.into());
        self
    }

    /// Set the per-request timeout.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// The `host[:port]` requests go to.
    pub fn resolved_host(&self) -> String {
        self.host
            .clone()
            .unwrap_or_else(|| format!("api-{}.pusher.com", self.cluster))
    }

    /// Base URL (scheme and host) for API requests.
    pub fn base_url(&self) -> String {
        let scheme = if self.use_tls { "https" } else { "http" };
        format!("{scheme}://{}", self.resolved_host())
    }
}

impl std::fmt::Debug for PusherConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PusherConfig")
            .field("app_id", &self.app_id)
            .field("key", &self.key)
            .field("secret", &"<redacted>")
            .field("cluster", &self.cluster)
            .field("use_tls", &self.use_tls)
            .field("host", &self.host)
            .field("timeout", &self.timeout)
            .finish()
    }
}
