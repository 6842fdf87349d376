//! Client for the Pusher Channels HTTP API.
//!
//! Events are published with a signed `POST /apps/{app_id}/events`. The
//! signature is an HMAC-SHA256 over the method, path, and sorted query
//! string, keyed by the app secret; the query carries an MD5 of the body
//! so the body is covered too.

use hmac::{Hmac, Mac};
use md5::{Digest, Md5};
use sha2::Sha256;

use crate::config::PusherConfig;
use crate::error::RelayError;

/// Largest `data` string the relay accepts for one event.
pub const MAX_EVENT_DATA_BYTES: usize = 10_240;

/// Signature scheme version sent as `auth_version`.
const AUTH_VERSION: &str = "1.0";

/// Backend for a Pusher-compatible relay.
#[derive(Clone)]
pub struct PusherClient {
    client: reqwest::Client,
    config: PusherConfig,
}

impl PusherClient {
    /// Create a client for `config`.
    ///
    /// # Errors
    ///
    /// Returns [`RelayError::Config`] if a credential is empty and
    /// [`RelayError::Http`] if the HTTP client cannot be built.
    pub fn new(config: PusherConfig) -> Result<Self, RelayError> {
        for (name, value) in [
            ("app id", &config.app_id),
            ("key", &config.key),
            ("secret", &config.secret),
        ] {
            if value.trim().is_empty() {
                return Err(RelayError::Config(format!("relay {name} is empty")));
            }
        }
        if config.host.is_none() && config.cluster.trim().is_empty() {
            return Err(RelayError::Config(String::from(
                "relay needs a cluster or an explicit host",
            )));
        }

        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()?;
        Ok(Self { client, config })
    }

    /// The configuration this client publishes with.
    pub const fn config(&self) -> &PusherConfig {
        &self.config
    }

    /// Publish `event` on `channel` with an already-encoded JSON `data`.
    ///
    /// # Errors
    ///
    /// Returns [`RelayError::PayloadTooLarge`] before sending when `data`
    /// exceeds [`MAX_EVENT_DATA_BYTES`], [`RelayError::Http`] on transport
    /// failure, and [`RelayError::Rejected`] for a non-2xx answer.
    pub async fn trigger(&self, channel: &str, event: &str, data: &str) -> Result<(), RelayError> {
        if data.len() > MAX_EVENT_DATA_BYTES {
            return Err(RelayError::PayloadTooLarge {
                size: data.len(),
                limit: MAX_EVENT_DATA_BYTES,
            });
        }

        let body = serde_json::to_string(&serde_json::json!({
            "name": event,
            "channels": [channel],
            "data": data,
        }))?;

        let path = format!("/apps/{}/events", self.config.app_id);
        let timestamp = chrono::Utc::now().timestamp();
        let query = signed_query(
            &self.config.key,
            &self.config.secret,
            "POST",
            &path,
            &body,
            timestamp,
        )?;
        let url = format!("{}{path}?{query}", self.config.base_url());

        let response = self
            .client
            .post(&url)
            .header("Content-Type", "application/json")
            .body(body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let error_body = response
                .text()
                .await
                .unwrap_or_else(|_| "unable to read error body".to_owned());
            return Err(RelayError::Rejected {
                status: status.as_u16(),
                body: error_body,
            });
        }

        tracing::debug!(channel, event, bytes = data.len(), "Relay event published");
        Ok(())
    }
}

impl std::fmt::Debug for PusherClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PusherClient")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

/// Lowercase hex MD5 of `body`.
pub fn body_md5(body: &str) -> String {
    hex::encode(Md5::digest(body.as_bytes()))
}

/// Lowercase hex HMAC-SHA256 of `message` keyed by `secret`.
///
/// # Errors
///
/// Returns [`RelayError::Signing`] if the key is rejected.
pub fn sign(secret: &str, message: &str) -> Result<String, RelayError> {
    let mut mac = Hmac::<Sha256>::new_from_slice(secret.as_bytes())
        .map_err(|e| RelayError::Signing(e.to_string()))?;
    mac.update(message.as_bytes());
    Ok(hex::encode(mac.finalize().into_bytes()))
}

/// Build the authenticated query string for a request.
///
/// Parameters are sorted by name before signing; `auth_signature` is
/// appended last and is not itself signed.
///
/// # Errors
///
/// Returns [`RelayError::Signing`] if signing fails.
pub fn signed_query(
    key: &str,
    secret: &str,
    method: &str,
    path: &str,
    body: &str,
    timestamp: i64,
) -> Result<String, RelayError> {
    let mut params = [
        ("auth_key", key.to_owned()),
        ("auth_timestamp", timestamp.to_string()),
        ("auth_version", AUTH_VERSION.to_owned()),
        ("body_md5", body_md5(body)),
    ];
    params.sort_by(|a, b| a.0.cmp(b.0));

    let query = params
        .iter()
        .map(|(name, value)| format!("{name}={value}"))
        .collect::<Vec<_>>()
        .join("&");

    let signature = sign(secret, &format!("{method}\n{path}\n{query}"))?;
    Ok(format!("{query}&auth_signature={signature}"))
}
