//! Error types for the relay client and change notifier.
//!
//! Uses `thiserror` for typed errors that surface from request signing,
//! the relay HTTP call, and payload encoding.

/// Errors that can occur while publishing to the real-time relay.
#[derive(Debug, thiserror::Error)]
pub enum RelayError {
    /// The relay was unreachable or the request failed in transit.
    #[error("relay request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The relay answered with a non-success status.
    #[error("relay returned {status}: {body}")]
    Rejected {
        /// HTTP status code.
        status: u16,
        /// Response body, for diagnostics.
        body: String,
    },

    /// The event payload exceeds the relay's size limit.
    #[error("event payload is {size} bytes, limit is {limit}")]
    PayloadTooLarge {
        /// Encoded payload size.
        size: usize,
        /// Relay limit.
        limit: usize,
    },

    /// The request could not be signed.
    #[error("signing error: {0}")]
    Signing(String),

    /// Configuration is invalid or missing.
    #[error("config error: {0}")]
    Config(String),

    /// Serialization failure.
    #[error("serde error: {0}")]
    Serde(#[from] serde_json::Error),
}
