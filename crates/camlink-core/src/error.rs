// ── Core error types ──
//
// Domain-level errors from camlink-core. Consumers never see reqwest or
// serde failures directly: `From<camlink_api::Error>` translates them.

use thiserror::Error;

use crate::registry::RegistryError;

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Connection errors ────────────────────────────────────────────
    #[error("Cannot connect to Frigate at {url}: {reason}")]
    ConnectionFailed { url: String, reason: String },

    #[error("Request timed out after {timeout_secs}s")]
    Timeout { timeout_secs: u64 },

    #[error("Authentication failed: {message}")]
    AuthenticationFailed { message: String },

    // ── Registry errors ──────────────────────────────────────────────
    #[error(transparent)]
    Registry(#[from] RegistryError),

    // ── Host errors ──────────────────────────────────────────────────
    #[error("Service {domain}.{service} is not registered")]
    UnknownService { domain: String, service: String },

    // ── API errors (wrapped, not exposed raw) ────────────────────────
    #[error("API error: {message}")]
    Api {
        message: String,
        /// HTTP status code (if applicable).
        status: Option<u16>,
    },

    // ── Configuration errors ─────────────────────────────────────────
    #[error("Configuration error: {message}")]
    Config { message: String },

    // ── Internal errors ──────────────────────────────────────────────
    #[error("Internal error: {0}")]
    Internal(String),
}

// ── Conversion from transport-layer errors ───────────────────────────

impl From<camlink_api::Error> for CoreError {
    fn from(err: camlink_api::Error) -> Self {
        match err {
            camlink_api::Error::Transport(ref e) => {
                if e.is_timeout() {
                    CoreError::Timeout { timeout_secs: 0 }
                } else if e.is_connect() {
                    CoreError::ConnectionFailed {
                        url: e
                            .url()
                            .map_or_else(|| "<unknown>".into(), ToString::to_string),
                        reason: e.to_string(),
                    }
                } else {
                    CoreError::Api {
                        message: e.to_string(),
                        status: e.status().map(|s| s.as_u16()),
                    }
                }
            }
            camlink_api::Error::InvalidUrl(e) => CoreError::Config {
                message: format!("Invalid URL: {e}"),
            },
            camlink_api::Error::Timeout { timeout_secs } => CoreError::Timeout { timeout_secs },
            camlink_api::Error::Tls(msg) => CoreError::ConnectionFailed {
                url: String::new(),
                reason: format!("TLS error: {msg}"),
            },
            camlink_api::Error::Unauthorized => CoreError::AuthenticationFailed {
                message: "Frigate rejected the API token".into(),
            },
            camlink_api::Error::Http { status, message } => CoreError::Api {
                message,
                status: Some(status),
            },
            camlink_api::Error::Deserialization { message, body: _ } => {
                CoreError::Internal(format!("Deserialization error: {message}"))
            }
            err @ (camlink_api::Error::StorageIo { .. }
            | camlink_api::Error::StorageFormat { .. }) => {
                CoreError::Registry(RegistryError::Storage(err))
            }
        }
    }
}
