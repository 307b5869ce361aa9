use std::path::PathBuf;

use thiserror::Error;

/// Top-level error type for the `camlink-api` crate.
///
/// Covers the Frigate HTTP surface and the Home Assistant storage files.
/// `camlink-core` maps these into domain-level errors.
#[derive(Debug, Error)]
pub enum Error {
    // ── Transport ───────────────────────────────────────────────────
    /// HTTP transport error (connection refused, DNS failure, etc.)
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// Request timed out.
    #[error("Request timed out after {timeout_secs}s")]
    Timeout { timeout_secs: u64 },

    /// TLS setup or client construction error.
    #[error("TLS error: {0}")]
    Tls(String),

    // ── Frigate API ─────────────────────────────────────────────────
    /// Frigate rejected the bearer token (or requires one).
    #[error("Frigate API rejected the request: unauthorized")]
    Unauthorized,

    /// Non-success HTTP status from the Frigate API.
    #[error("Frigate API error (HTTP {status}): {message}")]
    Http { status: u16, message: String },

    // ── Data ────────────────────────────────────────────────────────
    /// JSON deserialization failed, with the raw body for debugging.
    #[error("Deserialization error: {message}")]
    Deserialization { message: String, body: String },

    // ── Storage ─────────────────────────────────────────────────────
    /// Reading or writing a storage file failed.
    #[error("Storage I/O error on {}: {source}", path.display())]
    StorageIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A storage file exists but is not in the expected shape.
    #[error("Malformed storage file {}: {message}", path.display())]
    StorageFormat { path: PathBuf, message: String },
}

impl Error {
    /// Returns `true` if the error came from a missing storage file.
    pub fn is_not_found(&self) -> bool {
        match self {
            Self::StorageIo { source, .. } => source.kind() == std::io::ErrorKind::NotFound,
            Self::Http { status: 404, .. } => true,
            _ => false,
        }
    }
}
