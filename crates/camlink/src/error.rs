//! CLI error types with miette diagnostics.
//!
//! Maps `CoreError` and `ConfigError` into user-facing errors with
//! actionable help text.

use miette::Diagnostic;
use thiserror::Error;

use camlink_config::ConfigError;
use camlink_core::{CoreError, RegistryError};

/// Process exit codes.
pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const AUTH: i32 = 3;
    pub const NOT_FOUND: i32 = 4;
    pub const CONFLICT: i32 = 6;
    pub const CONNECTION: i32 = 7;
    pub const TIMEOUT: i32 = 8;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Frigate ──────────────────────────────────────────────────────
    #[error("Could not connect to Frigate at {url}: {reason}")]
    #[diagnostic(
        code(camlink::connection_failed),
        help(
            "Check that Frigate is running and reachable from this machine.\n\
             Set the URL with --frigate-url, or skip the API with --no-frigate."
        )
    )]
    ConnectionFailed { url: String, reason: String },

    #[error("Frigate authentication failed: {message}")]
    #[diagnostic(
        code(camlink::auth_failed),
        help("Store a valid token with: camlink config set-token")
    )]
    AuthFailed { message: String },

    #[error("Request timed out after {seconds}s")]
    #[diagnostic(
        code(camlink::timeout),
        help("Increase timeout with --timeout or check Frigate responsiveness.")
    )]
    Timeout { seconds: u64 },

    #[error("API error: {message}")]
    #[diagnostic(code(camlink::api_error))]
    ApiError { message: String },

    // ── Registry ─────────────────────────────────────────────────────
    #[error("Cannot read the Home Assistant registry: {message}")]
    #[diagnostic(
        code(camlink::storage),
        help(
            "Point --storage at the Home Assistant config directory (the one holding .storage).\n\
             Stop Home Assistant before writing, it keeps the registry in memory."
        )
    )]
    Storage { message: String },

    #[error("Device '{id}' not found in the registry")]
    #[diagnostic(code(camlink::not_found))]
    DeviceNotFound { id: String },

    #[error("{message}")]
    #[diagnostic(
        code(camlink::conflict),
        help("Another device already holds this connection. Run again to re-evaluate.")
    )]
    Conflict { message: String },

    // ── Validation ───────────────────────────────────────────────────
    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(camlink::validation))]
    Validation { field: String, reason: String },

    // ── Configuration ────────────────────────────────────────────────
    #[error("Profile '{name}' not found in configuration")]
    #[diagnostic(
        code(camlink::profile_not_found),
        help(
            "Available profiles: {available}\n\
             Create one with: camlink config init"
        )
    )]
    ProfileNotFound { name: String, available: String },

    #[error("No Home Assistant storage configured")]
    #[diagnostic(
        code(camlink::no_config),
        help(
            "Create a profile with: camlink config init\n\
             Or pass --storage /path/to/homeassistant/config\n\
             Expected config at: {path}"
        )
    )]
    NoConfig { path: String },

    #[error(transparent)]
    #[diagnostic(code(camlink::config))]
    Config(Box<figment::Error>),

    #[error("Keyring error: {message}")]
    #[diagnostic(
        code(camlink::keyring),
        help("Use api_token_env or api_token in the profile when no keyring is available.")
    )]
    Keyring { message: String },

    // ── IO / Serialization ───────────────────────────────────────────
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("Internal error: {message}")]
    #[diagnostic(code(camlink::internal))]
    Internal { message: String },
}

impl From<figment::Error> for CliError {
    fn from(err: figment::Error) -> Self {
        Self::Config(Box::new(err))
    }
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::ConnectionFailed { .. } => exit_code::CONNECTION,
            Self::AuthFailed { .. } => exit_code::AUTH,
            Self::DeviceNotFound { .. } => exit_code::NOT_FOUND,
            Self::Conflict { .. } => exit_code::CONFLICT,
            Self::Timeout { .. } => exit_code::TIMEOUT,
            Self::Validation { .. } | Self::NoConfig { .. } | Self::ProfileNotFound { .. } => {
                exit_code::USAGE
            }
            _ => exit_code::GENERAL,
        }
    }
}

// ── ConfigError → CliError mapping ───────────────────────────────────

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::Validation { field, reason } => CliError::Validation { field, reason },
            ConfigError::Keyring(e) => CliError::Keyring {
                message: e.to_string(),
            },
            ConfigError::Serialization(e) => CliError::Internal {
                message: format!("failed to serialize config: {e}"),
            },
            ConfigError::Figment(e) => CliError::Config(e),
            ConfigError::Io(e) => CliError::Io(e),
        }
    }
}

// ── CoreError → CliError mapping ─────────────────────────────────────

impl From<RegistryError> for CliError {
    fn from(err: RegistryError) -> Self {
        match err {
            RegistryError::DeviceNotFound { id } => CliError::DeviceNotFound { id },
            err @ RegistryError::DuplicateConnection { .. } => CliError::Conflict {
                message: err.to_string(),
            },
            RegistryError::Storage(e) => CliError::Storage {
                message: e.to_string(),
            },
        }
    }
}

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::ConnectionFailed { url, reason } => CliError::ConnectionFailed { url, reason },
            CoreError::AuthenticationFailed { message } => CliError::AuthFailed { message },
            CoreError::Timeout { timeout_secs } => CliError::Timeout {
                seconds: timeout_secs,
            },
            CoreError::Registry(e) => e.into(),
            CoreError::Api { message, status: _ } => CliError::ApiError { message },
            CoreError::Config { message } => CliError::Validation {
                field: "config".into(),
                reason: message,
            },
            CoreError::UnknownService { domain, service } => CliError::Internal {
                message: format!("service {domain}.{service} is not registered"),
            },
            CoreError::Internal(message) => CliError::Internal { message },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registry_errors_map_to_exit_codes() {
        let dup: CliError = CoreError::Registry(RegistryError::DuplicateConnection {
            kind: "mac".into(),
            value: "aa:bb:cc:dd:ee:ff".into(),
            existing_device: "other".into(),
        })
        .into();
        assert_eq!(dup.exit_code(), exit_code::CONFLICT);

        let missing: CliError = RegistryError::DeviceNotFound { id: "x".into() }.into();
        assert_eq!(missing.exit_code(), exit_code::NOT_FOUND);
    }

    #[test]
    fn config_validation_is_a_usage_error() {
        let err: CliError = ConfigError::Validation {
            field: "frigate_url".into(),
            reason: "invalid URL".into(),
        }
        .into();
        assert_eq!(err.exit_code(), exit_code::USAGE);
        assert_eq!(
            CliError::NoConfig { path: String::new() }.exit_code(),
            exit_code::USAGE
        );
    }
}
