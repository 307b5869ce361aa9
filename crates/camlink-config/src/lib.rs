//! Configuration for the camlink CLI.
//!
//! TOML profiles, Frigate token resolution (env + keyring + plaintext),
//! and translation to `camlink_core::MergerConfig`. The CLI layers its
//! `GlobalOpts` overrides on top.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use camlink_core::{FrigateSettings, MergerConfig, TlsVerification};

/// Keyring service name all camlink secrets live under.
pub const KEYRING_SERVICE: &str = "camlink";

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("keyring access failed: {0}")]
    Keyring(#[from] keyring::Error),

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── TOML config structs ─────────────────────────────────────────────

/// Top-level TOML configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    /// Default profile name.
    pub default_profile: Option<String>,

    /// Global defaults.
    #[serde(default)]
    pub defaults: Defaults,

    /// Named Home Assistant installations.
    #[serde(default)]
    pub profiles: HashMap<String, Profile>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_profile: Some("default".into()),
            defaults: Defaults::default(),
            profiles: HashMap::new(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Defaults {
    #[serde(default = "default_output")]
    pub output: String,

    #[serde(default = "default_color")]
    pub color: String,

    /// Frigate API timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout: u64,

    /// Seconds between the startup signal and the first run.
    #[serde(default = "default_startup_delay")]
    pub startup_delay: u64,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            output: default_output(),
            color: default_color(),
            timeout: default_timeout(),
            startup_delay: default_startup_delay(),
        }
    }
}

fn default_output() -> String {
    "table".into()
}
fn default_color() -> String {
    "auto".into()
}
fn default_timeout() -> u64 {
    FrigateSettings::default().timeout.as_secs()
}
fn default_startup_delay() -> u64 {
    camlink_core::config::DEFAULT_STARTUP_DELAY.as_secs()
}
fn default_true() -> bool {
    true
}

/// A named Home Assistant installation.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Profile {
    /// Home Assistant config directory, or its `.storage` directory.
    pub storage: PathBuf,

    /// Frigate base URL. Discovered from the Frigate config entry when unset.
    pub frigate_url: Option<String>,

    /// Query the Frigate configuration API.
    #[serde(default = "default_true")]
    pub frigate_api: bool,

    /// Frigate API token (plaintext, prefer keyring or env var).
    pub api_token: Option<String>,

    /// Environment variable name containing the Frigate API token.
    pub api_token_env: Option<String>,

    /// Path to custom CA certificate.
    pub ca_cert: Option<PathBuf>,

    /// Accept self-signed Frigate certificates.
    pub insecure: Option<bool>,

    /// Override timeout.
    pub timeout: Option<u64>,

    /// Override startup delay.
    pub startup_delay: Option<u64>,

    /// Identifier domain of the camera devices (default "frigate").
    pub target_domain: Option<String>,

    /// Name of the NVR's own root device (default "Frigate").
    pub target_name: Option<String>,

    /// Integrations allowed to contribute config-entry addresses.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub source_domains: Vec<String>,

    pub stream_url_fallback: Option<bool>,

    pub strip_camera_suffix: Option<bool>,
}

// ── Config file path ────────────────────────────────────────────────

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    ProjectDirs::from("com", "camlink", "camlink").map_or_else(
        || {
            let mut p = dirs_fallback();
            p.push("config.toml");
            p
        },
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

fn dirs_fallback() -> PathBuf {
    let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
    p.push(".config");
    p.push("camlink");
    p
}

// ── Config loading ──────────────────────────────────────────────────

/// Load the full Config from the canonical file + environment.
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from(&config_path())
}

/// Load the full Config from `path` + environment.
///
/// Nested keys use a double underscore:
/// `CAMLINK_PROFILES__HOME__FRIGATE_URL=http://nvr:5000`.
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    let figment = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed("CAMLINK_").split("__"));

    let config: Config = figment.extract()?;
    Ok(config)
}

/// Load config, returning a default if the file doesn't exist.
pub fn load_config_or_default() -> Config {
    load_config().unwrap_or_default()
}

// ── Config saving ───────────────────────────────────────────────────

/// Serialize config to TOML and write to the canonical config path.
pub fn save_config(cfg: &Config) -> Result<(), ConfigError> {
    save_config_to(cfg, &config_path())
}

pub fn save_config_to(cfg: &Config, path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let toml_str = toml::to_string_pretty(cfg)?;
    std::fs::write(path, toml_str)?;
    Ok(())
}

// ── Token resolution ────────────────────────────────────────────────

fn keyring_entry(profile_name: &str) -> Result<keyring::Entry, ConfigError> {
    Ok(keyring::Entry::new(
        KEYRING_SERVICE,
        &format!("{profile_name}/frigate-token"),
    )?)
}

/// Resolve the Frigate API token. `None` means an unauthenticated instance.
pub fn resolve_api_token(profile: &Profile, profile_name: &str) -> Option<SecretString> {
    // 1. Profile's api_token_env → env var lookup
    if let Some(ref env_name) = profile.api_token_env {
        if let Ok(val) = std::env::var(env_name) {
            return Some(SecretString::from(val));
        }
    }

    // 2. System keyring
    if let Ok(entry) = keyring_entry(profile_name) {
        if let Ok(secret) = entry.get_password() {
            return Some(SecretString::from(secret));
        }
    }

    // 3. Plaintext in config
    profile.api_token.clone().map(SecretString::from)
}

/// Store the Frigate API token for `profile_name` in the system keyring.
pub fn store_api_token(profile_name: &str, token: &str) -> Result<(), ConfigError> {
    if token.is_empty() {
        return Err(ConfigError::Validation {
            field: "api_token".into(),
            reason: "token cannot be empty".into(),
        });
    }
    keyring_entry(profile_name)?.set_password(token)?;
    Ok(())
}

// ── Profile → MergerConfig ──────────────────────────────────────────

/// Validate a Frigate base URL from a profile or flag.
pub fn validate_frigate_url(raw: &str) -> Result<(), ConfigError> {
    let url: url::Url = raw.parse().map_err(|_| ConfigError::Validation {
        field: "frigate_url".into(),
        reason: format!("invalid URL: {raw}"),
    })?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(ConfigError::Validation {
            field: "frigate_url".into(),
            reason: format!("expected http or https, got '{}'", url.scheme()),
        });
    }
    Ok(())
}

/// Build a `MergerConfig` from a profile and the global defaults.
pub fn profile_to_merger_config(
    profile: &Profile,
    profile_name: &str,
    defaults: &Defaults,
) -> Result<MergerConfig, ConfigError> {
    if let Some(ref url) = profile.frigate_url {
        validate_frigate_url(url)?;
    }

    let tls = if profile.insecure.unwrap_or(false) {
        TlsVerification::DangerAcceptInvalid
    } else if let Some(ref ca_path) = profile.ca_cert {
        TlsVerification::CustomCa(ca_path.clone())
    } else {
        TlsVerification::SystemDefaults
    };

    let base = MergerConfig::default();
    let frigate = FrigateSettings {
        enabled: profile.frigate_api,
        url: profile.frigate_url.clone(),
        timeout: Duration::from_secs(profile.timeout.unwrap_or(defaults.timeout)),
        token: if profile.frigate_api {
            resolve_api_token(profile, profile_name)
        } else {
            None
        },
        tls,
        ..base.frigate
    };

    Ok(MergerConfig {
        target_domain: profile.target_domain.clone().unwrap_or(base.target_domain),
        target_name: profile.target_name.clone().unwrap_or(base.target_name),
        startup_delay: Duration::from_secs(profile.startup_delay.unwrap_or(defaults.startup_delay)),
        frigate,
        source_domains: profile.source_domains.clone(),
        stream_url_fallback: profile
            .stream_url_fallback
            .unwrap_or(base.stream_url_fallback),
        strip_camera_suffix: profile
            .strip_camera_suffix
            .unwrap_or(base.strip_camera_suffix),
        ..base
    })
}
