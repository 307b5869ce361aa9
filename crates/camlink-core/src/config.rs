// ── Runtime merger configuration ──
//
// Describes *what* the merger correlates and how it reaches Frigate.
// Built by the CLI from a profile and handed in; core never reads
// config files.

use std::path::PathBuf;
use std::time::Duration;

use secrecy::SecretString;

/// Default delay between the host's startup signal and the first run.
pub const DEFAULT_STARTUP_DELAY: Duration = Duration::from_secs(15);

/// Frigate add-on hostname used when no config entry names one.
pub const DEFAULT_FRIGATE_URL: &str = "http://ccab4aaf-frigate:5000";

/// TLS verification strategy for the Frigate API.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum TlsVerification {
    /// System CA store (strict).
    #[default]
    SystemDefaults,
    /// Custom CA certificate file.
    CustomCa(PathBuf),
    /// Skip verification (self-signed certs).
    DangerAcceptInvalid,
}

/// How to reach the Frigate configuration API.
#[derive(Debug, Clone)]
pub struct FrigateSettings {
    /// Query the API at all. When off, only the fallback strategies run.
    pub enabled: bool,
    /// Explicit base URL. Overrides anything found in config entries.
    pub url: Option<String>,
    /// Base URL used when neither the override nor a config entry has one.
    pub default_url: String,
    pub timeout: Duration,
    /// Bearer token for an authenticated Frigate instance.
    pub token: Option<SecretString>,
    pub tls: TlsVerification,
}

impl Default for FrigateSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            url: None,
            default_url: DEFAULT_FRIGATE_URL.to_owned(),
            timeout: camlink_api::transport::DEFAULT_TIMEOUT,
            token: None,
            tls: TlsVerification::default(),
        }
    }
}

/// Everything a merger instance needs, injected at construction.
#[derive(Debug, Clone)]
pub struct MergerConfig {
    /// Domain the manual service is registered under.
    pub domain: String,
    /// Identifier domain marking target (camera) devices.
    pub target_domain: String,
    /// Name of the target system's own root device, which is never updated.
    pub target_name: String,
    pub startup_delay: Duration,
    pub frigate: FrigateSettings,
    /// Integrations allowed to contribute config-entry addresses. Empty allows all.
    pub source_domains: Vec<String>,
    /// Try `user:pass@ip` stream URLs as the last strategy.
    pub stream_url_fallback: bool,
    /// Add name variants without a trailing "camera"/"cam".
    pub strip_camera_suffix: bool,
}

impl Default for MergerConfig {
    fn default() -> Self {
        Self {
            domain: "camlink".into(),
            target_domain: "frigate".into(),
            target_name: "Frigate".into(),
            startup_delay: DEFAULT_STARTUP_DELAY,
            frigate: FrigateSettings::default(),
            source_domains: Vec::new(),
            stream_url_fallback: true,
            strip_camera_suffix: true,
        }
    }
}

impl MergerConfig {
    /// Whether config entries of `domain` may contribute addresses.
    pub fn allows_source_domain(&self, domain: &str) -> bool {
        self.source_domains.is_empty()
            || self
                .source_domains
                .iter()
                .any(|allowed| allowed.eq_ignore_ascii_case(domain))
    }

    /// Whether `name` is the target system's root device.
    ///
    /// Matches the configured name exactly or as a `"<name> "` prefix,
    /// ignoring case.
    pub fn is_root_device_name(&self, name: &str) -> bool {
        let name = name.trim().to_lowercase();
        let target = self.target_name.trim().to_lowercase();
        !target.is_empty() && (name == target || name.starts_with(&format!("{target} ")))
    }
}
