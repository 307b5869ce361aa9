//! CLI configuration: thin wrapper around `camlink_config` shared types.
//!
//! Adds resolution that respects `GlobalOpts` flag overrides
//! (--storage, --frigate-url, --no-frigate, ...).

use std::path::PathBuf;
use std::time::Duration;

use camlink_core::{MergerConfig, TlsVerification};

use crate::cli::GlobalOpts;
use crate::error::CliError;

// ── Re-exports from shared crate ────────────────────────────────────

pub use camlink_config::{
    Config, Profile, config_path, load_config, load_config_or_default, save_config,
};

// ── CLI-specific helpers ────────────────────────────────────────────

/// Resolve the active profile name from CLI flags and config.
pub fn active_profile_name(global: &GlobalOpts, config: &Config) -> String {
    global
        .profile
        .clone()
        .or_else(|| config.default_profile.clone())
        .unwrap_or_else(|| "default".into())
}

/// Comma-separated profile names for help text.
pub fn available_profiles(config: &Config) -> String {
    let mut names: Vec<_> = config.profiles.keys().cloned().collect();
    if names.is_empty() {
        return "(none)".into();
    }
    names.sort();
    names.join(", ")
}

/// A profile with every CLI override applied.
#[derive(Debug)]
pub struct Resolved {
    pub profile_name: String,
    /// Home Assistant config directory or `.storage` directory.
    pub storage: PathBuf,
    pub merger: MergerConfig,
}

/// Load the config and resolve the active profile against the global flags.
///
/// Without a matching profile, `--storage` alone is enough to run.
pub fn resolve(global: &GlobalOpts) -> Result<Resolved, CliError> {
    let cfg = load_config()?;
    let profile_name = active_profile_name(global, &cfg);

    let mut profile = match cfg.profiles.get(&profile_name) {
        Some(profile) => profile.clone(),
        None if global.profile.is_some() => {
            return Err(CliError::ProfileNotFound {
                name: profile_name,
                available: available_profiles(&cfg),
            });
        }
        None if global.storage.is_some() => Profile {
            frigate_api: true,
            ..Profile::default()
        },
        None => {
            return Err(CliError::NoConfig {
                path: config_path().display().to_string(),
            });
        }
    };

    if global.no_frigate {
        profile.frigate_api = false;
    }
    if let Some(ref storage) = global.storage {
        profile.storage.clone_from(storage);
    }
    if profile.storage.as_os_str().is_empty() {
        return Err(CliError::Validation {
            field: "storage".into(),
            reason: format!("profile '{profile_name}' has no storage path"),
        });
    }

    let mut merger = camlink_config::profile_to_merger_config(&profile, &profile_name, &cfg.defaults)?;
    apply_overrides(&mut merger, global)?;

    Ok(Resolved {
        profile_name,
        storage: profile.storage,
        merger,
    })
}

/// Flag > env > profile for the Frigate connection settings.
fn apply_overrides(merger: &mut MergerConfig, global: &GlobalOpts) -> Result<(), CliError> {
    if let Some(ref url) = global.frigate_url {
        camlink_config::validate_frigate_url(url)?;
        merger.frigate.url = Some(url.clone());
    }
    if global.insecure {
        merger.frigate.tls = TlsVerification::DangerAcceptInvalid;
    }
    if let Some(secs) = global.timeout {
        merger.frigate.timeout = Duration::from_secs(secs);
    }
    Ok(())
}
