//! Config subcommand handlers.

use std::path::PathBuf;

use dialoguer::{Confirm, Input, Select};

use crate::cli::{ConfigArgs, ConfigCommand, GlobalOpts};
use crate::config::{self, Config, Profile};
use crate::error::CliError;
use crate::output;

// ── Helpers ─────────────────────────────────────────────────────────

const REDACTED: &str = "****";

/// Copy of the config with plaintext tokens masked.
fn redacted(cfg: &Config) -> Config {
    let mut cfg = cfg.clone();
    for profile in cfg.profiles.values_mut() {
        if profile.api_token.is_some() {
            profile.api_token = Some(REDACTED.into());
        }
    }
    cfg
}

/// Format config for display. Expects an already redacted config.
fn format_config(cfg: &Config) -> String {
    use std::fmt::Write;
    let mut out = String::new();

    if let Some(ref default) = cfg.default_profile {
        let _ = writeln!(out, "default_profile = \"{default}\"");
    }
    let _ = writeln!(out);
    let _ = writeln!(out, "[defaults]");
    let _ = writeln!(out, "output = \"{}\"", cfg.defaults.output);
    let _ = writeln!(out, "color = \"{}\"", cfg.defaults.color);
    let _ = writeln!(out, "timeout = {}", cfg.defaults.timeout);
    let _ = writeln!(out, "startup_delay = {}", cfg.defaults.startup_delay);

    let mut names: Vec<_> = cfg.profiles.keys().collect();
    names.sort();
    for name in names {
        let p = &cfg.profiles[name];
        let _ = writeln!(out);
        let _ = writeln!(out, "[profiles.{name}]");
        let _ = writeln!(out, "storage = \"{}\"", p.storage.display());
        if let Some(ref url) = p.frigate_url {
            let _ = writeln!(out, "frigate_url = \"{url}\"");
        }
        if !p.frigate_api {
            let _ = writeln!(out, "frigate_api = false");
        }
        if let Some(ref token) = p.api_token {
            let _ = writeln!(out, "api_token = \"{token}\"");
        }
        if let Some(ref env) = p.api_token_env {
            let _ = writeln!(out, "api_token_env = \"{env}\"");
        }
        if let Some(ref ca) = p.ca_cert {
            let _ = writeln!(out, "ca_cert = \"{}\"", ca.display());
        }
        if let Some(insecure) = p.insecure {
            let _ = writeln!(out, "insecure = {insecure}");
        }
        if let Some(timeout) = p.timeout {
            let _ = writeln!(out, "timeout = {timeout}");
        }
        if let Some(delay) = p.startup_delay {
            let _ = writeln!(out, "startup_delay = {delay}");
        }
        if let Some(ref domain) = p.target_domain {
            let _ = writeln!(out, "target_domain = \"{domain}\"");
        }
        if let Some(ref name) = p.target_name {
            let _ = writeln!(out, "target_name = \"{name}\"");
        }
        if !p.source_domains.is_empty() {
            let quoted: Vec<_> = p.source_domains.iter().map(|d| format!("\"{d}\"")).collect();
            let _ = writeln!(out, "source_domains = [{}]", quoted.join(", "));
        }
        if let Some(fallback) = p.stream_url_fallback {
            let _ = writeln!(out, "stream_url_fallback = {fallback}");
        }
        if let Some(strip) = p.strip_camera_suffix {
            let _ = writeln!(out, "strip_camera_suffix = {strip}");
        }
    }

    out
}

/// Map a dialoguer / interactive I/O failure into CliError.
fn prompt_err(e: impl std::fmt::Display) -> CliError {
    CliError::Validation {
        field: "interactive".into(),
        reason: format!("prompt failed: {e}"),
    }
}

fn prompt_token() -> Result<String, CliError> {
    let token = rpassword::prompt_password("Frigate API token: ").map_err(prompt_err)?;
    if token.is_empty() {
        return Err(CliError::Validation {
            field: "api_token".into(),
            reason: "token cannot be empty".into(),
        });
    }
    Ok(token)
}

// ── Handler ─────────────────────────────────────────────────────────

pub fn handle(args: &ConfigArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        ConfigCommand::Init => init(global),

        ConfigCommand::Show => {
            let cfg = redacted(&config::load_config()?);
            let out = output::render_single(&global.output, &cfg, format_config, |_| {
                config::config_path().display().to_string()
            });
            output::print_output(&out, global.quiet);
            Ok(())
        }

        ConfigCommand::Path => {
            println!("{}", config::config_path().display());
            Ok(())
        }

        ConfigCommand::SetToken => {
            let cfg = config::load_config()?;
            let profile_name = config::active_profile_name(global, &cfg);
            if !cfg.profiles.contains_key(&profile_name) {
                return Err(CliError::ProfileNotFound {
                    name: profile_name,
                    available: config::available_profiles(&cfg),
                });
            }

            let token = prompt_token()?;
            camlink_config::store_api_token(&profile_name, &token)?;
            eprintln!("✓ Frigate token stored in system keyring for profile '{profile_name}'");
            Ok(())
        }
    }
}

// ── Init: interactive wizard ────────────────────────────────────────

fn init(global: &GlobalOpts) -> Result<(), CliError> {
    let config_path = config::config_path();
    eprintln!("camlink configuration wizard");
    eprintln!("   Config path: {}\n", config_path.display());

    // 1. Profile name
    let profile_name: String = Input::new()
        .with_prompt("Profile name")
        .default(global.profile.clone().unwrap_or_else(|| "default".into()))
        .interact_text()
        .map_err(prompt_err)?;

    // 2. Home Assistant config directory
    let storage: String = Input::new()
        .with_prompt("Home Assistant config directory")
        .default(
            global
                .storage
                .as_ref()
                .map_or_else(|| "/config".into(), |p| p.display().to_string()),
        )
        .interact_text()
        .map_err(prompt_err)?;
    let storage = PathBuf::from(storage);
    if !storage.join(".storage").is_dir() && !storage.ends_with(".storage") {
        eprintln!("   ! {} has no .storage directory yet", storage.display());
    }

    // 3. Frigate URL (blank = discover from the Frigate config entry)
    let frigate_url: String = Input::new()
        .with_prompt("Frigate URL (blank to discover)")
        .allow_empty(true)
        .interact_text()
        .map_err(prompt_err)?;
    let frigate_url = if frigate_url.trim().is_empty() {
        None
    } else {
        camlink_config::validate_frigate_url(frigate_url.trim())?;
        Some(frigate_url.trim().to_owned())
    };

    // 4. Token
    let choices = &[
        "No token (unauthenticated Frigate)",
        "Store in system keyring (recommended)",
        "Save to config file (plaintext)",
    ];
    let selection = Select::new()
        .with_prompt("Frigate API token")
        .items(choices)
        .default(0)
        .interact()
        .map_err(prompt_err)?;
    let api_token = match selection {
        0 => None,
        1 => {
            let token = prompt_token()?;
            camlink_config::store_api_token(&profile_name, &token)?;
            eprintln!("   ✓ Token stored in system keyring");
            None
        }
        _ => Some(prompt_token()?),
    };

    // 5. Merge into the existing config
    let mut cfg = config::load_config_or_default();
    if cfg.profiles.contains_key(&profile_name)
        && !Confirm::new()
            .with_prompt(format!("Replace existing profile '{profile_name}'?"))
            .default(false)
            .interact()
            .map_err(prompt_err)?
    {
        return Ok(());
    }

    cfg.profiles.insert(
        profile_name.clone(),
        Profile {
            storage,
            frigate_url,
            frigate_api: true,
            api_token,
            ..Profile::default()
        },
    );
    cfg.default_profile = Some(profile_name.clone());
    config::save_config(&cfg)?;

    eprintln!("\n✓ Configuration written to {}", config_path.display());
    eprintln!("  Active profile: {profile_name}");
    eprintln!("\n  Try it: camlink run --dry-run");
    Ok(())
}
