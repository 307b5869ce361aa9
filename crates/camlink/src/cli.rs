//! Clap derive structures for the `camlink` CLI.
//!
//! Defines the command tree, global flags, and shared types.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// camlink -- attach camera MAC addresses to Frigate devices
#[derive(Debug, Parser)]
#[command(
    name = "camlink",
    version,
    about = "Attach camera MAC addresses to Frigate devices in Home Assistant",
    long_about = "Correlates the camera devices created by the Frigate integration with the\n\
        devices other integrations (UniFi Protect, Reolink, Hikvision, ONVIF, ...)\n\
        register for the same hardware, matching them by IP address, and writes the\n\
        MAC address onto the Frigate device so Home Assistant merges the two.\n\n\
        Works on the .storage directory of a stopped Home Assistant instance.",
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub command: Command,
}

// ── Global Options ───────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct GlobalOpts {
    /// Profile to use
    #[arg(long, short = 'p', env = "CAMLINK_PROFILE", global = true)]
    pub profile: Option<String>,

    /// Home Assistant config directory or its .storage directory (overrides profile)
    #[arg(long, short = 's', env = "CAMLINK_STORAGE", global = true)]
    pub storage: Option<PathBuf>,

    /// Frigate base URL (overrides profile and config entry discovery)
    #[arg(long, env = "CAMLINK_FRIGATE_URL", global = true)]
    pub frigate_url: Option<String>,

    /// Skip the Frigate API and use only the registry strategies
    #[arg(long, global = true)]
    pub no_frigate: bool,

    /// Output format
    #[arg(
        long,
        short = 'o',
        env = "CAMLINK_OUTPUT",
        default_value = "table",
        global = true
    )]
    pub output: OutputFormat,

    /// When to use color output
    #[arg(long, default_value = "auto", global = true)]
    pub color: ColorMode,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Accept self-signed Frigate certificates
    #[arg(long, short = 'k', env = "CAMLINK_INSECURE", global = true)]
    pub insecure: bool,

    /// Frigate API timeout in seconds
    #[arg(long, env = "CAMLINK_TIMEOUT", global = true)]
    pub timeout: Option<u64>,
}

// ── Output & Color Enums ─────────────────────────────────────────────

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    /// Pretty table (default, interactive)
    Table,
    /// Pretty-printed JSON
    Json,
    /// Compact single-line JSON
    JsonCompact,
    /// YAML
    Yaml,
    /// Plain text, one value per line (scripting)
    Plain,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum ColorMode {
    /// Auto-detect (color if terminal is interactive)
    Auto,
    /// Always emit color codes
    Always,
    /// Never emit color codes
    Never,
}

// ── Top-Level Command Enum ───────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Correlate once and write MAC addresses to the Frigate cameras
    Run(RunArgs),

    /// Stay resident: run after startup and on SIGHUP until interrupted
    Watch(WatchArgs),

    /// Show the lookup tables a run would use
    #[command(alias = "i")]
    Inspect(InspectArgs),

    /// Manage CLI configuration and profiles
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  RUN / WATCH
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct RunArgs {
    /// Report what would be written without touching the registry
    #[arg(long, short = 'n')]
    pub dry_run: bool,

    /// Show every camera, including ones with nothing to do
    #[arg(long, short = 'a')]
    pub all: bool,
}

#[derive(Debug, Args)]
pub struct WatchArgs {
    /// Seconds to wait before the first run (overrides profile)
    #[arg(long)]
    pub startup_delay: Option<u64>,

    /// Emit logs as JSON lines
    #[arg(long)]
    pub json_logs: bool,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  INSPECT
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct InspectArgs {
    #[command(subcommand)]
    pub command: InspectCommand,
}

#[derive(Debug, Subcommand)]
pub enum InspectCommand {
    /// IP → MAC table built from non-Frigate devices
    Macs,

    /// Normalized name → IP table built from config entries
    Names,

    /// Frigate camera → IP map from the Frigate API
    Frigate,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  CONFIG
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Create initial config file with guided setup
    Init,

    /// Display current resolved configuration
    Show,

    /// Print the config file location
    Path,

    /// Store the active profile's Frigate API token in the system keyring
    SetToken,
}

// ── Completions ──────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: clap_complete::Shell,
}
