//! Command dispatch: bridges CLI args -> merger runs -> output formatting.

pub mod config_cmd;
pub mod inspect;
pub mod run;
pub mod watch;

use std::sync::Arc;

use camlink_core::{Merger, MergerConfig, StorageRegistry};

use crate::cli::{Command, GlobalOpts};
use crate::config::Resolved;
use crate::error::CliError;

/// Dispatch a registry-bound command to the appropriate handler.
pub async fn dispatch(
    cmd: Command,
    resolved: &Resolved,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match cmd {
        Command::Run(args) => {
            let merger = open_merger(resolved, resolved.merger.clone())?;
            run::handle(&merger, &args, global).await
        }
        Command::Watch(args) => watch::handle(resolved, &args, global).await,
        Command::Inspect(args) => inspect::handle(resolved, &args, global).await,
        // Config and Completions are handled before dispatch
        Command::Config(_) | Command::Completions(_) => unreachable!(),
    }
}

/// Open the profile's storage registry and bind a merger to it.
pub fn open_merger(resolved: &Resolved, config: MergerConfig) -> Result<Merger, CliError> {
    let registry = StorageRegistry::open(&resolved.storage)?;
    Ok(Merger::new(config, Arc::new(registry)))
}
