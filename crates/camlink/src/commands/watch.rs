//! `camlink watch`: bind the merger to a local host and stay resident.
//!
//! The host counts as already running, so the first pass happens after
//! the startup delay. `SIGHUP` calls the manual update service; Ctrl-C
//! cancels pending triggers and exits once any in-flight run finishes.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::broadcast::error::RecvError;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use camlink_core::{Lifecycle, LocalHost, UPDATE_SERVICE};

use crate::cli::{GlobalOpts, WatchArgs};
use crate::config::Resolved;
use crate::error::CliError;

use super::{open_merger, run};

// ── Hangup signal ───────────────────────────────────────────────────

#[cfg(unix)]
type Hangup = tokio::signal::unix::Signal;

#[cfg(unix)]
fn hangup_stream() -> std::io::Result<Hangup> {
    tokio::signal::unix::signal(tokio::signal::unix::SignalKind::hangup())
}

#[cfg(unix)]
async fn next_hangup(stream: &mut Hangup) {
    if stream.recv().await.is_none() {
        std::future::pending::<()>().await;
    }
}

#[cfg(not(unix))]
struct Hangup;

#[cfg(not(unix))]
#[allow(clippy::unnecessary_wraps)]
fn hangup_stream() -> std::io::Result<Hangup> {
    Ok(Hangup)
}

#[cfg(not(unix))]
async fn next_hangup(_stream: &mut Hangup) {
    std::future::pending::<()>().await;
}

// ── Handler ─────────────────────────────────────────────────────────

pub async fn handle(
    resolved: &Resolved,
    args: &WatchArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let mut config = resolved.merger.clone();
    if let Some(secs) = args.startup_delay {
        config.startup_delay = Duration::from_secs(secs);
    }
    let domain = config.domain.clone();
    let merger = Arc::new(open_merger(resolved, config)?);

    let host = LocalHost::running();
    let cancel = CancellationToken::new();
    let lifecycle = Lifecycle::start(merger, &host, cancel.clone());
    let mut reports = lifecycle.subscribe();
    let mut hangup = hangup_stream()?;

    info!(
        profile = %resolved.profile_name,
        storage = %resolved.storage.display(),
        "watching, send SIGHUP to run again or Ctrl-C to stop"
    );

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    loop {
        tokio::select! {
            result = &mut ctrl_c => {
                if let Err(err) = result {
                    warn!(error = %err, "failed to listen for Ctrl-C");
                }
                info!("interrupt received, shutting down");
                break;
            }
            () = next_hangup(&mut hangup) => {
                info!("SIGHUP received, calling update service");
                host.call_service(&domain, UPDATE_SERVICE).await?;
            }
            received = reports.recv() => match received {
                Ok(triggered) => match triggered.result {
                    Ok(ref report) => run::print_report(report, global, false),
                    Err(ref chain) => eprintln!("{} run failed: {chain}", triggered.trigger),
                },
                Err(RecvError::Lagged(skipped)) => warn!(skipped, "dropped run reports"),
                Err(RecvError::Closed) => break,
            },
        }
    }

    lifecycle.shutdown().await;
    Ok(())
}
