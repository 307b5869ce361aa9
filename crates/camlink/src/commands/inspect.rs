//! `camlink inspect`: show one of a run's lookup tables.

use std::net::Ipv4Addr;

use serde::Serialize;
use tabled::Tabled;

use camlink_core::{IpTable, MacTable};

use crate::cli::{GlobalOpts, InspectArgs, InspectCommand};
use crate::config::Resolved;
use crate::error::CliError;
use crate::output;

use super::open_merger;

// ── Rows ────────────────────────────────────────────────────────────

#[derive(Clone, Serialize, Tabled)]
struct MacRow {
    #[tabled(rename = "IP")]
    ip: Ipv4Addr,
    #[tabled(rename = "MAC")]
    mac: String,
    #[tabled(rename = "Device")]
    device: String,
    #[tabled(rename = "Device ID")]
    device_id: String,
}

#[derive(Clone, Serialize, Tabled)]
struct IpRow {
    #[tabled(rename = "Key")]
    key: String,
    #[tabled(rename = "IP")]
    ip: Ipv4Addr,
    #[tabled(rename = "Source")]
    source: String,
}

fn mac_rows(table: &MacTable) -> Vec<MacRow> {
    let claims = table.iter().map(|(ip, claim)| MacRow {
        ip,
        mac: claim.mac.to_string(),
        device: claim.device_name.clone(),
        device_id: claim.device_id.clone(),
    });
    let conflicts = table.poisoned().map(|ip| MacRow {
        ip,
        mac: "(conflict)".into(),
        device: String::new(),
        device_id: String::new(),
    });
    claims.chain(conflicts).collect()
}

fn ip_rows(table: &IpTable) -> Vec<IpRow> {
    table
        .iter()
        .map(|(key, entry)| IpRow {
            key: key.to_owned(),
            ip: entry.ip,
            source: entry.source.clone(),
        })
        .collect()
}

fn print_ip_rows(rows: &[IpRow], global: &GlobalOpts) {
    let out = output::render_list(&global.output, rows, Clone::clone, |r| {
        format!("{}\t{}", r.key, r.ip)
    });
    output::print_output(&out, global.quiet);
}

// ── Handler ─────────────────────────────────────────────────────────

pub async fn handle(
    resolved: &Resolved,
    args: &InspectArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let mut config = resolved.merger.clone();
    // Only the frigate view needs the API.
    if !matches!(args.command, InspectCommand::Frigate) {
        config.frigate.enabled = false;
    }
    let snapshot = open_merger(resolved, config)?.inspect().await?;

    match args.command {
        InspectCommand::Macs => {
            let rows = mac_rows(&snapshot.macs);
            let out = output::render_list(&global.output, &rows, Clone::clone, |r| {
                format!("{}\t{}", r.ip, r.mac)
            });
            output::print_output(&out, global.quiet);
        }

        InspectCommand::Names => print_ip_rows(&ip_rows(&snapshot.names), global),

        InspectCommand::Frigate => {
            let lookup = snapshot.frigate;
            let Some(url) = lookup.url else {
                eprintln!("Frigate API lookup is disabled for this profile");
                return Ok(());
            };
            if let Some(err) = lookup.error {
                return Err(CliError::ApiError {
                    message: format!("Frigate API at {url} unavailable: {err}"),
                });
            }
            if !global.quiet {
                eprintln!("Frigate: {url}");
            }
            print_ip_rows(&ip_rows(&lookup.cameras), global);
        }
    }
    Ok(())
}
