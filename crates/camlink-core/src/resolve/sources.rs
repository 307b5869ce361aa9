// ── Candidate-source tables ──
//
// Builds the two tables derived from non-target devices: which MAC sits
// at which private IP, and which normalized device name sits at which
// private IP. The Frigate API never feeds either of them.

use std::net::Ipv4Addr;

use tracing::{debug, info};

use super::address::{config_entry_ip, extract_private_ipv4};
use super::inventory::Inventory;
use super::names::{name_variants, stripped_variants};
use super::tables::{IpTable, MacClaim, MacTable};
use crate::config::MergerConfig;
use crate::model::DeviceRecord;

/// Private IP from the device's own allowed config entries, in device order.
fn entry_ip(inventory: &Inventory, config: &MergerConfig, device: &DeviceRecord) -> Option<Ipv4Addr> {
    inventory
        .entries_of(device)
        .filter(|entry| config.allows_source_domain(&entry.domain))
        .find_map(config_entry_ip)
}

/// Private IP from the device's name or user-assigned name.
fn name_ip(device: &DeviceRecord) -> Option<Ipv4Addr> {
    [device.name.as_deref(), device.name_by_user.as_deref()]
        .into_iter()
        .flatten()
        .find_map(extract_private_ipv4)
}

/// Build the `IPv4 → MAC` table from every non-target device with a MAC.
pub fn build_mac_table(inventory: &Inventory, config: &MergerConfig) -> MacTable {
    let mut table = MacTable::new();

    for device in &inventory.sources {
        let Some(mac) = device.mac() else {
            continue;
        };
        let Some(ip) = entry_ip(inventory, config, device).or_else(|| name_ip(device)) else {
            debug!(device = device.display_name(), %mac, "MAC source has no private IP");
            continue;
        };

        let inserted = table.insert(
            ip,
            MacClaim {
                mac: mac.clone(),
                device_id: device.id.clone(),
                device_name: device.display_name().to_owned(),
            },
        );
        if inserted {
            info!(%mac, %ip, device = device.display_name(), "found MAC for IP");
        }
    }

    info!(mappings = table.len(), "built IP-to-MAC table from other integrations");
    table
}

/// Build the normalized-name → IPv4 table from stored connection data.
///
/// Every device's own spellings go in before any suffix-stripped key, so
/// "Front Door Camera" never claims `front_door` from a device actually
/// named "Front Door".
pub fn build_name_table(inventory: &Inventory, config: &MergerConfig) -> IpTable {
    let named: Vec<(&str, Ipv4Addr)> = inventory
        .sources
        .iter()
        .filter(|device| !device.display_name().is_empty())
        .filter_map(|device| Some((device.display_name(), entry_ip(inventory, config, device)?)))
        .collect();

    let mut table = IpTable::new();
    for &(name, ip) in &named {
        let variants = name_variants(name, false);
        for variant in &variants {
            table.insert(variant.as_str(), ip, name);
        }
        debug!(device = name, %ip, ?variants, "mapped device name to IP");
    }
    if config.strip_camera_suffix {
        for &(name, ip) in &named {
            for variant in stripped_variants(name) {
                table.insert(variant, ip, name);
            }
        }
    }

    table
}
