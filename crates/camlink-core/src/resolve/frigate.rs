// ── Frigate camera addresses ──
//
// The authoritative camera → IP map. go2rtc streams are read first since
// Frigate's own ffmpeg inputs usually point at the local proxy; direct
// camera inputs only fill in cameras go2rtc does not know about.

use std::net::Ipv4Addr;

use camlink_api::FrigateConfig;
use tracing::debug;

use super::address::extract_credential_host;
use super::tables::IpTable;
use crate::config::MergerConfig;
use crate::model::ConfigEntryRecord;

/// IP behind an `rtsp://` or `rtsps://` stream URL, if any.
///
/// go2rtc sources may carry an `ffmpeg:` transcoding prefix.
pub fn rtsp_host(source: &str) -> Option<Ipv4Addr> {
    let url = source.trim();
    let url = url.strip_prefix("ffmpeg:").unwrap_or(url);
    let lower = url.to_ascii_lowercase();
    if !(lower.starts_with("rtsp://") || lower.starts_with("rtsps://")) {
        return None;
    }
    extract_credential_host(url)
}

/// Build the lower-cased camera id → IP table from Frigate's config.
pub fn camera_ips(config: &FrigateConfig) -> IpTable {
    let mut table = IpTable::new();

    if let Some(go2rtc) = &config.go2rtc {
        for (name, sources) in &go2rtc.streams {
            if let Some(ip) = sources.urls().find_map(rtsp_host) {
                table.insert(name.to_lowercase(), ip, &format!("go2rtc:{name}"));
            }
        }
    }

    for (name, camera) in &config.cameras {
        let key = name.to_lowercase();
        if table.get(&key).is_some() {
            continue;
        }
        if let Some(ip) = camera.input_paths().find_map(rtsp_host) {
            table.insert(key, ip, &format!("ffmpeg:{name}"));
        }
    }

    debug!(cameras = table.len(), "parsed camera addresses from Frigate config");
    table
}

/// Pick the Frigate API base URL.
///
/// Order: explicit override, the Frigate config entry's `url`, its `host`,
/// then the configured default. Scheme-less hosts get `http://`.
pub fn frigate_base_url<'a, I>(config: &MergerConfig, entries: I) -> String
where
    I: IntoIterator<Item = &'a ConfigEntryRecord>,
{
    if let Some(url) = config.frigate.url.as_deref().filter(|u| !u.trim().is_empty()) {
        return with_scheme(url);
    }

    let target_entries: Vec<&ConfigEntryRecord> = entries
        .into_iter()
        .filter(|entry| entry.domain == config.target_domain)
        .collect();

    ["url", "host"]
        .iter()
        .find_map(|field| {
            target_entries
                .iter()
                .find_map(|entry| entry.str_field(field).filter(|v| !v.trim().is_empty()))
        })
        .map_or_else(|| config.frigate.default_url.clone(), with_scheme)
}

fn with_scheme(raw: &str) -> String {
    let raw = raw.trim();
    if raw.contains("://") {
        raw.to_owned()
    } else {
        format!("http://{raw}")
    }
}
