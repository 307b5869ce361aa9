// ── Camera IP strategy chain ──
//
// Fixed priority, first success wins:
//   1. Frigate API camera map
//   2. name table from other integrations' stored hosts
//   3. IPv4 literal in the device name
//   4. `user:pass@ip` in an observed stream URL
// Strategies 2–4 only ever yield private addresses.

use std::net::Ipv4Addr;

use serde::Serialize;
use strum::{Display, EnumString};
use tracing::debug;

use super::address::{extract_credential_host, extract_private_ipv4, is_private};
use super::names::name_variants;
use super::tables::IpTable;
use crate::config::MergerConfig;
use crate::model::{DeviceRecord, EntityRecord};

/// Which strategy produced a camera's IP.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Display, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum IpSource {
    FrigateApi,
    NameMatch,
    DeviceName,
    StreamUrl,
}

/// A resolved camera address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Resolution {
    pub ip: Ipv4Addr,
    pub source: IpSource,
    /// The key, name or URL the address was read from.
    pub matched: String,
}

/// Runs the strategy chain against one run's tables.
pub struct CameraResolver<'a> {
    config: &'a MergerConfig,
    frigate: &'a IpTable,
    names: &'a IpTable,
}

impl<'a> CameraResolver<'a> {
    pub fn new(config: &'a MergerConfig, frigate: &'a IpTable, names: &'a IpTable) -> Self {
        Self {
            config,
            frigate,
            names,
        }
    }

    /// Name spellings of the device, each expanded to its lookup variants.
    fn name_keys(&self, device: &DeviceRecord) -> Vec<String> {
        let mut keys = Vec::new();
        for name in [device.name.as_deref(), device.name_by_user.as_deref()]
            .into_iter()
            .flatten()
        {
            for variant in name_variants(name, self.config.strip_camera_suffix) {
                if !keys.contains(&variant) {
                    keys.push(variant);
                }
            }
        }
        keys
    }

    /// Frigate camera ids from `<entry>:<camera>` identifiers, lower-cased.
    fn camera_ids(&self, device: &DeviceRecord) -> Vec<String> {
        device
            .identifier_values(&self.config.target_domain)
            .filter_map(|value| value.rsplit(':').next())
            .filter(|id| !id.is_empty())
            .map(str::to_lowercase)
            .collect()
    }

    fn from_frigate(&self, device: &DeviceRecord, name_keys: &[String]) -> Option<Resolution> {
        if self.frigate.is_empty() {
            return None;
        }
        let ids = self.camera_ids(device);
        let keys = ids.iter().chain(name_keys).map(String::as_str);
        let (key, entry) = self.frigate.find(keys)?;
        Some(Resolution {
            ip: entry.ip,
            source: IpSource::FrigateApi,
            matched: key.to_owned(),
        })
    }

    fn from_names(&self, name_keys: &[String]) -> Option<Resolution> {
        let (key, entry) = self.names.find(name_keys.iter().map(String::as_str))?;
        // The name table only ever holds private addresses.
        Some(Resolution {
            ip: entry.ip,
            source: IpSource::NameMatch,
            matched: key.to_owned(),
        })
    }

    fn from_device_name(device: &DeviceRecord) -> Option<Resolution> {
        [device.name.as_deref(), device.name_by_user.as_deref()]
            .into_iter()
            .flatten()
            .find_map(|name| {
                extract_private_ipv4(name).map(|ip| Resolution {
                    ip,
                    source: IpSource::DeviceName,
                    matched: name.to_owned(),
                })
            })
    }

    fn from_stream_urls(&self, cameras: &[EntityRecord]) -> Option<Resolution> {
        if !self.config.stream_url_fallback {
            return None;
        }
        cameras.iter().find_map(|entity| {
            let url = entity.stream_source.as_deref()?;
            let ip = extract_credential_host(url).filter(|ip| is_private(*ip))?;
            Some(Resolution {
                ip,
                source: IpSource::StreamUrl,
                matched: entity.entity_id.clone(),
            })
        })
    }

    /// Resolve a target camera's IP. `cameras` are its camera-domain entities.
    pub fn resolve(&self, device: &DeviceRecord, cameras: &[EntityRecord]) -> Option<Resolution> {
        let name_keys = self.name_keys(device);
        let resolution = self
            .from_frigate(device, &name_keys)
            .or_else(|| self.from_names(&name_keys))
            .or_else(|| Self::from_device_name(device))
            .or_else(|| self.from_stream_urls(cameras));

        if let Some(found) = &resolution {
            debug!(
                device = device.display_name(),
                ip = %found.ip,
                source = %found.source,
                matched = %found.matched,
                "resolved camera IP"
            );
        }
        resolution
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn camera(name: &str) -> DeviceRecord {
        DeviceRecord::new("cam", name).with_identifier("frigate", "entry1:front_door")
    }

    #[test]
    fn frigate_api_is_tried_first() {
        let config = MergerConfig::default();
        let mut frigate = IpTable::new();
        frigate.insert("front_door", Ipv4Addr::new(192, 168, 1, 64), "go2rtc:front_door");
        let mut names = IpTable::new();
        names.insert("front_door", Ipv4Addr::new(192, 168, 1, 99), "Front Door");

        let resolver = CameraResolver::new(&config, &frigate, &names);
        let found = resolver.resolve(&camera("Front Door"), &[]).unwrap();
        assert_eq!(found.source, IpSource::FrigateApi);
        assert_eq!(found.ip, Ipv4Addr::new(192, 168, 1, 64));
    }

    #[test]
    fn name_table_before_device_name() {
        let config = MergerConfig::default();
        let frigate = IpTable::new();
        let mut names = IpTable::new();
        names.insert("porch_10.0.0.3", Ipv4Addr::new(10, 0, 0, 4), "Porch");

        let resolver = CameraResolver::new(&config, &frigate, &names);
        let found = resolver.resolve(&camera("Porch 10.0.0.3"), &[]).unwrap();
        assert_eq!(found.source, IpSource::NameMatch);
        assert_eq!(found.ip, Ipv4Addr::new(10, 0, 0, 4));

        let empty = IpTable::new();
        let resolver = CameraResolver::new(&config, &frigate, &empty);
        let found = resolver.resolve(&camera("Porch 10.0.0.3"), &[]).unwrap();
        assert_eq!(found.source, IpSource::DeviceName);
        assert_eq!(found.ip, Ipv4Addr::new(10, 0, 0, 3));
    }

    #[test]
    fn stream_url_fallback_can_be_disabled() {
        let mut config = MergerConfig::default();
        let empty = IpTable::new();
        let entities = [EntityRecord::camera("camera.side", "cam")
            .with_stream_source("rtsp://admin:pw@192.168.1.70:554/live")];

        let resolver = CameraResolver::new(&config, &empty, &empty);
        let found = resolver.resolve(&camera("Side"), &entities).unwrap();
        assert_eq!(found.source, IpSource::StreamUrl);
        assert_eq!(found.matched, "camera.side");

        config.stream_url_fallback = false;
        let resolver = CameraResolver::new(&config, &empty, &empty);
        assert!(resolver.resolve(&camera("Side"), &entities).is_none());
    }

    #[test]
    fn public_stream_host_is_discarded() {
        let config = MergerConfig::default();
        let empty = IpTable::new();
        let entities =
            [EntityRecord::camera("camera.x", "cam").with_stream_source("rtsp://u:p@8.8.4.4/live")];
        let resolver = CameraResolver::new(&config, &empty, &empty);
        assert!(resolver.resolve(&camera("Public 1.2.3.4"), &entities).is_none());
    }

    #[test]
    fn ip_source_display() {
        assert_eq!(IpSource::FrigateApi.to_string(), "frigate_api");
        assert_eq!("stream_url".parse::<IpSource>().unwrap(), IpSource::StreamUrl);
    }
}
