// ── Registry record types ──
//
// Host-agnostic views of the device registry, entity registry and
// config entries. Registry implementations convert their storage
// format into these before the resolver sees anything.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::mac::MacAddress;

/// Connection kind the host uses for network MAC addresses.
pub const CONNECTION_NETWORK_MAC: &str = "mac";

/// Identifier domain camlink writes MAC addresses under.
pub const MAC_IDENTIFIER_DOMAIN: &str = "mac";

/// A `(kind, value)` pair: connection kind or identifier domain plus value.
pub type RegistryPair = (String, String);

/// One device in the host's device registry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceRecord {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub name_by_user: Option<String>,
    #[serde(default)]
    pub manufacturer: Option<String>,
    #[serde(default)]
    pub connections: BTreeSet<RegistryPair>,
    #[serde(default)]
    pub identifiers: BTreeSet<RegistryPair>,
    #[serde(default)]
    pub config_entries: Vec<String>,
}

impl DeviceRecord {
    /// Minimal record, mostly for tests and fixtures.
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: Some(name.into()),
            name_by_user: None,
            manufacturer: None,
            connections: BTreeSet::new(),
            identifiers: BTreeSet::new(),
            config_entries: Vec::new(),
        }
    }

    pub fn with_connection(mut self, kind: &str, value: &str) -> Self {
        self.connections.insert((kind.to_owned(), value.to_owned()));
        self
    }

    pub fn with_identifier(mut self, domain: &str, value: &str) -> Self {
        self.identifiers.insert((domain.to_owned(), value.to_owned()));
        self
    }

    pub fn with_config_entry(mut self, entry_id: &str) -> Self {
        self.config_entries.push(entry_id.to_owned());
        self
    }

    /// The integration-provided name, falling back to the user-assigned one.
    pub fn display_name(&self) -> &str {
        self.name
            .as_deref()
            .or(self.name_by_user.as_deref())
            .unwrap_or("")
    }

    /// Whether any identifier lives in `domain`.
    pub fn has_identifier_domain(&self, domain: &str) -> bool {
        self.identifiers.iter().any(|(d, _)| d == domain)
    }

    /// Identifier values registered under `domain`.
    pub fn identifier_values<'a>(&'a self, domain: &'a str) -> impl Iterator<Item = &'a str> {
        self.identifiers
            .iter()
            .filter(move |(d, _)| d == domain)
            .map(|(_, v)| v.as_str())
    }

    /// MAC addresses attached as network connections.
    pub fn mac_connections(&self) -> impl Iterator<Item = MacAddress> + '_ {
        self.connections
            .iter()
            .filter(|(kind, _)| kind == CONNECTION_NETWORK_MAC)
            .map(|(_, value)| MacAddress::new(value))
    }

    /// The device's MAC: first MAC connection, else first `mac` identifier.
    pub fn mac(&self) -> Option<MacAddress> {
        self.mac_connections().next().or_else(|| {
            self.identifier_values(MAC_IDENTIFIER_DOMAIN)
                .next()
                .map(MacAddress::new)
        })
    }

    /// Whether `mac` is already one of this device's connections.
    pub fn has_mac_connection(&self, mac: &MacAddress) -> bool {
        self.mac_connections().any(|m| &m == mac)
    }
}

/// One config entry (integration instance) with its stored data bag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfigEntryRecord {
    pub id: String,
    pub domain: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub data: Map<String, Value>,
}

impl ConfigEntryRecord {
    pub fn new(id: impl Into<String>, domain: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            domain: domain.into(),
            title: None,
            data: Map::new(),
        }
    }

    pub fn with_data(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.data.insert(key.to_owned(), value.into());
        self
    }

    /// A string field from the data bag.
    pub fn str_field(&self, key: &str) -> Option<&str> {
        self.data.get(key).and_then(Value::as_str)
    }
}

/// One entity in the host's entity registry, with its observable stream source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityRecord {
    pub entity_id: String,
    #[serde(default)]
    pub device_id: Option<String>,
    pub domain: String,
    #[serde(default)]
    pub platform: String,
    /// `stream_source` (or `entity_picture`) attribute when the host exposes it.
    #[serde(default)]
    pub stream_source: Option<String>,
}

impl EntityRecord {
    pub fn camera(entity_id: impl Into<String>, device_id: impl Into<String>) -> Self {
        Self {
            entity_id: entity_id.into(),
            device_id: Some(device_id.into()),
            domain: "camera".into(),
            platform: String::new(),
            stream_source: None,
        }
    }

    pub fn with_stream_source(mut self, source: &str) -> Self {
        self.stream_source = Some(source.to_owned());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mac_prefers_connections_over_identifiers() {
        let device = DeviceRecord::new("d1", "Cam")
            .with_identifier("mac", "11:11:11:11:11:11")
            .with_connection("mac", "AA:BB:CC:DD:EE:FF");
        assert_eq!(device.mac(), Some(MacAddress::new("aa:bb:cc:dd:ee:ff")));
    }

    #[test]
    fn mac_falls_back_to_identifier() {
        let device = DeviceRecord::new("d1", "Cam")
            .with_connection("zigbee", "00:11")
            .with_identifier("mac", "11-22-33-44-55-66");
        assert_eq!(device.mac(), Some(MacAddress::new("11:22:33:44:55:66")));
    }

    #[test]
    fn no_mac_at_all() {
        let device = DeviceRecord::new("d1", "Cam").with_identifier("hikvision", "serial");
        assert!(device.mac().is_none());
    }

    #[test]
    fn has_mac_connection_is_case_insensitive() {
        let device = DeviceRecord::new("d1", "Cam").with_connection("mac", "AA:BB:CC:DD:EE:FF");
        assert!(device.has_mac_connection(&MacAddress::new("aa:bb:cc:dd:ee:ff")));
    }

    #[test]
    fn display_name_falls_back_to_user_name() {
        let mut device = DeviceRecord::new("d1", "x");
        device.name = None;
        device.name_by_user = Some("Porch".into());
        assert_eq!(device.display_name(), "Porch");
    }

    #[test]
    fn str_field_ignores_non_strings() {
        let entry = ConfigEntryRecord::new("e1", "reolink")
            .with_data("host", "192.168.1.30")
            .with_data("port", 443);
        assert_eq!(entry.str_field("host"), Some("192.168.1.30"));
        assert_eq!(entry.str_field("port"), None);
    }
}
