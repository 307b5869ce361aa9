// ── Per-run lookup tables ──
//
// Built fresh on every run and dropped at the end of it. Nothing here
// survives between runs; the registry is the only persistent state.

use std::collections::{BTreeMap, BTreeSet};
use std::net::Ipv4Addr;

use indexmap::IndexMap;
use serde::Serialize;
use tracing::{debug, warn};

use crate::model::MacAddress;

// ── IP → MAC ─────────────────────────────────────────────────────

/// A MAC claim from one non-target device.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MacClaim {
    pub mac: MacAddress,
    pub device_id: String,
    pub device_name: String,
}

/// `IPv4 → MAC` table with conflict poisoning.
///
/// Two devices reporting different MACs for one IP make that IP unusable
/// for the rest of the run. Repeating the same MAC is not a conflict.
#[derive(Debug, Default, Clone, Serialize)]
pub struct MacTable {
    entries: BTreeMap<Ipv4Addr, MacClaim>,
    poisoned: BTreeSet<Ipv4Addr>,
}

impl MacTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a claim. Returns `false` when the IP is (or becomes) poisoned.
    pub fn insert(&mut self, ip: Ipv4Addr, claim: MacClaim) -> bool {
        if self.poisoned.contains(&ip) {
            warn!(
                %ip,
                mac = %claim.mac,
                device = %claim.device_name,
                "IP already has conflicting MAC claims, ignoring another"
            );
            return false;
        }

        match self.entries.get(&ip) {
            Some(existing) if existing.mac == claim.mac => {
                debug!(%ip, mac = %claim.mac, device = %claim.device_name, "duplicate MAC claim for IP");
                true
            }
            Some(existing) => {
                warn!(
                    %ip,
                    first_mac = %existing.mac,
                    first_device = %existing.device_name,
                    second_mac = %claim.mac,
                    second_device = %claim.device_name,
                    "conflicting MAC addresses for one IP, dropping it from this run"
                );
                self.entries.remove(&ip);
                self.poisoned.insert(ip);
                false
            }
            None => {
                self.entries.insert(ip, claim);
                true
            }
        }
    }

    pub fn get(&self, ip: Ipv4Addr) -> Option<&MacClaim> {
        self.entries.get(&ip)
    }

    pub fn is_poisoned(&self, ip: Ipv4Addr) -> bool {
        self.poisoned.contains(&ip)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Ipv4Addr, &MacClaim)> {
        self.entries.iter().map(|(ip, claim)| (*ip, claim))
    }

    pub fn poisoned(&self) -> impl Iterator<Item = Ipv4Addr> + '_ {
        self.poisoned.iter().copied()
    }
}

// ── Key → IP ─────────────────────────────────────────────────────

/// Where an address-table entry came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IpEntry {
    pub ip: Ipv4Addr,
    /// Device name or Frigate stream the address was read from.
    pub source: String,
}

/// `key → IPv4` table where the first writer wins.
///
/// Used for the name table (normalized device names) and for the Frigate
/// camera map (lower-cased camera ids).
#[derive(Debug, Default, Clone, Serialize)]
#[serde(transparent)]
pub struct IpTable {
    entries: IndexMap<String, IpEntry>,
}

impl IpTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert unless `key` is already taken. Returns whether the entry was stored.
    pub fn insert(&mut self, key: impl Into<String>, ip: Ipv4Addr, source: &str) -> bool {
        let key = key.into();
        if let Some(existing) = self.entries.get(&key) {
            if existing.ip != ip {
                debug!(
                    key = %key,
                    kept = %existing.ip,
                    dropped = %ip,
                    source,
                    "address table conflict, keeping first entry"
                );
            }
            return false;
        }
        self.entries.insert(
            key,
            IpEntry {
                ip,
                source: source.to_owned(),
            },
        );
        true
    }

    pub fn get(&self, key: &str) -> Option<&IpEntry> {
        self.entries.get(key)
    }

    /// First hit among `keys`, with the key that matched.
    pub fn find<'a, I>(&self, keys: I) -> Option<(&'a str, &IpEntry)>
    where
        I: IntoIterator<Item = &'a str>,
    {
        keys.into_iter()
            .find_map(|key| self.entries.get(key).map(|entry| (key, entry)))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &IpEntry)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn claim(mac: &str, device: &str) -> MacClaim {
        MacClaim {
            mac: MacAddress::new(mac),
            device_id: device.to_owned(),
            device_name: device.to_owned(),
        }
    }

    const IP: Ipv4Addr = Ipv4Addr::new(192, 168, 1, 10);

    #[test]
    fn different_macs_poison_the_ip() {
        let mut table = MacTable::new();
        assert!(table.insert(IP, claim("aa:aa:aa:aa:aa:aa", "hik")));
        assert!(!table.insert(IP, claim("bb:bb:bb:bb:bb:bb", "router")));
        assert!(table.get(IP).is_none());
        assert!(table.is_poisoned(IP));

        // A third claim, even matching the first, stays out.
        assert!(!table.insert(IP, claim("aa:aa:aa:aa:aa:aa", "onvif")));
        assert!(table.is_empty());
    }

    #[test]
    fn same_mac_twice_is_not_a_conflict() {
        let mut table = MacTable::new();
        table.insert(IP, claim("AA:AA:AA:AA:AA:AA", "hik"));
        assert!(table.insert(IP, claim("aa-aa-aa-aa-aa-aa", "router")));
        assert_eq!(table.get(IP).map(|c| c.device_id.as_str()), Some("hik"));
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn ip_table_first_writer_wins() {
        let mut table = IpTable::new();
        assert!(table.insert("front_door", Ipv4Addr::new(10, 0, 0, 1), "a"));
        assert!(!table.insert("front_door", Ipv4Addr::new(10, 0, 0, 2), "b"));
        assert_eq!(table.get("front_door").map(|e| e.ip), Some(Ipv4Addr::new(10, 0, 0, 1)));
    }

    #[test]
    fn find_reports_matching_key() {
        let mut table = IpTable::new();
        table.insert("front_door", Ipv4Addr::new(10, 0, 0, 1), "a");
        let (key, entry) = table.find(["front_door_camera", "front_door"]).unwrap();
        assert_eq!(key, "front_door");
        assert_eq!(entry.source, "a");
    }
}
