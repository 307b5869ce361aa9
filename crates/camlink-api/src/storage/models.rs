// Home Assistant `.storage` document shapes
//
// Each typed struct captures the fields camlink reads and flattens the
// rest into `extra`, so a read-modify-write cycle never drops data the
// host put there.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Storage key of the device registry.
pub const DEVICE_REGISTRY_KEY: &str = "core.device_registry";
/// Storage key of the entity registry.
pub const ENTITY_REGISTRY_KEY: &str = "core.entity_registry";
/// Storage key of the config entries.
pub const CONFIG_ENTRIES_KEY: &str = "core.config_entries";
/// Storage key of the restored entity states.
pub const RESTORE_STATE_KEY: &str = "core.restore_state";

/// The versioned envelope every storage file is wrapped in.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageFile<T> {
    pub version: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub minor_version: Option<u32>,
    pub key: String,
    pub data: T,
}

// ── Device registry ─────────────────────────────────────────────────

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DeviceRegistryData {
    #[serde(default)]
    pub devices: Vec<StoredDevice>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredDevice {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub name_by_user: Option<String>,
    #[serde(default)]
    pub manufacturer: Option<String>,
    #[serde(default)]
    pub config_entries: Vec<String>,
    /// `[["mac", "aa:bb:..."], ...]`
    #[serde(default)]
    pub connections: Vec<(String, String)>,
    /// `[["frigate", "entry:camera"], ...]`
    #[serde(default)]
    pub identifiers: Vec<(String, String)>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

// ── Entity registry ─────────────────────────────────────────────────

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EntityRegistryData {
    #[serde(default)]
    pub entities: Vec<StoredEntity>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredEntity {
    pub entity_id: String,
    #[serde(default)]
    pub device_id: Option<String>,
    #[serde(default)]
    pub platform: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl StoredEntity {
    /// Entity domain, the part of the entity id before the dot.
    pub fn domain(&self) -> &str {
        self.entity_id
            .split_once('.')
            .map_or(self.entity_id.as_str(), |(domain, _)| domain)
    }
}

// ── Config entries ──────────────────────────────────────────────────

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConfigEntriesData {
    #[serde(default)]
    pub entries: Vec<StoredConfigEntry>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredConfigEntry {
    pub entry_id: String,
    pub domain: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub data: Map<String, Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

// ── Restore state ───────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RestoredStateEntry {
    pub state: RestoredEntityState,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RestoredEntityState {
    pub entity_id: String,
    #[serde(default)]
    pub attributes: Map<String, Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}
