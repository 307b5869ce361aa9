// ── Storage-file registry ──
//
// Backs the registry contract with Home Assistant's `.storage` JSON
// documents. Every read goes to disk so consecutive runs observe each
// other's writes; updates rewrite `core.device_registry` atomically and
// keep the original pair order plus every field camlink does not model.

use std::collections::{BTreeSet, HashMap};
use std::path::PathBuf;
use std::sync::{Mutex, PoisonError};

use camlink_api::storage::{
    CONFIG_ENTRIES_KEY, ConfigEntriesData, DEVICE_REGISTRY_KEY, DeviceRegistryData,
    ENTITY_REGISTRY_KEY, EntityRegistryData, RESTORE_STATE_KEY, RestoredStateEntry,
    StoredConfigEntry, StoredDevice, StoredEntity,
};
use camlink_api::StorageDir;
use tracing::{debug, info};

use super::{DeviceRegistry, DeviceUpdate, RegistryError, find_connection_owner};
use crate::model::{ConfigEntryRecord, DeviceRecord, EntityRecord, RegistryPair};

/// Attributes that may carry a camera's stream URL in restored state.
const STREAM_ATTRIBUTES: [&str; 2] = ["stream_source", "entity_picture"];

/// Registry backed by a Home Assistant `.storage` directory.
pub struct StorageRegistry {
    dir: StorageDir,
    write_lock: Mutex<()>,
}

impl StorageRegistry {
    /// Open a `.storage` directory (or the config directory holding one).
    ///
    /// Fails early when the device registry document is missing or malformed.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, RegistryError> {
        let dir = StorageDir::new(path);
        dir.read::<DeviceRegistryData>(DEVICE_REGISTRY_KEY)?;
        debug!(root = %dir.root().display(), "opened storage registry");
        Ok(Self {
            dir,
            write_lock: Mutex::new(()),
        })
    }

    pub fn storage(&self) -> &StorageDir {
        &self.dir
    }

    /// Map of entity id -> stream URL from `core.restore_state`, if present.
    fn stream_sources(&self) -> Result<HashMap<String, String>, RegistryError> {
        let Some(file) = self.dir.read_optional::<Vec<RestoredStateEntry>>(RESTORE_STATE_KEY)?
        else {
            return Ok(HashMap::new());
        };

        Ok(file
            .data
            .into_iter()
            .filter_map(|entry| {
                let source = STREAM_ATTRIBUTES.iter().find_map(|attr| {
                    entry
                        .state
                        .attributes
                        .get(*attr)
                        .and_then(serde_json::Value::as_str)
                        .map(str::to_owned)
                })?;
                Some((entry.state.entity_id, source))
            })
            .collect())
    }
}

impl DeviceRegistry for StorageRegistry {
    fn devices(&self) -> Result<Vec<DeviceRecord>, RegistryError> {
        let file = self.dir.read::<DeviceRegistryData>(DEVICE_REGISTRY_KEY)?;
        Ok(file.data.devices.iter().map(device_from_stored).collect())
    }

    fn entities(&self) -> Result<Vec<EntityRecord>, RegistryError> {
        let Some(file) = self.dir.read_optional::<EntityRegistryData>(ENTITY_REGISTRY_KEY)? else {
            return Ok(Vec::new());
        };
        let mut sources = self.stream_sources()?;
        Ok(file
            .data
            .entities
            .iter()
            .map(|entity| entity_from_stored(entity, sources.remove(&entity.entity_id)))
            .collect())
    }

    fn config_entries(&self) -> Result<Vec<ConfigEntryRecord>, RegistryError> {
        let Some(file) = self.dir.read_optional::<ConfigEntriesData>(CONFIG_ENTRIES_KEY)? else {
            return Ok(Vec::new());
        };
        Ok(file.data.entries.iter().map(entry_from_stored).collect())
    }

    fn update_device(&self, id: &str, update: DeviceUpdate) -> Result<DeviceRecord, RegistryError> {
        let _guard = self
            .write_lock
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        let mut file = self.dir.read::<DeviceRegistryData>(DEVICE_REGISTRY_KEY)?;
        let records: Vec<DeviceRecord> = file.data.devices.iter().map(device_from_stored).collect();
        if let Some(err) = find_connection_owner(&records, id, &update.connections) {
            return Err(err);
        }

        let stored = file
            .data
            .devices
            .iter_mut()
            .find(|d| d.id == id)
            .ok_or_else(|| RegistryError::DeviceNotFound { id: id.to_owned() })?;
        stored.identifiers = merge_pairs(&stored.identifiers, &update.identifiers);
        stored.connections = merge_pairs(&stored.connections, &update.connections);
        let updated = device_from_stored(stored);

        self.dir.write(DEVICE_REGISTRY_KEY, &file)?;
        info!(device = id, "device registry document rewritten");
        Ok(updated)
    }
}

/// Keep existing pairs that survive in `wanted` (in their stored order),
/// then append the new ones.
fn merge_pairs(existing: &[(String, String)], wanted: &BTreeSet<RegistryPair>) -> Vec<(String, String)> {
    let mut merged: Vec<(String, String)> = existing
        .iter()
        .filter(|pair| wanted.contains(*pair))
        .cloned()
        .collect();
    for pair in wanted {
        if !merged.contains(pair) {
            merged.push(pair.clone());
        }
    }
    merged
}

fn device_from_stored(device: &StoredDevice) -> DeviceRecord {
    DeviceRecord {
        id: device.id.clone(),
        name: device.name.clone(),
        name_by_user: device.name_by_user.clone(),
        manufacturer: device.manufacturer.clone(),
        connections: device.connections.iter().cloned().collect(),
        identifiers: device.identifiers.iter().cloned().collect(),
        config_entries: device.config_entries.clone(),
    }
}

fn entity_from_stored(entity: &StoredEntity, stream_source: Option<String>) -> EntityRecord {
    EntityRecord {
        entity_id: entity.entity_id.clone(),
        device_id: entity.device_id.clone(),
        domain: entity.domain().to_owned(),
        platform: entity.platform.clone(),
        stream_source,
    }
}

fn entry_from_stored(entry: &StoredConfigEntry) -> ConfigEntryRecord {
    ConfigEntryRecord {
        id: entry.entry_id.clone(),
        domain: entry.domain.clone(),
        title: entry.title.clone(),
        data: entry.data.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn merge_keeps_order_and_appends() {
        let existing = vec![
            ("frigate".to_owned(), "e1:front".to_owned()),
            ("other".to_owned(), "x".to_owned()),
        ];
        let mut wanted: BTreeSet<RegistryPair> = existing.iter().cloned().collect();
        wanted.insert(("mac".into(), "aa:bb:cc:dd:ee:ff".into()));

        let merged = merge_pairs(&existing, &wanted);
        assert_eq!(merged.len(), 3);
        assert_eq!(merged[0].0, "frigate");
        assert_eq!(merged[1].0, "other");
        assert_eq!(merged[2], ("mac".into(), "aa:bb:cc:dd:ee:ff".into()));
    }
}
