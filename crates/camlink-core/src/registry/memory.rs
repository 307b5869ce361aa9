// ── In-memory registry ──
//
// Lock-free reads via an `ArcSwap` snapshot; writes are serialized by a
// small mutex and publish a fresh snapshot. Enforces the host's
// duplicate-connection rule so the correlator sees the same rejections
// it would get from the real registry.

use std::sync::{Arc, Mutex, PoisonError};

use arc_swap::ArcSwap;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use super::{DeviceRegistry, DeviceUpdate, RegistryError, find_connection_owner};
use crate::model::{ConfigEntryRecord, DeviceRecord, EntityRecord};

/// Serializable registry contents, also usable as a JSON fixture.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RegistryContents {
    #[serde(default)]
    pub devices: Vec<DeviceRecord>,
    #[serde(default)]
    pub entities: Vec<EntityRecord>,
    #[serde(default)]
    pub config_entries: Vec<ConfigEntryRecord>,
}

#[derive(Debug, Default)]
struct State {
    devices: IndexMap<String, DeviceRecord>,
    entities: Vec<EntityRecord>,
    config_entries: Vec<ConfigEntryRecord>,
    writes: u64,
}

/// A registry held entirely in memory.
pub struct MemoryRegistry {
    state: ArcSwap<State>,
    write_lock: Mutex<()>,
}

impl MemoryRegistry {
    pub fn new(contents: RegistryContents) -> Self {
        let state = State {
            devices: contents
                .devices
                .into_iter()
                .map(|d| (d.id.clone(), d))
                .collect(),
            entities: contents.entities,
            config_entries: contents.config_entries,
            writes: 0,
        };
        Self {
            state: ArcSwap::from_pointee(state),
            write_lock: Mutex::new(()),
        }
    }

    /// Load a registry from a [`RegistryContents`] JSON document.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str::<RegistryContents>(json).map(Self::new)
    }

    /// Start an empty registry and add records fluently.
    pub fn builder() -> MemoryRegistryBuilder {
        MemoryRegistryBuilder::default()
    }

    /// Number of successful `update_device` calls so far.
    pub fn write_count(&self) -> u64 {
        self.state.load().writes
    }

    /// Look up a device by id.
    pub fn device(&self, id: &str) -> Option<DeviceRecord> {
        self.state.load().devices.get(id).cloned()
    }

    /// Snapshot the full contents.
    pub fn contents(&self) -> RegistryContents {
        let state = self.state.load();
        RegistryContents {
            devices: state.devices.values().cloned().collect(),
            entities: state.entities.clone(),
            config_entries: state.config_entries.clone(),
        }
    }
}

impl DeviceRegistry for MemoryRegistry {
    fn devices(&self) -> Result<Vec<DeviceRecord>, RegistryError> {
        Ok(self.state.load().devices.values().cloned().collect())
    }

    fn entities(&self) -> Result<Vec<EntityRecord>, RegistryError> {
        Ok(self.state.load().entities.clone())
    }

    fn config_entries(&self) -> Result<Vec<ConfigEntryRecord>, RegistryError> {
        Ok(self.state.load().config_entries.clone())
    }

    fn update_device(&self, id: &str, update: DeviceUpdate) -> Result<DeviceRecord, RegistryError> {
        let _guard = self
            .write_lock
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        let current = self.state.load_full();

        if !current.devices.contains_key(id) {
            return Err(RegistryError::DeviceNotFound { id: id.to_owned() });
        }
        if let Some(err) = find_connection_owner(current.devices.values(), id, &update.connections)
        {
            return Err(err);
        }

        let mut devices = current.devices.clone();
        let updated = devices.get_mut(id).map(|device| {
            device.identifiers = update.identifiers;
            device.connections = update.connections;
            device.clone()
        });
        let updated = updated.ok_or_else(|| RegistryError::DeviceNotFound { id: id.to_owned() })?;

        self.state.store(Arc::new(State {
            devices,
            entities: current.entities.clone(),
            config_entries: current.config_entries.clone(),
            writes: current.writes + 1,
        }));
        Ok(updated)
    }
}

/// Fluent constructor for [`MemoryRegistry`].
#[derive(Debug, Default)]
pub struct MemoryRegistryBuilder {
    contents: RegistryContents,
}

impl MemoryRegistryBuilder {
    pub fn device(mut self, device: DeviceRecord) -> Self {
        self.contents.devices.push(device);
        self
    }

    pub fn entity(mut self, entity: EntityRecord) -> Self {
        self.contents.entities.push(entity);
        self
    }

    pub fn config_entry(mut self, entry: ConfigEntryRecord) -> Self {
        self.contents.config_entries.push(entry);
        self
    }

    pub fn build(self) -> MemoryRegistry {
        MemoryRegistry::new(self.contents)
    }
}
