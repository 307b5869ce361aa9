// ── Registry scan ──
//
// One pass over the registry, split into the two inventories the rest
// of the pipeline works on: target cameras and candidate MAC sources.

use std::collections::HashMap;

use indexmap::IndexMap;
use tracing::debug;

use crate::config::MergerConfig;
use crate::model::{ConfigEntryRecord, DeviceRecord, EntityRecord, MacAddress};
use crate::registry::{DeviceRegistry, RegistryError};

/// Snapshot of the registry taken at the start of a run.
#[derive(Debug, Default, Clone)]
pub struct Inventory {
    /// Devices carrying an identifier in the target domain.
    pub targets: Vec<DeviceRecord>,
    /// Every other device.
    pub sources: Vec<DeviceRecord>,
    /// Camera-domain entities keyed by owning device id.
    pub cameras_by_device: HashMap<String, Vec<EntityRecord>>,
    pub config_entries: IndexMap<String, ConfigEntryRecord>,
}

impl Inventory {
    /// Read devices, entities and config entries and partition them.
    pub fn scan(registry: &dyn DeviceRegistry, config: &MergerConfig) -> Result<Self, RegistryError> {
        let mut inventory = Self::default();

        for device in registry.devices()? {
            if device.has_identifier_domain(&config.target_domain) {
                inventory.targets.push(device);
            } else {
                inventory.sources.push(device);
            }
        }

        for entity in registry.entities()? {
            if entity.domain != "camera" {
                continue;
            }
            if let Some(device_id) = entity.device_id.clone() {
                inventory
                    .cameras_by_device
                    .entry(device_id)
                    .or_default()
                    .push(entity);
            }
        }

        inventory.config_entries = registry
            .config_entries()?
            .into_iter()
            .map(|entry| (entry.id.clone(), entry))
            .collect();

        debug!(
            targets = inventory.targets.len(),
            sources = inventory.sources.len(),
            config_entries = inventory.config_entries.len(),
            "registry scanned"
        );
        Ok(inventory)
    }

    /// Config entries owning `device`, in the device's order.
    pub fn entries_of<'a>(
        &'a self,
        device: &'a DeviceRecord,
    ) -> impl Iterator<Item = &'a ConfigEntryRecord> + 'a {
        device
            .config_entries
            .iter()
            .filter_map(|id| self.config_entries.get(id))
    }

    /// Camera entities attached to `device_id`.
    pub fn cameras_of(&self, device_id: &str) -> &[EntityRecord] {
        self.cameras_by_device
            .get(device_id)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// MAC → owning device id, for every MAC connection in the registry.
    pub fn mac_owners(&self) -> HashMap<MacAddress, String> {
        let mut owners = HashMap::new();
        for device in self.targets.iter().chain(&self.sources) {
            for mac in device.mac_connections() {
                owners.entry(mac).or_insert_with(|| device.id.clone());
            }
        }
        owners
    }
}
