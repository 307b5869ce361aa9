// ── Device registry contract ──
//
// The host owns the registry; camlink only enumerates it and asks for
// one kind of write: replace a device's identifier and connection sets
// with a superset. Implementations must reject a connection that is
// already claimed by another device.

mod memory;
mod storage;

use std::collections::BTreeSet;

use thiserror::Error;

use crate::model::{ConfigEntryRecord, DeviceRecord, EntityRecord, RegistryPair};

pub use memory::{MemoryRegistry, MemoryRegistryBuilder, RegistryContents};
pub use storage::StorageRegistry;

/// Errors raised by a registry implementation.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// The connection is already attached to another device.
    #[error("Connection {kind}={value} is already registered to device {existing_device}")]
    DuplicateConnection {
        kind: String,
        value: String,
        existing_device: String,
    },

    #[error("Device not found: {id}")]
    DeviceNotFound { id: String },

    #[error("Registry storage error: {0}")]
    Storage(#[source] camlink_api::Error),
}

impl RegistryError {
    /// Whether this is the duplicate-connection rejection a concurrent writer can cause.
    pub fn is_collision(&self) -> bool {
        matches!(self, Self::DuplicateConnection { .. })
    }
}

impl From<camlink_api::Error> for RegistryError {
    fn from(err: camlink_api::Error) -> Self {
        Self::Storage(err)
    }
}

/// The new identifier and connection sets for one device.
///
/// Always a superset of the device's current sets; the registry replaces
/// both sets in a single update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceUpdate {
    pub identifiers: BTreeSet<RegistryPair>,
    pub connections: BTreeSet<RegistryPair>,
}

/// Read/write access to the host's device, entity and config-entry registries.
pub trait DeviceRegistry: Send + Sync {
    /// Every device, in registry order.
    fn devices(&self) -> Result<Vec<DeviceRecord>, RegistryError>;

    /// Every entity, in registry order.
    fn entities(&self) -> Result<Vec<EntityRecord>, RegistryError>;

    /// Every config entry, in registry order.
    fn config_entries(&self) -> Result<Vec<ConfigEntryRecord>, RegistryError>;

    /// Look up one config entry by id.
    fn config_entry(&self, id: &str) -> Result<Option<ConfigEntryRecord>, RegistryError> {
        Ok(self.config_entries()?.into_iter().find(|e| e.id == id))
    }

    /// Replace a device's identifiers and connections.
    ///
    /// Fails with [`RegistryError::DuplicateConnection`] if any new connection
    /// is already claimed by a different device.
    fn update_device(&self, id: &str, update: DeviceUpdate) -> Result<DeviceRecord, RegistryError>;
}

/// Find a device other than `id` that already holds one of `connections`.
pub(crate) fn find_connection_owner<'a>(
    devices: impl IntoIterator<Item = &'a DeviceRecord>,
    id: &str,
    connections: &BTreeSet<RegistryPair>,
) -> Option<RegistryError> {
    for other in devices {
        if other.id == id {
            continue;
        }
        let claimed = connections.iter().find(|(kind, value)| {
            other
                .connections
                .iter()
                .any(|(k, v)| k == kind && v.eq_ignore_ascii_case(value))
        });
        if let Some((kind, value)) = claimed {
            return Some(RegistryError::DuplicateConnection {
                kind: kind.clone(),
                value: value.clone(),
                existing_device: other.id.clone(),
            });
        }
    }
    None
}
