//! Home Assistant `.storage` directory access.
//!
//! Reads and atomically rewrites the JSON documents the host persists its
//! registries in. Only safe while Home Assistant is stopped, since the host
//! keeps these documents in memory and rewrites them on its own schedule.

pub mod models;

use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::error::Error;

pub use models::{
    CONFIG_ENTRIES_KEY, ConfigEntriesData, DEVICE_REGISTRY_KEY, DeviceRegistryData,
    ENTITY_REGISTRY_KEY, EntityRegistryData, RESTORE_STATE_KEY, RestoredEntityState,
    RestoredStateEntry, StorageFile, StoredConfigEntry, StoredDevice, StoredEntity,
};

/// A Home Assistant `.storage` directory.
#[derive(Debug, Clone)]
pub struct StorageDir {
    root: PathBuf,
}

impl StorageDir {
    /// Point at a `.storage` directory, or at a config directory containing one.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let root = if path.file_name().is_some_and(|name| name == ".storage") {
            path
        } else if path.join(".storage").is_dir() {
            path.join(".storage")
        } else {
            path
        };
        Self { root }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Absolute path of the document stored under `key`.
    pub fn path_of(&self, key: &str) -> PathBuf {
        self.root.join(key)
    }

    /// Read and decode a storage document.
    pub fn read<T: DeserializeOwned>(&self, key: &str) -> Result<StorageFile<T>, Error> {
        let path = self.path_of(key);
        debug!(path = %path.display(), "reading storage document");

        let body = fs::read_to_string(&path).map_err(|source| Error::StorageIo {
            path: path.clone(),
            source,
        })?;

        serde_json::from_str(&body).map_err(|e| Error::StorageFormat {
            path,
            message: e.to_string(),
        })
    }

    /// Read a storage document that may legitimately be absent.
    pub fn read_optional<T: DeserializeOwned>(
        &self,
        key: &str,
    ) -> Result<Option<StorageFile<T>>, Error> {
        match self.read(key) {
            Ok(file) => Ok(Some(file)),
            Err(e) if e.is_not_found() => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Encode and atomically replace a storage document.
    ///
    /// Writes to a sibling temp file first, then renames over the target so a
    /// crash never leaves a half-written registry behind.
    pub fn write<T: Serialize>(&self, key: &str, file: &StorageFile<T>) -> Result<(), Error> {
        let path = self.path_of(key);
        let tmp = self.path_of(&format!("{key}.camlink-tmp"));
        debug!(path = %path.display(), "writing storage document");

        let body = serde_json::to_string_pretty(file).map_err(|e| Error::StorageFormat {
            path: path.clone(),
            message: e.to_string(),
        })?;

        fs::write(&tmp, body).map_err(|source| Error::StorageIo {
            path: tmp.clone(),
            source,
        })?;
        fs::rename(&tmp, &path).map_err(|source| Error::StorageIo { path, source })
    }
}
