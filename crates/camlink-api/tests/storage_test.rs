#![allow(clippy::unwrap_used)]
// Integration tests for `StorageDir` against a temporary `.storage` tree.

use std::fs;

use pretty_assertions::assert_eq;
use serde_json::json;

use camlink_api::storage::{
    ConfigEntriesData, DEVICE_REGISTRY_KEY, DeviceRegistryData, StorageDir, StorageFile,
};
use camlink_api::Error;

fn write_json(dir: &std::path::Path, name: &str, value: &serde_json::Value) {
    fs::write(dir.join(name), serde_json::to_string_pretty(value).unwrap()).unwrap();
}

#[test]
fn resolves_storage_subdirectory() {
    let tmp = tempfile::tempdir().unwrap();
    fs::create_dir(tmp.path().join(".storage")).unwrap();

    let storage = StorageDir::new(tmp.path());
    assert_eq!(storage.root(), tmp.path().join(".storage"));
}

#[test]
fn reads_device_registry() {
    let tmp = tempfile::tempdir().unwrap();
    write_json(
        tmp.path(),
        DEVICE_REGISTRY_KEY,
        &json!({
            "version": 1,
            "minor_version": 8,
            "key": "core.device_registry",
            "data": {
                "devices": [{
                    "id": "d1",
                    "name": "Front Door",
                    "config_entries": ["e1"],
                    "connections": [],
                    "identifiers": [["frigate", "e1:front_door"]]
                }],
                "deleted_devices": []
            }
        }),
    );

    let storage = StorageDir::new(tmp.path());
    let file = storage.read::<DeviceRegistryData>(DEVICE_REGISTRY_KEY).unwrap();
    assert_eq!(file.minor_version, Some(8));
    assert_eq!(file.data.devices.len(), 1);
    assert_eq!(file.data.devices[0].identifiers[0].0, "frigate");
    assert!(file.data.extra.contains_key("deleted_devices"));
}

#[test]
fn write_is_atomic_and_preserves_extra_fields() {
    let tmp = tempfile::tempdir().unwrap();
    write_json(
        tmp.path(),
        DEVICE_REGISTRY_KEY,
        &json!({
            "version": 1,
            "key": "core.device_registry",
            "data": {
                "devices": [{
                    "id": "d1",
                    "name": "Front Door",
                    "connections": [],
                    "identifiers": [],
                    "sw_version": "0.14"
                }],
                "deleted_devices": [{ "id": "old" }]
            }
        }),
    );

    let storage = StorageDir::new(tmp.path());
    let mut file = storage.read::<DeviceRegistryData>(DEVICE_REGISTRY_KEY).unwrap();
    file.data.devices[0]
        .connections
        .push(("mac".into(), "aa:bb:cc:dd:ee:ff".into()));
    storage.write(DEVICE_REGISTRY_KEY, &file).unwrap();

    assert!(!tmp.path().join("core.device_registry.camlink-tmp").exists());

    let raw: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(tmp.path().join(DEVICE_REGISTRY_KEY)).unwrap())
            .unwrap();
    assert_eq!(
        raw["data"]["devices"][0]["connections"],
        json!([["mac", "aa:bb:cc:dd:ee:ff"]])
    );
    assert_eq!(raw["data"]["devices"][0]["sw_version"], "0.14");
    assert_eq!(raw["data"]["deleted_devices"], json!([{ "id": "old" }]));
}

#[test]
fn missing_optional_document_is_none() {
    let tmp = tempfile::tempdir().unwrap();
    let storage = StorageDir::new(tmp.path());
    let file = storage
        .read_optional::<ConfigEntriesData>("core.config_entries")
        .unwrap();
    assert!(file.is_none());
}

#[test]
fn malformed_document_is_format_error() {
    let tmp = tempfile::tempdir().unwrap();
    fs::write(tmp.path().join("core.config_entries"), "{ not json").unwrap();

    let storage = StorageDir::new(tmp.path());
    let result: Result<StorageFile<ConfigEntriesData>, _> = storage.read("core.config_entries");
    assert!(matches!(result, Err(Error::StorageFormat { .. })));
}
