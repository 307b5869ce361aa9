#![allow(clippy::unwrap_used)]
// `StorageRegistry` against a temporary Home Assistant `.storage` tree.

use std::fs;
use std::path::Path;
use std::sync::Arc;

use serde_json::{Value, json};

use camlink_core::{
    DeviceRegistry, DeviceUpdate, MacAddress, Merger, MergerConfig, OutcomeKind, RegistryError,
    StorageRegistry,
};

fn write_json(dir: &Path, name: &str, value: &Value) {
    fs::write(dir.join(name), serde_json::to_string_pretty(value).unwrap()).unwrap();
}

fn read_json(dir: &Path, name: &str) -> Value {
    serde_json::from_str(&fs::read_to_string(dir.join(name)).unwrap()).unwrap()
}

/// A config dir with `.storage` holding one Frigate camera and one Reolink device.
fn seed() -> tempfile::TempDir {
    let tmp = tempfile::tempdir().unwrap();
    let storage = tmp.path().join(".storage");
    fs::create_dir(&storage).unwrap();

    write_json(
        &storage,
        "core.device_registry",
        &json!({
            "version": 1,
            "minor_version": 8,
            "key": "core.device_registry",
            "data": {
                "devices": [
                    {
                        "id": "frigate_cam",
                        "name": "Front Door",
                        "name_by_user": null,
                        "manufacturer": "Frigate",
                        "config_entries": ["fe"],
                        "connections": [],
                        "identifiers": [["frigate", "fe:front_door"]],
                        "area_id": "porch"
                    },
                    {
                        "id": "reolink_cam",
                        "name": "Front Door",
                        "manufacturer": "Reolink",
                        "config_entries": ["re"],
                        "connections": [],
                        "identifiers": [["reolink", "95270000ABCD"], ["mac", "EC:71:DB:00:00:01"]],
                        "sw_version": "v3.1"
                    }
                ],
                "deleted_devices": []
            }
        }),
    );
    write_json(
        &storage,
        "core.config_entries",
        &json!({
            "version": 1,
            "key": "core.config_entries",
            "data": { "entries": [
                { "entry_id": "fe", "domain": "frigate", "title": "Frigate", "data": { "url": "http://frigate:5000" } },
                { "entry_id": "re", "domain": "reolink", "title": "Front Door", "data": { "host": "192.168.1.120", "port": 443 } }
            ]}
        }),
    );
    write_json(
        &storage,
        "core.entity_registry",
        &json!({
            "version": 1,
            "key": "core.entity_registry",
            "data": { "entities": [
                { "entity_id": "camera.front_door", "device_id": "frigate_cam", "platform": "frigate" }
            ]}
        }),
    );
    write_json(
        &storage,
        "core.restore_state",
        &json!({
            "version": 1,
            "key": "core.restore_state",
            "data": [
                { "state": { "entity_id": "camera.front_door", "state": "idle",
                             "attributes": { "entity_picture": "/api/camera_proxy/camera.front_door" } },
                  "last_seen": "2026-01-01T00:00:00+00:00" }
            ]
        }),
    );
    tmp
}

#[test]
fn reads_all_documents() {
    let tmp = seed();
    let registry = StorageRegistry::open(tmp.path()).unwrap();

    let devices = registry.devices().unwrap();
    assert_eq!(devices.len(), 2);
    assert_eq!(devices[1].mac(), Some(MacAddress::new("ec:71:db:00:00:01")));

    let entities = registry.entities().unwrap();
    assert_eq!(entities[0].domain, "camera");
    assert_eq!(
        entities[0].stream_source.as_deref(),
        Some("/api/camera_proxy/camera.front_door")
    );

    let entry = registry.config_entry("re").unwrap().unwrap();
    assert_eq!(entry.str_field("host"), Some("192.168.1.120"));
}

#[test]
fn missing_device_registry_fails_to_open() {
    let tmp = tempfile::tempdir().unwrap();
    assert!(matches!(
        StorageRegistry::open(tmp.path()),
        Err(RegistryError::Storage(_))
    ));
}

#[test]
fn update_preserves_unknown_fields_and_order() {
    let tmp = seed();
    let registry = StorageRegistry::open(tmp.path()).unwrap();
    let device = registry
        .devices()
        .unwrap()
        .into_iter()
        .find(|d| d.id == "frigate_cam")
        .unwrap();

    let mut update = DeviceUpdate {
        identifiers: device.identifiers.clone(),
        connections: device.connections.clone(),
    };
    update.identifiers.insert(("mac".into(), "ec:71:db:00:00:01".into()));
    update.connections.insert(("mac".into(), "ec:71:db:00:00:01".into()));
    registry.update_device("frigate_cam", update).unwrap();

    let doc = read_json(&tmp.path().join(".storage"), "core.device_registry");
    let stored = &doc["data"]["devices"][0];
    assert_eq!(stored["area_id"], "porch");
    assert_eq!(stored["identifiers"][0], json!(["frigate", "fe:front_door"]));
    assert_eq!(stored["identifiers"][1], json!(["mac", "ec:71:db:00:00:01"]));
    assert_eq!(stored["connections"], json!([["mac", "ec:71:db:00:00:01"]]));
    assert_eq!(doc["data"]["devices"][1]["sw_version"], "v3.1");
    assert_eq!(doc["data"]["deleted_devices"], json!([]));
    assert_eq!(doc["minor_version"], 8);
}

#[test]
fn duplicate_connection_is_rejected() {
    let tmp = seed();
    let registry = StorageRegistry::open(tmp.path()).unwrap();
    let mut reolink = registry
        .devices()
        .unwrap()
        .into_iter()
        .find(|d| d.id == "reolink_cam")
        .unwrap();
    reolink.connections.insert(("mac".into(), "EC:71:DB:00:00:01".into()));
    registry
        .update_device(
            "reolink_cam",
            DeviceUpdate {
                identifiers: reolink.identifiers.clone(),
                connections: reolink.connections.clone(),
            },
        )
        .unwrap();

    let camera = registry
        .devices()
        .unwrap()
        .into_iter()
        .find(|d| d.id == "frigate_cam")
        .unwrap();
    let mut connections = camera.connections.clone();
    connections.insert(("mac".into(), "ec:71:db:00:00:01".into()));
    let err = registry
        .update_device(
            "frigate_cam",
            DeviceUpdate {
                identifiers: camera.identifiers,
                connections,
            },
        )
        .unwrap_err();
    assert!(err.is_collision());
}

#[tokio::test]
async fn merger_links_camera_in_storage() {
    let tmp = seed();
    let registry: Arc<dyn DeviceRegistry> = Arc::new(StorageRegistry::open(tmp.path()).unwrap());
    let mut config = MergerConfig::default();
    config.frigate.enabled = false;
    let merger = Merger::new(config, Arc::clone(&registry));

    let report = merger.run().await.unwrap();
    assert_eq!(report.count(OutcomeKind::Linked), 1);

    let again = merger.run().await.unwrap();
    assert_eq!(again.count(OutcomeKind::AlreadyLinked), 1);

    let doc = read_json(&tmp.path().join(".storage"), "core.device_registry");
    assert_eq!(
        doc["data"]["devices"][0]["connections"],
        json!([["mac", "ec:71:db:00:00:01"]])
    );
}
