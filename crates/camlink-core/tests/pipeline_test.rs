#![allow(clippy::unwrap_used)]
// End-to-end pipeline tests: registry scan → tables → correlation.

use std::net::Ipv4Addr;
use std::sync::Arc;

use pretty_assertions::assert_eq;
use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use camlink_core::{
    ConfigEntryRecord, DeviceRecord, EntityRecord, IpSource, MacAddress, MemoryRegistry, Merger,
    MergerConfig, OutcomeKind,
};

// ── Helpers ─────────────────────────────────────────────────────────

fn offline_config() -> MergerConfig {
    let mut config = MergerConfig::default();
    config.frigate.enabled = false;
    config
}

fn merger(registry: &Arc<MemoryRegistry>, config: MergerConfig) -> Merger {
    Merger::new(config, Arc::clone(registry) as Arc<dyn camlink_core::DeviceRegistry>)
}

fn frigate_camera(id: &str, name: &str, camera: &str) -> DeviceRecord {
    DeviceRecord::new(id, name)
        .with_identifier("frigate", &format!("entry1:{camera}"))
        .with_config_entry("frigate_entry")
}

fn mac_source(id: &str, name: &str, mac: &str, entry: &str) -> DeviceRecord {
    DeviceRecord::new(id, name)
        .with_identifier("mac", mac)
        .with_config_entry(entry)
}

// ── Testable properties ─────────────────────────────────────────────

#[tokio::test]
async fn single_source_mac_is_attached() {
    let registry = Arc::new(
        MemoryRegistry::builder()
            .device(frigate_camera("cam", "Driveway", "driveway"))
            .device(mac_source("onvif", "driveway", "AA:BB:CC:00:11:22", "o1"))
            .config_entry(ConfigEntryRecord::new("o1", "onvif").with_data("host", "192.168.10.5"))
            .build(),
    );

    let report = merger(&registry, offline_config()).run().await.unwrap();

    assert_eq!(report.updated(), 1);
    let outcome = &report.outcomes[0];
    assert_eq!(outcome.kind, OutcomeKind::Linked);
    assert_eq!(outcome.ip, Some(Ipv4Addr::new(192, 168, 10, 5)));
    assert_eq!(outcome.source, Some(IpSource::NameMatch));

    let camera = registry.device("cam").unwrap();
    let mac = MacAddress::new("aa:bb:cc:00:11:22");
    assert!(camera.has_mac_connection(&mac));
    assert!(camera
        .identifiers
        .contains(&("mac".to_owned(), "aa:bb:cc:00:11:22".to_owned())));
    // Existing identifiers survive the update.
    assert!(camera.has_identifier_domain("frigate"));
}

#[tokio::test]
async fn conflicting_macs_for_one_ip_attach_nothing() {
    let registry = Arc::new(
        MemoryRegistry::builder()
            .device(frigate_camera("cam", "Garage 10.1.1.9", "garage"))
            .device(mac_source("a", "Switch port 10.1.1.9", "11:11:11:11:11:11", "none"))
            .device(mac_source("b", "DHCP lease 10.1.1.9", "22:22:22:22:22:22", "none"))
            .build(),
    );

    let report = merger(&registry, offline_config()).run().await.unwrap();

    assert_eq!(report.mac_mappings, 0);
    assert_eq!(report.outcomes[0].kind, OutcomeKind::NoMac);
    assert_eq!(registry.write_count(), 0);
    assert!(registry.device("cam").unwrap().mac().is_none());
}

#[tokio::test]
async fn camera_without_mac_entry_is_not_written() {
    let registry = Arc::new(
        MemoryRegistry::builder()
            .device(frigate_camera("cam", "Shed 192.168.5.5", "shed"))
            .device(mac_source("other", "Printer 192.168.5.6", "33:33:33:33:33:33", "none"))
            .build(),
    );

    let report = merger(&registry, offline_config()).run().await.unwrap();

    assert_eq!(report.outcomes[0].kind, OutcomeKind::NoMac);
    assert_eq!(report.outcomes[0].ip, Some(Ipv4Addr::new(192, 168, 5, 5)));
    assert_eq!(registry.write_count(), 0);
}

#[tokio::test]
async fn second_run_writes_nothing() {
    let registry = Arc::new(
        MemoryRegistry::builder()
            .device(frigate_camera("cam", "Porch 172.16.4.2", "porch"))
            .device(mac_source("r", "Reolink 172.16.4.2", "44:44:44:44:44:44", "none"))
            .build(),
    );
    let merger = merger(&registry, offline_config());

    let first = merger.run().await.unwrap();
    assert_eq!(first.count(OutcomeKind::Linked), 1);
    assert_eq!(registry.write_count(), 1);

    let second = merger.run().await.unwrap();
    assert_eq!(second.updated(), 0);
    assert_eq!(second.outcomes[0].kind, OutcomeKind::AlreadyLinked);
    assert_eq!(registry.write_count(), 1);
    assert_ne!(first.run_id, second.run_id);
}

#[tokio::test]
async fn front_door_camera_pairs_with_front_door_host() {
    let registry = Arc::new(
        MemoryRegistry::builder()
            .device(frigate_camera("cam", "Front Door Camera", "fd"))
            .device(mac_source("hik", "front_door", "55:55:55:55:55:55", "h1"))
            .config_entry(
                ConfigEntryRecord::new("h1", "hikvision_isapi").with_data("host", "192.168.1.64"),
            )
            .build(),
    );

    let report = merger(&registry, offline_config()).plan().await.unwrap();

    assert!(report.dry_run);
    assert_eq!(report.outcomes[0].kind, OutcomeKind::Planned);
    assert_eq!(report.outcomes[0].source, Some(IpSource::NameMatch));
    assert_eq!(report.outcomes[0].ip, Some(Ipv4Addr::new(192, 168, 1, 64)));
    assert_eq!(registry.write_count(), 0);
}

#[tokio::test]
async fn exact_source_name_wins_over_stripped_suffix() {
    let registry = Arc::new(
        MemoryRegistry::builder()
            .device(frigate_camera("cam", "Front Door", "fd"))
            .device(mac_source("a", "Front Door Camera", "AA:AA:AA:AA:AA:AA", "r1"))
            .device(mac_source("b", "Front Door", "BB:BB:BB:BB:BB:BB", "r2"))
            .config_entry(ConfigEntryRecord::new("r1", "reolink").with_data("host", "192.168.1.10"))
            .config_entry(ConfigEntryRecord::new("r2", "reolink").with_data("host", "192.168.1.20"))
            .build(),
    );

    let report = merger(&registry, offline_config()).plan().await.unwrap();

    let outcome = &report.outcomes[0];
    assert_eq!(outcome.ip, Some(Ipv4Addr::new(192, 168, 1, 20)));
    assert_eq!(outcome.mac, Some(MacAddress::new("bb:bb:bb:bb:bb:bb")));
    assert_eq!(outcome.kind, OutcomeKind::Planned);
}

#[tokio::test]
async fn public_addresses_are_discarded_everywhere() {
    let registry = Arc::new(
        MemoryRegistry::builder()
            .device(frigate_camera("cam", "Cloud cam 34.1.2.3", "cloud"))
            .device(mac_source("src", "cloud cam", "66:66:66:66:66:66", "c1"))
            .config_entry(ConfigEntryRecord::new("c1", "reolink").with_data("host", "34.1.2.3"))
            .entity(
                EntityRecord::camera("camera.cloud", "cam")
                    .with_stream_source("rtsp://u:p@34.1.2.3:554/"),
            )
            .build(),
    );

    let merger = merger(&registry, offline_config());
    let snapshot = merger.inspect().await.unwrap();
    assert!(snapshot.macs.is_empty());
    assert!(snapshot.names.is_empty());

    let report = merger.run().await.unwrap();
    assert_eq!(report.outcomes[0].kind, OutcomeKind::NoIp);
}

// ── Frigate API ─────────────────────────────────────────────────────

#[tokio::test]
async fn frigate_api_resolves_proxied_camera() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/config"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "go2rtc": { "streams": {
                "back_yard": "rtsp://admin:pw@192.168.20.7:554/h264"
            }},
            "cameras": {
                "back_yard": { "ffmpeg": { "inputs": [
                    { "path": "rtsp://127.0.0.1:8554/back_yard", "roles": ["detect", "record"] }
                ]}}
            }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let registry = Arc::new(
        MemoryRegistry::builder()
            .device(frigate_camera("cam", "Back Yard", "back_yard"))
            .device(
                DeviceRecord::new("unifi", "G4 Bullet")
                    .with_connection("mac", "77:77:77:77:77:77")
                    .with_config_entry("u1"),
            )
            .config_entry(ConfigEntryRecord::new("u1", "unifiprotect").with_data("host", "192.168.20.7"))
            .build(),
    );

    let mut config = MergerConfig::default();
    config.frigate.url = Some(server.uri());
    let report = merger(&registry, config).plan().await.unwrap();

    assert_eq!(report.frigate_cameras, 1);
    assert!(report.frigate_error.is_none());
    let outcome = &report.outcomes[0];
    assert_eq!(outcome.source, Some(IpSource::FrigateApi));
    assert_eq!(outcome.ip, Some(Ipv4Addr::new(192, 168, 20, 7)));
    // The UniFi device already holds the MAC as a connection.
    assert_eq!(outcome.kind, OutcomeKind::OwnedElsewhere);
    assert_eq!(outcome.owner.as_deref(), Some("unifi"));
}

#[tokio::test]
async fn frigate_failure_falls_back() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/config"))
        .respond_with(ResponseTemplate::new(502).set_body_string("bad gateway"))
        .mount(&server)
        .await;

    let registry = Arc::new(
        MemoryRegistry::builder()
            .device(frigate_camera("cam", "Gate 10.9.9.9", "gate"))
            .device(mac_source("src", "Gate controller 10.9.9.9", "88:88:88:88:88:88", "none"))
            .build(),
    );

    let mut config = MergerConfig::default();
    config.frigate.url = Some(server.uri());
    let report = merger(&registry, config).run().await.unwrap();

    assert!(report.frigate_error.is_some());
    assert_eq!(report.frigate_cameras, 0);
    assert_eq!(report.outcomes[0].source, Some(IpSource::DeviceName));
    assert_eq!(report.outcomes[0].kind, OutcomeKind::Linked);
}

#[tokio::test]
async fn frigate_url_comes_from_config_entry() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/config"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "cameras": {} })))
        .expect(1)
        .mount(&server)
        .await;

    let registry = Arc::new(
        MemoryRegistry::builder()
            .config_entry(ConfigEntryRecord::new("frigate_entry", "frigate").with_data("url", server.uri()))
            .build(),
    );

    let snapshot = merger(&registry, MergerConfig::default()).inspect().await.unwrap();
    assert_eq!(snapshot.frigate.url.as_deref(), Some(server.uri().as_str()));
    assert!(snapshot.frigate.error.is_none());
}
