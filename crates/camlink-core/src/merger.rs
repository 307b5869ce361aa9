// ── Merger pipeline ──
//
// One run = scan the registry, build the per-run tables, ask Frigate for
// its camera map, then correlate. Frigate failures degrade the run to
// the fallback strategies; registry failures abort it.

use std::sync::Arc;

use camlink_api::transport::{TlsMode, TransportConfig};
use camlink_api::FrigateClient;
use chrono::Utc;
use serde::Serialize;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::{FrigateSettings, MergerConfig, TlsVerification};
use crate::correlate::{Correlator, RunReport};
use crate::error::CoreError;
use crate::registry::DeviceRegistry;
use crate::resolve::{
    CameraResolver, Inventory, IpTable, MacTable, build_mac_table, build_name_table, camera_ips,
    frigate_base_url,
};

/// Whether a run writes to the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RunMode {
    #[default]
    Apply,
    DryRun,
}

/// The Frigate side of a run: where it asked and what it got.
#[derive(Debug, Clone, Default, Serialize)]
pub struct FrigateLookup {
    /// Base URL queried, `None` when the API is disabled.
    pub url: Option<String>,
    pub cameras: IpTable,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Every per-run table, for inspection without correlating.
#[derive(Debug, Clone, Serialize)]
pub struct Snapshot {
    pub frigate: FrigateLookup,
    pub names: IpTable,
    pub macs: MacTable,
}

/// Runs the scan → resolve → correlate pipeline against one registry.
pub struct Merger {
    config: MergerConfig,
    registry: Arc<dyn DeviceRegistry>,
}

impl Merger {
    pub fn new(config: MergerConfig, registry: Arc<dyn DeviceRegistry>) -> Self {
        Self { config, registry }
    }

    pub fn config(&self) -> &MergerConfig {
        &self.config
    }

    pub fn registry(&self) -> &Arc<dyn DeviceRegistry> {
        &self.registry
    }

    /// One full run that writes to the registry.
    pub async fn run(&self) -> Result<RunReport, CoreError> {
        self.run_with(RunMode::Apply).await
    }

    /// One full run that only reports what it would write.
    pub async fn plan(&self) -> Result<RunReport, CoreError> {
        self.run_with(RunMode::DryRun).await
    }

    pub async fn run_with(&self, mode: RunMode) -> Result<RunReport, CoreError> {
        let run_id = Uuid::new_v4();
        let started_at = Utc::now();
        let dry_run = mode == RunMode::DryRun;
        info!(%run_id, dry_run, "starting camera scan");

        let inventory = Inventory::scan(self.registry.as_ref(), &self.config)?;
        let macs = build_mac_table(&inventory, &self.config);
        let names = build_name_table(&inventory, &self.config);
        let frigate = self.lookup_frigate(&inventory).await;

        let resolver = CameraResolver::new(&self.config, &frigate.cameras, &names);
        let correlator = Correlator::new(self.registry.as_ref(), &self.config, dry_run);
        let outcomes = correlator.correlate(&inventory, &resolver, &macs)?;

        let report = RunReport {
            run_id,
            started_at,
            finished_at: Utc::now(),
            dry_run,
            cameras: outcomes.len(),
            mac_mappings: macs.len(),
            frigate_cameras: frigate.cameras.len(),
            frigate_error: frigate.error,
            outcomes,
        };
        report.log_summary();
        Ok(report)
    }

    /// Build the per-run tables without touching any camera.
    pub async fn inspect(&self) -> Result<Snapshot, CoreError> {
        let inventory = Inventory::scan(self.registry.as_ref(), &self.config)?;
        let macs = build_mac_table(&inventory, &self.config);
        let names = build_name_table(&inventory, &self.config);
        let frigate = self.lookup_frigate(&inventory).await;
        Ok(Snapshot {
            frigate,
            names,
            macs,
        })
    }

    /// Query Frigate for its camera map. Failures are logged and recorded,
    /// never returned.
    async fn lookup_frigate(&self, inventory: &Inventory) -> FrigateLookup {
        if !self.config.frigate.enabled {
            debug!("Frigate API lookup disabled");
            return FrigateLookup::default();
        }

        let url = frigate_base_url(&self.config, inventory.config_entries.values());
        let result = self.fetch_camera_ips(&url).await;
        match result {
            Ok(cameras) => {
                info!(url = %url, cameras = cameras.len(), "fetched camera addresses from Frigate");
                FrigateLookup {
                    url: Some(url),
                    cameras,
                    error: None,
                }
            }
            Err(err) => {
                warn!(url = %url, error = %err, "Frigate API unavailable, using fallback strategies only");
                FrigateLookup {
                    url: Some(url),
                    cameras: IpTable::new(),
                    error: Some(err.to_string()),
                }
            }
        }
    }

    async fn fetch_camera_ips(&self, url: &str) -> Result<IpTable, CoreError> {
        let transport = build_transport(&self.config.frigate);
        let client = FrigateClient::new(url, &transport)?;
        let config = client.get_config().await?;
        Ok(camera_ips(&config))
    }
}

fn build_transport(settings: &FrigateSettings) -> TransportConfig {
    TransportConfig {
        tls: tls_to_transport(&settings.tls),
        timeout: settings.timeout,
        bearer_token: settings.token.clone(),
    }
}

fn tls_to_transport(tls: &TlsVerification) -> TlsMode {
    match tls {
        TlsVerification::SystemDefaults => TlsMode::System,
        TlsVerification::CustomCa(path) => TlsMode::CustomCa(path.clone()),
        TlsVerification::DangerAcceptInvalid => TlsMode::DangerAcceptInvalid,
    }
}
