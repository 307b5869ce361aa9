// ── Correlator ──
//
// Walks the target cameras, joins each resolved IP against the MAC
// table and writes the MAC back through the registry. A MAC is attached
// to at most one device per run.

use std::collections::HashMap;
use std::net::Ipv4Addr;

use chrono::{DateTime, Utc};
use serde::Serialize;
use strum::Display;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::MergerConfig;
use crate::error::CoreError;
use crate::model::{CONNECTION_NETWORK_MAC, DeviceRecord, MAC_IDENTIFIER_DOMAIN, MacAddress};
use crate::registry::{DeviceRegistry, DeviceUpdate, RegistryError};
use crate::resolve::{CameraResolver, Inventory, IpSource, MacTable};

// ── Outcomes ─────────────────────────────────────────────────────

/// What happened to one target camera.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum OutcomeKind {
    /// MAC written to the registry.
    Linked,
    /// Dry run: MAC would have been written.
    Planned,
    /// The camera already carries the MAC.
    AlreadyLinked,
    /// Another device already holds the MAC.
    OwnedElsewhere,
    /// The registry rejected the write as a duplicate connection.
    Collision,
    /// IP resolved, but no MAC source at that IP.
    NoMac,
    /// No strategy produced an IP.
    NoIp,
}

/// Per-camera line of a [`RunReport`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CameraOutcome {
    pub device_id: String,
    pub camera: String,
    pub ip: Option<Ipv4Addr>,
    pub source: Option<IpSource>,
    pub mac: Option<MacAddress>,
    pub kind: OutcomeKind,
    /// Device holding the MAC when the outcome is `owned_elsewhere` or `collision`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub owner: Option<String>,
}

impl CameraOutcome {
    fn new(device: &DeviceRecord, kind: OutcomeKind) -> Self {
        Self {
            device_id: device.id.clone(),
            camera: device.display_name().to_owned(),
            ip: None,
            source: None,
            mac: None,
            kind,
            owner: None,
        }
    }
}

// ── Run report ───────────────────────────────────────────────────

/// Result of one full pipeline run.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub dry_run: bool,
    /// Target cameras considered (root device excluded).
    pub cameras: usize,
    /// Entries in the IP → MAC table.
    pub mac_mappings: usize,
    /// Cameras the Frigate API reported an address for.
    pub frigate_cameras: usize,
    /// Why the Frigate API could not be used, if it was attempted and failed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub frigate_error: Option<String>,
    pub outcomes: Vec<CameraOutcome>,
}

impl RunReport {
    pub fn count(&self, kind: OutcomeKind) -> usize {
        self.outcomes.iter().filter(|o| o.kind == kind).count()
    }

    /// Cameras written (or, in a dry run, that would be written).
    pub fn updated(&self) -> usize {
        self.count(OutcomeKind::Linked) + self.count(OutcomeKind::Planned)
    }

    /// Which end-of-run hint applies.
    pub(crate) fn diagnosis(&self) -> Diagnosis {
        if self.updated() > 0 {
            Diagnosis::Updated
        } else if self.cameras == 0 {
            Diagnosis::NoCameras
        } else if self.mac_mappings == 0 {
            Diagnosis::NoMacSources
        } else if self.count(OutcomeKind::AlreadyLinked) == self.cameras {
            Diagnosis::AllLinked
        } else {
            Diagnosis::Unmatched
        }
    }

    /// Emit the end-of-run diagnostics.
    pub fn log_summary(&self) {
        let updated = self.updated();
        info!(
            run_id = %self.run_id,
            cameras = self.cameras,
            mac_mappings = self.mac_mappings,
            updated,
            dry_run = self.dry_run,
            "camera scan complete"
        );

        match self.diagnosis() {
            Diagnosis::Updated => info!(updated, "linked MAC addresses to Frigate cameras"),
            Diagnosis::NoCameras => {
                warn!("no Frigate cameras found, make sure the Frigate integration is set up");
            }
            Diagnosis::NoMacSources => warn!(
                cameras = self.cameras,
                "found Frigate cameras but no MAC addresses from other integrations, \
                 make sure the camera integrations are configured"
            ),
            Diagnosis::AllLinked => info!("all cameras already linked, nothing to update"),
            Diagnosis::Unmatched => warn!(
                cameras = self.cameras,
                mac_mappings = self.mac_mappings,
                "found cameras and MAC addresses but could not match them by IP, \
                 check that addresses agree between Frigate and other integrations"
            ),
        }
    }
}

/// End-of-run hint, see [`RunReport::diagnosis`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Diagnosis {
    /// At least one camera was linked or planned.
    Updated,
    NoCameras,
    NoMacSources,
    /// Every camera already carries its MAC.
    AllLinked,
    /// Cameras and MACs exist but nothing paired up.
    Unmatched,
}

// ── Correlator ───────────────────────────────────────────────────

/// Joins resolved camera IPs against the MAC table and writes results.
pub struct Correlator<'a> {
    registry: &'a dyn DeviceRegistry,
    config: &'a MergerConfig,
    dry_run: bool,
}

impl<'a> Correlator<'a> {
    pub fn new(registry: &'a dyn DeviceRegistry, config: &'a MergerConfig, dry_run: bool) -> Self {
        Self {
            registry,
            config,
            dry_run,
        }
    }

    /// Target cameras, minus the target system's own root device.
    pub fn cameras<'i>(&self, inventory: &'i Inventory) -> impl Iterator<Item = &'i DeviceRecord> {
        let config = self.config;
        inventory.targets.iter().filter(move |device| {
            let root = config.is_root_device_name(device.display_name());
            if root {
                debug!(device = device.display_name(), "skipping target system root device");
            }
            !root
        })
    }

    /// Process every camera. Only an unexpected registry error aborts.
    pub fn correlate(
        &self,
        inventory: &Inventory,
        resolver: &CameraResolver<'_>,
        macs: &MacTable,
    ) -> Result<Vec<CameraOutcome>, CoreError> {
        let mut owners = inventory.mac_owners();
        let mut outcomes = Vec::new();

        for device in self.cameras(inventory) {
            let outcome = self.correlate_one(device, inventory, resolver, macs, &mut owners)?;
            outcomes.push(outcome);
        }
        Ok(outcomes)
    }

    fn correlate_one(
        &self,
        device: &DeviceRecord,
        inventory: &Inventory,
        resolver: &CameraResolver<'_>,
        macs: &MacTable,
        owners: &mut HashMap<MacAddress, String>,
    ) -> Result<CameraOutcome, CoreError> {
        let name = device.display_name();

        let Some(resolution) = resolver.resolve(device, inventory.cameras_of(&device.id)) else {
            warn!(camera = name, "could not find IP address for Frigate camera");
            return Ok(CameraOutcome::new(device, OutcomeKind::NoIp));
        };

        let mut outcome = CameraOutcome::new(device, OutcomeKind::NoMac);
        outcome.ip = Some(resolution.ip);
        outcome.source = Some(resolution.source);

        let Some(claim) = macs.get(resolution.ip) else {
            warn!(
                camera = name,
                ip = %resolution.ip,
                "could not find MAC address for Frigate camera, make sure the camera is \
                 configured in another integration"
            );
            return Ok(outcome);
        };
        let mac = claim.mac.clone();
        outcome.mac = Some(mac.clone());

        if device.has_mac_connection(&mac) {
            info!(camera = name, %mac, "Frigate camera already has MAC address");
            outcome.kind = OutcomeKind::AlreadyLinked;
            return Ok(outcome);
        }

        if let Some(owner) = owners.get(&mac).filter(|owner| **owner != device.id) {
            info!(
                camera = name,
                %mac,
                owner = %owner,
                "MAC already belongs to another device, leaving it to the registry's merge logic"
            );
            outcome.kind = OutcomeKind::OwnedElsewhere;
            outcome.owner = Some(owner.clone());
            return Ok(outcome);
        }

        let mut update = DeviceUpdate {
            identifiers: device.identifiers.clone(),
            connections: device.connections.clone(),
        };
        update
            .identifiers
            .insert((MAC_IDENTIFIER_DOMAIN.to_owned(), mac.to_string()));
        update
            .connections
            .insert((CONNECTION_NETWORK_MAC.to_owned(), mac.to_string()));

        if self.dry_run {
            info!(camera = name, ip = %resolution.ip, %mac, "would update Frigate camera");
            owners.insert(mac, device.id.clone());
            outcome.kind = OutcomeKind::Planned;
            return Ok(outcome);
        }

        match self.registry.update_device(&device.id, update) {
            Ok(_) => {
                info!(camera = name, ip = %resolution.ip, %mac, "updated Frigate camera with MAC address");
                owners.insert(mac, device.id.clone());
                outcome.kind = OutcomeKind::Linked;
                Ok(outcome)
            }
            Err(err) if err.is_collision() => {
                info!(camera = name, %mac, error = %err, "registry rejected MAC as a duplicate connection");
                if let RegistryError::DuplicateConnection { existing_device, .. } = err {
                    outcome.owner = Some(existing_device);
                }
                outcome.kind = OutcomeKind::Collision;
                Ok(outcome)
            }
            Err(err) => Err(err.into()),
        }
    }
}
