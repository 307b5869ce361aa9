//! Camera identity correlation between Frigate and other Home Assistant
//! integrations.
//!
//! Frigate registers cameras with readable names but no MAC address;
//! vendor integrations (Hikvision, UniFi Protect, Reolink, ONVIF, routers)
//! register the same hardware with a MAC but unrelated names. This crate
//! joins the two on IPv4 address and writes the MAC back onto the Frigate
//! device so the host's registry can merge them:
//!
//! - **[`Merger`]** — one run: registry scan, per-run tables, Frigate API
//!   lookup, correlation. [`Merger::plan()`] does the same without writing.
//!
//! - **[`Lifecycle`]** — binds a merger to a [`Host`]: delayed run after
//!   startup, delayed run when already running, manual `update_devices`
//!   service. Runs are serialized.
//!
//! - **[`DeviceRegistry`]** — the registry contract, with an in-memory
//!   implementation ([`MemoryRegistry`]) and one over Home Assistant's
//!   `.storage` documents ([`StorageRegistry`]).
//!
//! - **[`resolve`]** — IPv4 extraction, name normalization, and the
//!   camera IP strategy chain.

pub mod config;
pub mod correlate;
pub mod error;
pub mod lifecycle;
pub mod merger;
pub mod model;
pub mod registry;
pub mod resolve;

// ── Primary re-exports ──────────────────────────────────────────────
pub use config::{FrigateSettings, MergerConfig, TlsVerification};
pub use correlate::{CameraOutcome, Correlator, OutcomeKind, RunReport};
pub use error::CoreError;
pub use lifecycle::{Host, Lifecycle, LocalHost, ServiceCall, Trigger, TriggeredRun, UPDATE_SERVICE};
pub use merger::{FrigateLookup, Merger, RunMode, Snapshot};
pub use model::{ConfigEntryRecord, DeviceRecord, EntityRecord, MacAddress};
pub use registry::{
    DeviceRegistry, DeviceUpdate, MemoryRegistry, RegistryContents, RegistryError, StorageRegistry,
};
pub use resolve::{IpSource, IpTable, MacTable};
