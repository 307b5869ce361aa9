// ── Address resolution ──
//
// Everything between the registry scan and the correlator: IPv4
// extraction, name normalization, the per-run tables and the camera
// strategy chain.

pub mod address;
pub mod frigate;
pub mod inventory;
pub mod names;
pub mod sources;
pub mod strategy;
pub mod tables;

pub use frigate::{camera_ips, frigate_base_url};
pub use inventory::Inventory;
pub use names::{name_variants, normalize, stripped_variants};
pub use sources::{build_mac_table, build_name_table};
pub use strategy::{CameraResolver, IpSource, Resolution};
pub use tables::{IpEntry, IpTable, MacClaim, MacTable};
