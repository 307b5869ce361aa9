// ── Domain model ──

pub mod device;
pub mod mac;

pub use device::{
    CONNECTION_NETWORK_MAC, ConfigEntryRecord, DeviceRecord, EntityRecord, MAC_IDENTIFIER_DOMAIN,
    RegistryPair,
};
pub use mac::MacAddress;
