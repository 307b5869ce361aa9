// camlink-api: Frigate HTTP client and Home Assistant storage-file codec.

pub mod error;
pub mod frigate;
pub mod storage;
pub mod transport;

pub use error::Error;
pub use frigate::{FrigateClient, FrigateConfig};
pub use storage::StorageDir;
pub use transport::{TlsMode, TransportConfig};
