// Frigate NVR API surface: runtime config and version endpoints.

pub mod client;
pub mod models;

pub use client::{FrigateClient, normalize_base_url};
pub use models::{CameraConfig, FfmpegInput, FrigateConfig, Go2RtcConfig, StreamSources};
