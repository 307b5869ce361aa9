// Frigate `/api/config` response shapes
//
// Only the sections camlink reads are typed. Everything else in the
// (large) config document is ignored by serde. Stream sections accept
// both the single-string and list forms Frigate allows in YAML.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// The subset of Frigate's runtime configuration that carries camera stream URLs.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FrigateConfig {
    /// Embedded go2rtc relay configuration.
    #[serde(default)]
    pub go2rtc: Option<Go2RtcConfig>,

    /// Per-camera configuration keyed by camera name.
    #[serde(default)]
    pub cameras: IndexMap<String, CameraConfig>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Go2RtcConfig {
    /// Stream name -> upstream source(s).
    #[serde(default)]
    pub streams: IndexMap<String, StreamSources>,
}

/// A go2rtc stream definition: one source URL or a list of them.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StreamSources {
    One(String),
    Many(Vec<serde_json::Value>),
    /// Anything else go2rtc accepts that is not a URL list.
    Other(serde_json::Value),
}

impl StreamSources {
    /// Iterate the string sources, skipping non-string list members.
    pub fn urls(&self) -> Box<dyn Iterator<Item = &str> + '_> {
        match self {
            Self::One(url) => Box::new(std::iter::once(url.as_str())),
            Self::Many(items) => Box::new(items.iter().filter_map(serde_json::Value::as_str)),
            Self::Other(_) => Box::new(std::iter::empty()),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CameraConfig {
    #[serde(default)]
    pub ffmpeg: Option<FfmpegConfig>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FfmpegConfig {
    #[serde(default)]
    pub inputs: Vec<FfmpegInput>,
}

/// One ffmpeg input: either a bare path string or an object with `path` and roles.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FfmpegInput {
    Path(String),
    Input {
        path: String,
        #[serde(default)]
        roles: Vec<String>,
    },
    Other(serde_json::Value),
}

impl FfmpegInput {
    pub fn path(&self) -> Option<&str> {
        match self {
            Self::Path(path) | Self::Input { path, .. } => Some(path),
            Self::Other(_) => None,
        }
    }
}

impl CameraConfig {
    /// Iterate the ffmpeg input paths of this camera.
    pub fn input_paths(&self) -> impl Iterator<Item = &str> {
        self.ffmpeg
            .iter()
            .flat_map(|ffmpeg| ffmpeg.inputs.iter())
            .filter_map(FfmpegInput::path)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_go2rtc_single_and_list_streams() {
        let config: FrigateConfig = serde_json::from_value(json!({
            "go2rtc": {
                "streams": {
                    "front_door": "rtsp://admin:pw@192.168.1.20:554/main",
                    "garage": [
                        "rtsp://admin:pw@192.168.1.21:554/main",
                        { "url": "ffmpeg:garage#audio=opus" }
                    ],
                    "weird": 42
                }
            },
            "cameras": {}
        }))
        .unwrap();

        let streams = &config.go2rtc.unwrap().streams;
        let front: Vec<_> = streams["front_door"].urls().collect();
        assert_eq!(front, vec!["rtsp://admin:pw@192.168.1.20:554/main"]);
        let garage: Vec<_> = streams["garage"].urls().collect();
        assert_eq!(garage, vec!["rtsp://admin:pw@192.168.1.21:554/main"]);
        assert_eq!(streams["weird"].urls().count(), 0);
    }

    #[test]
    fn parses_ffmpeg_inputs_in_both_forms() {
        let config: FrigateConfig = serde_json::from_value(json!({
            "cameras": {
                "driveway": {
                    "ffmpeg": {
                        "inputs": [
                            { "path": "rtsp://127.0.0.1:8554/driveway", "roles": ["detect"] },
                            "rtsp://u:p@10.0.0.9/stream"
                        ]
                    }
                }
            }
        }))
        .unwrap();

        let paths: Vec<_> = config.cameras["driveway"].input_paths().collect();
        assert_eq!(
            paths,
            vec!["rtsp://127.0.0.1:8554/driveway", "rtsp://u:p@10.0.0.9/stream"]
        );
    }

    #[test]
    fn missing_sections_default_to_empty() {
        let config: FrigateConfig = serde_json::from_value(json!({ "mqtt": {} })).unwrap();
        assert!(config.go2rtc.is_none());
        assert!(config.cameras.is_empty());
    }
}
