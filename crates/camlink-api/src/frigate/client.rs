// Frigate HTTP client
//
// Wraps `reqwest::Client` with base-URL normalization and response
// handling for the one endpoint camlink needs: the runtime config
// (camera stream URLs).

use serde::de::DeserializeOwned;
use tracing::debug;
use url::Url;

use crate::error::Error;
use crate::frigate::models::FrigateConfig;
use crate::transport::TransportConfig;

/// Async client for a Frigate NVR instance.
pub struct FrigateClient {
    http: reqwest::Client,
    base_url: Url,
    timeout_secs: u64,
}

impl FrigateClient {
    /// Create a client from a raw base URL (`http://frigate:5000`, `frigate:5000`, ...).
    pub fn new(base_url: &str, transport: &TransportConfig) -> Result<Self, Error> {
        let http = transport.build_client()?;
        let base_url = normalize_base_url(base_url)?;
        Ok(Self {
            http,
            base_url,
            timeout_secs: transport.timeout.as_secs(),
        })
    }

    /// The normalized base URL, always ending in `/`.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    // ── Endpoints ────────────────────────────────────────────────────

    /// Fetch the runtime configuration.
    ///
    /// `GET {base}/api/config`
    pub async fn get_config(&self) -> Result<FrigateConfig, Error> {
        self.get_json("api/config").await
    }

    // ── Request helpers ──────────────────────────────────────────────

    fn url(&self, path: &str) -> Result<Url, Error> {
        Ok(self.base_url.join(path)?)
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, Error> {
        let url = self.url(path)?;
        debug!("GET {url}");

        let resp = self.http.get(url).send().await.map_err(|e| self.map_send(e))?;
        let status = resp.status();
        if !status.is_success() {
            return Err(parse_error(status, resp).await);
        }

        let body = resp.text().await.map_err(|e| self.map_send(e))?;
        serde_json::from_str(&body).map_err(|e| {
            let preview: String = body.chars().take(200).collect();
            Error::Deserialization {
                message: format!("{e} (body preview: {preview:?})"),
                body,
            }
        })
    }

    fn map_send(&self, err: reqwest::Error) -> Error {
        if err.is_timeout() {
            Error::Timeout {
                timeout_secs: self.timeout_secs,
            }
        } else {
            Error::Transport(err)
        }
    }
}

async fn parse_error(status: reqwest::StatusCode, resp: reqwest::Response) -> Error {
    if status == reqwest::StatusCode::UNAUTHORIZED {
        return Error::Unauthorized;
    }
    let raw = resp.text().await.unwrap_or_default();
    Error::Http {
        status: status.as_u16(),
        message: if raw.is_empty() {
            status.to_string()
        } else {
            raw
        },
    }
}

/// Normalize a Frigate base URL.
///
/// Adds `http://` when the value has no scheme (config entries often store
/// a bare `host:port`) and guarantees a trailing slash so relative joins
/// keep any path prefix (ingress setups).
pub fn normalize_base_url(raw: &str) -> Result<Url, Error> {
    let raw = raw.trim();
    let with_scheme = if raw.starts_with("http://") || raw.starts_with("https://") {
        raw.to_owned()
    } else {
        format!("http://{raw}")
    };

    let mut url = Url::parse(&with_scheme)?;
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn adds_scheme_and_slash() {
        let url = normalize_base_url("ccab4aaf-frigate:5000").unwrap();
        assert_eq!(url.as_str(), "http://ccab4aaf-frigate:5000/");
    }

    #[test]
    fn keeps_https_and_path_prefix() {
        let url = normalize_base_url("https://nvr.lan/frigate").unwrap();
        assert_eq!(url.as_str(), "https://nvr.lan/frigate/");
        assert_eq!(
            url.join("api/config").unwrap().as_str(),
            "https://nvr.lan/frigate/api/config"
        );
    }

    #[test]
    fn rejects_garbage() {
        assert!(normalize_base_url("http://").is_err());
    }
}
