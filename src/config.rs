use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::duration::deserialize_duration;

/// Default portal origin.
fn default_base_url() -> String {
    "https://www.ib.kiwibank.co.nz".to_string()
}

/// Default User-Agent presented on every request.
fn default_user_agent() -> String {
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:132.0) Gecko/20100101 Firefox/132.0".to_string()
}

/// Default per-request timeout (30 seconds).
fn default_request_timeout() -> Duration {
    Duration::from_secs(30)
}

/// Client configuration.
///
/// All fields have defaults aimed at the live portal; tests point
/// `base_url` at a local mock server instead.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Origin the flow runs against, without a trailing slash.
    pub base_url: String,

    /// User-Agent header for the whole session.
    pub user_agent: String,

    /// How long a single round trip may take before the transport gives up.
    #[serde(
        default = "default_request_timeout",
        deserialize_with = "deserialize_duration"
    )]
    pub request_timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            user_agent: default_user_agent(),
            request_timeout: default_request_timeout(),
        }
    }
}

impl ClientConfig {
    /// Load configuration from a TOML file.
    pub fn load_from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {path:?}"))?;
        toml::from_str(&content).with_context(|| format!("Failed to parse config file: {path:?}"))
    }

    /// Replace the portal origin (used by tests to target a mock server).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}
