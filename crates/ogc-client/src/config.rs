//! Per-client configuration.
//!
//! Loaded from YAML, then overridden from the environment. Every client owns
//! its own copy; nothing is shared between instances.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::debug;

use ogc_capabilities::FetchOptions;
use ogc_common::{OgcError, OgcResult};

pub const ENV_TIMEOUT_SECS: &str = "OGC_TIMEOUT_SECS";
pub const ENV_MAX_FEATURES: &str = "OGC_MAX_FEATURES";
pub const ENV_DEFAULT_LANGUAGE: &str = "OGC_DEFAULT_LANGUAGE";

/// Timeouts (seconds) and limits of one client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    pub capabilities_timeout: u64,
    pub describe_timeout: u64,
    pub data_timeout: u64,
    pub feed_timeout: u64,
    /// Result-count ceiling for feature services that advertise no `CountDefault`.
    pub max_features: u64,
    /// Maximum number of DescribeCoverage calls per capabilities fetch.
    pub max_coverages: usize,
    pub default_language: String,
    pub user_agent: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            capabilities_timeout: 90,
            describe_timeout: 30,
            data_timeout: 30,
            feed_timeout: 30,
            max_features: 5000,
            max_coverages: 100,
            default_language: "en".to_string(),
            user_agent: concat!("ogc-fetch/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

impl ClientConfig {
    /// Load a configuration from a YAML file. Missing keys keep their defaults.
    pub fn load(path: &Path) -> OgcResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            OgcError::Config(format!("Failed to read config file {}: {}", path.display(), e))
        })?;
        let config = Self::from_yaml(&content).map_err(|e| {
            OgcError::Config(format!("Failed to parse config file {}: {}", path.display(), e))
        })?;
        debug!(path = %path.display(), "Loaded client config");
        Ok(config)
    }

    pub fn from_yaml(content: &str) -> OgcResult<Self> {
        serde_yaml::from_str(content).map_err(|e| OgcError::Config(e.to_string()))
    }

    /// Apply `OGC_*` overrides from the process environment.
    pub fn with_env(self) -> OgcResult<Self> {
        self.with_overrides(|key| std::env::var(key).ok())
    }

    /// Apply overrides read through `lookup`.
    ///
    /// `OGC_TIMEOUT_SECS` sets every timeout.
    pub fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> OgcResult<Self> {
        if let Some(value) = lookup(ENV_TIMEOUT_SECS) {
            let secs = parse_number(ENV_TIMEOUT_SECS, &value)?;
            self.capabilities_timeout = secs;
            self.describe_timeout = secs;
            self.data_timeout = secs;
            self.feed_timeout = secs;
        }
        if let Some(value) = lookup(ENV_MAX_FEATURES) {
            self.max_features = parse_number(ENV_MAX_FEATURES, &value)?;
        }
        if let Some(value) = lookup(ENV_DEFAULT_LANGUAGE) {
            self.default_language = value;
        }
        Ok(self)
    }

    pub fn data_timeout(&self) -> Duration {
        Duration::from_secs(self.data_timeout)
    }

    pub fn feed_timeout(&self) -> Duration {
        Duration::from_secs(self.feed_timeout)
    }

    pub fn describe_timeout(&self) -> Duration {
        Duration::from_secs(self.describe_timeout)
    }

    /// Options for the capabilities fetch.
    pub fn fetch_options(&self) -> FetchOptions {
        FetchOptions {
            capabilities_timeout: Duration::from_secs(self.capabilities_timeout),
            describe_timeout: self.describe_timeout(),
            default_language: self.default_language.clone(),
            max_coverages: self.max_coverages,
        }
    }
}

fn parse_number(key: &str, value: &str) -> OgcResult<u64> {
    value
        .trim()
        .parse()
        .map_err(|_| OgcError::Config(format!("{} must be a non-negative integer, got '{}'", key, value)))
}
