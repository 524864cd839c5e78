//! Console configuration.
//!
//! Every section has defaults, so an empty YAML document is a valid config.
//! The API base URL can be overridden with `SCHOOL_ADMIN_API_URL`.

use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use shared::{FeePolicy, NavigationConfig};
use tracing::info;

pub const API_URL_ENV: &str = "SCHOOL_ADMIN_API_URL";

/// Where and how to reach the school REST API
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    pub base_url: String,
    pub timeout_secs: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:5000".to_string(),
            timeout_secs: 15,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AdminConfig {
    pub api: ApiConfig,
    pub fees: FeePolicy,
    pub navigation: NavigationConfig,
}

impl AdminConfig {
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(yaml).context("Failed to parse admin config YAML")
    }

    /// Load a YAML config file and apply environment overrides
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let yaml = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let mut config = Self::from_yaml_str(&yaml)
            .with_context(|| format!("Invalid config in {}", path.display()))?;
        config.apply_env_overrides();
        info!("Loaded admin config from {}", path.display());
        Ok(config)
    }

    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides_from(std::env::var(API_URL_ENV).ok());
    }

    /// Override the API base URL; blank values are ignored
    pub fn apply_overrides_from(&mut self, api_url: Option<String>) {
        if let Some(url) = api_url.as_deref().map(str::trim).filter(|url| !url.is_empty()) {
            info!("API base URL overridden by {}: {}", API_URL_ENV, url);
            self.api.base_url = url.to_string();
        }
    }
}
