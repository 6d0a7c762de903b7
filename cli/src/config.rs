//! `txsim` configuration file.
//!
//! Every field is optional; a missing file section falls back to defaults.
//!
//! ```json
//! {
//!   "api":   { "simulate_url": "...", "nft_base_url": "...", "timeout_secs": 30 },
//!   "cache": { "simulation_ttl_secs": 300 },
//!   "log":   { "level": "warn", "components": { "txsim_core": "debug" }, "json": false }
//! }
//! ```

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use txsim_core::DEFAULT_SIMULATION_TTL;
use txsim_http::{HttpSimApiConfig, DEFAULT_NFT_BASE_URL, DEFAULT_SIMULATE_URL};

use crate::logging::LogConfig;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TxsimConfig {
    pub api: ApiConfig,
    pub cache: CacheConfig,
    pub log: LogConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    pub simulate_url: String,
    pub nft_base_url: String,
    pub timeout_secs: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            simulate_url: DEFAULT_SIMULATE_URL.to_string(),
            nft_base_url: DEFAULT_NFT_BASE_URL.to_string(),
            timeout_secs: 30,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    pub simulation_ttl_secs: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self { simulation_ttl_secs: DEFAULT_SIMULATION_TTL.as_secs() }
    }
}

impl TxsimConfig {
    /// Load from `path`, or defaults when no path is given.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("read config file '{}'", path.display()))?;
        serde_json::from_str(&text)
            .with_context(|| format!("parse config file '{}'", path.display()))
    }

    pub fn http(&self) -> HttpSimApiConfig {
        HttpSimApiConfig {
            simulate_url: self.api.simulate_url.clone(),
            nft_base_url: self.api.nft_base_url.clone(),
            request_timeout: Duration::from_secs(self.api.timeout_secs),
        }
    }

    pub fn simulation_ttl(&self) -> Duration {
        Duration::from_secs(self.cache.simulation_ttl_secs)
    }
}
