//! Dune SIM client backed by `reqwest`.
//!
//! One attempt per call, no retries. Non-2xx answers to `simulate` are
//! [`TransportError::Status`]; non-200 answers to an image request are an
//! absent image.

use async_trait::async_trait;
use std::time::Duration;

use txsim_core::error::TransportError;
use txsim_core::transport::SimApi;
use txsim_core::types::{ApiKey, SimulationRequest, SimulationResult};

pub const DEFAULT_SIMULATE_URL: &str = "https://api.sim.dune.com/v1/simulate";
pub const DEFAULT_NFT_BASE_URL: &str = "https://api.sim.dune.com/v1/nft";

/// Configuration for `HttpSimApi`.
#[derive(Debug, Clone)]
pub struct HttpSimApiConfig {
    pub simulate_url: String,
    /// Images live at `{nft_base_url}/{contract}/{token_id}`.
    pub nft_base_url: String,
    pub request_timeout: Duration,
}

impl Default for HttpSimApiConfig {
    fn default() -> Self {
        Self {
            simulate_url: DEFAULT_SIMULATE_URL.to_string(),
            nft_base_url: DEFAULT_NFT_BASE_URL.to_string(),
            request_timeout: Duration::from_secs(30),
        }
    }
}

impl HttpSimApiConfig {
    pub fn nft_image_url(&self, contract_address: &str, token_id: &str) -> String {
        format!(
            "{}/{}/{}",
            self.nft_base_url.trim_end_matches('/'),
            contract_address,
            token_id
        )
    }
}

/// HTTP transport for the Dune SIM API.
pub struct HttpSimApi {
    config: HttpSimApiConfig,
    http: reqwest::Client,
}

impl HttpSimApi {
    /// Build a client; fails only if the TLS backend cannot be initialised.
    pub fn new(config: HttpSimApiConfig) -> Result<Self, TransportError> {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .user_agent(concat!("txsim/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| TransportError::Http(e.to_string()))?;
        Ok(Self { config, http })
    }

    /// Client against the public Dune SIM endpoints.
    pub fn default_endpoints() -> Result<Self, TransportError> {
        Self::new(HttpSimApiConfig::default())
    }

    pub fn config(&self) -> &HttpSimApiConfig {
        &self.config
    }
}

#[async_trait]
impl SimApi for HttpSimApi {
    async fn simulate(&self, req: &SimulationRequest) -> Result<SimulationResult, TransportError> {
        tracing::debug!(url = %self.config.simulate_url, chain_id = req.chain_id, "POST simulate");

        let resp = self
            .http
            .post(&self.config.simulate_url)
            .bearer_auth(req.api_key.expose())
            .json(&req.payload())
            .send()
            .await
            .map_err(|e| TransportError::Http(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(TransportError::Status { status: status.as_u16(), body });
        }

        let body = resp
            .bytes()
            .await
            .map_err(|e| TransportError::Http(e.to_string()))?;
        Ok(SimulationResult::from_json(&body)?)
    }

    async fn nft_image(
        &self,
        api_key: &ApiKey,
        contract_address: &str,
        token_id: &str,
    ) -> Result<Option<Vec<u8>>, TransportError> {
        let url = self.config.nft_image_url(contract_address, token_id);
        tracing::debug!(%url, "GET NFT image");

        let resp = self
            .http
            .get(&url)
            .bearer_auth(api_key.expose())
            .send()
            .await
            .map_err(|e| TransportError::Http(e.to_string()))?;

        if resp.status() != reqwest::StatusCode::OK {
            tracing::debug!(%url, status = resp.status().as_u16(), "no image");
            return Ok(None);
        }

        let bytes = resp
            .bytes()
            .await
            .map_err(|e| TransportError::Http(e.to_string()))?;
        Ok(Some(bytes.to_vec()))
    }

    fn name(&self) -> &str {
        "dune-sim"
    }
}
