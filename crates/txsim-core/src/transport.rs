//! The `SimApi` trait: the seam between txsim and the remote service.

use async_trait::async_trait;

use crate::error::TransportError;
use crate::types::{ApiKey, SimulationRequest, SimulationResult};

/// Remote simulation service.
///
/// Implementations issue exactly one request per call: no caching, no
/// retries. Caching lives in [`crate::client::SimulationClient`] and
/// [`crate::nft::NftImageFetcher`].
#[async_trait]
pub trait SimApi: Send + Sync {
    /// Simulate the request.
    ///
    /// Connection failures, non-2xx statuses and unparseable bodies are
    /// `Err`. A well-formed body carrying an `error` field is `Ok`.
    async fn simulate(&self, req: &SimulationRequest) -> Result<SimulationResult, TransportError>;

    /// Fetch the preview image for one token.
    ///
    /// `Ok(None)` for any non-success status.
    async fn nft_image(
        &self,
        api_key: &ApiKey,
        contract_address: &str,
        token_id: &str,
    ) -> Result<Option<Vec<u8>>, TransportError>;

    /// Identifier for logs (base URL or name).
    fn name(&self) -> &str;
}
