//! `SimulationClient`: memoizing front for [`SimApi::simulate`].

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use crate::cache::TtlCache;
use crate::error::TransportError;
use crate::transport::SimApi;
use crate::types::{SimulationRequest, SimulationResult};

/// Freshness window for simulation results.
pub const DEFAULT_SIMULATION_TTL: Duration = Duration::from_secs(300);

/// Cache key: one entry per (API key, call data, chain id).
///
/// Holds the keccak fingerprint of the API key, never the key itself.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct SimulationKey {
    key_fingerprint: [u8; 32],
    call_data: String,
    chain_id: u64,
}

impl SimulationKey {
    pub fn of(req: &SimulationRequest) -> Self {
        Self {
            key_fingerprint: req.api_key.fingerprint(),
            call_data: req.call_data.clone(),
            chain_id: req.chain_id,
        }
    }
}

impl fmt::Debug for SimulationKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SimulationKey")
            .field("key", &format_args!("{}…", hex::encode(&self.key_fingerprint[..4])))
            .field("call_data_len", &self.call_data.len())
            .field("chain_id", &self.chain_id)
            .finish()
    }
}

/// Simulates transactions, reusing results for identical requests made
/// within the freshness window.
///
/// Only successful exchanges are cached. A response carrying an in-band
/// `error` is a successful exchange; a transport failure is not.
pub struct SimulationClient {
    api: Arc<dyn SimApi>,
    cache: TtlCache<SimulationKey, SimulationResult>,
}

impl SimulationClient {
    /// Client with the default 300 s freshness window.
    pub fn new(api: Arc<dyn SimApi>) -> Self {
        Self::with_ttl(api, DEFAULT_SIMULATION_TTL)
    }

    pub fn with_ttl(api: Arc<dyn SimApi>, ttl: Duration) -> Self {
        Self { api, cache: TtlCache::with_ttl(ttl) }
    }

    /// Simulate `req`.
    ///
    /// The caller is expected to have checked the call data with
    /// [`crate::types::validate_call_data`].
    pub async fn simulate(&self, req: &SimulationRequest) -> Result<SimulationResult, TransportError> {
        let key = SimulationKey::of(req);
        if let Some(hit) = self.cache.get(&key) {
            tracing::debug!(?key, "simulation cache hit");
            return Ok(hit);
        }

        tracing::debug!(?key, service = self.api.name(), "simulating transaction");
        let result = self.api.simulate(req).await?;
        self.cache.insert(key, result.clone());
        Ok(result)
    }

    pub fn cache(&self) -> &TtlCache<SimulationKey, SimulationResult> {
        &self.cache
    }
}

impl fmt::Debug for SimulationClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SimulationClient")
            .field("service", &self.api.name())
            .field("cache", &self.cache)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ApiKey;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Counts calls; fails when `fail` is set.
    #[derive(Default)]
    struct CountingApi {
        calls: AtomicUsize,
        fail: bool,
    }

    #[async_trait]
    impl SimApi for CountingApi {
        async fn simulate(&self, req: &SimulationRequest) -> Result<SimulationResult, TransportError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(TransportError::Http("connection refused".into()));
            }
            Ok(SimulationResult {
                success: true,
                gas_used: Some(req.chain_id),
                ..Default::default()
            })
        }

        async fn nft_image(
            &self,
            _api_key: &ApiKey,
            _contract_address: &str,
            _token_id: &str,
        ) -> Result<Option<Vec<u8>>, TransportError> {
            Ok(None)
        }

        fn name(&self) -> &str {
            "counting"
        }
    }

    fn req(key: &str, data: &str, chain: u64) -> SimulationRequest {
        SimulationRequest::new(ApiKey::new(key), data, chain)
    }

    #[tokio::test]
    async fn identical_requests_hit_remote_once() {
        let api = Arc::new(CountingApi::default());
        let client = SimulationClient::new(api.clone());

        let a = client.simulate(&req("k", "0xabcd", 1)).await.unwrap();
        let b = client.simulate(&req("k", "0xabcd", 1)).await.unwrap();
        assert_eq!(a, b);
        assert_eq!(api.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn each_key_component_is_distinct() {
        let api = Arc::new(CountingApi::default());
        let client = SimulationClient::new(api.clone());

        client.simulate(&req("k", "0xabcd", 1)).await.unwrap();
        client.simulate(&req("other", "0xabcd", 1)).await.unwrap();
        client.simulate(&req("k", "0xabce", 1)).await.unwrap();
        client.simulate(&req("k", "0xabcd", 137)).await.unwrap();
        assert_eq!(api.calls.load(Ordering::SeqCst), 4);
        assert_eq!(client.cache().len(), 4);
    }

    #[tokio::test]
    async fn expired_entries_are_refetched() {
        let api = Arc::new(CountingApi::default());
        let client = SimulationClient::with_ttl(api.clone(), Duration::from_millis(40));

        client.simulate(&req("k", "0x01", 1)).await.unwrap();
        client.simulate(&req("k", "0x01", 1)).await.unwrap();
        assert_eq!(api.calls.load(Ordering::SeqCst), 1);

        tokio::time::sleep(Duration::from_millis(80)).await;
        client.simulate(&req("k", "0x01", 1)).await.unwrap();
        assert_eq!(api.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn zero_ttl_never_reuses() {
        let api = Arc::new(CountingApi::default());
        let client = SimulationClient::with_ttl(api.clone(), Duration::ZERO);
        client.simulate(&req("k", "0x01", 1)).await.unwrap();
        client.simulate(&req("k", "0x01", 1)).await.unwrap();
        assert_eq!(api.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn transport_failures_are_not_cached() {
        let api = Arc::new(CountingApi { fail: true, ..Default::default() });
        let client = SimulationClient::new(api.clone());

        assert!(client.simulate(&req("k", "0x01", 1)).await.is_err());
        assert!(client.simulate(&req("k", "0x01", 1)).await.is_err());
        assert_eq!(api.calls.load(Ordering::SeqCst), 2);
        assert!(client.cache().is_empty());
    }

    #[test]
    fn cache_key_debug_does_not_leak_api_key() {
        let key = SimulationKey::of(&req("sim_super_secret", "0x01", 1));
        let dbg = format!("{key:?}");
        assert!(!dbg.contains("sim_super_secret"));
        assert!(dbg.contains("chain_id: 1"));
    }
}
