//! txsim-core: foundation types for the txsim transaction simulator.
//!
//! This crate defines:
//! - [`chain`]: the chain name → chain id registry
//! - [`SimulationRequest`] / [`SimulationResult`]: the simulation wire types
//! - [`DecodedCall`]: ABI decode outcome (decoded or raw passthrough)
//! - [`classify`]: heuristic risk flags over a result
//! - [`TtlCache`]: the cache behind both clients
//! - [`SimApi`]: the remote service trait, with [`SimulationClient`] and
//!   [`NftImageFetcher`] layering caching on top

pub mod cache;
pub mod call;
pub mod chain;
pub mod client;
pub mod error;
pub mod nft;
pub mod risk;
pub mod transport;
pub mod types;

pub use cache::TtlCache;
pub use call::{DecodeFailure, DecodedCall, FunctionCall, ParamValue, RawCall};
pub use chain::{chain_id, chain_name, list_chains, ChainEntry};
pub use client::{SimulationClient, DEFAULT_SIMULATION_TTL};
pub use error::{InputError, LookupError, TransportError};
pub use nft::{ImageFormat, NftImage, NftImageFetcher, NftPreview, MAX_NFT_PREVIEWS};
pub use risk::{classify, RiskWarning, HIGH_GAS_THRESHOLD};
pub use transport::SimApi;
pub use types::{validate_call_data, ApiKey, NftTransfer, SimulationRequest, SimulationResult};
