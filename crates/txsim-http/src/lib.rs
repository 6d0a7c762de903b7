//! txsim-http: Dune SIM transport for txsim.
//!
//! Implements [`txsim_core::SimApi`] over HTTPS with `reqwest`.

pub mod client;

pub use client::{HttpSimApi, HttpSimApiConfig, DEFAULT_NFT_BASE_URL, DEFAULT_SIMULATE_URL};
