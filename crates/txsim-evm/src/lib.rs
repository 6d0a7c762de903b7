//! txsim-evm: ABI-based call data decoding for txsim.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use txsim_evm::decode;
//!
//! let abi = r#"[{"type":"function","name":"transfer","inputs":[{"name":"to","type":"address"},{"name":"value","type":"uint256"}],"outputs":[],"stateMutability":"nonpayable"}]"#;
//! let decoded = decode("0xa9059cbb000000000000000000000000d8da6bf26964af9d7eed9e03e53415d37aa9604500000000000000000000000000000000000000000000000000000000000f4240", abi);
//! if let Some(call) = decoded.as_decoded() {
//!     println!("{call}"); // transfer(to=0xd8da…6045, value=1000000)
//! }
//! ```

pub mod decoder;
pub mod normalizer;

pub use decoder::{decode, AbiCallDecoder};
