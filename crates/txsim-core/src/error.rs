//! Error types for txsim.
//!
//! ABI decode failures are not here: the decoder never returns an error,
//! it reports a [`crate::call::DecodeFailure`] inside the
//! passthrough variant of [`crate::call::DecodedCall`].

use thiserror::Error;

/// Chain registry lookup failure.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LookupError {
    #[error("Unknown chain: {name}")]
    UnknownChain { name: String },
}

/// User input rejected before any network call is made.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InputError {
    #[error("Transaction data must start with '0x'")]
    MissingHexPrefix,

    #[error("{field} is required")]
    Empty { field: &'static str },
}

/// Failure talking to the remote simulation service.
///
/// An `error` field inside an otherwise well-formed response is *not* a
/// transport error; it is surfaced as data on
/// [`crate::types::SimulationResult`].
#[derive(Debug, Error)]
pub enum TransportError {
    /// Connection refused, DNS failure, timeout, TLS error, …
    #[error("HTTP error: {0}")]
    Http(String),

    /// The service answered with a non-2xx status.
    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },

    /// The response body was not the expected JSON.
    #[error("Malformed response body: {0}")]
    Decode(String),
}

impl TransportError {
    /// Returns `true` for connection-level failures (no response received).
    pub fn is_connect(&self) -> bool {
        matches!(self, Self::Http(_))
    }

    /// HTTP status code, if the service responded at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for TransportError {
    fn from(e: serde_json::Error) -> Self {
        Self::Decode(e.to_string())
    }
}
