//! Decoded call data.
//!
//! [`DecodedCall`] is a tagged union: either the call was resolved against
//! an ABI ([`DecodedCall::Decoded`]) or the raw input is passed through
//! unchanged ([`DecodedCall::Raw`]). The raw variant remembers why decoding
//! did not happen, so a failed decode can never be mistaken for a
//! successful one.

use indexmap::IndexMap;
use serde::ser::{Error as _, SerializeMap, Serializer};
use serde::Serialize;
use std::fmt;
use thiserror::Error;

// ─── ParamValue ───────────────────────────────────────────────────────────────

/// A decoded ABI parameter value.
#[derive(Debug, Clone, PartialEq)]
pub enum ParamValue {
    Uint(u128),
    /// Uints wider than 128 bits, as a decimal string.
    BigUint(String),
    Int(i128),
    /// Ints wider than 128 bits, as a decimal string.
    BigInt(String),
    Bool(bool),
    /// `0x`-prefixed 20-byte address.
    Address(String),
    Bytes(Vec<u8>),
    Str(String),
    Array(Vec<ParamValue>),
    Tuple(Vec<(String, ParamValue)>),
}

impl ParamValue {
    pub fn as_address(&self) -> Option<&str> {
        match self {
            Self::Address(a) => Some(a.as_str()),
            _ => None,
        }
    }

    pub fn as_u128(&self) -> Option<u128> {
        match self {
            Self::Uint(v) => Some(*v),
            _ => None,
        }
    }
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Uint(v) => write!(f, "{v}"),
            Self::BigUint(v) => write!(f, "{v}"),
            Self::Int(v) => write!(f, "{v}"),
            Self::BigInt(v) => write!(f, "{v}"),
            Self::Bool(v) => write!(f, "{v}"),
            Self::Address(a) => write!(f, "{a}"),
            Self::Bytes(b) => write!(f, "0x{}", hex::encode(b)),
            Self::Str(s) => write!(f, "{s}"),
            Self::Array(v) => {
                let parts: Vec<_> = v.iter().map(|x| x.to_string()).collect();
                write!(f, "[{}]", parts.join(", "))
            }
            Self::Tuple(fields) => {
                let parts: Vec<_> = fields.iter().map(|(k, v)| format!("{k}: {v}")).collect();
                write!(f, "{{{}}}", parts.join(", "))
            }
        }
    }
}

/// Natural JSON: integers of any width are JSON numbers (full precision
/// needs serde_json's `arbitrary_precision`), bytes are `0x` hex, tuples are
/// objects.
impl Serialize for ParamValue {
    fn serialize<S: Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Uint(v) => match u64::try_from(*v) {
                Ok(small) => s.serialize_u64(small),
                Err(_) => serialize_number(&v.to_string(), s),
            },
            Self::Int(v) => match i64::try_from(*v) {
                Ok(small) => s.serialize_i64(small),
                Err(_) => serialize_number(&v.to_string(), s),
            },
            Self::BigUint(v) | Self::BigInt(v) => serialize_number(v, s),
            Self::Bool(b) => s.serialize_bool(*b),
            Self::Address(a) => s.serialize_str(a),
            Self::Bytes(b) => s.serialize_str(&format!("0x{}", hex::encode(b))),
            Self::Str(v) => s.serialize_str(v),
            Self::Array(items) => s.collect_seq(items),
            Self::Tuple(fields) => {
                let mut map = s.serialize_map(Some(fields.len()))?;
                for (k, v) in fields {
                    map.serialize_entry(k, v)?;
                }
                map.end()
            }
        }
    }
}

/// Emit a decimal integer string as a JSON number, digits untouched.
fn serialize_number<S: Serializer>(digits: &str, s: S) -> Result<S::Ok, S::Error> {
    let n: serde_json::Number = serde_json::from_str(digits).map_err(S::Error::custom)?;
    n.serialize(s)
}

// ─── DecodeFailure ────────────────────────────────────────────────────────────

/// Why an ABI decode attempt fell back to the raw call data.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeFailure {
    #[error("invalid ABI JSON: {reason}")]
    InvalidAbi { reason: String },

    #[error("call data is not valid hex: {reason}")]
    InvalidHex { reason: String },

    #[error("call data too short: {len} bytes (need at least 4 for selector)")]
    CallDataTooShort { len: usize },

    #[error("no function in ABI matches selector 0x{selector}")]
    SelectorNotFound { selector: String },

    #[error("unsupported parameter type '{ty}': {reason}")]
    UnsupportedType { ty: String, reason: String },

    #[error("ABI decode failed for {signature}: {reason}")]
    AbiDecode { signature: String, reason: String },
}

// ─── DecodedCall ──────────────────────────────────────────────────────────────

/// A call resolved against an ABI.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FunctionCall {
    /// Function name, e.g. `"transfer"`.
    pub function: String,
    /// Canonical signature, e.g. `"transfer(address,uint256)"`.
    pub signature: String,
    /// 4-byte selector as `0x`-prefixed hex.
    #[serde(serialize_with = "serialize_selector")]
    pub selector: [u8; 4],
    /// Decoded inputs keyed by parameter name, in declaration order.
    pub params: IndexMap<String, ParamValue>,
}

impl FunctionCall {
    pub fn selector_hex(&self) -> String {
        format!("0x{}", hex::encode(self.selector))
    }

    pub fn param(&self, name: &str) -> Option<&ParamValue> {
        self.params.get(name)
    }
}

impl fmt::Display for FunctionCall {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let args: Vec<_> = self.params.iter().map(|(k, v)| format!("{k}={v}")).collect();
        write!(f, "{}({})", self.function, args.join(", "))
    }
}

/// Raw call data passed through unchanged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawCall {
    /// The caller's input, byte-identical.
    pub data: String,
    /// `None` when no decode was requested; `Some` when an attempt failed.
    pub failure: Option<DecodeFailure>,
}

/// Outcome of ABI decoding.
#[derive(Debug, Clone, PartialEq)]
pub enum DecodedCall {
    Decoded(FunctionCall),
    Raw(RawCall),
}

impl DecodedCall {
    /// Passthrough without a decode attempt.
    pub fn passthrough(data: impl Into<String>) -> Self {
        Self::Raw(RawCall { data: data.into(), failure: None })
    }

    /// Passthrough after a failed decode attempt.
    pub fn failed(data: impl Into<String>, failure: DecodeFailure) -> Self {
        Self::Raw(RawCall { data: data.into(), failure: Some(failure) })
    }

    pub fn is_decoded(&self) -> bool {
        matches!(self, Self::Decoded(_))
    }

    pub fn as_decoded(&self) -> Option<&FunctionCall> {
        match self {
            Self::Decoded(call) => Some(call),
            Self::Raw(_) => None,
        }
    }

    /// The failure diagnostic, if a decode attempt failed.
    pub fn failure(&self) -> Option<&DecodeFailure> {
        match self {
            Self::Raw(raw) => raw.failure.as_ref(),
            Self::Decoded(_) => None,
        }
    }
}

/// `Decoded` → `{"function", "signature", "selector", "params"}`;
/// `Raw` → the raw call data string.
impl Serialize for DecodedCall {
    fn serialize<S: Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Decoded(call) => call.serialize(s),
            Self::Raw(raw) => s.serialize_str(&raw.data),
        }
    }
}

fn serialize_selector<S: Serializer>(sel: &[u8; 4], s: S) -> Result<S::Ok, S::Error> {
    s.serialize_str(&format!("0x{}", hex::encode(sel)))
}
