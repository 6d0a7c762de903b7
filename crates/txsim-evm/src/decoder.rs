//! EVM function-call decoder.
//!
//! Decodes transaction `input` data using an ABI JSON definition.
//!
//! # How it works
//! - First 4 bytes of calldata = keccak256(function_signature)[:4] (the selector)
//! - Remaining bytes = ABI-encoded inputs tuple
//! - Overloads share a name but not a selector; matching is by selector only

use alloy_core::dyn_abi::{DynSolType, DynSolValue, Specifier};
use alloy_json_abi::{Function, JsonAbi};
use indexmap::IndexMap;
use txsim_core::call::{DecodeFailure, DecodedCall, FunctionCall, ParamValue};

use crate::normalizer::{normalize_with_components, param_name};

/// Decode `raw_call_data` against `abi_json`, never failing.
///
/// - Empty ABI → the raw input, no decode attempted.
/// - Any failure → the raw input plus the reason, logged at `warn`.
///
/// The raw input is returned byte-identical in both passthrough cases.
pub fn decode(raw_call_data: &str, abi_json: &str) -> DecodedCall {
    if abi_json.trim().is_empty() {
        return DecodedCall::passthrough(raw_call_data);
    }

    let attempt = AbiCallDecoder::from_abi_json(abi_json)
        .and_then(|decoder| decoder.decode_hex(raw_call_data));

    match attempt {
        Ok(call) => DecodedCall::Decoded(call),
        Err(failure) => {
            tracing::warn!(error = %failure, "ABI decoding failed");
            DecodedCall::failed(raw_call_data, failure)
        }
    }
}

/// Strict call data decoder over a parsed ABI.
///
/// Accepts a standard Ethereum ABI JSON string and decodes raw calldata
/// into a [`FunctionCall`]. Event, error and constructor entries in the ABI
/// are accepted and ignored.
pub struct AbiCallDecoder {
    abi: JsonAbi,
}

impl AbiCallDecoder {
    /// Parse a standard ABI JSON array.
    pub fn from_abi_json(abi_json: &str) -> Result<Self, DecodeFailure> {
        let abi: JsonAbi = serde_json::from_str(abi_json).map_err(|e| DecodeFailure::InvalidAbi {
            reason: e.to_string(),
        })?;
        Ok(Self::from_abi(abi))
    }

    /// Wrap an already-parsed ABI.
    pub fn from_abi(abi: JsonAbi) -> Self {
        Self { abi }
    }

    /// Decode `0x`-prefixed (or bare) hex call data.
    pub fn decode_hex(&self, call_data: &str) -> Result<FunctionCall, DecodeFailure> {
        let stripped = call_data.strip_prefix("0x").unwrap_or(call_data);
        let bytes = hex::decode(stripped).map_err(|e| DecodeFailure::InvalidHex {
            reason: e.to_string(),
        })?;
        self.decode_call(&bytes)
    }

    /// Decode a function call from raw calldata bytes (selector included).
    pub fn decode_call(&self, calldata: &[u8]) -> Result<FunctionCall, DecodeFailure> {
        let Some((selector, input_data)) = split_selector(calldata) else {
            return Err(DecodeFailure::CallDataTooShort { len: calldata.len() });
        };

        let func = self.find_function(selector)?;
        let signature = func.signature();

        let types = resolve_input_types(func)?;
        let values = decode_params(input_data, types, &signature)?;

        let params: IndexMap<String, ParamValue> = func
            .inputs
            .iter()
            .zip(values)
            .enumerate()
            .map(|(i, (param, val))| {
                (param_name(&param.name, i), normalize_with_components(val, &param.components))
            })
            .collect();

        Ok(FunctionCall {
            function: func.name.clone(),
            signature,
            selector,
            params,
        })
    }

    /// Find the function whose selector matches. Names are never consulted,
    /// so overloads resolve correctly.
    fn find_function(&self, selector: [u8; 4]) -> Result<&Function, DecodeFailure> {
        self.abi
            .functions()
            .find(|f| f.selector().0 == selector)
            .ok_or_else(|| DecodeFailure::SelectorNotFound {
                selector: hex::encode(selector),
            })
    }

    /// `(selector, signature)` for every function in the ABI, sorted by name.
    pub fn function_signatures(&self) -> Vec<([u8; 4], String)> {
        self.abi
            .functions()
            .map(|f| (f.selector().0, f.signature()))
            .collect()
    }

    /// Returns all function names in this ABI (overloads repeat).
    pub fn function_names(&self) -> Vec<&str> {
        self.abi.functions().map(|f| f.name.as_str()).collect()
    }
}

fn split_selector(calldata: &[u8]) -> Option<([u8; 4], &[u8])> {
    if calldata.len() < 4 {
        return None;
    }
    let (head, rest) = calldata.split_at(4);
    let selector: [u8; 4] = head.try_into().ok()?;
    Some((selector, rest))
}

fn resolve_input_types(func: &Function) -> Result<Vec<DynSolType>, DecodeFailure> {
    func.inputs
        .iter()
        .map(|p| {
            p.resolve().map_err(|e| DecodeFailure::UnsupportedType {
                ty: p.ty.clone(),
                reason: e.to_string(),
            })
        })
        .collect()
}

/// ABI-decode the parameter tuple (static members inline, dynamic members
/// via offset + length).
fn decode_params(
    data: &[u8],
    types: Vec<DynSolType>,
    signature: &str,
) -> Result<Vec<DynSolValue>, DecodeFailure> {
    if types.is_empty() {
        return Ok(vec![]);
    }

    let decoded = DynSolType::Tuple(types)
        .abi_decode_params(data)
        .map_err(|e| DecodeFailure::AbiDecode {
            signature: signature.to_string(),
            reason: e.to_string(),
        })?;

    Ok(match decoded {
        DynSolValue::Tuple(vals) => vals,
        other => vec![other],
    })
}
