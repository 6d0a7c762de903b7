//! Converts alloy-core `DynSolValue` → txsim `ParamValue`.

use alloy_core::dyn_abi::DynSolValue;
use alloy_json_abi::Param;
use txsim_core::call::ParamValue;

/// Convert a decoded `DynSolValue` into a `ParamValue`.
pub fn normalize(val: DynSolValue) -> ParamValue {
    match val {
        DynSolValue::Bool(b) => ParamValue::Bool(b),

        DynSolValue::Int(i, _bits) => match i128::try_from(i) {
            Ok(v) => ParamValue::Int(v),
            Err(_) => ParamValue::BigInt(i.to_string()),
        },

        DynSolValue::Uint(u, _bits) => match u128::try_from(u) {
            Ok(v) => ParamValue::Uint(v),
            Err(_) => ParamValue::BigUint(u.to_string()),
        },

        // bytesN is right-padded to 32 bytes on the wire; keep only N
        DynSolValue::FixedBytes(word, size) => ParamValue::Bytes(word[..size.min(32)].to_vec()),

        DynSolValue::Bytes(b) => ParamValue::Bytes(b),

        DynSolValue::String(s) => ParamValue::Str(s),

        DynSolValue::Address(a) => ParamValue::Address(format!("{a:#x}")),

        DynSolValue::Array(vals) | DynSolValue::FixedArray(vals) => {
            ParamValue::Array(vals.into_iter().map(normalize).collect())
        }

        DynSolValue::Tuple(fields) => ParamValue::Tuple(
            fields
                .into_iter()
                .enumerate()
                .map(|(i, v)| (i.to_string(), normalize(v)))
                .collect(),
        ),

        DynSolValue::Function(f) => ParamValue::Bytes(f.to_vec()),
    }
}

/// Like [`normalize`], but names tuple fields after the ABI components
/// (`struct` members) instead of their positions.
pub fn normalize_with_components(val: DynSolValue, components: &[Param]) -> ParamValue {
    if components.is_empty() {
        return normalize(val);
    }
    match val {
        DynSolValue::Tuple(fields) if fields.len() == components.len() => ParamValue::Tuple(
            fields
                .into_iter()
                .zip(components)
                .enumerate()
                .map(|(i, (v, p))| (field_name(&p.name, i), normalize_with_components(v, &p.components)))
                .collect(),
        ),
        // tuple[] / tuple[N]: components describe each element
        DynSolValue::Array(vals) | DynSolValue::FixedArray(vals) => ParamValue::Array(
            vals.into_iter()
                .map(|v| normalize_with_components(v, components))
                .collect(),
        ),
        other => normalize(other),
    }
}

/// Declared name, or `arg{index}` for unnamed parameters.
pub fn param_name(name: &str, index: usize) -> String {
    if name.is_empty() {
        format!("arg{index}")
    } else {
        name.to_string()
    }
}

fn field_name(name: &str, index: usize) -> String {
    if name.is_empty() {
        index.to_string()
    } else {
        name.to_string()
    }
}
