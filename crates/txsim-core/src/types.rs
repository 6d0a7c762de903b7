//! Request and response types for the simulation service.

use serde::de::{Deserializer, Error as _};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use tiny_keccak::{Hasher, Keccak};

use crate::error::InputError;

// ─── ApiKey ───────────────────────────────────────────────────────────────────

/// A Dune SIM API key.
///
/// Held in memory only. `Debug` and `Display` print a redacted placeholder,
/// so requests and cache keys can be logged freely.
#[derive(Clone, PartialEq, Eq)]
pub struct ApiKey(String);

impl ApiKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    /// The secret itself. Only transports should call this.
    pub fn expose(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }

    /// keccak256 of the key; used to key caches per API key without
    /// keeping the key text in the key.
    pub fn fingerprint(&self) -> [u8; 32] {
        let mut k = Keccak::v256();
        k.update(self.0.as_bytes());
        let mut out = [0u8; 32];
        k.finalize(&mut out);
        out
    }
}

impl fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ApiKey(<redacted>)")
    }
}

impl fmt::Display for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("<redacted>")
    }
}

// ─── Input validation ─────────────────────────────────────────────────────────

/// Check that call data has the shape the simulation endpoint expects.
///
/// This is the caller's precondition for [`crate::client::SimulationClient::simulate`];
/// the client itself does not re-check it.
pub fn validate_call_data(call_data: &str) -> Result<(), InputError> {
    if call_data.trim().is_empty() {
        return Err(InputError::Empty { field: "Transaction data" });
    }
    if !call_data.starts_with("0x") {
        return Err(InputError::MissingHexPrefix);
    }
    Ok(())
}

// ─── SimulationRequest ────────────────────────────────────────────────────────

/// One simulation request, built per user action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimulationRequest {
    pub api_key: ApiKey,
    /// `0x`-prefixed transaction input data.
    pub call_data: String,
    pub chain_id: u64,
}

impl SimulationRequest {
    pub fn new(api_key: ApiKey, call_data: impl Into<String>, chain_id: u64) -> Self {
        Self {
            api_key,
            call_data: call_data.into(),
            chain_id,
        }
    }

    /// The JSON body sent to the simulate endpoint.
    pub fn payload(&self) -> SimulatePayload<'_> {
        SimulatePayload {
            transaction: TransactionPayload { data: &self.call_data },
            chain_id: self.chain_id,
        }
    }
}

/// Wire body: `{"transaction": {"data": "0x…"}, "chain_id": 1}`.
#[derive(Debug, Serialize)]
pub struct SimulatePayload<'a> {
    pub transaction: TransactionPayload<'a>,
    pub chain_id: u64,
}

#[derive(Debug, Serialize)]
pub struct TransactionPayload<'a> {
    pub data: &'a str,
}

// ─── SimulationResult ─────────────────────────────────────────────────────────

/// An NFT movement reported by the simulation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NftTransfer {
    pub contract_address: String,
    #[serde(deserialize_with = "string_or_number")]
    pub token_id: String,
    /// Any other fields the service attached (from, to, standard, …).
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl NftTransfer {
    pub fn new(contract_address: impl Into<String>, token_id: impl Into<String>) -> Self {
        Self {
            contract_address: contract_address.into(),
            token_id: token_id.into(),
            extra: Map::new(),
        }
    }
}

/// The simulation service's response.
///
/// Only the fields txsim inspects are typed; everything else is kept in
/// `extra` and serialized back unchanged.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SimulationResult {
    #[serde(default, deserialize_with = "null_as_default")]
    pub success: bool,

    #[serde(default, deserialize_with = "opt_u64", skip_serializing_if = "Option::is_none")]
    pub gas_used: Option<u64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub balance_changes: Option<Vec<Value>>,

    #[serde(default, deserialize_with = "null_as_default")]
    pub nft_transfers: Vec<NftTransfer>,

    /// Presence-checked: `Some(Value::Null)` means the field was sent as `null`.
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub approvals: Option<Value>,

    /// In-band simulation failure reported by the service.
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub error: Option<Value>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl SimulationResult {
    /// Parse a response body.
    pub fn from_json(body: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(body)
    }

    /// Gas used, treating an absent value as zero.
    pub fn gas_used_or_zero(&self) -> u64 {
        self.gas_used.unwrap_or(0)
    }

    /// `true` if the service reported an in-band error.
    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }

    /// The in-band error as display text.
    pub fn error_message(&self) -> Option<String> {
        self.error.as_ref().map(|e| match e {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        })
    }
}

// ─── serde helpers ────────────────────────────────────────────────────────────

/// Wrap whatever is present (including `null`) in `Some`.
/// Combined with `#[serde(default)]` a missing field stays `None`.
fn present<'de, D>(de: D) -> Result<Option<Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Value::deserialize(de).map(Some)
}

/// Token ids arrive as JSON strings or numbers depending on the collection.
fn string_or_number<'de, D>(de: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(de)? {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        other => Err(D::Error::custom(format!(
            "expected string or number, got {other}"
        ))),
    }
}

/// `null` reads as the type's default, like a missing field.
fn null_as_default<'de, D, T>(de: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Option::<T>::deserialize(de).map(Option::unwrap_or_default)
}

/// Gas as a JSON number (integral floats included), a decimal string, or a
/// `0x` hex string. Anything else reads as unknown (`None`) so that one odd
/// field never hides the rest of the response.
fn opt_u64<'de, D>(de: D) -> Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(gas_from_value(&Value::deserialize(de)?))
}

fn gas_from_value(v: &Value) -> Option<u64> {
    let gas = match v {
        Value::Number(n) => n.as_u64().or_else(|| {
            n.as_f64()
                .filter(|f| f.fract() == 0.0 && *f >= 0.0 && *f <= u64::MAX as f64)
                .map(|f| f as u64)
        }),
        Value::String(s) => match s.strip_prefix("0x") {
            Some(hex) => u64::from_str_radix(hex, 16).ok(),
            None => s.parse::<u64>().ok(),
        },
        _ => None,
    };
    if gas.is_none() && !v.is_null() {
        tracing::debug!(value = %v, "unrecognised gas_used value");
    }
    gas
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn api_key_is_redacted() {
        let key = ApiKey::new("sim_live_very_secret");
        let req = SimulationRequest::new(key.clone(), "0x", 1);
        assert_eq!(format!("{key}"), "<redacted>");
        assert!(!format!("{key:?}").contains("secret"));
        assert!(!format!("{req:?}").contains("secret"));
        assert_eq!(key.expose(), "sim_live_very_secret");
    }

    #[test]
    fn api_key_fingerprint_distinguishes_keys() {
        let a = ApiKey::new("a");
        let b = ApiKey::new("b");
        assert_eq!(a.fingerprint(), ApiKey::new("a").fingerprint());
        assert_ne!(a.fingerprint(), b.fingerprint());
    }

    #[test]
    fn validate_requires_hex_prefix() {
        assert!(validate_call_data("0xa9059cbb").is_ok());
        assert_eq!(validate_call_data("a9059cbb"), Err(InputError::MissingHexPrefix));
        assert!(matches!(validate_call_data("  "), Err(InputError::Empty { .. })));
    }

    #[test]
    fn payload_shape() {
        let req = SimulationRequest::new(ApiKey::new("k"), "0xdeadbeef", 137);
        let body = serde_json::to_value(req.payload()).unwrap();
        assert_eq!(body, json!({"transaction": {"data": "0xdeadbeef"}, "chain_id": 137}));
    }

    #[test]
    fn parse_full_result() {
        let body = json!({
            "success": true,
            "gas_used": 21000,
            "balance_changes": [{"address": "0xabc", "delta": "-1"}],
            "nft_transfers": [{"contract_address": "0xnft", "token_id": 7, "standard": "erc721"}],
            "approvals": [],
            "trace_id": "t-1"
        });
        let r: SimulationResult = serde_json::from_value(body).unwrap();
        assert!(r.success);
        assert_eq!(r.gas_used, Some(21000));
        assert_eq!(r.balance_changes.as_ref().map(Vec::len), Some(1));
        assert_eq!(r.nft_transfers[0].token_id, "7");
        assert_eq!(r.nft_transfers[0].extra["standard"], "erc721");
        assert!(r.approvals.is_some());
        assert!(!r.is_error());
        assert_eq!(r.extra["trace_id"], "t-1");
    }

    #[test]
    fn null_fields_count_as_present() {
        let r: SimulationResult =
            serde_json::from_value(json!({"approvals": null, "error": null})).unwrap();
        assert_eq!(r.approvals, Some(Value::Null));
        assert!(r.is_error());
    }

    #[test]
    fn missing_fields_default() {
        let r: SimulationResult = serde_json::from_value(json!({})).unwrap();
        assert!(!r.success);
        assert_eq!(r.gas_used, None);
        assert_eq!(r.gas_used_or_zero(), 0);
        assert!(r.balance_changes.is_none());
        assert!(r.nft_transfers.is_empty());
        assert!(r.approvals.is_none());
        assert!(r.error.is_none());
    }

    #[test]
    fn gas_accepts_strings() {
        let r: SimulationResult = serde_json::from_value(json!({"gas_used": "0x7a120"})).unwrap();
        assert_eq!(r.gas_used, Some(500_000));
        let r: SimulationResult = serde_json::from_value(json!({"gas_used": "42"})).unwrap();
        assert_eq!(r.gas_used, Some(42));
        let r: SimulationResult = serde_json::from_value(json!({"gas_used": 21000.0})).unwrap();
        assert_eq!(r.gas_used, Some(21_000));
    }

    #[test]
    fn odd_gas_values_read_as_unknown() {
        for gas in [json!(-1), json!(1.5), json!("lots"), json!(true), json!({})] {
            let r: SimulationResult = serde_json::from_value(json!({"gas_used": gas})).unwrap();
            assert_eq!(r.gas_used, None, "gas_used = {gas}");
        }
    }

    #[test]
    fn nulls_read_as_defaults() {
        let r = SimulationResult::from_json(
            br#"{"success": null, "gas_used": null, "nft_transfers": null}"#,
        )
        .unwrap();
        assert!(!r.success);
        assert_eq!(r.gas_used, None);
        assert!(r.nft_transfers.is_empty());
    }

    #[test]
    fn in_band_error_survives_loose_sibling_fields() {
        for body in [
            &br#"{"error": "Unsupported chain", "nft_transfers": null}"#[..],
            br#"{"error": "Unsupported chain", "success": null}"#,
            br#"{"error": "Unsupported chain", "gas_used": 21000.0}"#,
        ] {
            let r = SimulationResult::from_json(body).unwrap();
            assert_eq!(r.error_message().as_deref(), Some("Unsupported chain"));
        }
    }

    #[test]
    fn error_message_text() {
        let r: SimulationResult =
            serde_json::from_value(json!({"error": "unsupported chain"})).unwrap();
        assert_eq!(r.error_message().as_deref(), Some("unsupported chain"));

        let r: SimulationResult =
            serde_json::from_value(json!({"error": {"code": 400}})).unwrap();
        assert_eq!(r.error_message().as_deref(), Some(r#"{"code":400}"#));
    }

    #[test]
    fn unknown_fields_pass_through() {
        let body = json!({"success": false, "gas_used": 1, "logs": [1, 2]});
        let r: SimulationResult = serde_json::from_value(body.clone()).unwrap();
        let back = serde_json::to_value(&r).unwrap();
        assert_eq!(back["logs"], json!([1, 2]));
        assert_eq!(back["gas_used"], 1);
    }
}
