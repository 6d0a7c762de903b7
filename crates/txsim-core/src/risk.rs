//! Heuristic risk flags over a simulation result.
//!
//! Threshold and presence checks only: the classifier never inspects what
//! was approved or to whom.

use serde::Serialize;
use serde_json::Value;
use std::fmt;

use crate::types::SimulationResult;

/// Gas above this (strictly greater) is flagged.
pub const HIGH_GAS_THRESHOLD: u64 = 500_000;

/// A risk flag raised for a simulated transaction.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RiskWarning {
    HighGas { gas_used: u64 },
    /// `details` is the service's `approvals` field, verbatim.
    NewApprovals { details: Value },
}

impl fmt::Display for RiskWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::HighGas { .. } => write!(f, "High gas usage (>500k)"),
            Self::NewApprovals { .. } => write!(f, "New token approvals detected"),
        }
    }
}

/// Classify a result. Gas warning (if any) comes before the approvals warning.
pub fn classify(result: &SimulationResult) -> Vec<RiskWarning> {
    let mut risks = Vec::new();

    let gas_used = result.gas_used_or_zero();
    if gas_used > HIGH_GAS_THRESHOLD {
        risks.push(RiskWarning::HighGas { gas_used });
    }
    if let Some(details) = &result.approvals {
        risks.push(RiskWarning::NewApprovals { details: details.clone() });
    }

    risks
}
