//! Chain registry: display name → EVM chain id.
//!
//! The table is configuration, not derived logic: it lists the chains the
//! Dune SIM simulation endpoint accepts, in the order they are offered to
//! the user.

use serde::Serialize;
use std::fmt;

use crate::error::LookupError;

/// A named EVM chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct ChainEntry {
    /// Human-readable name shown in the chain selector (e.g. `"Ethereum"`).
    pub name: &'static str,
    /// Canonical EIP-155 chain id.
    pub chain_id: u64,
}

impl ChainEntry {
    const fn new(name: &'static str, chain_id: u64) -> Self {
        Self { name, chain_id }
    }
}

impl fmt::Display for ChainEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.chain_id)
    }
}

/// Every supported chain, in selector order.
pub const CHAINS: &[ChainEntry] = &[
    ChainEntry::new("Ethereum", 1),
    ChainEntry::new("Polygon", 137),
    ChainEntry::new("BNB Smart Chain", 56),
    ChainEntry::new("Arbitrum", 42161),
    ChainEntry::new("Optimism", 10),
    ChainEntry::new("Avalanche C-Chain", 43114),
    ChainEntry::new("Fantom", 250),
    ChainEntry::new("Celo", 42220),
    ChainEntry::new("Gnosis (xDAI)", 100),
    ChainEntry::new("zkSync Era", 324),
    ChainEntry::new("Base", 8453),
    ChainEntry::new("Linea", 59144),
    ChainEntry::new("Polygon zkEVM", 1101),
    ChainEntry::new("Scroll", 534352),
    ChainEntry::new("Mantle", 5000),
    ChainEntry::new("Kava", 2222),
    ChainEntry::new("Metis", 1088),
    ChainEntry::new("Moonbeam", 1284),
    ChainEntry::new("Moonriver", 1285),
    ChainEntry::new("Harmony", 1666600000),
    ChainEntry::new("Cronos", 25),
    ChainEntry::new("Aurora", 1313161554),
];

/// The chain preselected when the user does not pick one.
pub const DEFAULT_CHAIN: &str = "Ethereum";

/// All registered chains, in display order.
pub fn list_chains() -> &'static [ChainEntry] {
    CHAINS
}

/// Look up the chain id for a display name (exact match).
pub fn chain_id(name: &str) -> Result<u64, LookupError> {
    CHAINS
        .iter()
        .find(|c| c.name == name)
        .map(|c| c.chain_id)
        .ok_or_else(|| LookupError::UnknownChain { name: name.to_string() })
}

/// Reverse lookup: display name for a chain id.
pub fn chain_name(chain_id: u64) -> Option<&'static str> {
    CHAINS
        .iter()
        .find(|c| c.chain_id == chain_id)
        .map(|c| c.name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn registry_has_22_unique_chains() {
        assert_eq!(list_chains().len(), 22);
        let names: HashSet<_> = CHAINS.iter().map(|c| c.name).collect();
        let ids: HashSet<_> = CHAINS.iter().map(|c| c.chain_id).collect();
        assert_eq!(names.len(), 22);
        assert_eq!(ids.len(), 22);
    }

    #[test]
    fn every_name_resolves_to_its_id() {
        for entry in list_chains() {
            assert_eq!(chain_id(entry.name).unwrap(), entry.chain_id);
        }
    }

    #[test]
    fn canonical_ids() {
        assert_eq!(chain_id("Ethereum").unwrap(), 1);
        assert_eq!(chain_id("BNB Smart Chain").unwrap(), 56);
        assert_eq!(chain_id("Gnosis (xDAI)").unwrap(), 100);
        assert_eq!(chain_id("Harmony").unwrap(), 1_666_600_000);
        assert_eq!(chain_id("Aurora").unwrap(), 1_313_161_554);
    }

    #[test]
    fn unknown_chain_is_an_error() {
        let err = chain_id("Solana").unwrap_err();
        assert!(matches!(err, LookupError::UnknownChain { ref name } if name == "Solana"));
        // lookup is exact, not case-insensitive
        assert!(chain_id("ethereum").is_err());
    }

    #[test]
    fn reverse_lookup() {
        assert_eq!(chain_name(8453), Some("Base"));
        assert_eq!(chain_name(999_999), None);
    }

    #[test]
    fn default_chain_is_registered() {
        assert!(chain_id(DEFAULT_CHAIN).is_ok());
        assert_eq!(CHAINS[0].name, DEFAULT_CHAIN);
    }
}
