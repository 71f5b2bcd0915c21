//! Shared domain types: staking transaction kinds, supported networks and the
//! persisted expiry record.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// State a staking position was in when its timelock entry was recorded.
/// Carried from the store through to the published event payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StakingTxType {
    Active,
    Unbonding,
}

impl StakingTxType {
    pub fn as_str(&self) -> &'static str {
        match self {
            StakingTxType::Active => "active",
            StakingTxType::Unbonding => "unbonding",
        }
    }
}

impl fmt::Display for StakingTxType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StakingTxType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(StakingTxType::Active),
            "unbonding" => Ok(StakingTxType::Unbonding),
            other => Err(format!("unknown staking tx type: {other}")),
        }
    }
}

/// Bitcoin networks accepted by the `net-params` config field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SupportedBtcNetwork {
    Mainnet,
    Testnet,
    Simnet,
    Regtest,
    Signet,
}

impl SupportedBtcNetwork {
    pub fn as_str(&self) -> &'static str {
        match self {
            SupportedBtcNetwork::Mainnet => "mainnet",
            SupportedBtcNetwork::Testnet => "testnet",
            SupportedBtcNetwork::Simnet => "simnet",
            SupportedBtcNetwork::Regtest => "regtest",
            SupportedBtcNetwork::Signet => "signet",
        }
    }
}

impl fmt::Display for SupportedBtcNetwork {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SupportedBtcNetwork {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "mainnet" => Ok(SupportedBtcNetwork::Mainnet),
            "testnet" => Ok(SupportedBtcNetwork::Testnet),
            "simnet" => Ok(SupportedBtcNetwork::Simnet),
            "regtest" => Ok(SupportedBtcNetwork::Regtest),
            "signet" => Ok(SupportedBtcNetwork::Signet),
            other => Err(format!("invalid net params: {other}")),
        }
    }
}

/// One staking position pending expiry, keyed by its staking tx hash.
///
/// Created by the external ingestion pipeline, read during each poll cycle,
/// deleted only after the matching event has been confirmed by the broker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExpiryRecord {
    pub staking_tx_hash_hex: String,
    pub expire_height: u64,
    pub tx_type: StakingTxType,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn staking_tx_type_round_trips() {
        for (s, t) in [
            ("active", StakingTxType::Active),
            ("unbonding", StakingTxType::Unbonding),
        ] {
            assert_eq!(s.parse::<StakingTxType>().unwrap(), t);
            assert_eq!(t.as_str(), s);
        }
        assert!("withdrawn".parse::<StakingTxType>().is_err());
    }

    #[test]
    fn network_parsing() {
        assert_eq!(
            "signet".parse::<SupportedBtcNetwork>().unwrap(),
            SupportedBtcNetwork::Signet
        );
        assert!("liquid".parse::<SupportedBtcNetwork>().is_err());
    }
}
