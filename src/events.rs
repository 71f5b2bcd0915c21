//! Staking event family shared with downstream consumers.
//!
//! Four event kinds exist (active, unbonding, withdraw, expired), each with
//! its own dedicated queue. This service only ever publishes
//! [`ExpiredStakingEvent`]; the rest of the family is defined here so the
//! `event_type` tag space and wire schema stay in one place.

use serde::{Deserialize, Serialize};

use crate::types::StakingTxType;

pub const ACTIVE_STAKING_QUEUE_NAME: &str = "active_staking_queue";
pub const UNBONDING_STAKING_QUEUE_NAME: &str = "unbonding_staking_queue";
pub const WITHDRAW_STAKING_QUEUE_NAME: &str = "withdraw_staking_queue";
pub const EXPIRED_STAKING_QUEUE_NAME: &str = "expired_staking_queue";

/// Integer discriminant carried in every event payload as `event_type`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum EventType {
    ActiveStaking = 1,
    UnbondingStaking = 2,
    WithdrawStaking = 3,
    ExpiredStaking = 4,
}

impl From<EventType> for u8 {
    fn from(event_type: EventType) -> u8 {
        event_type as u8
    }
}

impl TryFrom<u8> for EventType {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(EventType::ActiveStaking),
            2 => Ok(EventType::UnbondingStaking),
            3 => Ok(EventType::WithdrawStaking),
            4 => Ok(EventType::ExpiredStaking),
            other => Err(format!("unknown event type: {other}")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActiveStakingEvent {
    pub event_type: EventType,
    pub staking_tx_hash_hex: String,
    pub staker_pk_hex: String,
    pub finality_provider_pk_hex: String,
    pub staking_value: u64,
    pub staking_start_height: u64,
    pub staking_start_timestamp: String,
    pub staking_timelock: u64,
    pub staking_output_index: u64,
    pub staking_tx_hex: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnbondingStakingEvent {
    pub event_type: EventType,
    pub staking_tx_hash_hex: String,
    pub unbonding_start_height: u64,
    pub unbonding_start_timestamp: String,
    pub unbonding_timelock: u64,
    pub unbonding_output_index: u64,
    pub unbonding_tx_hex: String,
    pub unbonding_tx_hash_hex: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WithdrawStakingEvent {
    pub event_type: EventType,
    pub staking_tx_hash_hex: String,
}

impl WithdrawStakingEvent {
    pub fn new(staking_tx_hash_hex: String) -> Self {
        Self {
            event_type: EventType::WithdrawStaking,
            staking_tx_hash_hex,
        }
    }
}

/// Announces that a staking position's timelock has elapsed. Immutable once
/// constructed; serialized exactly once per publish attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpiredStakingEvent {
    pub event_type: EventType,
    pub staking_tx_hash_hex: String,
    pub tx_type: StakingTxType,
}

impl ExpiredStakingEvent {
    pub fn new(staking_tx_hash_hex: String, tx_type: StakingTxType) -> Self {
        Self {
            event_type: EventType::ExpiredStaking,
            staking_tx_hash_hex,
            tx_type,
        }
    }
}

/// The full event family as one sum type. Decoding dispatches on the
/// `event_type` tag so a withdraw payload can never be mistaken for an
/// expired one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum StakingEvent {
    Active(ActiveStakingEvent),
    Unbonding(UnbondingStakingEvent),
    Withdraw(WithdrawStakingEvent),
    Expired(ExpiredStakingEvent),
}

impl StakingEvent {
    pub fn from_json(body: &str) -> Result<Self, serde_json::Error> {
        #[derive(Deserialize)]
        struct Tagged {
            event_type: EventType,
        }

        let tagged: Tagged = serde_json::from_str(body)?;
        Ok(match tagged.event_type {
            EventType::ActiveStaking => StakingEvent::Active(serde_json::from_str(body)?),
            EventType::UnbondingStaking => StakingEvent::Unbonding(serde_json::from_str(body)?),
            EventType::WithdrawStaking => StakingEvent::Withdraw(serde_json::from_str(body)?),
            EventType::ExpiredStaking => StakingEvent::Expired(serde_json::from_str(body)?),
        })
    }

    pub fn event_type(&self) -> EventType {
        match self {
            StakingEvent::Active(e) => e.event_type,
            StakingEvent::Unbonding(e) => e.event_type,
            StakingEvent::Withdraw(e) => e.event_type,
            StakingEvent::Expired(e) => e.event_type,
        }
    }

    pub fn staking_tx_hash_hex(&self) -> &str {
        match self {
            StakingEvent::Active(e) => &e.staking_tx_hash_hex,
            StakingEvent::Unbonding(e) => &e.staking_tx_hash_hex,
            StakingEvent::Withdraw(e) => &e.staking_tx_hash_hex,
            StakingEvent::Expired(e) => &e.staking_tx_hash_hex,
        }
    }
}
