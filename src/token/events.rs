//! Ledger events
//!
//! Mirrors the ERC-20 `Transfer` and `Approval` logs. Events are recorded
//! only for committed calls.

use alloy_primitives::{Address, U256};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Transfer event (emitted when tokens move, including initial issuance)
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct TransferEvent {
    pub from: Address,
    pub to: Address,
    pub value: U256,
    pub timestamp: DateTime<Utc>,
}

impl TransferEvent {
    pub fn new(from: Address, to: Address, value: U256) -> Self {
        Self {
            from,
            to,
            value,
            timestamp: Utc::now(),
        }
    }
}

/// Approval event (emitted when an allowance is set)
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct ApprovalEvent {
    pub owner: Address,
    pub spender: Address,
    pub value: U256,
    pub timestamp: DateTime<Utc>,
}

impl ApprovalEvent {
    pub fn new(owner: Address, spender: Address, value: U256) -> Self {
        Self {
            owner,
            spender,
            value,
            timestamp: Utc::now(),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LedgerEvent {
    Transfer(TransferEvent),
    Approval(ApprovalEvent),
}

impl LedgerEvent {
    pub fn timestamp(&self) -> DateTime<Utc> {
        match self {
            LedgerEvent::Transfer(e) => e.timestamp,
            LedgerEvent::Approval(e) => e.timestamp,
        }
    }
}

impl fmt::Display for LedgerEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LedgerEvent::Transfer(e) => {
                write!(f, "Transfer {} -> {}: {}", e.from, e.to, e.value)
            }
            LedgerEvent::Approval(e) => {
                write!(f, "Approval {} -> {}: {}", e.owner, e.spender, e.value)
            }
        }
    }
}
