//! Serializable form of a ledger
//!
//! Tables are flattened into entry lists so the JSON stays readable and
//! does not depend on map-key encoding. Restoring a snapshot re-checks the
//! invariants, so a hand-edited or truncated file cannot produce a ledger
//! whose balances disagree with its supply.

use crate::token::events::LedgerEvent;
use crate::token::ledger::{Ledger, TokenError, TokenMetadata, MAX_EVENT_HISTORY};
use alloy_primitives::{Address, U256};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, VecDeque};
use thiserror::Error;

/// Errors found while restoring a snapshot
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SnapshotError {
    #[error("Balances sum to {actual}, but recorded supply is {recorded}")]
    SupplyMismatch { recorded: U256, actual: String },
    #[error("The zero address holds a balance")]
    NullBalance,
    #[error("Duplicate balance entry for {0}")]
    DuplicateAccount(Address),
    #[error("Duplicate allowance entry for {owner} -> {spender}")]
    DuplicateAllowance { owner: Address, spender: Address },
    #[error("Recorded supply is zero")]
    ZeroSupply,
    #[error("Invalid metadata: {0}")]
    Metadata(#[from] TokenError),
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct BalanceEntry {
    pub account: Address,
    pub amount: U256,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct AllowanceEntry {
    pub owner: Address,
    pub spender: Address,
    pub amount: U256,
}

/// Committed ledger state as written to disk
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct LedgerSnapshot {
    pub address: Address,
    pub metadata: TokenMetadata,
    pub total_supply: U256,
    pub balances: Vec<BalanceEntry>,
    pub allowances: Vec<AllowanceEntry>,
    #[serde(default)]
    pub events: Vec<LedgerEvent>,
}

impl From<&Ledger> for LedgerSnapshot {
    fn from(ledger: &Ledger) -> Self {
        let mut balances: Vec<BalanceEntry> = ledger
            .holders()
            .into_iter()
            .map(|(account, amount)| BalanceEntry { account, amount })
            .collect();
        balances.sort_by(|a, b| a.account.cmp(&b.account));

        let mut allowances: Vec<AllowanceEntry> = ledger
            .allowances()
            .into_iter()
            .map(|(owner, spender, amount)| AllowanceEntry {
                owner,
                spender,
                amount,
            })
            .collect();
        allowances.sort_by(|a, b| (a.owner, a.spender).cmp(&(b.owner, b.spender)));

        Self {
            address: ledger.address,
            metadata: ledger.metadata.clone(),
            total_supply: ledger.total_supply(),
            balances,
            allowances,
            events: ledger.events().cloned().collect(),
        }
    }
}

impl TryFrom<LedgerSnapshot> for Ledger {
    type Error = SnapshotError;

    fn try_from(snapshot: LedgerSnapshot) -> Result<Self, Self::Error> {
        snapshot.metadata.validate()?;
        if snapshot.total_supply.is_zero() {
            return Err(SnapshotError::ZeroSupply);
        }

        let mut balances = HashMap::new();
        let mut sum = Some(U256::ZERO);

        for entry in snapshot.balances {
            if entry.account == Address::ZERO && !entry.amount.is_zero() {
                return Err(SnapshotError::NullBalance);
            }
            if entry.amount.is_zero() {
                continue;
            }
            if balances.insert(entry.account, entry.amount).is_some() {
                return Err(SnapshotError::DuplicateAccount(entry.account));
            }
            sum = sum.and_then(|s| s.checked_add(entry.amount));
        }

        if sum != Some(snapshot.total_supply) {
            return Err(SnapshotError::SupplyMismatch {
                recorded: snapshot.total_supply,
                actual: sum.map_or_else(|| "more than 2^256 - 1".to_string(), |s| s.to_string()),
            });
        }

        let mut allowances: HashMap<Address, HashMap<Address, U256>> = HashMap::new();
        for entry in snapshot.allowances {
            if entry.amount.is_zero() {
                continue;
            }
            let spenders = allowances.entry(entry.owner).or_default();
            if spenders.insert(entry.spender, entry.amount).is_some() {
                return Err(SnapshotError::DuplicateAllowance {
                    owner: entry.owner,
                    spender: entry.spender,
                });
            }
        }

        let skip = snapshot.events.len().saturating_sub(MAX_EVENT_HISTORY);
        let events: VecDeque<LedgerEvent> = snapshot.events.into_iter().skip(skip).collect();

        Ok(Ledger::from_parts(
            snapshot.address,
            snapshot.metadata,
            snapshot.total_supply,
            balances,
            allowances,
            events,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token::ledger::Allocation;

    const A: Address = Address::repeat_byte(0xaa);
    const B: Address = Address::repeat_byte(0xbb);

    fn sample() -> Ledger {
        let metadata = TokenMetadata::new("Snap".into(), "SNP".into(), 6, A).unwrap();
        let mut ledger = Ledger::new(
            Address::repeat_byte(0x01),
            metadata,
            &[Allocation::new(A, U256::from(1000u64))],
        )
        .unwrap();
        ledger.transfer(A, B, U256::from(400u64)).unwrap();
        ledger.approve(A, B, U256::from(50u64));
        ledger
    }

    #[test]
    fn test_snapshot_restores_state() {
        let ledger = sample();
        let snapshot = LedgerSnapshot::from(&ledger);

        let json = serde_json::to_string(&snapshot).unwrap();
        let parsed: LedgerSnapshot = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, snapshot);

        let restored = Ledger::try_from(parsed).unwrap();
        assert_eq!(restored.total_supply(), ledger.total_supply());
        assert_eq!(restored.balance_of(A), U256::from(600u64));
        assert_eq!(restored.balance_of(B), U256::from(400u64));
        assert_eq!(restored.allowance(A, B), U256::from(50u64));
        assert_eq!(restored.events().count(), ledger.events().count());
        assert!(restored.check_invariants());
    }

    #[test]
    fn test_snapshot_rejects_supply_mismatch() {
        let mut snapshot = LedgerSnapshot::from(&sample());
        snapshot.balances[0].amount += U256::from(1u64);

        let err = Ledger::try_from(snapshot).unwrap_err();
        assert!(matches!(err, SnapshotError::SupplyMismatch { .. }));
    }

    #[test]
    fn test_snapshot_rejects_null_balance() {
        let mut snapshot = LedgerSnapshot::from(&sample());
        snapshot.balances.push(BalanceEntry {
            account: Address::ZERO,
            amount: U256::from(1u64),
        });

        assert_eq!(
            Ledger::try_from(snapshot).unwrap_err(),
            SnapshotError::NullBalance
        );
    }

    #[test]
    fn test_snapshot_rejects_duplicates() {
        let mut snapshot = LedgerSnapshot::from(&sample());
        let dup = snapshot.allowances[0].clone();
        snapshot.allowances.push(dup);

        assert!(matches!(
            Ledger::try_from(snapshot).unwrap_err(),
            SnapshotError::DuplicateAllowance { .. }
        ));
    }

    #[test]
    fn test_snapshot_rejects_zero_supply() {
        let mut snapshot = LedgerSnapshot::from(&sample());
        snapshot.balances.clear();
        snapshot.allowances.clear();
        snapshot.total_supply = U256::ZERO;

        assert_eq!(
            Ledger::try_from(snapshot).unwrap_err(),
            SnapshotError::ZeroSupply
        );
    }

    #[test]
    fn test_snapshot_rejects_invalid_metadata() {
        let mut snapshot = LedgerSnapshot::from(&sample());
        snapshot.metadata.name = String::new();
        assert_eq!(
            Ledger::try_from(snapshot).unwrap_err(),
            SnapshotError::Metadata(TokenError::InvalidName)
        );

        let mut snapshot = LedgerSnapshot::from(&sample());
        snapshot.metadata.symbol = "TOOLONGSYMBOL".into();
        assert_eq!(
            Ledger::try_from(snapshot).unwrap_err(),
            SnapshotError::Metadata(TokenError::InvalidSymbol)
        );

        let mut snapshot = LedgerSnapshot::from(&sample());
        snapshot.metadata.decimals = 200;
        assert_eq!(
            Ledger::try_from(snapshot).unwrap_err(),
            SnapshotError::Metadata(TokenError::InvalidDecimals)
        );
    }
}
