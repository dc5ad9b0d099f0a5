//! ERC-20 style fixed-supply ledger
//!
//! Balances and allowances live in plain hash tables keyed by address. The
//! total supply is issued once at creation and never changes afterwards:
//! there is no mint and no burn path, and the zero address can never be
//! credited.

use crate::token::events::{ApprovalEvent, LedgerEvent, TransferEvent};
use alloy_primitives::{Address, U256};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, VecDeque};
use thiserror::Error;

/// Number of events kept in the in-memory history
pub const MAX_EVENT_HISTORY: usize = 100;

/// Decimals used when a deployment does not specify any
pub const DEFAULT_DECIMALS: u8 = 18;

/// Ledger errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TokenError {
    #[error("Invalid receiver: {receiver}")]
    InvalidReceiver { receiver: Address },
    #[error("Insufficient balance for {account}: have {have}, need {need}")]
    InsufficientBalance {
        account: Address,
        have: U256,
        need: U256,
    },
    #[error("Insufficient allowance for {spender} on {owner}: have {have}, need {need}")]
    InsufficientAllowance {
        owner: Address,
        spender: Address,
        have: U256,
        need: U256,
    },
    #[error("Invalid name: must be 1-50 characters")]
    InvalidName,
    #[error("Invalid symbol: must be 1-11 characters")]
    InvalidSymbol,
    #[error("Invalid decimals: must be 0-18")]
    InvalidDecimals,
    #[error("Invalid supply: must be greater than 0")]
    InvalidSupply,
    #[error("Invalid holder: supply cannot be issued to {0}")]
    InvalidHolder(Address),
    #[error("Supply overflow: allocations exceed 2^256 - 1")]
    SupplyOverflow,
}

/// Token metadata (immutable after creation)
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct TokenMetadata {
    /// Token name (e.g., "My Token")
    pub name: String,
    /// Token symbol (e.g., "MTK")
    pub symbol: String,
    /// Decimal places (usually 18)
    pub decimals: u8,
    /// Account that deployed the ledger
    pub deployer: Address,
    /// Timestamp when created
    pub created_at: DateTime<Utc>,
}

impl TokenMetadata {
    /// Create new token metadata with validation
    pub fn new(
        name: String,
        symbol: String,
        decimals: u8,
        deployer: Address,
    ) -> Result<Self, TokenError> {
        let metadata = Self {
            name,
            symbol,
            decimals,
            deployer,
            created_at: Utc::now(),
        };
        metadata.validate()?;
        Ok(metadata)
    }

    /// Check name, symbol and decimals limits
    pub fn validate(&self) -> Result<(), TokenError> {
        if self.name.is_empty() || self.name.chars().count() > 50 {
            return Err(TokenError::InvalidName);
        }

        if self.symbol.is_empty() || self.symbol.chars().count() > 11 {
            return Err(TokenError::InvalidSymbol);
        }

        if self.decimals > 18 {
            return Err(TokenError::InvalidDecimals);
        }

        Ok(())
    }
}

/// A single issuance entry: `amount` tokens credited to `holder` at creation
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Allocation {
    pub holder: Address,
    pub amount: U256,
}

impl Allocation {
    pub fn new(holder: Address, amount: U256) -> Self {
        Self { holder, amount }
    }
}

/// Writes staged by one call. Built only after every precondition holds,
/// so applying it cannot fail.
#[derive(Debug, Default)]
struct Changeset {
    balances: Vec<(Address, U256)>,
    allowance: Option<(Address, Address, U256)>,
}

/// A fixed-supply ERC-20 ledger
#[derive(Clone, Debug)]
pub struct Ledger {
    /// Address the ledger was deployed at
    pub address: Address,
    /// Token metadata
    pub metadata: TokenMetadata,
    total_supply: U256,
    /// Balances: account -> amount (zero balances are not stored)
    balances: HashMap<Address, U256>,
    /// Allowances: owner -> (spender -> amount)
    allowances: HashMap<Address, HashMap<Address, U256>>,
    events: VecDeque<LedgerEvent>,
}

impl Ledger {
    /// Create a ledger and issue the whole supply to the given holders.
    ///
    /// Repeated holders are summed. Issuance is recorded as transfers from
    /// the zero address, the way ERC-20 indexers expect.
    pub fn new(
        address: Address,
        metadata: TokenMetadata,
        allocations: &[Allocation],
    ) -> Result<Self, TokenError> {
        let mut balances: HashMap<Address, U256> = HashMap::new();
        let mut total_supply = U256::ZERO;

        for allocation in allocations {
            if allocation.holder == Address::ZERO {
                return Err(TokenError::InvalidHolder(allocation.holder));
            }
            total_supply = total_supply
                .checked_add(allocation.amount)
                .ok_or(TokenError::SupplyOverflow)?;
        }

        if total_supply.is_zero() {
            return Err(TokenError::InvalidSupply);
        }

        let mut ledger = Self {
            address,
            metadata,
            total_supply,
            balances: HashMap::new(),
            allowances: HashMap::new(),
            events: VecDeque::new(),
        };

        for allocation in allocations.iter().filter(|a| !a.amount.is_zero()) {
            // Cannot overflow: the running total above already fit.
            *balances.entry(allocation.holder).or_insert(U256::ZERO) += allocation.amount;
            ledger.record(LedgerEvent::Transfer(TransferEvent::new(
                Address::ZERO,
                allocation.holder,
                allocation.amount,
            )));
        }
        ledger.balances = balances;

        Ok(ledger)
    }

    /// Rebuild a ledger from already-validated parts
    pub(crate) fn from_parts(
        address: Address,
        metadata: TokenMetadata,
        total_supply: U256,
        balances: HashMap<Address, U256>,
        allowances: HashMap<Address, HashMap<Address, U256>>,
        events: VecDeque<LedgerEvent>,
    ) -> Self {
        Self {
            address,
            metadata,
            total_supply,
            balances,
            allowances,
            events,
        }
    }

    // =========================================================================
    // ERC-20 View Functions
    // =========================================================================

    pub fn name(&self) -> &str {
        &self.metadata.name
    }

    pub fn symbol(&self) -> &str {
        &self.metadata.symbol
    }

    pub fn decimals(&self) -> u8 {
        self.metadata.decimals
    }

    /// Total supply, fixed at creation
    pub fn total_supply(&self) -> U256 {
        self.total_supply
    }

    /// Balance of an account; unseen accounts hold zero
    pub fn balance_of(&self, account: Address) -> U256 {
        self.balances.get(&account).copied().unwrap_or(U256::ZERO)
    }

    /// Amount `spender` may still move out of `owner`'s balance
    pub fn allowance(&self, owner: Address, spender: Address) -> U256 {
        self.allowances
            .get(&owner)
            .and_then(|spenders| spenders.get(&spender))
            .copied()
            .unwrap_or(U256::ZERO)
    }

    /// All accounts with a positive balance
    pub fn holders(&self) -> Vec<(Address, U256)> {
        self.balances.iter().map(|(a, b)| (*a, *b)).collect()
    }

    pub fn holder_count(&self) -> usize {
        self.balances.len()
    }

    /// All non-zero allowances as (owner, spender, amount)
    pub fn allowances(&self) -> Vec<(Address, Address, U256)> {
        self.allowances
            .iter()
            .flat_map(|(owner, spenders)| {
                spenders
                    .iter()
                    .map(move |(spender, amount)| (*owner, *spender, *amount))
            })
            .collect()
    }

    /// Recent events, oldest first
    pub fn events(&self) -> impl Iterator<Item = &LedgerEvent> {
        self.events.iter()
    }

    /// Sum of all balances, or `None` if it overflows
    pub fn sum_of_balances(&self) -> Option<U256> {
        self.balances
            .values()
            .try_fold(U256::ZERO, |acc, b| acc.checked_add(*b))
    }

    /// Whether the supply and null-account invariants hold
    pub fn check_invariants(&self) -> bool {
        self.sum_of_balances() == Some(self.total_supply)
            && self.balance_of(Address::ZERO).is_zero()
    }

    // =========================================================================
    // ERC-20 Mutating Functions
    // =========================================================================

    /// Move `amount` from `caller` to `to`
    pub fn transfer(
        &mut self,
        caller: Address,
        to: Address,
        amount: U256,
    ) -> Result<TransferEvent, TokenError> {
        let changes = self.plan_move(caller, to, amount)?;
        self.commit(changes);

        let event = TransferEvent::new(caller, to, amount);
        self.record(LedgerEvent::Transfer(event.clone()));
        Ok(event)
    }

    /// Set the allowance of `spender` over `caller`'s balance.
    ///
    /// Overwrites any previous value; zero revokes.
    pub fn approve(&mut self, caller: Address, spender: Address, amount: U256) -> ApprovalEvent {
        self.commit(Changeset {
            balances: Vec::new(),
            allowance: Some((caller, spender, amount)),
        });

        let event = ApprovalEvent::new(caller, spender, amount);
        self.record(LedgerEvent::Approval(event.clone()));
        event
    }

    /// Move `amount` from `owner` to `to`, spending `caller`'s allowance
    pub fn transfer_from(
        &mut self,
        caller: Address,
        owner: Address,
        to: Address,
        amount: U256,
    ) -> Result<TransferEvent, TokenError> {
        let have = self.allowance(owner, caller);
        let remaining = have
            .checked_sub(amount)
            .ok_or(TokenError::InsufficientAllowance {
                owner,
                spender: caller,
                have,
                need: amount,
            })?;

        let mut changes = self.plan_move(owner, to, amount)?;
        changes.allowance = Some((owner, caller, remaining));
        self.commit(changes);

        let event = TransferEvent::new(owner, to, amount);
        self.record(LedgerEvent::Transfer(event.clone()));
        Ok(event)
    }

    /// Stage the balance writes of a move without touching state
    fn plan_move(&self, from: Address, to: Address, amount: U256) -> Result<Changeset, TokenError> {
        if to == Address::ZERO {
            return Err(TokenError::InvalidReceiver { receiver: to });
        }

        let have = self.balance_of(from);
        let debited = have
            .checked_sub(amount)
            .ok_or(TokenError::InsufficientBalance {
                account: from,
                have,
                need: amount,
            })?;

        if from == to {
            return Ok(Changeset {
                balances: vec![(from, have)],
                allowance: None,
            });
        }

        // Unreachable while balances sum to the supply, which fits in a U256.
        let credited = self
            .balance_of(to)
            .checked_add(amount)
            .ok_or(TokenError::SupplyOverflow)?;

        Ok(Changeset {
            balances: vec![(from, debited), (to, credited)],
            allowance: None,
        })
    }

    fn commit(&mut self, changes: Changeset) {
        for (account, balance) in changes.balances {
            if balance.is_zero() {
                self.balances.remove(&account);
            } else {
                self.balances.insert(account, balance);
            }
        }

        if let Some((owner, spender, amount)) = changes.allowance {
            if amount.is_zero() {
                if let Some(spenders) = self.allowances.get_mut(&owner) {
                    spenders.remove(&spender);
                    if spenders.is_empty() {
                        self.allowances.remove(&owner);
                    }
                }
            } else {
                self.allowances
                    .entry(owner)
                    .or_default()
                    .insert(spender, amount);
            }
        }
    }

    fn record(&mut self, event: LedgerEvent) {
        self.events.push_back(event);
        if self.events.len() > MAX_EVENT_HISTORY {
            self.events.pop_front();
        }
    }
}
