//! ERC-20 style fixed-supply token ledger
//!
//! Provides a fungible token with:
//! - Balances per address
//! - Allowances for delegated transfers
//! - Transfer and approve operations
//! - A supply issued once at creation (no mint, no burn)
//!
//! # Example
//!
//! ```rust
//! use alloy_primitives::{Address, U256};
//! use erc20_ledger::token::{Allocation, Ledger, TokenMetadata};
//!
//! let alice = Address::repeat_byte(0xaa);
//! let bob = Address::repeat_byte(0xbb);
//!
//! let metadata = TokenMetadata::new("My Token".into(), "MTK".into(), 18, alice).unwrap();
//! let mut ledger = Ledger::new(
//!     Address::repeat_byte(0x01),
//!     metadata,
//!     &[Allocation::new(alice, U256::from(1000u64))],
//! )
//! .unwrap();
//!
//! ledger.transfer(alice, bob, U256::from(250u64)).unwrap();
//! assert_eq!(ledger.balance_of(bob), U256::from(250u64));
//! assert_eq!(ledger.total_supply(), U256::from(1000u64));
//! ```

pub mod events;
pub mod ledger;
pub mod snapshot;

pub use events::{ApprovalEvent, LedgerEvent, TransferEvent};
pub use ledger::{
    Allocation, Ledger, TokenError, TokenMetadata, DEFAULT_DECIMALS, MAX_EVENT_HISTORY,
};
pub use snapshot::{AllowanceEntry, BalanceEntry, LedgerSnapshot, SnapshotError};
