//! ERC-20 Ledger: a fixed-supply fungible token in Rust
//!
//! This crate provides:
//! - A balance/allowance ledger whose supply is issued once at creation
//! - A closed ERC-20 call surface decoded from ABI calldata; anything else,
//!   including `mint` and `burn`, is rejected before it reaches the ledger
//! - An execution runtime that serializes calls and commits them
//!   all-or-nothing
//! - Deployment from a JSON genesis config and JSON persistence
//!
//! # Example
//!
//! ```rust
//! use alloy_primitives::{Address, U256};
//! use erc20_ledger::deploy::{deploy, DeployConfig};
//! use erc20_ledger::runtime::Runtime;
//!
//! let alice = Address::repeat_byte(0xaa);
//! let bob = Address::repeat_byte(0xbb);
//!
//! // Deploy a token with 1000 units, all held by alice
//! let config = DeployConfig::new("My Token".into(), "MTK".into(), alice, U256::from(1000u64));
//! let deployment = deploy(&config, 0).unwrap();
//! let runtime = Runtime::new(deployment.ledger);
//!
//! // Delegate and spend
//! runtime.approve(alice, bob, U256::from(500u64)).unwrap();
//! runtime.transfer_from(bob, alice, bob, U256::from(500u64)).unwrap();
//!
//! assert_eq!(runtime.balance_of(alice).unwrap(), U256::from(500u64));
//! assert_eq!(runtime.allowance(alice, bob).unwrap(), U256::ZERO);
//! ```

pub mod abi;
pub mod cli;
pub mod deploy;
pub mod dispatch;
pub mod runtime;
pub mod storage;
pub mod token;

// Re-export commonly used types
pub use abi::Selector;
pub use deploy::{deploy, DeployConfig, Deployment};
pub use dispatch::{Call, DispatchError, Mutation, Query};
pub use runtime::{ExecutionError, Runtime};
pub use storage::{Storage, StorageConfig, StorageError};
pub use token::{Allocation, Ledger, LedgerEvent, TokenError, TokenMetadata};
