//! Ledger deployment
//!
//! Reads a genesis configuration, derives the ledger address from the
//! deployer and a nonce, and issues the full supply.
//!
//! A configuration file looks like:
//!
//! ```json
//! {
//!   "name": "My Token",
//!   "symbol": "MTK",
//!   "decimals": 18,
//!   "deployer": "0xaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa",
//!   "allocations": [
//!     { "holder": "0xaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa", "amount": "0x3e8" }
//!   ]
//! }
//! ```

use crate::token::{Allocation, Ledger, TokenError, TokenMetadata, DEFAULT_DECIMALS};
use alloy_primitives::{keccak256, Address, U256};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::Path;
use thiserror::Error;

/// Deployment errors
#[derive(Error, Debug)]
pub enum DeployError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("Invalid config: {0}")]
    Config(#[from] serde_json::Error),
    #[error("Token error: {0}")]
    Token(#[from] TokenError),
}

fn default_decimals() -> u8 {
    DEFAULT_DECIMALS
}

/// Genesis configuration for a ledger
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct DeployConfig {
    pub name: String,
    pub symbol: String,
    #[serde(default = "default_decimals")]
    pub decimals: u8,
    pub deployer: Address,
    /// Supply credited to the deployer when `allocations` is empty
    #[serde(default)]
    pub initial_supply: Option<U256>,
    #[serde(default)]
    pub allocations: Vec<Allocation>,
}

impl DeployConfig {
    /// Config that issues `initial_supply` to `deployer`
    pub fn new(name: String, symbol: String, deployer: Address, initial_supply: U256) -> Self {
        Self {
            name,
            symbol,
            decimals: DEFAULT_DECIMALS,
            deployer,
            initial_supply: Some(initial_supply),
            allocations: Vec::new(),
        }
    }

    /// Load a config from a JSON file
    pub fn from_file(path: &Path) -> Result<Self, DeployError> {
        let data = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&data)?)
    }

    /// Issuance list; falls back to the whole initial supply for the deployer
    pub fn allocations(&self) -> Vec<Allocation> {
        if !self.allocations.is_empty() {
            return self.allocations.clone();
        }
        match self.initial_supply {
            Some(amount) => vec![Allocation::new(self.deployer, amount)],
            None => Vec::new(),
        }
    }
}

/// A freshly created ledger and the address it lives at
#[derive(Debug)]
pub struct Deployment {
    pub address: Address,
    pub ledger: Ledger,
}

/// Derive the ledger address: last 20 bytes of keccak256(deployer ++ nonce)
pub fn ledger_address(deployer: Address, nonce: u64) -> Address {
    let mut input = Vec::with_capacity(28);
    input.extend_from_slice(deployer.as_slice());
    input.extend_from_slice(&nonce.to_be_bytes());
    let hash = keccak256(&input);
    Address::from_slice(&hash[12..])
}

/// Create a ledger from `config`
pub fn deploy(config: &DeployConfig, nonce: u64) -> Result<Deployment, DeployError> {
    let metadata = TokenMetadata::new(
        config.name.clone(),
        config.symbol.clone(),
        config.decimals,
        config.deployer,
    )?;

    let address = ledger_address(config.deployer, nonce);
    let ledger = Ledger::new(address, metadata, &config.allocations())?;

    log::info!(
        "Token deployed: {} ({}) at {}, supply {} across {} holder(s)",
        ledger.name(),
        ledger.symbol(),
        address,
        ledger.total_supply(),
        ledger.holder_count()
    );

    Ok(Deployment { address, ledger })
}
