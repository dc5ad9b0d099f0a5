//! Solidity ABI surface of the ledger
//!
//! The ERC-20 interface and the OpenZeppelin custom errors are declared with
//! `sol!`; calldata decoding, return encoding and revert data all go through
//! the generated types.

pub mod selector;

pub use selector::Selector;

use crate::token::TokenError;
use alloy_sol_types::{sol, Revert, SolError};

sol! {
    /// Standard ERC20 token interface
    interface ERC20 {
        /// Get token name
        function name() external view returns (string memory);

        /// Get token symbol
        function symbol() external view returns (string memory);

        /// Get token decimals
        function decimals() external view returns (uint8);

        /// Get total supply
        function totalSupply() external view returns (uint256);

        /// Get token balance of an account
        function balanceOf(address account) external view returns (uint256);

        /// Get allowance granted by owner to spender
        function allowance(address owner, address spender) external view returns (uint256);

        /// Transfer tokens to recipient
        function transfer(address to, uint256 value) external returns (bool);

        /// Approve spender to spend tokens
        function approve(address spender, uint256 value) external returns (bool);

        /// Transfer tokens from sender to recipient (requires allowance)
        function transferFrom(address from, address to, uint256 value) external returns (bool);
    }

    error ERC20InvalidReceiver(address receiver);
    error ERC20InsufficientBalance(address sender, uint256 balance, uint256 needed);
    error ERC20InsufficientAllowance(address spender, uint256 allowance, uint256 needed);
}

pub use ERC20::ERC20Calls;

/// Encode a ledger error as revert data
pub fn encode_revert(err: &TokenError) -> Vec<u8> {
    match err {
        TokenError::InvalidReceiver { receiver } => ERC20InvalidReceiver {
            receiver: *receiver,
        }
        .abi_encode(),
        TokenError::InsufficientBalance {
            account,
            have,
            need,
        } => ERC20InsufficientBalance {
            sender: *account,
            balance: *have,
            needed: *need,
        }
        .abi_encode(),
        TokenError::InsufficientAllowance {
            spender,
            have,
            need,
            ..
        } => ERC20InsufficientAllowance {
            spender: *spender,
            allowance: *have,
            needed: *need,
        }
        .abi_encode(),
        other => Revert {
            reason: other.to_string(),
        }
        .abi_encode(),
    }
}
