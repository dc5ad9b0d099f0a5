//! Execution environment for a single ledger
//!
//! The runtime owns the ledger behind one lock and runs every call for an
//! authenticated caller:
//! - calldata is decoded before any lock is taken, so undefined operations
//!   never touch state
//! - queries share the read lock and see the last committed state
//! - mutations hold the write lock from precondition checks to commit,
//!   which serializes them
//!
//! A failed mutation commits nothing; the ledger stages its writes and
//! applies them only after every check has passed.

use crate::abi::{self, Selector};
use crate::dispatch::{Call, DispatchError, Mutation, Query};
use crate::token::{Ledger, LedgerEvent, TokenError};
use alloy_primitives::{Address, U256};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use thiserror::Error;

/// Execution errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExecutionError {
    #[error("Undefined operation: {0}")]
    UndefinedOperation(Selector),
    #[error("Malformed calldata for {selector}: {reason}")]
    MalformedCalldata { selector: Selector, reason: String },
    #[error("Execution reverted: {0}")]
    Reverted(#[from] TokenError),
    #[error("Ledger lock poisoned")]
    Poisoned,
}

impl From<DispatchError> for ExecutionError {
    fn from(err: DispatchError) -> Self {
        match err {
            DispatchError::UndefinedOperation(selector) => {
                ExecutionError::UndefinedOperation(selector)
            }
            DispatchError::MalformedCalldata { selector, reason } => {
                ExecutionError::MalformedCalldata { selector, reason }
            }
        }
    }
}

impl ExecutionError {
    /// ABI revert data for ledger-level failures
    pub fn revert_data(&self) -> Option<Vec<u8>> {
        match self {
            ExecutionError::Reverted(err) => Some(abi::encode_revert(err)),
            _ => None,
        }
    }

    /// Whether the call was refused before reaching the ledger
    pub fn is_rejected_at_dispatch(&self) -> bool {
        matches!(
            self,
            ExecutionError::UndefinedOperation(_) | ExecutionError::MalformedCalldata { .. }
        )
    }
}

/// Serializing executor around one ledger
#[derive(Debug)]
pub struct Runtime {
    ledger: RwLock<Ledger>,
}

impl Runtime {
    pub fn new(ledger: Ledger) -> Self {
        Self {
            ledger: RwLock::new(ledger),
        }
    }

    /// Execute raw calldata on behalf of `caller` and return ABI-encoded
    /// return data.
    pub fn execute(&self, caller: Address, calldata: &[u8]) -> Result<Vec<u8>, ExecutionError> {
        let call = Call::decode(calldata).map_err(|e| {
            log::warn!("Rejected call from {}: {}", caller, e);
            ExecutionError::from(e)
        })?;

        self.dispatch(caller, &call)
    }

    /// Execute an already-decoded call
    pub fn dispatch(&self, caller: Address, call: &Call) -> Result<Vec<u8>, ExecutionError> {
        match call {
            Call::Query(query) => {
                let ledger = self.read()?;
                log::debug!("{} queried {}", caller, call.function_name());
                Ok(query.answer(&ledger))
            }
            Call::Mutation(mutation) => {
                let mut ledger = self.write()?;
                match mutation.apply(&mut ledger, caller) {
                    Ok(output) => {
                        log::info!("{} called {}: committed", caller, call.function_name());
                        Ok(output)
                    }
                    Err(err) => {
                        log::warn!(
                            "{} called {}: reverted ({})",
                            caller,
                            call.function_name(),
                            err
                        );
                        Err(ExecutionError::Reverted(err))
                    }
                }
            }
        }
    }

    // =========================================================================
    // Typed entry points
    // =========================================================================

    pub fn transfer(&self, caller: Address, to: Address, amount: U256) -> Result<(), ExecutionError> {
        self.dispatch(caller, &Call::Mutation(Mutation::Transfer { to, amount }))?;
        Ok(())
    }

    pub fn approve(
        &self,
        caller: Address,
        spender: Address,
        amount: U256,
    ) -> Result<(), ExecutionError> {
        self.dispatch(caller, &Call::Mutation(Mutation::Approve { spender, amount }))?;
        Ok(())
    }

    pub fn transfer_from(
        &self,
        caller: Address,
        from: Address,
        to: Address,
        amount: U256,
    ) -> Result<(), ExecutionError> {
        self.dispatch(
            caller,
            &Call::Mutation(Mutation::TransferFrom { from, to, amount }),
        )?;
        Ok(())
    }

    pub fn total_supply(&self) -> Result<U256, ExecutionError> {
        Ok(self.read()?.total_supply())
    }

    pub fn balance_of(&self, account: Address) -> Result<U256, ExecutionError> {
        Ok(self.read()?.balance_of(account))
    }

    pub fn allowance(&self, owner: Address, spender: Address) -> Result<U256, ExecutionError> {
        Ok(self.read()?.allowance(owner, spender))
    }

    /// Query through the same path external callers use
    pub fn query(&self, query: Query) -> Result<Vec<u8>, ExecutionError> {
        self.dispatch(Address::ZERO, &Call::Query(query))
    }

    /// Recent events, oldest first
    pub fn events(&self) -> Result<Vec<LedgerEvent>, ExecutionError> {
        Ok(self.read()?.events().cloned().collect())
    }

    /// Copy of the committed ledger, for persistence
    pub fn snapshot(&self) -> Result<Ledger, ExecutionError> {
        Ok(self.read()?.clone())
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, Ledger>, ExecutionError> {
        self.ledger.read().map_err(|_| ExecutionError::Poisoned)
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, Ledger>, ExecutionError> {
        self.ledger.write().map_err(|_| ExecutionError::Poisoned)
    }
}
