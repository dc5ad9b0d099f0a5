//! Call dispatch
//!
//! The ledger's public surface is the closed set of variants below. Calldata
//! whose selector is not one of them (`mint`, `burn`, anything else) is
//! rejected here and never reaches ledger state.

use crate::abi::{ERC20Calls, Selector, ERC20};
use crate::token::{Ledger, TokenError};
use alloy_primitives::{Address, U256};
use alloy_sol_types::{SolCall, SolInterface};
use thiserror::Error;

/// Dispatch errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DispatchError {
    #[error("Undefined operation: {0}")]
    UndefinedOperation(Selector),
    #[error("Malformed calldata for {selector}: {reason}")]
    MalformedCalldata { selector: Selector, reason: String },
}

/// Read-only calls
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Query {
    Name,
    Symbol,
    Decimals,
    TotalSupply,
    BalanceOf { account: Address },
    Allowance { owner: Address, spender: Address },
}

/// State-changing calls
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mutation {
    Transfer {
        to: Address,
        amount: U256,
    },
    Approve {
        spender: Address,
        amount: U256,
    },
    TransferFrom {
        from: Address,
        to: Address,
        amount: U256,
    },
}

/// Every operation the ledger exposes
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Query(Query),
    Mutation(Mutation),
}

impl Call {
    /// Decode calldata into a call
    pub fn decode(calldata: &[u8]) -> Result<Self, DispatchError> {
        let (selector, args) =
            Selector::split(calldata).ok_or(DispatchError::UndefinedOperation(Selector::EMPTY))?;

        if !ERC20Calls::valid_selector(selector.0) {
            return Err(DispatchError::UndefinedOperation(selector));
        }

        let call = ERC20Calls::abi_decode_raw(selector.0, args).map_err(|err| {
            DispatchError::MalformedCalldata {
                selector,
                reason: err.to_string(),
            }
        })?;

        Ok(call.into())
    }

    /// Canonical calldata for this call
    pub fn encode(&self) -> Vec<u8> {
        self.to_sol().abi_encode()
    }

    pub fn selector(&self) -> Selector {
        Selector(self.to_sol().selector())
    }

    /// Solidity-style function name, used in logs
    pub fn function_name(&self) -> &'static str {
        match self {
            Call::Query(Query::Name) => "name",
            Call::Query(Query::Symbol) => "symbol",
            Call::Query(Query::Decimals) => "decimals",
            Call::Query(Query::TotalSupply) => "totalSupply",
            Call::Query(Query::BalanceOf { .. }) => "balanceOf",
            Call::Query(Query::Allowance { .. }) => "allowance",
            Call::Mutation(Mutation::Transfer { .. }) => "transfer",
            Call::Mutation(Mutation::Approve { .. }) => "approve",
            Call::Mutation(Mutation::TransferFrom { .. }) => "transferFrom",
        }
    }

    pub fn is_mutating(&self) -> bool {
        matches!(self, Call::Mutation(_))
    }

    fn to_sol(&self) -> ERC20Calls {
        match self {
            Call::Query(Query::Name) => ERC20Calls::name(ERC20::nameCall {}),
            Call::Query(Query::Symbol) => ERC20Calls::symbol(ERC20::symbolCall {}),
            Call::Query(Query::Decimals) => ERC20Calls::decimals(ERC20::decimalsCall {}),
            Call::Query(Query::TotalSupply) => ERC20Calls::totalSupply(ERC20::totalSupplyCall {}),
            Call::Query(Query::BalanceOf { account }) => {
                ERC20Calls::balanceOf(ERC20::balanceOfCall { account: *account })
            }
            Call::Query(Query::Allowance { owner, spender }) => {
                ERC20Calls::allowance(ERC20::allowanceCall {
                    owner: *owner,
                    spender: *spender,
                })
            }
            Call::Mutation(Mutation::Transfer { to, amount }) => {
                ERC20Calls::transfer(ERC20::transferCall {
                    to: *to,
                    value: *amount,
                })
            }
            Call::Mutation(Mutation::Approve { spender, amount }) => {
                ERC20Calls::approve(ERC20::approveCall {
                    spender: *spender,
                    value: *amount,
                })
            }
            Call::Mutation(Mutation::TransferFrom { from, to, amount }) => {
                ERC20Calls::transferFrom(ERC20::transferFromCall {
                    from: *from,
                    to: *to,
                    value: *amount,
                })
            }
        }
    }
}

impl From<ERC20Calls> for Call {
    fn from(call: ERC20Calls) -> Self {
        match call {
            ERC20Calls::name(_) => Call::Query(Query::Name),
            ERC20Calls::symbol(_) => Call::Query(Query::Symbol),
            ERC20Calls::decimals(_) => Call::Query(Query::Decimals),
            ERC20Calls::totalSupply(_) => Call::Query(Query::TotalSupply),
            ERC20Calls::balanceOf(c) => Call::Query(Query::BalanceOf { account: c.account }),
            ERC20Calls::allowance(c) => Call::Query(Query::Allowance {
                owner: c.owner,
                spender: c.spender,
            }),
            ERC20Calls::transfer(c) => Call::Mutation(Mutation::Transfer {
                to: c.to,
                amount: c.value,
            }),
            ERC20Calls::approve(c) => Call::Mutation(Mutation::Approve {
                spender: c.spender,
                amount: c.value,
            }),
            ERC20Calls::transferFrom(c) => Call::Mutation(Mutation::TransferFrom {
                from: c.from,
                to: c.to,
                amount: c.value,
            }),
        }
    }
}

impl Query {
    /// Answer the query with ABI-encoded return data
    pub fn answer(&self, ledger: &Ledger) -> Vec<u8> {
        match self {
            Query::Name => ERC20::nameCall::abi_encode_returns(&ledger.name().to_string()),
            Query::Symbol => ERC20::symbolCall::abi_encode_returns(&ledger.symbol().to_string()),
            Query::Decimals => ERC20::decimalsCall::abi_encode_returns(&ledger.decimals()),
            Query::TotalSupply => ERC20::totalSupplyCall::abi_encode_returns(&ledger.total_supply()),
            Query::BalanceOf { account } => {
                ERC20::balanceOfCall::abi_encode_returns(&ledger.balance_of(*account))
            }
            Query::Allowance { owner, spender } => {
                ERC20::allowanceCall::abi_encode_returns(&ledger.allowance(*owner, *spender))
            }
        }
    }
}

impl Mutation {
    /// Apply the mutation on behalf of `caller`. Returns the ABI-encoded
    /// `true` every ERC-20 mutation returns on success.
    pub fn apply(&self, ledger: &mut Ledger, caller: Address) -> Result<Vec<u8>, TokenError> {
        let output = match self {
            Mutation::Transfer { to, amount } => {
                ledger.transfer(caller, *to, *amount)?;
                ERC20::transferCall::abi_encode_returns(&true)
            }
            Mutation::Approve { spender, amount } => {
                ledger.approve(caller, *spender, *amount);
                ERC20::approveCall::abi_encode_returns(&true)
            }
            Mutation::TransferFrom { from, to, amount } => {
                ledger.transfer_from(caller, *from, *to, *amount)?;
                ERC20::transferFromCall::abi_encode_returns(&true)
            }
        };
        Ok(output)
    }
}
