//! Function selectors
//!
//! A selector is the first four bytes of the keccak-256 hash of a canonical
//! Solidity signature such as `transfer(address,uint256)`.

use alloy_primitives::keccak256;
use std::fmt;

#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Selector(pub [u8; 4]);

impl Selector {
    /// Placeholder reported for calldata too short to carry a selector
    pub const EMPTY: Selector = Selector([0; 4]);

    /// Derive the selector of a canonical signature
    pub fn from_signature(signature: &str) -> Self {
        let hash = keccak256(signature.as_bytes());
        Self([hash[0], hash[1], hash[2], hash[3]])
    }

    /// Split calldata into its selector and argument bytes
    pub fn split(calldata: &[u8]) -> Option<(Self, &[u8])> {
        let (head, args) = calldata.split_first_chunk::<4>()?;
        Some((Self(*head), args))
    }

    pub fn as_bytes(&self) -> &[u8; 4] {
        &self.0
    }
}

impl From<[u8; 4]> for Selector {
    fn from(bytes: [u8; 4]) -> Self {
        Self(bytes)
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl fmt::Debug for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Selector({})", self)
    }
}
