//! Error types for the Mint Ledger core.

use thiserror::Error;

use crate::crypto::Principal;
use crate::types::{AccountAddress, MintAddress};

/// Errors from signatures and canonical encoding.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("invalid signature")]
    InvalidSignature,

    #[error("invalid public key")]
    InvalidPublicKey,

    #[error("malformed record: {0}")]
    MalformedRecord(String),

    #[error("decoding error: {0}")]
    DecodingError(String),
}

/// Rule violations that reject a ledger operation.
///
/// Every precondition is checked before any record is written, so an
/// operation failing with one of these has had no effect.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LedgerError {
    #[error("unauthorized: required signer {required}, got {asserted}")]
    Unauthorized {
        required: Principal,
        asserted: Principal,
    },

    #[error("mint mismatch: expected {expected}, got {actual}")]
    MintMismatch {
        expected: MintAddress,
        actual: MintAddress,
    },

    #[error("insufficient funds: balance {available}, requested {requested}")]
    InsufficientFunds { available: u64, requested: u64 },

    #[error("arithmetic overflow")]
    Overflow,

    #[error("already initialized: {0}")]
    AlreadyInitialized(RecordAddress),

    #[error("zero amount rejected")]
    ZeroAmount,
}

/// Either kind of record address, for errors that may concern both.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordAddress {
    Mint(MintAddress),
    Account(AccountAddress),
}

impl std::fmt::Display for RecordAddress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RecordAddress::Mint(addr) => write!(f, "mint {}", addr),
            RecordAddress::Account(addr) => write!(f, "account {}", addr),
        }
    }
}

impl From<MintAddress> for RecordAddress {
    fn from(addr: MintAddress) -> Self {
        RecordAddress::Mint(addr)
    }
}

impl From<AccountAddress> for RecordAddress {
    fn from(addr: AccountAddress) -> Self {
        RecordAddress::Account(addr)
    }
}
