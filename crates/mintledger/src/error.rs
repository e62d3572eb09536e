//! Error types for the Ledger.

use mintledger_core::{AccountAddress, CoreError, LedgerError, MintAddress};
use mintledger_store::StoreError;
use thiserror::Error;

/// Errors that can occur during Ledger operations.
#[derive(Debug, Error)]
pub enum Error {
    /// A ledger rule rejected the operation. Nothing was written.
    #[error("rejected: {0}")]
    Ledger(#[from] LedgerError),

    /// Storage error.
    #[error("storage error: {0}")]
    Store(#[from] StoreError),

    /// A signed operation did not authenticate.
    #[error("authentication failed: {0}")]
    Authentication(#[source] CoreError),

    /// Mint not found.
    #[error("mint not found: {0}")]
    MintNotFound(MintAddress),

    /// Token account not found.
    #[error("token account not found: {0}")]
    AccountNotFound(AccountAddress),
}

impl Error {
    /// The rule violation behind this error, if it is one.
    pub fn ledger_error(&self) -> Option<&LedgerError> {
        match self {
            Error::Ledger(e) => Some(e),
            _ => None,
        }
    }
}

/// Result type for Ledger operations.
pub type Result<T> = std::result::Result<T, Error>;
