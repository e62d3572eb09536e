//! # Mint Ledger Core
//!
//! Pure primitives for the Mint Ledger: addresses, records, authorization,
//! and the checked state transitions behind issue, transfer and burn.
//!
//! This crate contains no I/O, no storage, no networking. Transitions take
//! record values and return new record values; committing them atomically
//! is the job of the store and the `mintledger` facade.
//!
//! ## Key Types
//!
//! - [`MintRecord`] - Per-token header: authority, decimals, total supply
//! - [`AccountRecord`] - Per-owner balance for one mint
//! - [`Principal`] - An authenticated identity (Ed25519 public key)
//! - [`MintAddress`], [`AccountAddress`] - 32-byte record addresses
//! - [`LedgerError`] - The rule violations that reject an operation
//!
//! ## Invariants
//!
//! For every mint, the sum of its account balances equals its total supply.
//! Arithmetic is checked and never wraps. Identity fields never change after
//! creation. See [`transition`] and [`audit`].

pub mod audit;
pub mod auth;
pub mod canonical;
pub mod crypto;
pub mod derive;
pub mod error;
pub mod operation;
pub mod record;
pub mod transition;
pub mod types;

pub use audit::{check_supply, SupplyReport};
pub use auth::{authorize, require_signer, Authenticator, Ed25519Authenticator};
pub use canonical::{
    canonical_account_bytes, canonical_mint_bytes, canonical_operation_bytes, decode_account,
    decode_mint, decode_operation,
};
pub use crypto::{Ed25519Signature, Keypair, Principal};
pub use derive::{derive_address, token_account_address, TOKEN_ACCOUNT_NAMESPACE};
pub use error::{CoreError, LedgerError, RecordAddress};
pub use operation::{Operation, OperationKind, SignedOperation, SIGN_DOMAIN};
pub use record::{AccountRecord, MintRecord};
pub use transition::{SupplyChange, TransferChange};
pub use types::{AccountAddress, MintAddress};
