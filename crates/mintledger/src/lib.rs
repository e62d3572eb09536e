//! # Mint Ledger
//!
//! The unified API for the Mint Ledger: a fungible-token accounting engine
//! with mint creation, per-owner accounts, issuance, transfer and burn.
//!
//! ## Key Concepts
//!
//! - **Mint**: a token type. Its authority alone may issue new tokens.
//! - **Token account**: one owner's balance of one mint, at an address
//!   derived from `(owner, mint)`.
//! - **Supply conservation**: for every mint, the balances of its accounts
//!   always add up to its total supply.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use mintledger::{Ledger, LedgerConfig};
//! use mintledger::core::Keypair;
//! use mintledger::store::SqliteStore;
//!
//! async fn example() {
//!     let authority = Keypair::generate();
//!     let alice = Keypair::generate();
//!
//!     let store = SqliteStore::open("ledger.db").unwrap();
//!     let ledger = Ledger::new(store, LedgerConfig::default());
//!
//!     let mint = ledger.initialize(6, authority.principal()).await.unwrap();
//!     let account = ledger
//!         .create_token_account(mint.address(), alice.principal(), alice.principal())
//!         .await
//!         .unwrap();
//!
//!     ledger
//!         .issue(mint.address(), account.address(), authority.principal(), 1_000)
//!         .await
//!         .unwrap();
//! }
//! ```
//!
//! ## Re-exports
//!
//! - `mintledger::core` - Core primitives (records, addresses, transitions)
//! - `mintledger::store` - Storage abstraction and SQLite

pub mod error;
pub mod ledger;
pub mod lock;

pub use mintledger_core as core;
pub use mintledger_store as store;

pub use error::{Error, Result};
pub use ledger::{Ledger, LedgerConfig, OperationOutcome};
pub use lock::LockTable;

pub use mintledger_core::{
    AccountAddress, AccountRecord, Keypair, LedgerError, MintAddress, MintRecord, Operation,
    Principal, SignedOperation, SupplyReport,
};
