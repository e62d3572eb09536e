//! # Mint Ledger Store
//!
//! Storage abstraction for the Mint Ledger. Provides a trait-based interface
//! for mint and account persistence with SQLite and in-memory implementations.
//!
//! ## Key Types
//!
//! - [`Store`] - The async trait for all storage operations
//! - [`SqliteStore`] - SQLite-based persistent storage
//! - [`MemoryStore`] - In-memory storage for tests
//! - [`WriteBatch`] - Record updates committed all-or-nothing
//! - [`InsertResult`] - Result of creating a record
//!
//! ## Usage
//!
//! ```rust,no_run
//! use mintledger_core::{MintAddress, MintRecord, Principal};
//! use mintledger_store::{InsertResult, SqliteStore, Store};
//!
//! async fn example() {
//!     let store = SqliteStore::open("ledger.db").unwrap();
//!
//!     let mint = MintRecord::new(MintAddress::generate(), Principal([1; 32]), 9);
//!     assert_eq!(store.insert_mint(&mint).await.unwrap(), InsertResult::Inserted);
//! }
//! ```
//!
//! ## Design Notes
//!
//! - **Create-once inserts**: a second insert at an address returns `AlreadyExists`
//! - **Atomic commits**: a batch is applied whole or not at all
//! - **Immutable identity**: commits refuse records whose identity fields differ
//! - **Conditional updates**: a commit fails with `Conflict` if a record changed
//!   since the batch was computed

pub mod error;
pub mod memory;
pub mod migration;
pub mod sqlite;
pub mod traits;

pub use error::{Result, StoreError};
pub use memory::MemoryStore;
pub use sqlite::SqliteStore;
pub use traits::{InsertResult, Store, Update, WriteBatch};
