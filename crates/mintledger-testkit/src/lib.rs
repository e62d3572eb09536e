//! # Mint Ledger Testkit
//!
//! Testing utilities for the Mint Ledger.
//!
//! This crate provides:
//!
//! - **Golden vectors**: account addresses, canonical operation bytes and
//!   signatures with known expected outputs
//! - **Generators**: Proptest strategies, including random operation sequences
//! - **Fixtures**: Helper structs for setting up test scenarios
//!
//! ## Golden Vectors
//!
//! ```rust
//! use mintledger_testkit::vectors::verify_all_vectors;
//!
//! for (name, matches, computed) in verify_all_vectors() {
//!     assert!(matches, "{}: {}", name, computed);
//! }
//! ```
//!
//! ## Property Testing
//!
//! ```rust,ignore
//! use proptest::prelude::*;
//! use mintledger_testkit::generators::{ledger_ops, OpScenario};
//!
//! proptest! {
//!     #[test]
//!     fn supply_is_conserved(ops in ledger_ops(3, 40)) {
//!         // run `ops` through an OpScenario and audit the mint
//!     }
//! }
//! ```
//!
//! ## Test Fixtures
//!
//! ```rust,no_run
//! use mintledger_core::Keypair;
//! use mintledger_testkit::fixtures::LedgerFixture;
//!
//! async fn example() {
//!     let fixture = LedgerFixture::new();
//!     let mint = fixture.mint(9).await.unwrap();
//!     let alice = Keypair::generate();
//!     let account = fixture.funded_account(mint, &alice, 1_000).await.unwrap();
//! }
//! ```

pub mod fixtures;
pub mod generators;
pub mod vectors;

pub use fixtures::{holders, LedgerFixture};
pub use generators::{ledger_op, ledger_ops, LedgerOp, OpScenario};
pub use vectors::{address_vectors, operation_vectors, verify_all_vectors, AddressVector, OperationVector};
