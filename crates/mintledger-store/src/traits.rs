//! Store trait: the abstract interface for record persistence.
//!
//! This trait allows the ledger to be storage-agnostic. Implementations
//! include SQLite (primary) and in-memory (for tests).

use async_trait::async_trait;
use mintledger_core::{AccountAddress, AccountRecord, MintAddress, MintRecord, Principal};

use crate::error::Result;

/// Result of inserting a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertResult {
    /// Record was inserted.
    Inserted,
    /// A record already exists at this address. Nothing was written.
    AlreadyExists,
}

/// One record update: the value it was computed from and the value to store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Update<R> {
    pub before: R,
    pub after: R,
}

/// A set of record updates applied all-or-nothing.
///
/// Each update is conditional: it applies only if the stored record still
/// equals `before`. Only mutable fields (supply, balance) may differ between
/// `before` and `after`; a changed identity field rejects the whole batch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WriteBatch {
    pub mints: Vec<Update<MintRecord>>,
    pub accounts: Vec<Update<AccountRecord>>,
}

impl WriteBatch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace `before` with `after`.
    pub fn mint(mut self, before: &MintRecord, after: MintRecord) -> Self {
        self.mints.push(Update {
            before: before.clone(),
            after,
        });
        self
    }

    /// Replace `before` with `after`.
    pub fn account(mut self, before: &AccountRecord, after: AccountRecord) -> Self {
        self.accounts.push(Update {
            before: before.clone(),
            after,
        });
        self
    }

    pub fn is_empty(&self) -> bool {
        self.mints.is_empty() && self.accounts.is_empty()
    }
}

/// The Store trait: async interface for record persistence.
///
/// All methods are async to support both sync (SQLite) and async backends.
/// For SQLite, we use `spawn_blocking` internally to avoid blocking the runtime.
///
/// # Design Notes
///
/// - **Create-once inserts**: inserting at an occupied address returns
///   `AlreadyExists` and leaves the existing record untouched.
/// - **Atomic commits**: [`Store::commit`] applies every update in a batch or
///   none of them.
/// - **Conditional commits**: a batch whose `before` values no longer match
///   the stored records fails with `Conflict`, so read-modify-write cycles
///   from independent writers on one database never overwrite each other.
#[async_trait]
pub trait Store: Send + Sync {
    // ─────────────────────────────────────────────────────────────────────────
    // Point lookups
    // ─────────────────────────────────────────────────────────────────────────

    /// Get a mint by address.
    async fn get_mint(&self, address: &MintAddress) -> Result<Option<MintRecord>>;

    /// Get a token account by address.
    async fn get_account(&self, address: &AccountAddress) -> Result<Option<AccountRecord>>;

    // ─────────────────────────────────────────────────────────────────────────
    // Creation
    // ─────────────────────────────────────────────────────────────────────────

    /// Insert a new mint.
    async fn insert_mint(&self, mint: &MintRecord) -> Result<InsertResult>;

    /// Insert a new token account.
    async fn insert_account(&self, account: &AccountRecord) -> Result<InsertResult>;

    // ─────────────────────────────────────────────────────────────────────────
    // Mutation
    // ─────────────────────────────────────────────────────────────────────────

    /// Apply a batch of updates to existing records atomically.
    ///
    /// Fails with `NotFound` if any record is missing, `InvalidData` if any
    /// identity field differs, and `Conflict` if a stored record no longer
    /// equals its update's `before`. On failure nothing is written.
    async fn commit(&self, batch: &WriteBatch) -> Result<()>;

    // ─────────────────────────────────────────────────────────────────────────
    // Scans
    // ─────────────────────────────────────────────────────────────────────────

    /// All accounts holding `mint`, ordered by address.
    async fn accounts_by_mint(&self, mint: &MintAddress) -> Result<Vec<AccountRecord>>;

    /// All accounts owned by `owner`, ordered by address.
    async fn accounts_by_owner(&self, owner: &Principal) -> Result<Vec<AccountRecord>>;

    /// Addresses of every mint, ordered.
    async fn list_mints(&self) -> Result<Vec<MintAddress>>;
}

#[async_trait]
impl<S: Store + ?Sized> Store for std::sync::Arc<S> {
    async fn get_mint(&self, address: &MintAddress) -> Result<Option<MintRecord>> {
        (**self).get_mint(address).await
    }

    async fn get_account(&self, address: &AccountAddress) -> Result<Option<AccountRecord>> {
        (**self).get_account(address).await
    }

    async fn insert_mint(&self, mint: &MintRecord) -> Result<InsertResult> {
        (**self).insert_mint(mint).await
    }

    async fn insert_account(&self, account: &AccountRecord) -> Result<InsertResult> {
        (**self).insert_account(account).await
    }

    async fn commit(&self, batch: &WriteBatch) -> Result<()> {
        (**self).commit(batch).await
    }

    async fn accounts_by_mint(&self, mint: &MintAddress) -> Result<Vec<AccountRecord>> {
        (**self).accounts_by_mint(mint).await
    }

    async fn accounts_by_owner(&self, owner: &Principal) -> Result<Vec<AccountRecord>> {
        (**self).accounts_by_owner(owner).await
    }

    async fn list_mints(&self) -> Result<Vec<MintAddress>> {
        (**self).list_mints().await
    }
}
