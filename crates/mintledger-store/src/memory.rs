//! In-memory implementation of the Store trait.
//!
//! This is primarily for testing. It has the same semantics as SQLite
//! but keeps everything in memory with no persistence.

use std::collections::BTreeMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;

use mintledger_core::{AccountAddress, AccountRecord, MintAddress, MintRecord, Principal};

use crate::error::{Result, StoreError};
use crate::traits::{InsertResult, Store, Update, WriteBatch};

/// In-memory store implementation.
///
/// All data is lost when the store is dropped. Thread-safe via RwLock; a
/// commit holds the write lock for the whole batch.
#[derive(Default)]
pub struct MemoryStore {
    inner: RwLock<MemoryStoreInner>,
}

#[derive(Default)]
struct MemoryStoreInner {
    mints: BTreeMap<MintAddress, MintRecord>,
    accounts: BTreeMap<AccountAddress, AccountRecord>,
}

impl MemoryStore {
    /// Create a new empty in-memory store.
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, MemoryStoreInner>> {
        self.inner.read().map_err(|_| StoreError::Poisoned)
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, MemoryStoreInner>> {
        self.inner.write().map_err(|_| StoreError::Poisoned)
    }
}

impl MemoryStoreInner {
    /// Check every update in `batch` against the stored records.
    fn validate(&self, batch: &WriteBatch) -> Result<()> {
        for Update { before, after } in &batch.mints {
            let existing = self
                .mints
                .get(&after.address())
                .ok_or_else(|| StoreError::NotFound(format!("mint {}", after.address())))?;
            if !before.same_identity(after) || !existing.same_identity(after) {
                return Err(StoreError::InvalidData(format!(
                    "immutable fields changed on mint {}",
                    after.address()
                )));
            }
            if existing != before {
                return Err(StoreError::Conflict(format!("mint {}", after.address())));
            }
        }
        for Update { before, after } in &batch.accounts {
            let existing = self
                .accounts
                .get(&after.address())
                .ok_or_else(|| StoreError::NotFound(format!("account {}", after.address())))?;
            if !before.same_identity(after) || !existing.same_identity(after) {
                return Err(StoreError::InvalidData(format!(
                    "immutable fields changed on account {}",
                    after.address()
                )));
            }
            if existing != before {
                return Err(StoreError::Conflict(format!("account {}", after.address())));
            }
        }
        Ok(())
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn get_mint(&self, address: &MintAddress) -> Result<Option<MintRecord>> {
        Ok(self.read()?.mints.get(address).cloned())
    }

    async fn get_account(&self, address: &AccountAddress) -> Result<Option<AccountRecord>> {
        Ok(self.read()?.accounts.get(address).cloned())
    }

    async fn insert_mint(&self, mint: &MintRecord) -> Result<InsertResult> {
        let mut inner = self.write()?;
        if inner.mints.contains_key(&mint.address()) {
            return Ok(InsertResult::AlreadyExists);
        }
        inner.mints.insert(mint.address(), mint.clone());
        Ok(InsertResult::Inserted)
    }

    async fn insert_account(&self, account: &AccountRecord) -> Result<InsertResult> {
        let mut inner = self.write()?;
        if inner.accounts.contains_key(&account.address()) {
            return Ok(InsertResult::AlreadyExists);
        }
        inner.accounts.insert(account.address(), account.clone());
        Ok(InsertResult::Inserted)
    }

    async fn commit(&self, batch: &WriteBatch) -> Result<()> {
        let mut inner = self.write()?;

        // Validate everything first so a bad entry leaves the store untouched.
        inner.validate(batch)?;

        for update in &batch.mints {
            inner.mints.insert(update.after.address(), update.after.clone());
        }
        for update in &batch.accounts {
            inner.accounts.insert(update.after.address(), update.after.clone());
        }
        Ok(())
    }

    async fn accounts_by_mint(&self, mint: &MintAddress) -> Result<Vec<AccountRecord>> {
        Ok(self
            .read()?
            .accounts
            .values()
            .filter(|a| &a.mint() == mint)
            .cloned()
            .collect())
    }

    async fn accounts_by_owner(&self, owner: &Principal) -> Result<Vec<AccountRecord>> {
        Ok(self
            .read()?
            .accounts
            .values()
            .filter(|a| &a.owner() == owner)
            .cloned()
            .collect())
    }

    async fn list_mints(&self) -> Result<Vec<MintAddress>> {
        Ok(self.read()?.mints.keys().copied().collect())
    }
}
