//! SQLite implementation of the Store trait.
//!
//! This is the primary storage backend for the Mint Ledger. It uses
//! rusqlite with bundled SQLite, wrapped in async via tokio::spawn_blocking.
//! Each record is kept as its canonical CBOR encoding; the address, owner and
//! mint columns exist for lookups and the one-account-per-pair constraint.

use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use rusqlite::{params, Connection, OptionalExtension, Transaction, TransactionBehavior};

use mintledger_core::{
    canonical_account_bytes, canonical_mint_bytes, decode_account, decode_mint, AccountAddress,
    AccountRecord, MintAddress, MintRecord, Principal,
};

use crate::error::{Result, StoreError};
use crate::migration::{self, now_millis};
use crate::traits::{InsertResult, Store, Update, WriteBatch};

/// How long a connection waits on another writer's lock before failing.
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// SQLite-based store implementation.
///
/// Thread-safe via internal Mutex. All operations use spawn_blocking
/// to avoid blocking the async runtime. Several stores (or processes) may
/// share one database file: commits take the write lock up front and check
/// every record against the value the batch was computed from.
#[derive(Clone)]
pub struct SqliteStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteStore {
    /// Open a SQLite database at the given path.
    ///
    /// Creates the file and runs migrations if it doesn't exist.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let mut conn = Connection::open(path)?;
        conn.busy_timeout(BUSY_TIMEOUT)?;
        migration::migrate(&mut conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Open an in-memory SQLite database.
    pub fn open_memory() -> Result<Self> {
        let mut conn = Connection::open_in_memory()?;
        migration::migrate(&mut conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Run `f` against the connection on the blocking thread pool.
    async fn blocking<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut Connection) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let conn = self.conn.clone();
        tokio::task::spawn_blocking(move || {
            let mut conn = conn.lock().map_err(|_| StoreError::Poisoned)?;
            f(&mut conn)
        })
        .await
        .map_err(|e| StoreError::Task(e.to_string()))?
    }
}

fn load_mint(conn: &Connection, address: &MintAddress) -> Result<Option<MintRecord>> {
    let blob: Option<Vec<u8>> = conn
        .query_row(
            "SELECT record FROM mints WHERE mint_address = ?1",
            params![address.as_bytes().as_slice()],
            |row| row.get(0),
        )
        .optional()?;

    blob.map(|bytes| {
        let mint = decode_mint(&bytes)?;
        if mint.address() != *address {
            return Err(StoreError::InvalidData(format!(
                "mint row {} holds record for {}",
                address,
                mint.address()
            )));
        }
        Ok(mint)
    })
    .transpose()
}

fn load_account(conn: &Connection, address: &AccountAddress) -> Result<Option<AccountRecord>> {
    let blob: Option<Vec<u8>> = conn
        .query_row(
            "SELECT record FROM token_accounts WHERE account_address = ?1",
            params![address.as_bytes().as_slice()],
            |row| row.get(0),
        )
        .optional()?;

    blob.map(|bytes| {
        let account = decode_account(&bytes)?;
        if account.address() != *address {
            return Err(StoreError::InvalidData(format!(
                "account row {} holds record for {}",
                address,
                account.address()
            )));
        }
        Ok(account)
    })
    .transpose()
}

fn update_mint(tx: &Transaction<'_>, update: &Update<MintRecord>, now: i64) -> Result<()> {
    let Update { before, after } = update;
    let existing = load_mint(tx, &after.address())?
        .ok_or_else(|| StoreError::NotFound(format!("mint {}", after.address())))?;
    if !before.same_identity(after) || !existing.same_identity(after) {
        return Err(StoreError::InvalidData(format!(
            "immutable fields changed on mint {}",
            after.address()
        )));
    }
    if existing != *before {
        return Err(StoreError::Conflict(format!("mint {}", after.address())));
    }

    tx.execute(
        "UPDATE mints SET record = ?2, updated_at = ?3 WHERE mint_address = ?1",
        params![
            after.address().as_bytes().as_slice(),
            canonical_mint_bytes(after),
            now
        ],
    )?;
    Ok(())
}

fn update_account(tx: &Transaction<'_>, update: &Update<AccountRecord>, now: i64) -> Result<()> {
    let Update { before, after } = update;
    let existing = load_account(tx, &after.address())?
        .ok_or_else(|| StoreError::NotFound(format!("account {}", after.address())))?;
    if !before.same_identity(after) || !existing.same_identity(after) {
        return Err(StoreError::InvalidData(format!(
            "immutable fields changed on account {}",
            after.address()
        )));
    }
    if existing != *before {
        return Err(StoreError::Conflict(format!("account {}", after.address())));
    }

    tx.execute(
        "UPDATE token_accounts SET record = ?2, updated_at = ?3 WHERE account_address = ?1",
        params![
            after.address().as_bytes().as_slice(),
            canonical_account_bytes(after),
            now
        ],
    )?;
    Ok(())
}

/// Run an account scan whose columns are `record, owner, mint`.
fn collect_accounts(
    conn: &Connection,
    sql: &str,
    key: &[u8],
) -> Result<Vec<AccountRecord>> {
    let mut stmt = conn.prepare(sql)?;
    let rows = stmt
        .query_map(params![key], |row| {
            Ok((
                row.get::<_, Vec<u8>>(0)?,
                row.get::<_, Vec<u8>>(1)?,
                row.get::<_, Vec<u8>>(2)?,
            ))
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    rows.iter()
        .map(|(bytes, owner, mint)| {
            let account = decode_account(bytes)?;
            if account.owner().as_bytes().as_slice() != owner.as_slice()
                || account.mint().as_bytes().as_slice() != mint.as_slice()
            {
                return Err(StoreError::InvalidData(format!(
                    "account row {} disagrees with its owner or mint column",
                    account.address()
                )));
            }
            Ok(account)
        })
        .collect()
}

#[async_trait]
impl Store for SqliteStore {
    async fn get_mint(&self, address: &MintAddress) -> Result<Option<MintRecord>> {
        let address = *address;
        self.blocking(move |conn| load_mint(conn, &address)).await
    }

    async fn get_account(&self, address: &AccountAddress) -> Result<Option<AccountRecord>> {
        let address = *address;
        self.blocking(move |conn| load_account(conn, &address)).await
    }

    async fn insert_mint(&self, mint: &MintRecord) -> Result<InsertResult> {
        let mint = mint.clone();
        self.blocking(move |conn| {
            let now = now_millis();
            let inserted = conn.execute(
                "INSERT OR IGNORE INTO mints (mint_address, authority, record, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?4)",
                params![
                    mint.address().as_bytes().as_slice(),
                    mint.authority().as_bytes().as_slice(),
                    canonical_mint_bytes(&mint),
                    now
                ],
            )?;

            Ok(if inserted == 0 {
                InsertResult::AlreadyExists
            } else {
                InsertResult::Inserted
            })
        })
        .await
    }

    async fn insert_account(&self, account: &AccountRecord) -> Result<InsertResult> {
        let account = account.clone();
        self.blocking(move |conn| {
            let now = now_millis();
            // The UNIQUE(owner, mint) constraint also lands here as an ignored row.
            let inserted = conn.execute(
                "INSERT OR IGNORE INTO token_accounts
                    (account_address, owner, mint, record, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?5)",
                params![
                    account.address().as_bytes().as_slice(),
                    account.owner().as_bytes().as_slice(),
                    account.mint().as_bytes().as_slice(),
                    canonical_account_bytes(&account),
                    now
                ],
            )?;

            Ok(if inserted == 0 {
                InsertResult::AlreadyExists
            } else {
                InsertResult::Inserted
            })
        })
        .await
    }

    async fn commit(&self, batch: &WriteBatch) -> Result<()> {
        if batch.is_empty() {
            return Ok(());
        }

        let batch = batch.clone();
        self.blocking(move |conn| {
            // IMMEDIATE takes the write lock before the checks read anything.
            let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
            let now = now_millis();

            // Any early return drops `tx`, which rolls the whole batch back.
            for update in &batch.mints {
                update_mint(&tx, update, now)?;
            }
            for update in &batch.accounts {
                update_account(&tx, update, now)?;
            }

            tx.commit()?;
            Ok(())
        })
        .await
    }

    async fn accounts_by_mint(&self, mint: &MintAddress) -> Result<Vec<AccountRecord>> {
        let mint = *mint;
        self.blocking(move |conn| {
            collect_accounts(
                conn,
                "SELECT record, owner, mint FROM token_accounts WHERE mint = ?1 ORDER BY account_address",
                mint.as_bytes(),
            )
        })
        .await
    }

    async fn accounts_by_owner(&self, owner: &Principal) -> Result<Vec<AccountRecord>> {
        let owner = *owner;
        self.blocking(move |conn| {
            collect_accounts(
                conn,
                "SELECT record, owner, mint FROM token_accounts WHERE owner = ?1 ORDER BY account_address",
                owner.as_bytes(),
            )
        })
        .await
    }

    async fn list_mints(&self) -> Result<Vec<MintAddress>> {
        self.blocking(|conn| {
            let mut stmt = conn.prepare("SELECT mint_address FROM mints ORDER BY mint_address")?;
            let rows = stmt
                .query_map([], |row| row.get::<_, Vec<u8>>(0))?
                .collect::<rusqlite::Result<Vec<_>>>()?;

            rows.iter()
                .map(|bytes| {
                    MintAddress::try_from(bytes.as_slice())
                        .map_err(|_| StoreError::InvalidData("mint address is not 32 bytes".into()))
                })
                .collect()
        })
        .await
    }
}
