//! The Ledger: unified API for the Mint Ledger.
//!
//! The Ledger brings together storage, authorization and the checked
//! transitions. Every mutating operation follows the same cycle: lock the
//! addresses it touches, load the records, run the transition, commit the
//! result as one batch. A rejected transition returns before the commit, so
//! nothing is written. The batch is conditional on the records it was computed
//! from; if another ledger on the same database changed one of them in the
//! meantime, the cycle reruns from the load.

use std::sync::Arc;

use mintledger_core::transition;
use mintledger_core::{
    check_supply, derive_address, AccountAddress, AccountRecord, Authenticator,
    Ed25519Authenticator, LedgerError, MintAddress, MintRecord, Operation, Principal,
    SignedOperation, SupplyChange, SupplyReport, TransferChange, TOKEN_ACCOUNT_NAMESPACE,
};
use mintledger_store::{InsertResult, Store, StoreError, WriteBatch};
use tracing::{debug, info, warn};

use crate::error::{Error, Result};
use crate::lock::LockTable;

/// Attempts at finding a free random mint address before giving up.
const MAX_ADDRESS_ATTEMPTS: usize = 8;

/// Times an operation is rerun after another writer to the same database
/// changed its records between load and commit.
const MAX_COMMIT_ATTEMPTS: usize = 64;

/// Configuration for the Ledger.
#[derive(Debug, Clone)]
pub struct LedgerConfig {
    /// Namespace tag mixed into every token account address.
    pub account_namespace: Vec<u8>,
    /// Reject issue, transfer and burn of zero tokens instead of accepting
    /// them as no-ops.
    pub reject_zero_amounts: bool,
    /// Re-check supply conservation after every issue and burn.
    pub audit_after_commit: bool,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            account_namespace: TOKEN_ACCOUNT_NAMESPACE.to_vec(),
            reject_zero_amounts: false,
            audit_after_commit: false,
        }
    }
}

/// What a submitted operation produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OperationOutcome {
    Initialized(MintRecord),
    AccountCreated(AccountRecord),
    Issued(SupplyChange),
    Transferred(TransferChange),
    Burned(SupplyChange),
}

/// The main Ledger struct.
///
/// Provides a unified API for:
/// - Creating mints and token accounts
/// - Issuing, transferring and burning tokens
/// - Submitting signed operations
/// - Querying records and auditing supply
pub struct Ledger<S: Store> {
    store: Arc<S>,
    config: LedgerConfig,
    locks: LockTable,
    authenticator: Arc<dyn Authenticator>,
}

impl<S: Store> Ledger<S> {
    /// Create a ledger over `store` that authenticates with Ed25519.
    pub fn new(store: S, config: LedgerConfig) -> Self {
        Self::with_authenticator(store, config, Arc::new(Ed25519Authenticator))
    }

    /// Create a ledger with a custom authenticator for [`Ledger::submit`].
    pub fn with_authenticator(
        store: S,
        config: LedgerConfig,
        authenticator: Arc<dyn Authenticator>,
    ) -> Self {
        Self {
            store: Arc::new(store),
            config,
            locks: LockTable::new(),
            authenticator,
        }
    }

    /// Get the store reference.
    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn config(&self) -> &LedgerConfig {
        &self.config
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Creation
    // ─────────────────────────────────────────────────────────────────────────

    /// Create a mint with zero supply at a fresh random address.
    pub async fn initialize(&self, decimals: u8, authority: Principal) -> Result<MintRecord> {
        let mut attempt = 1;
        loop {
            match self
                .initialize_at(MintAddress::generate(), decimals, authority)
                .await
            {
                Err(Error::Ledger(LedgerError::AlreadyInitialized(addr)))
                    if attempt < MAX_ADDRESS_ATTEMPTS =>
                {
                    debug!(%addr, attempt, "random mint address taken, retrying");
                    attempt += 1;
                }
                other => return other,
            }
        }
    }

    /// Create a mint with zero supply at `address`.
    ///
    /// Fails with `AlreadyInitialized` if a mint already lives there.
    pub async fn initialize_at(
        &self,
        address: MintAddress,
        decimals: u8,
        authority: Principal,
    ) -> Result<MintRecord> {
        let _guard = self.locks.acquire([address.0]).await;

        let mint = MintRecord::new(address, authority, decimals);
        match self.store.insert_mint(&mint).await? {
            InsertResult::Inserted => {
                info!(mint = %address, %authority, decimals, "mint initialized");
                Ok(mint)
            }
            InsertResult::AlreadyExists => {
                debug!(mint = %address, "initialize rejected: already initialized");
                Err(LedgerError::AlreadyInitialized(address.into()).into())
            }
        }
    }

    /// Create `owner`'s empty token account for `mint`.
    ///
    /// `payer` is recorded in the log only.
    pub async fn create_token_account(
        &self,
        mint: MintAddress,
        owner: Principal,
        payer: Principal,
    ) -> Result<AccountRecord> {
        let account = AccountRecord::new(&self.config.account_namespace, owner, mint);
        let _guard = self.locks.acquire([mint.0, account.address().0]).await;

        if self.store.get_mint(&mint).await?.is_none() {
            return Err(Error::MintNotFound(mint));
        }

        match self.store.insert_account(&account).await? {
            InsertResult::Inserted => {
                info!(
                    account = %account.address(),
                    %owner,
                    %mint,
                    %payer,
                    "token account created"
                );
                Ok(account)
            }
            InsertResult::AlreadyExists => {
                debug!(account = %account.address(), "create rejected: already initialized");
                Err(LedgerError::AlreadyInitialized(account.address().into()).into())
            }
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Balance operations
    // ─────────────────────────────────────────────────────────────────────────

    /// Issue `amount` new tokens of `mint` into `account`.
    pub async fn issue(
        &self,
        mint: MintAddress,
        account: AccountAddress,
        signer: Principal,
        amount: u64,
    ) -> Result<SupplyChange> {
        self.check_amount(amount)?;
        let _guard = self.locks.acquire([mint.0, account.0]).await;

        let mut attempt = 1;
        let change = loop {
            let mint_record = self.load_mint(&mint).await?;
            let account_record = self.load_account(&account).await?;

            let change = transition::issue(&mint_record, &account_record, &signer, amount)
                .map_err(|e| rejected("issue", e))?;
            if amount == 0 {
                break change;
            }

            let batch = WriteBatch::new()
                .mint(&mint_record, change.mint.clone())
                .account(&account_record, change.account.clone());
            if self.try_commit("issue", &batch, &mut attempt).await? {
                break change;
            }
        };
        info!(
            %mint,
            %account,
            amount,
            supply = change.mint.total_supply(),
            "tokens issued"
        );

        if self.config.audit_after_commit {
            self.audit_locked(&change.mint).await?;
        }
        Ok(change)
    }

    /// Move `amount` tokens from `from` to `to`. Supply is unchanged.
    pub async fn transfer(
        &self,
        from: AccountAddress,
        to: AccountAddress,
        signer: Principal,
        amount: u64,
    ) -> Result<TransferChange> {
        self.check_amount(amount)?;
        let _guard = self.locks.acquire([from.0, to.0]).await;

        let mut attempt = 1;
        let change = loop {
            let from_record = self.load_account(&from).await?;
            let to_record = self.load_account(&to).await?;

            let change = transition::transfer(&from_record, &to_record, &signer, amount)
                .map_err(|e| rejected("transfer", e))?;
            if amount == 0 || from == to {
                break change;
            }

            let batch = WriteBatch::new()
                .account(&from_record, change.from.clone())
                .account(&to_record, change.to.clone());
            if self.try_commit("transfer", &batch, &mut attempt).await? {
                break change;
            }
        };
        info!(%from, %to, amount, "tokens transferred");
        Ok(change)
    }

    /// Destroy `amount` tokens of `mint` held in `account`.
    pub async fn burn(
        &self,
        mint: MintAddress,
        account: AccountAddress,
        signer: Principal,
        amount: u64,
    ) -> Result<SupplyChange> {
        self.check_amount(amount)?;
        let _guard = self.locks.acquire([mint.0, account.0]).await;

        let mut attempt = 1;
        let change = loop {
            let mint_record = self.load_mint(&mint).await?;
            let account_record = self.load_account(&account).await?;

            let change = transition::burn(&mint_record, &account_record, &signer, amount)
                .map_err(|e| rejected("burn", e))?;
            if amount == 0 {
                break change;
            }

            let batch = WriteBatch::new()
                .mint(&mint_record, change.mint.clone())
                .account(&account_record, change.account.clone());
            if self.try_commit("burn", &batch, &mut attempt).await? {
                break change;
            }
        };
        info!(
            %mint,
            %account,
            amount,
            supply = change.mint.total_supply(),
            "tokens burned"
        );

        if self.config.audit_after_commit {
            self.audit_locked(&change.mint).await?;
        }
        Ok(change)
    }

    /// Authenticate a signed operation and apply it as its verified signer.
    ///
    /// The signer is the authority for `Initialize`, the payer for
    /// `CreateTokenAccount`, and the acting principal otherwise.
    pub async fn submit(&self, envelope: &SignedOperation) -> Result<OperationOutcome> {
        let signer = self.authenticator.authenticate(envelope).map_err(|e| {
            debug!(kind = %envelope.operation.kind(), claimed = %envelope.signer, "authentication failed");
            Error::Authentication(e)
        })?;

        match envelope.operation {
            Operation::Initialize { mint, decimals } => self
                .initialize_at(mint, decimals, signer)
                .await
                .map(OperationOutcome::Initialized),
            Operation::CreateTokenAccount { mint, owner } => self
                .create_token_account(mint, owner, signer)
                .await
                .map(OperationOutcome::AccountCreated),
            Operation::Issue {
                mint,
                account,
                amount,
            } => self
                .issue(mint, account, signer, amount)
                .await
                .map(OperationOutcome::Issued),
            Operation::Transfer { from, to, amount } => self
                .transfer(from, to, signer, amount)
                .await
                .map(OperationOutcome::Transferred),
            Operation::Burn {
                mint,
                account,
                amount,
            } => self
                .burn(mint, account, signer, amount)
                .await
                .map(OperationOutcome::Burned),
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Queries
    // ─────────────────────────────────────────────────────────────────────────

    pub async fn mint(&self, address: &MintAddress) -> Result<Option<MintRecord>> {
        Ok(self.store.get_mint(address).await?)
    }

    pub async fn account(&self, address: &AccountAddress) -> Result<Option<AccountRecord>> {
        Ok(self.store.get_account(address).await?)
    }

    /// `owner`'s token account for `mint`, if it has been created.
    pub async fn account_for(
        &self,
        owner: &Principal,
        mint: &MintAddress,
    ) -> Result<Option<AccountRecord>> {
        self.account(&self.derive_account_address(owner, mint)).await
    }

    /// `owner`'s balance of `mint`. Fails if the account does not exist.
    pub async fn balance(&self, owner: &Principal, mint: &MintAddress) -> Result<u64> {
        let address = self.derive_account_address(owner, mint);
        Ok(self.load_account(&address).await?.amount())
    }

    /// The address `owner`'s account for `mint` has or would have.
    pub fn derive_account_address(&self, owner: &Principal, mint: &MintAddress) -> AccountAddress {
        derive_address(&self.config.account_namespace, owner, mint)
    }

    pub async fn accounts_by_mint(&self, mint: &MintAddress) -> Result<Vec<AccountRecord>> {
        Ok(self.store.accounts_by_mint(mint).await?)
    }

    pub async fn accounts_by_owner(&self, owner: &Principal) -> Result<Vec<AccountRecord>> {
        Ok(self.store.accounts_by_owner(owner).await?)
    }

    pub async fn list_mints(&self) -> Result<Vec<MintAddress>> {
        Ok(self.store.list_mints().await?)
    }

    /// Compare `mint`'s total supply with the sum of its account balances.
    ///
    /// Holds the mint's lock so no issue or burn lands between the two reads.
    pub async fn audit_supply(&self, mint: &MintAddress) -> Result<SupplyReport> {
        let _guard = self.locks.acquire([mint.0]).await;
        let mint_record = self.load_mint(mint).await?;
        self.audit_locked(&mint_record).await
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Internal helpers
    // ─────────────────────────────────────────────────────────────────────────

    fn check_amount(&self, amount: u64) -> Result<()> {
        if amount == 0 && self.config.reject_zero_amounts {
            debug!("rejected zero amount");
            return Err(LedgerError::ZeroAmount.into());
        }
        Ok(())
    }

    /// Commit `batch`, or return `false` if another writer changed one of its
    /// records first and the operation should be rerun from the load.
    async fn try_commit(
        &self,
        op: &'static str,
        batch: &WriteBatch,
        attempt: &mut usize,
    ) -> Result<bool> {
        match self.store.commit(batch).await {
            Ok(()) => Ok(true),
            Err(StoreError::Conflict(record)) if *attempt < MAX_COMMIT_ATTEMPTS => {
                debug!(op, %record, attempt = *attempt, "records changed before commit, retrying");
                *attempt += 1;
                Ok(false)
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn load_mint(&self, address: &MintAddress) -> Result<MintRecord> {
        self.store
            .get_mint(address)
            .await?
            .ok_or(Error::MintNotFound(*address))
    }

    async fn load_account(&self, address: &AccountAddress) -> Result<AccountRecord> {
        self.store
            .get_account(address)
            .await?
            .ok_or(Error::AccountNotFound(*address))
    }

    /// Audit with the mint's lock already held by the caller.
    async fn audit_locked(&self, mint: &MintRecord) -> Result<SupplyReport> {
        let accounts = self.store.accounts_by_mint(&mint.address()).await?;
        let report = check_supply(mint, &accounts);
        if !report.consistent {
            warn!(
                mint = %report.mint,
                total_supply = report.total_supply,
                account_sum = %report.account_sum,
                accounts = report.accounts,
                "supply does not match account balances"
            );
        }
        Ok(report)
    }
}

fn rejected(op: &'static str, e: LedgerError) -> Error {
    debug!(op, error = %e, "operation rejected");
    Error::Ledger(e)
}
