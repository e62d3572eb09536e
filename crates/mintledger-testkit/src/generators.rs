//! Proptest generators for property-based testing.

use proptest::prelude::*;

use mintledger::{Error, Ledger, LedgerConfig, Result};
use mintledger_core::{
    canonical_account_bytes, canonical_mint_bytes, AccountAddress, Keypair, MintAddress,
    Principal,
};
use mintledger_store::{MemoryStore, Store};

use crate::fixtures::{holders, LedgerFixture};

/// Generate a random keypair.
pub fn keypair() -> impl Strategy<Value = Keypair> {
    any::<[u8; 32]>().prop_map(|seed| Keypair::from_seed(&seed))
}

/// Generate a random principal.
pub fn principal() -> impl Strategy<Value = Principal> {
    any::<[u8; 32]>().prop_map(Principal::from_bytes)
}

/// Generate a random MintAddress.
pub fn mint_address() -> impl Strategy<Value = MintAddress> {
    any::<[u8; 32]>().prop_map(MintAddress::from_bytes)
}

/// Generate a random AccountAddress.
pub fn account_address() -> impl Strategy<Value = AccountAddress> {
    any::<[u8; 32]>().prop_map(AccountAddress::from_bytes)
}

/// Generate an account namespace tag.
pub fn namespace() -> impl Strategy<Value = Vec<u8>> {
    prop::collection::vec(any::<u8>(), 0..=16)
}

/// Amounts weighted towards small values, with occasional extremes to reach
/// the overflow and insufficient-funds paths.
pub fn amount() -> impl Strategy<Value = u64> {
    prop_oneof![
        8 => 0u64..=5_000,
        1 => Just(u64::MAX),
        1 => any::<u64>(),
    ]
}

/// One ledger operation against a fixed set of holders.
///
/// Indices refer to holders; a signer index equal to the holder count means
/// the mint authority.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LedgerOp {
    Issue {
        to: usize,
        signer: usize,
        amount: u64,
    },
    Transfer {
        from: usize,
        to: usize,
        signer: usize,
        amount: u64,
    },
    Burn {
        from: usize,
        signer: usize,
        amount: u64,
    },
}

/// Generate an operation for `holders` holders (at least one).
pub fn ledger_op(holders: usize) -> impl Strategy<Value = LedgerOp> {
    let holder = 0..holders;
    let signer = 0..=holders;
    prop_oneof![
        (holder.clone(), signer.clone(), amount())
            .prop_map(|(to, signer, amount)| LedgerOp::Issue { to, signer, amount }),
        (holder.clone(), holder.clone(), signer.clone(), amount()).prop_map(
            |(from, to, signer, amount)| LedgerOp::Transfer {
                from,
                to,
                signer,
                amount
            }
        ),
        (holder, signer, amount())
            .prop_map(|(from, signer, amount)| LedgerOp::Burn { from, signer, amount }),
    ]
}

/// Generate a sequence of up to `max_len` operations.
pub fn ledger_ops(holders: usize, max_len: usize) -> impl Strategy<Value = Vec<LedgerOp>> {
    prop::collection::vec(ledger_op(holders), 0..=max_len)
}

/// One mint with a funded-or-empty account per holder, ready for [`LedgerOp`]s.
pub struct OpScenario<S: Store = MemoryStore> {
    pub fixture: LedgerFixture<S>,
    pub mint: MintAddress,
    pub holders: Vec<Keypair>,
    pub accounts: Vec<AccountAddress>,
}

impl OpScenario {
    /// A memory-backed scenario with `holder_count` empty accounts.
    pub async fn new(holder_count: usize) -> Result<Self> {
        Self::with_store(MemoryStore::new(), holder_count).await
    }
}

impl<S: Store> OpScenario<S> {
    pub async fn with_store(store: S, holder_count: usize) -> Result<Self> {
        let fixture =
            LedgerFixture::with_store(Keypair::from_seed(&[0xa0; 32]), store, LedgerConfig::default());
        let mint = fixture.mint(0).await?;
        let holders = holders(holder_count);
        let mut accounts = Vec::with_capacity(holder_count);
        for holder in &holders {
            accounts.push(fixture.account(mint, holder).await?);
        }
        Ok(Self {
            fixture,
            mint,
            holders,
            accounts,
        })
    }

    pub fn ledger(&self) -> &Ledger<S> {
        &self.fixture.ledger
    }

    fn signer(&self, index: usize) -> Principal {
        self.holders
            .get(index)
            .map(Keypair::principal)
            .unwrap_or_else(|| self.fixture.authority())
    }

    /// Apply one operation.
    pub async fn apply(&self, op: &LedgerOp) -> Result<()> {
        match *op {
            LedgerOp::Issue { to, signer, amount } => {
                self.ledger()
                    .issue(self.mint, self.accounts[to], self.signer(signer), amount)
                    .await?;
            }
            LedgerOp::Transfer {
                from,
                to,
                signer,
                amount,
            } => {
                self.ledger()
                    .transfer(
                        self.accounts[from],
                        self.accounts[to],
                        self.signer(signer),
                        amount,
                    )
                    .await?;
            }
            LedgerOp::Burn {
                from,
                signer,
                amount,
            } => {
                self.ledger()
                    .burn(self.mint, self.accounts[from], self.signer(signer), amount)
                    .await?;
            }
        }
        Ok(())
    }

    /// Canonical bytes of the mint followed by every account, in account order.
    pub async fn snapshot(&self) -> Result<Vec<Vec<u8>>> {
        let mint = self
            .ledger()
            .mint(&self.mint)
            .await?
            .ok_or(Error::MintNotFound(self.mint))?;
        let mut out = vec![canonical_mint_bytes(&mint)];
        for account in &self.accounts {
            let record = self
                .ledger()
                .account(account)
                .await?
                .ok_or(Error::AccountNotFound(*account))?;
            out.push(canonical_account_bytes(&record));
        }
        Ok(out)
    }

    /// Balances in account order.
    pub async fn balances(&self) -> Result<Vec<u64>> {
        let mut out = Vec::with_capacity(self.accounts.len());
        for account in &self.accounts {
            out.push(
                self.ledger()
                    .account(account)
                    .await?
                    .ok_or(Error::AccountNotFound(*account))?
                    .amount(),
            );
        }
        Ok(out)
    }
}
