//! Test fixtures and helpers.
//!
//! Common setup code for integration tests.

use mintledger::{Ledger, LedgerConfig, Result};
use mintledger_core::{AccountAddress, Keypair, MintAddress, Principal};
use mintledger_store::{MemoryStore, Store};

/// A ledger over a memory store plus a mint authority keypair.
pub struct LedgerFixture<S: Store = MemoryStore> {
    pub authority: Keypair,
    pub ledger: Ledger<S>,
}

impl LedgerFixture {
    /// Create a new fixture with a random authority.
    pub fn new() -> Self {
        Self::with_store(Keypair::generate(), MemoryStore::new(), LedgerConfig::default())
    }

    /// Create with a deterministic authority from seed.
    pub fn with_seed(seed: [u8; 32]) -> Self {
        Self::with_store(
            Keypair::from_seed(&seed),
            MemoryStore::new(),
            LedgerConfig::default(),
        )
    }
}

impl Default for LedgerFixture {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: Store> LedgerFixture<S> {
    /// Create over any store.
    pub fn with_store(authority: Keypair, store: S, config: LedgerConfig) -> Self {
        Self {
            authority,
            ledger: Ledger::new(store, config),
        }
    }

    pub fn authority(&self) -> Principal {
        self.authority.principal()
    }

    /// Initialize a mint owned by the fixture's authority.
    pub async fn mint(&self, decimals: u8) -> Result<MintAddress> {
        let mint = self.ledger.initialize(decimals, self.authority()).await?;
        Ok(mint.address())
    }

    /// Create `owner`'s account for `mint`, paid by the owner.
    pub async fn account(&self, mint: MintAddress, owner: &Keypair) -> Result<AccountAddress> {
        let account = self
            .ledger
            .create_token_account(mint, owner.principal(), owner.principal())
            .await?;
        Ok(account.address())
    }

    /// Create `owner`'s account and issue `amount` into it.
    pub async fn funded_account(
        &self,
        mint: MintAddress,
        owner: &Keypair,
        amount: u64,
    ) -> Result<AccountAddress> {
        let account = self.account(mint, owner).await?;
        self.ledger
            .issue(mint, account, self.authority(), amount)
            .await?;
        Ok(account)
    }
}

/// Deterministic keypairs for multi-party tests.
pub fn holders(count: usize) -> Vec<Keypair> {
    (0..count)
        .map(|i| {
            let mut seed = [0u8; 32];
            seed[0] = i as u8;
            Keypair::from_seed(&seed)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_funded_account() {
        let fixture = LedgerFixture::with_seed([0xa0; 32]);
        let alice = Keypair::from_seed(&[1; 32]);

        let mint = fixture.mint(6).await.unwrap();
        let account = fixture.funded_account(mint, &alice, 250).await.unwrap();

        let record = fixture.ledger.account(&account).await.unwrap().unwrap();
        assert_eq!(record.amount(), 250);
        assert_eq!(record.owner(), alice.principal());
        assert_eq!(
            fixture.ledger.mint(&mint).await.unwrap().unwrap().total_supply(),
            250
        );
    }

    #[test]
    fn test_holders_are_distinct() {
        let keys = holders(5);
        for (i, a) in keys.iter().enumerate() {
            for b in &keys[i + 1..] {
                assert_ne!(a.principal(), b.principal());
            }
        }
    }
}
