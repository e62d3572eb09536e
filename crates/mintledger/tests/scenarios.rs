//! End-to-end ledger scenarios against both store backends.

use std::sync::Arc;

use mintledger::core::{canonical_account_bytes, canonical_mint_bytes, Keypair};
use mintledger::store::{MemoryStore, SqliteStore, Store};
use mintledger::{
    AccountAddress, Error, Ledger, LedgerConfig, LedgerError, MintAddress, Operation,
    OperationOutcome, Principal, SignedOperation,
};

struct World<S: Store> {
    ledger: Ledger<S>,
    authority: Keypair,
    alice: Keypair,
    bob: Keypair,
    mint: MintAddress,
    alice_account: AccountAddress,
    bob_account: AccountAddress,
}

async fn world<S: Store>(store: S) -> World<S> {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
    let ledger = Ledger::new(store, LedgerConfig::default());
    let authority = Keypair::from_seed(&[0xa0; 32]);
    let alice = Keypair::from_seed(&[0x01; 32]);
    let bob = Keypair::from_seed(&[0x02; 32]);

    let mint = ledger.initialize(9, authority.principal()).await.unwrap();
    let alice_account = ledger
        .create_token_account(mint.address(), alice.principal(), alice.principal())
        .await
        .unwrap();
    let bob_account = ledger
        .create_token_account(mint.address(), bob.principal(), alice.principal())
        .await
        .unwrap();

    World {
        ledger,
        authority,
        alice,
        bob,
        mint: mint.address(),
        alice_account: alice_account.address(),
        bob_account: bob_account.address(),
    }
}

impl<S: Store> World<S> {
    async fn fund_alice(&self, amount: u64) {
        self.ledger
            .issue(
                self.mint,
                self.alice_account,
                self.authority.principal(),
                amount,
            )
            .await
            .unwrap();
    }

    async fn amount(&self, account: AccountAddress) -> u64 {
        self.ledger.account(&account).await.unwrap().unwrap().amount()
    }

    async fn supply(&self) -> u64 {
        self.ledger.mint(&self.mint).await.unwrap().unwrap().total_supply()
    }

    /// Canonical bytes of every record, for byte-for-byte comparisons.
    async fn snapshot(&self) -> Vec<Vec<u8>> {
        let mut out = vec![canonical_mint_bytes(
            &self.ledger.mint(&self.mint).await.unwrap().unwrap(),
        )];
        for account in self.ledger.accounts_by_mint(&self.mint).await.unwrap() {
            out.push(canonical_account_bytes(&account));
        }
        out
    }
}

fn rule(err: Error) -> LedgerError {
    err.ledger_error()
        .cloned()
        .unwrap_or_else(|| panic!("expected a ledger rule violation, got {}", err))
}

// ─────────────────────────────────────────────────────────────────────────────
// Basic scenarios
// ─────────────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn initialize_creates_empty_mint() {
    let ledger = Ledger::new(MemoryStore::new(), LedgerConfig::default());
    let authority = Principal([0xa0; 32]);

    let mint = ledger.initialize(9, authority).await.unwrap();

    assert_eq!(mint.total_supply(), 0);
    assert_eq!(mint.decimals(), 9);
    assert_eq!(mint.authority(), authority);
    assert_eq!(ledger.mint(&mint.address()).await.unwrap(), Some(mint));
}

#[tokio::test]
async fn create_token_account_starts_empty() {
    let w = world(MemoryStore::new()).await;
    let account = w.ledger.account(&w.alice_account).await.unwrap().unwrap();

    assert_eq!(account.amount(), 0);
    assert_eq!(account.owner(), w.alice.principal());
    assert_eq!(account.mint(), w.mint);
    assert_eq!(
        account.address(),
        w.ledger.derive_account_address(&w.alice.principal(), &w.mint)
    );
}

#[tokio::test]
async fn issue_credits_account_and_supply() {
    let w = world(MemoryStore::new()).await;
    w.fund_alice(1000).await;

    assert_eq!(w.amount(w.alice_account).await, 1000);
    assert_eq!(w.supply().await, 1000);
}

#[tokio::test]
async fn transfer_moves_tokens() {
    let w = world(MemoryStore::new()).await;
    w.fund_alice(1000).await;

    w.ledger
        .transfer(w.alice_account, w.bob_account, w.alice.principal(), 300)
        .await
        .unwrap();

    assert_eq!(w.amount(w.alice_account).await, 700);
    assert_eq!(w.amount(w.bob_account).await, 300);
    assert_eq!(w.supply().await, 1000);
}

#[tokio::test]
async fn burn_debits_account_and_supply() {
    let w = world(MemoryStore::new()).await;
    w.fund_alice(2000).await;

    w.ledger
        .burn(w.mint, w.alice_account, w.alice.principal(), 500)
        .await
        .unwrap();

    assert_eq!(w.amount(w.alice_account).await, 1500);
    assert_eq!(w.supply().await, 1500);
}

#[tokio::test]
async fn overdraft_transfer_changes_nothing() {
    let w = world(MemoryStore::new()).await;
    w.fund_alice(100).await;
    let before = w.snapshot().await;

    let err = w
        .ledger
        .transfer(w.alice_account, w.bob_account, w.alice.principal(), 101)
        .await
        .unwrap_err();

    assert_eq!(
        rule(err),
        LedgerError::InsufficientFunds {
            available: 100,
            requested: 101
        }
    );
    assert_eq!(w.amount(w.alice_account).await, 100);
    assert_eq!(w.amount(w.bob_account).await, 0);
    assert_eq!(w.snapshot().await, before);
}

// ─────────────────────────────────────────────────────────────────────────────
// Rejections
// ─────────────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn rejected_operations_leave_records_untouched() {
    let w = world(MemoryStore::new()).await;
    w.fund_alice(500).await;

    let other = w
        .ledger
        .initialize(0, w.authority.principal())
        .await
        .unwrap();
    let before = w.snapshot().await;

    // Only the authority may issue.
    let err = w
        .ledger
        .issue(w.mint, w.alice_account, w.alice.principal(), 1)
        .await
        .unwrap_err();
    assert!(matches!(rule(err), LedgerError::Unauthorized { .. }));

    // Only the owner may transfer or burn.
    let err = w
        .ledger
        .transfer(w.alice_account, w.bob_account, w.bob.principal(), 1)
        .await
        .unwrap_err();
    assert!(matches!(rule(err), LedgerError::Unauthorized { .. }));
    let err = w
        .ledger
        .burn(w.mint, w.alice_account, w.authority.principal(), 1)
        .await
        .unwrap_err();
    assert!(matches!(rule(err), LedgerError::Unauthorized { .. }));

    // Accounts of one mint cannot be used with another.
    let err = w
        .ledger
        .issue(other.address(), w.alice_account, w.authority.principal(), 1)
        .await
        .unwrap_err();
    assert!(matches!(rule(err), LedgerError::MintMismatch { .. }));

    // Supply cannot overflow.
    let err = w
        .ledger
        .issue(w.mint, w.bob_account, w.authority.principal(), u64::MAX)
        .await
        .unwrap_err();
    assert_eq!(rule(err), LedgerError::Overflow);

    // Cannot burn more than held.
    let err = w
        .ledger
        .burn(w.mint, w.alice_account, w.alice.principal(), 501)
        .await
        .unwrap_err();
    assert!(matches!(rule(err), LedgerError::InsufficientFunds { .. }));

    assert_eq!(w.snapshot().await, before);
}

#[tokio::test]
async fn unauthorized_is_checked_before_mint_mismatch() {
    let w = world(MemoryStore::new()).await;
    let other = w
        .ledger
        .initialize(0, w.authority.principal())
        .await
        .unwrap();
    let carol = Keypair::from_seed(&[0x03; 32]);
    let foreign = w
        .ledger
        .create_token_account(other.address(), carol.principal(), carol.principal())
        .await
        .unwrap();

    let err = w
        .ledger
        .transfer(w.alice_account, foreign.address(), w.bob.principal(), 0)
        .await
        .unwrap_err();
    assert!(matches!(rule(err), LedgerError::Unauthorized { .. }));

    let err = w
        .ledger
        .transfer(w.alice_account, foreign.address(), w.alice.principal(), 0)
        .await
        .unwrap_err();
    assert!(matches!(rule(err), LedgerError::MintMismatch { .. }));
}

#[tokio::test]
async fn second_initialization_is_refused() {
    let w = world(MemoryStore::new()).await;
    w.fund_alice(10).await;

    let err = w
        .ledger
        .create_token_account(w.mint, w.alice.principal(), w.bob.principal())
        .await
        .unwrap_err();
    assert!(matches!(
        rule(err),
        LedgerError::AlreadyInitialized(mintledger::core::RecordAddress::Account(_))
    ));
    assert_eq!(w.amount(w.alice_account).await, 10);

    let err = w
        .ledger
        .initialize_at(w.mint, 2, w.bob.principal())
        .await
        .unwrap_err();
    assert!(matches!(
        rule(err),
        LedgerError::AlreadyInitialized(mintledger::core::RecordAddress::Mint(_))
    ));
    let mint = w.ledger.mint(&w.mint).await.unwrap().unwrap();
    assert_eq!(mint.authority(), w.authority.principal());
    assert_eq!(mint.decimals(), 9);
}

#[tokio::test]
async fn self_transfer_is_a_checked_no_op() {
    let w = world(MemoryStore::new()).await;
    w.fund_alice(50).await;

    w.ledger
        .transfer(w.alice_account, w.alice_account, w.alice.principal(), 50)
        .await
        .unwrap();
    assert_eq!(w.amount(w.alice_account).await, 50);

    let err = w
        .ledger
        .transfer(w.alice_account, w.alice_account, w.alice.principal(), 51)
        .await
        .unwrap_err();
    assert!(matches!(rule(err), LedgerError::InsufficientFunds { .. }));
}

// ─────────────────────────────────────────────────────────────────────────────
// Queries and audit
// ─────────────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn queries_and_audit() {
    let w = world(MemoryStore::new()).await;
    w.fund_alice(900).await;
    w.ledger
        .transfer(w.alice_account, w.bob_account, w.alice.principal(), 400)
        .await
        .unwrap();

    assert_eq!(
        w.ledger.balance(&w.bob.principal(), &w.mint).await.unwrap(),
        400
    );
    assert!(w
        .ledger
        .account_for(&w.bob.principal(), &w.mint)
        .await
        .unwrap()
        .is_some());
    assert_eq!(w.ledger.list_mints().await.unwrap(), vec![w.mint]);
    assert_eq!(
        w.ledger
            .accounts_by_owner(&w.alice.principal())
            .await
            .unwrap()
            .len(),
        1
    );

    let report = w.ledger.audit_supply(&w.mint).await.unwrap();
    assert!(report.consistent);
    assert_eq!(report.total_supply, 900);
    assert_eq!(report.account_sum, 900);
    assert_eq!(report.accounts, 2);

    let stranger = Principal([0x77; 32]);
    assert!(matches!(
        w.ledger.balance(&stranger, &w.mint).await,
        Err(Error::AccountNotFound(_))
    ));
}

// ─────────────────────────────────────────────────────────────────────────────
// Signed operations
// ─────────────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn submit_applies_signed_operations() {
    let ledger = Ledger::new(MemoryStore::new(), LedgerConfig::default());
    let authority = Keypair::from_seed(&[0xa0; 32]);
    let alice = Keypair::from_seed(&[0x01; 32]);
    let mint = MintAddress([0x42; 32]);

    ledger
        .submit(&SignedOperation::sign(
            &authority,
            Operation::Initialize { mint, decimals: 6 },
        ))
        .await
        .unwrap();
    let outcome = ledger
        .submit(&SignedOperation::sign(
            &alice,
            Operation::CreateTokenAccount {
                mint,
                owner: alice.principal(),
            },
        ))
        .await
        .unwrap();
    let account = match outcome {
        OperationOutcome::AccountCreated(account) => account.address(),
        other => panic!("unexpected outcome: {:?}", other),
    };

    ledger
        .submit(&SignedOperation::sign(
            &authority,
            Operation::Issue {
                mint,
                account,
                amount: 75,
            },
        ))
        .await
        .unwrap();
    ledger
        .submit(&SignedOperation::sign(
            &alice,
            Operation::Burn {
                mint,
                account,
                amount: 25,
            },
        ))
        .await
        .unwrap();

    assert_eq!(ledger.balance(&alice.principal(), &mint).await.unwrap(), 50);
    assert_eq!(
        ledger.mint(&mint).await.unwrap().unwrap().total_supply(),
        50
    );
}

#[tokio::test]
async fn submit_rejects_forged_envelopes() {
    let w = world(MemoryStore::new()).await;
    let mallory = Keypair::from_seed(&[0x66; 32]);
    let before = w.snapshot().await;

    // Signed by mallory, claiming to be the authority.
    let mut forged = SignedOperation::sign(
        &mallory,
        Operation::Issue {
            mint: w.mint,
            account: w.alice_account,
            amount: 1_000,
        },
    );
    forged.signer = w.authority.principal();
    assert!(matches!(
        w.ledger.submit(&forged).await,
        Err(Error::Authentication(_))
    ));

    // Genuine signature, amount changed afterwards.
    let mut tampered = SignedOperation::sign(
        &w.authority,
        Operation::Issue {
            mint: w.mint,
            account: w.alice_account,
            amount: 1,
        },
    );
    tampered.operation = Operation::Issue {
        mint: w.mint,
        account: w.alice_account,
        amount: 1_000,
    };
    assert!(matches!(
        w.ledger.submit(&tampered).await,
        Err(Error::Authentication(_))
    ));

    // Authentic, but mallory is not the authority.
    let honest = SignedOperation::sign(
        &mallory,
        Operation::Issue {
            mint: w.mint,
            account: w.alice_account,
            amount: 1_000,
        },
    );
    let err = w.ledger.submit(&honest).await.unwrap_err();
    assert!(matches!(rule(err), LedgerError::Unauthorized { .. }));

    assert_eq!(w.snapshot().await, before);
}

// ─────────────────────────────────────────────────────────────────────────────
// Concurrency and backends
// ─────────────────────────────────────────────────────────────────────────────

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_transfers_conserve_supply() {
    let ledger = Arc::new(Ledger::new(MemoryStore::new(), LedgerConfig::default()));
    let authority = Keypair::from_seed(&[0xa0; 32]);
    let mint = ledger.initialize(0, authority.principal()).await.unwrap();

    let owners: Vec<Keypair> = (1..=4u8).map(|i| Keypair::from_seed(&[i; 32])).collect();
    let mut accounts = Vec::new();
    for owner in &owners {
        let account = ledger
            .create_token_account(mint.address(), owner.principal(), owner.principal())
            .await
            .unwrap();
        ledger
            .issue(mint.address(), account.address(), authority.principal(), 1_000)
            .await
            .unwrap();
        accounts.push(account.address());
    }

    let mut tasks = Vec::new();
    for i in 0..200usize {
        let ledger = ledger.clone();
        let from = i % 4;
        let to = (i * 7 + 1) % 4;
        let signer = owners[from].principal();
        let (from, to) = (accounts[from], accounts[to]);
        tasks.push(tokio::spawn(async move {
            // Overdrafts are allowed to fail; they must not corrupt anything.
            let _ = ledger.transfer(from, to, signer, (i % 13) as u64 * 10).await;
        }));
    }
    for task in tasks {
        task.await.unwrap();
    }

    let report = ledger.audit_supply(&mint.address()).await.unwrap();
    assert!(report.consistent);
    assert_eq!(report.total_supply, 4_000);
    assert_eq!(report.account_sum, 4_000);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn two_ledgers_sharing_a_database_keep_supply_consistent() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("ledger.db");
    let first = Arc::new(Ledger::new(SqliteStore::open(&path).unwrap(), LedgerConfig::default()));
    let second = Arc::new(Ledger::new(SqliteStore::open(&path).unwrap(), LedgerConfig::default()));

    let authority = Keypair::from_seed(&[0xa0; 32]);
    let alice = Keypair::from_seed(&[0x01; 32]);
    let bob = Keypair::from_seed(&[0x02; 32]);
    let mint = first.initialize(0, authority.principal()).await.unwrap().address();
    let alice_account = first
        .create_token_account(mint, alice.principal(), alice.principal())
        .await
        .unwrap()
        .address();
    let bob_account = second
        .create_token_account(mint, bob.principal(), bob.principal())
        .await
        .unwrap()
        .address();

    let mut tasks = Vec::new();
    for i in 0..400usize {
        let ledger = if i % 2 == 0 { first.clone() } else { second.clone() };
        let (authority, alice) = (authority.principal(), alice.principal());
        tasks.push(tokio::spawn(async move {
            ledger.issue(mint, alice_account, authority, 1).await.unwrap();
            if i % 5 == 0 {
                // May overdraw while issues are still landing; that is a clean rejection.
                let _ = ledger.transfer(alice_account, bob_account, alice, 2).await;
            }
        }));
    }
    for task in tasks {
        task.await.unwrap();
    }

    for ledger in [&first, &second] {
        let report = ledger.audit_supply(&mint).await.unwrap();
        assert!(report.consistent, "{:?}", report);
        assert_eq!(report.total_supply, 400);
        assert_eq!(report.account_sum, 400);
    }
}

/// Run one fixed script; return supply, both balances and the error messages.
async fn script<S: Store>(store: S) -> (Vec<u64>, Vec<String>) {
    let w = world(store).await;
    let mut errors = Vec::new();

    w.fund_alice(1_000).await;
    for (amount, signer) in [
        (250, w.alice.principal()),
        (5_000, w.alice.principal()),
        (10, w.bob.principal()),
    ] {
        if let Err(e) = w
            .ledger
            .transfer(w.alice_account, w.bob_account, signer, amount)
            .await
        {
            errors.push(e.to_string());
        }
    }
    if let Err(e) = w
        .ledger
        .burn(w.mint, w.bob_account, w.bob.principal(), 100)
        .await
    {
        errors.push(e.to_string());
    }

    // Mint addresses are random, so compare amounts rather than record bytes.
    let amounts = vec![
        w.supply().await,
        w.amount(w.alice_account).await,
        w.amount(w.bob_account).await,
    ];
    (amounts, errors)
}

#[tokio::test]
async fn memory_and_sqlite_agree() {
    let memory = script(MemoryStore::new()).await;
    let sqlite = script(SqliteStore::open_memory().unwrap()).await;
    assert_eq!(memory, sqlite);
    assert_eq!(memory.0, vec![900, 750, 150]);
    assert_eq!(memory.1.len(), 2);
}

#[tokio::test]
async fn sqlite_ledger_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("ledger.db");

    let (mint, account) = {
        let w = world(SqliteStore::open(&path).unwrap()).await;
        w.fund_alice(321).await;
        (w.mint, w.alice_account)
    };

    let ledger = Ledger::new(SqliteStore::open(&path).unwrap(), LedgerConfig::default());
    assert_eq!(
        ledger.account(&account).await.unwrap().unwrap().amount(),
        321
    );
    assert!(ledger.audit_supply(&mint).await.unwrap().consistent);
}
