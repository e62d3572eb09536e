//! mintledger: command-line client for a SQLite-backed Mint Ledger.
//!
//! Every mutating command is signed with the payer keypair and submitted
//! through [`Ledger::submit`], so the ledger sees exactly what a remote
//! client would send.

mod keyfile;

use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing_subscriber::EnvFilter;

use mintledger::store::SqliteStore;
use mintledger::{
    AccountRecord, Keypair, Ledger, LedgerConfig, MintAddress, Operation, OperationOutcome,
    Principal, SignedOperation, SupplyReport,
};

use crate::keyfile::{load_keypair, save_keypair};

/// Mint Ledger command-line client
#[derive(Parser, Debug)]
#[command(name = "mintledger", version)]
#[command(about = "Create mints and token accounts; issue, transfer and burn tokens")]
struct Cli {
    /// Ledger database file
    #[arg(long, env = "MINTLEDGER_DB", default_value = "mintledger.db")]
    db: PathBuf,

    /// Payer keypair file
    #[arg(short, long, env = "MINTLEDGER_KEYPAIR", default_value = "mintledger-keypair.json")]
    keypair: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Generate a new keypair file
    Keygen {
        /// Where to write it (defaults to --keypair)
        #[arg(short, long)]
        out: Option<PathBuf>,
    },
    /// Initialize a new token mint with the payer as authority
    Init {
        /// Decimal places (informational)
        #[arg(short, long)]
        decimals: u8,

        /// Keypair whose public key becomes the mint address
        #[arg(short, long)]
        mint_keypair: Option<PathBuf>,
    },
    /// Create a token account
    CreateAccount {
        /// Mint address (hex)
        #[arg(short, long, value_parser = parse_mint)]
        mint: MintAddress,

        /// Account owner (defaults to the payer)
        #[arg(short, long, value_parser = parse_principal)]
        owner: Option<Principal>,
    },
    /// Issue tokens to an owner's account (payer must be the mint authority)
    Mint {
        #[arg(short, long, value_parser = parse_mint)]
        mint: MintAddress,

        /// Recipient owner
        #[arg(short, long, value_parser = parse_principal)]
        to: Principal,

        #[arg(short, long)]
        amount: u64,
    },
    /// Transfer tokens from the payer's account
    Transfer {
        #[arg(short, long, value_parser = parse_mint)]
        mint: MintAddress,

        /// Recipient owner
        #[arg(short, long, value_parser = parse_principal)]
        to: Principal,

        #[arg(short, long)]
        amount: u64,
    },
    /// Burn tokens from the payer's account
    Burn {
        #[arg(short, long, value_parser = parse_mint)]
        mint: MintAddress,

        #[arg(short, long)]
        amount: u64,
    },
    /// Show an owner's balance
    Balance {
        #[arg(short, long, value_parser = parse_mint)]
        mint: MintAddress,

        /// Owner (defaults to the payer)
        #[arg(short, long, value_parser = parse_principal)]
        owner: Option<Principal>,
    },
    /// Show a mint, its holders and a supply audit
    MintInfo {
        #[arg(short, long, value_parser = parse_mint)]
        mint: MintAddress,

        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },
}

fn parse_mint(s: &str) -> std::result::Result<MintAddress, String> {
    MintAddress::from_hex(s).map_err(|e| format!("invalid mint address: {}", e))
}

fn parse_principal(s: &str) -> std::result::Result<Principal, String> {
    Principal::from_hex(s).map_err(|e| format!("invalid public key: {}", e))
}

#[derive(Debug, Serialize)]
struct MintInfo {
    mint: String,
    authority: String,
    decimals: u8,
    total_supply: u64,
    holders: Vec<Holder>,
    audit: SupplyReport,
}

#[derive(Debug, Serialize)]
struct Holder {
    account: String,
    owner: String,
    amount: u64,
}

impl From<&AccountRecord> for Holder {
    fn from(account: &AccountRecord) -> Self {
        Self {
            account: account.address().to_hex(),
            owner: account.owner().to_hex(),
            amount: account.amount(),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    run(cli, &mut std::io::stdout()).await
}

async fn run<W: Write>(cli: Cli, out: &mut W) -> Result<()> {
    let payer = || load_keypair(&cli.keypair).context("failed to load payer keypair");
    let open = || -> Result<Ledger<SqliteStore>> {
        let store = SqliteStore::open(&cli.db)
            .with_context(|| format!("failed to open ledger database {}", cli.db.display()))?;
        Ok(Ledger::new(store, LedgerConfig::default()))
    };

    match &cli.command {
        Commands::Keygen { out: path } => {
            let path = path.as_deref().unwrap_or(&cli.keypair);
            let keypair = Keypair::generate();
            save_keypair(path, &keypair)?;
            writeln!(out, "✓ Keypair written to {}", path.display())?;
            writeln!(out, "  Public key: {}", keypair.principal().to_hex())?;
        }
        Commands::Init {
            decimals,
            mint_keypair,
        } => {
            let (ledger, payer) = (open()?, payer()?);
            init_mint(
                &ledger,
                &payer,
                *decimals,
                mint_keypair.as_deref(),
                Path::new("."),
                out,
            )
            .await?;
        }
        Commands::CreateAccount { mint, owner } => {
            let (ledger, payer, mint) = (open()?, payer()?, *mint);
            let owner = owner.unwrap_or_else(|| payer.principal());

            let outcome =
                submit(&ledger, &payer, Operation::CreateTokenAccount { mint, owner }).await?;
            if let OperationOutcome::AccountCreated(account) = outcome {
                writeln!(out, "✓ Token account created")?;
                writeln!(out, "  Account: {}", account.address().to_hex())?;
                writeln!(out, "  Owner: {}", owner.to_hex())?;
            }
        }
        Commands::Mint { mint, to, amount } => {
            let (ledger, payer) = (open()?, payer()?);
            let (mint, amount) = (*mint, *amount);
            let account = ledger.derive_account_address(to, &mint);

            let outcome = submit(
                &ledger,
                &payer,
                Operation::Issue {
                    mint,
                    account,
                    amount,
                },
            )
            .await?;
            if let OperationOutcome::Issued(change) = outcome {
                writeln!(out, "✓ Minted {} tokens", amount)?;
                writeln!(out, "  Balance: {}", change.account.amount())?;
                writeln!(out, "  Total supply: {}", change.mint.total_supply())?;
            }
        }
        Commands::Transfer { mint, to, amount } => {
            let (ledger, payer, amount) = (open()?, payer()?, *amount);
            let from = ledger.derive_account_address(&payer.principal(), mint);
            let to = ledger.derive_account_address(to, mint);

            let outcome = submit(&ledger, &payer, Operation::Transfer { from, to, amount }).await?;
            if let OperationOutcome::Transferred(change) = outcome {
                writeln!(out, "✓ Transferred {} tokens", amount)?;
                writeln!(out, "  Sender balance: {}", change.from.amount())?;
                writeln!(out, "  Recipient balance: {}", change.to.amount())?;
            }
        }
        Commands::Burn { mint, amount } => {
            let (ledger, payer) = (open()?, payer()?);
            let (mint, amount) = (*mint, *amount);
            let account = ledger.derive_account_address(&payer.principal(), &mint);

            let outcome = submit(
                &ledger,
                &payer,
                Operation::Burn {
                    mint,
                    account,
                    amount,
                },
            )
            .await?;
            if let OperationOutcome::Burned(change) = outcome {
                writeln!(out, "✓ Burned {} tokens", amount)?;
                writeln!(out, "  Balance: {}", change.account.amount())?;
                writeln!(out, "  Total supply: {}", change.mint.total_supply())?;
            }
        }
        Commands::Balance { mint, owner } => {
            let owner = match owner {
                Some(owner) => *owner,
                None => payer()?.principal(),
            };
            let balance = open()?.balance(&owner, mint).await?;
            writeln!(out, "{}", balance)?;
        }
        Commands::MintInfo { mint, json } => {
            let ledger = open()?;
            let record = ledger
                .mint(mint)
                .await?
                .with_context(|| format!("mint {} not found", mint.to_hex()))?;
            let holders = ledger.accounts_by_mint(mint).await?;
            let audit = ledger.audit_supply(mint).await?;

            let info = MintInfo {
                mint: mint.to_hex(),
                authority: record.authority().to_hex(),
                decimals: record.decimals(),
                total_supply: record.total_supply(),
                holders: holders.iter().map(Holder::from).collect(),
                audit,
            };
            print_mint_info(out, &info, *json)?;
        }
    }

    Ok(())
}

/// Initialize a mint owned by `payer`.
///
/// Without `mint_keypair` a fresh keypair supplies the address; its file is
/// written to `keyfile_dir` only once the mint exists.
async fn init_mint<W: Write>(
    ledger: &Ledger<SqliteStore>,
    payer: &Keypair,
    decimals: u8,
    mint_keypair: Option<&Path>,
    keyfile_dir: &Path,
    out: &mut W,
) -> Result<MintAddress> {
    let (mint_keys, generated) = match mint_keypair {
        Some(path) => (load_keypair(path).context("failed to load mint keypair")?, false),
        None => (Keypair::generate(), true),
    };
    let mint = MintAddress(mint_keys.principal().0);

    submit(ledger, payer, Operation::Initialize { mint, decimals }).await?;

    if generated {
        let path = keyfile_dir.join(format!("mint-{}.json", mint.to_hex()));
        save_keypair(&path, &mint_keys).context("failed to save mint keypair")?;
        writeln!(out, "Generated new mint keypair: {}", path.display())?;
    }
    writeln!(out, "✓ Token mint initialized")?;
    writeln!(out, "  Mint address: {}", mint.to_hex())?;
    writeln!(out, "  Authority: {}", payer.principal().to_hex())?;
    writeln!(out, "  Decimals: {}", decimals)?;
    Ok(mint)
}

async fn submit(
    ledger: &Ledger<SqliteStore>,
    payer: &Keypair,
    operation: Operation,
) -> Result<OperationOutcome> {
    let kind = operation.kind();
    tracing::debug!(%kind, signer = %payer.principal(), "submitting operation");
    let envelope = SignedOperation::sign(payer, operation);
    ledger
        .submit(&envelope)
        .await
        .with_context(|| format!("{} failed", kind))
}

fn print_mint_info<W: Write>(out: &mut W, info: &MintInfo, json: bool) -> Result<()> {
    if json {
        serde_json::to_writer_pretty(&mut *out, info)?;
        writeln!(out)?;
        return Ok(());
    }

    writeln!(out, "Mint: {}", info.mint)?;
    writeln!(out, "  Authority: {}", info.authority)?;
    writeln!(out, "  Decimals: {}", info.decimals)?;
    writeln!(out, "  Total supply: {}", info.total_supply)?;
    writeln!(out, "  Holders: {}", info.holders.len())?;
    for holder in &info.holders {
        writeln!(out, "    {} {}", holder.owner, holder.amount)?;
    }
    if !info.audit.consistent {
        writeln!(
            out,
            "  WARNING: balances sum to {}, supply is {}",
            info.audit.account_sum, info.audit.total_supply
        )?;
    }
    Ok(())
}
