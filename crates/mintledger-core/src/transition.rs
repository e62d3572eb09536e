//! Checked ledger transitions: issue, transfer, burn.
//!
//! Each transition takes the current records by reference, checks every
//! precondition in a fixed order, and only then returns the new records.
//! Inputs are never modified, so a rejected transition leaves nothing to
//! roll back. Committing the returned records is the caller's job.

use crate::auth::require_signer;
use crate::crypto::Principal;
use crate::error::LedgerError;
use crate::record::{AccountRecord, MintRecord};

/// New mint and account values after an issue or burn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SupplyChange {
    pub mint: MintRecord,
    pub account: AccountRecord,
}

/// New values of both accounts after a transfer.
///
/// For a self-transfer `from` and `to` are the same unchanged record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferChange {
    pub from: AccountRecord,
    pub to: AccountRecord,
}

/// Issue `amount` new tokens into `account`.
///
/// Checks, in order: signer is the mint authority, account belongs to the
/// mint, neither supply nor balance overflows.
pub fn issue(
    mint: &MintRecord,
    account: &AccountRecord,
    signer: &Principal,
    amount: u64,
) -> Result<SupplyChange, LedgerError> {
    require_signer(&mint.authority(), signer)?;
    require_same_mint(mint, account)?;

    let total_supply = mint
        .total_supply()
        .checked_add(amount)
        .ok_or(LedgerError::Overflow)?;
    let balance = account
        .amount()
        .checked_add(amount)
        .ok_or(LedgerError::Overflow)?;

    let mut mint = mint.clone();
    let mut account = account.clone();
    mint.set_total_supply(total_supply);
    account.set_amount(balance);
    Ok(SupplyChange { mint, account })
}

/// Move `amount` from `from` to `to`.
///
/// Checks, in order: signer owns `from`, both accounts share a mint, `from`
/// holds at least `amount`, `to` does not overflow.
pub fn transfer(
    from: &AccountRecord,
    to: &AccountRecord,
    signer: &Principal,
    amount: u64,
) -> Result<TransferChange, LedgerError> {
    require_signer(&from.owner(), signer)?;
    if from.mint() != to.mint() {
        return Err(LedgerError::MintMismatch {
            expected: from.mint(),
            actual: to.mint(),
        });
    }
    let debited = debit(from, amount)?;

    if from.address() == to.address() {
        return Ok(TransferChange {
            from: from.clone(),
            to: to.clone(),
        });
    }

    let credited = to.amount().checked_add(amount).ok_or(LedgerError::Overflow)?;

    let mut from = from.clone();
    let mut to = to.clone();
    from.set_amount(debited);
    to.set_amount(credited);
    Ok(TransferChange { from, to })
}

/// Destroy `amount` tokens held in `account`.
///
/// Checks, in order: signer owns the account, account belongs to the mint,
/// account holds at least `amount`.
pub fn burn(
    mint: &MintRecord,
    account: &AccountRecord,
    signer: &Principal,
    amount: u64,
) -> Result<SupplyChange, LedgerError> {
    require_signer(&account.owner(), signer)?;
    require_same_mint(mint, account)?;
    let balance = debit(account, amount)?;

    // Supply covers every balance, so this only fails on a corrupted mint.
    let total_supply = mint
        .total_supply()
        .checked_sub(amount)
        .ok_or(LedgerError::Overflow)?;

    let mut mint = mint.clone();
    let mut account = account.clone();
    mint.set_total_supply(total_supply);
    account.set_amount(balance);
    Ok(SupplyChange { mint, account })
}

fn require_same_mint(mint: &MintRecord, account: &AccountRecord) -> Result<(), LedgerError> {
    if account.mint() == mint.address() {
        Ok(())
    } else {
        Err(LedgerError::MintMismatch {
            expected: mint.address(),
            actual: account.mint(),
        })
    }
}

fn debit(account: &AccountRecord, amount: u64) -> Result<u64, LedgerError> {
    account
        .amount()
        .checked_sub(amount)
        .ok_or(LedgerError::InsufficientFunds {
            available: account.amount(),
            requested: amount,
        })
}
