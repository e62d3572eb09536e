//! Supply conservation check.

use serde::{Deserialize, Serialize};

use crate::record::{AccountRecord, MintRecord};
use crate::types::MintAddress;

/// Outcome of comparing a mint's supply to the balances held against it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SupplyReport {
    pub mint: MintAddress,
    pub total_supply: u64,
    /// Sum of balances, in `u128` so that a corrupted store cannot overflow it.
    pub account_sum: u128,
    pub accounts: usize,
    pub consistent: bool,
}

/// Sum every account of `mint` and compare against its total supply.
///
/// Accounts belonging to other mints are ignored.
pub fn check_supply<'a, I>(mint: &MintRecord, accounts: I) -> SupplyReport
where
    I: IntoIterator<Item = &'a AccountRecord>,
{
    let (account_sum, count) = accounts
        .into_iter()
        .filter(|a| a.mint() == mint.address())
        .fold((0u128, 0usize), |(sum, n), a| (sum + a.amount() as u128, n + 1));

    SupplyReport {
        mint: mint.address(),
        total_supply: mint.total_supply(),
        account_sum,
        accounts: count,
        consistent: account_sum == mint.total_supply() as u128,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::Principal;
    use crate::derive::TOKEN_ACCOUNT_NAMESPACE;
    use crate::transition::{issue, transfer};

    #[test]
    fn test_empty_mint_is_consistent() {
        let mint = MintRecord::new(MintAddress([1; 32]), Principal([9; 32]), 0);
        let report = check_supply(&mint, &[]);
        assert!(report.consistent);
        assert_eq!(report.accounts, 0);
    }

    #[test]
    fn test_consistent_after_issue_and_transfer() {
        let authority = Principal([9; 32]);
        let mint = MintRecord::new(MintAddress([1; 32]), authority, 0);
        let alice = AccountRecord::new(TOKEN_ACCOUNT_NAMESPACE, Principal([1; 32]), mint.address());
        let bob = AccountRecord::new(TOKEN_ACCOUNT_NAMESPACE, Principal([2; 32]), mint.address());

        let issued = issue(&mint, &alice, &authority, 500).unwrap();
        let moved = transfer(&issued.account, &bob, &Principal([1; 32]), 200).unwrap();

        let report = check_supply(&issued.mint, [&moved.from, &moved.to]);
        assert!(report.consistent);
        assert_eq!(report.account_sum, 500);
    }

    #[test]
    fn test_stale_balance_detected() {
        let authority = Principal([9; 32]);
        let mint = MintRecord::new(MintAddress([1; 32]), authority, 0);
        let alice = AccountRecord::new(TOKEN_ACCOUNT_NAMESPACE, Principal([1; 32]), mint.address());

        let issued = issue(&mint, &alice, &authority, 500).unwrap();
        // Supply updated, balance not.
        let report = check_supply(&issued.mint, [&alice]);
        assert!(!report.consistent);
        assert_eq!(report.total_supply, 500);
        assert_eq!(report.account_sum, 0);
    }

    #[test]
    fn test_other_mints_ignored() {
        let authority = Principal([9; 32]);
        let mint = MintRecord::new(MintAddress([1; 32]), authority, 0);
        let other = MintRecord::new(MintAddress([2; 32]), authority, 0);
        let stranger =
            AccountRecord::new(TOKEN_ACCOUNT_NAMESPACE, Principal([1; 32]), other.address());
        let funded = issue(&other, &stranger, &authority, 10).unwrap();

        let report = check_supply(&mint, [&funded.account]);
        assert!(report.consistent);
        assert_eq!(report.accounts, 0);
    }
}
