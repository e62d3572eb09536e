//! Mint and account records.
//!
//! Fields are private: identity fields (`address`, `authority`, `decimals`,
//! `owner`, `mint`) are fixed at construction, and balances change only
//! through the checked transitions in [`crate::transition`].

use serde::Serialize;

use crate::crypto::Principal;
use crate::derive::derive_address;
use crate::types::{AccountAddress, MintAddress};

/// The per-token-type ledger header.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MintRecord {
    address: MintAddress,
    authority: Principal,
    decimals: u8,
    total_supply: u64,
}

impl MintRecord {
    /// A freshly initialized mint with zero supply.
    pub fn new(address: MintAddress, authority: Principal, decimals: u8) -> Self {
        Self {
            address,
            authority,
            decimals,
            total_supply: 0,
        }
    }

    /// Rebuild a stored record. Only decoders call this.
    pub(crate) fn from_parts(
        address: MintAddress,
        authority: Principal,
        decimals: u8,
        total_supply: u64,
    ) -> Self {
        Self {
            address,
            authority,
            decimals,
            total_supply,
        }
    }

    pub fn address(&self) -> MintAddress {
        self.address
    }

    /// The only principal allowed to issue new tokens.
    pub fn authority(&self) -> Principal {
        self.authority
    }

    /// Scaling exponent. Informational only; amounts are raw integers.
    pub fn decimals(&self) -> u8 {
        self.decimals
    }

    pub fn total_supply(&self) -> u64 {
        self.total_supply
    }

    /// Whether `other` describes the same mint, ignoring supply.
    pub fn same_identity(&self, other: &MintRecord) -> bool {
        self.address == other.address
            && self.authority == other.authority
            && self.decimals == other.decimals
    }

    pub(crate) fn set_total_supply(&mut self, total_supply: u64) {
        self.total_supply = total_supply;
    }
}

/// A per-owner balance entry for one mint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AccountRecord {
    address: AccountAddress,
    owner: Principal,
    mint: MintAddress,
    amount: u64,
}

impl AccountRecord {
    /// An empty account at the address derived from `(namespace, owner, mint)`.
    pub fn new(namespace: &[u8], owner: Principal, mint: MintAddress) -> Self {
        Self {
            address: derive_address(namespace, &owner, &mint),
            owner,
            mint,
            amount: 0,
        }
    }

    pub(crate) fn from_parts(
        address: AccountAddress,
        owner: Principal,
        mint: MintAddress,
        amount: u64,
    ) -> Self {
        Self {
            address,
            owner,
            mint,
            amount,
        }
    }

    pub fn address(&self) -> AccountAddress {
        self.address
    }

    /// The principal that must authorize transfers and burns.
    pub fn owner(&self) -> Principal {
        self.owner
    }

    pub fn mint(&self) -> MintAddress {
        self.mint
    }

    pub fn amount(&self) -> u64 {
        self.amount
    }

    /// Whether `other` describes the same account, ignoring the balance.
    pub fn same_identity(&self, other: &AccountRecord) -> bool {
        self.address == other.address && self.owner == other.owner && self.mint == other.mint
    }

    pub(crate) fn set_amount(&mut self, amount: u64) {
        self.amount = amount;
    }
}
