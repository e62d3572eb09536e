//! Deterministic token account addressing.
//!
//! An account address is `Blake3(domain || len(namespace) || namespace ||
//! owner || mint)`. The namespace is length-prefixed and owner and mint are
//! fixed width, so distinct inputs never share a preimage.

use crate::crypto::Principal;
use crate::types::{AccountAddress, MintAddress};

/// Namespace used for token accounts unless configured otherwise.
pub const TOKEN_ACCOUNT_NAMESPACE: &[u8] = b"token";

const DOMAIN: &[u8] = b"mintledger-account-v0:";

/// Derive the storage address of `owner`'s account for `mint`.
pub fn derive_address(namespace: &[u8], owner: &Principal, mint: &MintAddress) -> AccountAddress {
    let mut hasher = blake3::Hasher::new();
    hasher.update(DOMAIN);
    hasher.update(&(namespace.len() as u64).to_le_bytes());
    hasher.update(namespace);
    hasher.update(owner.as_bytes());
    hasher.update(mint.as_bytes());
    AccountAddress(*hasher.finalize().as_bytes())
}

/// Derive under [`TOKEN_ACCOUNT_NAMESPACE`].
pub fn token_account_address(owner: &Principal, mint: &MintAddress) -> AccountAddress {
    derive_address(TOKEN_ACCOUNT_NAMESPACE, owner, mint)
}
