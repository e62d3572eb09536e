//! Ledger operations and signed operation envelopes.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::canonical::canonical_operation_bytes;
use crate::crypto::{Ed25519Signature, Keypair, Principal};
use crate::types::{AccountAddress, MintAddress};

/// Domain tag prepended to the canonical operation bytes before signing.
pub const SIGN_DOMAIN: &[u8] = b"mintledger-op-v0:";

/// A request to change ledger state.
///
/// The acting principal is not part of the operation: it is the verified
/// signer of the envelope carrying it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Operation {
    /// Create a mint at `mint` with the signer as authority.
    Initialize { mint: MintAddress, decimals: u8 },

    /// Create `owner`'s account for `mint`, paid for by the signer.
    CreateTokenAccount { mint: MintAddress, owner: Principal },

    /// Issue new tokens. Signer must be the mint authority.
    Issue {
        mint: MintAddress,
        account: AccountAddress,
        amount: u64,
    },

    /// Move tokens between accounts of one mint. Signer must own `from`.
    Transfer {
        from: AccountAddress,
        to: AccountAddress,
        amount: u64,
    },

    /// Destroy tokens. Signer must own `account`.
    Burn {
        mint: MintAddress,
        account: AccountAddress,
        amount: u64,
    },
}

impl Operation {
    pub fn kind(&self) -> OperationKind {
        match self {
            Operation::Initialize { .. } => OperationKind::Initialize,
            Operation::CreateTokenAccount { .. } => OperationKind::CreateTokenAccount,
            Operation::Issue { .. } => OperationKind::Issue,
            Operation::Transfer { .. } => OperationKind::Transfer,
            Operation::Burn { .. } => OperationKind::Burn,
        }
    }

    /// The exact bytes a signer signs: `SIGN_DOMAIN || canonical bytes`.
    pub fn signing_message(&self) -> Vec<u8> {
        let mut buf = SIGN_DOMAIN.to_vec();
        buf.extend_from_slice(&canonical_operation_bytes(self));
        buf
    }
}

/// Discriminator for operations, stable across encodings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum OperationKind {
    Initialize = 0,
    CreateTokenAccount = 1,
    Issue = 2,
    Transfer = 3,
    Burn = 4,
}

impl OperationKind {
    pub fn to_u8(self) -> u8 {
        self as u8
    }

    pub fn from_u8(v: u8) -> Option<Self> {
        match v {
            0 => Some(OperationKind::Initialize),
            1 => Some(OperationKind::CreateTokenAccount),
            2 => Some(OperationKind::Issue),
            3 => Some(OperationKind::Transfer),
            4 => Some(OperationKind::Burn),
            _ => None,
        }
    }
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            OperationKind::Initialize => "initialize",
            OperationKind::CreateTokenAccount => "create_token_account",
            OperationKind::Issue => "issue",
            OperationKind::Transfer => "transfer",
            OperationKind::Burn => "burn",
        };
        f.write_str(name)
    }
}

/// An operation together with its claimed signer and signature.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignedOperation {
    pub signer: Principal,
    pub operation: Operation,
    pub signature: Ed25519Signature,
}

impl SignedOperation {
    /// Sign `operation` with `keypair`.
    pub fn sign(keypair: &Keypair, operation: Operation) -> Self {
        let signature = keypair.sign(&operation.signing_message());
        Self {
            signer: keypair.principal(),
            operation,
            signature,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_u8_mapping() {
        for kind in [
            OperationKind::Initialize,
            OperationKind::CreateTokenAccount,
            OperationKind::Issue,
            OperationKind::Transfer,
            OperationKind::Burn,
        ] {
            assert_eq!(OperationKind::from_u8(kind.to_u8()), Some(kind));
        }
        assert_eq!(OperationKind::from_u8(5), None);
    }

    #[test]
    fn test_signing_message_is_domain_separated() {
        let op = Operation::Initialize {
            mint: MintAddress::from_bytes([1; 32]),
            decimals: 9,
        };
        let message = op.signing_message();
        assert!(message.starts_with(SIGN_DOMAIN));
        assert_eq!(&message[SIGN_DOMAIN.len()..], canonical_operation_bytes(&op).as_slice());
    }

    #[test]
    fn test_signed_operation_carries_signer() {
        let keypair = Keypair::from_seed(&[3; 32]);
        let op = Operation::Transfer {
            from: AccountAddress::from_bytes([1; 32]),
            to: AccountAddress::from_bytes([2; 32]),
            amount: 300,
        };
        let envelope = SignedOperation::sign(&keypair, op.clone());
        assert_eq!(envelope.signer, keypair.principal());
        assert_eq!(envelope.operation.kind(), OperationKind::Transfer);
        keypair
            .principal()
            .verify(&op.signing_message(), &envelope.signature)
            .unwrap();
    }
}
