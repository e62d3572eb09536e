//! Authorization.
//!
//! The ledger never verifies signatures while applying an operation. By the
//! time an operation reaches a transition, the host has bound the signer to
//! a verified identity; the transition only compares principals.
//!
//! Binding is done by an [`Authenticator`], an injected capability.
//! [`Ed25519Authenticator`] checks a [`SignedOperation`]'s signature against
//! its claimed signer.

use crate::crypto::Principal;
use crate::error::{CoreError, LedgerError};
use crate::operation::SignedOperation;

/// Whether `asserted` may act where `required` is needed.
pub fn authorize(required: &Principal, asserted: &Principal) -> bool {
    required == asserted
}

/// Like [`authorize`], as a precondition.
pub fn require_signer(required: &Principal, asserted: &Principal) -> Result<(), LedgerError> {
    if authorize(required, asserted) {
        Ok(())
    } else {
        Err(LedgerError::Unauthorized {
            required: *required,
            asserted: *asserted,
        })
    }
}

/// Binds a signed operation to the principal that made it.
pub trait Authenticator: Send + Sync {
    /// Return the verified signer, or an error if the envelope does not
    /// authenticate.
    fn authenticate(&self, envelope: &SignedOperation) -> Result<Principal, CoreError>;
}

/// Verifies Ed25519 signatures over the canonical operation message.
#[derive(Debug, Default, Clone, Copy)]
pub struct Ed25519Authenticator;

impl Authenticator for Ed25519Authenticator {
    fn authenticate(&self, envelope: &SignedOperation) -> Result<Principal, CoreError> {
        let message = envelope.operation.signing_message();
        envelope.signer.verify(&message, &envelope.signature)?;
        Ok(envelope.signer)
    }
}
