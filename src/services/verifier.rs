// src/services/verifier.rs
//! Verification service for signed program URLs.
//!
//! The verifier never accepts a message from the caller. It rebuilds today's
//! canonical URL message for the program on its own and checks the submitted
//! signature against it with the owning account's public key. A signature
//! therefore only verifies on the calendar day it was produced; expiry,
//! tampering and malformed input all produce the same `false`.

use crate::models::account::Account;
use crate::models::certificate::CertifyOutcome;
use crate::models::program::VaccinationProgram;
use crate::services::credential_issuer::CredentialIssuer;
use crate::utils::encoding::{decode_signature, EncodingError};
use crate::wallet::key_management::{KeyError, PublicKeyHandle};
use std::sync::Arc;
use thiserror::Error;

/// Why a verification attempt failed.
///
/// Only ever written to the debug log; callers see a plain `false`.
#[derive(Debug, Error)]
enum VerifyFailure {
    #[error("malformed signature: {0}")]
    MalformedSignature(#[from] EncodingError),

    #[error("owner key unavailable: {0}")]
    KeyUnavailable(#[from] KeyError),

    #[error("program does not belong to the signing account")]
    OwnerMismatch,

    #[error("signature does not match today's message")]
    SignatureMismatch,
}

/// Checks signed program URLs and gates certificate issuance.
///
/// Shares its clock and base URL with the [`CredentialIssuer`] so both
/// sides build identical canonical messages.
#[derive(Clone)]
pub struct Verifier {
    issuer: Arc<CredentialIssuer>,
}

impl Verifier {
    pub fn new(issuer: Arc<CredentialIssuer>) -> Self {
        Self { issuer }
    }

    /// Verifies a signed URL for program `id` against today's message.
    ///
    /// # Arguments
    /// * `id` - Program identifier
    /// * `signature_text` - Percent-encoded base64 signature (one layer of
    ///   percent-decoding already applied upstream is fine too)
    /// * `owner_public_key_pem` - Public key of the account owning the program
    ///
    /// # Returns
    /// `true` only for a valid signature by that key over today's message.
    /// Never fails: decode and key errors yield `false`.
    pub fn verify_url(&self, id: &str, signature_text: &str, owner_public_key_pem: &str) -> bool {
        let outcome = PublicKeyHandle::from_pem(owner_public_key_pem)
            .map_err(VerifyFailure::from)
            .and_then(|public_key| self.check_url(id, signature_text, &public_key));
        Self::settle(id, outcome)
    }

    /// Same as [`Verifier::verify_url`], resolving the public key from the
    /// owning account (derived from its private key when none is stored).
    pub fn verify_url_for_account(&self, id: &str, signature_text: &str, owner: &Account) -> bool {
        if let Some(public_key_pem) = owner.public_key_pem.as_deref() {
            return self.verify_url(id, signature_text, public_key_pem);
        }

        let outcome = Self::owner_public_key(owner)
            .and_then(|public_key| self.check_url(id, signature_text, &public_key));
        Self::settle(id, outcome)
    }

    /// Verifies the program URL signature and, only on success, issues a
    /// certificate signed with the owner's private key.
    ///
    /// # Arguments
    /// * `id` - Program identifier the signature was presented for
    /// * `signature_text` - Signature from the program URL
    /// * `vaccinee` - Name embedded in the certificate
    /// * `program` - The program record looked up by `id`
    /// * `owner` - The account owning `program`
    ///
    /// # Errors
    /// Only key errors while signing the certificate are returned. A failed
    /// verification is [`CertifyOutcome::Rejected`].
    pub fn verify_and_issue_certificate(
        &self,
        id: &str,
        signature_text: &str,
        vaccinee: &str,
        program: &VaccinationProgram,
        owner: &Account,
    ) -> Result<CertifyOutcome, KeyError> {
        let outcome = if program.id != id || !program.is_owned_by(&owner.id) {
            Err(VerifyFailure::OwnerMismatch)
        } else {
            Self::owner_public_key(owner)
                .and_then(|public_key| self.check_url(id, signature_text, &public_key))
        };

        if !Self::settle(id, outcome) {
            return Ok(CertifyOutcome::Rejected);
        }

        let certificate = self
            .issuer
            .sign_certificate(program, vaccinee, &owner.private_key_pem)?;
        Ok(CertifyOutcome::Issued { certificate })
    }

    fn owner_public_key(owner: &Account) -> Result<PublicKeyHandle, VerifyFailure> {
        PublicKeyHandle::resolve(owner.public_key_pem.as_deref(), &owner.private_key_pem)
            .map_err(VerifyFailure::from)
    }

    fn check_url(
        &self,
        id: &str,
        signature_text: &str,
        public_key: &PublicKeyHandle,
    ) -> Result<(), VerifyFailure> {
        let signature = decode_signature(signature_text)?;
        let message = self.issuer.url_message_for_today(id);

        if public_key.verify_message(message.as_bytes(), &signature) {
            Ok(())
        } else {
            Err(VerifyFailure::SignatureMismatch)
        }
    }

    fn settle(id: &str, outcome: Result<(), VerifyFailure>) -> bool {
        match outcome {
            Ok(()) => true,
            Err(failure) => {
                log::debug!("verification failed for program {}: {}", id, failure);
                false
            }
        }
    }
}
