// src/models/account.rs
//! Account key material.

use std::fmt;

/// An account together with its PEM-encoded key pair.
///
/// The key pair is provisioned outside this service. When no public key PEM
/// is stored, it is derived from the private key on demand.
#[derive(Clone)]
pub struct Account {
    pub id: String,
    pub private_key_pem: String,
    pub public_key_pem: Option<String>,
}

// Key material must never end up in logs.
impl fmt::Debug for Account {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Account")
            .field("id", &self.id)
            .field("private_key_pem", &"<redacted>")
            .field("has_public_key_pem", &self.public_key_pem.is_some())
            .finish()
    }
}
