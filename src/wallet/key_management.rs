// src/wallet/key_management.rs
//! Account key handling for signing and verification.
//!
//! Keys arrive as PEM text from the account store on every call and are
//! decoded fresh; nothing here caches key material.
//!
//! Uses the following cryptographic primitives:
//! - ECDSA over secp256k1 (via `k256` crate)
//! - SHA-256 prehashing (via `sha2` crate)
//!
//! Accepted encodings:
//! - Private keys: PKCS#8 (`PRIVATE KEY`) or SEC1 (`EC PRIVATE KEY`) PEM
//! - Public keys: SubjectPublicKeyInfo (`PUBLIC KEY`) PEM
//! - Signatures: 64-byte fixed `r || s` or ASN.1 DER

use crate::utils::crypto::hash_data;
use k256::ecdsa::signature::hazmat::{PrehashSigner, PrehashVerifier};
use k256::ecdsa::{Signature, SigningKey, VerifyingKey};
use k256::pkcs8::{DecodePrivateKey, DecodePublicKey, EncodePrivateKey, EncodePublicKey, LineEnding};
use k256::{PublicKey, SecretKey};
use thiserror::Error;

/// Failures while turning stored key material into usable keys.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum KeyError {
    #[error("malformed private key PEM")]
    MalformedPrivateKey,

    #[error("malformed public key PEM")]
    MalformedPublicKey,

    #[error("signing failed")]
    Signing,
}

/// Private key of a single account, ready to sign canonical messages.
///
/// # Security Notes
/// - The secret key is never exposed or logged
/// - `Debug` is intentionally not implemented
pub struct KeyManager {
    secret_key: SecretKey,
}

impl KeyManager {
    /// Decodes a PEM private key.
    ///
    /// # Errors
    /// [`KeyError::MalformedPrivateKey`] when the text is neither PKCS#8 nor
    /// SEC1 PEM for a secp256k1 key.
    pub fn from_pem(private_key_pem: &str) -> Result<Self, KeyError> {
        let pem = private_key_pem.trim();
        let secret_key = SecretKey::from_pkcs8_pem(pem)
            .or_else(|_| SecretKey::from_sec1_pem(pem))
            .map_err(|_| KeyError::MalformedPrivateKey)?;

        Ok(Self { secret_key })
    }

    /// Signs a message using ECDSA with SHA-256 prehashing.
    ///
    /// # Returns
    /// 64-byte fixed-size signature (`r || s`)
    ///
    /// # Process Flow
    /// 1. Hashes message with SHA-256
    /// 2. Signs the digest using ECDSA
    /// 3. Serializes the signature in fixed-size format
    pub fn sign_message(&self, message: &[u8]) -> Result<Vec<u8>, KeyError> {
        let hash = hash_data(message);
        let signing_key = SigningKey::from(&self.secret_key);

        let signature: Signature = signing_key
            .sign_prehash(&hash)
            .map_err(|_| KeyError::Signing)?;

        Ok(signature.to_vec())
    }

    /// Public half of this key pair.
    pub fn public_key(&self) -> PublicKeyHandle {
        PublicKeyHandle {
            public_key: self.secret_key.public_key(),
        }
    }
}

/// Public key of a single account, used to check signatures.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PublicKeyHandle {
    public_key: PublicKey,
}

impl PublicKeyHandle {
    /// Decodes an SPKI PEM public key.
    pub fn from_pem(public_key_pem: &str) -> Result<Self, KeyError> {
        let public_key = PublicKey::from_public_key_pem(public_key_pem.trim())
            .map_err(|_| KeyError::MalformedPublicKey)?;

        Ok(Self { public_key })
    }

    /// Resolves the public key for an account: the stored PEM when present,
    /// otherwise derived from the private key.
    pub fn resolve(public_key_pem: Option<&str>, private_key_pem: &str) -> Result<Self, KeyError> {
        match public_key_pem {
            Some(pem) => Self::from_pem(pem),
            None => KeyManager::from_pem(private_key_pem)
                .map(|key| key.public_key())
                .map_err(|_| KeyError::MalformedPublicKey),
        }
    }

    /// Renders the key as SPKI PEM.
    pub fn to_pem(&self) -> Result<String, KeyError> {
        self.public_key
            .to_public_key_pem(LineEnding::LF)
            .map_err(|_| KeyError::MalformedPublicKey)
    }

    /// Checks `signature` over the SHA-256 digest of `message`.
    ///
    /// Returns `false` for signatures that do not parse as well as for
    /// signatures that do not match.
    pub fn verify_message(&self, message: &[u8], signature: &[u8]) -> bool {
        let signature = match parse_signature(signature) {
            Some(signature) => signature,
            None => return false,
        };

        let hash = hash_data(message);
        VerifyingKey::from(&self.public_key)
            .verify_prehash(&hash, &signature)
            .is_ok()
    }
}

fn parse_signature(bytes: &[u8]) -> Option<Signature> {
    let signature = Signature::from_slice(bytes)
        .or_else(|_| Signature::from_der(bytes))
        .ok()?;

    // DER signatures from other ECDSA implementations may carry a high `s`.
    Some(signature.normalize_s().unwrap_or(signature))
}

/// Generates a fresh `(private PKCS#8 PEM, public SPKI PEM)` pair.
///
/// Only used to provision development accounts; real accounts receive their
/// keys from the account store.
pub fn generate_pem_pair() -> Result<(String, String), KeyError> {
    let secret_key = SecretKey::random(&mut rand::thread_rng());
    let private_pem = secret_key
        .to_pkcs8_pem(LineEnding::LF)
        .map_err(|_| KeyError::MalformedPrivateKey)?
        .to_string();
    let public_pem = PublicKeyHandle {
        public_key: secret_key.public_key(),
    }
    .to_pem()?;

    Ok((private_pem, public_pem))
}
