// src/services/credential_issuer.rs
//! Credential Issuer Service
//!
//! Signs canonical messages with an account's private key:
//! - Public program URLs, valid for the calendar day they were signed on
//! - Vaccination certificates, issued after a program URL was verified
//!
//! Signatures are detached: the SHA-256 digest of the canonical message is
//! signed, the raw signature bytes are base64-encoded and the base64 text is
//! percent-encoded before being appended as `&signature=...`.

use crate::models::certificate::CertificateFields;
use crate::models::program::VaccinationProgram;
use crate::services::message::{append_signature, build_certificate_message, build_url_message};
use crate::utils::clock::Clock;
use crate::utils::encoding::encode_signature;
use crate::wallet::key_management::{KeyError, KeyManager};
use std::sync::Arc;

/// Signs `message` with the PEM private key and returns URL-safe signature text.
///
/// # Errors
/// [`KeyError::MalformedPrivateKey`] if the PEM cannot be decoded.
pub fn sign(private_key_pem: &str, message: &str) -> Result<String, KeyError> {
    let key = KeyManager::from_pem(private_key_pem)?;
    let signature = key.sign_message(message.as_bytes())?;
    Ok(encode_signature(&signature))
}

/// Service producing signed program URLs and certificates.
///
/// Holds the two ambient inputs of every canonical message: the clock that
/// decides "today" and the deployment's base URL. Key material is passed in
/// per call and never retained.
#[derive(Clone)]
pub struct CredentialIssuer {
    /// Source of the validity date
    clock: Arc<dyn Clock>,

    /// Deployment-selected prefix of public program URLs
    base_url: String,
}

impl CredentialIssuer {
    /// Creates a new CredentialIssuer instance
    ///
    /// # Arguments
    /// * `clock` - Time source deciding the validity date
    /// * `base_url` - UI origin that public program URLs point at
    pub fn new(clock: Arc<dyn Clock>, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into();
        Self {
            clock,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Canonical URL message for program `id` as of today.
    pub fn url_message_for_today(&self, id: &str) -> String {
        build_url_message(id, &self.clock.today_string(), &self.base_url)
    }

    /// Produces today's signed public URL for a program.
    ///
    /// # Arguments
    /// * `id` - Program identifier
    /// * `owner_private_key_pem` - Private key of the account owning the program
    ///
    /// # Returns
    /// `{base_url}/generateCertificate/{id}?date={today}&signature={sig}`
    pub fn sign_url(&self, id: &str, owner_private_key_pem: &str) -> Result<String, KeyError> {
        let message = self.url_message_for_today(id);
        let signature = sign(owner_private_key_pem, &message)?;
        log::info!("signed public URL for program {}", id);
        Ok(append_signature(&message, &signature))
    }

    /// Produces a signed certificate for a program and a named vaccinee.
    ///
    /// The certificate date is today, not the date of the verified URL.
    ///
    /// # Arguments
    /// * `program` - Program whose clinical attributes are certified
    /// * `vaccinee` - Name of the vaccinated person, embedded verbatim
    /// * `owner_private_key_pem` - Private key of the account owning the program
    pub fn sign_certificate(
        &self,
        program: &VaccinationProgram,
        vaccinee: &str,
        owner_private_key_pem: &str,
    ) -> Result<String, KeyError> {
        let fields = CertificateFields::from_program(program, vaccinee, self.clock.today_string());
        let message = build_certificate_message(&fields);
        let signature = sign(owner_private_key_pem, &message)?;
        log::info!("issued certificate for program {}", program.id);
        Ok(append_signature(&message, &signature))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::clock::FixedClock;
    use crate::utils::encoding::decode_signature;
    use crate::wallet::key_management::generate_pem_pair;
    use crate::wallet::key_management::PublicKeyHandle;
    use chrono::NaiveDate;

    fn issuer_on(year: i32, month: u32, day: u32) -> CredentialIssuer {
        let date = NaiveDate::from_ymd_opt(year, month, day).unwrap();
        CredentialIssuer::new(Arc::new(FixedClock(date)), "http://localhost:3001/")
    }

    fn program() -> VaccinationProgram {
        VaccinationProgram {
            id: "42".into(),
            user_id: "alice".into(),
            vaccinator: Some("Dr. Who".into()),
            brand: Some("BioNTech".into()),
            product: Some("Comirnaty".into()),
            lot: Some("EX1234".into()),
            dose: Some("1".into()),
            route: None,
        }
    }

    #[test]
    fn test_sign_is_url_safe_and_verifiable() {
        let (private_pem, public_pem) = generate_pem_pair().unwrap();
        let text = sign(&private_pem, "hello").unwrap();

        assert!(!text.contains('+') && !text.contains('/') && !text.contains('='));
        let raw = decode_signature(&text).unwrap();
        let public = PublicKeyHandle::from_pem(&public_pem).unwrap();
        assert!(public.verify_message(b"hello", &raw));
    }

    #[test]
    fn test_sign_rejects_malformed_key() {
        assert_eq!(sign("garbage", "hello"), Err(KeyError::MalformedPrivateKey));
    }

    #[test]
    fn test_sign_url_shape() {
        let (private_pem, _) = generate_pem_pair().unwrap();
        let url = issuer_on(2024, 3, 1).sign_url("42", &private_pem).unwrap();

        let prefix = "http://localhost:3001/generateCertificate/42?date=2024-03-01&signature=";
        assert!(url.starts_with(prefix), "unexpected url {url}");
        assert!(url.len() > prefix.len());
    }

    #[test]
    fn test_sign_certificate_contents() {
        let (private_pem, public_pem) = generate_pem_pair().unwrap();
        let certificate = issuer_on(2024, 3, 1)
            .sign_certificate(&program(), "Jane Doe", &private_pem)
            .unwrap();

        let (message, signature) = certificate.split_once("&signature=").unwrap();
        assert_eq!(
            message,
            "healthpass:vaccine?name=Comirnaty&vaccinator=Dr.%20Who&date=2024-03-01\
             &manuf=BioNTech&route=&lot=EX1234&dose=1&vaccinee=Jane%20Doe"
        );

        let raw = decode_signature(signature).unwrap();
        let public = PublicKeyHandle::from_pem(&public_pem).unwrap();
        assert!(public.verify_message(message.as_bytes(), &raw));
    }
}
