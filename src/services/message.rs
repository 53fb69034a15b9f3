// src/services/message.rs
//! Canonical message builder.
//!
//! Signer and verifier each build the message on their own; a signature is
//! only ever checked against a message this module produced. Any byte
//! difference between the two sides breaks verification, so the templates
//! below are the wire format.
//!
//! - URL message: `{base_url}/generateCertificate/{id}?date={YYYY-MM-DD}`
//! - Certificate message: `healthpass:vaccine?name=..&vaccinator=..&date=..&manuf=..&route=..&lot=..&dose=..&vaccinee=..`

use crate::models::certificate::CertificateFields;
use crate::utils::encoding::encode_component;

/// Scheme and path prefix of certificate messages.
pub const CERTIFICATE_PREFIX: &str = "healthpass:vaccine";

/// Query key under which signatures are appended to signed messages.
pub const SIGNATURE_PARAM: &str = "signature";

/// Builds the message signed for a public program URL.
///
/// `id` and `date` are inserted verbatim; both are URL-safe by construction
/// (opaque record identifiers and `YYYY-MM-DD` dates).
pub fn build_url_message(id: &str, date: &str, base_url: &str) -> String {
    format!("{base_url}/generateCertificate/{id}?date={date}")
}

/// Builds the certificate message from its ordered field set.
///
/// Every field value is percent-encoded with the canonical encoding.
pub fn build_certificate_message(fields: &CertificateFields) -> String {
    let pairs: [(&str, &str); 8] = [
        ("name", fields.product.as_str()),
        ("vaccinator", fields.vaccinator.as_str()),
        ("date", fields.date.as_str()),
        ("manuf", fields.manufacturer.as_str()),
        ("route", fields.route.as_str()),
        ("lot", fields.lot.as_str()),
        ("dose", fields.dose.as_str()),
        ("vaccinee", fields.vaccinee.as_str()),
    ];

    let query = pairs
        .iter()
        .map(|(key, value)| format!("{key}={}", encode_component(value)))
        .collect::<Vec<_>>()
        .join("&");

    format!("{CERTIFICATE_PREFIX}?{query}")
}

/// Appends an already-encoded signature to a canonical message.
pub fn append_signature(message: &str, encoded_signature: &str) -> String {
    format!("{message}&{SIGNATURE_PARAM}={encoded_signature}")
}
