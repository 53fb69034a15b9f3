// src/models/certificate.rs
//! Certificate payloads and verification outcomes.

use crate::models::program::VaccinationProgram;

/// The ordered field set embedded in a certificate message.
///
/// Field order here is the order of the canonical message:
/// `name, vaccinator, date, manuf, route, lot, dose, vaccinee`.
/// Absent attributes are empty strings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CertificateFields {
    pub product: String,
    pub vaccinator: String,
    pub date: String,
    pub manufacturer: String,
    pub route: String,
    pub lot: String,
    pub dose: String,
    pub vaccinee: String,
}

impl CertificateFields {
    /// Collects the certificate fields of `program` for the named vaccinee on `date`.
    pub fn from_program(program: &VaccinationProgram, vaccinee: &str, date: String) -> Self {
        fn or_empty(value: &Option<String>) -> String {
            value.clone().unwrap_or_default()
        }

        Self {
            product: or_empty(&program.product),
            vaccinator: or_empty(&program.vaccinator),
            date,
            manufacturer: or_empty(&program.brand),
            route: or_empty(&program.route),
            lot: or_empty(&program.lot),
            dose: or_empty(&program.dose),
            vaccinee: vaccinee.to_string(),
        }
    }
}

/// Result of a certify request.
///
/// `Pending → Verified → Issued` on success, `Pending → Rejected` otherwise.
/// A rejected outcome never carries a certificate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CertifyOutcome {
    Issued { certificate: String },
    Rejected,
}

impl CertifyOutcome {
    pub fn is_verified(&self) -> bool {
        matches!(self, CertifyOutcome::Issued { .. })
    }

    pub fn certificate(&self) -> Option<&str> {
        match self {
            CertifyOutcome::Issued { certificate } => Some(certificate),
            CertifyOutcome::Rejected => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_absent_attributes_become_empty() {
        let program = VaccinationProgram {
            id: "42".into(),
            user_id: "alice".into(),
            vaccinator: None,
            brand: Some("BioNTech".into()),
            product: Some("Comirnaty".into()),
            lot: None,
            dose: Some("1".into()),
            route: None,
        };

        let fields = CertificateFields::from_program(&program, "Jane Doe", "2024-03-01".into());
        assert_eq!(fields.product, "Comirnaty");
        assert_eq!(fields.manufacturer, "BioNTech");
        assert_eq!(fields.vaccinator, "");
        assert_eq!(fields.lot, "");
        assert_eq!(fields.vaccinee, "Jane Doe");
    }

    #[test]
    fn test_rejected_has_no_certificate() {
        assert!(!CertifyOutcome::Rejected.is_verified());
        assert_eq!(CertifyOutcome::Rejected.certificate(), None);
    }
}
