// src/models/program.rs
//! Vaccination program record.
//!
//! A program is a single vaccination event owned by one account. Its
//! identifier is the only record attribute that enters the signed URL; the
//! clinical attributes only appear in issued certificates.

use serde::{Deserialize, Serialize};

/// A vaccination program record as exposed over the API.
///
/// Every clinical attribute may be absent; absent values are rendered as
/// empty strings wherever a canonical message is built.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct VaccinationProgram {
    /// Opaque, immutable record identifier
    pub id: String,

    /// Identifier of the owning account
    pub user_id: String,

    #[serde(default)]
    pub vaccinator: Option<String>,

    /// Manufacturer
    #[serde(default)]
    pub brand: Option<String>,

    /// Vaccine product name, e.g. "Comirnaty"
    #[serde(default)]
    pub product: Option<String>,

    #[serde(default)]
    pub lot: Option<String>,

    #[serde(default)]
    pub dose: Option<String>,

    /// Route of administration, e.g. "intramuscular"
    #[serde(default)]
    pub route: Option<String>,
}

/// Attributes a caller may set when creating or updating a program.
///
/// Ownership and the identifier are never taken from the request body.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct ProgramParams {
    #[serde(default)]
    pub vaccinator: Option<String>,
    #[serde(default)]
    pub brand: Option<String>,
    #[serde(default)]
    pub product: Option<String>,
    #[serde(default)]
    pub lot: Option<String>,
    #[serde(default)]
    pub dose: Option<String>,
    #[serde(default)]
    pub route: Option<String>,
}

impl VaccinationProgram {
    /// Builds a new record owned by `user_id` from caller-supplied attributes.
    pub fn new(id: String, user_id: String, params: ProgramParams) -> Self {
        Self {
            id,
            user_id,
            vaccinator: params.vaccinator,
            brand: params.brand,
            product: params.product,
            lot: params.lot,
            dose: params.dose,
            route: params.route,
        }
    }

    /// Overwrites the attributes present in `params`, leaving the others as they are.
    pub fn apply(&mut self, params: ProgramParams) {
        if params.vaccinator.is_some() {
            self.vaccinator = params.vaccinator;
        }
        if params.brand.is_some() {
            self.brand = params.brand;
        }
        if params.product.is_some() {
            self.product = params.product;
        }
        if params.lot.is_some() {
            self.lot = params.lot;
        }
        if params.dose.is_some() {
            self.dose = params.dose;
        }
        if params.route.is_some() {
            self.route = params.route;
        }
    }

    pub fn is_owned_by(&self, account_id: &str) -> bool {
        self.user_id == account_id
    }
}
