// src/storage/memory.rs
//! Record and account stores.
//!
//! The signing core only needs two lookups: a program by identifier and an
//! account's key material by identifier. Both are expressed as traits so a
//! database-backed implementation can replace the in-memory one used here.

use crate::models::account::Account;
use crate::models::program::{ProgramParams, VaccinationProgram};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{PoisonError, RwLock};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("{kind} {id} not found")]
    NotFound { kind: &'static str, id: String },

    #[error("{kind} {id} already exists")]
    Conflict { kind: &'static str, id: String },
}

/// Lookup and maintenance of vaccination program records.
pub trait ProgramStore: Send + Sync {
    fn find(&self, id: &str) -> Result<VaccinationProgram, StoreError>;

    /// All programs owned by `owner_id`, oldest first.
    fn list_for_owner(&self, owner_id: &str) -> Vec<VaccinationProgram>;

    fn create(&self, owner_id: &str, params: ProgramParams) -> VaccinationProgram;

    fn update(&self, id: &str, params: ProgramParams) -> Result<VaccinationProgram, StoreError>;
}

/// Lookup of account key material.
pub trait AccountStore: Send + Sync {
    fn find(&self, id: &str) -> Result<Account, StoreError>;
}

/// In-memory program store with sequential numeric identifiers.
///
/// # Behavior
/// - Identifiers are assigned on creation and never reused
/// - Lookups return clones; callers never hold the lock
#[derive(Default)]
pub struct MemoryProgramStore {
    programs: RwLock<HashMap<String, VaccinationProgram>>,
    next_id: AtomicU64,
}

impl MemoryProgramStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ProgramStore for MemoryProgramStore {
    fn find(&self, id: &str) -> Result<VaccinationProgram, StoreError> {
        self.programs
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound {
                kind: "program",
                id: id.to_string(),
            })
    }

    fn list_for_owner(&self, owner_id: &str) -> Vec<VaccinationProgram> {
        let programs = self.programs.read().unwrap_or_else(PoisonError::into_inner);
        let mut owned: Vec<VaccinationProgram> = programs
            .values()
            .filter(|program| program.is_owned_by(owner_id))
            .cloned()
            .collect();
        owned.sort_by_key(|program| program.id.parse::<u64>().unwrap_or(u64::MAX));
        owned
    }

    fn create(&self, owner_id: &str, params: ProgramParams) -> VaccinationProgram {
        let id = (self.next_id.fetch_add(1, Ordering::Relaxed) + 1).to_string();
        let program = VaccinationProgram::new(id.clone(), owner_id.to_string(), params);

        self.programs
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(id, program.clone());
        program
    }

    fn update(&self, id: &str, params: ProgramParams) -> Result<VaccinationProgram, StoreError> {
        let mut programs = self.programs.write().unwrap_or_else(PoisonError::into_inner);
        let program = programs.get_mut(id).ok_or_else(|| StoreError::NotFound {
            kind: "program",
            id: id.to_string(),
        })?;

        program.apply(params);
        Ok(program.clone())
    }
}

/// In-memory account store.
#[derive(Default)]
pub struct MemoryAccountStore {
    accounts: RwLock<HashMap<String, Account>>,
}

impl MemoryAccountStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers an account. Existing accounts are never overwritten.
    pub fn insert(&self, account: Account) -> Result<(), StoreError> {
        let mut accounts = self.accounts.write().unwrap_or_else(PoisonError::into_inner);
        if accounts.contains_key(&account.id) {
            return Err(StoreError::Conflict {
                kind: "account",
                id: account.id,
            });
        }

        accounts.insert(account.id.clone(), account);
        Ok(())
    }
}

impl AccountStore for MemoryAccountStore {
    fn find(&self, id: &str) -> Result<Account, StoreError> {
        self.accounts
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound {
                kind: "account",
                id: id.to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(product: &str) -> ProgramParams {
        ProgramParams {
            product: Some(product.to_string()),
            ..Default::default()
        }
    }

    fn account(id: &str) -> Account {
        Account {
            id: id.to_string(),
            private_key_pem: String::new(),
            public_key_pem: None,
        }
    }

    #[test]
    fn test_create_assigns_sequential_ids() {
        let store = MemoryProgramStore::new();
        let first = store.create("alice", params("Comirnaty"));
        let second = store.create("bob", params("Spikevax"));

        assert_eq!(first.id, "1");
        assert_eq!(second.id, "2");
        assert_eq!(store.find("2").unwrap().user_id, "bob");
    }

    #[test]
    fn test_find_missing_program() {
        let store = MemoryProgramStore::new();
        assert_eq!(
            store.find("7"),
            Err(StoreError::NotFound {
                kind: "program",
                id: "7".into()
            })
        );
    }

    #[test]
    fn test_list_only_owned_in_creation_order() {
        let store = MemoryProgramStore::new();
        for i in 0..11 {
            store.create("alice", params(&format!("dose-{i}")));
        }
        store.create("bob", params("Spikevax"));

        let owned = store.list_for_owner("alice");
        assert_eq!(owned.len(), 11);
        assert_eq!(owned[0].id, "1");
        assert_eq!(owned[10].id, "11");
        assert!(owned.iter().all(|program| program.user_id == "alice"));
    }

    #[test]
    fn test_update_merges_params() {
        let store = MemoryProgramStore::new();
        let created = store.create("alice", params("Comirnaty"));

        let updated = store
            .update(
                &created.id,
                ProgramParams {
                    lot: Some("EX1234".into()),
                    ..Default::default()
                },
            )
            .unwrap();

        assert_eq!(updated.product.as_deref(), Some("Comirnaty"));
        assert_eq!(updated.lot.as_deref(), Some("EX1234"));
        assert!(store.update("99", ProgramParams::default()).is_err());
    }

    #[test]
    fn test_account_insert_and_find() {
        let store = MemoryAccountStore::new();
        store.insert(account("alice")).unwrap();

        assert_eq!(store.find("alice").unwrap().id, "alice");
        assert!(matches!(
            store.insert(account("alice")),
            Err(StoreError::Conflict { .. })
        ));
        assert!(matches!(
            store.find("bob"),
            Err(StoreError::NotFound { kind: "account", .. })
        ));
    }
}
