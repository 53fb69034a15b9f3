// src/models/identity.rs
//! Caller identity, resolved once per request and passed explicitly to every
//! operation that needs to know who is asking.

/// The authenticated account behind a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub account_id: String,
}

impl Identity {
    pub fn new(account_id: impl Into<String>) -> Self {
        Self {
            account_id: account_id.into(),
        }
    }
}
