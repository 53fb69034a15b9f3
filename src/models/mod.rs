// src/models/mod.rs
pub mod account;
pub mod certificate;
pub mod identity;
pub mod program;
