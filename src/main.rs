// src/main.rs

//! # Health Passport - Main Entry Point
//!
//! Issues and verifies day-scoped signed URLs for vaccination program
//! records, and turns a verified URL into a signed vaccination certificate.
//!
//! ## Architecture Overview
//! 1. **Services Layer**: Message building, signing, verification and the HTTP API
//! 2. **Wallet Layer**: PEM key decoding and ECDSA signing
//! 3. **Storage Layer**: Program and account stores
//! 4. **Utils**: Canonical encodings, digests and the clock
//!
//! ## Configuration
//! See [`config::Settings`]. Every key can be set through a `HEALTHPASS_`
//! environment variable, e.g. `HEALTHPASS_ENVIRONMENT=production`.

use crate::config::Settings;
use crate::models::account::Account;
use crate::services::api_server::ApiServer;
use crate::services::credential_issuer::CredentialIssuer;
use crate::services::session::SessionManager;
use crate::services::verifier::Verifier;
use crate::storage::memory::{MemoryAccountStore, MemoryProgramStore};
use crate::wallet::key_management::generate_pem_pair;
use anyhow::Context;
use dotenv::dotenv;
use std::net::SocketAddr;
use std::sync::Arc;

// Module declarations (organized by functional domain)
mod config;     // Layered settings
mod error;      // HTTP error mapping
mod models;     // Data structures
mod services;   // Business logic and API
mod storage;    // Record and account stores
mod utils;      // Helper functions
mod wallet;     // Cryptographic key operations

const DEMO_ACCOUNT_ID: &str = "demo";

/// Main application entry point
///
/// # Initialization Sequence
/// 1. Load environment configuration
/// 2. Initialize service components
/// 3. Seed a demo account in development
/// 4. Start API server
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenv().ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let settings = Settings::load()?;
    let clock = Arc::new(settings.clock()?);

    // Signing and verification share one clock and base URL
    let issuer = Arc::new(CredentialIssuer::new(clock, settings.base_url()));
    let verifier = Verifier::new(issuer.clone());
    let sessions = SessionManager::new(settings.jwt_secret()?.as_bytes());

    let programs = Arc::new(MemoryProgramStore::new());
    let accounts = Arc::new(MemoryAccountStore::new());

    if settings.seed_demo_account() {
        seed_demo_account(&accounts, &sessions)?;
    }

    let api_server = ApiServer::new(issuer, verifier, sessions, programs, accounts);

    let addr: SocketAddr = settings
        .listen_addr
        .parse()
        .with_context(|| format!("invalid listen_addr {}", settings.listen_addr))?;
    log::info!(
        "{:?} deployment, public URLs under {}",
        settings.environment,
        settings.base_url()
    );

    api_server.run(addr).await
}

/// Registers a development account with a fresh key pair and logs a session
/// token for it.
fn seed_demo_account(accounts: &MemoryAccountStore, sessions: &SessionManager) -> anyhow::Result<()> {
    let (private_key_pem, public_key_pem) =
        generate_pem_pair().context("failed to generate demo key pair")?;
    accounts.insert(Account {
        id: DEMO_ACCOUNT_ID.to_string(),
        private_key_pem,
        public_key_pem: Some(public_key_pem),
    })?;

    let token = sessions.issue_token(DEMO_ACCOUNT_ID, chrono::Duration::days(1))?;
    log::info!("demo account '{}' ready, bearer token: {}", DEMO_ACCOUNT_ID, token);
    Ok(())
}
