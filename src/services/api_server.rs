// src/services/api_server.rs
//! API Server for the health passport service
//!
//! REST interface over vaccination program records and their signed public
//! URLs. Built with Axum; endpoints:
//! - Program listing, lookup, creation and update for the signed-in account
//! - Public verification of a signed program URL
//! - Public certification: verify a program URL, then issue a signed certificate
//!
//! Owner-only endpoints resolve the caller's [`Identity`] once from the bearer
//! token and pass it explicitly. The public endpoints never look at the
//! caller: signatures are always checked and produced with the key of the
//! account that owns the program.

use crate::error::ApiError;
use crate::models::account::Account;
use crate::models::certificate::CertifyOutcome;
use crate::models::identity::Identity;
use crate::models::program::{ProgramParams, VaccinationProgram};
use crate::services::credential_issuer::CredentialIssuer;
use crate::services::session::SessionManager;
use crate::services::verifier::Verifier;
use crate::storage::memory::{AccountStore, ProgramStore};
use crate::utils::encoding::decode_form_component;
use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Json, Path, Query, State,
    },
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::CorsLayer;

// API request and response structures

/// Request payload for creating or updating a program
#[derive(Deserialize)]
struct ProgramRequest {
    #[serde(rename = "vaccinationProgram")]
    vaccination_program: ProgramParams,
}

/// Response listing the caller's programs
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ProgramListResponse {
    vaccination_programs: Vec<VaccinationProgram>,
}

/// Response carrying a single program
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ProgramResponse {
    vaccination_program: VaccinationProgram,
}

/// Response for a program lookup, with today's signed public URL
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ShowProgramResponse {
    vaccination_program: VaccinationProgram,
    #[serde(rename = "signedPublicURL")]
    signed_public_url: String,
}

/// Query string of the verification endpoint
#[derive(Deserialize)]
struct VerifyQuery {
    signature: Option<String>,
}

/// Response for a verification request; the program is only included when verified
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct VerifyResponse {
    verified: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    vaccination_program: Option<VaccinationProgram>,
}

/// Request payload for certification
#[derive(Deserialize)]
struct CertifyRequest {
    certificate: CertificateRequest,
}

#[derive(Deserialize)]
struct CertificateRequest {
    /// Signature taken from the signed program URL
    program_signature: String,
    /// Form-encoded vaccinee name (`%20` or `+` for spaces)
    #[serde(default)]
    vaccinee: Option<String>,
}

/// Response carrying an issued certificate
#[derive(Serialize)]
struct CertifyResponse {
    verified: bool,
    certificate: String,
}

/// API server state containing all service dependencies
pub struct ApiServer {
    /// Signs program URLs and certificates
    issuer: Arc<CredentialIssuer>,

    /// Checks signed program URLs
    verifier: Arc<Verifier>,

    /// Resolves bearer tokens into caller identities
    sessions: Arc<SessionManager>,

    /// Vaccination program records
    programs: Arc<dyn ProgramStore>,

    /// Account key material
    accounts: Arc<dyn AccountStore>,
}

impl ApiServer {
    /// Creates a new instance of the API server
    ///
    /// # Arguments
    /// * `issuer` - Service signing URLs and certificates
    /// * `verifier` - Service verifying signed URLs
    /// * `sessions` - Session token resolver
    /// * `programs` - Program record store
    /// * `accounts` - Account key store
    pub fn new(
        issuer: Arc<CredentialIssuer>,
        verifier: Verifier,
        sessions: SessionManager,
        programs: Arc<dyn ProgramStore>,
        accounts: Arc<dyn AccountStore>,
    ) -> Self {
        ApiServer {
            issuer,
            verifier: Arc::new(verifier),
            sessions: Arc::new(sessions),
            programs,
            accounts,
        }
    }

    /// Configures all API routes
    pub fn router(&self) -> Router {
        Router::new()
            .route(
                "/vaccination_programs",
                get(Self::index_handler).post(Self::create_handler),
            )
            .route(
                "/vaccination_programs/:id",
                get(Self::show_handler).put(Self::update_handler),
            )
            .route("/vaccination_programs/:id/verify", get(Self::verify_handler))
            .route("/vaccination_programs/:id/certify", post(Self::certify_handler))
            .layer(CorsLayer::permissive())
            .with_state(Arc::new(self.clone()))
    }

    /// Starts the API server and begins listening for requests
    ///
    /// # Arguments
    /// * `addr` - Socket address to bind to (e.g., "127.0.0.1:3000")
    pub async fn run(&self, addr: SocketAddr) -> anyhow::Result<()> {
        let listener = tokio::net::TcpListener::bind(addr).await?;
        log::info!("API server running at http://{}", addr);

        axum::serve(listener, self.router()).await?;
        Ok(())
    }

    /// Looks up a program the caller owns. Programs owned by anyone else are
    /// reported as missing.
    fn owned_program(&self, identity: &Identity, id: &str) -> Result<VaccinationProgram, ApiError> {
        let program = self.programs.find(id)?;
        if !program.is_owned_by(&identity.account_id) {
            return Err(ApiError::ProgramNotFound);
        }
        Ok(program)
    }

    /// Fetches the key material of the account owning `program`.
    fn owner_of(&self, program: &VaccinationProgram) -> Option<Account> {
        match self.accounts.find(&program.user_id) {
            Ok(account) => Some(account),
            Err(e) => {
                log::warn!("no key material for owner of program {}: {}", program.id, e);
                None
            }
        }
    }

    // =====================
    // Owner Handlers
    // =====================

    /// Lists the caller's programs
    ///
    /// # Endpoint
    /// GET /vaccination_programs
    async fn index_handler(
        State(state): State<Arc<ApiServer>>,
        headers: HeaderMap,
    ) -> Result<impl IntoResponse, ApiError> {
        let identity = state.sessions.resolve(&headers)?;
        let vaccination_programs = state.programs.list_for_owner(&identity.account_id);

        Ok(Json(ProgramListResponse { vaccination_programs }))
    }

    /// Shows one of the caller's programs with today's signed public URL
    ///
    /// # Endpoint
    /// GET /vaccination_programs/:id
    ///
    /// # Responses
    /// - 200 OK: Program and signed URL
    /// - 401 Unauthorized: Missing or invalid session
    /// - 404 Not Found: No such program owned by the caller
    async fn show_handler(
        State(state): State<Arc<ApiServer>>,
        headers: HeaderMap,
        Path(id): Path<String>,
    ) -> Result<impl IntoResponse, ApiError> {
        let identity = state.sessions.resolve(&headers)?;
        let program = state.owned_program(&identity, &id)?;
        let owner = state.owner_of(&program).ok_or(ApiError::Internal)?;

        let signed_public_url = state
            .issuer
            .sign_url(&program.id, &owner.private_key_pem)
            .map_err(|e| {
                log::error!("cannot sign URL for program {}: {}", program.id, e);
                ApiError::Internal
            })?;

        Ok(Json(ShowProgramResponse {
            vaccination_program: program,
            signed_public_url,
        }))
    }

    /// Creates a program owned by the caller
    ///
    /// # Endpoint
    /// POST /vaccination_programs
    async fn create_handler(
        State(state): State<Arc<ApiServer>>,
        headers: HeaderMap,
        payload: Result<Json<ProgramRequest>, JsonRejection>,
    ) -> Result<impl IntoResponse, ApiError> {
        let identity = state.sessions.resolve(&headers)?;
        let Json(payload) = payload?;
        let vaccination_program = state
            .programs
            .create(&identity.account_id, payload.vaccination_program);
        log::info!(
            "account {} created program {}",
            identity.account_id,
            vaccination_program.id
        );

        Ok((
            StatusCode::CREATED,
            Json(ProgramResponse { vaccination_program }),
        ))
    }

    /// Updates a program the caller owns
    ///
    /// # Endpoint
    /// PUT /vaccination_programs/:id
    async fn update_handler(
        State(state): State<Arc<ApiServer>>,
        headers: HeaderMap,
        Path(id): Path<String>,
        payload: Result<Json<ProgramRequest>, JsonRejection>,
    ) -> Result<impl IntoResponse, ApiError> {
        let identity = state.sessions.resolve(&headers)?;
        let Json(payload) = payload?;
        state.owned_program(&identity, &id)?;
        let vaccination_program = state.programs.update(&id, payload.vaccination_program)?;

        Ok(Json(ProgramResponse { vaccination_program }))
    }

    // =====================
    // Public Handlers
    // =====================

    /// Verifies a signed program URL. Needs no session.
    ///
    /// # Endpoint
    /// GET /vaccination_programs/:id/verify?signature=...
    ///
    /// # Responses
    /// - 200 OK: `verified` flag, plus the program when verified
    /// - 400 Bad Request: Malformed query string
    /// - 404 Not Found: No such program
    async fn verify_handler(
        State(state): State<Arc<ApiServer>>,
        Path(id): Path<String>,
        query: Result<Query<VerifyQuery>, QueryRejection>,
    ) -> Result<impl IntoResponse, ApiError> {
        let Query(query) = query?;
        let program = state.programs.find(&id)?;
        let verified = match (state.owner_of(&program), query.signature) {
            (Some(owner), Some(signature)) => {
                state
                    .verifier
                    .verify_url_for_account(&program.id, &signature, &owner)
            }
            _ => false,
        };

        Ok(Json(VerifyResponse {
            verified,
            vaccination_program: verified.then_some(program),
        }))
    }

    /// Verifies a signed program URL and issues a certificate for the named
    /// vaccinee. Needs no session.
    ///
    /// # Endpoint
    /// POST /vaccination_programs/:id/certify
    ///
    /// # Responses
    /// - 200 OK: `{ verified: true, certificate }`
    /// - 400 Bad Request: Malformed body, or a vaccinee name that is not
    ///   valid form-encoded UTF-8
    /// - 404 Not Found: No such program
    /// - 422 Unprocessable Entity: Verification failed, no certificate
    ///
    /// Every failure carries `verified: false`.
    async fn certify_handler(
        State(state): State<Arc<ApiServer>>,
        Path(id): Path<String>,
        payload: Result<Json<CertifyRequest>, JsonRejection>,
    ) -> Response {
        match state.certify(&id, payload) {
            Ok(certificate) => Json(CertifyResponse {
                verified: true,
                certificate,
            })
            .into_response(),
            Err(e) => e.into_unverified_response(),
        }
    }

    fn certify(
        &self,
        id: &str,
        payload: Result<Json<CertifyRequest>, JsonRejection>,
    ) -> Result<String, ApiError> {
        let Json(request) = payload?;
        let program = self.programs.find(id)?;
        let vaccinee =
            decode_form_component(request.certificate.vaccinee.as_deref().unwrap_or(""))
                .map_err(|e| ApiError::BadRequest(e.to_string()))?;

        let outcome = match self.owner_of(&program) {
            Some(owner) => self
                .verifier
                .verify_and_issue_certificate(
                    &program.id,
                    &request.certificate.program_signature,
                    &vaccinee,
                    &program,
                    &owner,
                )
                .map_err(|e| {
                    log::error!("cannot sign certificate for program {}: {}", program.id, e);
                    ApiError::Internal
                })?,
            None => CertifyOutcome::Rejected,
        };

        log::info!(
            "certify request for program {}: verified={}",
            program.id,
            outcome.is_verified()
        );

        outcome
            .certificate()
            .map(str::to_string)
            .ok_or(ApiError::NotCertified)
    }
}

// Implement Clone for ApiServer to use with Axum's State
impl Clone for ApiServer {
    fn clone(&self) -> Self {
        ApiServer {
            issuer: Arc::clone(&self.issuer),
            verifier: Arc::clone(&self.verifier),
            sessions: Arc::clone(&self.sessions),
            programs: Arc::clone(&self.programs),
            accounts: Arc::clone(&self.accounts),
        }
    }
}
