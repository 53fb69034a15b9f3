// src/services/session.rs
//! Caller identity resolution.
//!
//! Requests that act on a caller's own records carry an HS256 bearer token
//! whose `sub` claim is the account identifier. The token is resolved once
//! per request into an [`Identity`] that handlers pass on explicitly.

use crate::models::identity::Identity;
use axum::http::{header::AUTHORIZATION, HeaderMap};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SessionError {
    #[error("missing bearer token")]
    MissingToken,

    #[error("invalid or expired session token")]
    InvalidToken,

    #[error("could not issue session token")]
    Issue,
}

/// JWT claims carried by session tokens.
#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    /// Account identifier
    sub: String,
    /// Expiry as seconds since the Unix epoch
    exp: usize,
}

/// Issues and resolves session tokens with a shared secret.
#[derive(Clone)]
pub struct SessionManager {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
}

impl SessionManager {
    pub fn new(secret: &[u8]) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
        }
    }

    /// Issues a token for `account_id` valid for `ttl`.
    pub fn issue_token(&self, account_id: &str, ttl: Duration) -> Result<String, SessionError> {
        let exp = (Utc::now() + ttl).timestamp();
        let claims = Claims {
            sub: account_id.to_string(),
            exp: usize::try_from(exp).map_err(|_| SessionError::Issue)?,
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|_| SessionError::Issue)
    }

    /// Resolves the caller from an `Authorization: Bearer <token>` header.
    pub fn resolve(&self, headers: &HeaderMap) -> Result<Identity, SessionError> {
        let token = headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "))
            .map(str::trim)
            .filter(|token| !token.is_empty())
            .ok_or(SessionError::MissingToken)?;

        self.resolve_token(token)
    }

    pub fn resolve_token(&self, token: &str) -> Result<Identity, SessionError> {
        let data = decode::<Claims>(token, &self.decoding_key, &Validation::new(Algorithm::HS256))
            .map_err(|e| {
                log::debug!("rejected session token: {}", e);
                SessionError::InvalidToken
            })?;

        Ok(Identity::new(data.claims.sub))
    }
}
