// src/error.rs
//! HTTP-facing error type.
//!
//! Every failure leaves the service as `{ "status": <code>, "errors": [..] }`
//! with a fixed message; internal details only go to the log.

use crate::services::session::SessionError;
use crate::storage::memory::StoreError;
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::{json, Value};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("program not found")]
    ProgramNotFound,

    #[error("not authenticated")]
    Unauthenticated(#[from] SessionError),

    #[error("invalid request: {0}")]
    BadRequest(String),

    #[error("cannot certify this record")]
    NotCertified,

    #[error("internal error")]
    Internal,
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::ProgramNotFound => StatusCode::NOT_FOUND,
            ApiError::Unauthenticated(_) => StatusCode::UNAUTHORIZED,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::NotCertified => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn body(&self) -> Value {
        json!({
            "status": self.status().as_u16(),
            "errors": [self.to_string()],
        })
    }

    /// Response for a failed certification attempt: the usual error body
    /// plus `verified: false`.
    pub fn into_unverified_response(self) -> Response {
        let mut body = self.body();
        body["verified"] = Value::Bool(false);
        (self.status(), Json(body)).into_response()
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound { .. } => ApiError::ProgramNotFound,
            StoreError::Conflict { .. } => ApiError::Internal,
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        log::debug!("rejected request body: {}", rejection.body_text());
        ApiError::BadRequest("malformed request body".into())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        log::debug!("rejected query string: {}", rejection.body_text());
        ApiError::BadRequest("malformed query string".into())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status(), Json(self.body())).into_response()
    }
}
