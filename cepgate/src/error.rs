//! Caller-visible lookup failures
//!
//! Tier failures never appear here: they are absorbed by the orchestrator.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// Failures that cross the service boundary
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LookupError {
    /// Missing or unrecognized API key; no tier was consulted
    #[error("API key ausente ou inválida")]
    Unauthorized,

    /// The raw identifier cannot be used as a postal code
    #[error("CEP inválido: {0}")]
    InvalidKey(String),

    /// The origin confirmed there is no such postal code
    #[error("CEP não encontrado")]
    NotFound,

    /// The origin could not be reached or answered with an error
    #[error("Erro ao consultar serviço externo")]
    DependencyFailure,
}

/// Body of every failure response
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub detail: String,
}

impl LookupError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            LookupError::Unauthorized => StatusCode::UNAUTHORIZED,
            LookupError::InvalidKey(_) => StatusCode::BAD_REQUEST,
            LookupError::NotFound => StatusCode::NOT_FOUND,
            LookupError::DependencyFailure => StatusCode::BAD_GATEWAY,
        }
    }
}

impl IntoResponse for LookupError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            detail: self.to_string(),
        };
        (self.status_code(), Json(body)).into_response()
    }
}
