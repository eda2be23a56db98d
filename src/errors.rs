use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::auth::password::PasswordError;

#[derive(Error, Debug)]
pub enum GymError {
    #[error("Invalid credentials")]
    AuthenticationFailure,
    #[error("Access denied: {0}")]
    AccessDenied(String),
    #[error("{0} not found")]
    NotFound(String),
    #[error("Invalid participant: {0}")]
    InvalidParticipant(String),
    #[error("Validation failed: {0}")]
    Validation(String),
    /// Username taken between generation and insert; consumed by the registration loop.
    #[error("Username already taken")]
    ConflictRetry,
    #[error("Password error: {0}")]
    Password(#[from] PasswordError),
    #[error("Token error: {0}")]
    Token(#[from] jsonwebtoken::errors::Error),
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("Internal server error")]
    Internal(#[from] anyhow::Error),
}

pub type GymResult<T> = Result<T, GymError>;

impl GymError {
    pub fn not_found(what: impl Into<String>) -> Self {
        GymError::NotFound(what.into())
    }

    pub fn access_denied(reason: impl Into<String>) -> Self {
        GymError::AccessDenied(reason.into())
    }

    pub fn status(&self) -> StatusCode {
        match self {
            GymError::AuthenticationFailure => StatusCode::UNAUTHORIZED,
            GymError::AccessDenied(_) => StatusCode::FORBIDDEN,
            GymError::NotFound(_) => StatusCode::NOT_FOUND,
            GymError::InvalidParticipant(_) => StatusCode::BAD_REQUEST,
            GymError::Validation(_) => StatusCode::BAD_REQUEST,
            GymError::ConflictRetry => StatusCode::CONFLICT,
            GymError::Password(PasswordError::HashingFailed | PasswordError::VerificationFailed) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            GymError::Password(_) => StatusCode::BAD_REQUEST,
            GymError::Token(_) => StatusCode::INTERNAL_SERVER_ERROR,
            GymError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
            GymError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn kind(&self) -> &'static str {
        match self {
            GymError::AuthenticationFailure => "authentication_failure",
            GymError::AccessDenied(_) => "access_denied",
            GymError::NotFound(_) => "not_found",
            GymError::InvalidParticipant(_) => "invalid_participant",
            GymError::Validation(_) | GymError::Password(_) => "validation_failed",
            GymError::ConflictRetry => "conflict",
            GymError::Token(_) | GymError::Database(_) | GymError::Internal(_) => "internal_error",
        }
    }
}

impl IntoResponse for GymError {
    fn into_response(self) -> Response {
        let status = self.status();

        // Storage and signing failures keep their detail in the logs only.
        let message = if status.is_server_error() {
            tracing::error!(error = ?self, "request failed");
            "Internal server error".to_string()
        } else {
            self.to_string()
        };

        let body = Json(json!({
            "error": self.kind(),
            "message": message,
        }));

        (status, body).into_response()
    }
}
