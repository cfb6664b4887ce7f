//! Authentication error types.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

use super::header::CredentialError;
use crate::db::RefreshTokenError;
use crate::jwt::JwtError;
use crate::password::PasswordError;

/// Every way authenticating a request can fail.
///
/// Lower-level errors are wrapped unchanged so callers can tell an expired
/// token from a forged one even when both end up as a 401.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error(transparent)]
    Credential(#[from] CredentialError),
    #[error(transparent)]
    Password(#[from] PasswordError),
    #[error(transparent)]
    AccessToken(#[from] JwtError),
    #[error(transparent)]
    RefreshToken(#[from] RefreshTokenError),
    #[error("No user with that email")]
    UserNotFound,
    #[error("API key does not match")]
    InvalidApiKey,
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl AuthError {
    /// Whether the failure was caused by the client rather than the server.
    pub fn is_client_error(&self) -> bool {
        match self {
            AuthError::Credential(_) | AuthError::UserNotFound | AuthError::InvalidApiKey => true,
            AuthError::Password(e) => matches!(e, PasswordError::Mismatch),
            AuthError::AccessToken(e) => matches!(
                e,
                JwtError::Malformed | JwtError::InvalidSignature | JwtError::Expired
            ),
            AuthError::RefreshToken(e) => matches!(
                e,
                RefreshTokenError::NotFound
                    | RefreshTokenError::Revoked
                    | RefreshTokenError::Expired
            ),
            AuthError::Database(_) => false,
        }
    }
}

/// Rejection returned by the authentication extractors (JSON body).
#[derive(Debug)]
pub struct ApiAuthError(pub AuthError);

impl From<AuthError> for ApiAuthError {
    fn from(e: AuthError) -> Self {
        Self(e)
    }
}

impl ApiAuthError {
    pub fn status_code(&self) -> StatusCode {
        if self.0.is_client_error() {
            StatusCode::UNAUTHORIZED
        } else {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }

    /// Client-facing message. Never includes token contents.
    pub fn message(&self) -> &'static str {
        match &self.0 {
            AuthError::Credential(CredentialError::MissingHeader) => "Not authenticated",
            AuthError::Credential(_) => "Invalid authorization header",
            AuthError::AccessToken(JwtError::Expired) => "Token has expired",
            AuthError::AccessToken(JwtError::Malformed | JwtError::InvalidSignature) => {
                "Invalid token"
            }
            AuthError::RefreshToken(RefreshTokenError::Revoked) => "Token has been revoked",
            AuthError::RefreshToken(
                RefreshTokenError::NotFound | RefreshTokenError::Expired,
            ) => "Invalid or expired token",
            AuthError::InvalidApiKey => "Invalid API key",
            AuthError::UserNotFound | AuthError::Password(PasswordError::Mismatch) => {
                "Incorrect email or password"
            }
            _ => "Internal error",
        }
    }
}

impl IntoResponse for ApiAuthError {
    fn into_response(self) -> Response {
        #[derive(Serialize)]
        struct ErrorResponse {
            error: &'static str,
        }

        if self.0.is_client_error() {
            tracing::debug!(reason = %self.0, "Rejected request credentials");
        } else {
            tracing::error!(error = %self.0, "Authentication failed");
        }

        (
            self.status_code(),
            Json(ErrorResponse {
                error: self.message(),
            }),
        )
            .into_response()
    }
}
