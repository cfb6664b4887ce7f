//! Axum extractors for authentication.

use axum::{extract::FromRequestParts, http::request::Parts};
use uuid::Uuid;

use super::errors::{ApiAuthError, AuthError};
use super::state::HasAuthGateway;

/// The caller identified by a valid access token.
#[derive(Debug, Clone, Copy)]
pub struct AuthenticatedUser {
    pub user_id: Uuid,
}

/// Extractor for endpoints that require a bearer access token.
/// Access tokens are stateless; the database is not consulted.
pub struct Auth(pub AuthenticatedUser);

impl<S> FromRequestParts<S> for Auth
where
    S: HasAuthGateway + Send + Sync,
{
    type Rejection = ApiAuthError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let user_id = state.auth().require_access_token(&parts.headers)?;
        Ok(Auth(AuthenticatedUser { user_id }))
    }
}

/// Extractor for endpoints called by the payment provider with an API key.
pub struct ApiKeyAuth;

impl<S> FromRequestParts<S> for ApiKeyAuth
where
    S: HasAuthGateway + Send + Sync,
{
    type Rejection = ApiAuthError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        if state.auth().require_api_key(&parts.headers)? {
            Ok(ApiKeyAuth)
        } else {
            Err(AuthError::InvalidApiKey.into())
        }
    }
}
