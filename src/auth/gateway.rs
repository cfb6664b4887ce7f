//! Composition of password, access token and refresh token checks.
//!
//! The HTTP layer asks the gateway one of three questions about a request
//! (`require_access_token`, `require_api_key`, `require_refresh_token`) and
//! maps the typed answer to a status code. It never looks inside a token.

use std::sync::Arc;
use std::time::Duration;

use axum::http::HeaderMap;
use subtle::ConstantTimeEq;
use tracing::{info, warn};
use uuid::Uuid;

use super::errors::AuthError;
use super::header::{api_key_from_headers, bearer_from_headers};
use crate::db::{Database, RefreshToken, User};
use crate::jwt::{AccessTokenResult, JwtConfig};
use crate::password::{PasswordError, spawn_burn_password_check, spawn_verify_password};

/// Tokens handed out by a successful login.
#[derive(Debug, Clone)]
pub struct LoginOutcome {
    pub user: User,
    pub access_token: AccessTokenResult,
    pub refresh_token: RefreshToken,
}

#[derive(Clone)]
pub struct AuthGateway {
    db: Database,
    jwt: Arc<JwtConfig>,
    api_key: Arc<str>,
    access_token_ttl: Duration,
}

impl AuthGateway {
    pub fn new(
        db: Database,
        jwt: Arc<JwtConfig>,
        api_key: impl Into<Arc<str>>,
        access_token_ttl: Duration,
    ) -> Self {
        Self {
            db,
            jwt,
            api_key: api_key.into(),
            access_token_ttl,
        }
    }

    pub fn jwt(&self) -> &JwtConfig {
        &self.jwt
    }

    /// Identify the caller from a bearer access token.
    pub fn require_access_token(&self, headers: &HeaderMap) -> Result<Uuid, AuthError> {
        let token = bearer_from_headers(headers)?;
        Ok(self.jwt.validate_access_token(token)?)
    }

    /// Whether the request carries the configured API key.
    pub fn require_api_key(&self, headers: &HeaderMap) -> Result<bool, AuthError> {
        let key = api_key_from_headers(headers)?;
        Ok(key.as_bytes().ct_eq(self.api_key.as_bytes()).into())
    }

    /// Identify the caller from a bearer refresh token.
    pub async fn require_refresh_token(&self, headers: &HeaderMap) -> Result<Uuid, AuthError> {
        let token = bearer_from_headers(headers)?;
        Ok(self.db.refresh_tokens().resolve(token).await?)
    }

    /// Check a user's password and issue an access token plus a refresh token.
    pub async fn login(&self, email: &str, password: &str) -> Result<LoginOutcome, AuthError> {
        let Some(user) = self.db.users().get_by_email(email).await? else {
            spawn_burn_password_check(password.to_owned()).await;
            warn!("Login attempt for unknown email");
            return Err(AuthError::UserNotFound);
        };

        match spawn_verify_password(user.hashed_password.clone(), password.to_owned()).await {
            Ok(()) => {}
            Err(PasswordError::Mismatch) => {
                warn!(user_id = %user.id, "Login attempt with wrong password");
                return Err(PasswordError::Mismatch.into());
            }
            Err(e) => return Err(e.into()),
        }

        let access_token = self
            .jwt
            .generate_access_token(user.id, self.access_token_ttl)?;
        let refresh_token = self.db.refresh_tokens().issue(user.id).await?;

        info!(user_id = %user.id, "User logged in");

        Ok(LoginOutcome {
            user,
            access_token,
            refresh_token,
        })
    }

    /// Exchange a bearer refresh token for a new access token.
    pub async fn refresh(&self, headers: &HeaderMap) -> Result<AccessTokenResult, AuthError> {
        let user_id = self.require_refresh_token(headers).await?;
        Ok(self
            .jwt
            .generate_access_token(user_id, self.access_token_ttl)?)
    }

    /// Revoke the bearer refresh token. Repeated or unknown revokes succeed.
    pub async fn revoke(&self, headers: &HeaderMap) -> Result<bool, AuthError> {
        let token = bearer_from_headers(headers)?;
        let revoked = self.db.refresh_tokens().revoke(token).await?;
        if revoked {
            info!("Refresh token revoked");
        }
        Ok(revoked)
    }
}
