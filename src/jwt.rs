//! JWT access token generation and validation.
//!
//! Access tokens are stateless HS256 JWTs carrying `{iss, sub, iat, exp}`.
//! They are never stored and never revoked; they simply run out.

use std::time::Duration;

use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::clock::unix_now;

/// Issuer stamped on, and required of, every access token.
pub const TOKEN_ISSUER: &str = "chirpy";

/// Default access token duration: 1 hour
pub const ACCESS_TOKEN_DURATION_SECS: u64 = 60 * 60;

/// JWT claims for access tokens.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessClaims {
    /// Issuer
    pub iss: String,
    /// Subject (user UUID)
    pub sub: String,
    /// Issued at (Unix timestamp)
    pub iat: u64,
    /// Expiration time (Unix timestamp)
    pub exp: u64,
}

/// Signing configuration for access tokens.
#[derive(Clone)]
pub struct JwtConfig {
    encoding_key: EncodingKey,
    secret: Vec<u8>,
}

/// Result of generating an access token.
#[derive(Debug, Clone)]
pub struct AccessTokenResult {
    /// The JWT token string
    pub token: String,
    /// Issued at timestamp (Unix seconds)
    pub issued_at: u64,
    /// Expiration timestamp (Unix seconds)
    pub expires_at: u64,
    /// Token duration in seconds
    pub duration: u64,
}

impl JwtConfig {
    /// Create a new JWT configuration with the given secret.
    pub fn new(secret: &[u8]) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret),
            secret: secret.to_vec(),
        }
    }

    /// Generate an access token for a user, valid for `ttl` from now.
    pub fn generate_access_token(
        &self,
        user_id: Uuid,
        ttl: Duration,
    ) -> Result<AccessTokenResult, JwtError> {
        let now = unix_now().map_err(|_| JwtError::TimeError)?;
        self.generate_access_token_at(user_id, ttl, now)
    }

    /// Generate an access token as if the current time were `now`.
    ///
    /// `ttl` is truncated to whole seconds, so a sub-second ttl yields a
    /// token that is already expired.
    pub fn generate_access_token_at(
        &self,
        user_id: Uuid,
        ttl: Duration,
        now: u64,
    ) -> Result<AccessTokenResult, JwtError> {
        let duration = ttl.as_secs();
        let exp = now.saturating_add(duration);

        let claims = AccessClaims {
            iss: TOKEN_ISSUER.to_string(),
            sub: user_id.to_string(),
            iat: now,
            exp,
        };

        let token = jsonwebtoken::encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(JwtError::Encoding)?;

        Ok(AccessTokenResult {
            token,
            issued_at: now,
            expires_at: exp,
            duration,
        })
    }

    /// Validate an access token against this configuration's own secret.
    pub fn validate_access_token(&self, token: &str) -> Result<Uuid, JwtError> {
        validate_access_token(token, &self.secret)
    }
}

/// Validate an access token with the given secret and return the user it is bound to.
pub fn validate_access_token(token: &str, secret: &[u8]) -> Result<Uuid, JwtError> {
    let now = unix_now().map_err(|_| JwtError::TimeError)?;
    validate_access_token_at(token, secret, now)
}

/// Validate an access token as if the current time were `now`.
///
/// A token whose `exp` equals `now` is already expired.
pub fn validate_access_token_at(token: &str, secret: &[u8], now: u64) -> Result<Uuid, JwtError> {
    if secret.is_empty() {
        return Err(JwtError::InvalidSignature);
    }

    // Structure first: three segments, a readable header and readable claims.
    let segments: Vec<&str> = token.split('.').collect();
    let [_, payload, _] = segments.as_slice() else {
        return Err(JwtError::Malformed);
    };
    jsonwebtoken::decode_header(token).map_err(|_| JwtError::Malformed)?;
    let payload = URL_SAFE_NO_PAD
        .decode(payload)
        .map_err(|_| JwtError::Malformed)?;
    serde_json::from_slice::<AccessClaims>(&payload).map_err(|_| JwtError::Malformed)?;

    let mut validation = Validation::new(Algorithm::HS256);
    validation.leeway = 0;
    // Expiry is checked below against `now`, with strict inequality.
    validation.validate_exp = false;
    validation.set_required_spec_claims(&["iss", "sub", "exp"]);
    validation.set_issuer(&[TOKEN_ISSUER]);

    let token_data = jsonwebtoken::decode::<AccessClaims>(
        token,
        &DecodingKey::from_secret(secret),
        &validation,
    )
    .map_err(|e| match e.kind() {
        ErrorKind::InvalidSignature => JwtError::InvalidSignature,
        _ => JwtError::Malformed,
    })?;

    let claims = token_data.claims;
    if claims.exp <= now {
        return Err(JwtError::Expired);
    }

    Uuid::parse_str(&claims.sub).map_err(|_| JwtError::Malformed)
}

/// Errors that can occur during JWT operations.
#[derive(Debug, Error)]
pub enum JwtError {
    /// Error encoding the token
    #[error("Failed to encode token: {0}")]
    Encoding(jsonwebtoken::errors::Error),
    /// Token is not a well-formed access token
    #[error("Malformed token")]
    Malformed,
    /// Signature does not match the secret
    #[error("Invalid token signature")]
    InvalidSignature,
    /// Token is past its expiry
    #[error("Token has expired")]
    Expired,
    /// System time error
    #[error("System time error")]
    TimeError,
}
