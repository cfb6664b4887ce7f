//! `Authorization` header parsing for bearer tokens and API keys.
//!
//! Fields are split on any run of whitespace, the scheme keyword is matched
//! case-insensitively and anything after the credential is ignored.

use axum::http::{HeaderMap, header::AUTHORIZATION};
use thiserror::Error;

/// Scheme keyword for access and refresh tokens.
pub const BEARER_SCHEME: &str = "Bearer";

/// Scheme keyword for the webhook API key.
pub const API_KEY_SCHEME: &str = "ApiKey";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum CredentialError {
    #[error("No authorization header")]
    MissingHeader,
    #[error("Malformed authorization header")]
    MalformedHeader,
    #[error("Empty token in authorization header")]
    EmptyToken,
}

/// Extract a bearer token from an `Authorization` header value.
pub fn extract_bearer(value: Option<&str>) -> Result<&str, CredentialError> {
    credential_for_scheme(value, BEARER_SCHEME)?.ok_or(CredentialError::EmptyToken)
}

/// Extract an API key from an `Authorization` header value.
pub fn extract_api_key(value: Option<&str>) -> Result<&str, CredentialError> {
    credential_for_scheme(value, API_KEY_SCHEME)?.ok_or(CredentialError::MalformedHeader)
}

/// Extract a bearer token from request headers.
pub fn bearer_from_headers(headers: &HeaderMap) -> Result<&str, CredentialError> {
    extract_bearer(authorization(headers)?)
}

/// Extract an API key from request headers.
pub fn api_key_from_headers(headers: &HeaderMap) -> Result<&str, CredentialError> {
    extract_api_key(authorization(headers)?)
}

fn authorization(headers: &HeaderMap) -> Result<Option<&str>, CredentialError> {
    headers
        .get(AUTHORIZATION)
        .map(|v| v.to_str().map_err(|_| CredentialError::MalformedHeader))
        .transpose()
}

/// Returns the field following `scheme`, or None if the scheme stands alone.
fn credential_for_scheme<'a>(
    value: Option<&'a str>,
    scheme: &str,
) -> Result<Option<&'a str>, CredentialError> {
    let value = value
        .filter(|v| !v.is_empty())
        .ok_or(CredentialError::MissingHeader)?;

    let mut fields = value.split_whitespace();
    match fields.next() {
        Some(first) if first.eq_ignore_ascii_case(scheme) => Ok(fields.next()),
        _ => Err(CredentialError::MalformedHeader),
    }
}
