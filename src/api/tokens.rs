//! Login and token management endpoints.
//!
//! - POST `/login` - Exchange email and password for an access token and a refresh token
//! - POST `/refresh` - Exchange a bearer refresh token for a new access token
//! - POST `/revoke` - Revoke a bearer refresh token

use axum::{
    Json, Router,
    extract::State,
    http::{HeaderMap, StatusCode},
    middleware,
    response::IntoResponse,
    routing::post,
};
use serde::Serialize;
use std::sync::Arc;

use super::error::{ApiError, validate_credentials};
use super::users::{CredentialsRequest, UserResponse};
use crate::auth::{ApiAuthError, AuthGateway};
use crate::rate_limit::{RateLimitConfig, rate_limit_login};

#[derive(Clone)]
pub struct TokensState {
    pub auth: AuthGateway,
    pub rate_limit_config: Arc<RateLimitConfig>,
}

pub fn router(state: TokensState) -> Router {
    let login_router = Router::new()
        .route("/login", post(login))
        .with_state(state.clone())
        .layer(middleware::from_fn_with_state(
            state.rate_limit_config.clone(),
            rate_limit_login,
        ));

    let token_router = Router::new()
        .route("/refresh", post(refresh_token))
        .route("/revoke", post(revoke_token))
        .with_state(state);

    Router::new().merge(login_router).merge(token_router)
}

#[derive(Serialize)]
struct LoginResponse {
    #[serde(flatten)]
    user: UserResponse,
    token: String,
    refresh_token: String,
}

#[derive(Serialize)]
struct RefreshResponse {
    token: String,
}

async fn login(
    State(state): State<TokensState>,
    Json(payload): Json<CredentialsRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validate_credentials(payload.email.trim(), &payload.password)?;

    let outcome = state
        .auth
        .login(payload.email.trim(), &payload.password)
        .await
        .map_err(|e| {
            if e.is_client_error() {
                ApiError::unauthorized(ApiAuthError(e).message())
            } else {
                ApiError::internal_error("Login failed", e)
            }
        })?;

    Ok((
        StatusCode::OK,
        Json(LoginResponse {
            user: outcome.user.into(),
            token: outcome.access_token.token,
            refresh_token: outcome.refresh_token.token,
        }),
    ))
}

async fn refresh_token(
    State(state): State<TokensState>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, ApiError> {
    let access = state.auth.refresh(&headers).await?;
    Ok((StatusCode::OK, Json(RefreshResponse { token: access.token })))
}

/// Always 204 for a well-formed header, whether or not anything was revoked.
async fn revoke_token(
    State(state): State<TokensState>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, ApiError> {
    state.auth.revoke(&headers).await?;
    Ok(StatusCode::NO_CONTENT)
}
