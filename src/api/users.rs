//! User account endpoints.
//!
//! - POST `/` - Create a user (rate limited)
//! - PUT `/` - Change the caller's email and password

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    middleware,
    response::IntoResponse,
    routing::{post, put},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use super::error::{ApiError, ResultExt, validate_credentials};
use crate::auth::{Auth, AuthGateway};
use crate::db::{Database, User};
use crate::impl_has_auth_gateway;
use crate::password::spawn_hash_password;
use crate::rate_limit::{RateLimitConfig, rate_limit_user_create};

#[derive(Clone)]
pub struct UsersState {
    pub db: Database,
    pub auth: AuthGateway,
    pub rate_limit_config: Arc<RateLimitConfig>,
}

impl_has_auth_gateway!(UsersState);

pub fn router(state: UsersState) -> Router {
    let create_router = Router::new()
        .route("/", post(create_user))
        .with_state(state.clone())
        .layer(middleware::from_fn_with_state(
            state.rate_limit_config.clone(),
            rate_limit_user_create,
        ));

    let update_router = Router::new()
        .route("/", put(update_user))
        .with_state(state);

    Router::new().merge(create_router).merge(update_router)
}

#[derive(Deserialize)]
pub(super) struct CredentialsRequest {
    pub email: String,
    pub password: String,
}

/// Public view of a user. The password digest never leaves the server.
#[derive(Serialize)]
pub(super) struct UserResponse {
    pub id: Uuid,
    pub created_at: String,
    pub updated_at: String,
    pub email: String,
    pub is_chirpy_red: bool,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            created_at: user.created_at,
            updated_at: user.updated_at,
            email: user.email,
            is_chirpy_red: user.is_chirpy_red,
        }
    }
}

fn is_unique_violation(e: &sqlx::Error) -> bool {
    matches!(e, sqlx::Error::Database(db) if db.is_unique_violation())
}

async fn create_user(
    State(state): State<UsersState>,
    Json(payload): Json<CredentialsRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let email = payload.email.trim();
    validate_credentials(email, &payload.password)?;

    let hashed = spawn_hash_password(payload.password)
        .await
        .internal_err("Failed to hash password")?;

    let user = match state.db.users().create(email, &hashed).await {
        Ok(user) => user,
        Err(e) if is_unique_violation(&e) => {
            return Err(ApiError::conflict("Email is already registered"));
        }
        Err(e) => return Err(ApiError::db_error("Failed to create user", e)),
    };

    tracing::info!(user_id = %user.id, "User created");

    Ok((StatusCode::CREATED, Json(UserResponse::from(user))))
}

async fn update_user(
    State(state): State<UsersState>,
    Auth(auth): Auth,
    Json(payload): Json<CredentialsRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let email = payload.email.trim();
    validate_credentials(email, &payload.password)?;

    let hashed = spawn_hash_password(payload.password)
        .await
        .internal_err("Failed to hash password")?;

    let user = match state.db.users().update(auth.user_id, email, &hashed).await {
        Ok(Some(user)) => user,
        Ok(None) => return Err(ApiError::not_found("User not found")),
        Err(e) if is_unique_violation(&e) => {
            return Err(ApiError::conflict("Email is already registered"));
        }
        Err(e) => return Err(ApiError::db_error("Failed to update user", e)),
    };

    tracing::info!(user_id = %user.id, "User updated");

    Ok((StatusCode::OK, Json(UserResponse::from(user))))
}
