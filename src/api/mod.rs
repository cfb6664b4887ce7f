mod error;
mod tokens;
mod users;
mod webhooks;

use axum::Router;
use std::sync::Arc;

use crate::auth::AuthGateway;
use crate::db::Database;
use crate::rate_limit::RateLimitConfig;

pub use error::ApiError;
pub use webhooks::USER_UPGRADED_EVENT;

/// Create the API router.
pub fn create_api_router(
    db: Database,
    auth: AuthGateway,
    rate_limit_config: Arc<RateLimitConfig>,
) -> Router {
    let users_state = users::UsersState {
        db: db.clone(),
        auth: auth.clone(),
        rate_limit_config: rate_limit_config.clone(),
    };

    let tokens_state = tokens::TokensState {
        auth: auth.clone(),
        rate_limit_config,
    };

    let webhooks_state = webhooks::WebhooksState { db, auth };

    Router::new()
        .nest("/users", users::router(users_state))
        .merge(tokens::router(tokens_state))
        .merge(webhooks::router(webhooks_state))
}
