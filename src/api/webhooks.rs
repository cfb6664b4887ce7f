//! Payment provider webhooks.
//!
//! - POST `/polka/webhooks` - Subscription events, authenticated with `ApiKey`

use axum::{Json, Router, extract::State, http::StatusCode, routing::post};
use serde::Deserialize;
use uuid::Uuid;

use super::error::{ApiError, ResultExt};
use crate::auth::{ApiKeyAuth, AuthGateway};
use crate::db::Database;
use crate::impl_has_auth_gateway;

/// The only event acted upon; others are acknowledged and ignored.
pub const USER_UPGRADED_EVENT: &str = "user.upgraded";

#[derive(Clone)]
pub struct WebhooksState {
    pub db: Database,
    pub auth: AuthGateway,
}

impl_has_auth_gateway!(WebhooksState);

pub fn router(state: WebhooksState) -> Router {
    Router::new()
        .route("/polka/webhooks", post(polka_webhook))
        .with_state(state)
}

#[derive(Deserialize)]
struct WebhookData {
    user_id: Uuid,
}

#[derive(Deserialize)]
struct WebhookRequest {
    event: String,
    data: Option<WebhookData>,
}

async fn polka_webhook(
    State(state): State<WebhooksState>,
    _auth: ApiKeyAuth,
    Json(payload): Json<WebhookRequest>,
) -> Result<StatusCode, ApiError> {
    if payload.event != USER_UPGRADED_EVENT {
        tracing::debug!(event = %payload.event, "Ignoring webhook event");
        return Ok(StatusCode::NO_CONTENT);
    }

    let data = payload
        .data
        .ok_or_else(|| ApiError::bad_request("Missing event data"))?;

    let upgraded = state
        .db
        .users()
        .upgrade_to_chirpy_red(data.user_id)
        .await
        .db_err("Failed to upgrade user")?;

    if !upgraded {
        return Err(ApiError::not_found("User not found"));
    }

    tracing::info!(user_id = %data.user_id, "User upgraded to Chirpy Red");
    Ok(StatusCode::NO_CONTENT)
}
