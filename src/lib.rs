pub mod api;
pub mod auth;
pub mod cli;
pub mod clock;
pub mod db;
pub mod jwt;
pub mod password;
pub mod rate_limit;

use api::create_api_router;
use auth::AuthGateway;
use axum::Router;
use db::Database;
use jwt::JwtConfig;
use rate_limit::RateLimitConfig;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;

/// Path prefix for every API route.
pub const API_PATH: &str = "/api";

pub struct ServerConfig {
    /// Database connection (cloneable, uses connection pool internally)
    pub db: Database,
    /// JWT secret for signing access tokens
    pub jwt_secret: Vec<u8>,
    /// API key expected on payment provider webhooks
    pub polka_key: String,
    /// Lifetime of newly minted access tokens
    pub access_token_ttl: Duration,
}

/// Create the application router with the default rate limits.
pub fn create_app(config: &ServerConfig) -> Router {
    create_app_with_rate_limits(config, RateLimitConfig::new())
}

/// Create the application router with the given rate limits.
pub fn create_app_with_rate_limits(config: &ServerConfig, rate_limits: RateLimitConfig) -> Router {
    let jwt = Arc::new(JwtConfig::new(&config.jwt_secret));
    let auth = AuthGateway::new(
        config.db.clone(),
        jwt,
        config.polka_key.as_str(),
        config.access_token_ttl,
    );

    let api_router = create_api_router(config.db.clone(), auth, Arc::new(rate_limits));

    Router::new().nest(API_PATH, api_router)
}

/// Run the server on the given listener. This function blocks until the server exits.
pub async fn run_server(config: ServerConfig, listener: TcpListener) -> Result<(), std::io::Error> {
    let app = create_app(&config);
    let make_service = app.into_make_service_with_connect_info::<SocketAddr>();
    axum::serve(listener, make_service).await
}
