#![allow(dead_code)]

use std::num::NonZeroU32;
use std::time::Duration;

use axum::{
    Router,
    body::Body,
    http::{Request, Response, StatusCode},
};
use chirpauth::{
    ServerConfig, create_app, create_app_with_rate_limits, db::Database,
    rate_limit::RateLimitConfig,
};
use governor::Quota;
use serde_json::Value;
use tower::ServiceExt;

pub const JWT_SECRET: &[u8] = b"test-jwt-secret-that-is-long-enough";
pub const POLKA_KEY: &str = "f271c81ff7084ee5b99a5091b42d486e";

pub struct TestApp {
    pub app: Router,
    pub db: Database,
}

fn test_config(db: Database) -> ServerConfig {
    ServerConfig {
        db,
        jwt_secret: JWT_SECRET.to_vec(),
        polka_key: POLKA_KEY.to_string(),
        access_token_ttl: Duration::from_secs(3600),
    }
}

/// App with rate limits high enough that tests never hit them.
pub async fn create_test_app() -> TestApp {
    let db = Database::open(":memory:")
        .await
        .expect("Failed to open test database");
    let generous = Quota::per_second(NonZeroU32::new(10_000).unwrap());
    let app = create_app_with_rate_limits(
        &test_config(db.clone()),
        RateLimitConfig::with_quotas(generous, generous),
    );
    TestApp { app, db }
}

/// App with the production rate limits.
pub async fn create_rate_limited_app() -> TestApp {
    let db = Database::open(":memory:")
        .await
        .expect("Failed to open test database");
    let app = create_app(&test_config(db.clone()));
    TestApp { app, db }
}

pub fn json_request(method: &str, uri: &str, auth: Option<&str>, body: Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json");
    if let Some(auth) = auth {
        builder = builder.header("authorization", auth);
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

pub fn empty_request(method: &str, uri: &str, auth: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(auth) = auth {
        builder = builder.header("authorization", auth);
    }
    builder.body(Body::empty()).unwrap()
}

pub async fn send(app: &Router, request: Request<Body>) -> Response<Body> {
    app.clone().oneshot(request).await.unwrap()
}

pub async fn read_json(response: Response<Body>) -> Value {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&body).unwrap()
}

pub fn bearer(token: &str) -> String {
    format!("Bearer {}", token)
}

/// Create a user through the API and return the response body.
pub async fn signup(app: &Router, email: &str, password: &str) -> Value {
    let response = send(
        app,
        json_request(
            "POST",
            "/api/users",
            None,
            serde_json::json!({ "email": email, "password": password }),
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    read_json(response).await
}

/// Log in through the API and return the response body.
pub async fn login(app: &Router, email: &str, password: &str) -> Value {
    let response = send(
        app,
        json_request(
            "POST",
            "/api/login",
            None,
            serde_json::json!({ "email": email, "password": password }),
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    read_json(response).await
}
