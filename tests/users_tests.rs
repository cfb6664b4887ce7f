mod common;

use axum::http::StatusCode;
use common::{bearer, create_test_app, json_request, login, read_json, send, signup};
use serde_json::json;

#[tokio::test]
async fn test_create_user_success() {
    let t = create_test_app().await;

    let response = send(
        &t.app,
        json_request(
            "POST",
            "/api/users",
            None,
            json!({ "email": "alice@example.com", "password": "04234" }),
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let json = read_json(response).await;
    assert_eq!(json["email"], "alice@example.com");
    assert_eq!(json["is_chirpy_red"], false);
    assert!(json["id"].as_str().is_some());
    assert!(json["created_at"].as_str().is_some());
    assert!(json["updated_at"].as_str().is_some());
    assert!(json.get("hashed_password").is_none());
    assert!(json.get("password").is_none());
}

#[tokio::test]
async fn test_password_is_stored_hashed() {
    let t = create_test_app().await;
    signup(&t.app, "alice@example.com", "04234").await;

    let user = t
        .db
        .users()
        .get_by_email("alice@example.com")
        .await
        .unwrap()
        .unwrap();
    assert_ne!(user.hashed_password, "04234");
    assert!(user.hashed_password.starts_with("$2b$10$"));
}

#[tokio::test]
async fn test_create_user_duplicate_email() {
    let t = create_test_app().await;
    signup(&t.app, "alice@example.com", "04234").await;

    let response = send(
        &t.app,
        json_request(
            "POST",
            "/api/users",
            None,
            json!({ "email": "alice@example.com", "password": "other" }),
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_create_user_empty_password() {
    let t = create_test_app().await;

    let response = send(
        &t.app,
        json_request(
            "POST",
            "/api/users",
            None,
            json!({ "email": "alice@example.com", "password": "" }),
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_update_user_requires_access_token() {
    let t = create_test_app().await;
    signup(&t.app, "alice@example.com", "04234").await;

    let response = send(
        &t.app,
        json_request(
            "PUT",
            "/api/users",
            None,
            json!({ "email": "alice@new.example.com", "password": "new" }),
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let json = read_json(response).await;
    assert_eq!(json["error"], "Not authenticated");
}

#[tokio::test]
async fn test_update_user_rejects_refresh_token() {
    let t = create_test_app().await;
    signup(&t.app, "alice@example.com", "04234").await;
    let session = login(&t.app, "alice@example.com", "04234").await;
    let refresh = session["refresh_token"].as_str().unwrap();

    let response = send(
        &t.app,
        json_request(
            "PUT",
            "/api/users",
            Some(&bearer(refresh)),
            json!({ "email": "alice@new.example.com", "password": "new" }),
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_update_user_changes_credentials() {
    let t = create_test_app().await;
    let created = signup(&t.app, "alice@example.com", "04234").await;
    let session = login(&t.app, "alice@example.com", "04234").await;
    let token = session["token"].as_str().unwrap();

    let response = send(
        &t.app,
        json_request(
            "PUT",
            "/api/users",
            Some(&bearer(token)),
            json!({ "email": "alice@new.example.com", "password": "new-password" }),
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = read_json(response).await;
    assert_eq!(json["id"], created["id"]);
    assert_eq!(json["email"], "alice@new.example.com");

    // Old password no longer works, new one does.
    let response = send(
        &t.app,
        json_request(
            "POST",
            "/api/login",
            None,
            json!({ "email": "alice@new.example.com", "password": "04234" }),
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    login(&t.app, "alice@new.example.com", "new-password").await;
}
