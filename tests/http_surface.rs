//! Router-level checks that never reach the database: authentication,
//! claims-based guards, body validation and the file route.

use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    Router,
    body::Body,
    http::{Method, Request, StatusCode, header},
};
use chrono::Utc;
use http_body_util::BodyExt;
use sea_orm::DatabaseConnection;
use serde_json::{Value, json};
use shopfront_api::{
    build_app,
    config::AppConfig,
    entity::users,
    providers::storage::AssetStore,
    services::token_service::issue_access_token,
    state::AppState,
};
use sqlx::postgres::PgPoolOptions;
use tower::ServiceExt;
use uuid::Uuid;

const MANAGED_URL: &str =
    "https%3A%2F%2Fcdn.example.com%2Fdemo%2Fimage%2Fupload%2Fv1712%2Fshop%2Fmug.png";

fn config() -> AppConfig {
    AppConfig {
        database_url: "postgres://localhost/unused".into(),
        host: "127.0.0.1".into(),
        port: 0,
        app_env: "test".into(),
        jwt_secret: "access-secret".into(),
        refresh_token_secret: "refresh-secret".into(),
        access_token_ttl_minutes: 15,
        refresh_token_ttl_days: 7,
        reset_token_ttl_days: 7,
        frontend_url: "http://localhost:3000".into(),
        demo_account_email: "demo@gmail.com".into(),
    }
}

fn offline_state() -> AppState {
    let pool = PgPoolOptions::new()
        .connect_lazy("postgres://localhost/unused")
        .unwrap();
    AppState::new(pool, DatabaseConnection::Disconnected, config())
}

fn token_for(email: &str, role: &str) -> String {
    let now = Utc::now().fixed_offset();
    let user = users::Model {
        id: Uuid::new_v4(),
        email: email.into(),
        password_hash: String::new(),
        name: "Tester".into(),
        phone: None,
        avatar: None,
        role_id: Uuid::new_v4(),
        last_login: None,
        created_at: now,
        updated_at: now,
    };
    issue_access_token(&config(), &user, role).unwrap()
}

async fn send(app: Router, req: Request<Body>) -> (StatusCode, Value) {
    let response = app.oneshot(req).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, body)
}

fn request(method: Method, uri: &str, token: Option<&str>, body: Option<Value>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

#[tokio::test]
async fn health_and_unknown_routes() {
    let app = build_app(offline_state());
    let (status, body) = send(app.clone(), request(Method::GET, "/health", None, None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status"], "ok");

    let (status, body) = send(app, request(Method::GET, "/api/nowhere", None, None)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn protected_route_requires_a_valid_token() {
    let app = build_app(offline_state());

    let (status, body) = send(app.clone(), request(Method::GET, "/api/auth/me", None, None)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "Unauthorized: No token provided");

    let (status, body) = send(
        app,
        request(Method::GET, "/api/auth/me", Some("not-a-jwt"), None),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["message"], "Invalid or expired access token");
}

#[tokio::test]
async fn demo_account_cannot_write() {
    let app = build_app(offline_state());
    let token = token_for("demo@gmail.com", "USER");
    let (status, body) = send(
        app,
        request(
            Method::POST,
            "/api/auth/change-password",
            Some(&token),
            Some(json!({ "password": "a", "newPassword": "b", "confirmPassword": "b" })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["message"], "Demo account has read-only access");
}

#[tokio::test]
async fn unknown_body_fields_are_rejected() {
    let app = build_app(offline_state());
    let (status, body) = send(
        app,
        request(
            Method::POST,
            "/api/auth/login",
            None,
            Some(json!({ "email": "a@b.c", "password": "x", "remember": true })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "remember is not a valid field");
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn file_deletion_is_admin_only() {
    let app = build_app(offline_state());
    let uri = format!("/api/file?url={MANAGED_URL}");

    let user = token_for("shopper@example.com", "USER");
    let (status, body) = send(app.clone(), request(Method::DELETE, &uri, Some(&user), None)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["message"], "Access denied. Required roles: ADMIN");

    let admin = token_for("admin@example.com", "ADMIN");
    let (status, body) = send(app.clone(), request(Method::DELETE, &uri, Some(&admin), None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "File deleted successfully");
    assert_eq!(body["data"]["public_id"], "shop/mug");

    let (status, body) = send(app, request(Method::DELETE, "/api/file", Some(&admin), None)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "File url is required");
}

struct RefusingStore;

#[async_trait]
impl AssetStore for RefusingStore {
    async fn delete(&self, _public_id: &str) -> anyhow::Result<bool> {
        Ok(false)
    }
}

#[tokio::test]
async fn refused_file_deletion_is_forbidden() {
    let state = offline_state().with_assets(Arc::new(RefusingStore));
    let app = build_app(state);
    let admin = token_for("admin@example.com", "ADMIN");

    let (status, body) = send(
        app.clone(),
        request(
            Method::DELETE,
            &format!("/api/file?url={MANAGED_URL}"),
            Some(&admin),
            None,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["message"], "Failed to delete file");

    let (status, body) = send(
        app,
        request(
            Method::DELETE,
            "/api/file?url=%2Fstatic%2Flogo.png",
            Some(&admin),
            None,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Not a managed file url");
}
