use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use shopfront_api::{
    config::AppConfig,
    db::{create_orm_conn, create_pool, run_migrations},
    dto::auth::{LoginRequest, RefreshRequest, RegisterRequest, UpdateProfileRequest},
    error::AppError,
    middleware::auth::AuthUser,
    providers::storage::AssetStore,
    services::{auth_service, token_service::decode_access_token},
    state::AppState,
};
use uuid::Uuid;

fn config(database_url: &str) -> AppConfig {
    AppConfig {
        database_url: database_url.to_string(),
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

// Register, log in and rotate tokens against a real database.
#[tokio::test]
async fn register_login_and_refresh() -> anyhow::Result<()> {
    let database_url = match std::env::var("TEST_DATABASE_URL")
        .or_else(|_| std::env::var("DATABASE_URL"))
    {
        Ok(url) => url,
        Err(_) => {
            eprintln!("Skipping test: set TEST_DATABASE_URL or DATABASE_URL to run auth flow tests.");
            return Ok(());
        }
    };

    let pool = create_pool(&database_url).await?;
    run_migrations(&pool).await?;
    let orm = create_orm_conn(&database_url).await?;
    let state = AppState::new(pool, orm, config(&database_url));

    sqlx::query("INSERT INTO roles (id, name, score) VALUES ($1, 'USER', 0) ON CONFLICT (name) DO NOTHING")
        .bind(Uuid::new_v4())
        .execute(&state.pool)
        .await?;

    let email = format!("{}@Example.com", Uuid::new_v4());
    let register = || RegisterRequest {
        email: email.clone(),
        password: "s3cret!".into(),
        name: "Flow Tester".into(),
        phone: None,
        avatar: None,
    };

    let session = auth_service::register_user(&state, register())
        .await?
        .data
        .expect("session");
    assert_eq!(session.user.email, email.to_lowercase());
    let claims = decode_access_token(&state.config, &session.access_token).expect("claims");
    assert_eq!(claims.sub, session.user.id);
    assert_eq!(claims.role, "USER");

    let err = auth_service::register_user(&state, register())
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Conflict(ref msg) if msg == "Email already exists"));

    let err = auth_service::login_user(
        &state,
        LoginRequest {
            email: format!("{}@example.com", Uuid::new_v4()),
            password: "s3cret!".into(),
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::NotFound(ref msg) if msg == "User not found"));

    let err = auth_service::login_user(
        &state,
        LoginRequest {
            email: email.clone(),
            password: "wrong".into(),
        },
    )
    .await
    .unwrap_err();
    assert_eq!(err.to_string(), "Invalid credentials");

    let login = auth_service::login_user(
        &state,
        LoginRequest {
            email: email.clone(),
            password: "s3cret!".into(),
        },
    )
    .await?;
    assert_eq!(login.message, "Login successful");
    let login = login.data.expect("session");
    assert!(login.user.last_login.is_some());

    let pair = auth_service::refresh_tokens(
        &state,
        RefreshRequest {
            refresh_token: Some(login.refresh_token.clone()),
        },
    )
    .await?
    .data
    .expect("tokens");
    assert!(decode_access_token(&state.config, &pair.access_token).is_some());

    let err = auth_service::refresh_tokens(
        &state,
        RefreshRequest {
            refresh_token: Some(login.access_token),
        },
    )
    .await
    .unwrap_err();
    assert_eq!(err.to_string(), "Invalid refresh token");

    Ok(())
}

/// Refuses every deletion and remembers what was asked.
#[derive(Default)]
struct RefusingStore {
    asked: Mutex<Vec<String>>,
}

#[async_trait]
impl AssetStore for RefusingStore {
    async fn delete(&self, public_id: &str) -> anyhow::Result<bool> {
        self.asked.lock().unwrap().push(public_id.to_string());
        Ok(false)
    }
}

// The old avatar is only touched once the profile is valid, and a refused
// deletion leaves the stored avatar as it was.
#[tokio::test]
async fn profile_avatar_survives_rejected_updates() -> anyhow::Result<()> {
    let database_url = match std::env::var("TEST_DATABASE_URL")
        .or_else(|_| std::env::var("DATABASE_URL"))
    {
        Ok(url) => url,
        Err(_) => {
            eprintln!("Skipping test: set TEST_DATABASE_URL or DATABASE_URL to run auth flow tests.");
            return Ok(());
        }
    };

    let pool = create_pool(&database_url).await?;
    run_migrations(&pool).await?;
    let orm = create_orm_conn(&database_url).await?;
    let store = Arc::new(RefusingStore::default());
    let state = AppState::new(pool, orm, config(&database_url)).with_assets(store.clone());

    sqlx::query("INSERT INTO roles (id, name, score) VALUES ($1, 'USER', 0) ON CONFLICT (name) DO NOTHING")
        .bind(Uuid::new_v4())
        .execute(&state.pool)
        .await?;

    let old_avatar = "https://res.example.com/demo/image/upload/v3/shop/avatars/old.png";
    let session = auth_service::register_user(
        &state,
        RegisterRequest {
            email: format!("{}@example.com", Uuid::new_v4()),
            password: "s3cret!".into(),
            name: "Avatar Owner".into(),
            phone: None,
            avatar: Some(old_avatar.into()),
        },
    )
    .await?
    .data
    .expect("session");
    let auth = AuthUser {
        user_id: session.user.id,
        email: session.user.email.clone(),
        name: session.user.name.clone(),
        role: "USER".into(),
        role_id: session.user.role_id,
    };
    let new_avatar = "https://res.example.com/demo/image/upload/v4/shop/avatars/new.png";

    let err = auth_service::update_profile(
        &state,
        &auth,
        UpdateProfileRequest {
            name: Some("  ".into()),
            phone: None,
            avatar: Some(new_avatar.into()),
        },
    )
    .await
    .unwrap_err();
    assert_eq!(err.to_string(), "Name cannot be empty");
    assert!(store.asked.lock().unwrap().is_empty());

    let err = auth_service::update_profile(
        &state,
        &auth,
        UpdateProfileRequest {
            name: Some("Renamed".into()),
            phone: None,
            avatar: Some(new_avatar.into()),
        },
    )
    .await
    .unwrap_err();
    assert_eq!(err.to_string(), "Failed to delete old image");
    assert_eq!(*store.asked.lock().unwrap(), vec!["shop/avatars/old".to_string()]);

    let (name, avatar): (String, Option<String>) =
        sqlx::query_as("SELECT name, avatar FROM users WHERE id = $1")
            .bind(auth.user_id)
            .fetch_one(&state.pool)
            .await?;
    assert_eq!(name, "Avatar Owner");
    assert_eq!(avatar.as_deref(), Some(old_avatar));

    Ok(())
}
