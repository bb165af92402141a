use argon2::{
    Argon2, PasswordHasher,
    password_hash::{PasswordHash, PasswordVerifier, SaltString},
};
use chrono::{Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use password_hash::rand_core::OsRng;
use serde::{Serialize, de::DeserializeOwned};
use uuid::Uuid;

use crate::{
    config::AppConfig,
    dto::auth::{AccessClaims, RESET_PURPOSE, RefreshClaims, ResetClaims},
    entity::users,
    error::{AppError, AppResult},
};

pub const MIN_PASSWORD_LEN: usize = 6;

fn sign<T: Serialize>(claims: &T, secret: &str) -> AppResult<String> {
    encode(
        &Header::default(),
        claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| AppError::Internal(anyhow::anyhow!(e.to_string())))
}

fn verify<T: DeserializeOwned>(token: &str, secret: &str) -> Option<T> {
    decode::<T>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .ok()
    .map(|data| data.claims)
}

fn window(ttl: Duration) -> (usize, usize) {
    let now = Utc::now();
    (now.timestamp() as usize, (now + ttl).timestamp() as usize)
}

pub fn issue_access_token(
    config: &AppConfig,
    user: &users::Model,
    role_name: &str,
) -> AppResult<String> {
    let (iat, exp) = window(Duration::minutes(config.access_token_ttl_minutes));
    let claims = AccessClaims {
        sub: user.id,
        email: user.email.clone(),
        name: user.name.clone(),
        role: role_name.to_string(),
        role_id: user.role_id,
        iat,
        exp,
    };
    sign(&claims, &config.jwt_secret)
}

pub fn decode_access_token(config: &AppConfig, token: &str) -> Option<AccessClaims> {
    verify(token, &config.jwt_secret)
}

pub fn issue_refresh_token(config: &AppConfig, user_id: Uuid) -> AppResult<String> {
    let (iat, exp) = window(Duration::days(config.refresh_token_ttl_days));
    sign(
        &RefreshClaims {
            sub: user_id,
            iat,
            exp,
        },
        &config.refresh_token_secret,
    )
}

pub fn decode_refresh_token(config: &AppConfig, token: &str) -> Option<RefreshClaims> {
    verify(token, &config.refresh_token_secret)
}

/// Single-purpose token embedded in password reset links.
pub fn issue_reset_token(config: &AppConfig, user_id: Uuid) -> AppResult<String> {
    let (iat, exp) = window(Duration::days(config.reset_token_ttl_days));
    sign(
        &ResetClaims {
            sub: user_id,
            purpose: RESET_PURPOSE.to_string(),
            iat,
            exp,
        },
        &config.jwt_secret,
    )
}

/// Subject of a valid reset token.
pub fn decode_reset_token(config: &AppConfig, token: &str) -> Option<Uuid> {
    verify::<ResetClaims>(token, &config.jwt_secret)
        .filter(|claims| claims.purpose == RESET_PURPOSE)
        .map(|claims| claims.sub)
}

pub async fn hash_password(password: String) -> AppResult<String> {
    tokio::task::spawn_blocking(move || {
        let salt = SaltString::generate(&mut OsRng);
        Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| AppError::Internal(anyhow::anyhow!(e.to_string())))
    })
    .await
    .map_err(|e| AppError::Internal(anyhow::anyhow!(e)))?
}

pub async fn verify_password(password: String, stored_hash: String) -> AppResult<bool> {
    tokio::task::spawn_blocking(move || {
        let parsed_hash = PasswordHash::new(&stored_hash)
            .map_err(|_| AppError::Internal(anyhow::anyhow!("Invalid password hash")))?;
        Ok(Argon2::default()
            .verify_password(password.as_bytes(), &parsed_hash)
            .is_ok())
    })
    .await
    .map_err(|e| AppError::Internal(anyhow::anyhow!(e)))?
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> AppConfig {
        AppConfig {
            database_url: String::new(),
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

    fn user() -> users::Model {
        let now = Utc::now().fixed_offset();
        users::Model {
            id: Uuid::new_v4(),
            email: "ada@example.com".into(),
            password_hash: String::new(),
            name: "Ada".into(),
            phone: None,
            avatar: None,
            role_id: Uuid::new_v4(),
            last_login: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn access_token_carries_identity() {
        let cfg = config();
        let user = user();
        let token = issue_access_token(&cfg, &user, "USER").unwrap();
        let claims = decode_access_token(&cfg, &token).unwrap();
        assert_eq!(claims.sub, user.id);
        assert_eq!(claims.email, "ada@example.com");
        assert_eq!(claims.role, "USER");
        assert_eq!(claims.role_id, user.role_id);
    }

    #[test]
    fn refresh_token_needs_refresh_secret() {
        let cfg = config();
        let id = Uuid::new_v4();
        let token = issue_refresh_token(&cfg, id).unwrap();
        assert_eq!(decode_refresh_token(&cfg, &token).unwrap().sub, id);
        assert!(decode_access_token(&cfg, &token).is_none());
    }

    #[test]
    fn reset_and_access_tokens_are_not_interchangeable() {
        let cfg = config();
        let user = user();

        let reset = issue_reset_token(&cfg, user.id).unwrap();
        assert_eq!(decode_reset_token(&cfg, &reset), Some(user.id));
        assert!(decode_access_token(&cfg, &reset).is_none());

        let access = issue_access_token(&cfg, &user, "USER").unwrap();
        assert!(decode_reset_token(&cfg, &access).is_none());
    }

    #[tokio::test]
    async fn password_hash_round_trip() {
        let hash = hash_password("secret1".into()).await.unwrap();
        assert!(verify_password("secret1".into(), hash.clone()).await.unwrap());
        assert!(!verify_password("secret2".into(), hash).await.unwrap());
    }
}
