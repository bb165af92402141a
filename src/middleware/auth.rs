use axum::{
    extract::FromRequestParts,
    http::{HeaderMap, Method, header, request::Parts},
};
use uuid::Uuid;

use crate::{
    config::AppConfig, error::AppError, services::token_service::decode_access_token,
    state::AppState,
};

pub const ADMIN_ROLE: &str = "ADMIN";

/// Identity taken from a verified access token.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: Uuid,
    pub email: String,
    pub name: String,
    pub role: String,
    pub role_id: Uuid,
}

impl AuthUser {
    /// Claims-only check used for ownership bypasses.
    pub fn is_admin(&self) -> bool {
        self.role == ADMIN_ROLE
    }
}

fn is_write(method: &Method) -> bool {
    matches!(
        *method,
        Method::POST | Method::PUT | Method::PATCH | Method::DELETE
    )
}

pub fn authenticate(
    headers: &HeaderMap,
    method: &Method,
    config: &AppConfig,
) -> Result<AuthUser, AppError> {
    let auth_header = headers
        .get(header::AUTHORIZATION)
        .ok_or_else(|| AppError::Unauthorized("Unauthorized: No token provided".into()))?;

    let token = auth_header
        .to_str()
        .ok()
        .and_then(|value| value.split_whitespace().nth(1))
        .ok_or_else(|| AppError::Unauthorized("Access token required".into()))?;

    let claims = decode_access_token(config, token)
        .ok_or_else(|| AppError::forbidden("Invalid or expired access token"))?;

    if is_write(method) && claims.email.eq_ignore_ascii_case(&config.demo_account_email) {
        return Err(AppError::forbidden("Demo account has read-only access"));
    }

    Ok(AuthUser {
        user_id: claims.sub,
        email: claims.email,
        name: claims.name,
        role: claims.role,
        role_id: claims.role_id,
    })
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        if let Some(user) = parts.extensions.get::<AuthUser>() {
            return Ok(user.clone());
        }
        let user = authenticate(&parts.headers, &parts.method, &state.config)?;
        parts.extensions.insert(user.clone());
        Ok(user)
    }
}
