use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    extract::FieldMask,
    models::{PermissionGrant, UserView},
};

pub const RESET_PURPOSE: &str = "password_reset";

/// Access token claims. `role` is the role name used by the claims strategy.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AccessClaims {
    pub sub: Uuid,
    pub email: String,
    pub name: String,
    pub role: String,
    pub role_id: Uuid,
    pub iat: usize,
    pub exp: usize,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RefreshClaims {
    pub sub: Uuid,
    pub iat: usize,
    pub exp: usize,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ResetClaims {
    pub sub: Uuid,
    pub purpose: String,
    pub iat: usize,
    pub exp: usize,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct RegisterRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub name: String,
    pub phone: Option<String>,
    pub avatar: Option<String>,
}

impl FieldMask for RegisterRequest {
    const FIELDS: &'static [&'static str] = &["email", "password", "name", "phone", "avatar"];
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

impl FieldMask for LoginRequest {
    const FIELDS: &'static [&'static str] = &["email", "password"];
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordRequest {
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub new_password: String,
    #[serde(default)]
    pub confirm_password: String,
}

impl FieldMask for ChangePasswordRequest {
    const FIELDS: &'static [&'static str] = &["password", "newPassword", "confirmPassword"];
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct ForgotPasswordRequest {
    #[serde(default)]
    pub identifier: String,
    /// `email` (default) or `phone`.
    #[serde(rename = "type")]
    pub kind: Option<String>,
}

impl FieldMask for ForgotPasswordRequest {
    const FIELDS: &'static [&'static str] = &["identifier", "type"];
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ResetPasswordRequest {
    #[serde(default)]
    pub token: String,
    #[serde(default)]
    pub new_password: String,
    #[serde(default)]
    pub confirm_password: String,
}

impl FieldMask for ResetPasswordRequest {
    const FIELDS: &'static [&'static str] = &["token", "newPassword", "confirmPassword"];
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RefreshRequest {
    pub refresh_token: Option<String>,
}

impl FieldMask for RefreshRequest {
    const FIELDS: &'static [&'static str] = &["refreshToken"];
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateProfileRequest {
    pub name: Option<String>,
    pub phone: Option<String>,
    pub avatar: Option<String>,
}

impl FieldMask for UpdateProfileRequest {
    const FIELDS: &'static [&'static str] = &["name", "phone", "avatar"];
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AuthPayload {
    pub user: UserView,
    pub permissions: Vec<PermissionGrant>,
    pub access_token: String,
    pub refresh_token: String,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ForgotPasswordResponse {
    pub method: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub verify_link: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct Profile {
    #[serde(flatten)]
    pub user: UserView,
    pub permissions: Vec<PermissionGrant>,
}
