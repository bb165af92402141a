use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ActiveValue::NotSet, ColumnTrait, EntityTrait, QueryFilter, Set,
    TransactionTrait,
};
use serde_json::json;
use uuid::Uuid;

use crate::{
    audit,
    dto::auth::{
        AuthPayload, ChangePasswordRequest, ForgotPasswordRequest, ForgotPasswordResponse,
        LoginRequest, Profile, RefreshRequest, RegisterRequest, ResetPasswordRequest, TokenPair,
        UpdateProfileRequest,
    },
    entity::{
        Roles, Users, roles,
        users::{self, ActiveModel as UserActive, Column as UserCol},
    },
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::UserView,
    providers::{notify::Channel, notify::reset_link_message, storage::delete_managed},
    response::ApiResponse,
    services::{
        permission_service::grants_for_score,
        token_service::{
            MIN_PASSWORD_LEN, decode_refresh_token, decode_reset_token, hash_password,
            issue_access_token, issue_refresh_token, issue_reset_token, verify_password,
        },
    },
    state::AppState,
};

pub const DEFAULT_ROLE: &str = "USER";

async fn find_user(state: &AppState, id: Uuid) -> AppResult<users::Model> {
    match Users::find_by_id(id).one(&state.orm).await? {
        Some(user) => Ok(user),
        None => Err(AppError::not_found("User not found")),
    }
}

async fn role_of(state: &AppState, user: &users::Model) -> AppResult<Option<roles::Model>> {
    let role = Roles::find_by_id(user.role_id)
        .filter(roles::Column::DeletedAt.is_null())
        .one(&state.orm)
        .await?;
    Ok(role)
}

/// User view, granted permissions and a fresh token pair.
async fn session_for(state: &AppState, user: users::Model) -> AppResult<AuthPayload> {
    let role = role_of(state, &user).await?;
    let permissions = match &role {
        Some(role) => grants_for_score(&state.orm, role.score).await?,
        None => Vec::new(),
    };
    let role_name = role.as_ref().map(|r| r.name.as_str()).unwrap_or_default();

    let access_token = issue_access_token(&state.config, &user, role_name)?;
    let refresh_token = issue_refresh_token(&state.config, user.id)?;

    Ok(AuthPayload {
        user: UserView::with_role(user, role),
        permissions,
        access_token,
        refresh_token,
    })
}

fn check_new_password(new_password: &str, confirm_password: &str, mismatch: &str) -> AppResult<()> {
    if new_password != confirm_password {
        return Err(AppError::bad_request(mismatch));
    }
    if new_password.chars().count() < MIN_PASSWORD_LEN {
        return Err(AppError::bad_request(format!(
            "Password must be at least {} characters long",
            MIN_PASSWORD_LEN
        )));
    }
    Ok(())
}

pub async fn register_user(
    state: &AppState,
    payload: RegisterRequest,
) -> AppResult<ApiResponse<AuthPayload>> {
    let RegisterRequest {
        email,
        password,
        name,
        phone,
        avatar,
    } = payload;
    let email = email.trim().to_lowercase();
    if email.is_empty() || password.is_empty() || name.trim().is_empty() {
        return Err(AppError::bad_request("Missing required field"));
    }

    let exists = Users::find()
        .filter(UserCol::Email.eq(email.as_str()))
        .one(&state.orm)
        .await?;
    if exists.is_some() {
        return Err(AppError::Conflict("Email already exists".into()));
    }

    let role = Roles::find_live()
        .filter(roles::Column::Name.eq(DEFAULT_ROLE))
        .one(&state.orm)
        .await?
        .ok_or_else(|| AppError::Internal(anyhow::anyhow!("default role {} is missing", DEFAULT_ROLE)))?;

    let password_hash = hash_password(password).await?;

    let user = UserActive {
        id: Set(Uuid::new_v4()),
        email: Set(email),
        password_hash: Set(password_hash),
        name: Set(name.trim().to_string()),
        phone: Set(phone),
        avatar: Set(avatar),
        role_id: Set(role.id),
        last_login: Set(None),
        created_at: NotSet,
        updated_at: NotSet,
    }
    .insert(&state.orm)
    .await?;

    audit::record(
        &state.pool,
        Some(user.id),
        "user_register",
        "users",
        json!({ "user_id": user.id }),
    )
    .await;

    let session = session_for(state, user).await?;
    Ok(ApiResponse::success("User registered successfully", session))
}

pub async fn login_user(
    state: &AppState,
    payload: LoginRequest,
) -> AppResult<ApiResponse<AuthPayload>> {
    let LoginRequest { email, password } = payload;
    let email = email.trim().to_lowercase();
    if email.is_empty() || password.is_empty() {
        return Err(AppError::bad_request("Email and password are required"));
    }

    let user = Users::find()
        .filter(UserCol::Email.eq(email.as_str()))
        .one(&state.orm)
        .await?;
    let user = match user {
        Some(u) => u,
        None => return Err(AppError::not_found("User not found")),
    };

    if !verify_password(password, user.password_hash.clone()).await? {
        return Err(AppError::bad_request("Invalid credentials"));
    }

    let mut active: UserActive = user.into();
    active.last_login = Set(Some(Utc::now().into()));
    let user = active.update(&state.orm).await?;

    audit::record(
        &state.pool,
        Some(user.id),
        "user_login",
        "users",
        json!({ "user_id": user.id }),
    )
    .await;

    let session = session_for(state, user).await?;
    Ok(ApiResponse::spread("Login successful", session))
}

pub async fn refresh_tokens(
    state: &AppState,
    payload: RefreshRequest,
) -> AppResult<ApiResponse<TokenPair>> {
    let Some(token) = payload.refresh_token.filter(|t| !t.is_empty()) else {
        return Err(AppError::Unauthorized("Refresh token required".into()));
    };
    let claims = decode_refresh_token(&state.config, &token)
        .ok_or_else(|| AppError::forbidden("Invalid refresh token"))?;

    let user = match Users::find_by_id(claims.sub).one(&state.orm).await? {
        Some(user) => user,
        None => return Err(AppError::forbidden("User not found")),
    };
    let role = role_of(state, &user).await?;
    let role_name = role.as_ref().map(|r| r.name.as_str()).unwrap_or_default();

    let pair = TokenPair {
        access_token: issue_access_token(&state.config, &user, role_name)?,
        refresh_token: issue_refresh_token(&state.config, user.id)?,
    };
    Ok(ApiResponse::spread("Token refreshed successfully", pair))
}

pub async fn change_password(
    state: &AppState,
    auth: &AuthUser,
    payload: ChangePasswordRequest,
) -> AppResult<ApiResponse<serde_json::Value>> {
    let ChangePasswordRequest {
        password,
        new_password,
        confirm_password,
    } = payload;
    if password.is_empty() || new_password.is_empty() || confirm_password.is_empty() {
        return Err(AppError::bad_request("All password fields are required"));
    }

    let user = find_user(state, auth.user_id).await?;
    if !verify_password(password, user.password_hash.clone()).await? {
        return Err(AppError::bad_request("Current password is incorrect"));
    }
    check_new_password(&new_password, &confirm_password, "New passwords do not match")?;

    let mut active: UserActive = user.into();
    active.password_hash = Set(hash_password(new_password).await?);
    active.updated_at = Set(Utc::now().into());
    active.update(&state.orm).await?;

    Ok(ApiResponse::message("Password updated successfully"))
}

pub async fn forgot_password(
    state: &AppState,
    payload: ForgotPasswordRequest,
) -> AppResult<ApiResponse<ForgotPasswordResponse>> {
    let identifier = payload.identifier.trim().to_string();
    if identifier.is_empty() {
        return Err(AppError::bad_request("Email or phone number is required"));
    }
    let channel = match payload.kind.as_deref().unwrap_or("email") {
        "email" => Channel::Email,
        "phone" => Channel::Phone,
        _ => return Err(AppError::bad_request("Type must be 'email' or 'phone'")),
    };

    let condition = match channel {
        Channel::Email => UserCol::Email.eq(identifier.to_lowercase()),
        Channel::Phone => UserCol::Phone.eq(identifier.as_str()),
    };
    let user = match Users::find().filter(condition).one(&state.orm).await? {
        Some(user) => user,
        None => return Err(AppError::not_found("User not found")),
    };

    let token = issue_reset_token(&state.config, user.id)?;
    let link = format!(
        "{}/reset-password?token={}",
        state.config.frontend_url.trim_end_matches('/'),
        token
    );

    let to = match channel {
        Channel::Email => user.email.clone(),
        Channel::Phone => user.phone.clone().unwrap_or_default(),
    };
    state
        .notifier
        .send(reset_link_message(channel, &to, &user.name, &link))
        .await?;

    let response = ForgotPasswordResponse {
        method: channel.as_str().to_string(),
        verify_link: (!state.config.is_production()).then_some(link),
    };
    Ok(ApiResponse::spread(
        format!("Link sent to {}", channel.as_str()),
        response,
    ))
}

pub async fn reset_password(
    state: &AppState,
    payload: ResetPasswordRequest,
) -> AppResult<ApiResponse<serde_json::Value>> {
    let user_id = decode_reset_token(&state.config, payload.token.trim())
        .ok_or_else(|| AppError::bad_request("Invalid or expired reset token"))?;
    check_new_password(
        &payload.new_password,
        &payload.confirm_password,
        "Passwords do not match",
    )?;

    let user = find_user(state, user_id).await?;
    let mut active: UserActive = user.into();
    active.password_hash = Set(hash_password(payload.new_password).await?);
    active.updated_at = Set(Utc::now().into());
    active.update(&state.orm).await?;

    tracing::info!(user = %user_id, "password reset");
    Ok(ApiResponse::message("Password reset successfully"))
}

pub async fn get_profile(state: &AppState, auth: &AuthUser) -> AppResult<ApiResponse<Profile>> {
    let user = find_user(state, auth.user_id).await?;
    let role = role_of(state, &user).await?;
    let permissions = match &role {
        Some(role) => grants_for_score(&state.orm, role.score).await?,
        None => Vec::new(),
    };

    Ok(ApiResponse::success(
        "Profile retrieved successfully",
        Profile {
            user: UserView::with_role(user, role),
            permissions,
        },
    ))
}

pub async fn update_profile(
    state: &AppState,
    auth: &AuthUser,
    payload: UpdateProfileRequest,
) -> AppResult<ApiResponse<UserView>> {
    let user = find_user(state, auth.user_id).await?;

    if let Some(name) = payload.name.as_deref() {
        if name.trim().is_empty() {
            return Err(AppError::bad_request("Name cannot be empty"));
        }
    }
    let superseded = match (payload.avatar.as_deref(), user.avatar.as_deref()) {
        (Some(new_avatar), Some(old_avatar)) if new_avatar != old_avatar => {
            Some(old_avatar.to_string())
        }
        _ => None,
    };

    let mut active: UserActive = user.into();
    if let Some(name) = payload.name {
        active.name = Set(name.trim().to_string());
    }
    if let Some(phone) = payload.phone {
        active.phone = Set(Some(phone));
    }
    if let Some(avatar) = payload.avatar {
        active.avatar = Set(Some(avatar));
    }
    active.updated_at = Set(Utc::now().into());

    let txn = state.orm.begin().await?;
    let user = active.update(&txn).await?;
    if let Some(old) = superseded {
        delete_managed(state.assets.as_ref(), &old, "Failed to delete old image").await?;
    }
    txn.commit().await?;

    Ok(ApiResponse::success(
        "Profile updated successfully",
        UserView::from(user),
    ))
}
