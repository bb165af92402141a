use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::{get, patch, put},
};
use serde_json::Value;

use crate::{
    dto::permissions::{
        CreatePermissionRequest, PermissionList, PermissionListQuery, UpdatePermissionRequest,
    },
    error::AppResult,
    extract::{ApiQuery, ValidJson},
    middleware::authz::{
        Authorized, CreatePermission, DeletePermission, UpdatePermission, ViewPermission,
    },
    models::PermissionView,
    response::{ApiResponse, MessageBody},
    services::permission_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_permissions).post(create_permission))
        .route("/{id}", put(update_permission).delete(delete_permission))
        .route("/{id}/restore", patch(restore_permission))
}

#[utoipa::path(
    get,
    path = "/api/permissions",
    params(PermissionListQuery),
    responses(
        (status = 200, description = "Permission catalogue", body = ApiResponse<PermissionList>)
    ),
    security(("bearer_auth" = [])),
    tag = "Permissions"
)]
pub async fn list_permissions(
    State(state): State<AppState>,
    _auth: Authorized<ViewPermission>,
    ApiQuery(query): ApiQuery<PermissionListQuery>,
) -> AppResult<Json<ApiResponse<PermissionList>>> {
    let resp = permission_service::list_permissions(&state, query).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/permissions",
    request_body = CreatePermissionRequest,
    responses(
        (status = 201, description = "Permission created", body = ApiResponse<PermissionView>),
        (status = 409, description = "Permission already exists", body = MessageBody)
    ),
    security(("bearer_auth" = [])),
    tag = "Permissions"
)]
pub async fn create_permission(
    State(state): State<AppState>,
    _auth: Authorized<CreatePermission>,
    ValidJson(payload): ValidJson<CreatePermissionRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<PermissionView>>)> {
    let resp = permission_service::create_permission(&state, payload).await?;
    Ok((StatusCode::CREATED, Json(resp)))
}

#[utoipa::path(
    put,
    path = "/api/permissions/{id}",
    params(("id" = i32, Path, description = "Permission ID")),
    request_body = UpdatePermissionRequest,
    responses(
        (status = 202, description = "Permission updated", body = ApiResponse<PermissionView>)
    ),
    security(("bearer_auth" = [])),
    tag = "Permissions"
)]
pub async fn update_permission(
    State(state): State<AppState>,
    _auth: Authorized<UpdatePermission>,
    Path(id): Path<i32>,
    ValidJson(payload): ValidJson<UpdatePermissionRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<PermissionView>>)> {
    let resp = permission_service::update_permission(&state, id, payload).await?;
    Ok((StatusCode::ACCEPTED, Json(resp)))
}

#[utoipa::path(
    delete,
    path = "/api/permissions/{id}",
    params(("id" = i32, Path, description = "Permission ID")),
    responses(
        (status = 200, description = "Permission soft-deleted", body = MessageBody)
    ),
    security(("bearer_auth" = [])),
    tag = "Permissions"
)]
pub async fn delete_permission(
    State(state): State<AppState>,
    _auth: Authorized<DeletePermission>,
    Path(id): Path<i32>,
) -> AppResult<Json<ApiResponse<Value>>> {
    let resp = permission_service::delete_permission(&state, id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    patch,
    path = "/api/permissions/{id}/restore",
    params(("id" = i32, Path, description = "Permission ID")),
    responses(
        (status = 202, description = "Permission restored", body = ApiResponse<PermissionView>),
        (status = 404, description = "Deleted permission not found", body = MessageBody)
    ),
    security(("bearer_auth" = [])),
    tag = "Permissions"
)]
pub async fn restore_permission(
    State(state): State<AppState>,
    _auth: Authorized<UpdatePermission>,
    Path(id): Path<i32>,
) -> AppResult<(StatusCode, Json<ApiResponse<PermissionView>>)> {
    let resp = permission_service::restore_permission(&state, id).await?;
    Ok((StatusCode::ACCEPTED, Json(resp)))
}
