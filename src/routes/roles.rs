use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::get,
};
use serde_json::Value;
use uuid::Uuid;

use crate::{
    dto::roles::{CreateRoleRequest, RoleList, RoleListQuery, UpdateRoleRequest},
    error::AppResult,
    extract::{ApiQuery, ValidJson},
    middleware::authz::{Authorized, CreateRole, DeleteRole, UpdateRole, ViewRole},
    models::RoleView,
    response::{ApiResponse, MessageBody},
    services::role_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_roles).post(create_role))
        .route("/{id}", get(get_role).put(update_role).delete(delete_role))
}

#[utoipa::path(
    post,
    path = "/api/roles",
    request_body = CreateRoleRequest,
    responses(
        (status = 201, description = "Role created", body = ApiResponse<RoleView>),
        (status = 409, description = "Name already exists", body = MessageBody)
    ),
    security(("bearer_auth" = [])),
    tag = "Roles"
)]
pub async fn create_role(
    State(state): State<AppState>,
    _auth: Authorized<CreateRole>,
    ValidJson(payload): ValidJson<CreateRoleRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<RoleView>>)> {
    let resp = role_service::create_role(&state, payload).await?;
    Ok((StatusCode::CREATED, Json(resp)))
}

#[utoipa::path(
    get,
    path = "/api/roles",
    params(RoleListQuery),
    responses(
        (status = 200, description = "Roles page", body = ApiResponse<RoleList>)
    ),
    security(("bearer_auth" = [])),
    tag = "Roles"
)]
pub async fn list_roles(
    State(state): State<AppState>,
    _auth: Authorized<ViewRole>,
    ApiQuery(query): ApiQuery<RoleListQuery>,
) -> AppResult<Json<ApiResponse<RoleList>>> {
    let resp = role_service::list_roles(&state, query).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/roles/{id}",
    params(("id" = Uuid, Path, description = "Role ID")),
    responses(
        (status = 200, description = "Role", body = ApiResponse<RoleView>),
        (status = 404, description = "Role not found", body = MessageBody)
    ),
    security(("bearer_auth" = [])),
    tag = "Roles"
)]
pub async fn get_role(
    State(state): State<AppState>,
    _auth: Authorized<ViewRole>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<RoleView>>> {
    let resp = role_service::get_role(&state, id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    put,
    path = "/api/roles/{id}",
    params(("id" = Uuid, Path, description = "Role ID")),
    request_body = UpdateRoleRequest,
    responses(
        (status = 202, description = "Role updated", body = ApiResponse<RoleView>)
    ),
    security(("bearer_auth" = [])),
    tag = "Roles"
)]
pub async fn update_role(
    State(state): State<AppState>,
    _auth: Authorized<UpdateRole>,
    Path(id): Path<Uuid>,
    ValidJson(payload): ValidJson<UpdateRoleRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<RoleView>>)> {
    let resp = role_service::update_role(&state, id, payload).await?;
    Ok((StatusCode::ACCEPTED, Json(resp)))
}

#[utoipa::path(
    delete,
    path = "/api/roles/{id}",
    params(("id" = Uuid, Path, description = "Role ID")),
    responses(
        (status = 200, description = "Role deleted", body = MessageBody)
    ),
    security(("bearer_auth" = [])),
    tag = "Roles"
)]
pub async fn delete_role(
    State(state): State<AppState>,
    _auth: Authorized<DeleteRole>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<Value>>> {
    let resp = role_service::delete_role(&state, id).await?;
    Ok(Json(resp))
}
