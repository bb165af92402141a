use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ActiveValue::NotSet, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, Set,
};
use uuid::Uuid;

use crate::{
    dto::roles::{CreateRoleRequest, RoleList, RoleListQuery, UpdateRoleRequest},
    entity::{
        Roles,
        roles::{self, ActiveModel as RoleActive, Column as RoleCol},
    },
    error::{AppError, AppResult},
    models::RoleView,
    response::ApiResponse,
    routes::params::Pagination,
    state::AppState,
};

async fn name_taken(state: &AppState, name: &str, except: Option<Uuid>) -> AppResult<bool> {
    let mut finder = Roles::find().filter(RoleCol::Name.eq(name));
    if let Some(id) = except {
        finder = finder.filter(RoleCol::Id.ne(id));
    }
    Ok(finder.one(&state.orm).await?.is_some())
}

async fn find_role(state: &AppState, id: Uuid) -> AppResult<roles::Model> {
    match Roles::find_live().filter(RoleCol::Id.eq(id)).one(&state.orm).await? {
        Some(role) => Ok(role),
        None => Err(AppError::not_found("Role not found")),
    }
}

pub async fn create_role(
    state: &AppState,
    payload: CreateRoleRequest,
) -> AppResult<ApiResponse<RoleView>> {
    let name = payload.name.trim().to_string();
    if name.is_empty() {
        return Err(AppError::bad_request("Role name is required"));
    }
    if name_taken(state, &name, None).await? {
        return Err(AppError::Conflict("Name already exists".into()));
    }

    let role = RoleActive {
        id: Set(Uuid::new_v4()),
        name: Set(name),
        score: Set(payload.score),
        description: Set(payload.description),
        is_active: Set(payload.is_active.unwrap_or(true)),
        created_at: NotSet,
        updated_at: NotSet,
        deleted_at: Set(None),
    }
    .insert(&state.orm)
    .await?;

    tracing::info!(role = %role.name, score = role.score, "role created");
    Ok(ApiResponse::success("Role created successfully", RoleView::from(role)))
}

pub async fn list_roles(
    state: &AppState,
    query: RoleListQuery,
) -> AppResult<ApiResponse<RoleList>> {
    let pagination = Pagination::new(query.page, query.limit);
    let finder = Roles::find_live().order_by_desc(RoleCol::CreatedAt);

    let total = finder.clone().count(&state.orm).await?;
    let roles = finder
        .limit(pagination.limit)
        .offset(pagination.offset())
        .all(&state.orm)
        .await?
        .into_iter()
        .map(RoleView::from)
        .collect();

    Ok(ApiResponse::paginated(
        "Roles fetched successfully",
        RoleList { roles },
        pagination.meta(total),
    ))
}

pub async fn get_role(state: &AppState, id: Uuid) -> AppResult<ApiResponse<RoleView>> {
    let role = find_role(state, id).await?;
    Ok(ApiResponse::success("Role fetched successfully", RoleView::from(role)))
}

pub async fn update_role(
    state: &AppState,
    id: Uuid,
    payload: UpdateRoleRequest,
) -> AppResult<ApiResponse<RoleView>> {
    let role = find_role(state, id).await?;

    let mut active: RoleActive = role.clone().into();
    if let Some(name) = payload.name.map(|n| n.trim().to_string()) {
        if name.is_empty() {
            return Err(AppError::bad_request("Role name is required"));
        }
        if name != role.name && name_taken(state, &name, Some(id)).await? {
            return Err(AppError::Conflict("Name already exists".into()));
        }
        active.name = Set(name);
    }
    if let Some(score) = payload.score {
        active.score = Set(score);
    }
    if let Some(description) = payload.description {
        active.description = Set(Some(description));
    }
    if let Some(is_active) = payload.is_active {
        active.is_active = Set(is_active);
    }
    active.updated_at = Set(Utc::now().into());
    let role = active.update(&state.orm).await?;

    Ok(ApiResponse::success("Role updated successfully", RoleView::from(role)))
}

pub async fn delete_role(state: &AppState, id: Uuid) -> AppResult<ApiResponse<serde_json::Value>> {
    let role = find_role(state, id).await?;

    let mut active: RoleActive = role.into();
    active.deleted_at = Set(Some(Utc::now().into()));
    active.update(&state.orm).await?;

    tracing::info!(role = %id, "role soft-deleted");
    Ok(ApiResponse::message("Role deleted successfully"))
}
