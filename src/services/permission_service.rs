use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ActiveValue::NotSet, ColumnTrait, Condition, DatabaseConnection,
    EntityTrait, QueryFilter, QueryOrder, Set,
};

use crate::{
    dto::permissions::{
        CreatePermissionRequest, PermissionList, PermissionListQuery, UpdatePermissionRequest,
    },
    entity::{
        Permissions,
        permissions::{self, ActiveModel as PermissionActive, Column as PermCol, STATUS_ACTIVE},
    },
    error::{AppError, AppResult},
    models::{PermissionGrant, PermissionView},
    response::ApiResponse,
    state::AppState,
};

const STATUSES: &[&str] = &[STATUS_ACTIVE, "inactive"];

/// Permissions granted to a role score, lowest threshold first.
pub async fn grants_for_score(
    db: &DatabaseConnection,
    score: i32,
) -> AppResult<Vec<PermissionGrant>> {
    let grants = Permissions::find_effective()
        .filter(PermCol::RequiredScore.lte(score))
        .order_by_asc(PermCol::RequiredScore)
        .order_by_asc(PermCol::Id)
        .all(db)
        .await?
        .into_iter()
        .map(PermissionGrant::from)
        .collect();
    Ok(grants)
}

fn same_triple(module: &str, action: &str, resource: Option<&str>) -> Condition {
    let condition = Condition::all()
        .add(PermCol::Module.eq(module))
        .add(PermCol::Action.eq(action));
    match resource {
        Some(resource) => condition.add(PermCol::Resource.eq(resource)),
        None => condition.add(PermCol::Resource.is_null()),
    }
}

fn check_status(status: &str) -> AppResult<()> {
    if STATUSES.contains(&status) {
        Ok(())
    } else {
        Err(AppError::bad_request("Invalid permission status"))
    }
}

pub async fn list_permissions(
    state: &AppState,
    query: PermissionListQuery,
) -> AppResult<ApiResponse<PermissionList>> {
    let mut condition = Condition::all();
    if !query.include_deleted.unwrap_or(false) {
        condition = condition.add(PermCol::DeletedAt.is_null());
    }
    if let Some(module) = query.module.as_ref().filter(|m| !m.is_empty()) {
        condition = condition.add(PermCol::Module.eq(module.clone()));
    }

    let permissions = Permissions::find()
        .filter(condition)
        .order_by_asc(PermCol::Module)
        .order_by_asc(PermCol::RequiredScore)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(PermissionView::from)
        .collect();

    Ok(ApiResponse::spread(
        "Permissions fetched successfully",
        PermissionList { permissions },
    ))
}

pub async fn create_permission(
    state: &AppState,
    payload: CreatePermissionRequest,
) -> AppResult<ApiResponse<PermissionView>> {
    let module = payload.module.trim().to_string();
    let action = payload.action.trim().to_string();
    if module.is_empty() || action.is_empty() {
        return Err(AppError::bad_request("Module and action are required"));
    }
    let status = payload.status.unwrap_or_else(|| STATUS_ACTIVE.to_string());
    check_status(&status)?;

    let exists = Permissions::find()
        .filter(same_triple(&module, &action, payload.resource.as_deref()))
        .one(&state.orm)
        .await?;
    if exists.is_some() {
        return Err(AppError::Conflict("Permission already exists".into()));
    }

    let permission = PermissionActive {
        id: NotSet,
        module: Set(module),
        action: Set(action),
        resource: Set(payload.resource),
        required_score: Set(payload.required_score),
        description: Set(payload.description),
        status: Set(status),
        created_at: NotSet,
        updated_at: NotSet,
        deleted_at: Set(None),
    }
    .insert(&state.orm)
    .await?;

    tracing::info!(action = %permission.action, score = permission.required_score, "permission created");
    Ok(ApiResponse::success(
        "Permission created successfully",
        PermissionView::from(permission),
    ))
}

async fn find_live(state: &AppState, id: i32) -> AppResult<permissions::Model> {
    let permission = Permissions::find_by_id(id)
        .filter(PermCol::DeletedAt.is_null())
        .one(&state.orm)
        .await?;
    match permission {
        Some(p) => Ok(p),
        None => Err(AppError::not_found("Permission not found")),
    }
}

pub async fn update_permission(
    state: &AppState,
    id: i32,
    payload: UpdatePermissionRequest,
) -> AppResult<ApiResponse<PermissionView>> {
    let current = find_live(state, id).await?;

    if let Some(status) = payload.status.as_deref() {
        check_status(status)?;
    }

    let module = payload.module.clone().unwrap_or_else(|| current.module.clone());
    let action = payload.action.clone().unwrap_or_else(|| current.action.clone());
    let resource = payload.resource.clone().or_else(|| current.resource.clone());
    if module != current.module || action != current.action || resource != current.resource {
        let clash = Permissions::find()
            .filter(same_triple(&module, &action, resource.as_deref()))
            .filter(PermCol::Id.ne(id))
            .one(&state.orm)
            .await?;
        if clash.is_some() {
            return Err(AppError::Conflict("Permission already exists".into()));
        }
    }

    let mut active: PermissionActive = current.into();
    active.module = Set(module);
    active.action = Set(action);
    active.resource = Set(resource);
    if let Some(score) = payload.required_score {
        active.required_score = Set(score);
    }
    if let Some(description) = payload.description {
        active.description = Set(Some(description));
    }
    if let Some(status) = payload.status {
        active.status = Set(status);
    }
    active.updated_at = Set(Utc::now().into());
    let permission = active.update(&state.orm).await?;

    Ok(ApiResponse::success(
        "Permission updated successfully",
        PermissionView::from(permission),
    ))
}

pub async fn delete_permission(state: &AppState, id: i32) -> AppResult<ApiResponse<serde_json::Value>> {
    let current = find_live(state, id).await?;

    let mut active: PermissionActive = current.into();
    active.deleted_at = Set(Some(Utc::now().into()));
    active.update(&state.orm).await?;

    Ok(ApiResponse::message("Permission deleted successfully"))
}

pub async fn restore_permission(
    state: &AppState,
    id: i32,
) -> AppResult<ApiResponse<PermissionView>> {
    let deleted = Permissions::find_by_id(id)
        .filter(PermCol::DeletedAt.is_not_null())
        .one(&state.orm)
        .await?;
    let deleted = match deleted {
        Some(p) => p,
        None => return Err(AppError::not_found("Deleted permission not found")),
    };

    let mut active: PermissionActive = deleted.into();
    active.deleted_at = Set(None);
    active.updated_at = Set(Utc::now().into());
    let permission = active.update(&state.orm).await?;

    Ok(ApiResponse::success(
        "Permission restored successfully",
        PermissionView::from(permission),
    ))
}
