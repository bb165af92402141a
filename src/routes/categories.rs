use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::get,
};
use serde_json::Value;
use uuid::Uuid;

use crate::{
    dto::categories::{CategoryList, CategoryListQuery, CreateCategoryRequest, UpdateCategoryRequest},
    error::AppResult,
    extract::{ApiQuery, ValidJson},
    middleware::authz::{Authorized, ManageCategories},
    models::CategoryView,
    response::{ApiResponse, MessageBody},
    services::category_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_categories).post(create_category))
        .route(
            "/{id}",
            get(get_category).put(update_category).delete(delete_category),
        )
}

#[utoipa::path(
    post,
    path = "/api/categories",
    request_body = CreateCategoryRequest,
    responses(
        (status = 201, description = "Category created", body = ApiResponse<CategoryView>),
        (status = 409, description = "Category already exists", body = MessageBody)
    ),
    security(("bearer_auth" = [])),
    tag = "Categories"
)]
pub async fn create_category(
    State(state): State<AppState>,
    auth: Authorized<ManageCategories>,
    ValidJson(payload): ValidJson<CreateCategoryRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<CategoryView>>)> {
    let resp = category_service::create_category(&state, auth.user(), payload).await?;
    Ok((StatusCode::CREATED, Json(resp)))
}

#[utoipa::path(
    get,
    path = "/api/categories",
    params(CategoryListQuery),
    responses(
        (status = 200, description = "Categories page", body = ApiResponse<CategoryList>)
    ),
    tag = "Categories"
)]
pub async fn list_categories(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<CategoryListQuery>,
) -> AppResult<Json<ApiResponse<CategoryList>>> {
    let resp = category_service::list_categories(&state, query).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/categories/{id}",
    params(("id" = Uuid, Path, description = "Category ID")),
    responses(
        (status = 200, description = "Category with its products", body = ApiResponse<CategoryView>),
        (status = 404, description = "Category not found", body = MessageBody)
    ),
    tag = "Categories"
)]
pub async fn get_category(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<CategoryView>>> {
    let resp = category_service::get_category(&state, id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    put,
    path = "/api/categories/{id}",
    params(("id" = Uuid, Path, description = "Category ID")),
    request_body = UpdateCategoryRequest,
    responses(
        (status = 202, description = "Category updated", body = ApiResponse<CategoryView>),
        (status = 409, description = "Category name already exists", body = MessageBody)
    ),
    security(("bearer_auth" = [])),
    tag = "Categories"
)]
pub async fn update_category(
    State(state): State<AppState>,
    auth: Authorized<ManageCategories>,
    Path(id): Path<Uuid>,
    ValidJson(payload): ValidJson<UpdateCategoryRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<CategoryView>>)> {
    let resp = category_service::update_category(&state, auth.user(), id, payload).await?;
    Ok((StatusCode::ACCEPTED, Json(resp)))
}

#[utoipa::path(
    delete,
    path = "/api/categories/{id}",
    params(("id" = Uuid, Path, description = "Category ID")),
    responses(
        (status = 200, description = "Category deleted", body = MessageBody),
        (status = 400, description = "Category still has products", body = MessageBody)
    ),
    security(("bearer_auth" = [])),
    tag = "Categories"
)]
pub async fn delete_category(
    State(state): State<AppState>,
    auth: Authorized<ManageCategories>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<Value>>> {
    let resp = category_service::delete_category(&state, auth.user(), id).await?;
    Ok(Json(resp))
}
