use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::{get, patch, post},
};
use serde_json::Value;
use uuid::Uuid;

use crate::{
    dto::heroes::{
        CreateHeroRequest, HeroList, HeroListQuery, ReorderHeroesRequest, ReorderResult,
        UpdateHeroOrderRequest, UpdateHeroRequest,
    },
    error::AppResult,
    extract::{ApiQuery, ValidJson},
    middleware::authz::{Authorized, ManageHeroes},
    models::HeroView,
    response::{ApiResponse, MessageBody},
    services::hero_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_heroes).post(create_hero))
        .route("/active", get(active_heroes))
        .route("/reorder", post(reorder_heroes))
        .route(
            "/{id}",
            get(get_hero).put(update_hero).delete(delete_hero),
        )
        .route("/{id}/order", patch(update_hero_order))
        .route("/{id}/toggle-status", patch(toggle_hero_status))
}

#[utoipa::path(
    post,
    path = "/api/heroes",
    request_body = CreateHeroRequest,
    responses(
        (status = 201, description = "Hero slide created", body = ApiResponse<HeroView>),
        (status = 400, description = "Missing title or image", body = MessageBody)
    ),
    security(("bearer_auth" = [])),
    tag = "Heroes"
)]
pub async fn create_hero(
    State(state): State<AppState>,
    auth: Authorized<ManageHeroes>,
    ValidJson(payload): ValidJson<CreateHeroRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<HeroView>>)> {
    let resp = hero_service::create_hero(&state, auth.user(), payload).await?;
    Ok((StatusCode::CREATED, Json(resp)))
}

#[utoipa::path(
    get,
    path = "/api/heroes",
    params(HeroListQuery),
    responses(
        (status = 200, description = "All hero slides", body = ApiResponse<HeroList>)
    ),
    security(("bearer_auth" = [])),
    tag = "Heroes"
)]
pub async fn list_heroes(
    State(state): State<AppState>,
    _auth: Authorized<ManageHeroes>,
    ApiQuery(query): ApiQuery<HeroListQuery>,
) -> AppResult<Json<ApiResponse<HeroList>>> {
    let resp = hero_service::list_heroes(&state, query).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/heroes/active",
    responses(
        (status = 200, description = "Active slides in display order", body = ApiResponse<Vec<HeroView>>)
    ),
    tag = "Heroes"
)]
pub async fn active_heroes(
    State(state): State<AppState>,
) -> AppResult<Json<ApiResponse<Vec<HeroView>>>> {
    let resp = hero_service::list_active_heroes(&state).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/heroes/{id}",
    params(("id" = Uuid, Path, description = "Hero slide ID")),
    responses(
        (status = 200, description = "Hero slide", body = ApiResponse<HeroView>),
        (status = 404, description = "Hero slide not found", body = MessageBody)
    ),
    tag = "Heroes"
)]
pub async fn get_hero(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<HeroView>>> {
    let resp = hero_service::get_hero(&state, id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    put,
    path = "/api/heroes/{id}",
    params(("id" = Uuid, Path, description = "Hero slide ID")),
    request_body = UpdateHeroRequest,
    responses(
        (status = 202, description = "Hero slide updated", body = ApiResponse<HeroView>),
        (status = 404, description = "Hero slide not found", body = MessageBody)
    ),
    security(("bearer_auth" = [])),
    tag = "Heroes"
)]
pub async fn update_hero(
    State(state): State<AppState>,
    auth: Authorized<ManageHeroes>,
    Path(id): Path<Uuid>,
    ValidJson(payload): ValidJson<UpdateHeroRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<HeroView>>)> {
    let resp = hero_service::update_hero(&state, auth.user(), id, payload).await?;
    Ok((StatusCode::ACCEPTED, Json(resp)))
}

#[utoipa::path(
    patch,
    path = "/api/heroes/{id}/order",
    params(("id" = Uuid, Path, description = "Hero slide ID")),
    request_body = UpdateHeroOrderRequest,
    responses(
        (status = 202, description = "Display order changed", body = ApiResponse<HeroView>),
        (status = 400, description = "Invalid order value", body = MessageBody)
    ),
    security(("bearer_auth" = [])),
    tag = "Heroes"
)]
pub async fn update_hero_order(
    State(state): State<AppState>,
    _auth: Authorized<ManageHeroes>,
    Path(id): Path<Uuid>,
    ValidJson(payload): ValidJson<UpdateHeroOrderRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<HeroView>>)> {
    let resp = hero_service::update_hero_order(&state, id, payload).await?;
    Ok((StatusCode::ACCEPTED, Json(resp)))
}

#[utoipa::path(
    post,
    path = "/api/heroes/reorder",
    request_body = ReorderHeroesRequest,
    responses(
        (status = 202, description = "Slides reordered; failures listed", body = ApiResponse<ReorderResult>),
        (status = 400, description = "Order array is required", body = MessageBody)
    ),
    security(("bearer_auth" = [])),
    tag = "Heroes"
)]
pub async fn reorder_heroes(
    State(state): State<AppState>,
    auth: Authorized<ManageHeroes>,
    ValidJson(payload): ValidJson<ReorderHeroesRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<ReorderResult>>)> {
    let resp = hero_service::reorder_heroes(&state, auth.user(), payload).await?;
    Ok((StatusCode::ACCEPTED, Json(resp)))
}

#[utoipa::path(
    patch,
    path = "/api/heroes/{id}/toggle-status",
    params(("id" = Uuid, Path, description = "Hero slide ID")),
    responses(
        (status = 202, description = "Status flipped", body = ApiResponse<HeroView>)
    ),
    security(("bearer_auth" = [])),
    tag = "Heroes"
)]
pub async fn toggle_hero_status(
    State(state): State<AppState>,
    _auth: Authorized<ManageHeroes>,
    Path(id): Path<Uuid>,
) -> AppResult<(StatusCode, Json<ApiResponse<HeroView>>)> {
    let resp = hero_service::toggle_hero_status(&state, id).await?;
    Ok((StatusCode::ACCEPTED, Json(resp)))
}

#[utoipa::path(
    delete,
    path = "/api/heroes/{id}",
    params(("id" = Uuid, Path, description = "Hero slide ID")),
    responses(
        (status = 200, description = "Hero slide deleted", body = MessageBody),
        (status = 404, description = "Hero slide not found", body = MessageBody)
    ),
    security(("bearer_auth" = [])),
    tag = "Heroes"
)]
pub async fn delete_hero(
    State(state): State<AppState>,
    auth: Authorized<ManageHeroes>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<Value>>> {
    let resp = hero_service::delete_hero(&state, auth.user(), id).await?;
    Ok(Json(resp))
}
