use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::{get, patch},
};
use serde_json::Value;
use uuid::Uuid;

use crate::{
    dto::products::{
        CreateProductRequest, ProductList, ProductListQuery, ShowcaseQuery, UpdateProductRequest,
        UpdateStockRequest,
    },
    error::AppResult,
    extract::{ApiQuery, ValidJson},
    middleware::authz::{Authorized, ManageProducts},
    models::ProductView,
    response::{ApiResponse, MessageBody},
    services::product_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_products).post(create_product))
        .route("/best-sellers", get(best_sellers))
        .route("/new-arrivals", get(new_arrivals))
        .route(
            "/{id}",
            get(get_product).put(update_product).delete(delete_product),
        )
        .route("/{id}/stock", patch(update_stock))
}

#[utoipa::path(
    post,
    path = "/api/products",
    request_body = CreateProductRequest,
    responses(
        (status = 201, description = "Product created", body = ApiResponse<ProductView>),
        (status = 404, description = "Category not found", body = MessageBody)
    ),
    security(("bearer_auth" = [])),
    tag = "Products"
)]
pub async fn create_product(
    State(state): State<AppState>,
    auth: Authorized<ManageProducts>,
    ValidJson(payload): ValidJson<CreateProductRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<ProductView>>)> {
    let resp = product_service::create_product(&state, auth.user(), payload).await?;
    Ok((StatusCode::CREATED, Json(resp)))
}

#[utoipa::path(
    get,
    path = "/api/products",
    params(ProductListQuery),
    responses(
        (status = 200, description = "Products page", body = ApiResponse<ProductList>)
    ),
    tag = "Products"
)]
pub async fn list_products(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<ProductListQuery>,
) -> AppResult<Json<ApiResponse<ProductList>>> {
    let resp = product_service::list_products(&state, query).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/products/best-sellers",
    params(ShowcaseQuery),
    responses(
        (status = 200, description = "Most ordered active products", body = ApiResponse<ProductList>)
    ),
    tag = "Products"
)]
pub async fn best_sellers(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<ShowcaseQuery>,
) -> AppResult<Json<ApiResponse<ProductList>>> {
    let resp = product_service::best_sellers(&state, query).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/products/new-arrivals",
    params(ShowcaseQuery),
    responses(
        (status = 200, description = "Latest active products", body = ApiResponse<ProductList>)
    ),
    tag = "Products"
)]
pub async fn new_arrivals(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<ShowcaseQuery>,
) -> AppResult<Json<ApiResponse<ProductList>>> {
    let resp = product_service::new_arrivals(&state, query).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/products/{id}",
    params(("id" = Uuid, Path, description = "Product ID")),
    responses(
        (status = 200, description = "Product", body = ApiResponse<ProductView>),
        (status = 404, description = "Product not found", body = MessageBody)
    ),
    tag = "Products"
)]
pub async fn get_product(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<ProductView>>> {
    let resp = product_service::get_product(&state, id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    put,
    path = "/api/products/{id}",
    params(("id" = Uuid, Path, description = "Product ID")),
    request_body = UpdateProductRequest,
    responses(
        (status = 202, description = "Product updated", body = ApiResponse<ProductView>),
        (status = 400, description = "Failed to delete old image", body = MessageBody)
    ),
    security(("bearer_auth" = [])),
    tag = "Products"
)]
pub async fn update_product(
    State(state): State<AppState>,
    auth: Authorized<ManageProducts>,
    Path(id): Path<Uuid>,
    ValidJson(payload): ValidJson<UpdateProductRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<ProductView>>)> {
    let resp = product_service::update_product(&state, auth.user(), id, payload).await?;
    Ok((StatusCode::ACCEPTED, Json(resp)))
}

#[utoipa::path(
    delete,
    path = "/api/products/{id}",
    params(("id" = Uuid, Path, description = "Product ID")),
    responses(
        (status = 200, description = "Product deleted", body = MessageBody),
        (status = 400, description = "Product has orders", body = MessageBody)
    ),
    security(("bearer_auth" = [])),
    tag = "Products"
)]
pub async fn delete_product(
    State(state): State<AppState>,
    auth: Authorized<ManageProducts>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<Value>>> {
    let resp = product_service::delete_product(&state, auth.user(), id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    patch,
    path = "/api/products/{id}/stock",
    params(("id" = Uuid, Path, description = "Product ID")),
    request_body = UpdateStockRequest,
    responses(
        (status = 202, description = "Stock updated", body = ApiResponse<ProductView>),
        (status = 400, description = "Insufficient stock or invalid operation", body = MessageBody)
    ),
    security(("bearer_auth" = [])),
    tag = "Products"
)]
pub async fn update_stock(
    State(state): State<AppState>,
    auth: Authorized<ManageProducts>,
    Path(id): Path<Uuid>,
    ValidJson(payload): ValidJson<UpdateStockRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<ProductView>>)> {
    let resp = product_service::update_stock(&state, auth.user(), id, payload).await?;
    Ok((StatusCode::ACCEPTED, Json(resp)))
}
