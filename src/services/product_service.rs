use std::collections::HashMap;

use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ActiveValue::NotSet, ColumnTrait, Condition, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait, sea_query::LockType,
};
use serde_json::json;
use uuid::Uuid;

use crate::{
    audit,
    dto::products::{
        CreateProductRequest, MAX_IMAGES, ProductList, ProductListQuery, ProductSortBy,
        ShowcaseQuery, StockOperation, UpdateProductRequest, UpdateStockRequest,
    },
    entity::{
        categories::{self, Entity as Categories},
        order_items::{Column as OrderItemCol, Entity as OrderItems},
        products::{
            self, ActiveModel as ProductActive, Column as ProdCol, Entity as Products,
            ProductStatus,
        },
    },
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::ProductView,
    providers::storage::{delete_managed, delete_managed_quietly},
    response::ApiResponse,
    routes::params::Pagination,
    services::contains_ci,
    state::AppState,
};

const SHOWCASE_LIMIT: u64 = 8;
const MAX_SHOWCASE_LIMIT: u64 = 50;

fn sort_column(sort_by: Option<ProductSortBy>) -> ProdCol {
    match sort_by.unwrap_or(ProductSortBy::CreatedAt) {
        ProductSortBy::Name => ProdCol::Name,
        ProductSortBy::Price => ProdCol::Price,
        ProductSortBy::Stock => ProdCol::Stock,
        ProductSortBy::Rating => ProdCol::Rating,
        ProductSortBy::CreatedAt => ProdCol::CreatedAt,
        ProductSortBy::UpdatedAt => ProdCol::UpdatedAt,
    }
}

fn check_images(images: &[String]) -> AppResult<()> {
    if images.len() > MAX_IMAGES {
        return Err(AppError::bad_request(format!(
            "A product can have at most {} images",
            MAX_IMAGES
        )));
    }
    Ok(())
}

fn check_price(price: Decimal) -> AppResult<()> {
    if price.is_sign_negative() {
        return Err(AppError::bad_request("Price cannot be negative"));
    }
    Ok(())
}

fn check_rating(rating: Decimal) -> AppResult<()> {
    if rating < Decimal::ZERO || rating > Decimal::from(5) {
        return Err(AppError::bad_request("Rating must be between 0 and 5"));
    }
    Ok(())
}

fn check_reviews(reviews: i32) -> AppResult<()> {
    if reviews < 0 {
        return Err(AppError::bad_request("Reviews cannot be negative"));
    }
    Ok(())
}

fn check_stock(stock: i32) -> AppResult<()> {
    if stock < 0 {
        return Err(AppError::bad_request("Stock cannot be negative"));
    }
    Ok(())
}

async fn find_category(state: &AppState, id: Uuid) -> AppResult<categories::Model> {
    Categories::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or_else(|| AppError::not_found("Category not found"))
}

async fn find_with_category(state: &AppState, id: Uuid) -> AppResult<ProductView> {
    match Products::find_by_id(id)
        .find_also_related(Categories)
        .one(&state.orm)
        .await?
    {
        Some((product, category)) => Ok(ProductView::with_category(product, category)),
        None => Err(AppError::not_found("Product not found")),
    }
}

pub async fn create_product(
    state: &AppState,
    user: &AuthUser,
    payload: CreateProductRequest,
) -> AppResult<ApiResponse<ProductView>> {
    let name = payload.name.trim().to_string();
    let (Some(price), Some(category_id)) = (payload.price, payload.category_id) else {
        return Err(AppError::bad_request(
            "Product name, price, and category are required",
        ));
    };
    if name.is_empty() {
        return Err(AppError::bad_request(
            "Product name, price, and category are required",
        ));
    }
    check_price(price)?;
    check_images(&payload.images)?;
    let stock = payload.stock.unwrap_or(0);
    check_stock(stock)?;

    let category = find_category(state, category_id).await?;
    let status = ProductStatus::for_stock(stock, payload.status.unwrap_or(ProductStatus::Active));

    let product = ProductActive {
        id: Set(Uuid::new_v4()),
        name: Set(name),
        description: Set(payload.description),
        price: Set(price),
        images: Set(payload.images),
        category_id: Set(category.id),
        stock: Set(stock),
        rating: Set(Decimal::ZERO),
        reviews: Set(0),
        status: Set(status),
        created_at: NotSet,
        updated_at: NotSet,
    }
    .insert(&state.orm)
    .await?;

    audit::record(
        &state.pool,
        Some(user.user_id),
        "product_create",
        "products",
        json!({ "product_id": product.id }),
    )
    .await;

    Ok(ApiResponse::success(
        "Product created successfully",
        ProductView::with_category(product, Some(category)),
    ))
}

pub async fn list_products(
    state: &AppState,
    query: ProductListQuery,
) -> AppResult<ApiResponse<ProductList>> {
    let pagination = Pagination::new(query.page, query.limit);

    let mut condition = Condition::all();
    if let Some(search) = query.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        condition = condition.add(
            Condition::any()
                .add(contains_ci(Products, ProdCol::Name, search))
                .add(contains_ci(Products, ProdCol::Description, search)),
        );
    }
    if let Some(category_id) = query.category_id {
        condition = condition.add(ProdCol::CategoryId.eq(category_id));
    }
    if let Some(min) = query.min_price {
        condition = condition.add(ProdCol::Price.gte(min));
    }
    if let Some(max) = query.max_price {
        condition = condition.add(ProdCol::Price.lte(max));
    }
    if let Some(status) = query.status {
        condition = condition.add(ProdCol::Status.eq(status));
    }

    let total = Products::find()
        .filter(condition.clone())
        .count(&state.orm)
        .await?;

    let products = Products::find()
        .filter(condition)
        .find_also_related(Categories)
        .order_by(
            sort_column(query.sort_by),
            query.sort_order.unwrap_or_default().into(),
        )
        .limit(pagination.limit)
        .offset(pagination.offset())
        .all(&state.orm)
        .await?
        .into_iter()
        .map(|(product, category)| ProductView::with_category(product, category))
        .collect();

    Ok(ApiResponse::paginated(
        "Products fetched successfully",
        ProductList { products },
        pagination.meta(total),
    ))
}

pub async fn get_product(state: &AppState, id: Uuid) -> AppResult<ApiResponse<ProductView>> {
    let product = find_with_category(state, id).await?;
    Ok(ApiResponse::success("Product fetched successfully", product))
}

pub async fn update_product(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: UpdateProductRequest,
) -> AppResult<ApiResponse<ProductView>> {
    let product = Products::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or_else(|| AppError::not_found("Product not found"))?;

    if let Some(name) = &payload.name {
        if name.trim().is_empty() {
            return Err(AppError::bad_request("Product name cannot be empty"));
        }
    }
    if let Some(price) = payload.price {
        check_price(price)?;
    }
    if let Some(stock) = payload.stock {
        check_stock(stock)?;
    }
    if let Some(rating) = payload.rating {
        check_rating(rating)?;
    }
    if let Some(reviews) = payload.reviews {
        check_reviews(reviews)?;
    }
    if let Some(images) = &payload.images {
        check_images(images)?;
    }
    if let Some(category_id) = payload.category_id {
        find_category(state, category_id).await?;
    }

    let superseded: Vec<String> = match &payload.images {
        Some(images) => product
            .images
            .iter()
            .filter(|old| !images.contains(old))
            .cloned()
            .collect(),
        None => Vec::new(),
    };
    let stock = payload.stock.unwrap_or(product.stock);
    let status = ProductStatus::for_stock(stock, payload.status.unwrap_or(product.status));

    let mut active: ProductActive = product.into();
    if let Some(name) = payload.name {
        active.name = Set(name.trim().to_string());
    }
    if let Some(description) = payload.description {
        active.description = Set(Some(description));
    }
    if let Some(price) = payload.price {
        active.price = Set(price);
    }
    if let Some(images) = payload.images {
        active.images = Set(images);
    }
    if let Some(category_id) = payload.category_id {
        active.category_id = Set(category_id);
    }
    if let Some(rating) = payload.rating {
        active.rating = Set(rating);
    }
    if let Some(reviews) = payload.reviews {
        active.reviews = Set(reviews);
    }
    active.stock = Set(stock);
    active.status = Set(status);
    active.updated_at = Set(Utc::now().into());

    // Old images go only once the row is written; the write is kept
    // uncommitted until every deletion succeeded.
    let txn = state.orm.begin().await?;
    active.update(&txn).await?;
    for old in &superseded {
        delete_managed(state.assets.as_ref(), old, "Failed to delete old image").await?;
    }
    txn.commit().await?;

    audit::record(
        &state.pool,
        Some(user.user_id),
        "product_update",
        "products",
        json!({ "product_id": id }),
    )
    .await;

    let product = find_with_category(state, id).await?;
    Ok(ApiResponse::success("Product updated successfully", product))
}

pub async fn delete_product(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<serde_json::Value>> {
    let product = Products::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or_else(|| AppError::not_found("Product not found"))?;

    let ordered = OrderItems::find()
        .filter(OrderItemCol::ProductId.eq(id))
        .count(&state.orm)
        .await?;
    if ordered > 0 {
        return Err(AppError::bad_request(
            "Cannot delete product with existing orders. Consider marking as inactive instead.",
        ));
    }

    for image in &product.images {
        delete_managed_quietly(state.assets.as_ref(), image).await;
    }
    Products::delete_by_id(id).exec(&state.orm).await?;

    audit::record(
        &state.pool,
        Some(user.user_id),
        "product_delete",
        "products",
        json!({ "product_id": id, "name": product.name }),
    )
    .await;

    Ok(ApiResponse::message("Product deleted successfully"))
}

pub async fn update_stock(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: UpdateStockRequest,
) -> AppResult<ApiResponse<ProductView>> {
    if payload.quantity <= 0 {
        return Err(AppError::bad_request("Quantity must be a positive number"));
    }
    let operation = StockOperation::parse(payload.operation.as_deref())
        .ok_or_else(|| AppError::bad_request("Invalid operation"))?;

    let txn = state.orm.begin().await?;

    let product = Products::find_by_id(id)
        .lock(LockType::Update)
        .one(&txn)
        .await?
        .ok_or_else(|| AppError::not_found("Product not found"))?;

    let stock = operation
        .apply(product.stock, payload.quantity)
        .ok_or_else(|| AppError::bad_request("Insufficient stock"))?;
    let status = ProductStatus::for_stock(stock, product.status);

    let mut active: ProductActive = product.into();
    active.stock = Set(stock);
    active.status = Set(status);
    active.updated_at = Set(Utc::now().into());
    active.update(&txn).await?;

    txn.commit().await?;

    audit::record(
        &state.pool,
        Some(user.user_id),
        "product_stock_update",
        "products",
        json!({ "product_id": id, "quantity": payload.quantity, "stock": stock }),
    )
    .await;

    let product = find_with_category(state, id).await?;
    Ok(ApiResponse::success("Stock updated successfully", product))
}

/// Active products ranked by units sold on orders that were not cancelled.
pub async fn best_sellers(
    state: &AppState,
    query: ShowcaseQuery,
) -> AppResult<ApiResponse<ProductList>> {
    let limit = query.limit.unwrap_or(SHOWCASE_LIMIT).clamp(1, MAX_SHOWCASE_LIMIT);

    let ranked: Vec<(Uuid, i64)> = sqlx::query_as(
        r#"
        SELECT p.id, SUM(oi.quantity)::BIGINT AS sold
        FROM products p
        JOIN order_items oi ON oi.product_id = p.id
        JOIN orders o ON o.id = oi.order_id
        WHERE o.status <> 'CANCELLED' AND p.status = 'active'
        GROUP BY p.id
        ORDER BY sold DESC, p.id
        LIMIT $1
        "#,
    )
    .bind(limit as i64)
    .fetch_all(&state.pool)
    .await?;

    let rank: HashMap<Uuid, usize> = ranked
        .iter()
        .enumerate()
        .map(|(position, (id, _))| (*id, position))
        .collect();

    let mut rows: Vec<(products::Model, Option<categories::Model>)> = Products::find()
        .filter(ProdCol::Id.is_in(rank.keys().copied()))
        .find_also_related(Categories)
        .all(&state.orm)
        .await?;
    rows.sort_by_key(|(product, _)| rank.get(&product.id).copied().unwrap_or(usize::MAX));

    let products = rows
        .into_iter()
        .map(|(product, category)| ProductView::with_category(product, category))
        .collect();
    Ok(ApiResponse::spread(
        "Best sellers fetched successfully",
        ProductList { products },
    ))
}

pub async fn new_arrivals(
    state: &AppState,
    query: ShowcaseQuery,
) -> AppResult<ApiResponse<ProductList>> {
    let limit = query.limit.unwrap_or(SHOWCASE_LIMIT).clamp(1, MAX_SHOWCASE_LIMIT);

    let products = Products::find()
        .filter(ProdCol::Status.eq(ProductStatus::Active))
        .find_also_related(Categories)
        .order_by_desc(ProdCol::CreatedAt)
        .limit(limit)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(|(product, category)| ProductView::with_category(product, category))
        .collect();

    Ok(ApiResponse::spread(
        "New arrivals fetched successfully",
        ProductList { products },
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rating_outside_zero_to_five_is_a_bad_request() {
        for rating in [Decimal::new(7, 0), Decimal::new(-1, 0), Decimal::new(501, 2)] {
            match check_rating(rating) {
                Err(AppError::BadRequest(message)) => {
                    assert_eq!(message, "Rating must be between 0 and 5")
                }
                other => panic!("rating {rating} should be rejected, got {other:?}"),
            }
        }
        assert!(check_rating(Decimal::ZERO).is_ok());
        assert!(check_rating(Decimal::new(45, 1)).is_ok());
        assert!(check_rating(Decimal::from(5)).is_ok());
    }

    #[test]
    fn negative_reviews_are_a_bad_request() {
        assert!(matches!(check_reviews(-1), Err(AppError::BadRequest(_))));
        assert!(check_reviews(0).is_ok());
        assert!(check_reviews(120).is_ok());
    }
}
