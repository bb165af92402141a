use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ActiveValue::NotSet, ColumnTrait, Condition, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};
use serde_json::json;
use uuid::Uuid;

use crate::{
    audit,
    dto::categories::{
        CategoryList, CategoryListQuery, CategorySortBy, CreateCategoryRequest,
        UpdateCategoryRequest,
    },
    entity::{
        categories::{ActiveModel as CategoryActive, Column as CategoryCol, Entity as Categories},
        products::{Column as ProdCol, Entity as Products},
    },
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::{CategoryView, ProductView},
    providers::storage::{delete_managed, delete_managed_quietly},
    response::ApiResponse,
    routes::params::Pagination,
    services::contains_ci,
    state::AppState,
};

fn sort_column(sort_by: Option<CategorySortBy>) -> CategoryCol {
    match sort_by.unwrap_or(CategorySortBy::CreatedAt) {
        CategorySortBy::Name => CategoryCol::Name,
        CategorySortBy::CreatedAt => CategoryCol::CreatedAt,
        CategorySortBy::UpdatedAt => CategoryCol::UpdatedAt,
    }
}

async fn name_taken(state: &AppState, name: &str, except: Option<Uuid>) -> AppResult<bool> {
    let mut finder = Categories::find().filter(CategoryCol::Name.eq(name));
    if let Some(id) = except {
        finder = finder.filter(CategoryCol::Id.ne(id));
    }
    Ok(finder.one(&state.orm).await?.is_some())
}

pub async fn create_category(
    state: &AppState,
    user: &AuthUser,
    payload: CreateCategoryRequest,
) -> AppResult<ApiResponse<CategoryView>> {
    let name = payload.name.trim().to_string();
    if name.is_empty() {
        return Err(AppError::bad_request("Category name is required"));
    }
    if name_taken(state, &name, None).await? {
        return Err(AppError::Conflict("Category already exists".into()));
    }

    let category = CategoryActive {
        id: Set(Uuid::new_v4()),
        name: Set(name),
        description: Set(payload.description),
        icon: Set(payload.icon),
        created_at: NotSet,
        updated_at: NotSet,
    }
    .insert(&state.orm)
    .await?;

    audit::record(
        &state.pool,
        Some(user.user_id),
        "category_create",
        "categories",
        json!({ "category_id": category.id }),
    )
    .await;

    Ok(ApiResponse::success(
        "Category created successfully",
        CategoryView::from(category),
    ))
}

pub async fn list_categories(
    state: &AppState,
    query: CategoryListQuery,
) -> AppResult<ApiResponse<CategoryList>> {
    let pagination = Pagination::new(query.page, query.limit);

    let mut condition = Condition::all();
    if let Some(search) = query.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        condition = condition.add(
            Condition::any()
                .add(contains_ci(Categories, CategoryCol::Name, search))
                .add(contains_ci(Categories, CategoryCol::Description, search)),
        );
    }

    let finder = Categories::find()
        .filter(condition)
        .order_by(
            sort_column(query.sort_by),
            query.sort_order.unwrap_or_default().into(),
        );
    let total = finder.clone().count(&state.orm).await?;

    let categories = finder
        .limit(pagination.limit)
        .offset(pagination.offset())
        .all(&state.orm)
        .await?
        .into_iter()
        .map(CategoryView::from)
        .collect();

    Ok(ApiResponse::paginated(
        "Categories fetched successfully",
        CategoryList { categories },
        pagination.meta(total),
    ))
}

pub async fn get_category(state: &AppState, id: Uuid) -> AppResult<ApiResponse<CategoryView>> {
    let category = Categories::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or_else(|| AppError::not_found("Category not found"))?;

    let products = Products::find()
        .filter(ProdCol::CategoryId.eq(id))
        .order_by_desc(ProdCol::CreatedAt)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(ProductView::from)
        .collect();

    let mut view = CategoryView::from(category);
    view.products = Some(products);
    Ok(ApiResponse::success("Category fetched successfully", view))
}

pub async fn update_category(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: UpdateCategoryRequest,
) -> AppResult<ApiResponse<CategoryView>> {
    let category = Categories::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or_else(|| AppError::not_found("Category not found"))?;

    let name = match payload.name.as_deref().map(str::trim) {
        Some("") => return Err(AppError::bad_request("Category name cannot be empty")),
        Some(name) if name != category.name => {
            if name_taken(state, name, Some(id)).await? {
                return Err(AppError::Conflict("Category name already exists".into()));
            }
            Some(name.to_string())
        }
        _ => None,
    };

    let superseded = match (payload.icon.as_deref(), category.icon.as_deref()) {
        (Some(new_icon), Some(old_icon)) if new_icon != old_icon => Some(old_icon.to_string()),
        _ => None,
    };

    let mut active: CategoryActive = category.into();
    if let Some(name) = name {
        active.name = Set(name);
    }
    if let Some(description) = payload.description {
        active.description = Set(Some(description));
    }
    if let Some(icon) = payload.icon {
        active.icon = Set(Some(icon));
    }
    active.updated_at = Set(Utc::now().into());

    let txn = state.orm.begin().await?;
    let category = active.update(&txn).await?;
    if let Some(old) = superseded {
        delete_managed(state.assets.as_ref(), &old, "Failed to delete old image").await?;
    }
    txn.commit().await?;

    audit::record(
        &state.pool,
        Some(user.user_id),
        "category_update",
        "categories",
        json!({ "category_id": id }),
    )
    .await;

    Ok(ApiResponse::success(
        "Category updated successfully",
        CategoryView::from(category),
    ))
}

pub async fn delete_category(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<serde_json::Value>> {
    let category = Categories::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or_else(|| AppError::not_found("Category not found"))?;

    let product_count = Products::find()
        .filter(ProdCol::CategoryId.eq(id))
        .count(&state.orm)
        .await?;
    if product_count > 0 {
        return Err(AppError::bad_request(
            "Cannot delete category with associated products",
        ));
    }

    if let Some(icon) = category.icon.as_deref() {
        delete_managed_quietly(state.assets.as_ref(), icon).await;
    }
    Categories::delete_by_id(id).exec(&state.orm).await?;

    audit::record(
        &state.pool,
        Some(user.user_id),
        "category_delete",
        "categories",
        json!({ "category_id": id, "name": category.name }),
    )
    .await;

    Ok(ApiResponse::message("Category deleted successfully"))
}
