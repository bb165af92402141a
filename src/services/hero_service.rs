use std::collections::HashMap;

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ActiveValue::NotSet, ColumnTrait, Condition, ConnectionTrait,
    DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set,
    TransactionTrait,
};
use serde_json::json;
use tokio::task::{self, JoinSet};
use uuid::Uuid;

use crate::{
    audit,
    dto::heroes::{
        CreateHeroRequest, HeroList, HeroListQuery, HeroOrderItem, HeroSortBy, ReorderFailure,
        ReorderHeroesRequest, ReorderResult, UpdateHeroOrderRequest, UpdateHeroRequest,
    },
    entity::{
        categories::{Column as CategoryCol, Entity as Categories},
        heroes::{self, ActiveModel as HeroActive, Column as HeroCol, Entity as Heroes, HeroStatus},
        products::{Column as ProdCol, Entity as Products},
    },
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::HeroView,
    providers::storage::{delete_managed, delete_managed_quietly},
    response::ApiResponse,
    routes::params::{Pagination, SortOrder},
    services::contains_ci,
    state::AppState,
};

fn sort_column(sort_by: Option<HeroSortBy>) -> HeroCol {
    match sort_by.unwrap_or(HeroSortBy::Order) {
        HeroSortBy::Order => HeroCol::DisplayOrder,
        HeroSortBy::Title => HeroCol::Title,
        HeroSortBy::CreatedAt => HeroCol::CreatedAt,
        HeroSortBy::UpdatedAt => HeroCol::UpdatedAt,
    }
}

fn check_order(order: i32) -> AppResult<i32> {
    if order < 0 {
        return Err(AppError::bad_request("Invalid order value"));
    }
    Ok(order)
}

async fn find_hero(state: &AppState, id: Uuid) -> AppResult<heroes::Model> {
    Heroes::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or_else(|| AppError::not_found("Hero slide not found"))
}

async fn check_links(
    state: &AppState,
    product_id: Option<Uuid>,
    category_id: Option<Uuid>,
) -> AppResult<()> {
    if let Some(id) = product_id {
        if Products::find_by_id(id).one(&state.orm).await?.is_none() {
            return Err(AppError::not_found("Product not found"));
        }
    }
    if let Some(id) = category_id {
        if Categories::find_by_id(id).one(&state.orm).await?.is_none() {
            return Err(AppError::not_found("Category not found"));
        }
    }
    Ok(())
}

/// Attach the linked product and category summaries.
async fn hydrate<C: ConnectionTrait>(db: &C, heroes: Vec<heroes::Model>) -> AppResult<Vec<HeroView>> {
    let product_ids: Vec<Uuid> = heroes.iter().filter_map(|h| h.product_id).collect();
    let category_ids: Vec<Uuid> = heroes.iter().filter_map(|h| h.category_id).collect();

    let mut products = HashMap::new();
    if !product_ids.is_empty() {
        products = Products::find()
            .filter(ProdCol::Id.is_in(product_ids))
            .all(db)
            .await?
            .into_iter()
            .map(|p| (p.id, p))
            .collect();
    }
    let mut categories = HashMap::new();
    if !category_ids.is_empty() {
        categories = Categories::find()
            .filter(CategoryCol::Id.is_in(category_ids))
            .all(db)
            .await?
            .into_iter()
            .map(|c| (c.id, c))
            .collect();
    }

    Ok(heroes
        .into_iter()
        .map(|hero| {
            let product = hero.product_id.and_then(|id| products.get(&id).cloned());
            let category = hero.category_id.and_then(|id| categories.get(&id).cloned());
            HeroView::with_links(hero, product, category)
        })
        .collect())
}

async fn view_of(state: &AppState, hero: heroes::Model) -> AppResult<HeroView> {
    hydrate(&state.orm, vec![hero])
        .await?
        .pop()
        .ok_or_else(|| AppError::not_found("Hero slide not found"))
}

pub async fn create_hero(
    state: &AppState,
    user: &AuthUser,
    payload: CreateHeroRequest,
) -> AppResult<ApiResponse<HeroView>> {
    let title = payload.title.trim().to_string();
    let image = payload.image.trim().to_string();
    if title.is_empty() || image.is_empty() {
        return Err(AppError::bad_request("Title and image are required"));
    }
    check_links(state, payload.product_id, payload.category_id).await?;

    let display_order = match payload.order {
        Some(order) => check_order(order)?,
        None => {
            let last = Heroes::find()
                .order_by_desc(HeroCol::DisplayOrder)
                .one(&state.orm)
                .await?;
            last.map(|h| h.display_order + 1).unwrap_or(0)
        }
    };

    let hero = HeroActive {
        id: Set(Uuid::new_v4()),
        title: Set(title),
        subtitle: Set(payload.subtitle),
        description: Set(payload.description),
        image: Set(image),
        bg_color: Set(payload.bg_color),
        cta: Set(payload.cta),
        category_id: Set(payload.category_id),
        product_id: Set(payload.product_id),
        price: Set(payload.price),
        badge: Set(payload.badge),
        display_order: Set(display_order),
        status: Set(payload.status.unwrap_or(HeroStatus::Active)),
        created_at: NotSet,
        updated_at: NotSet,
    }
    .insert(&state.orm)
    .await?;

    audit::record(
        &state.pool,
        Some(user.user_id),
        "hero_create",
        "heroes",
        json!({ "hero_id": hero.id }),
    )
    .await;

    let view = view_of(state, hero).await?;
    Ok(ApiResponse::success("Hero slide created successfully", view))
}

pub async fn list_heroes(
    state: &AppState,
    query: HeroListQuery,
) -> AppResult<ApiResponse<HeroList>> {
    let pagination = Pagination::new(query.page, query.limit);
    let mut condition = Condition::all();
    if let Some(status) = query.status {
        condition = condition.add(HeroCol::Status.eq(status));
    }
    if let Some(search) = query.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        condition = condition.add(
            Condition::any()
                .add(contains_ci(Heroes, HeroCol::Title, search))
                .add(contains_ci(Heroes, HeroCol::Description, search)),
        );
    }

    let finder = Heroes::find().filter(condition).order_by(
        sort_column(query.sort_by),
        query.sort_order.unwrap_or(SortOrder::Asc).into(),
    );
    let total = finder.clone().count(&state.orm).await?;
    let heroes = finder
        .limit(pagination.limit)
        .offset(pagination.offset())
        .all(&state.orm)
        .await?;
    let heroes = hydrate(&state.orm, heroes).await?;

    Ok(ApiResponse::paginated(
        "Hero slides fetched successfully",
        HeroList { heroes },
        pagination.meta(total),
    ))
}

pub async fn list_active_heroes(state: &AppState) -> AppResult<ApiResponse<Vec<HeroView>>> {
    let heroes = Heroes::find()
        .filter(HeroCol::Status.eq(HeroStatus::Active))
        .order_by_asc(HeroCol::DisplayOrder)
        .order_by_asc(HeroCol::CreatedAt)
        .all(&state.orm)
        .await?;
    let heroes = hydrate(&state.orm, heroes).await?;
    Ok(ApiResponse::success(
        "Active hero slides fetched successfully",
        heroes,
    ))
}

pub async fn get_hero(state: &AppState, id: Uuid) -> AppResult<ApiResponse<HeroView>> {
    let hero = find_hero(state, id).await?;
    let view = view_of(state, hero).await?;
    Ok(ApiResponse::success("Hero slide fetched successfully", view))
}

pub async fn update_hero(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: UpdateHeroRequest,
) -> AppResult<ApiResponse<HeroView>> {
    let hero = find_hero(state, id).await?;
    check_links(state, payload.product_id, payload.category_id).await?;
    if let Some(order) = payload.order {
        check_order(order)?;
    }

    if let Some(title) = payload.title.as_deref() {
        if title.trim().is_empty() {
            return Err(AppError::bad_request("Title cannot be empty"));
        }
    }
    let superseded = match payload.image.as_deref().map(str::trim) {
        Some("") => return Err(AppError::bad_request("Image cannot be empty")),
        Some(image) if image != hero.image => Some(hero.image.clone()),
        _ => None,
    };

    let mut active: HeroActive = hero.into();
    if let Some(title) = payload.title {
        active.title = Set(title.trim().to_string());
    }
    if let Some(subtitle) = payload.subtitle {
        active.subtitle = Set(Some(subtitle));
    }
    if let Some(description) = payload.description {
        active.description = Set(Some(description));
    }
    if let Some(image) = payload.image {
        active.image = Set(image.trim().to_string());
    }
    if let Some(bg_color) = payload.bg_color {
        active.bg_color = Set(Some(bg_color));
    }
    if let Some(cta) = payload.cta {
        active.cta = Set(Some(cta));
    }
    if let Some(category_id) = payload.category_id {
        active.category_id = Set(Some(category_id));
    }
    if let Some(product_id) = payload.product_id {
        active.product_id = Set(Some(product_id));
    }
    if let Some(price) = payload.price {
        active.price = Set(Some(price));
    }
    if let Some(badge) = payload.badge {
        active.badge = Set(Some(badge));
    }
    if let Some(order) = payload.order {
        active.display_order = Set(order);
    }
    if let Some(status) = payload.status {
        active.status = Set(status);
    }
    active.updated_at = Set(Utc::now().into());

    let txn = state.orm.begin().await?;
    let hero = active.update(&txn).await?;
    if let Some(old) = superseded {
        delete_managed(state.assets.as_ref(), &old, "Failed to delete old image").await?;
    }
    txn.commit().await?;

    audit::record(
        &state.pool,
        Some(user.user_id),
        "hero_update",
        "heroes",
        json!({ "hero_id": id }),
    )
    .await;

    let view = view_of(state, hero).await?;
    Ok(ApiResponse::success("Hero slide updated successfully", view))
}

pub async fn update_hero_order(
    state: &AppState,
    id: Uuid,
    payload: UpdateHeroOrderRequest,
) -> AppResult<ApiResponse<HeroView>> {
    let Some(order) = payload.order else {
        return Err(AppError::bad_request("Order value is required"));
    };
    let hero = find_hero(state, id).await?;
    let order = check_order(order)?;

    let mut active: HeroActive = hero.into();
    active.display_order = Set(order);
    active.updated_at = Set(Utc::now().into());
    let hero = active.update(&state.orm).await?;

    let view = view_of(state, hero).await?;
    Ok(ApiResponse::success("Hero order updated successfully", view))
}

async fn apply_order(orm: DatabaseConnection, item: HeroOrderItem) -> Result<(), String> {
    if item.order < 0 {
        return Err("Invalid order value".into());
    }
    let hero = match Heroes::find_by_id(item.id).one(&orm).await {
        Ok(Some(hero)) => hero,
        Ok(None) => return Err("Hero slide not found".into()),
        Err(err) => return Err(err.to_string()),
    };

    let mut active: HeroActive = hero.into();
    active.display_order = Set(item.order);
    active.updated_at = Set(Utc::now().into());
    active.update(&orm).await.map(|_| ()).map_err(|err| err.to_string())
}

/// Drains the reorder tasks. A task that panicked or was cancelled is
/// reported against the hero it was spawned for.
async fn collect_failures(
    mut tasks: JoinSet<Result<(), String>>,
    mut owners: HashMap<task::Id, Uuid>,
) -> Vec<ReorderFailure> {
    let mut failed = Vec::new();
    while let Some(joined) = tasks.join_next_with_id().await {
        let (task, outcome) = match joined {
            Ok((task, outcome)) => (task, outcome),
            Err(err) => (err.id(), Err(format!("Reorder task failed: {err}"))),
        };
        let Some(id) = owners.remove(&task) else {
            continue;
        };
        if let Err(reason) = outcome {
            tracing::warn!(hero = %id, reason = %reason, "hero reorder item failed");
            failed.push(ReorderFailure { id, reason });
        }
    }
    failed
}

/// Each `{id, order}` pair is written independently and concurrently. Pairs
/// that could not be applied are reported in `failed`.
pub async fn reorder_heroes(
    state: &AppState,
    user: &AuthUser,
    payload: ReorderHeroesRequest,
) -> AppResult<ApiResponse<ReorderResult>> {
    let Some(items) = payload.order_array else {
        return Err(AppError::bad_request(
            "Order array is required and must be an array",
        ));
    };
    if items.is_empty() {
        return Err(AppError::bad_request("Invalid order array"));
    }

    let ids: Vec<Uuid> = items.iter().map(|item| item.id).collect();
    let mut tasks = JoinSet::new();
    let mut owners = HashMap::with_capacity(ids.len());
    for item in items {
        let id = item.id;
        let handle = tasks.spawn(apply_order(state.orm.clone(), item));
        owners.insert(handle.id(), id);
    }

    let mut failed = collect_failures(tasks, owners).await;
    failed.sort_by_key(|f| f.id);

    let heroes = Heroes::find()
        .filter(HeroCol::Id.is_in(ids))
        .order_by_asc(HeroCol::DisplayOrder)
        .all(&state.orm)
        .await?;
    let heroes = hydrate(&state.orm, heroes).await?;

    audit::record(
        &state.pool,
        Some(user.user_id),
        "hero_reorder",
        "heroes",
        json!({ "updated": heroes.len(), "failed": failed.len() }),
    )
    .await;

    Ok(ApiResponse::spread(
        "Heroes reordered successfully",
        ReorderResult { heroes, failed },
    ))
}

pub async fn toggle_hero_status(state: &AppState, id: Uuid) -> AppResult<ApiResponse<HeroView>> {
    let hero = find_hero(state, id).await?;
    let next = hero.status.toggled();

    let mut active: HeroActive = hero.into();
    active.status = Set(next);
    active.updated_at = Set(Utc::now().into());
    let hero = active.update(&state.orm).await?;

    let view = view_of(state, hero).await?;
    Ok(ApiResponse::success("Hero status toggled successfully", view))
}

pub async fn delete_hero(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<serde_json::Value>> {
    let hero = find_hero(state, id).await?;
    delete_managed_quietly(state.assets.as_ref(), &hero.image).await;
    Heroes::delete_by_id(id).exec(&state.orm).await?;

    audit::record(
        &state.pool,
        Some(user.user_id),
        "hero_delete",
        "heroes",
        json!({ "hero_id": id, "title": hero.title }),
    )
    .await;

    Ok(ApiResponse::message("Hero slide deleted successfully"))
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn dropped_connection() -> Result<(), String> {
        panic!("connection reset")
    }

    #[tokio::test]
    async fn panicked_reorder_task_is_reported_against_its_hero() {
        let ok_id = Uuid::new_v4();
        let bad_id = Uuid::new_v4();
        let missing_id = Uuid::new_v4();

        let mut tasks: JoinSet<Result<(), String>> = JoinSet::new();
        let mut owners = HashMap::new();
        let handle = tasks.spawn(async { Ok(()) });
        owners.insert(handle.id(), ok_id);
        let handle = tasks.spawn(dropped_connection());
        owners.insert(handle.id(), bad_id);
        let handle = tasks.spawn(async { Err("Hero slide not found".to_string()) });
        owners.insert(handle.id(), missing_id);

        let mut failed = collect_failures(tasks, owners).await;
        failed.sort_by_key(|f| f.id);

        let mut expected = vec![bad_id, missing_id];
        expected.sort();
        assert_eq!(failed.iter().map(|f| f.id).collect::<Vec<_>>(), expected);
        let panicked = failed.iter().find(|f| f.id == bad_id).unwrap();
        assert!(panicked.reason.starts_with("Reorder task failed"));
        let missing = failed.iter().find(|f| f.id == missing_id).unwrap();
        assert_eq!(missing.reason, "Hero slide not found");
    }
}
