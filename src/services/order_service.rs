use std::collections::HashMap;

use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ActiveValue::NotSet, ColumnTrait, Condition, ConnectionTrait,
    DatabaseTransaction, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set,
    TransactionTrait,
    sea_query::{Expr, LockType},
};
use serde_json::json;
use uuid::Uuid;

use crate::{
    audit,
    dto::orders::{
        CreateOrderRequest, OrderItemInput, OrderList, OrderListQuery, OrderSortBy,
        UpdateOrderStatusRequest,
    },
    entity::{
        order_items::{ActiveModel as OrderItemActive, Column as OrderItemCol, Entity as OrderItems},
        orders::{self, ActiveModel as OrderActive, Column as OrderCol, Entity as Orders, OrderStatus},
        products::{Column as ProdCol, Entity as Products, ProductStatus},
        transactions::{
            ActiveModel as TransactionActive, Column as TxnCol, Entity as Transactions,
            TransactionStatus,
        },
        users::{Column as UserCol, Entity as Users},
    },
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::{OrderItemView, OrderView, TransactionView, UserSummary},
    response::ApiResponse,
    routes::params::Pagination,
    state::AppState,
};

/// Collapse repeated products into one line each, keeping first-seen order.
pub fn merge_lines(items: &[OrderItemInput]) -> AppResult<Vec<(Uuid, i32)>> {
    let mut lines: Vec<(Uuid, i32)> = Vec::with_capacity(items.len());
    for item in items {
        if item.quantity < 1 {
            return Err(AppError::bad_request("Quantity must be at least 1"));
        }
        match lines.iter_mut().find(|(id, _)| *id == item.product_id) {
            Some((_, quantity)) => {
                *quantity = quantity
                    .checked_add(item.quantity)
                    .ok_or_else(|| AppError::bad_request("Quantity is too large"))?;
            }
            None => lines.push((item.product_id, item.quantity)),
        }
    }
    Ok(lines)
}

fn sort_column(sort_by: Option<OrderSortBy>) -> OrderCol {
    match sort_by.unwrap_or(OrderSortBy::CreatedAt) {
        OrderSortBy::CreatedAt => OrderCol::CreatedAt,
        OrderSortBy::UpdatedAt => OrderCol::UpdatedAt,
        OrderSortBy::TotalAmount => OrderCol::TotalAmount,
        OrderSortBy::Status => OrderCol::Status,
    }
}

/// Give back the stock held by an order's items. Restocked products are
/// put back on sale.
pub(crate) async fn restock<C: ConnectionTrait>(db: &C, order_id: Uuid) -> AppResult<()> {
    let items = OrderItems::find()
        .filter(OrderItemCol::OrderId.eq(order_id))
        .all(db)
        .await?;

    for item in items {
        Products::update_many()
            .col_expr(ProdCol::Stock, Expr::col(ProdCol::Stock).add(item.quantity))
            .col_expr(ProdCol::Status, Expr::value(ProductStatus::Active))
            .col_expr(ProdCol::UpdatedAt, Expr::current_timestamp().into())
            .filter(ProdCol::Id.eq(item.product_id))
            .exec(db)
            .await?;
    }
    Ok(())
}

async fn set_transaction_status(
    txn: &DatabaseTransaction,
    order_id: Uuid,
    status: TransactionStatus,
) -> AppResult<()> {
    Transactions::update_many()
        .col_expr(TxnCol::Status, Expr::value(status))
        .col_expr(TxnCol::UpdatedAt, Expr::current_timestamp().into())
        .filter(TxnCol::OrderId.eq(order_id))
        .exec(txn)
        .await?;
    Ok(())
}

/// Attach items (with product summaries), transactions and optionally the
/// buyer to a batch of orders.
pub(crate) async fn hydrate<C: ConnectionTrait>(
    db: &C,
    orders: Vec<orders::Model>,
    with_user: bool,
) -> AppResult<Vec<OrderView>> {
    if orders.is_empty() {
        return Ok(Vec::new());
    }
    let ids: Vec<Uuid> = orders.iter().map(|o| o.id).collect();

    let mut items: HashMap<Uuid, Vec<OrderItemView>> = HashMap::new();
    for (item, product) in OrderItems::find()
        .filter(OrderItemCol::OrderId.is_in(ids.clone()))
        .find_also_related(Products)
        .order_by_asc(OrderItemCol::CreatedAt)
        .all(db)
        .await?
    {
        items
            .entry(item.order_id)
            .or_default()
            .push(OrderItemView::with_product(item, product));
    }

    let mut transactions: HashMap<Uuid, TransactionView> = Transactions::find()
        .filter(TxnCol::OrderId.is_in(ids))
        .all(db)
        .await?
        .into_iter()
        .map(|t| (t.order_id, TransactionView::from(t)))
        .collect();

    let mut users: HashMap<Uuid, UserSummary> = HashMap::new();
    if with_user {
        let user_ids: Vec<Uuid> = orders.iter().map(|o| o.user_id).collect();
        users = Users::find()
            .filter(UserCol::Id.is_in(user_ids))
            .all(db)
            .await?
            .into_iter()
            .map(|u| (u.id, UserSummary::from(u)))
            .collect();
    }

    Ok(orders
        .into_iter()
        .map(|order| {
            let id = order.id;
            let user = users.get(&order.user_id).cloned();
            let mut view = OrderView::from(order);
            view.items = items.remove(&id).unwrap_or_default();
            view.transaction = transactions.remove(&id);
            view.user = user;
            view
        })
        .collect())
}

async fn load_view<C: ConnectionTrait>(db: &C, order: orders::Model) -> AppResult<OrderView> {
    hydrate(db, vec![order], true)
        .await?
        .pop()
        .ok_or_else(|| AppError::not_found("Order not found"))
}

/// Lock an order for the rest of `txn`. Non-admins only see their own.
async fn lock_order(
    txn: &DatabaseTransaction,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<orders::Model> {
    let mut finder = Orders::find_by_id(id);
    if !user.is_admin() {
        finder = finder.filter(OrderCol::UserId.eq(user.user_id));
    }
    finder
        .lock(LockType::Update)
        .one(txn)
        .await?
        .ok_or_else(|| AppError::not_found("Order not found"))
}

pub async fn create_order(
    state: &AppState,
    user: &AuthUser,
    payload: CreateOrderRequest,
) -> AppResult<ApiResponse<OrderView>> {
    if payload.items.is_empty() {
        return Err(AppError::bad_request("Order must contain at least one item"));
    }
    let shipping_address = payload
        .shipping_address
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty());
    let (Some(payment_method), Some(shipping_address)) = (payload.payment_method, shipping_address)
    else {
        return Err(AppError::bad_request(
            "Payment method and shipping address are required",
        ));
    };
    let lines = merge_lines(&payload.items)?;

    let txn = state.orm.begin().await?;

    if Users::find_by_id(user.user_id).one(&txn).await?.is_none() {
        return Err(AppError::not_found("User not found"));
    }

    // Locked in id order so concurrent checkouts cannot deadlock.
    let products: HashMap<Uuid, _> = Products::find()
        .filter(ProdCol::Id.is_in(lines.iter().map(|(id, _)| *id)))
        .order_by_asc(ProdCol::Id)
        .lock(LockType::Update)
        .all(&txn)
        .await?
        .into_iter()
        .map(|p| (p.id, p))
        .collect();

    let mut total = Decimal::ZERO;
    for (product_id, quantity) in &lines {
        let Some(product) = products.get(product_id) else {
            return Err(AppError::not_found(format!(
                "Product with ID {} not found",
                product_id
            )));
        };
        if product.status != ProductStatus::Active {
            return Err(AppError::bad_request(format!(
                "Product {} is not available",
                product.name
            )));
        }
        if product.stock < *quantity {
            return Err(AppError::bad_request(format!(
                "Insufficient stock for product {}",
                product.name
            )));
        }
        total += product.price * Decimal::from(*quantity);
    }

    let order = OrderActive {
        id: Set(Uuid::new_v4()),
        user_id: Set(user.user_id),
        status: Set(OrderStatus::Pending),
        payment_method: Set(payment_method),
        total_amount: Set(total),
        shipping_address: Set(shipping_address.to_string()),
        tracking_number: Set(None),
        notes: Set(payload.notes),
        created_at: NotSet,
        updated_at: NotSet,
    }
    .insert(&txn)
    .await?;

    for (product_id, quantity) in &lines {
        let Some(product) = products.get(product_id) else {
            continue;
        };

        OrderItemActive {
            id: Set(Uuid::new_v4()),
            order_id: Set(order.id),
            product_id: Set(product.id),
            quantity: Set(*quantity),
            price: Set(product.price),
            created_at: NotSet,
            updated_at: NotSet,
        }
        .insert(&txn)
        .await?;

        let remaining = product.stock - quantity;
        let decremented = Products::update_many()
            .col_expr(ProdCol::Stock, Expr::col(ProdCol::Stock).sub(*quantity))
            .col_expr(
                ProdCol::Status,
                Expr::value(ProductStatus::for_stock(remaining, product.status)),
            )
            .col_expr(ProdCol::UpdatedAt, Expr::current_timestamp().into())
            .filter(ProdCol::Id.eq(product.id))
            .filter(ProdCol::Stock.gte(*quantity))
            .exec(&txn)
            .await?;
        if decremented.rows_affected == 0 {
            return Err(AppError::bad_request(format!(
                "Insufficient stock for product {}",
                product.name
            )));
        }
    }

    TransactionActive {
        id: Set(Uuid::new_v4()),
        order_id: Set(order.id),
        amount: Set(total),
        status: Set(TransactionStatus::Pending),
        method: Set(payment_method),
        transaction_id: Set(None),
        metadata: Set(None),
        created_at: NotSet,
        updated_at: NotSet,
    }
    .insert(&txn)
    .await?;

    txn.commit().await?;

    tracing::info!(order = %order.id, user = %user.user_id, total = %total, "order created");
    audit::record(
        &state.pool,
        Some(user.user_id),
        "order_create",
        "orders",
        json!({ "order_id": order.id, "total_amount": total }),
    )
    .await;

    let view = load_view(&state.orm, order).await?;
    Ok(ApiResponse::success("Order created successfully", view))
}

async fn list_with(
    state: &AppState,
    mut condition: Condition,
    query: OrderListQuery,
    message: &str,
) -> AppResult<ApiResponse<OrderList>> {
    let pagination = Pagination::new(query.page, query.limit);
    if let Some(status) = query.status {
        condition = condition.add(OrderCol::Status.eq(status));
    }
    if let Some(method) = query.payment_method {
        condition = condition.add(OrderCol::PaymentMethod.eq(method));
    }

    let finder = Orders::find().filter(condition).order_by(
        sort_column(query.sort_by),
        query.sort_order.unwrap_or_default().into(),
    );
    let total = finder.clone().count(&state.orm).await?;
    let orders = finder
        .limit(pagination.limit)
        .offset(pagination.offset())
        .all(&state.orm)
        .await?;
    let orders = hydrate(&state.orm, orders, true).await?;

    Ok(ApiResponse::paginated(
        message,
        OrderList { orders },
        pagination.meta(total),
    ))
}

pub async fn list_orders(
    state: &AppState,
    query: OrderListQuery,
) -> AppResult<ApiResponse<OrderList>> {
    let mut condition = Condition::all();
    if let Some(user_id) = query.user_id {
        condition = condition.add(OrderCol::UserId.eq(user_id));
    }
    list_with(state, condition, query, "Orders fetched successfully").await
}

pub async fn list_user_orders(
    state: &AppState,
    user: &AuthUser,
    query: OrderListQuery,
) -> AppResult<ApiResponse<OrderList>> {
    let condition = Condition::all().add(OrderCol::UserId.eq(user.user_id));
    list_with(state, condition, query, "Orders fetched successfully").await
}

pub async fn get_order(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<OrderView>> {
    let mut finder = Orders::find_by_id(id);
    if !user.is_admin() {
        finder = finder.filter(OrderCol::UserId.eq(user.user_id));
    }
    let order = finder
        .one(&state.orm)
        .await?
        .ok_or_else(|| AppError::not_found("Order not found"))?;

    let view = load_view(&state.orm, order).await?;
    Ok(ApiResponse::success("Order fetched successfully", view))
}

pub async fn update_order_status(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: UpdateOrderStatusRequest,
) -> AppResult<ApiResponse<OrderView>> {
    let Some(raw) = payload.status.as_deref().map(str::trim).filter(|s| !s.is_empty()) else {
        return Err(AppError::bad_request("Status is required"));
    };
    let next = OrderStatus::parse(raw).ok_or_else(|| AppError::bad_request("Invalid order status"))?;

    let txn = state.orm.begin().await?;
    let order = lock_order(&txn, user, id).await?;
    let previous = order.status;

    if !previous.can_transition_to(next) {
        return Err(AppError::bad_request(format!(
            "Cannot change order status from {} to {}",
            previous.as_str(),
            next.as_str()
        )));
    }
    if previous.returns_stock_on(next) {
        restock(&txn, order.id).await?;
    }

    let mut active: OrderActive = order.into();
    active.status = Set(next);
    if next == OrderStatus::Shipped {
        if let Some(tracking) = payload.tracking_number.filter(|t| !t.trim().is_empty()) {
            active.tracking_number = Set(Some(tracking));
        }
    }
    active.updated_at = Set(Utc::now().into());
    let order = active.update(&txn).await?;

    if previous != next {
        if let Some(txn_status) = next.cascade_to_transaction() {
            set_transaction_status(&txn, order.id, txn_status).await?;
        }
    }

    txn.commit().await?;

    tracing::info!(order = %id, from = previous.as_str(), to = next.as_str(), "order status changed");
    audit::record(
        &state.pool,
        Some(user.user_id),
        "order_status_update",
        "orders",
        json!({ "order_id": id, "from": previous.as_str(), "to": next.as_str() }),
    )
    .await;

    let view = load_view(&state.orm, order).await?;
    Ok(ApiResponse::success("Order status updated successfully", view))
}

pub async fn cancel_order(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<OrderView>> {
    let txn = state.orm.begin().await?;
    let order = lock_order(&txn, user, id).await?;

    if !order.status.is_cancellable() {
        return Err(AppError::bad_request(
            "Only pending or processing orders can be cancelled",
        ));
    }

    restock(&txn, order.id).await?;

    let mut active: OrderActive = order.into();
    active.status = Set(OrderStatus::Cancelled);
    active.updated_at = Set(Utc::now().into());
    let order = active.update(&txn).await?;
    set_transaction_status(&txn, order.id, TransactionStatus::Cancelled).await?;

    txn.commit().await?;

    tracing::info!(order = %id, user = %user.user_id, "order cancelled");
    audit::record(
        &state.pool,
        Some(user.user_id),
        "order_cancel",
        "orders",
        json!({ "order_id": id }),
    )
    .await;

    let view = load_view(&state.orm, order).await?;
    Ok(ApiResponse::success("Order cancelled successfully", view))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(product_id: Uuid, quantity: i32) -> OrderItemInput {
        OrderItemInput {
            product_id,
            quantity,
        }
    }

    #[test]
    fn repeated_products_are_merged_in_first_seen_order() {
        let (a, b) = (Uuid::new_v4(), Uuid::new_v4());
        let lines = merge_lines(&[line(a, 1), line(b, 2), line(a, 3)]).unwrap();
        assert_eq!(lines, vec![(a, 4), (b, 2)]);
    }

    #[test]
    fn zero_quantity_is_rejected() {
        let err = merge_lines(&[line(Uuid::new_v4(), 0)]).unwrap_err();
        assert_eq!(err.to_string(), "Quantity must be at least 1");
    }
}
