use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ActiveValue::NotSet, ColumnTrait, Condition, DatabaseTransaction,
    EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
    sea_query::LockType,
};
use serde_json::{Value, json};
use uuid::Uuid;

use crate::{
    audit,
    dto::transactions::{
        CreateTransactionRequest, MethodBucket, ProcessPaymentRequest, StatsQuery, StatusBucket,
        TransactionList, TransactionListQuery, TransactionSortBy, TransactionStats,
        UpdateTransactionStatusRequest,
    },
    entity::{
        orders::{self, ActiveModel as OrderActive, Entity as Orders},
        transactions::{
            self, ActiveModel as TransactionActive, Column as TxnCol, Entity as Transactions,
            TransactionStatus,
        },
    },
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::TransactionView,
    providers::payment::{ChargeOutcome, ChargeRequest},
    response::ApiResponse,
    routes::params::{Pagination, parse_date_bound},
    services::order_service::restock,
    state::AppState,
};

/// Shallow merge of `extra` into `current`. Non-object values replace.
pub fn merge_metadata(current: Option<Value>, extra: Value) -> Value {
    match (current, extra) {
        (Some(Value::Object(mut base)), Value::Object(extra)) => {
            base.extend(extra);
            Value::Object(base)
        }
        (None, Value::Object(extra)) => Value::Object(extra),
        (_, extra) => extra,
    }
}

fn parse_status(raw: &str) -> Option<TransactionStatus> {
    use sea_orm::ActiveEnum;
    TransactionStatus::try_from_value(&raw.to_owned()).ok()
}

fn sort_column(sort_by: Option<TransactionSortBy>) -> TxnCol {
    match sort_by.unwrap_or(TransactionSortBy::CreatedAt) {
        TransactionSortBy::CreatedAt => TxnCol::CreatedAt,
        TransactionSortBy::UpdatedAt => TxnCol::UpdatedAt,
        TransactionSortBy::Amount => TxnCol::Amount,
        TransactionSortBy::Status => TxnCol::Status,
    }
}

async fn lock_pair(
    txn: &DatabaseTransaction,
    id: Uuid,
) -> AppResult<(transactions::Model, orders::Model)> {
    let transaction = Transactions::find_by_id(id)
        .lock(LockType::Update)
        .one(txn)
        .await?
        .ok_or_else(|| AppError::not_found("Transaction not found"))?;
    let order = Orders::find_by_id(transaction.order_id)
        .lock(LockType::Update)
        .one(txn)
        .await?
        .ok_or_else(|| AppError::not_found("Order not found"))?;
    Ok((transaction, order))
}

/// Move the order as implied by the transaction's new status.
async fn cascade_to_order(
    txn: &DatabaseTransaction,
    order: orders::Model,
    status: TransactionStatus,
) -> AppResult<()> {
    let current = order.status;
    let Some(next) = status.cascade_to_order(current) else {
        return Ok(());
    };
    if next == current {
        return Ok(());
    }
    if !current.can_transition_to(next) {
        tracing::warn!(
            order = %order.id,
            from = current.as_str(),
            to = next.as_str(),
            "skipping order cascade out of terminal state"
        );
        return Ok(());
    }
    if current.returns_stock_on(next) {
        restock(txn, order.id).await?;
    }

    let mut active: OrderActive = order.into();
    active.status = Set(next);
    active.updated_at = Set(Utc::now().into());
    active.update(txn).await?;
    Ok(())
}

async fn view_with_order(state: &AppState, id: Uuid) -> AppResult<TransactionView> {
    match Transactions::find_by_id(id)
        .find_also_related(Orders)
        .one(&state.orm)
        .await?
    {
        Some((transaction, order)) => Ok(TransactionView::with_order(transaction, order)),
        None => Err(AppError::not_found("Transaction not found")),
    }
}

pub async fn create_transaction(
    state: &AppState,
    user: &AuthUser,
    payload: CreateTransactionRequest,
) -> AppResult<ApiResponse<TransactionView>> {
    let (Some(order_id), Some(amount), Some(method)) =
        (payload.order_id, payload.amount, payload.method)
    else {
        return Err(AppError::bad_request(
            "Order ID, amount, and method are required",
        ));
    };
    if amount.is_sign_negative() {
        return Err(AppError::bad_request("Amount cannot be negative"));
    }

    if Orders::find_by_id(order_id).one(&state.orm).await?.is_none() {
        return Err(AppError::not_found("Order not found"));
    }
    let existing = Transactions::find()
        .filter(TxnCol::OrderId.eq(order_id))
        .one(&state.orm)
        .await?;
    if existing.is_some() {
        return Err(AppError::bad_request(
            "Transaction already exists for this order",
        ));
    }

    let transaction = TransactionActive {
        id: Set(Uuid::new_v4()),
        order_id: Set(order_id),
        amount: Set(amount),
        status: Set(TransactionStatus::Pending),
        method: Set(method),
        transaction_id: Set(payload.transaction_id),
        metadata: Set(payload.metadata),
        created_at: NotSet,
        updated_at: NotSet,
    }
    .insert(&state.orm)
    .await?;

    audit::record(
        &state.pool,
        Some(user.user_id),
        "transaction_create",
        "transactions",
        json!({ "transaction_id": transaction.id, "order_id": order_id }),
    )
    .await;

    let view = view_with_order(state, transaction.id).await?;
    Ok(ApiResponse::success("Transaction created successfully", view))
}

async fn list_with(
    state: &AppState,
    mut condition: Condition,
    query: TransactionListQuery,
) -> AppResult<ApiResponse<TransactionList>> {
    let pagination = Pagination::new(query.page, query.limit);
    if let Some(status) = query.status {
        condition = condition.add(TxnCol::Status.eq(status));
    }
    if let Some(method) = query.method {
        condition = condition.add(TxnCol::Method.eq(method));
    }

    let total = Transactions::find()
        .inner_join(Orders)
        .filter(condition.clone())
        .count(&state.orm)
        .await?;

    let transactions = Transactions::find()
        .find_also_related(Orders)
        .filter(condition)
        .order_by(
            sort_column(query.sort_by),
            query.sort_order.unwrap_or_default().into(),
        )
        .limit(pagination.limit)
        .offset(pagination.offset())
        .all(&state.orm)
        .await?
        .into_iter()
        .map(|(transaction, order)| TransactionView::with_order(transaction, order))
        .collect();

    Ok(ApiResponse::paginated(
        "Transactions fetched successfully",
        TransactionList { transactions },
        pagination.meta(total),
    ))
}

pub async fn list_transactions(
    state: &AppState,
    query: TransactionListQuery,
) -> AppResult<ApiResponse<TransactionList>> {
    let mut condition = Condition::all();
    if let Some(user_id) = query.user_id {
        condition = condition.add(orders::Column::UserId.eq(user_id));
    }
    list_with(state, condition, query).await
}

pub async fn list_user_transactions(
    state: &AppState,
    user: &AuthUser,
    query: TransactionListQuery,
) -> AppResult<ApiResponse<TransactionList>> {
    let condition = Condition::all().add(orders::Column::UserId.eq(user.user_id));
    list_with(state, condition, query).await
}

pub async fn get_transaction(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<TransactionView>> {
    let (transaction, order) = Transactions::find_by_id(id)
        .find_also_related(Orders)
        .one(&state.orm)
        .await?
        .ok_or_else(|| AppError::not_found("Transaction not found"))?;

    let owned = order.as_ref().is_some_and(|o| o.user_id == user.user_id);
    if !user.is_admin() && !owned {
        return Err(AppError::forbidden(
            "Unauthorized access to this transaction",
        ));
    }

    Ok(ApiResponse::success(
        "Transaction fetched successfully",
        TransactionView::with_order(transaction, order),
    ))
}

pub async fn update_transaction_status(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: UpdateTransactionStatusRequest,
) -> AppResult<ApiResponse<TransactionView>> {
    let Some(raw) = payload.status.as_deref().map(str::trim).filter(|s| !s.is_empty()) else {
        return Err(AppError::bad_request("Status is required"));
    };
    let status =
        parse_status(raw).ok_or_else(|| AppError::bad_request("Invalid transaction status"))?;

    let txn = state.orm.begin().await?;
    let (transaction, order) = lock_pair(&txn, id).await?;
    let previous = transaction.status;

    let metadata = match payload.metadata {
        Some(extra) => Some(merge_metadata(transaction.metadata.clone(), extra)),
        None => transaction.metadata.clone(),
    };

    let mut active: TransactionActive = transaction.into();
    active.status = Set(status);
    active.metadata = Set(metadata);
    active.updated_at = Set(Utc::now().into());
    active.update(&txn).await?;

    if previous != status {
        cascade_to_order(&txn, order, status).await?;
    }

    txn.commit().await?;

    tracing::info!(transaction = %id, from = previous.as_str(), to = status.as_str(), "transaction status changed");
    audit::record(
        &state.pool,
        Some(user.user_id),
        "transaction_status_update",
        "transactions",
        json!({ "transaction_id": id, "from": previous.as_str(), "to": status.as_str() }),
    )
    .await;

    let view = view_with_order(state, id).await?;
    Ok(ApiResponse::success(
        "Transaction status updated successfully",
        view,
    ))
}

/// Charge a pending transaction. A declined charge comes back with
/// `success: false`.
///
/// The transaction and order rows stay locked `FOR UPDATE` across the gateway
/// call, so a transaction is charged at most once. The cost is that a slow
/// gateway holds the lock (and a pooled connection) for the whole call, and a
/// concurrent status update on the same transaction waits behind it.
pub async fn process_payment(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: ProcessPaymentRequest,
) -> AppResult<ApiResponse<TransactionView>> {
    let Some(details) = payload.payment_details.filter(|d| !d.is_null()) else {
        return Err(AppError::bad_request("Payment details are required"));
    };

    let txn = state.orm.begin().await?;
    let (transaction, order) = lock_pair(&txn, id).await?;
    if transaction.status != TransactionStatus::Pending {
        return Err(AppError::bad_request("Transaction is not in pending state"));
    }

    let outcome = state
        .payments
        .charge(ChargeRequest {
            transaction_id: transaction.id,
            amount: transaction.amount,
            method: transaction.method,
            details: &details,
        })
        .await?;

    let now = Utc::now();
    let approved = matches!(outcome, ChargeOutcome::Approved { .. });
    let current_metadata = transaction.metadata.clone();
    let mut active: TransactionActive = transaction.into();
    match outcome {
        ChargeOutcome::Approved { reference } => {
            active.status = Set(TransactionStatus::Completed);
            active.transaction_id = Set(Some(reference));
            active.metadata = Set(Some(merge_metadata(
                current_metadata,
                json!({ "payment_details": details, "processed_at": now }),
            )));
        }
        ChargeOutcome::Declined { reason } => {
            active.status = Set(TransactionStatus::Failed);
            active.metadata = Set(Some(merge_metadata(
                current_metadata,
                json!({ "error": reason, "failed_at": now }),
            )));
        }
    }
    active.updated_at = Set(now.into());
    active.update(&txn).await?;

    if approved {
        cascade_to_order(&txn, order, TransactionStatus::Completed).await?;
    }
    txn.commit().await?;

    tracing::info!(transaction = %id, approved, "payment processed");
    audit::record(
        &state.pool,
        Some(user.user_id),
        if approved { "payment_completed" } else { "payment_failed" },
        "transactions",
        json!({ "transaction_id": id }),
    )
    .await;

    let view = view_with_order(state, id).await?;
    if approved {
        Ok(ApiResponse::success("Payment processed successfully", view))
    } else {
        Ok(ApiResponse::success("Payment failed", view).with_success(false))
    }
}

pub async fn transaction_stats(
    state: &AppState,
    query: StatsQuery,
) -> AppResult<ApiResponse<TransactionStats>> {
    let start = parse_date_bound("start_date", query.start_date.as_deref())?;
    let end = parse_date_bound("end_date", query.end_date.as_deref())?;
    if let (Some(start), Some(end)) = (start, end) {
        if start > end {
            return Err(AppError::bad_request("start_date must be before end_date"));
        }
    }

    let stats = compute_stats(state, start, end).await?;
    Ok(ApiResponse::success(
        "Transaction stats fetched successfully",
        stats,
    ))
}

async fn compute_stats(
    state: &AppState,
    start: Option<DateTime<Utc>>,
    end: Option<DateTime<Utc>>,
) -> AppResult<TransactionStats> {
    const WINDOW: &str = "($1::timestamptz IS NULL OR created_at >= $1) \
                          AND ($2::timestamptz IS NULL OR created_at <= $2)";

    let by_status: Vec<(String, i64, Decimal)> = sqlx::query_as(&format!(
        "SELECT status, COUNT(*)::BIGINT, COALESCE(SUM(amount), 0) \
         FROM transactions WHERE {} GROUP BY status ORDER BY status",
        WINDOW
    ))
    .bind(start)
    .bind(end)
    .fetch_all(&state.pool)
    .await?;

    let by_method: Vec<(String, i64, Decimal)> = sqlx::query_as(&format!(
        "SELECT method, COUNT(*)::BIGINT, COALESCE(SUM(amount), 0) \
         FROM transactions WHERE {} GROUP BY method ORDER BY method",
        WINDOW
    ))
    .bind(start)
    .bind(end)
    .fetch_all(&state.pool)
    .await?;

    Ok(summarize(by_status, by_method))
}

fn summarize(
    by_status: Vec<(String, i64, Decimal)>,
    by_method: Vec<(String, i64, Decimal)>,
) -> TransactionStats {
    let total_transactions = by_status.iter().map(|(_, count, _)| count).sum();
    let (completed_count, completed_amount) = by_status
        .iter()
        .find(|(status, _, _)| status == TransactionStatus::Completed.as_str())
        .map(|(_, count, amount)| (*count, *amount))
        .unwrap_or((0, Decimal::ZERO));

    TransactionStats {
        total_transactions,
        completed_amount,
        completed_count,
        by_status: by_status
            .into_iter()
            .map(|(status, count, total_amount)| StatusBucket {
                status,
                count,
                total_amount,
            })
            .collect(),
        by_method: by_method
            .into_iter()
            .map(|(method, count, total_amount)| MethodBucket {
                method,
                count,
                total_amount,
            })
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn metadata_merge_keeps_existing_keys() {
        let merged = merge_metadata(
            Some(json!({ "gateway": "stripe", "attempt": 1 })),
            json!({ "attempt": 2, "note": "retried" }),
        );
        assert_eq!(
            merged,
            json!({ "gateway": "stripe", "attempt": 2, "note": "retried" })
        );
    }

    #[test]
    fn metadata_merge_without_base_or_object() {
        assert_eq!(merge_metadata(None, json!({ "a": 1 })), json!({ "a": 1 }));
        assert_eq!(merge_metadata(Some(json!({ "a": 1 })), json!("raw")), json!("raw"));
    }

    #[test]
    fn status_parsing_uses_wire_names() {
        assert_eq!(parse_status("REFUNDED"), Some(TransactionStatus::Refunded));
        assert_eq!(parse_status("refunded"), None);
        assert_eq!(parse_status("SETTLED"), None);
    }

    #[test]
    fn stats_summary_picks_completed_bucket() {
        let stats = summarize(
            vec![
                ("COMPLETED".into(), 3, Decimal::new(15000, 2)),
                ("PENDING".into(), 2, Decimal::new(4000, 2)),
            ],
            vec![("STRIPE".into(), 5, Decimal::new(19000, 2))],
        );
        assert_eq!(stats.total_transactions, 5);
        assert_eq!(stats.completed_count, 3);
        assert_eq!(stats.completed_amount, Decimal::new(15000, 2));
        assert_eq!(stats.by_method.len(), 1);
    }

    #[test]
    fn empty_window_has_zero_totals() {
        let stats = summarize(Vec::new(), Vec::new());
        assert_eq!(stats.total_transactions, 0);
        assert_eq!(stats.completed_amount, Decimal::ZERO);
    }
}
