use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::{get, patch, post},
};
use uuid::Uuid;

use crate::{
    dto::transactions::{
        CreateTransactionRequest, ProcessPaymentRequest, StatsQuery, TransactionList,
        TransactionListQuery, TransactionStats, UpdateTransactionStatusRequest,
    },
    error::AppResult,
    extract::{ApiQuery, ValidJson},
    middleware::authz::{Authorized, ManageTransactions, ViewOwnTransactions},
    models::TransactionView,
    response::{ApiResponse, MessageBody},
    services::transaction_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_transactions).post(create_transaction))
        .route("/stats", get(transaction_stats))
        .route("/my-transactions", get(my_transactions))
        .route("/{id}", get(get_transaction))
        .route("/{id}/status", patch(update_transaction_status))
        .route("/{id}/process", post(process_payment))
}

#[utoipa::path(
    post,
    path = "/api/transactions",
    request_body = CreateTransactionRequest,
    responses(
        (status = 201, description = "Transaction created", body = ApiResponse<TransactionView>),
        (status = 400, description = "Transaction already exists for this order", body = MessageBody)
    ),
    security(("bearer_auth" = [])),
    tag = "Transactions"
)]
pub async fn create_transaction(
    State(state): State<AppState>,
    auth: Authorized<ManageTransactions>,
    ValidJson(payload): ValidJson<CreateTransactionRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<TransactionView>>)> {
    let resp = transaction_service::create_transaction(&state, auth.user(), payload).await?;
    Ok((StatusCode::CREATED, Json(resp)))
}

#[utoipa::path(
    get,
    path = "/api/transactions",
    params(TransactionListQuery),
    responses(
        (status = 200, description = "All transactions", body = ApiResponse<TransactionList>)
    ),
    security(("bearer_auth" = [])),
    tag = "Transactions"
)]
pub async fn list_transactions(
    State(state): State<AppState>,
    _auth: Authorized<ManageTransactions>,
    ApiQuery(query): ApiQuery<TransactionListQuery>,
) -> AppResult<Json<ApiResponse<TransactionList>>> {
    let resp = transaction_service::list_transactions(&state, query).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/transactions/stats",
    params(StatsQuery),
    responses(
        (status = 200, description = "Counts and totals", body = ApiResponse<TransactionStats>),
        (status = 400, description = "Invalid date bound", body = MessageBody)
    ),
    security(("bearer_auth" = [])),
    tag = "Transactions"
)]
pub async fn transaction_stats(
    State(state): State<AppState>,
    _auth: Authorized<ManageTransactions>,
    ApiQuery(query): ApiQuery<StatsQuery>,
) -> AppResult<Json<ApiResponse<TransactionStats>>> {
    let resp = transaction_service::transaction_stats(&state, query).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/transactions/my-transactions",
    params(TransactionListQuery),
    responses(
        (status = 200, description = "Transactions of the caller", body = ApiResponse<TransactionList>)
    ),
    security(("bearer_auth" = [])),
    tag = "Transactions"
)]
pub async fn my_transactions(
    State(state): State<AppState>,
    auth: Authorized<ViewOwnTransactions>,
    ApiQuery(query): ApiQuery<TransactionListQuery>,
) -> AppResult<Json<ApiResponse<TransactionList>>> {
    let resp = transaction_service::list_user_transactions(&state, auth.user(), query).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/transactions/{id}",
    params(("id" = Uuid, Path, description = "Transaction ID")),
    responses(
        (status = 200, description = "Transaction", body = ApiResponse<TransactionView>),
        (status = 403, description = "Unauthorized access to this transaction", body = MessageBody),
        (status = 404, description = "Transaction not found", body = MessageBody)
    ),
    security(("bearer_auth" = [])),
    tag = "Transactions"
)]
pub async fn get_transaction(
    State(state): State<AppState>,
    auth: Authorized<ViewOwnTransactions>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<TransactionView>>> {
    let resp = transaction_service::get_transaction(&state, auth.user(), id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    patch,
    path = "/api/transactions/{id}/status",
    params(("id" = Uuid, Path, description = "Transaction ID")),
    request_body = UpdateTransactionStatusRequest,
    responses(
        (status = 202, description = "Status changed", body = ApiResponse<TransactionView>),
        (status = 400, description = "Invalid transaction status", body = MessageBody)
    ),
    security(("bearer_auth" = [])),
    tag = "Transactions"
)]
pub async fn update_transaction_status(
    State(state): State<AppState>,
    auth: Authorized<ManageTransactions>,
    Path(id): Path<Uuid>,
    ValidJson(payload): ValidJson<UpdateTransactionStatusRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<TransactionView>>)> {
    let resp =
        transaction_service::update_transaction_status(&state, auth.user(), id, payload).await?;
    Ok((StatusCode::ACCEPTED, Json(resp)))
}

#[utoipa::path(
    post,
    path = "/api/transactions/{id}/process",
    params(("id" = Uuid, Path, description = "Transaction ID")),
    request_body = ProcessPaymentRequest,
    responses(
        (status = 200, description = "Payment processed", body = ApiResponse<TransactionView>),
        (status = 400, description = "Payment failed or transaction not pending", body = ApiResponse<TransactionView>)
    ),
    security(("bearer_auth" = [])),
    tag = "Transactions"
)]
pub async fn process_payment(
    State(state): State<AppState>,
    auth: Authorized<ManageTransactions>,
    Path(id): Path<Uuid>,
    ValidJson(payload): ValidJson<ProcessPaymentRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<TransactionView>>)> {
    let resp = transaction_service::process_payment(&state, auth.user(), id, payload).await?;
    let status = if resp.success {
        StatusCode::OK
    } else {
        StatusCode::BAD_REQUEST
    };
    Ok((status, Json(resp)))
}
