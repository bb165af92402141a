use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::{
    entity::{orders::PaymentMethod, transactions::TransactionStatus},
    extract::FieldMask,
    models::TransactionView,
    routes::params::SortOrder,
};

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateTransactionRequest {
    pub order_id: Option<Uuid>,
    pub amount: Option<Decimal>,
    pub method: Option<PaymentMethod>,
    pub transaction_id: Option<String>,
    #[schema(value_type = Option<Object>)]
    pub metadata: Option<Value>,
}

impl FieldMask for CreateTransactionRequest {
    const FIELDS: &'static [&'static str] =
        &["order_id", "amount", "method", "transaction_id", "metadata"];
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateTransactionStatusRequest {
    pub status: Option<String>,
    #[schema(value_type = Option<Object>)]
    pub metadata: Option<Value>,
}

impl FieldMask for UpdateTransactionStatusRequest {
    const FIELDS: &'static [&'static str] = &["status", "metadata"];
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct ProcessPaymentRequest {
    #[schema(value_type = Option<Object>)]
    pub payment_details: Option<Value>,
}

impl FieldMask for ProcessPaymentRequest {
    const FIELDS: &'static [&'static str] = &["payment_details"];
}

#[derive(Debug, Clone, Copy, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum TransactionSortBy {
    CreatedAt,
    UpdatedAt,
    Amount,
    Status,
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct TransactionListQuery {
    pub page: Option<u64>,
    pub limit: Option<u64>,
    pub status: Option<TransactionStatus>,
    pub method: Option<PaymentMethod>,
    pub user_id: Option<Uuid>,
    #[serde(rename = "sortBy")]
    pub sort_by: Option<TransactionSortBy>,
    #[serde(rename = "sortOrder")]
    pub sort_order: Option<SortOrder>,
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct StatsQuery {
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct TransactionList {
    pub transactions: Vec<TransactionView>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct StatusBucket {
    pub status: String,
    pub count: i64,
    pub total_amount: Decimal,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct MethodBucket {
    pub method: String,
    pub count: i64,
    pub total_amount: Decimal,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct TransactionStats {
    pub total_transactions: i64,
    pub completed_amount: Decimal,
    pub completed_count: i64,
    pub by_status: Vec<StatusBucket>,
    pub by_method: Vec<MethodBucket>,
}
