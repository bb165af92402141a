use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::{
    entity::orders::{OrderStatus, PaymentMethod},
    extract::FieldMask,
    models::OrderView,
    routes::params::SortOrder,
};

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct OrderItemInput {
    pub product_id: Uuid,
    pub quantity: i32,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateOrderRequest {
    #[serde(default)]
    pub items: Vec<OrderItemInput>,
    pub payment_method: Option<PaymentMethod>,
    pub shipping_address: Option<String>,
    pub notes: Option<String>,
}

impl FieldMask for CreateOrderRequest {
    const FIELDS: &'static [&'static str] =
        &["items", "payment_method", "shipping_address", "notes"];
}

/// `status` stays a string so an unknown value maps to "Invalid order status".
#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateOrderStatusRequest {
    pub status: Option<String>,
    pub tracking_number: Option<String>,
}

impl FieldMask for UpdateOrderStatusRequest {
    const FIELDS: &'static [&'static str] = &["status", "tracking_number"];
}

#[derive(Debug, Clone, Copy, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum OrderSortBy {
    CreatedAt,
    UpdatedAt,
    TotalAmount,
    Status,
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct OrderListQuery {
    pub page: Option<u64>,
    pub limit: Option<u64>,
    pub status: Option<OrderStatus>,
    pub payment_method: Option<PaymentMethod>,
    pub user_id: Option<Uuid>,
    #[serde(rename = "sortBy")]
    pub sort_by: Option<OrderSortBy>,
    #[serde(rename = "sortOrder")]
    pub sort_order: Option<SortOrder>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderList {
    pub orders: Vec<OrderView>,
}
