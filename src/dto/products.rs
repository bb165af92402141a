use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::{
    entity::products::ProductStatus, extract::FieldMask, models::ProductView,
    routes::params::SortOrder,
};

pub const MAX_IMAGES: usize = 10;

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateProductRequest {
    #[serde(default)]
    pub name: String,
    pub description: Option<String>,
    pub price: Option<Decimal>,
    #[serde(default)]
    pub images: Vec<String>,
    pub category_id: Option<Uuid>,
    pub stock: Option<i32>,
    pub status: Option<ProductStatus>,
}

impl FieldMask for CreateProductRequest {
    const FIELDS: &'static [&'static str] = &[
        "name",
        "description",
        "price",
        "images",
        "category_id",
        "stock",
        "status",
    ];
}

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct UpdateProductRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<Decimal>,
    pub images: Option<Vec<String>>,
    pub category_id: Option<Uuid>,
    pub stock: Option<i32>,
    pub rating: Option<Decimal>,
    pub reviews: Option<i32>,
    pub status: Option<ProductStatus>,
}

impl FieldMask for UpdateProductRequest {
    const FIELDS: &'static [&'static str] = &[
        "name",
        "description",
        "price",
        "images",
        "category_id",
        "stock",
        "rating",
        "reviews",
        "status",
    ];
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StockOperation {
    Add,
    Subtract,
}

impl StockOperation {
    pub fn parse(raw: Option<&str>) -> Option<Self> {
        match raw.unwrap_or("add") {
            "add" => Some(StockOperation::Add),
            "subtract" => Some(StockOperation::Subtract),
            _ => None,
        }
    }

    /// New stock level, or `None` when it would drop below zero.
    pub fn apply(&self, stock: i32, quantity: i32) -> Option<i32> {
        let next = match self {
            StockOperation::Add => stock.checked_add(quantity)?,
            StockOperation::Subtract => stock.checked_sub(quantity)?,
        };
        (next >= 0).then_some(next)
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateStockRequest {
    pub quantity: i32,
    /// Defaults to `add`.
    pub operation: Option<String>,
}

impl FieldMask for UpdateStockRequest {
    const FIELDS: &'static [&'static str] = &["quantity", "operation"];
}

#[derive(Debug, Clone, Copy, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ProductSortBy {
    Name,
    Price,
    Stock,
    Rating,
    CreatedAt,
    UpdatedAt,
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ProductListQuery {
    pub page: Option<u64>,
    pub limit: Option<u64>,
    pub search: Option<String>,
    pub category_id: Option<Uuid>,
    pub min_price: Option<Decimal>,
    pub max_price: Option<Decimal>,
    pub status: Option<ProductStatus>,
    #[serde(rename = "sortBy")]
    pub sort_by: Option<ProductSortBy>,
    #[serde(rename = "sortOrder")]
    pub sort_order: Option<SortOrder>,
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ShowcaseQuery {
    pub limit: Option<u64>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ProductList {
    pub products: Vec<ProductView>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stock_operation_defaults_to_add() {
        assert_eq!(StockOperation::parse(None), Some(StockOperation::Add));
        assert_eq!(StockOperation::parse(Some("subtract")), Some(StockOperation::Subtract));
        assert_eq!(StockOperation::parse(Some("multiply")), None);
    }

    #[test]
    fn subtract_cannot_go_negative() {
        assert_eq!(StockOperation::Subtract.apply(3, 3), Some(0));
        assert_eq!(StockOperation::Subtract.apply(3, 4), None);
        assert_eq!(StockOperation::Add.apply(0, 5), Some(5));
    }
}
