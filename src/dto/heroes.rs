use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::{
    entity::heroes::HeroStatus, extract::FieldMask, models::HeroView, routes::params::SortOrder,
};

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateHeroRequest {
    #[serde(default)]
    pub title: String,
    pub subtitle: Option<String>,
    pub description: Option<String>,
    #[serde(default)]
    pub image: String,
    pub bg_color: Option<String>,
    pub cta: Option<String>,
    pub category_id: Option<Uuid>,
    pub product_id: Option<Uuid>,
    pub price: Option<String>,
    pub badge: Option<String>,
    pub order: Option<i32>,
    pub status: Option<HeroStatus>,
}

impl FieldMask for CreateHeroRequest {
    const FIELDS: &'static [&'static str] = &[
        "title",
        "subtitle",
        "description",
        "image",
        "bg_color",
        "cta",
        "category_id",
        "product_id",
        "price",
        "badge",
        "order",
        "status",
    ];
}

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct UpdateHeroRequest {
    pub title: Option<String>,
    pub subtitle: Option<String>,
    pub description: Option<String>,
    pub image: Option<String>,
    pub bg_color: Option<String>,
    pub cta: Option<String>,
    pub category_id: Option<Uuid>,
    pub product_id: Option<Uuid>,
    pub price: Option<String>,
    pub badge: Option<String>,
    pub order: Option<i32>,
    pub status: Option<HeroStatus>,
}

impl FieldMask for UpdateHeroRequest {
    const FIELDS: &'static [&'static str] = <CreateHeroRequest as FieldMask>::FIELDS;
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateHeroOrderRequest {
    pub order: Option<i32>,
}

impl FieldMask for UpdateHeroOrderRequest {
    const FIELDS: &'static [&'static str] = &["order"];
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct HeroOrderItem {
    pub id: Uuid,
    pub order: i32,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReorderHeroesRequest {
    pub order_array: Option<Vec<HeroOrderItem>>,
}

impl FieldMask for ReorderHeroesRequest {
    const FIELDS: &'static [&'static str] = &["orderArray"];
}

#[derive(Debug, Clone, Copy, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum HeroSortBy {
    Order,
    Title,
    CreatedAt,
    UpdatedAt,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct HeroListQuery {
    pub page: Option<u64>,
    pub limit: Option<u64>,
    pub status: Option<HeroStatus>,
    /// Case-insensitive match on title or description.
    pub search: Option<String>,
    #[serde(rename = "sortBy")]
    pub sort_by: Option<HeroSortBy>,
    #[serde(rename = "sortOrder")]
    pub sort_order: Option<SortOrder>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct HeroList {
    pub heroes: Vec<HeroView>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ReorderFailure {
    pub id: Uuid,
    pub reason: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ReorderResult {
    pub heroes: Vec<HeroView>,
    pub failed: Vec<ReorderFailure>,
}
