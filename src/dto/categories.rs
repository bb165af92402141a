use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::{extract::FieldMask, models::CategoryView, routes::params::SortOrder};

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateCategoryRequest {
    #[serde(default)]
    pub name: String,
    pub description: Option<String>,
    pub icon: Option<String>,
}

impl FieldMask for CreateCategoryRequest {
    const FIELDS: &'static [&'static str] = &["name", "description", "icon"];
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateCategoryRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub icon: Option<String>,
}

impl FieldMask for UpdateCategoryRequest {
    const FIELDS: &'static [&'static str] = &["name", "description", "icon"];
}

#[derive(Debug, Clone, Copy, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum CategorySortBy {
    Name,
    CreatedAt,
    UpdatedAt,
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct CategoryListQuery {
    pub page: Option<u64>,
    pub limit: Option<u64>,
    pub search: Option<String>,
    #[serde(rename = "sortBy")]
    pub sort_by: Option<CategorySortBy>,
    #[serde(rename = "sortOrder")]
    pub sort_order: Option<SortOrder>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CategoryList {
    pub categories: Vec<CategoryView>,
}
