use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::{extract::FieldMask, models::RoleView};

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateRoleRequest {
    #[serde(default)]
    pub name: String,
    pub score: i32,
    pub description: Option<String>,
    pub is_active: Option<bool>,
}

impl FieldMask for CreateRoleRequest {
    const FIELDS: &'static [&'static str] = &["name", "score", "description", "is_active"];
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateRoleRequest {
    pub name: Option<String>,
    pub score: Option<i32>,
    pub description: Option<String>,
    pub is_active: Option<bool>,
}

impl FieldMask for UpdateRoleRequest {
    const FIELDS: &'static [&'static str] = &["name", "score", "description", "is_active"];
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct RoleListQuery {
    pub page: Option<u64>,
    pub limit: Option<u64>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct RoleList {
    pub roles: Vec<RoleView>,
}
