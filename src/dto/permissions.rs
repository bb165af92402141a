use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::{extract::FieldMask, models::PermissionView};

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreatePermissionRequest {
    #[serde(default)]
    pub module: String,
    #[serde(default)]
    pub action: String,
    pub resource: Option<String>,
    pub required_score: i32,
    pub description: Option<String>,
    pub status: Option<String>,
}

impl FieldMask for CreatePermissionRequest {
    const FIELDS: &'static [&'static str] = &[
        "module",
        "action",
        "resource",
        "required_score",
        "description",
        "status",
    ];
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdatePermissionRequest {
    pub module: Option<String>,
    pub action: Option<String>,
    pub resource: Option<String>,
    pub required_score: Option<i32>,
    pub description: Option<String>,
    pub status: Option<String>,
}

impl FieldMask for UpdatePermissionRequest {
    const FIELDS: &'static [&'static str] = &[
        "module",
        "action",
        "resource",
        "required_score",
        "description",
        "status",
    ];
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct PermissionListQuery {
    pub module: Option<String>,
    /// Include soft-deleted permissions.
    pub include_deleted: Option<bool>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PermissionList {
    pub permissions: Vec<PermissionView>,
}
