use serde::Serialize;
use utoipa::ToSchema;

use crate::{
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    providers::storage::managed_public_id,
    response::ApiResponse,
    state::AppState,
};

#[derive(Debug, Serialize, ToSchema)]
pub struct DeletedFile {
    pub public_id: String,
}

/// Remove an uploaded asset by its delivery URL.
pub async fn delete_file(
    state: &AppState,
    user: &AuthUser,
    url: Option<String>,
) -> AppResult<ApiResponse<DeletedFile>> {
    let Some(url) = url.map(|u| u.trim().to_string()).filter(|u| !u.is_empty()) else {
        return Err(AppError::bad_request("File url is required"));
    };
    let public_id = managed_public_id(&url)
        .ok_or_else(|| AppError::bad_request("Not a managed file url"))?;

    let deleted = match state.assets.delete(&public_id).await {
        Ok(deleted) => deleted,
        Err(err) => {
            tracing::warn!(error = %err, public_id, "file deletion failed");
            false
        }
    };
    if !deleted {
        return Err(AppError::forbidden("Failed to delete file"));
    }

    tracing::info!(public_id, user = %user.user_id, "file deleted");
    Ok(ApiResponse::success(
        "File deleted successfully",
        DeletedFile { public_id },
    ))
}
