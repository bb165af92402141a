use axum::{
    Json, Router,
    extract::State,
    routing::delete,
};

use crate::{
    error::AppResult,
    extract::ApiQuery,
    middleware::authz::{AdminRole, Authorized},
    response::{ApiResponse, MessageBody},
    routes::params::FileQuery,
    services::file_service::{self, DeletedFile},
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new().route("/", delete(delete_file))
}

#[utoipa::path(
    delete,
    path = "/api/file",
    params(FileQuery),
    responses(
        (status = 200, description = "File deleted", body = ApiResponse<DeletedFile>),
        (status = 400, description = "Missing or foreign url", body = MessageBody),
        (status = 403, description = "Failed to delete file", body = MessageBody)
    ),
    security(("bearer_auth" = [])),
    tag = "File"
)]
pub async fn delete_file(
    State(state): State<AppState>,
    auth: Authorized<AdminRole>,
    ApiQuery(query): ApiQuery<FileQuery>,
) -> AppResult<Json<ApiResponse<DeletedFile>>> {
    let resp = file_service::delete_file(&state, auth.user(), query.url).await?;
    Ok(Json(resp))
}
