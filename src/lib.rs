pub mod audit;
pub mod config;
pub mod db;
pub mod dto;
pub mod entity;
pub mod error;
pub mod extract;
pub mod middleware;
pub mod models;
pub mod providers;
pub mod response;
pub mod routes;
pub mod services;
pub mod state;

use axum::{Json, Router, http::{StatusCode, Uri}, routing::get};

use crate::{
    response::ApiResponse,
    routes::{create_api_router, doc::scalar_docs, health},
    state::AppState,
};

/// Application router with state bound; HTTP layers are added by the binary.
pub fn build_app(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_check))
        .nest("/api", create_api_router())
        .merge(scalar_docs())
        .fallback(not_found)
        .with_state(state)
}

async fn not_found(uri: Uri) -> (StatusCode, Json<ApiResponse<serde_json::Value>>) {
    let body = ApiResponse::message(format!("Route {} not found", uri.path())).with_success(false);
    (StatusCode::NOT_FOUND, Json(body))
}
