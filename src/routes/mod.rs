use axum::Router;

use crate::state::AppState;

pub mod addresses;
pub mod auth;
pub mod categories;
pub mod doc;
pub mod file;
pub mod health;
pub mod heroes;
pub mod orders;
pub mod params;
pub mod permissions;
pub mod products;
pub mod roles;
pub mod transactions;

// Build the API router without binding state; it will be provided at the top level.
pub fn create_api_router() -> Router<AppState> {
    Router::new()
        .nest("/auth", auth::router())
        .nest("/roles", roles::router())
        .nest("/permissions", permissions::router())
        .nest("/categories", categories::router())
        .nest("/products", products::router())
        .nest("/orders", orders::router())
        .nest("/transactions", transactions::router())
        .nest("/heroes", heroes::router())
        .nest("/addresses", addresses::router())
        .nest("/file", file::router())
}
