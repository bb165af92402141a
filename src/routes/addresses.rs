use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::{delete, get},
};
use serde_json::Value;
use uuid::Uuid;

use crate::{
    dto::addresses::{AddressList, AddressListQuery, UpsertAddressRequest},
    error::AppResult,
    extract::{ApiQuery, ValidJson},
    middleware::{
        auth::AuthUser,
        authz::{Authorized, DeleteAddress, ListAddresses},
    },
    models::AddressView,
    response::{ApiResponse, MessageBody},
    services::address_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(own_address).post(upsert_address))
        .route("/all", get(list_addresses))
        .route("/{id}", delete(delete_address))
}

#[utoipa::path(
    post,
    path = "/api/addresses",
    request_body = UpsertAddressRequest,
    responses(
        (status = 201, description = "Address created or updated", body = ApiResponse<AddressView>),
        (status = 400, description = "Missing required fields", body = MessageBody)
    ),
    security(("bearer_auth" = [])),
    tag = "Addresses"
)]
pub async fn upsert_address(
    State(state): State<AppState>,
    user: AuthUser,
    ValidJson(payload): ValidJson<UpsertAddressRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<AddressView>>)> {
    let resp = address_service::upsert_address(&state, &user, payload).await?;
    Ok((StatusCode::CREATED, Json(resp)))
}

#[utoipa::path(
    get,
    path = "/api/addresses",
    responses(
        (status = 200, description = "Address of the caller", body = ApiResponse<AddressView>),
        (status = 404, description = "Address not found", body = MessageBody)
    ),
    security(("bearer_auth" = [])),
    tag = "Addresses"
)]
pub async fn own_address(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<ApiResponse<AddressView>>> {
    let resp = address_service::get_own_address(&state, &user).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/addresses/all",
    params(AddressListQuery),
    responses(
        (status = 200, description = "All addresses", body = ApiResponse<AddressList>)
    ),
    security(("bearer_auth" = [])),
    tag = "Addresses"
)]
pub async fn list_addresses(
    State(state): State<AppState>,
    _auth: Authorized<ListAddresses>,
    ApiQuery(query): ApiQuery<AddressListQuery>,
) -> AppResult<Json<ApiResponse<AddressList>>> {
    let resp = address_service::list_addresses(&state, query).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    delete,
    path = "/api/addresses/{id}",
    params(("id" = Uuid, Path, description = "Address ID")),
    responses(
        (status = 200, description = "Address deleted", body = MessageBody),
        (status = 404, description = "Address not found", body = MessageBody)
    ),
    security(("bearer_auth" = [])),
    tag = "Addresses"
)]
pub async fn delete_address(
    State(state): State<AppState>,
    auth: Authorized<DeleteAddress>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<Value>>> {
    let resp = address_service::delete_address(&state, auth.user(), id).await?;
    Ok(Json(resp))
}
