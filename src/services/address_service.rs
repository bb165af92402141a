use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ActiveValue::NotSet, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, Set,
};
use uuid::Uuid;

use crate::{
    dto::addresses::{AddressList, AddressListQuery, UpsertAddressRequest},
    entity::addresses::{ActiveModel as AddressActive, Column as AddressCol, Entity as Addresses},
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::AddressView,
    response::ApiResponse,
    routes::params::Pagination,
    state::AppState,
};

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Create the caller's address, or patch the one they already have.
pub async fn upsert_address(
    state: &AppState,
    user: &AuthUser,
    payload: UpsertAddressRequest,
) -> AppResult<ApiResponse<AddressView>> {
    let address = non_empty(payload.address);
    let city = non_empty(payload.city);
    let region = non_empty(payload.state);
    let zip = non_empty(payload.zip);

    let existing = Addresses::find()
        .filter(AddressCol::UserId.eq(user.user_id))
        .one(&state.orm)
        .await?;

    let saved = match existing {
        Some(current) => {
            let mut active: AddressActive = current.into();
            if let Some(address) = address {
                active.address = Set(address);
            }
            if let Some(city) = city {
                active.city = Set(city);
            }
            if let Some(region) = region {
                active.state = Set(region);
            }
            if let Some(zip) = zip {
                active.zip = Set(zip);
            }
            if let Some(phone) = payload.phone {
                active.phone = Set(Some(phone));
            }
            active.updated_at = Set(Utc::now().into());
            active.update(&state.orm).await?
        }
        None => {
            let (Some(address), Some(city), Some(region), Some(zip)) = (address, city, region, zip)
            else {
                return Err(AppError::bad_request(
                    "Address, city, state and zip are required",
                ));
            };
            AddressActive {
                id: Set(Uuid::new_v4()),
                user_id: Set(user.user_id),
                address: Set(address),
                city: Set(city),
                state: Set(region),
                zip: Set(zip),
                phone: Set(payload.phone),
                created_at: NotSet,
                updated_at: NotSet,
            }
            .insert(&state.orm)
            .await?
        }
    };

    Ok(ApiResponse::success(
        "Address update successfully",
        AddressView::from(saved),
    ))
}

pub async fn get_own_address(
    state: &AppState,
    user: &AuthUser,
) -> AppResult<ApiResponse<AddressView>> {
    let address = Addresses::find()
        .filter(AddressCol::UserId.eq(user.user_id))
        .one(&state.orm)
        .await?
        .ok_or_else(|| AppError::not_found("Address not found"))?;
    Ok(ApiResponse::success(
        "Address fetched successfully",
        AddressView::from(address),
    ))
}

pub async fn list_addresses(
    state: &AppState,
    query: AddressListQuery,
) -> AppResult<ApiResponse<AddressList>> {
    let pagination = Pagination::new(query.page, query.limit);
    let finder = Addresses::find().order_by_desc(AddressCol::CreatedAt);
    let total = finder.clone().count(&state.orm).await?;

    let addresses = finder
        .limit(pagination.limit)
        .offset(pagination.offset())
        .all(&state.orm)
        .await?
        .into_iter()
        .map(AddressView::from)
        .collect();

    Ok(ApiResponse::paginated(
        "Addresses fetched successfully",
        AddressList { addresses },
        pagination.meta(total),
    ))
}

/// Owners may delete their own address; admins any.
pub async fn delete_address(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<serde_json::Value>> {
    let address = Addresses::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or_else(|| AppError::not_found("Address not found"))?;
    if address.user_id != user.user_id && !user.is_admin() {
        return Err(AppError::not_found("Address not found"));
    }

    Addresses::delete_by_id(id).exec(&state.orm).await?;
    Ok(ApiResponse::message("Address deleted successfully"))
}
