use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::{extract::FieldMask, models::AddressView};

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpsertAddressRequest {
    pub address: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub zip: Option<String>,
    pub phone: Option<String>,
}

impl FieldMask for UpsertAddressRequest {
    const FIELDS: &'static [&'static str] = &["address", "city", "state", "zip", "phone"];
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct AddressListQuery {
    pub page: Option<u64>,
    pub limit: Option<u64>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AddressList {
    pub addresses: Vec<AddressView>,
}
