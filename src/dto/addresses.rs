use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::models::Address;

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct AddressRequest {
    pub subject: Option<String>,
    pub first_name: String,
    pub last_name: String,
    pub province: String,
    pub city: String,
    pub address_details: String,
    pub phone_number: String,
    pub postal_code: String,
    #[serde(default)]
    pub additional_info: String,
}

#[derive(Serialize, ToSchema)]
#[serde(transparent)]
pub struct AddressList {
    #[schema(value_type = Vec<Address>)]
    pub items: Vec<Address>,
}
