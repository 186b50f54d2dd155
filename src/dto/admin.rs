use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::{
    domain::{capabilities::Capability, order::OrderStatus},
    models::PhoneOtp,
    routes::params::Pagination,
};

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateOrderStatusRequest {
    pub status: OrderStatus,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct LowStockQuery {
    pub page: Option<i64>,
    pub per_page: Option<i64>,
    pub threshold: Option<i32>,
}

impl LowStockQuery {
    pub fn pagination(&self) -> Pagination {
        Pagination {
            page: self.page,
            per_page: self.per_page,
        }
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct InventoryAdjustRequest {
    pub delta: i32,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct UpdateSettingsRequest {
    pub use_jalali_date: Option<bool>,
    pub site_title: Option<String>,
    pub site_header: Option<String>,
    pub site_index_title: Option<String>,
    pub show_hidden_models: Option<bool>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CapabilityList {
    pub show_hidden_models: bool,
    pub items: Vec<Capability>,
}

#[derive(Serialize, ToSchema)]
#[serde(transparent)]
pub struct PhoneOtpList {
    #[schema(value_type = Vec<PhoneOtp>)]
    pub items: Vec<PhoneOtp>,
}
