use serde::Serialize;
use utoipa::ToSchema;

use crate::models::{Order, Product};

#[derive(Debug, Serialize, ToSchema)]
pub struct Dashboard {
    pub orders_count: i64,
    pub delivered_count: i64,
    pub favorites_count: i64,
    pub addresses_count: i64,
    /// Sum of paid orders' item totals.
    pub balance: i64,
    pub points: i64,
    pub recent_orders: Vec<Order>,
    /// Up to eight in-stock products, best sellers first.
    pub recommended_products: Vec<Product>,
}
