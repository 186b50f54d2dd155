use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::models::Color;

#[derive(Debug, Deserialize, ToSchema)]
pub struct AddToCartRequest {
    pub product_id: Uuid,
    pub color_id: Option<Uuid>,
    pub quantity: i32,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateCartLineRequest {
    pub quantity: i32,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CartLine {
    /// Cart item id for signed-in users, `{product_id}_{color_id|none}` for guests.
    pub key: String,
    pub product_id: Uuid,
    pub title: String,
    pub slug: String,
    pub unit_price: i64,
    pub stock: i32,
    pub color: Option<Color>,
    pub quantity: i32,
    pub line_total: i64,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CartView {
    pub items: Vec<CartLine>,
    pub total_price: i64,
    pub item_count: i64,
}
