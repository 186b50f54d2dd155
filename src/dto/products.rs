use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::models::{Color, Product};

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateProductRequest {
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub price: i64,
    pub stock: i32,
    #[serde(default)]
    pub is_amazing: bool,
    #[serde(default)]
    pub color_ids: Vec<Uuid>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateProductRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub price: Option<i64>,
    pub stock: Option<i32>,
    pub is_amazing: Option<bool>,
    /// Replaces the product's colors when present.
    pub color_ids: Option<Vec<Uuid>>,
}

#[derive(Serialize, ToSchema)]
#[serde(transparent)]
pub struct ProductList {
    #[schema(value_type = Vec<Product>)]
    pub items: Vec<Product>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateColorRequest {
    pub name: String,
    pub hex_code: String,
}

#[derive(Serialize, ToSchema)]
#[serde(transparent)]
pub struct ColorList {
    #[schema(value_type = Vec<Color>)]
    pub items: Vec<Color>,
}
