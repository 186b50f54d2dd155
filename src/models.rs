use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::domain::order::{OrderStatus, PaymentMethod};

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, FromRow)]
pub struct User {
    pub id: Uuid,
    pub phone: String,
    pub fullname: String,
    pub role: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Address {
    pub id: Uuid,
    pub subject: Option<String>,
    pub first_name: String,
    pub last_name: String,
    pub province: String,
    pub city: String,
    pub address_details: String,
    pub phone_number: String,
    pub postal_code: String,
    pub additional_info: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, FromRow)]
pub struct Color {
    pub id: Uuid,
    pub name: String,
    pub hex_code: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Product {
    pub id: Uuid,
    pub title: String,
    pub slug: String,
    pub description: String,
    pub price: i64,
    pub stock: i32,
    pub sales: i32,
    pub views: i32,
    pub is_amazing: bool,
    pub colors: Vec<Color>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Order {
    pub id: Uuid,
    pub order_number: String,
    pub user_id: Uuid,
    pub address_id: Option<Uuid>,
    pub status: OrderStatus,
    pub status_label: String,
    pub payment_method: PaymentMethod,
    pub payment_status: bool,
    pub total_price: i64,
    pub shipping_cost: i64,
    pub final_price: i64,
    pub notes: String,
    pub ref_id: Option<i64>,
    pub paid_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct OrderItem {
    pub id: Uuid,
    pub order_id: Uuid,
    pub product_id: Option<Uuid>,
    pub color_id: Option<Uuid>,
    pub quantity: i32,
    pub price: i64,
    pub total_price: i64,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, FromRow)]
pub struct SiteSettings {
    pub use_jalali_date: bool,
    pub site_title: String,
    pub site_header: String,
    pub site_index_title: String,
    pub show_hidden_models: bool,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PhoneOtp {
    pub id: Uuid,
    pub phone_number: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Post {
    pub id: Uuid,
    pub title: String,
    pub slug: String,
    pub excerpt: String,
    pub content: String,
    pub author_id: Option<Uuid>,
    pub category_id: Option<Uuid>,
    pub status: String,
    pub views: i32,
    pub published_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PostComment {
    pub id: Uuid,
    pub post_id: Uuid,
    pub author_id: Uuid,
    pub content: String,
    pub is_approved: bool,
    pub created_at: DateTime<Utc>,
}

impl From<crate::entity::orders::Model> for Order {
    fn from(model: crate::entity::orders::Model) -> Self {
        let final_price = model.get_final_price();
        Order {
            id: model.id,
            order_number: model.order_number,
            user_id: model.user_id,
            address_id: model.address_id,
            status: model.status,
            status_label: model.status.label().to_string(),
            payment_method: model.payment_method,
            payment_status: model.payment_status,
            total_price: model.total_price,
            shipping_cost: model.shipping_cost,
            final_price,
            notes: model.notes,
            ref_id: model.ref_id,
            paid_at: model.paid_at.map(|dt| dt.with_timezone(&Utc)),
            created_at: model.created_at.with_timezone(&Utc),
            updated_at: model.updated_at.with_timezone(&Utc),
        }
    }
}

impl From<crate::entity::order_items::Model> for OrderItem {
    fn from(model: crate::entity::order_items::Model) -> Self {
        OrderItem {
            id: model.id,
            order_id: model.order_id,
            product_id: model.product_id,
            color_id: model.color_id,
            quantity: model.quantity,
            price: model.price,
            total_price: model.get_total_price(),
            created_at: model.created_at.with_timezone(&Utc),
        }
    }
}

impl From<crate::entity::addresses::Model> for Address {
    fn from(model: crate::entity::addresses::Model) -> Self {
        Address {
            id: model.id,
            subject: model.subject,
            first_name: model.first_name,
            last_name: model.last_name,
            province: model.province,
            city: model.city,
            address_details: model.address_details,
            phone_number: model.phone_number,
            postal_code: model.postal_code,
            additional_info: model.additional_info,
            created_at: model.created_at.with_timezone(&Utc),
        }
    }
}

impl From<crate::entity::colors::Model> for Color {
    fn from(model: crate::entity::colors::Model) -> Self {
        Color {
            id: model.id,
            name: model.name,
            hex_code: model.hex_code,
        }
    }
}

impl Product {
    pub fn from_entity(model: crate::entity::products::Model, colors: Vec<Color>) -> Self {
        Product {
            id: model.id,
            title: model.title,
            slug: model.slug,
            description: model.description,
            price: model.price,
            stock: model.stock,
            sales: model.sales,
            views: model.views,
            is_amazing: model.is_amazing,
            colors,
            created_at: model.created_at.with_timezone(&Utc),
        }
    }
}

impl From<crate::entity::posts::Model> for Post {
    fn from(model: crate::entity::posts::Model) -> Self {
        Post {
            id: model.id,
            title: model.title,
            slug: model.slug,
            excerpt: model.excerpt,
            content: model.content,
            author_id: model.author_id,
            category_id: model.category_id,
            status: model.status,
            views: model.views,
            published_at: model.published_at.map(|dt| dt.with_timezone(&Utc)),
            created_at: model.created_at.with_timezone(&Utc),
        }
    }
}

impl From<crate::entity::post_comments::Model> for PostComment {
    fn from(model: crate::entity::post_comments::Model) -> Self {
        PostComment {
            id: model.id,
            post_id: model.post_id,
            author_id: model.author_id,
            content: model.content,
            is_approved: model.is_approved,
            created_at: model.created_at.with_timezone(&Utc),
        }
    }
}

impl From<crate::entity::phone_otps::Model> for PhoneOtp {
    fn from(model: crate::entity::phone_otps::Model) -> Self {
        PhoneOtp {
            id: model.id,
            phone_number: model.phone_number,
            created_at: model.created_at.with_timezone(&Utc),
            expires_at: model.expires_at.with_timezone(&Utc),
        }
    }
}
