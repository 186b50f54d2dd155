use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    domain::order::{PaymentMethod, ShippingType},
    dto::payments::PaymentDispatch,
    models::{Order, OrderItem},
};

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateOrderRequest {
    pub address_id: Uuid,
    pub payment_method: PaymentMethod,
    pub shipping_type: Option<ShippingType>,
    pub notes: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderWithItems {
    pub order: Order,
    pub items: Vec<OrderItem>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderList {
    pub items: Vec<Order>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CheckoutResponse {
    pub order: Order,
    pub items: Vec<OrderItem>,
    pub payment: PaymentDispatch,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct RetryPaymentResponse {
    pub order: Order,
    pub payment: PaymentDispatch,
}
