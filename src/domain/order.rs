use chrono::{DateTime, Duration, Utc};
use password_hash::rand_core::{OsRng, RngCore};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::config::OrderConfig;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema, EnumIter, DeriveActiveEnum,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    #[sea_orm(string_value = "pending")]
    Pending,
    #[sea_orm(string_value = "paid")]
    Paid,
    #[sea_orm(string_value = "processing")]
    Processing,
    #[sea_orm(string_value = "shipped")]
    Shipped,
    #[sea_orm(string_value = "delivered")]
    Delivered,
    #[sea_orm(string_value = "cancelled")]
    Cancelled,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Paid => "paid",
            OrderStatus::Processing => "processing",
            OrderStatus::Shipped => "shipped",
            OrderStatus::Delivered => "delivered",
            OrderStatus::Cancelled => "cancelled",
        }
    }

    /// Storefront label shown to customers.
    pub fn label(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "در انتظار پرداخت",
            OrderStatus::Paid => "پرداخت شده",
            OrderStatus::Processing => "در حال پردازش",
            OrderStatus::Shipped => "ارسال شده",
            OrderStatus::Delivered => "تحویل داده شده",
            OrderStatus::Cancelled => "لغو شده",
        }
    }

    /// Delivered and cancelled orders never move again.
    pub fn is_terminal(&self) -> bool {
        matches!(self, OrderStatus::Delivered | OrderStatus::Cancelled)
    }

    /// Statuses an admin may set by hand. `pending` and `paid` are owned by
    /// checkout and payment verification.
    pub fn can_admin_move_to(&self, target: OrderStatus) -> bool {
        !self.is_terminal()
            && *self != target
            && matches!(
                target,
                OrderStatus::Processing
                    | OrderStatus::Shipped
                    | OrderStatus::Delivered
                    | OrderStatus::Cancelled
            )
    }
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema, EnumIter, DeriveActiveEnum,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    #[sea_orm(string_value = "online")]
    Online,
    #[sea_orm(string_value = "cash")]
    Cash,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ShippingType {
    #[default]
    Standard,
    Express,
}

impl ShippingType {
    pub fn cost(&self, config: &OrderConfig) -> i64 {
        match self {
            ShippingType::Standard => config.shipping_standard_cost,
            ShippingType::Express => config.shipping_express_cost,
        }
    }
}

pub fn line_total(price: i64, quantity: i32) -> i64 {
    price * i64::from(quantity)
}

/// Sum of `price * quantity` over `(price, quantity)` pairs.
pub fn items_total<I>(lines: I) -> i64
where
    I: IntoIterator<Item = (i64, i32)>,
{
    lines
        .into_iter()
        .map(|(price, quantity)| line_total(price, quantity))
        .sum()
}

pub fn final_price(total_price: i64, shipping_cost: i64) -> i64 {
    total_price + shipping_cost
}

/// Orders created strictly before the cutoff are past their payment window.
pub fn expiry_cutoff(now: DateTime<Utc>, window_minutes: i64) -> DateTime<Utc> {
    now - Duration::minutes(window_minutes)
}

pub fn is_expired(created_at: DateTime<Utc>, now: DateTime<Utc>, window_minutes: i64) -> bool {
    created_at < expiry_cutoff(now, window_minutes)
}

/// Whether the customer may still start (or restart) an online payment.
pub fn is_payable(
    status: OrderStatus,
    payment_status: bool,
    method: PaymentMethod,
    created_at: DateTime<Utc>,
    now: DateTime<Utc>,
    window_minutes: i64,
) -> bool {
    status == OrderStatus::Pending
        && !payment_status
        && method == PaymentMethod::Online
        && !is_expired(created_at, now, window_minutes)
}

/// Ten random decimal digits.
pub fn generate_order_number() -> String {
    let value = OsRng.next_u64() % 10_000_000_000;
    format!("{value:010}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn order_number_is_ten_digits() {
        for _ in 0..50 {
            let number = generate_order_number();
            assert_eq!(number.len(), 10);
            assert!(number.chars().all(|c| c.is_ascii_digit()));
        }
    }

    #[test]
    fn admin_transitions() {
        assert!(OrderStatus::Paid.can_admin_move_to(OrderStatus::Processing));
        assert!(OrderStatus::Pending.can_admin_move_to(OrderStatus::Cancelled));
        assert!(!OrderStatus::Processing.can_admin_move_to(OrderStatus::Paid));
        assert!(!OrderStatus::Delivered.can_admin_move_to(OrderStatus::Shipped));
        assert!(!OrderStatus::Cancelled.can_admin_move_to(OrderStatus::Processing));
        assert!(!OrderStatus::Shipped.can_admin_move_to(OrderStatus::Shipped));
    }
}
