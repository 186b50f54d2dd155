use chrono::{Duration, TimeZone, Utc};
use digito_store::{
    config::OrderConfig,
    domain::order::{
        OrderStatus, PaymentMethod, ShippingType, expiry_cutoff, final_price, is_expired,
        is_payable, items_total, line_total,
    },
};

#[test]
fn total_is_sum_of_line_totals() {
    let lines = [(120_000_i64, 2_i32), (35_500, 1), (9_900, 3)];
    assert_eq!(items_total(lines), 240_000 + 35_500 + 29_700);
    assert_eq!(line_total(1_000, 0), 0);
    assert_eq!(items_total(Vec::<(i64, i32)>::new()), 0);
}

#[test]
fn final_price_adds_shipping() {
    let config = OrderConfig::default();
    assert_eq!(ShippingType::Standard.cost(&config), 19_000);
    assert_eq!(ShippingType::Express.cost(&config), 32_000);
    assert_eq!(final_price(100_000, ShippingType::Express.cost(&config)), 132_000);
}

#[test]
fn expiry_is_strictly_older_than_the_window() {
    let now = Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap();
    let window = 60;

    assert_eq!(expiry_cutoff(now, window), now - Duration::hours(1));
    assert!(!is_expired(now - Duration::minutes(59), now, window));
    assert!(!is_expired(now - Duration::minutes(60), now, window));
    assert!(is_expired(now - Duration::minutes(61), now, window));
}

#[test]
fn only_fresh_unpaid_online_pending_orders_are_payable() {
    let now = Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap();
    let fresh = now - Duration::minutes(5);
    let stale = now - Duration::minutes(90);

    assert!(is_payable(OrderStatus::Pending, false, PaymentMethod::Online, fresh, now, 60));
    assert!(!is_payable(OrderStatus::Pending, false, PaymentMethod::Online, stale, now, 60));
    assert!(!is_payable(OrderStatus::Pending, true, PaymentMethod::Online, fresh, now, 60));
    assert!(!is_payable(OrderStatus::Pending, false, PaymentMethod::Cash, fresh, now, 60));
    assert!(!is_payable(OrderStatus::Cancelled, false, PaymentMethod::Online, fresh, now, 60));
    assert!(!is_payable(OrderStatus::Paid, true, PaymentMethod::Online, fresh, now, 60));
}

#[test]
fn terminal_statuses() {
    assert!(OrderStatus::Delivered.is_terminal());
    assert!(OrderStatus::Cancelled.is_terminal());
    assert!(!OrderStatus::Shipped.is_terminal());
    assert!(!OrderStatus::Pending.can_admin_move_to(OrderStatus::Paid));
}
