use std::sync::{
    Arc,
    atomic::{AtomicUsize, Ordering},
};

use async_trait::async_trait;
use chrono::Utc;
use digito_store::{
    config::{AppConfig, GatewayConfig, OrderConfig, OtpConfig},
    db::{create_orm_conn, create_pool, run_migrations},
    domain::{
        cart::{SessionCart, SessionCartLine, line_key},
        order::{OrderStatus, PaymentMethod},
    },
    dto::{
        admin::InventoryAdjustRequest,
        auth::{OtpRequest, OtpVerifyRequest},
        cart::AddToCartRequest,
        orders::{CheckoutResponse, CreateOrderRequest},
        payments::{CallbackQuery, PaymentDispatch, PaymentOutcomeStatus},
    },
    entity::{orders::Entity as Orders, products::Entity as Products},
    error::AppError,
    gateway::{GatewayError, PaymentGateway, PaymentRedirect, PaymentRequest, Verification},
    middleware::auth::{AuthUser, ROLE_ADMIN, ROLE_USER},
    routes::params::OrderListQuery,
    services::{
        admin_service, auth_service,
        cart_service::{self, CartOwner},
        dashboard_service, order_service, payment_service,
    },
    session,
    sms::LogSmsSender,
    state::AppState,
};
use sea_orm::EntityTrait;
use uuid::Uuid;

/// Accepts every request unless built with `rejecting`; the first
/// verification answers 100, later ones 101.
#[derive(Default)]
struct MockGateway {
    verifications: AtomicUsize,
    reject_requests: bool,
}

impl MockGateway {
    fn rejecting() -> Self {
        Self {
            reject_requests: true,
            ..Default::default()
        }
    }
}

#[async_trait]
impl PaymentGateway for MockGateway {
    async fn request_payment(
        &self,
        request: &PaymentRequest,
    ) -> Result<PaymentRedirect, GatewayError> {
        if self.reject_requests {
            return Err(GatewayError::Rejected {
                code: Some(-12),
                message: "merchant is not active".into(),
            });
        }
        let authority = format!("A{}", request.order_id.simple());
        Ok(PaymentRedirect {
            payment_url: format!("https://pay.example/StartPay/{authority}"),
            authority,
        })
    }

    async fn verify_payment(
        &self,
        _authority: &str,
        _amount: i64,
    ) -> Result<Verification, GatewayError> {
        let previous = self.verifications.fetch_add(1, Ordering::SeqCst);
        Ok(Verification {
            ref_id: Some(987_654),
            already_verified: previous > 0,
        })
    }
}

fn database_url() -> Option<String> {
    match std::env::var("TEST_DATABASE_URL").or_else(|_| std::env::var("DATABASE_URL")) {
        Ok(url) => Some(url),
        Err(_) => {
            eprintln!("Skipping test: set TEST_DATABASE_URL or DATABASE_URL to run integration flow tests.");
            None
        }
    }
}

async fn setup_state(database_url: &str) -> anyhow::Result<AppState> {
    setup_state_with(database_url, MockGateway::default()).await
}

async fn setup_state_with(database_url: &str, gateway: MockGateway) -> anyhow::Result<AppState> {
    let orm = create_orm_conn(database_url).await?;
    run_migrations(&orm).await?;
    let pool = create_pool(database_url).await?;

    sqlx::query(
        "TRUNCATE audit_logs, post_comments, posts, blog_categories, order_items, orders, \
         cart_items, carts, favorites, product_colors, products, colors, sessions, \
         phone_otps, addresses, site_settings, users CASCADE",
    )
    .execute(&pool)
    .await?;

    let config = AppConfig {
        database_url: database_url.to_string(),
        host: "127.0.0.1".into(),
        port: 0,
        jwt_secret: "test-secret".into(),
        public_base_url: "http://localhost:3000".into(),
        gateway: GatewayConfig {
            merchant_id: Some("test-merchant".into()),
            api_base: "http://127.0.0.1:9".into(),
            start_pay_base: "https://pay.example".into(),
            timeout_secs: 1,
        },
        orders: OrderConfig::default(),
        otp: OtpConfig::default(),
    };

    Ok(AppState {
        pool,
        orm,
        config: Arc::new(config),
        gateway: Arc::new(gateway),
        sms: Arc::new(LogSmsSender),
    })
}

async fn create_user(state: &AppState, phone: &str) -> anyhow::Result<AuthUser> {
    create_user_with_role(state, phone, ROLE_USER).await
}

async fn create_user_with_role(
    state: &AppState,
    phone: &str,
    role: &str,
) -> anyhow::Result<AuthUser> {
    let (user_id,): (Uuid,) =
        sqlx::query_as("INSERT INTO users (id, phone, role) VALUES ($1, $2, $3) RETURNING id")
            .bind(Uuid::new_v4())
            .bind(phone)
            .bind(role)
            .fetch_one(&state.pool)
            .await?;
    Ok(AuthUser {
        user_id,
        role: role.into(),
        session_id: None,
    })
}

async fn create_address(state: &AppState, user: &AuthUser) -> anyhow::Result<Uuid> {
    let (id,): (Uuid,) = sqlx::query_as(
        r#"
        INSERT INTO addresses
            (id, user_id, first_name, last_name, province, city, address_details, phone_number, postal_code)
        VALUES ($1, $2, 'علی', 'رضایی', 'تهران', 'تهران', 'خیابان آزادی، پلاک ۱۰', '09121234567', '1234567890')
        RETURNING id
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(user.user_id)
    .fetch_one(&state.pool)
    .await?;
    Ok(id)
}

async fn create_product(state: &AppState, title: &str, price: i64, stock: i32) -> anyhow::Result<Uuid> {
    let (id,): (Uuid,) = sqlx::query_as(
        "INSERT INTO products (id, title, slug, price, stock) VALUES ($1, $2, $3, $4, $5) RETURNING id",
    )
    .bind(Uuid::new_v4())
    .bind(title)
    .bind(format!("{}-{}", title, Uuid::new_v4().simple()))
    .bind(price)
    .bind(stock)
    .fetch_one(&state.pool)
    .await?;
    Ok(id)
}

async fn stock_and_sales(state: &AppState, product_id: Uuid) -> anyhow::Result<(i32, i32)> {
    let product = Products::find_by_id(product_id)
        .one(&state.orm)
        .await?
        .ok_or_else(|| anyhow::anyhow!("product missing"))?;
    Ok((product.stock, product.sales))
}

async fn order_status(state: &AppState, order_id: Uuid) -> anyhow::Result<(OrderStatus, bool)> {
    let order = Orders::find_by_id(order_id)
        .one(&state.orm)
        .await?
        .ok_or_else(|| anyhow::anyhow!("order missing"))?;
    Ok((order.status, order.payment_status))
}

/// Puts one unit of `product_id` in the user's cart and checks out online.
async fn checkout_online(
    state: &AppState,
    user: &AuthUser,
    session_id: Uuid,
    product_id: Uuid,
) -> anyhow::Result<CheckoutResponse> {
    let address_id = create_address(state, user).await?;
    cart_service::add_to_cart(
        state,
        CartOwner::User(user.user_id),
        AddToCartRequest {
            product_id,
            color_id: None,
            quantity: 1,
        },
    )
    .await?;
    let resp = order_service::checkout(
        state,
        user,
        session_id,
        checkout_request(address_id, PaymentMethod::Online),
    )
    .await?;
    resp.data.ok_or_else(|| anyhow::anyhow!("checkout data missing"))
}

fn checkout_request(address_id: Uuid, payment_method: PaymentMethod) -> CreateOrderRequest {
    CreateOrderRequest {
        address_id,
        payment_method,
        shipping_type: None,
        notes: None,
    }
}

// These flows share one database and truncate it, so they run in sequence.
#[tokio::test]
async fn order_lifecycle_flows() -> anyhow::Result<()> {
    let Some(url) = database_url() else {
        return Ok(());
    };

    cash_checkout_snapshots_prices(&setup_state(&url).await?).await?;
    checkout_beyond_stock_leaves_no_rows(&setup_state(&url).await?).await?;
    sweep_cancels_stale_online_orders(&setup_state(&url).await?).await?;
    repeated_verification_pays_once(&setup_state(&url).await?).await?;
    login_merge_clamps_to_stock(&setup_state(&url).await?).await?;
    retry_past_window_cancels_order(&setup_state(&url).await?).await?;
    mismatched_callbacks_leave_order_pending(&setup_state(&url).await?).await?;
    gateway_rejection_keeps_order_and_stock(
        &setup_state_with(&url, MockGateway::rejecting()).await?,
    )
    .await?;
    otp_requests_are_rate_limited(&setup_state(&url).await?).await?;
    otp_login_merges_guest_cart(&setup_state(&url).await?).await?;
    inventory_adjustment_rejects_overflow(&setup_state(&url).await?).await?;
    dashboard_recommends_in_stock_best_sellers(&setup_state(&url).await?).await?;
    Ok(())
}

async fn cash_checkout_snapshots_prices(state: &AppState) -> anyhow::Result<()> {
    let user = create_user(state, "09120000001").await?;
    let address_id = create_address(state, &user).await?;
    let product_id = create_product(state, "گوشی", 100_000, 5).await?;
    let session_id = session::create_session(&state.pool, Some(user.user_id)).await?;

    cart_service::add_to_cart(
        state,
        CartOwner::User(user.user_id),
        AddToCartRequest {
            product_id,
            color_id: None,
            quantity: 2,
        },
    )
    .await?;

    let resp = order_service::checkout(
        state,
        &user,
        session_id,
        checkout_request(address_id, PaymentMethod::Cash),
    )
    .await?;
    let checkout = resp.data.expect("checkout data");

    assert_eq!(checkout.order.status, OrderStatus::Pending);
    assert!(!checkout.order.payment_status);
    assert_eq!(checkout.order.total_price, 200_000);
    assert_eq!(checkout.order.shipping_cost, 19_000);
    assert_eq!(checkout.order.final_price, 219_000);
    assert_eq!(checkout.items.len(), 1);
    assert_eq!(checkout.items[0].total_price, 200_000);
    assert_eq!(checkout.payment, PaymentDispatch::NotRequired);

    assert_eq!(stock_and_sales(state, product_id).await?, (3, 2));
    let view = cart_service::view_cart(state, CartOwner::User(user.user_id)).await?;
    assert!(view.data.expect("cart").items.is_empty());

    // A later price change does not touch the stored order.
    sqlx::query("UPDATE products SET price = 150000 WHERE id = $1")
        .bind(product_id)
        .execute(&state.pool)
        .await?;
    let stored = Orders::find_by_id(checkout.order.id)
        .one(&state.orm)
        .await?
        .expect("order row");
    assert_eq!(stored.get_final_price(), 219_000);
    Ok(())
}

async fn checkout_beyond_stock_leaves_no_rows(state: &AppState) -> anyhow::Result<()> {
    let user = create_user(state, "09120000002").await?;
    let address_id = create_address(state, &user).await?;
    let product_id = create_product(state, "هدفون", 50_000, 1).await?;
    let session_id = session::create_session(&state.pool, Some(user.user_id)).await?;

    // Stock dropped after the item went into the cart.
    let (cart_id,): (Uuid,) =
        sqlx::query_as("INSERT INTO carts (id, user_id) VALUES ($1, $2) RETURNING id")
            .bind(Uuid::new_v4())
            .bind(user.user_id)
            .fetch_one(&state.pool)
            .await?;
    sqlx::query("INSERT INTO cart_items (id, cart_id, product_id, quantity) VALUES ($1, $2, $3, 3)")
        .bind(Uuid::new_v4())
        .bind(cart_id)
        .bind(product_id)
        .execute(&state.pool)
        .await?;

    let err = order_service::checkout(
        state,
        &user,
        session_id,
        checkout_request(address_id, PaymentMethod::Online),
    )
    .await
    .expect_err("insufficient stock");
    assert!(matches!(err, AppError::InsufficientStock(_)));

    let (orders,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM orders")
        .fetch_one(&state.pool)
        .await?;
    let (items,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM order_items")
        .fetch_one(&state.pool)
        .await?;
    assert_eq!((orders, items), (0, 0));
    assert_eq!(stock_and_sales(state, product_id).await?, (1, 0));
    Ok(())
}

async fn sweep_cancels_stale_online_orders(state: &AppState) -> anyhow::Result<()> {
    let user = create_user(state, "09120000003").await?;

    let insert = r#"
        INSERT INTO orders (id, order_number, user_id, status, payment_method, total_price, created_at)
        VALUES ($1, $2, $3, 'pending', $4, 100000, NOW() - make_interval(mins => $5))
        RETURNING id
    "#;
    let (stale,): (Uuid,) = sqlx::query_as(insert)
        .bind(Uuid::new_v4())
        .bind("1000000001")
        .bind(user.user_id)
        .bind("online")
        .bind(61_i32)
        .fetch_one(&state.pool)
        .await?;
    let (fresh,): (Uuid,) = sqlx::query_as(insert)
        .bind(Uuid::new_v4())
        .bind("1000000002")
        .bind(user.user_id)
        .bind("online")
        .bind(5_i32)
        .fetch_one(&state.pool)
        .await?;
    let (old_cash,): (Uuid,) = sqlx::query_as(insert)
        .bind(Uuid::new_v4())
        .bind("1000000003")
        .bind(user.user_id)
        .bind("cash")
        .bind(120_i32)
        .fetch_one(&state.pool)
        .await?;

    let cancelled = order_service::sweep_expired(state, Utc::now()).await?;
    assert_eq!(cancelled, vec![stale]);

    let status_of = |id: Uuid| {
        let orm = state.orm.clone();
        async move {
            Orders::find_by_id(id)
                .one(&orm)
                .await
                .map(|o| o.map(|o| o.status))
        }
    };
    assert_eq!(status_of(stale).await?, Some(OrderStatus::Cancelled));
    assert_eq!(status_of(fresh).await?, Some(OrderStatus::Pending));
    assert_eq!(status_of(old_cash).await?, Some(OrderStatus::Pending));

    let payable = order_service::list_orders(
        state,
        &user,
        OrderListQuery {
            payable: Some(true),
            ..Default::default()
        },
    )
    .await?;
    let ids: Vec<Uuid> = payable
        .data
        .expect("order list")
        .items
        .iter()
        .map(|o| o.id)
        .collect();
    assert_eq!(ids, vec![fresh]);
    Ok(())
}

async fn repeated_verification_pays_once(state: &AppState) -> anyhow::Result<()> {
    let user = create_user(state, "09120000004").await?;
    let address_id = create_address(state, &user).await?;
    let product_id = create_product(state, "ساعت", 300_000, 4).await?;
    let session_id = session::create_session(&state.pool, Some(user.user_id)).await?;

    cart_service::add_to_cart(
        state,
        CartOwner::User(user.user_id),
        AddToCartRequest {
            product_id,
            color_id: None,
            quantity: 1,
        },
    )
    .await?;
    let checkout = order_service::checkout(
        state,
        &user,
        session_id,
        checkout_request(address_id, PaymentMethod::Online),
    )
    .await?
    .data
    .expect("checkout data");

    let authority = match &checkout.payment {
        PaymentDispatch::Redirect { authority, .. } => authority.clone(),
        other => panic!("expected a gateway redirect, got {other:?}"),
    };

    let outcome = payment_service::handle_callback(
        state,
        Some(session_id),
        CallbackQuery {
            authority: Some(authority.clone()),
            status: Some("OK".into()),
        },
    )
    .await?
    .data
    .expect("outcome");
    assert_eq!(outcome.status, PaymentOutcomeStatus::Paid);
    assert_eq!(outcome.ref_id, Some(987_654));
    assert_eq!(stock_and_sales(state, product_id).await?, (3, 1));

    // Replaying the callback finds no pending payment.
    let replay = payment_service::handle_callback(
        state,
        Some(session_id),
        CallbackQuery {
            authority: Some(authority),
            status: Some("OK".into()),
        },
    )
    .await?
    .data
    .expect("outcome");
    assert_eq!(replay.status, PaymentOutcomeStatus::Cancelled);

    // Gateway answering 101 on a second verify changes nothing.
    let verification = state.gateway.verify_payment("again", 0).await?;
    assert!(verification.already_verified);
    let (order, newly_paid) =
        payment_service::mark_paid(state, checkout.order.id, verification.ref_id).await?;
    assert!(!newly_paid);
    assert!(order.payment_status);
    assert_eq!(order.status, OrderStatus::Paid);
    assert_eq!(stock_and_sales(state, product_id).await?, (3, 1));

    // A fresh gateway round for the paid order reports it as already paid.
    let redispatched = payment_service::dispatch(state, session_id, &order).await?;
    let authority = match redispatched {
        PaymentDispatch::Redirect { authority, .. } => authority,
        other => panic!("expected a gateway redirect, got {other:?}"),
    };
    let second = payment_service::handle_callback(
        state,
        Some(session_id),
        CallbackQuery {
            authority: Some(authority),
            status: Some("OK".into()),
        },
    )
    .await?
    .data
    .expect("outcome");
    assert_eq!(second.status, PaymentOutcomeStatus::AlreadyPaid);
    assert_eq!(second.ref_id, Some(987_654));
    assert_eq!(
        order_status(state, checkout.order.id).await?,
        (OrderStatus::Paid, true)
    );
    assert_eq!(stock_and_sales(state, product_id).await?, (3, 1));
    Ok(())
}

async fn login_merge_clamps_to_stock(state: &AppState) -> anyhow::Result<()> {
    let user = create_user(state, "09120000005").await?;
    let product_id = create_product(state, "کیبورد", 80_000, 5).await?;

    cart_service::add_to_cart(
        state,
        CartOwner::User(user.user_id),
        AddToCartRequest {
            product_id,
            color_id: None,
            quantity: 1,
        },
    )
    .await?;

    let session_id = session::create_session(&state.pool, None).await?;
    let mut guest_cart = SessionCart::new();
    guest_cart.insert(
        line_key(product_id, None),
        SessionCartLine {
            product_id,
            color_id: None,
            quantity: 10,
        },
    );
    session::save_cart(&state.pool, session_id, &guest_cart).await?;

    let applied = cart_service::merge_session_cart(&state.pool, session_id, user.user_id).await?;
    assert_eq!(applied, 1);

    let view = cart_service::view_cart(state, CartOwner::User(user.user_id))
        .await?
        .data
        .expect("cart");
    assert_eq!(view.items.len(), 1);
    assert_eq!(view.items[0].quantity, 5);
    assert!(session::load_cart(&state.pool, session_id).await?.is_empty());
    Ok(())
}

async fn retry_past_window_cancels_order(state: &AppState) -> anyhow::Result<()> {
    let user = create_user(state, "09120000006").await?;
    let product_id = create_product(state, "تبلت", 120_000, 3).await?;
    let session_id = session::create_session(&state.pool, Some(user.user_id)).await?;
    let checkout = checkout_online(state, &user, session_id, product_id).await?;

    sqlx::query("UPDATE orders SET created_at = NOW() - INTERVAL '2 hours' WHERE id = $1")
        .bind(checkout.order.id)
        .execute(&state.pool)
        .await?;

    let retry = order_service::retry_payment(state, &user, session_id, checkout.order.id)
        .await?
        .data
        .expect("retry data");
    assert!(matches!(retry.payment, PaymentDispatch::Expired { .. }));
    assert_eq!(retry.order.status, OrderStatus::Cancelled);
    assert_eq!(
        order_status(state, checkout.order.id).await?,
        (OrderStatus::Cancelled, false)
    );
    Ok(())
}

async fn mismatched_callbacks_leave_order_pending(state: &AppState) -> anyhow::Result<()> {
    let user = create_user(state, "09120000007").await?;
    let product_id = create_product(state, "اسپیکر", 90_000, 3).await?;
    let session_id = session::create_session(&state.pool, Some(user.user_id)).await?;
    let checkout = checkout_online(state, &user, session_id, product_id).await?;
    let order_id = checkout.order.id;

    let wrong_authority = payment_service::handle_callback(
        state,
        Some(session_id),
        CallbackQuery {
            authority: Some("WRONG".into()),
            status: Some("OK".into()),
        },
    )
    .await?
    .data
    .expect("outcome");
    assert_eq!(wrong_authority.status, PaymentOutcomeStatus::Cancelled);
    assert_eq!(order_status(state, order_id).await?, (OrderStatus::Pending, false));
    let (_, pending) = session::take_pending_payment(&state.pool, session_id).await?;
    assert!(pending.is_none());

    let retry = order_service::retry_payment(state, &user, session_id, order_id)
        .await?
        .data
        .expect("retry data");
    let authority = match retry.payment {
        PaymentDispatch::Redirect { authority, .. } => authority,
        other => panic!("expected a gateway redirect, got {other:?}"),
    };

    let declined = payment_service::handle_callback(
        state,
        Some(session_id),
        CallbackQuery {
            authority: Some(authority),
            status: Some("NOK".into()),
        },
    )
    .await?
    .data
    .expect("outcome");
    assert_eq!(declined.status, PaymentOutcomeStatus::Cancelled);
    assert_eq!(order_status(state, order_id).await?, (OrderStatus::Pending, false));
    let (_, pending) = session::take_pending_payment(&state.pool, session_id).await?;
    assert!(pending.is_none());
    assert_eq!(stock_and_sales(state, product_id).await?, (2, 1));
    Ok(())
}

async fn gateway_rejection_keeps_order_and_stock(state: &AppState) -> anyhow::Result<()> {
    let user = create_user(state, "09120000008").await?;
    let product_id = create_product(state, "مانیتور", 250_000, 4).await?;
    let session_id = session::create_session(&state.pool, Some(user.user_id)).await?;
    let checkout = checkout_online(state, &user, session_id, product_id).await?;

    assert_eq!(
        checkout.payment,
        PaymentDispatch::Failed {
            message: "merchant is not active".into()
        }
    );
    assert_eq!(
        order_status(state, checkout.order.id).await?,
        (OrderStatus::Pending, false)
    );
    assert_eq!(stock_and_sales(state, product_id).await?, (3, 1));
    let (_, pending) = session::take_pending_payment(&state.pool, session_id).await?;
    assert!(pending.is_none());
    Ok(())
}

async fn otp_requests_are_rate_limited(state: &AppState) -> anyhow::Result<()> {
    let request = || OtpRequest {
        phone: "09123334444".into(),
    };
    for _ in 0..state.config.otp.max_per_hour {
        auth_service::request_otp(state, request()).await?;
    }

    let err = auth_service::request_otp(state, request())
        .await
        .expect_err("limit reached");
    assert!(matches!(err, AppError::TooManyRequests(_)));
    assert_eq!(err.status(), axum::http::StatusCode::TOO_MANY_REQUESTS);
    Ok(())
}

async fn otp_login_merges_guest_cart(state: &AppState) -> anyhow::Result<()> {
    let phone = "09120000009";
    let user = create_user(state, phone).await?;
    let product_id = create_product(state, "ماوس", 30_000, 10).await?;

    cart_service::add_to_cart(
        state,
        CartOwner::User(user.user_id),
        AddToCartRequest {
            product_id,
            color_id: None,
            quantity: 1,
        },
    )
    .await?;

    let guest_session = session::create_session(&state.pool, None).await?;
    cart_service::add_to_cart(
        state,
        CartOwner::Guest(guest_session),
        AddToCartRequest {
            product_id,
            color_id: None,
            quantity: 3,
        },
    )
    .await?;

    auth_service::request_otp(state, OtpRequest { phone: phone.into() }).await?;
    let (code,): (String,) = sqlx::query_as(
        "SELECT code FROM phone_otps WHERE phone_number = $1 ORDER BY created_at DESC LIMIT 1",
    )
    .bind(phone)
    .fetch_one(&state.pool)
    .await?;

    let login = auth_service::verify_otp(
        state,
        Some(guest_session),
        OtpVerifyRequest {
            phone: phone.into(),
            code,
        },
    )
    .await?
    .data
    .expect("login");
    assert_eq!(login.session_id, guest_session);
    assert!(!login.is_new_user);
    assert_eq!(login.user.id, user.user_id);

    let view = cart_service::view_cart(state, CartOwner::User(user.user_id))
        .await?
        .data
        .expect("cart");
    let quantities: Vec<i32> = view.items.iter().map(|line| line.quantity).collect();
    assert_eq!(quantities, vec![4]);
    assert!(session::load_cart(&state.pool, guest_session).await?.is_empty());

    let (otps,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM phone_otps WHERE phone_number = $1")
        .bind(phone)
        .fetch_one(&state.pool)
        .await?;
    assert_eq!(otps, 0);
    Ok(())
}

async fn inventory_adjustment_rejects_overflow(state: &AppState) -> anyhow::Result<()> {
    let admin = create_user_with_role(state, "09120000010", ROLE_ADMIN).await?;
    let product_id = create_product(state, "پاوربانک", 40_000, 5).await?;

    let err = admin_service::adjust_inventory(
        state,
        &admin,
        product_id,
        InventoryAdjustRequest { delta: i32::MAX },
    )
    .await
    .expect_err("overflowing delta");
    assert!(matches!(err, AppError::BadRequest(_)));

    let err = admin_service::adjust_inventory(
        state,
        &admin,
        product_id,
        InventoryAdjustRequest { delta: -6 },
    )
    .await
    .expect_err("negative stock");
    assert!(matches!(err, AppError::BadRequest(_)));
    assert_eq!(stock_and_sales(state, product_id).await?, (5, 0));

    let adjusted = admin_service::adjust_inventory(
        state,
        &admin,
        product_id,
        InventoryAdjustRequest { delta: 3 },
    )
    .await?
    .data
    .expect("product");
    assert_eq!(adjusted.stock, 8);
    Ok(())
}

async fn dashboard_recommends_in_stock_best_sellers(state: &AppState) -> anyhow::Result<()> {
    let user = create_user(state, "09120000011").await?;
    let steady = create_product(state, "شارژر", 20_000, 5).await?;
    let sold_out = create_product(state, "کابل", 5_000, 0).await?;
    let popular = create_product(state, "قاب", 15_000, 2).await?;

    for (id, sales) in [(steady, 3_i32), (sold_out, 50), (popular, 9)] {
        sqlx::query("UPDATE products SET sales = $2 WHERE id = $1")
            .bind(id)
            .bind(sales)
            .execute(&state.pool)
            .await?;
    }

    let dashboard = dashboard_service::summary(state, &user)
        .await?
        .data
        .expect("dashboard");
    let recommended: Vec<Uuid> = dashboard
        .recommended_products
        .iter()
        .map(|product| product.id)
        .collect();
    assert_eq!(recommended, vec![popular, steady]);
    assert_eq!(dashboard.orders_count, 0);
    assert_eq!(dashboard.points, 0);
    assert!(dashboard.recent_orders.is_empty());
    Ok(())
}
