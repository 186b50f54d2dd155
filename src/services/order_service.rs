use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
    ActiveValue::NotSet,
    sea_query::{Expr, LockType},
};
use uuid::Uuid;

use crate::{
    audit,
    domain::order::{
        OrderStatus, PaymentMethod, expiry_cutoff, generate_order_number, is_payable, items_total,
    },
    dto::{
        orders::{CheckoutResponse, CreateOrderRequest, OrderList, OrderWithItems, RetryPaymentResponse},
        payments::PaymentDispatch,
    },
    entity::{
        addresses::{Column as AddressCol, Entity as Addresses},
        cart_items::{Column as CartItemCol, Entity as CartItems},
        carts::{Column as CartCol, Entity as Carts},
        order_items::{ActiveModel as OrderItemActive, Column as OrderItemCol, Entity as OrderItems},
        orders::{ActiveModel as OrderActive, Column as OrderCol, Entity as Orders, Model as OrderModel},
        products::{Column as ProdCol, Entity as Products},
    },
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::{Order, OrderItem},
    response::{ApiResponse, Meta},
    routes::params::{OrderListQuery, SortOrder},
    services::payment_service,
    state::AppState,
};

const ORDER_NUMBER_ATTEMPTS: usize = 5;

/// Cancels every online order still unpaid after the payment window and
/// returns the ids it cancelled. Runs lazily before order listings.
///
/// Cash orders are exempt: they stay pending until they are fulfilled and
/// are never waiting on the gateway.
pub async fn sweep_expired(state: &AppState, now: DateTime<Utc>) -> AppResult<Vec<Uuid>> {
    let cutoff = expiry_cutoff(now, state.config.orders.expiry_minutes);
    let rows: Vec<(Uuid,)> = sqlx::query_as(
        r#"
        UPDATE orders
        SET status = 'cancelled', updated_at = NOW()
        WHERE status = 'pending'
          AND payment_status = FALSE
          AND payment_method = 'online'
          AND created_at < $1
        RETURNING id
        "#,
    )
    .bind(cutoff)
    .fetch_all(&state.pool)
    .await?;

    let ids: Vec<Uuid> = rows.into_iter().map(|(id,)| id).collect();
    if !ids.is_empty() {
        tracing::info!(count = ids.len(), order_ids = ?ids, "expired unpaid orders cancelled");
    }
    Ok(ids)
}

pub async fn list_orders(
    state: &AppState,
    user: &AuthUser,
    query: OrderListQuery,
) -> AppResult<ApiResponse<OrderList>> {
    let now = Utc::now();
    sweep_expired(state, now).await?;

    let (page, limit, offset) = query.pagination().normalize();
    let mut condition = Condition::all().add(OrderCol::UserId.eq(user.user_id));
    if let Some(status) = query.status {
        condition = condition.add(OrderCol::Status.eq(status));
    }
    if query.payable.unwrap_or(false) {
        condition = condition.add(payable_condition(state, now));
    }

    let mut finder = Orders::find().filter(condition);
    finder = match query.sort_order.unwrap_or(SortOrder::Desc) {
        SortOrder::Asc => finder.order_by_asc(OrderCol::CreatedAt),
        SortOrder::Desc => finder.order_by_desc(OrderCol::CreatedAt),
    };

    let total = finder.clone().count(&state.orm).await? as i64;

    let orders = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(Order::from)
        .collect();

    let meta = Meta::new(page, limit, total);
    Ok(ApiResponse::success(
        "Ok",
        OrderList { items: orders },
        Some(meta),
    ))
}

/// Pending, unpaid online orders still inside the payment window.
pub fn payable_condition(state: &AppState, now: DateTime<Utc>) -> Condition {
    let cutoff = expiry_cutoff(now, state.config.orders.expiry_minutes);
    Condition::all()
        .add(OrderCol::Status.eq(OrderStatus::Pending))
        .add(OrderCol::PaymentStatus.eq(false))
        .add(OrderCol::PaymentMethod.eq(PaymentMethod::Online))
        .add(OrderCol::CreatedAt.gte(cutoff))
}

/// Turns the user's cart into an order in one transaction, then hands online
/// orders to the gateway. A gateway failure leaves the order pending.
pub async fn checkout(
    state: &AppState,
    user: &AuthUser,
    session_id: Uuid,
    payload: CreateOrderRequest,
) -> AppResult<ApiResponse<CheckoutResponse>> {
    let shipping_type = payload.shipping_type.unwrap_or_default();
    let shipping_cost = shipping_type.cost(&state.config.orders);
    let notes = payload.notes.unwrap_or_default().trim().to_string();

    let txn = state.orm.begin().await?;

    let address = Addresses::find_by_id(payload.address_id)
        .filter(AddressCol::UserId.eq(user.user_id))
        .one(&txn)
        .await?
        .ok_or_else(|| AppError::BadRequest("address not found".into()))?;

    let cart = Carts::find()
        .filter(CartCol::UserId.eq(user.user_id))
        .one(&txn)
        .await?
        .ok_or_else(|| AppError::BadRequest("Cart is empty".into()))?;

    let lines = CartItems::find()
        .filter(CartItemCol::CartId.eq(cart.id))
        .order_by_asc(CartItemCol::CreatedAt)
        .find_also_related(Products)
        .all(&txn)
        .await?;

    if lines.is_empty() {
        return Err(AppError::BadRequest("Cart is empty".into()));
    }

    let mut priced = Vec::with_capacity(lines.len());
    for (item, product) in lines {
        let product = product.ok_or_else(|| AppError::BadRequest("Cart has a removed product".into()))?;
        if item.quantity <= 0 {
            return Err(AppError::BadRequest("Cart has invalid quantity".into()));
        }
        if product.stock < item.quantity {
            return Err(AppError::InsufficientStock(product.title));
        }
        priced.push((item, product));
    }

    let total_price = items_total(priced.iter().map(|(item, product)| (product.price, item.quantity)));
    let order_number = unique_order_number(&txn).await?;

    let order = OrderActive {
        id: Set(Uuid::new_v4()),
        order_number: Set(order_number),
        user_id: Set(user.user_id),
        address_id: Set(Some(address.id)),
        status: Set(OrderStatus::Pending),
        payment_method: Set(payload.payment_method),
        payment_status: Set(false),
        total_price: Set(total_price),
        shipping_cost: Set(shipping_cost),
        notes: Set(notes),
        ref_id: Set(None),
        paid_at: Set(None),
        created_at: NotSet,
        updated_at: NotSet,
    }
    .insert(&txn)
    .await?;

    let mut items = Vec::with_capacity(priced.len());
    for (item, product) in &priced {
        let order_item = OrderItemActive {
            id: Set(Uuid::new_v4()),
            order_id: Set(order.id),
            product_id: Set(Some(product.id)),
            color_id: Set(item.color_id),
            quantity: Set(item.quantity),
            price: Set(product.price),
            created_at: NotSet,
        }
        .insert(&txn)
        .await?;
        items.push(OrderItem::from(order_item));

        // Conditional decrement: a concurrent checkout that drained the stock
        // after the check above makes this touch zero rows.
        let updated = Products::update_many()
            .col_expr(ProdCol::Stock, Expr::col(ProdCol::Stock).sub(item.quantity))
            .col_expr(ProdCol::Sales, Expr::col(ProdCol::Sales).add(item.quantity))
            .filter(ProdCol::Id.eq(product.id))
            .filter(ProdCol::Stock.gte(item.quantity))
            .exec(&txn)
            .await?;
        if updated.rows_affected == 0 {
            return Err(AppError::InsufficientStock(product.title.clone()));
        }
    }

    CartItems::delete_many()
        .filter(CartItemCol::CartId.eq(cart.id))
        .exec(&txn)
        .await?;

    txn.commit().await?;

    tracing::info!(
        order_id = %order.id,
        order_number = %order.order_number,
        final_price = order.get_final_price(),
        "order created"
    );
    audit::record(
        &state.pool,
        Some(user.user_id),
        "checkout",
        "orders",
        serde_json::json!({ "order_id": order.id, "payment_method": order.payment_method }),
    )
    .await;

    let payment = match order.payment_method {
        PaymentMethod::Online => payment_service::dispatch(state, session_id, &order).await?,
        PaymentMethod::Cash => PaymentDispatch::NotRequired,
    };

    Ok(ApiResponse::success(
        "Order created",
        CheckoutResponse {
            order: Order::from(order),
            items,
            payment,
        },
        Some(Meta::empty()),
    ))
}

/// Starts a new gateway round for a pending order. An order found past its
/// payment window is cancelled on the spot.
pub async fn retry_payment(
    state: &AppState,
    user: &AuthUser,
    session_id: Uuid,
    id: Uuid,
) -> AppResult<ApiResponse<RetryPaymentResponse>> {
    let txn = state.orm.begin().await?;

    let order = Orders::find()
        .filter(
            Condition::all()
                .add(OrderCol::UserId.eq(user.user_id))
                .add(OrderCol::Id.eq(id)),
        )
        .lock(LockType::Update)
        .one(&txn)
        .await?
        .ok_or(AppError::NotFound)?;

    if order.payment_status {
        return Err(AppError::BadRequest("Order already paid".into()));
    }
    if order.payment_method != PaymentMethod::Online {
        return Err(AppError::BadRequest("Order is not paid online".into()));
    }
    if order.status != OrderStatus::Pending {
        return Err(AppError::BadRequest("Order is not awaiting payment".into()));
    }

    let now = Utc::now();
    if !is_payable(
        order.status,
        order.payment_status,
        order.payment_method,
        order.created_at.with_timezone(&Utc),
        now,
        state.config.orders.expiry_minutes,
    ) {
        let mut active: OrderActive = order.into();
        active.status = Set(OrderStatus::Cancelled);
        active.updated_at = Set(now.into());
        let order = active.update(&txn).await?;
        txn.commit().await?;

        tracing::info!(order_id = %order.id, "order expired on payment retry");
        return Ok(ApiResponse::success(
            "Payment window elapsed",
            RetryPaymentResponse {
                order: Order::from(order),
                payment: PaymentDispatch::Expired {
                    message: "payment window elapsed".into(),
                },
            },
            Some(Meta::empty()),
        ));
    }
    txn.commit().await?;

    let payment = payment_service::dispatch(state, session_id, &order).await?;
    Ok(ApiResponse::success(
        "Payment started",
        RetryPaymentResponse {
            order: Order::from(order),
            payment,
        },
        Some(Meta::empty()),
    ))
}

pub async fn get_order(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<OrderWithItems>> {
    let order = Orders::find()
        .filter(
            Condition::all()
                .add(OrderCol::UserId.eq(user.user_id))
                .add(OrderCol::Id.eq(id)),
        )
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;

    let data = with_items(&state.orm, order).await?;
    Ok(ApiResponse::success("OK", data, Some(Meta::empty())))
}

pub async fn with_items<C: ConnectionTrait>(
    conn: &C,
    order: OrderModel,
) -> AppResult<OrderWithItems> {
    let items = OrderItems::find()
        .filter(OrderItemCol::OrderId.eq(order.id))
        .order_by_asc(OrderItemCol::CreatedAt)
        .all(conn)
        .await?
        .into_iter()
        .map(OrderItem::from)
        .collect();

    Ok(OrderWithItems {
        order: Order::from(order),
        items,
    })
}

async fn unique_order_number<C: ConnectionTrait>(conn: &C) -> AppResult<String> {
    for _ in 0..ORDER_NUMBER_ATTEMPTS {
        let candidate = generate_order_number();
        let taken = Orders::find()
            .filter(OrderCol::OrderNumber.eq(candidate.as_str()))
            .count(conn)
            .await?;
        if taken == 0 {
            return Ok(candidate);
        }
    }
    Err(AppError::Internal(anyhow::anyhow!(
        "could not allocate a unique order number"
    )))
}
