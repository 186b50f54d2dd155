use chrono::Utc;
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter, QueryOrder, QuerySelect};

use crate::{
    dto::dashboard::Dashboard,
    entity::{
        orders::{Column as OrderCol, Entity as Orders},
        products::{Column as ProdCol, Entity as Products},
    },
    error::AppResult,
    middleware::auth::AuthUser,
    models::Order,
    response::{ApiResponse, Meta},
    services::{order_service, product_service},
    state::AppState,
};

const POINTS_PER_ORDER: i64 = 10;
const RECENT_ORDERS: u64 = 5;
const RECOMMENDED_PRODUCTS: u64 = 8;

pub async fn summary(state: &AppState, user: &AuthUser) -> AppResult<ApiResponse<Dashboard>> {
    order_service::sweep_expired(state, Utc::now()).await?;

    let (orders_count, delivered_count, balance, favorites_count, addresses_count): (
        i64,
        i64,
        i64,
        i64,
        i64,
    ) = sqlx::query_as(
        r#"
        SELECT
            (SELECT COUNT(*) FROM orders WHERE user_id = $1),
            (SELECT COUNT(*) FROM orders WHERE user_id = $1 AND status = 'delivered'),
            (SELECT COALESCE(SUM(total_price), 0)::BIGINT FROM orders WHERE user_id = $1 AND payment_status),
            (SELECT COUNT(*) FROM favorites WHERE user_id = $1),
            (SELECT COUNT(*) FROM addresses WHERE user_id = $1)
        "#,
    )
    .bind(user.user_id)
    .fetch_one(&state.pool)
    .await?;

    let recent_orders = Orders::find()
        .filter(OrderCol::UserId.eq(user.user_id))
        .order_by_desc(OrderCol::CreatedAt)
        .limit(RECENT_ORDERS)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(Order::from)
        .collect();

    // Best sellers that can still be bought.
    let recommended = Products::find()
        .filter(ProdCol::Stock.gt(0))
        .order_by_desc(ProdCol::Sales)
        .order_by_desc(ProdCol::CreatedAt)
        .limit(RECOMMENDED_PRODUCTS)
        .all(&state.orm)
        .await?;
    let recommended_products = product_service::with_colors(&state.orm, recommended).await?;

    Ok(ApiResponse::success(
        "OK",
        Dashboard {
            orders_count,
            delivered_count,
            favorites_count,
            addresses_count,
            balance,
            points: orders_count * POINTS_PER_ORDER,
            recent_orders,
            recommended_products,
        },
        Some(Meta::empty()),
    ))
}
