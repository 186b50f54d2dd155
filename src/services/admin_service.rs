use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect, TransactionTrait,
    ActiveValue::Set,
    sea_query::LockType,
};
use uuid::Uuid;

use crate::{
    audit,
    domain::capabilities::{AdminEntity, capability_table, is_visible},
    dto::{
        admin::{
            CapabilityList, InventoryAdjustRequest, LowStockQuery, PhoneOtpList,
            UpdateOrderStatusRequest, UpdateSettingsRequest,
        },
        orders::{OrderList, OrderWithItems},
        products::ProductList,
    },
    entity::{
        orders::{ActiveModel as OrderActive, Column as OrderCol, Entity as Orders},
        phone_otps::{Column as OtpCol, Entity as PhoneOtps},
        products::{ActiveModel as ProductActive, Column as ProdCol, Entity as Products},
    },
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_admin},
    models::{Order, PhoneOtp, Product, SiteSettings},
    response::{ApiResponse, Meta},
    routes::params::{OrderListQuery, Pagination, SortOrder},
    services::{order_service, product_service, settings_service},
    state::AppState,
};

pub async fn list_all_orders(
    state: &AppState,
    user: &AuthUser,
    query: OrderListQuery,
) -> AppResult<ApiResponse<OrderList>> {
    ensure_admin(user)?;
    let now = Utc::now();
    order_service::sweep_expired(state, now).await?;

    let (page, limit, offset) = query.pagination().normalize();

    let mut condition = Condition::all();
    if let Some(status) = query.status {
        condition = condition.add(OrderCol::Status.eq(status));
    }
    if query.payable.unwrap_or(false) {
        condition = condition.add(order_service::payable_condition(state, now));
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
    Ok(ApiResponse::success("Orders", OrderList { items: orders }, Some(meta)))
}

pub async fn get_order_admin(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<OrderWithItems>> {
    ensure_admin(user)?;
    let order = Orders::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;

    let data = order_service::with_items(&state.orm, order).await?;
    Ok(ApiResponse::success("Order found", data, Some(Meta::empty())))
}

pub async fn update_order_status(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: UpdateOrderStatusRequest,
) -> AppResult<ApiResponse<Order>> {
    ensure_admin(user)?;

    let txn = state.orm.begin().await?;
    let existing = Orders::find_by_id(id)
        .lock(LockType::Update)
        .one(&txn)
        .await?
        .ok_or(AppError::NotFound)?;

    if !existing.status.can_admin_move_to(payload.status) {
        return Err(AppError::BadRequest(format!(
            "cannot move order from {} to {}",
            existing.status.as_str(),
            payload.status.as_str()
        )));
    }

    let previous = existing.status;
    let mut active: OrderActive = existing.into();
    active.status = Set(payload.status);
    active.updated_at = Set(Utc::now().into());
    let order = active.update(&txn).await?;
    txn.commit().await?;

    audit::record(
        &state.pool,
        Some(user.user_id),
        "order_status_update",
        "orders",
        serde_json::json!({
            "order_id": order.id,
            "from": previous.as_str(),
            "to": order.status.as_str(),
        }),
    )
    .await;

    Ok(ApiResponse::success(
        "Order updated",
        Order::from(order),
        Some(Meta::empty()),
    ))
}

pub async fn list_low_stock(
    state: &AppState,
    user: &AuthUser,
    query: LowStockQuery,
) -> AppResult<ApiResponse<ProductList>> {
    ensure_admin(user)?;
    let threshold = query.threshold.unwrap_or(5);
    let (page, limit, offset) = query.pagination().normalize();

    let finder = Products::find()
        .filter(ProdCol::Stock.lte(threshold))
        .order_by_asc(ProdCol::Stock)
        .order_by_desc(ProdCol::CreatedAt);

    let total = finder.clone().count(&state.orm).await? as i64;

    let models = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?;
    let items = product_service::with_colors(&state.orm, models).await?;

    let meta = Meta::new(page, limit, total);
    Ok(ApiResponse::success("Low stock", ProductList { items }, Some(meta)))
}

pub async fn adjust_inventory(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: InventoryAdjustRequest,
) -> AppResult<ApiResponse<Product>> {
    ensure_admin(user)?;
    if payload.delta == 0 {
        return Err(AppError::BadRequest("delta must not be 0".into()));
    }

    let txn = state.orm.begin().await?;
    let product = Products::find_by_id(id)
        .lock(LockType::Update)
        .one(&txn)
        .await?
        .ok_or(AppError::NotFound)?;

    let new_stock = apply_stock_delta(product.stock, payload.delta)?;

    let mut active: ProductActive = product.into();
    active.stock = Set(new_stock);
    let updated = active.update(&txn).await?;

    txn.commit().await?;

    audit::record(
        &state.pool,
        Some(user.user_id),
        "inventory_adjust",
        "products",
        serde_json::json!({ "product_id": updated.id, "delta": payload.delta }),
    )
    .await;

    let product = product_service::load_product(&state.orm, updated).await?;
    Ok(ApiResponse::success(
        "Inventory updated",
        product,
        Some(Meta::empty()),
    ))
}

/// Stock after adding `delta`; rejects results below zero or past `i32`.
pub fn apply_stock_delta(stock: i32, delta: i32) -> AppResult<i32> {
    match stock.checked_add(delta) {
        Some(value) if value >= 0 => Ok(value),
        Some(_) => Err(AppError::BadRequest("stock cannot be negative".into())),
        None => Err(AppError::BadRequest("stock adjustment out of range".into())),
    }
}

pub async fn get_settings(
    state: &AppState,
    user: &AuthUser,
) -> AppResult<ApiResponse<SiteSettings>> {
    ensure_admin(user)?;
    let settings = settings_service::load_settings(&state.pool).await?;
    Ok(ApiResponse::success("Settings", settings, Some(Meta::empty())))
}

pub async fn create_settings(
    state: &AppState,
    user: &AuthUser,
    payload: UpdateSettingsRequest,
) -> AppResult<ApiResponse<SiteSettings>> {
    ensure_admin(user)?;
    let settings = settings_service::create_settings(&state.pool, payload).await?;
    Ok(ApiResponse::success("Settings created", settings, Some(Meta::empty())))
}

pub async fn update_settings(
    state: &AppState,
    user: &AuthUser,
    payload: UpdateSettingsRequest,
) -> AppResult<ApiResponse<SiteSettings>> {
    ensure_admin(user)?;
    let settings = settings_service::update_settings(&state.pool, payload).await?;

    audit::record(
        &state.pool,
        Some(user.user_id),
        "settings_update",
        "site_settings",
        serde_json::json!({ "show_hidden_models": settings.show_hidden_models }),
    )
    .await;

    Ok(ApiResponse::success("Settings updated", settings, Some(Meta::empty())))
}

/// Which admin entities are listed, recomputed from the settings row.
pub async fn list_capabilities(
    state: &AppState,
    user: &AuthUser,
) -> AppResult<ApiResponse<CapabilityList>> {
    ensure_admin(user)?;
    let settings = settings_service::load_settings(&state.pool).await?;
    Ok(ApiResponse::success(
        "Capabilities",
        CapabilityList {
            show_hidden_models: settings.show_hidden_models,
            items: capability_table(settings.show_hidden_models),
        },
        Some(Meta::empty()),
    ))
}

/// Hidden entity: answers 404 unless advanced mode is on.
pub async fn list_phone_otps(
    state: &AppState,
    user: &AuthUser,
    pagination: Pagination,
) -> AppResult<ApiResponse<PhoneOtpList>> {
    ensure_admin(user)?;
    let settings = settings_service::load_settings(&state.pool).await?;
    if !is_visible(AdminEntity::PhoneOtps, settings.show_hidden_models) {
        return Err(AppError::NotFound);
    }

    let (page, limit, offset) = pagination.normalize();
    let finder = PhoneOtps::find().order_by_desc(OtpCol::CreatedAt);
    let total = finder.clone().count(&state.orm).await? as i64;
    let items = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(PhoneOtp::from)
        .collect();

    Ok(ApiResponse::success(
        "Phone OTPs",
        PhoneOtpList { items },
        Some(Meta::new(page, limit, total)),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stock_delta_applies_within_range() {
        assert_eq!(apply_stock_delta(5, 3).unwrap(), 8);
        assert_eq!(apply_stock_delta(5, -5).unwrap(), 0);
    }

    #[test]
    fn stock_delta_rejects_negative_result() {
        assert!(matches!(apply_stock_delta(2, -3), Err(AppError::BadRequest(_))));
    }

    #[test]
    fn stock_delta_rejects_overflow() {
        assert!(matches!(apply_stock_delta(1, i32::MAX), Err(AppError::BadRequest(_))));
        assert!(matches!(apply_stock_delta(-1, i32::MIN), Err(AppError::BadRequest(_))));
    }
}
