use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::{get, post},
};
use uuid::Uuid;

use crate::{
    dto::orders::{CheckoutResponse, CreateOrderRequest, OrderList, OrderWithItems, RetryPaymentResponse},
    error::AppResult,
    middleware::auth::AuthUser,
    response::ApiResponse,
    routes::{WithSessionCookie, params::OrderListQuery, with_session_cookie},
    services::order_service,
    session::{self, MaybeSession},
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_orders).post(create_order))
        .route("/{id}", get(get_order))
        .route("/{id}/pay", post(retry_payment))
}

#[utoipa::path(
    get,
    path = "/api/orders",
    params(
        ("page" = Option<i64>, Query, description = "Page number, default 1"),
        ("per_page" = Option<i64>, Query, description = "Items per page, default 20"),
        ("status" = Option<String>, Query, description = "Filter by status"),
        ("payable" = Option<bool>, Query, description = "Only orders that can still be paid online"),
        ("sort_order" = Option<String>, Query, description = "Sort order: asc, desc")
    ),
    responses(
        (status = 200, description = "Orders of the current user; expired unpaid orders are cancelled first", body = ApiResponse<OrderList>)
    ),
    security(("bearer_auth" = [])),
    tag = "Orders"
)]
pub async fn list_orders(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<OrderListQuery>,
) -> AppResult<Json<ApiResponse<OrderList>>> {
    let resp = order_service::list_orders(&state, &user, query).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/orders",
    request_body = CreateOrderRequest,
    responses(
        (status = 200, description = "Create an order from the cart and start payment", body = ApiResponse<CheckoutResponse>),
        (status = 400, description = "Empty cart, unknown address or insufficient stock"),
    ),
    security(("bearer_auth" = [])),
    tag = "Orders"
)]
pub async fn create_order(
    State(state): State<AppState>,
    user: AuthUser,
    MaybeSession(presented): MaybeSession,
    Json(payload): Json<CreateOrderRequest>,
) -> AppResult<WithSessionCookie<CheckoutResponse>> {
    let session_id =
        session::resolve_for_user(&state.pool, presented, user.session_id, user.user_id).await?;
    let resp = order_service::checkout(&state, &user, session_id, payload).await?;
    Ok(with_session_cookie(session_id, resp))
}

#[utoipa::path(
    get,
    path = "/api/orders/{id}",
    params(("id" = Uuid, Path, description = "Order ID")),
    responses(
        (status = 200, description = "Order with items", body = ApiResponse<OrderWithItems>),
        (status = 404, description = "Not Found"),
    ),
    security(("bearer_auth" = [])),
    tag = "Orders"
)]
pub async fn get_order(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<OrderWithItems>>> {
    let resp = order_service::get_order(&state, &user, id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/orders/{id}/pay",
    params(("id" = Uuid, Path, description = "Order ID")),
    responses(
        (status = 200, description = "Start a new payment round for a pending order", body = ApiResponse<RetryPaymentResponse>),
        (status = 400, description = "Order is not payable"),
        (status = 404, description = "Not Found"),
    ),
    security(("bearer_auth" = [])),
    tag = "Orders"
)]
pub async fn retry_payment(
    State(state): State<AppState>,
    user: AuthUser,
    MaybeSession(presented): MaybeSession,
    Path(id): Path<Uuid>,
) -> AppResult<WithSessionCookie<RetryPaymentResponse>> {
    let session_id =
        session::resolve_for_user(&state.pool, presented, user.session_id, user.user_id).await?;
    let resp = order_service::retry_payment(&state, &user, session_id, id).await?;
    Ok(with_session_cookie(session_id, resp))
}
