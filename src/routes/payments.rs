use axum::{
    Json, Router,
    extract::{Query, State},
    routing::get,
};

use crate::{
    dto::payments::{CallbackQuery, PaymentOutcome},
    error::AppResult,
    response::ApiResponse,
    services::payment_service,
    session::MaybeSession,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new().route("/callback", get(payment_callback))
}

#[utoipa::path(
    get,
    path = "/api/payments/callback",
    params(CallbackQuery),
    responses(
        (status = 200, description = "Outcome of the gateway round trip", body = ApiResponse<PaymentOutcome>),
        (status = 404, description = "Order not found"),
    ),
    tag = "Payments"
)]
pub async fn payment_callback(
    State(state): State<AppState>,
    MaybeSession(session_id): MaybeSession,
    Query(query): Query<CallbackQuery>,
) -> AppResult<Json<ApiResponse<PaymentOutcome>>> {
    let resp = payment_service::handle_callback(&state, session_id, query).await?;
    Ok(Json(resp))
}
