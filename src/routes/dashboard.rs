use axum::{Json, Router, extract::State, routing::get};

use crate::{
    dto::dashboard::Dashboard, error::AppResult, middleware::auth::AuthUser,
    response::ApiResponse, services::dashboard_service, state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new().route("/", get(dashboard))
}

#[utoipa::path(
    get,
    path = "/api/dashboard",
    responses(
        (status = 200, description = "Account summary", body = ApiResponse<Dashboard>)
    ),
    security(("bearer_auth" = [])),
    tag = "Dashboard"
)]
pub async fn dashboard(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<ApiResponse<Dashboard>>> {
    let resp = dashboard_service::summary(&state, &user).await?;
    Ok(Json(resp))
}
