use axum::{
    Json, Router,
    extract::{Path, State},
    routing::{get, patch},
};

use crate::{
    dto::cart::{AddToCartRequest, CartView, UpdateCartLineRequest},
    error::{AppError, AppResult},
    middleware::auth::MaybeAuthUser,
    response::ApiResponse,
    services::cart_service::{self, CartOwner},
    session::MaybeSession,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(cart_list).post(add_to_cart).delete(clear_cart),
        )
        .route("/{line}", patch(update_line).delete(remove_line))
}

/// Signed-in users work on their stored cart, guests on their session cart.
fn owner(user: MaybeAuthUser, session: MaybeSession) -> AppResult<CartOwner> {
    match (user.0, session.0) {
        (Some(user), _) => Ok(CartOwner::User(user.user_id)),
        (None, Some(session_id)) => Ok(CartOwner::Guest(session_id)),
        (None, None) => Err(AppError::BadRequest("Missing session".into())),
    }
}

#[utoipa::path(
    get,
    path = "/api/cart",
    responses(
        (status = 200, description = "Cart of the current user or guest session", body = ApiResponse<CartView>)
    ),
    security(("bearer_auth" = []), ()),
    tag = "Cart"
)]
pub async fn cart_list(
    State(state): State<AppState>,
    user: MaybeAuthUser,
    session: MaybeSession,
) -> AppResult<Json<ApiResponse<CartView>>> {
    let resp = cart_service::view_cart(&state, owner(user, session)?).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/cart",
    request_body = AddToCartRequest,
    responses(
        (status = 200, description = "Add a product (and color) to the cart", body = ApiResponse<CartView>),
        (status = 400, description = "Bad request or insufficient stock"),
    ),
    security(("bearer_auth" = []), ()),
    tag = "Cart"
)]
pub async fn add_to_cart(
    State(state): State<AppState>,
    user: MaybeAuthUser,
    session: MaybeSession,
    Json(payload): Json<AddToCartRequest>,
) -> AppResult<Json<ApiResponse<CartView>>> {
    let resp = cart_service::add_to_cart(&state, owner(user, session)?, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    patch,
    path = "/api/cart/{line}",
    params(
        ("line" = String, Path, description = "Cart item id, or `{product_id}_{color_id|none}` for guests")
    ),
    request_body = UpdateCartLineRequest,
    responses(
        (status = 200, description = "Set the quantity; 0 removes the line", body = ApiResponse<CartView>),
        (status = 400, description = "Insufficient stock"),
        (status = 404, description = "Cart line not found"),
    ),
    security(("bearer_auth" = []), ()),
    tag = "Cart"
)]
pub async fn update_line(
    State(state): State<AppState>,
    user: MaybeAuthUser,
    session: MaybeSession,
    Path(line): Path<String>,
    Json(payload): Json<UpdateCartLineRequest>,
) -> AppResult<Json<ApiResponse<CartView>>> {
    let resp = cart_service::update_line(&state, owner(user, session)?, &line, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    delete,
    path = "/api/cart/{line}",
    params(
        ("line" = String, Path, description = "Cart item id, or `{product_id}_{color_id|none}` for guests")
    ),
    responses(
        (status = 200, description = "OK", body = ApiResponse<CartView>),
        (status = 404, description = "Cart line not found"),
    ),
    security(("bearer_auth" = []), ()),
    tag = "Cart"
)]
pub async fn remove_line(
    State(state): State<AppState>,
    user: MaybeAuthUser,
    session: MaybeSession,
    Path(line): Path<String>,
) -> AppResult<Json<ApiResponse<CartView>>> {
    let resp = cart_service::remove_line(&state, owner(user, session)?, &line).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    delete,
    path = "/api/cart",
    responses(
        (status = 200, description = "Empty the cart", body = ApiResponse<CartView>),
    ),
    security(("bearer_auth" = []), ()),
    tag = "Cart"
)]
pub async fn clear_cart(
    State(state): State<AppState>,
    user: MaybeAuthUser,
    session: MaybeSession,
) -> AppResult<Json<ApiResponse<CartView>>> {
    let resp = cart_service::clear_cart(&state, owner(user, session)?).await?;
    Ok(Json(resp))
}
