use axum::{
    Json, Router,
    http::{HeaderName, header},
    routing::post,
};
use uuid::Uuid;

use crate::{response::ApiResponse, session::session_cookie, state::AppState};

pub mod addresses;
pub mod admin;
pub mod auth;
pub mod blog;
pub mod cart;
pub mod dashboard;
pub mod doc;
pub mod favorites;
pub mod health;
pub mod orders;
pub mod params;
pub mod payments;
pub mod products;

/// JSON body plus a `Set-Cookie` carrying the session id.
pub type WithSessionCookie<T> = ([(HeaderName, String); 1], Json<ApiResponse<T>>);

pub fn with_session_cookie<T>(session_id: Uuid, body: ApiResponse<T>) -> WithSessionCookie<T> {
    ([(header::SET_COOKIE, session_cookie(session_id))], Json(body))
}

// Build the API router without binding state; it will be provided at the top level.
pub fn create_api_router() -> Router<AppState> {
    Router::new()
        .route("/session", post(auth::open_session))
        .nest("/auth", auth::router())
        .nest("/products", products::router())
        .nest("/colors", products::color_router())
        .nest("/cart", cart::router())
        .nest("/orders", orders::router())
        .nest("/payments", payments::router())
        .nest("/addresses", addresses::router())
        .nest("/favorites", favorites::router())
        .nest("/dashboard", dashboard::router())
        .nest("/blog", blog::router())
        .nest(
            "/admin",
            admin::router()
                .merge(products::admin_router())
                .nest("/blog", blog::admin_router()),
        )
}
