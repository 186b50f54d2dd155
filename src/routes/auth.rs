use axum::{Json, Router, extract::State, routing::post};

use crate::{
    dto::auth::{LoginRequest, LoginResponse, OtpIssued, OtpRequest, OtpVerifyRequest, SessionResponse},
    error::AppResult,
    response::ApiResponse,
    routes::{WithSessionCookie, with_session_cookie},
    services::auth_service,
    session::MaybeSession,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/otp/request", post(request_otp))
        .route("/otp/verify", post(verify_otp))
        .route("/login", post(login))
}

#[utoipa::path(
    post,
    path = "/api/session",
    responses(
        (status = 200, description = "Open a guest session; also sets the `sid` cookie", body = ApiResponse<SessionResponse>)
    ),
    tag = "Auth"
)]
pub async fn open_session(
    State(state): State<AppState>,
) -> AppResult<WithSessionCookie<SessionResponse>> {
    let resp = auth_service::open_session(&state).await?;
    let session_id = resp
        .data
        .as_ref()
        .map(|d| d.session_id)
        .unwrap_or_default();
    Ok(with_session_cookie(session_id, resp))
}

#[utoipa::path(
    post,
    path = "/api/auth/otp/request",
    request_body = OtpRequest,
    responses(
        (status = 200, description = "Send a one-time code by SMS", body = ApiResponse<OtpIssued>),
        (status = 400, description = "Invalid phone number"),
        (status = 429, description = "Too many codes requested")
    ),
    tag = "Auth"
)]
pub async fn request_otp(
    State(state): State<AppState>,
    Json(payload): Json<OtpRequest>,
) -> AppResult<Json<ApiResponse<OtpIssued>>> {
    let resp = auth_service::request_otp(&state, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/auth/otp/verify",
    request_body = OtpVerifyRequest,
    responses(
        (status = 200, description = "Sign in or sign up with the code; merges the guest cart", body = ApiResponse<LoginResponse>),
        (status = 400, description = "Invalid or expired code")
    ),
    tag = "Auth"
)]
pub async fn verify_otp(
    State(state): State<AppState>,
    MaybeSession(session_id): MaybeSession,
    Json(payload): Json<OtpVerifyRequest>,
) -> AppResult<WithSessionCookie<LoginResponse>> {
    let resp = auth_service::verify_otp(&state, session_id, payload).await?;
    Ok(login_response(resp))
}

#[utoipa::path(
    post,
    path = "/api/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Sign in with phone and password", body = ApiResponse<LoginResponse>),
        (status = 400, description = "Invalid credentials")
    ),
    tag = "Auth"
)]
pub async fn login(
    State(state): State<AppState>,
    MaybeSession(session_id): MaybeSession,
    Json(payload): Json<LoginRequest>,
) -> AppResult<WithSessionCookie<LoginResponse>> {
    let resp = auth_service::login_with_password(&state, session_id, payload).await?;
    Ok(login_response(resp))
}

fn login_response(resp: ApiResponse<LoginResponse>) -> WithSessionCookie<LoginResponse> {
    let session_id = resp
        .data
        .as_ref()
        .map(|d| d.session_id)
        .unwrap_or_default();
    with_session_cookie(session_id, resp)
}
