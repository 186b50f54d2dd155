use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::models::User;

#[derive(Deserialize, Debug, ToSchema)]
pub struct OtpRequest {
    pub phone: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OtpIssued {
    pub phone: String,
    pub expires_at: DateTime<Utc>,
    /// Only present when code echo is enabled for development.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
}

#[derive(Deserialize, Debug, ToSchema)]
pub struct OtpVerifyRequest {
    pub phone: String,
    pub code: String,
}

#[derive(Deserialize, Debug, ToSchema)]
pub struct LoginRequest {
    pub phone: String,
    pub password: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct LoginResponse {
    pub token: String,
    pub token_type: String,
    pub session_id: Uuid,
    pub is_new_user: bool,
    pub user: User,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SessionResponse {
    pub session_id: Uuid,
}

#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct Claims {
    pub sub: String,
    pub role: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sid: Option<String>,
    pub exp: usize,
}
