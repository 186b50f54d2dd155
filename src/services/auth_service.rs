use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordVerifier},
};
use chrono::{Duration, Utc};
use jsonwebtoken::{EncodingKey, Header, encode};
use password_hash::rand_core::{OsRng, RngCore};
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter};
use uuid::Uuid;

use crate::{
    audit,
    config::AppConfig,
    dto::auth::{
        Claims, LoginRequest, LoginResponse, OtpIssued, OtpRequest, OtpVerifyRequest,
        SessionResponse,
    },
    entity::users::{Column as UserCol, Entity as Users},
    error::{AppError, AppResult},
    models::User,
    response::{ApiResponse, Meta},
    services::cart_service,
    session,
    state::AppState,
};

const TOKEN_TTL_HOURS: i64 = 24;

/// Opens an anonymous session that can hold a guest cart.
pub async fn open_session(state: &AppState) -> AppResult<ApiResponse<SessionResponse>> {
    let session_id = session::create_session(&state.pool, None).await?;
    Ok(ApiResponse::success(
        "Session created",
        SessionResponse { session_id },
        Some(Meta::empty()),
    ))
}

pub async fn request_otp(
    state: &AppState,
    payload: OtpRequest,
) -> AppResult<ApiResponse<OtpIssued>> {
    let phone = normalize_phone(&payload.phone)?;
    let limits = &state.config.otp;

    let (last_hour, last_day): (i64, i64) = sqlx::query_as(
        r#"
        SELECT COUNT(*) FILTER (WHERE created_at > NOW() - INTERVAL '1 hour'),
               COUNT(*) FILTER (WHERE created_at > NOW() - INTERVAL '1 day')
        FROM phone_otps
        WHERE phone_number = $1
        "#,
    )
    .bind(&phone)
    .fetch_one(&state.pool)
    .await?;

    if last_hour >= limits.max_per_hour {
        return Err(AppError::TooManyRequests(
            "too many codes requested in the last hour".into(),
        ));
    }
    if last_day >= limits.max_per_day {
        return Err(AppError::TooManyRequests(
            "too many codes requested today".into(),
        ));
    }

    let code = generate_otp_code();
    let expires_at = Utc::now() + Duration::minutes(limits.expiry_minutes);
    let (otp_id,): (Uuid,) = sqlx::query_as(
        "INSERT INTO phone_otps (phone_number, code, expires_at) VALUES ($1, $2, $3) RETURNING id",
    )
    .bind(&phone)
    .bind(&code)
    .bind(expires_at)
    .fetch_one(&state.pool)
    .await?;

    if let Err(err) = state.sms.send_otp(&phone, &code).await {
        tracing::warn!(error = %err, phone = %phone, "otp delivery failed");
        sqlx::query("DELETE FROM phone_otps WHERE id = $1")
            .bind(otp_id)
            .execute(&state.pool)
            .await?;
        return Err(AppError::Internal(anyhow::anyhow!(
            "failed to send verification code"
        )));
    }

    Ok(ApiResponse::success(
        "Verification code sent",
        OtpIssued {
            phone,
            expires_at,
            code: limits.echo.then_some(code),
        },
        Some(Meta::empty()),
    ))
}

pub async fn verify_otp(
    state: &AppState,
    session_id: Option<Uuid>,
    payload: OtpVerifyRequest,
) -> AppResult<ApiResponse<LoginResponse>> {
    let phone = normalize_phone(&payload.phone)?;
    let code = to_ascii_digits(payload.code.trim());

    let matched: Option<(Uuid,)> = sqlx::query_as(
        r#"
        SELECT id FROM phone_otps
        WHERE phone_number = $1 AND code = $2 AND expires_at > NOW()
        ORDER BY created_at DESC
        LIMIT 1
        "#,
    )
    .bind(&phone)
    .bind(&code)
    .fetch_optional(&state.pool)
    .await?;
    if matched.is_none() {
        return Err(AppError::BadRequest("invalid or expired code".into()));
    }

    sqlx::query("DELETE FROM phone_otps WHERE phone_number = $1")
        .bind(&phone)
        .execute(&state.pool)
        .await?;

    let created: Option<User> = sqlx::query_as(
        r#"
        INSERT INTO users (phone) VALUES ($1)
        ON CONFLICT (phone) DO NOTHING
        RETURNING id, phone, fullname, role, is_active, created_at
        "#,
    )
    .bind(&phone)
    .fetch_optional(&state.pool)
    .await?;

    let (user, is_new_user) = match created {
        Some(user) => (user, true),
        None => {
            let user: User = sqlx::query_as(
                "SELECT id, phone, fullname, role, is_active, created_at FROM users WHERE phone = $1",
            )
            .bind(&phone)
            .fetch_one(&state.pool)
            .await?;
            (user, false)
        }
    };

    let resp = finish_login(state, session_id, user, is_new_user).await?;
    Ok(ApiResponse::success("Logged in", resp, Some(Meta::empty())))
}

pub async fn login_with_password(
    state: &AppState,
    session_id: Option<Uuid>,
    payload: LoginRequest,
) -> AppResult<ApiResponse<LoginResponse>> {
    let phone = normalize_phone(&payload.phone)?;
    let account = Users::find()
        .filter(UserCol::Phone.eq(phone.as_str()))
        .one(&state.orm)
        .await?
        .ok_or_else(|| AppError::BadRequest("Invalid phone or password".into()))?;

    let stored_hash = account
        .password_hash
        .as_deref()
        .ok_or_else(|| AppError::BadRequest("Invalid phone or password".into()))?;
    let parsed_hash = PasswordHash::new(stored_hash)
        .map_err(|_| AppError::Internal(anyhow::anyhow!("Invalid password hash")))?;

    if Argon2::default()
        .verify_password(payload.password.as_bytes(), &parsed_hash)
        .is_err()
    {
        return Err(AppError::BadRequest("Invalid phone or password".into()));
    }

    let user = User {
        id: account.id,
        phone: account.phone,
        fullname: account.fullname,
        role: account.role,
        is_active: account.is_active,
        created_at: account.created_at.with_timezone(&Utc),
    };
    let resp = finish_login(state, session_id, user, false).await?;
    Ok(ApiResponse::success("Logged in", resp, Some(Meta::empty())))
}

/// Binds the session to the user, folds the guest cart into the stored one
/// and issues the token.
async fn finish_login(
    state: &AppState,
    session_id: Option<Uuid>,
    user: User,
    is_new_user: bool,
) -> AppResult<LoginResponse> {
    if !user.is_active {
        return Err(AppError::Forbidden);
    }

    let existing = match session_id {
        Some(id) => session::load_session(&state.pool, id).await?,
        None => None,
    };
    let session_id = match existing {
        Some(record) => {
            session::bind_user(&state.pool, record.id, user.id).await?;
            cart_service::merge_session_cart(&state.pool, record.id, user.id).await?;
            record.id
        }
        None => session::create_session(&state.pool, Some(user.id)).await?,
    };

    let token = issue_token(&state.config, user.id, &user.role, session_id)?;

    audit::record(
        &state.pool,
        Some(user.id),
        "user_login",
        "users",
        serde_json::json!({ "user_id": user.id, "is_new_user": is_new_user }),
    )
    .await;

    Ok(LoginResponse {
        token,
        token_type: "Bearer".to_string(),
        session_id,
        is_new_user,
        user,
    })
}

pub fn issue_token(
    config: &AppConfig,
    user_id: Uuid,
    role: &str,
    session_id: Uuid,
) -> AppResult<String> {
    let expiration = Utc::now()
        .checked_add_signed(Duration::hours(TOKEN_TTL_HOURS))
        .ok_or_else(|| AppError::Internal(anyhow::anyhow!("Failed to set expiration")))?;

    let claims = Claims {
        sub: user_id.to_string(),
        role: role.to_string(),
        sid: Some(session_id.to_string()),
        exp: expiration.timestamp() as usize,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(config.jwt_secret.as_bytes()),
    )
    .map_err(|e| AppError::Internal(anyhow::anyhow!(e.to_string())))
}

fn generate_otp_code() -> String {
    format!("{:06}", OsRng.next_u32() % 1_000_000)
}

/// Persian and Arabic-Indic digits become ASCII.
fn to_ascii_digits(value: &str) -> String {
    value
        .chars()
        .map(|c| match c {
            '\u{06F0}'..='\u{06F9}' => char::from(b'0' + (c as u32 - 0x06F0) as u8),
            '\u{0660}'..='\u{0669}' => char::from(b'0' + (c as u32 - 0x0660) as u8),
            other => other,
        })
        .collect()
}

/// Iranian mobile numbers in the `09xxxxxxxxx` form. `+98` and `98`
/// prefixes are accepted.
pub fn normalize_phone(raw: &str) -> AppResult<String> {
    let digits: String = to_ascii_digits(raw)
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '-')
        .collect();
    let digits = digits.strip_prefix('+').unwrap_or(&digits);
    let local = match digits.strip_prefix("98") {
        Some(rest) if rest.len() == 10 => format!("0{rest}"),
        _ => digits.to_string(),
    };

    let valid = local.len() == 11
        && local.starts_with("09")
        && local.chars().all(|c| c.is_ascii_digit());
    if !valid {
        return Err(AppError::BadRequest("invalid phone number".into()));
    }
    Ok(local)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn phone_numbers_are_normalized() {
        assert_eq!(normalize_phone("09121234567").unwrap(), "09121234567");
        assert_eq!(normalize_phone("+989121234567").unwrap(), "09121234567");
        assert_eq!(normalize_phone("۰۹۱۲ ۱۲۳ ۴۵۶۷").unwrap(), "09121234567");
        assert!(normalize_phone("0212345678").is_err());
        assert!(normalize_phone("0912abc4567").is_err());
    }

    #[test]
    fn otp_codes_have_six_digits() {
        for _ in 0..20 {
            let code = generate_otp_code();
            assert_eq!(code.len(), 6);
            assert!(code.chars().all(|c| c.is_ascii_digit()));
        }
    }

    #[test]
    fn token_carries_session() {
        let config = AppConfig {
            database_url: String::new(),
            host: "127.0.0.1".into(),
            port: 3000,
            jwt_secret: "secret".into(),
            public_base_url: "http://localhost:3000".into(),
            gateway: crate::config::GatewayConfig {
                merchant_id: None,
                api_base: String::new(),
                start_pay_base: String::new(),
                timeout_secs: 10,
            },
            orders: Default::default(),
            otp: Default::default(),
        };
        let user_id = Uuid::new_v4();
        let session_id = Uuid::new_v4();
        let token = issue_token(&config, user_id, crate::middleware::auth::ROLE_USER, session_id).unwrap();
        let user = crate::middleware::auth::decode_token(&token, "secret").unwrap();
        assert_eq!(user.user_id, user_id);
        assert_eq!(user.session_id, Some(session_id));
        assert!(crate::middleware::auth::decode_token(&token, "other").is_err());
    }
}
