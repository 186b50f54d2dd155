//! Server-side sessions stored in the `sessions` table.
//!
//! A session carries the guest cart and, while an online payment is in
//! flight, the gateway authority token plus the order it belongs to. Clients
//! present the session id in the `sid` cookie (browsers, including the
//! gateway redirect) or the `x-session-id` header (API clients).

use axum::{
    extract::FromRequestParts,
    http::{HeaderMap, header, request::Parts},
};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use uuid::Uuid;

use crate::{
    db::DbPool,
    domain::cart::SessionCart,
    error::{AppError, AppResult},
};

pub const SESSION_COOKIE: &str = "sid";
pub const SESSION_HEADER: &str = "x-session-id";

#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct SessionData {
    #[serde(default)]
    pub cart: SessionCart,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payment: Option<PendingPayment>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingPayment {
    pub authority: String,
    pub order_id: Uuid,
}

#[derive(Debug, Clone)]
pub struct SessionRecord {
    pub id: Uuid,
    pub user_id: Option<Uuid>,
    pub data: SessionData,
}

pub async fn create_session(pool: &DbPool, user_id: Option<Uuid>) -> AppResult<Uuid> {
    let (id,): (Uuid,) =
        sqlx::query_as("INSERT INTO sessions (user_id, data) VALUES ($1, $2) RETURNING id")
            .bind(user_id)
            .bind(Json(SessionData::default()))
            .fetch_one(pool)
            .await?;
    Ok(id)
}

pub async fn load_session(pool: &DbPool, id: Uuid) -> AppResult<Option<SessionRecord>> {
    let row: Option<(Uuid, Option<Uuid>, Json<SessionData>)> =
        sqlx::query_as("SELECT id, user_id, data FROM sessions WHERE id = $1")
            .bind(id)
            .fetch_optional(pool)
            .await?;
    Ok(row.map(|(id, user_id, data)| SessionRecord {
        id,
        user_id,
        data: data.0,
    }))
}

pub async fn bind_user(pool: &DbPool, id: Uuid, user_id: Uuid) -> AppResult<()> {
    sqlx::query("UPDATE sessions SET user_id = $2, updated_at = NOW() WHERE id = $1")
        .bind(id)
        .bind(user_id)
        .execute(pool)
        .await?;
    Ok(())
}

pub async fn load_cart(pool: &DbPool, id: Uuid) -> AppResult<SessionCart> {
    let session = load_session(pool, id).await?.ok_or(AppError::Unauthorized)?;
    Ok(session.data.cart)
}

pub async fn save_cart(pool: &DbPool, id: Uuid, cart: &SessionCart) -> AppResult<()> {
    let result = sqlx::query(
        "UPDATE sessions SET data = jsonb_set(data, '{cart}', $2), updated_at = NOW() WHERE id = $1",
    )
    .bind(id)
    .bind(Json(cart))
    .execute(pool)
    .await?;
    if result.rows_affected() == 0 {
        return Err(AppError::Unauthorized);
    }
    Ok(())
}

pub async fn set_pending_payment(
    pool: &DbPool,
    id: Uuid,
    payment: &PendingPayment,
) -> AppResult<()> {
    sqlx::query(
        "UPDATE sessions SET data = jsonb_set(data, '{payment}', $2), updated_at = NOW() WHERE id = $1",
    )
    .bind(id)
    .bind(Json(payment))
    .execute(pool)
    .await?;
    Ok(())
}

/// Removes the pending payment keys and returns what was stored, in one
/// statement, so a replayed callback finds nothing.
pub async fn take_pending_payment(
    pool: &DbPool,
    id: Uuid,
) -> AppResult<(Option<Uuid>, Option<PendingPayment>)> {
    let row: Option<(Option<Uuid>, Option<Json<PendingPayment>>)> = sqlx::query_as(
        r#"
        WITH previous AS (
            SELECT id, data -> 'payment' AS payment
            FROM sessions
            WHERE id = $1
            FOR UPDATE
        )
        UPDATE sessions s
        SET data = s.data - 'payment', updated_at = NOW()
        FROM previous
        WHERE s.id = previous.id
        RETURNING s.user_id, previous.payment
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;

    Ok(match row {
        Some((user_id, payment)) => (user_id, payment.map(|p| p.0)),
        None => (None, None),
    })
}

/// Session a signed-in request should use: the one the client presented if
/// it belongs to them, then the one in their token, else a fresh one.
pub async fn resolve_for_user(
    pool: &DbPool,
    presented: Option<Uuid>,
    token_session: Option<Uuid>,
    user_id: Uuid,
) -> AppResult<Uuid> {
    for candidate in [presented, token_session].into_iter().flatten() {
        if let Some(record) = load_session(pool, candidate).await? {
            match record.user_id {
                Some(owner) if owner == user_id => return Ok(record.id),
                None => {
                    bind_user(pool, record.id, user_id).await?;
                    return Ok(record.id);
                }
                Some(_) => {}
            }
        }
    }
    create_session(pool, Some(user_id)).await
}

pub fn session_cookie(id: Uuid) -> String {
    format!("{SESSION_COOKIE}={id}; Path=/; HttpOnly; SameSite=Lax")
}

pub fn session_id_from_headers(headers: &HeaderMap) -> Option<Uuid> {
    if let Some(id) = headers
        .get(SESSION_HEADER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| Uuid::parse_str(v.trim()).ok())
    {
        return Some(id);
    }

    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == SESSION_COOKIE)
        .and_then(|(_, value)| Uuid::parse_str(value.trim()).ok())
}

/// Session id if the client sent one.
#[derive(Debug, Clone, Copy)]
pub struct MaybeSession(pub Option<Uuid>);

impl<S> FromRequestParts<S> for MaybeSession
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(MaybeSession(session_id_from_headers(&parts.headers)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn reads_session_from_cookie_or_header() {
        let id = Uuid::new_v4();

        let mut headers = HeaderMap::new();
        headers.insert(
            header::COOKIE,
            HeaderValue::from_str(&format!("theme=dark; sid={id}; lang=fa")).unwrap(),
        );
        assert_eq!(session_id_from_headers(&headers), Some(id));

        let other = Uuid::new_v4();
        headers.insert(SESSION_HEADER, HeaderValue::from_str(&other.to_string()).unwrap());
        assert_eq!(session_id_from_headers(&headers), Some(other));

        assert_eq!(session_id_from_headers(&HeaderMap::new()), None);
    }
}
