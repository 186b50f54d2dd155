//! Gateway dispatch and the callback that finalizes an online payment.
//!
//! Failure never cancels an order here: a pending order stays eligible for a
//! retry until the expiry sweep cancels it.

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, EntityTrait, QuerySelect, Set, TransactionTrait, sea_query::LockType,
};
use uuid::Uuid;

use crate::{
    audit,
    domain::order::OrderStatus,
    dto::payments::{CallbackQuery, PaymentDispatch, PaymentOutcome, PaymentOutcomeStatus},
    entity::orders::{ActiveModel as OrderActive, Entity as Orders, Model as OrderModel},
    error::{AppError, AppResult},
    gateway::PaymentRequest,
    response::{ApiResponse, Meta},
    session::{self, PendingPayment},
    state::AppState,
};

const STATUS_OK: &str = "OK";

/// Asks the gateway for a payment URL and remembers the authority in the
/// caller's session so the callback can match it.
pub async fn dispatch(
    state: &AppState,
    session_id: Uuid,
    order: &OrderModel,
) -> AppResult<PaymentDispatch> {
    let request = PaymentRequest {
        order_id: order.id,
        amount: order.get_final_price(),
        description: format!("پرداخت سفارش {}", order.order_number),
        callback_url: state.config.callback_url(),
    };

    match state.gateway.request_payment(&request).await {
        Ok(redirect) => {
            session::set_pending_payment(
                &state.pool,
                session_id,
                &PendingPayment {
                    authority: redirect.authority.clone(),
                    order_id: order.id,
                },
            )
            .await?;
            tracing::info!(
                order_id = %order.id,
                authority = %redirect.authority,
                "payment dispatched"
            );
            Ok(PaymentDispatch::Redirect {
                payment_url: redirect.payment_url,
                authority: redirect.authority,
            })
        }
        Err(err) => {
            tracing::warn!(order_id = %order.id, error = %err, "payment request failed");
            Ok(PaymentDispatch::Failed {
                message: err.user_message(),
            })
        }
    }
}

pub async fn handle_callback(
    state: &AppState,
    session_id: Option<Uuid>,
    query: CallbackQuery,
) -> AppResult<ApiResponse<PaymentOutcome>> {
    let outcome = verify_callback(state, session_id, query).await?;
    let message = outcome.message.clone();
    Ok(ApiResponse::success(message, outcome, Some(Meta::empty())))
}

async fn verify_callback(
    state: &AppState,
    session_id: Option<Uuid>,
    query: CallbackQuery,
) -> AppResult<PaymentOutcome> {
    // The stored keys are consumed before anything else so a replayed
    // callback cannot verify twice.
    let (session_user, pending) = match session_id {
        Some(id) => session::take_pending_payment(&state.pool, id).await?,
        None => (None, None),
    };

    let Some(pending) = pending else {
        tracing::info!("payment callback without a pending payment");
        return Ok(PaymentOutcome::cancelled(None));
    };

    let authority = query.authority.unwrap_or_default();
    if authority != pending.authority {
        tracing::warn!(
            order_id = %pending.order_id,
            authority = %authority,
            "payment callback authority mismatch"
        );
        return Ok(PaymentOutcome::cancelled(Some(pending.order_id)));
    }

    if query.status.as_deref() != Some(STATUS_OK) {
        tracing::info!(order_id = %pending.order_id, status = ?query.status, "payment cancelled by customer");
        return Ok(PaymentOutcome::cancelled(Some(pending.order_id)));
    }

    let order = Orders::find_by_id(pending.order_id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;
    if let Some(user_id) = session_user
        && user_id != order.user_id
    {
        return Err(AppError::NotFound);
    }

    if order.payment_status {
        return Ok(outcome_for(&order, PaymentOutcomeStatus::AlreadyPaid));
    }
    // A customer who returns late is still verified unless the sweep has
    // already cancelled the order.
    if order.status == OrderStatus::Cancelled {
        return Ok(PaymentOutcome {
            status: PaymentOutcomeStatus::Expired,
            order_id: Some(order.id),
            order_number: Some(order.order_number),
            ref_id: None,
            message: "payment window elapsed".to_string(),
        });
    }

    let verification = match state
        .gateway
        .verify_payment(&authority, order.get_final_price())
        .await
    {
        Ok(v) => v,
        Err(err) => {
            tracing::warn!(order_id = %order.id, error = %err, "payment verification failed");
            return Ok(PaymentOutcome {
                status: PaymentOutcomeStatus::Failed,
                order_id: Some(order.id),
                order_number: Some(order.order_number),
                ref_id: None,
                message: err.user_message(),
            });
        }
    };

    let (order, newly_paid) = mark_paid(state, order.id, verification.ref_id).await?;
    if newly_paid {
        audit::record(
            &state.pool,
            Some(order.user_id),
            "order_paid",
            "orders",
            serde_json::json!({
                "order_id": order.id,
                "ref_id": order.ref_id,
                "already_verified": verification.already_verified,
            }),
        )
        .await;
        Ok(outcome_for(&order, PaymentOutcomeStatus::Paid))
    } else {
        Ok(outcome_for(&order, PaymentOutcomeStatus::AlreadyPaid))
    }
}

/// Marks the order paid under a row lock. Returns `false` when another
/// request got there first; the order is left untouched in that case.
pub async fn mark_paid(
    state: &AppState,
    order_id: Uuid,
    ref_id: Option<i64>,
) -> AppResult<(OrderModel, bool)> {
    let txn = state.orm.begin().await?;

    let order = Orders::find_by_id(order_id)
        .lock(LockType::Update)
        .one(&txn)
        .await?
        .ok_or(AppError::NotFound)?;

    if order.payment_status {
        txn.commit().await?;
        return Ok((order, false));
    }

    let now = Utc::now();
    let mut active: OrderActive = order.into();
    active.payment_status = Set(true);
    active.status = Set(OrderStatus::Paid);
    active.ref_id = Set(ref_id);
    active.paid_at = Set(Some(now.into()));
    active.updated_at = Set(now.into());
    let order = active.update(&txn).await?;

    txn.commit().await?;
    tracing::info!(order_id = %order.id, ref_id = ?order.ref_id, "order paid");
    Ok((order, true))
}

fn outcome_for(order: &OrderModel, status: PaymentOutcomeStatus) -> PaymentOutcome {
    let message = match status {
        PaymentOutcomeStatus::AlreadyPaid => "order already paid",
        _ => "payment successful",
    };
    PaymentOutcome {
        status,
        order_id: Some(order.id),
        order_number: Some(order.order_number.clone()),
        ref_id: order.ref_id,
        message: message.to_string(),
    }
}
