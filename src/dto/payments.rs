use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

/// Query string the gateway appends when sending the customer back.
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct CallbackQuery {
    #[serde(rename = "Authority")]
    pub authority: Option<String>,
    #[serde(rename = "Status")]
    pub status: Option<String>,
}

/// Result of trying to hand an order to the gateway.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum PaymentDispatch {
    Redirect { payment_url: String, authority: String },
    /// Cash on delivery.
    NotRequired,
    Failed { message: String },
    Expired { message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum PaymentOutcomeStatus {
    Paid,
    AlreadyPaid,
    Cancelled,
    Failed,
    Expired,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct PaymentOutcome {
    pub status: PaymentOutcomeStatus,
    pub order_id: Option<Uuid>,
    pub order_number: Option<String>,
    pub ref_id: Option<i64>,
    pub message: String,
}

impl PaymentOutcome {
    pub fn cancelled(order_id: Option<Uuid>) -> Self {
        Self {
            status: PaymentOutcomeStatus::Cancelled,
            order_id,
            order_number: None,
            ref_id: None,
            message: "payment cancelled".to_string(),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(
            self.status,
            PaymentOutcomeStatus::Paid | PaymentOutcomeStatus::AlreadyPaid
        )
    }
}
