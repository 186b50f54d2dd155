//! Zarinpal payment gateway client.
//!
//! The HTTP contract: `POST {api_base}/payment/request.json` returns an
//! authority token for a redirect to `{start_pay_base}/StartPay/{authority}`,
//! and `POST {api_base}/payment/verify.json` confirms the transaction after
//! the customer comes back. Code 100 is success; on verify, 101 means the
//! payment was already verified and is treated as success too.

use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use serde_json::{Value, json};
use thiserror::Error;
use uuid::Uuid;

use crate::config::GatewayConfig;

pub const CODE_SUCCESS: i64 = 100;
pub const CODE_ALREADY_VERIFIED: i64 = 101;

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("Merchant ID is not configured")]
    NotConfigured,

    #[error("Error connecting to payment gateway: {0}")]
    Connectivity(String),

    #[error("{message}")]
    Rejected { code: Option<i64>, message: String },
}

impl GatewayError {
    /// Text safe to show the customer.
    pub fn user_message(&self) -> String {
        match self {
            GatewayError::NotConfigured | GatewayError::Connectivity(_) => {
                "could not reach payment gateway".to_string()
            }
            GatewayError::Rejected { message, .. } => message.clone(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct PaymentRequest {
    pub order_id: Uuid,
    pub amount: i64,
    pub description: String,
    pub callback_url: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentRedirect {
    pub authority: String,
    pub payment_url: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Verification {
    pub ref_id: Option<i64>,
    pub already_verified: bool,
}

#[async_trait]
pub trait PaymentGateway: Send + Sync {
    async fn request_payment(
        &self,
        request: &PaymentRequest,
    ) -> Result<PaymentRedirect, GatewayError>;

    async fn verify_payment(
        &self,
        authority: &str,
        amount: i64,
    ) -> Result<Verification, GatewayError>;
}

#[derive(Debug, Clone)]
pub struct ZarinpalGateway {
    client: reqwest::Client,
    merchant_id: Option<String>,
    api_base: String,
    start_pay_base: String,
}

#[derive(Serialize)]
struct RequestPayload<'a> {
    merchant_id: &'a str,
    amount: i64,
    description: &'a str,
    callback_url: &'a str,
    metadata: Value,
}

#[derive(Serialize)]
struct VerifyPayload<'a> {
    merchant_id: &'a str,
    amount: i64,
    authority: &'a str,
}

impl ZarinpalGateway {
    pub fn new(config: &GatewayConfig) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self {
            client,
            merchant_id: config.merchant_id.clone(),
            api_base: config.api_base.trim_end_matches('/').to_string(),
            start_pay_base: config.start_pay_base.trim_end_matches('/').to_string(),
        })
    }

    pub fn start_pay_url(&self, authority: &str) -> String {
        format!("{}/StartPay/{}", self.start_pay_base, authority)
    }

    fn merchant_id(&self) -> Result<&str, GatewayError> {
        self.merchant_id
            .as_deref()
            .ok_or(GatewayError::NotConfigured)
    }

    async fn post_json<T: Serialize + ?Sized>(
        &self,
        path: &str,
        payload: &T,
    ) -> Result<Value, GatewayError> {
        let url = format!("{}/{}", self.api_base, path);
        let response = self
            .client
            .post(&url)
            .json(payload)
            .send()
            .await
            .map_err(|e| GatewayError::Connectivity(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(GatewayError::Connectivity(status.as_u16().to_string()));
        }

        response
            .json::<Value>()
            .await
            .map_err(|e| GatewayError::Connectivity(e.to_string()))
    }
}

#[async_trait]
impl PaymentGateway for ZarinpalGateway {
    #[tracing::instrument(skip(self, request), fields(order_id = %request.order_id, amount = request.amount))]
    async fn request_payment(
        &self,
        request: &PaymentRequest,
    ) -> Result<PaymentRedirect, GatewayError> {
        let merchant_id = self.merchant_id()?;
        let payload = RequestPayload {
            merchant_id,
            amount: request.amount,
            description: &request.description,
            callback_url: &request.callback_url,
            metadata: json!({ "order_id": request.order_id }),
        };

        let body = self.post_json("payment/request.json", &payload).await?;
        let data = body.get("data");
        let code = data.and_then(|d| d.get("code")).and_then(Value::as_i64);
        let authority = data
            .and_then(|d| d.get("authority"))
            .and_then(Value::as_str);

        match (code, authority) {
            (Some(CODE_SUCCESS), Some(authority)) => {
                tracing::debug!(authority, "payment request accepted");
                Ok(PaymentRedirect {
                    authority: authority.to_string(),
                    payment_url: self.start_pay_url(authority),
                })
            }
            _ => Err(rejection(&body, "Error creating payment request")),
        }
    }

    #[tracing::instrument(skip(self))]
    async fn verify_payment(
        &self,
        authority: &str,
        amount: i64,
    ) -> Result<Verification, GatewayError> {
        let merchant_id = self.merchant_id()?;
        let payload = VerifyPayload {
            merchant_id,
            amount,
            authority,
        };

        let body = self.post_json("payment/verify.json", &payload).await?;
        let data = body.get("data");
        let code = data.and_then(|d| d.get("code")).and_then(Value::as_i64);
        let ref_id = data.and_then(|d| d.get("ref_id")).and_then(Value::as_i64);

        match code {
            Some(CODE_SUCCESS) => Ok(Verification {
                ref_id,
                already_verified: false,
            }),
            Some(CODE_ALREADY_VERIFIED) => Ok(Verification {
                ref_id,
                already_verified: true,
            }),
            _ => Err(rejection(&body, "Payment failed")),
        }
    }
}

/// Failure bodies carry the reason either under `data` or under `errors`.
fn rejection(body: &Value, fallback: &str) -> GatewayError {
    let data = body.get("data");
    let errors = body.get("errors");
    let code = data
        .and_then(|d| d.get("code"))
        .or_else(|| errors.and_then(|e| e.get("code")))
        .and_then(Value::as_i64);
    let message = data
        .and_then(|d| d.get("message"))
        .or_else(|| errors.and_then(|e| e.get("message")))
        .and_then(Value::as_str)
        .unwrap_or(fallback)
        .to_string();
    GatewayError::Rejected { code, message }
}
