use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SmsError {
    #[error("SMS delivery failed: {0}")]
    Delivery(String),
}

/// Delivery seam for one-time passwords. The SMS provider itself lives
/// outside this service.
#[async_trait]
pub trait SmsSender: Send + Sync {
    async fn send_otp(&self, phone: &str, code: &str) -> Result<(), SmsError>;
}

/// Writes the message to the log instead of sending it.
#[derive(Debug, Default, Clone)]
pub struct LogSmsSender;

#[async_trait]
impl SmsSender for LogSmsSender {
    async fn send_otp(&self, phone: &str, code: &str) -> Result<(), SmsError> {
        tracing::info!(phone, "otp issued");
        tracing::debug!(phone, code, "otp message: کد تایید شما: {code} دیجیتو");
        Ok(())
    }
}
