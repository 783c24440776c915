use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::db_types::Money;

/// A payment provider that can return captured payments.
#[allow(async_fn_in_trait)]
pub trait PaymentGateway {
    /// Refunds `amount` of the captured payment `payment_id`.
    async fn refund(&self, payment_id: &str, amount: Money) -> Result<RefundReceipt, GatewayError>;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefundReceipt {
    pub refund_id: String,
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum GatewayError {
    #[error("The gateway declined the refund: {0}")]
    Declined(String),
    #[error("Could not reach the gateway: {0}")]
    Unreachable(String),
    #[error("The gateway sent a response we could not understand: {0}")]
    InvalidResponse(String),
    #[error("The gateway is not configured: {0}")]
    NotConfigured(String),
}
