use std::sync::Arc;

use famto_engine::{
    db_types::Money,
    traits::{GatewayError, PaymentGateway, RefundReceipt},
};
use log::*;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;

use crate::config::RazorpayConfig;

/// Refunds captured Razorpay payments.
#[derive(Clone)]
pub struct RazorpayGateway {
    config: RazorpayConfig,
    client: Arc<Client>,
}

#[derive(Deserialize)]
struct RefundResponse {
    id: String,
}

#[derive(Deserialize)]
struct ErrorResponse {
    error: ErrorDetail,
}

#[derive(Deserialize)]
struct ErrorDetail {
    description: String,
}

impl RazorpayGateway {
    pub fn new(config: RazorpayConfig) -> Result<Self, GatewayError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| GatewayError::NotConfigured(e.to_string()))?;
        Ok(Self { config, client: Arc::new(client) })
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{path}", self.config.base_url.trim_end_matches('/'))
    }
}

impl PaymentGateway for RazorpayGateway {
    async fn refund(&self, payment_id: &str, amount: Money) -> Result<RefundReceipt, GatewayError> {
        if !self.config.is_configured() {
            return Err(GatewayError::NotConfigured("Razorpay API keys are not set".into()));
        }
        let url = self.url(&format!("/payments/{payment_id}/refund"));
        debug!("💳️ Requesting a refund of {amount} for payment {payment_id}");
        let response = self
            .client
            .post(url)
            .basic_auth(&self.config.key_id, Some(self.config.key_secret.reveal()))
            .json(&json!({ "amount": amount.value() }))
            .send()
            .await
            .map_err(|e| GatewayError::Unreachable(e.to_string()))?;
        let status = response.status();
        let body = response.text().await.map_err(|e| GatewayError::Unreachable(e.to_string()))?;
        if status.is_success() {
            let receipt = parse_refund(&body)?;
            info!("💳️ Payment {payment_id} refunded {amount}. Refund id: {}", receipt.refund_id);
            Ok(receipt)
        } else if status.is_client_error() {
            Err(GatewayError::Declined(parse_error(&body)))
        } else {
            Err(GatewayError::Unreachable(format!("{status}: {body}")))
        }
    }
}

fn parse_refund(body: &str) -> Result<RefundReceipt, GatewayError> {
    let refund = serde_json::from_str::<RefundResponse>(body).map_err(|e| GatewayError::InvalidResponse(e.to_string()))?;
    Ok(RefundReceipt { refund_id: refund.id })
}

fn parse_error(body: &str) -> String {
    serde_json::from_str::<ErrorResponse>(body).map(|e| e.error.description).unwrap_or_else(|_| body.to_string())
}
