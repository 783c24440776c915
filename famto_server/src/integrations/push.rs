use std::sync::Arc;

use famto_engine::traits::{NotificationError, PushSender};
use log::*;
use reqwest::Client;
use serde_json::{json, Value};

use crate::config::PushConfig;

/// Sends push notifications through an FCM-style HTTP endpoint. When no endpoint is configured, messages are logged
/// and dropped.
#[derive(Clone)]
pub struct HttpPushSender {
    config: PushConfig,
    client: Arc<Client>,
}

impl HttpPushSender {
    pub fn new(config: PushConfig) -> Result<Self, NotificationError> {
        let client = Client::builder().build().map_err(|e| NotificationError::PushFailed(e.to_string()))?;
        Ok(Self { config, client: Arc::new(client) })
    }
}

pub fn push_body(target: &str, title: &str, body: &str, data: &Value) -> Value {
    json!({
        "to": target,
        "notification": { "title": title, "body": body },
        "data": data,
    })
}

impl PushSender for HttpPushSender {
    async fn send(&self, target: &str, title: &str, body: &str, data: &Value) -> Result<(), NotificationError> {
        if !self.config.is_enabled() {
            trace!("📬️ Push is disabled. Dropping '{title}' for {target}");
            return Ok(());
        }
        let response = self
            .client
            .post(&self.config.endpoint)
            .header("Authorization", format!("key={}", self.config.server_key.reveal()))
            .json(&push_body(target, title, body, data))
            .send()
            .await
            .map_err(|e| NotificationError::PushFailed(e.to_string()))?;
        if response.status().is_success() {
            trace!("📬️ Pushed '{title}' to {target}");
            Ok(())
        } else {
            let status = response.status();
            let message = response.text().await.unwrap_or_default();
            Err(NotificationError::PushFailed(format!("{status}: {message}")))
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn message_shape() {
        let body = push_body("cust-1", "Order ready", "Order O2610001 is ready", &json!({"orderId": "O2610001"}));
        assert_eq!(body["to"], "cust-1");
        assert_eq!(body["notification"]["title"], "Order ready");
        assert_eq!(body["data"]["orderId"], "O2610001");
    }

    #[tokio::test]
    async fn disabled_push_is_a_no_op() {
        let sender = HttpPushSender::new(PushConfig::default()).unwrap();
        sender.send("cust-1", "t", "b", &json!({})).await.unwrap();
    }
}
