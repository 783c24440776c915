//! Recording stand-ins for the payment gateway and the notification channels.
use std::{
    collections::HashSet,
    sync::{Arc, Mutex},
    time::Duration,
};

use serde_json::Value;

use crate::{
    db_types::Money,
    traits::{GatewayError, NotificationError, PaymentGateway, PushSender, RealtimeChannel, RefundReceipt},
};

/// Records refund calls. Succeeds with `rfnd_<n>` ids unless told to fail.
#[derive(Debug, Clone, Default)]
pub struct RecordingGateway {
    calls: Arc<Mutex<Vec<(String, Money)>>>,
    failure: Option<GatewayError>,
    latency: Option<Duration>,
}

impl RecordingGateway {
    pub fn failing(error: GatewayError) -> Self {
        Self { failure: Some(error), ..Default::default() }
    }

    /// A gateway that takes `latency` to answer each refund.
    pub fn slow(latency: Duration) -> Self {
        Self { latency: Some(latency), ..Default::default() }
    }

    /// Every refund requested so far, including failed ones, as `(payment_id, amount)`
    pub fn calls(&self) -> Vec<(String, Money)> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }
}

impl PaymentGateway for RecordingGateway {
    async fn refund(&self, payment_id: &str, amount: Money) -> Result<RefundReceipt, GatewayError> {
        let n = {
            let mut calls = self.calls.lock().map_err(|e| GatewayError::Unreachable(e.to_string()))?;
            calls.push((payment_id.to_string(), amount));
            calls.len()
        };
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
        match &self.failure {
            Some(e) => Err(e.clone()),
            None => Ok(RefundReceipt { refund_id: format!("rfnd_{n}") }),
        }
    }
}

/// Records pushed messages as `(target, title, body)`. Targets listed in `failing_for` fail and are not recorded.
#[derive(Debug, Clone, Default)]
pub struct RecordingPush {
    sent: Arc<Mutex<Vec<(String, String, String)>>>,
    failing: HashSet<String>,
}

impl RecordingPush {
    pub fn failing_for(targets: &[&str]) -> Self {
        Self { failing: targets.iter().map(|t| t.to_string()).collect(), ..Default::default() }
    }

    pub fn messages(&self) -> Vec<(String, String, String)> {
        self.sent.lock().map(|s| s.clone()).unwrap_or_default()
    }

    pub fn targets(&self) -> Vec<String> {
        self.messages().into_iter().map(|(target, _, _)| target).collect()
    }
}

impl PushSender for RecordingPush {
    async fn send(&self, target: &str, title: &str, body: &str, _data: &Value) -> Result<(), NotificationError> {
        if self.failing.contains(target) {
            return Err(NotificationError::PushFailed(format!("{target} has no device registered")));
        }
        let mut sent = self.sent.lock().map_err(|e| NotificationError::PushFailed(e.to_string()))?;
        sent.push((target.to_string(), title.to_string(), body.to_string()));
        Ok(())
    }
}

/// Records emitted events as `(recipient, event name, payload)`. Recipients listed in `failing_for` are offline.
#[derive(Debug, Clone, Default)]
pub struct RecordingRealtime {
    emitted: Arc<Mutex<Vec<(String, String, Value)>>>,
    offline: HashSet<String>,
}

impl RecordingRealtime {
    pub fn failing_for(recipients: &[&str]) -> Self {
        Self { offline: recipients.iter().map(|r| r.to_string()).collect(), ..Default::default() }
    }

    pub fn events(&self) -> Vec<(String, String, Value)> {
        self.emitted.lock().map(|e| e.clone()).unwrap_or_default()
    }

    pub fn events_for(&self, recipient: &str) -> Vec<String> {
        self.events().into_iter().filter(|(r, _, _)| r == recipient).map(|(_, name, _)| name).collect()
    }
}

impl RealtimeChannel for RecordingRealtime {
    async fn emit(&self, recipient_id: &str, event_name: &str, payload: &Value) -> Result<(), NotificationError> {
        if self.offline.contains(recipient_id) {
            return Err(NotificationError::RecipientOffline(recipient_id.to_string()));
        }
        let mut emitted = self.emitted.lock().map_err(|e| NotificationError::RealtimeFailed(e.to_string()))?;
        emitted.push((recipient_id.to_string(), event_name.to_string(), payload.clone()));
        Ok(())
    }
}
