use std::future::Future;

use serde_json::Value;
use thiserror::Error;

/// Sends push notifications. Failures are reported to the caller, which logs them.
pub trait PushSender: Send + Sync {
    /// `target` is a device token or a user id, depending on the push provider.
    fn send(
        &self,
        target: &str,
        title: &str,
        body: &str,
        data: &Value,
    ) -> impl Future<Output = Result<(), NotificationError>> + Send;
}

/// Emits events to a recipient's live connection.
pub trait RealtimeChannel: Send + Sync {
    fn emit(
        &self,
        recipient_id: &str,
        event_name: &str,
        payload: &Value,
    ) -> impl Future<Output = Result<(), NotificationError>> + Send;
}

/// Finds the manager holding a role, for notifications addressed to a role rather than a party of the order.
#[allow(async_fn_in_trait)]
pub trait ManagerDirectory {
    async fn find_manager_by_role(&self, role: &str) -> Result<Option<String>, NotificationError>;
}

#[derive(Debug, Clone, Error)]
pub enum NotificationError {
    #[error("Push notification failed: {0}")]
    PushFailed(String),
    #[error("Realtime delivery failed: {0}")]
    RealtimeFailed(String),
    #[error("{0} is not connected")]
    RecipientOffline(String),
    #[error("Recipient lookup failed: {0}")]
    LookupFailed(String),
}

impl From<sqlx::Error> for NotificationError {
    fn from(e: sqlx::Error) -> Self {
        NotificationError::LookupFailed(e.to_string())
    }
}
