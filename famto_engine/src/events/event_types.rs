use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{
    db_types::{OrderId, OrderStatus},
    notifications::{NotificationKind, ResolvedRecipient},
};

/// A notification on its way to the fan-out. Recipients have already been resolved to user ids.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotificationEvent {
    pub kind: NotificationKind,
    pub recipients: Vec<ResolvedRecipient>,
    pub title: String,
    pub body: String,
    pub payload: Value,
}

impl NotificationEvent {
    pub fn new(kind: NotificationKind, recipients: Vec<ResolvedRecipient>, payload: Value) -> Self {
        let (title, body) = kind.title_and_body(&payload);
        Self { kind, recipients, title, body, payload }
    }

    pub fn event_name(&self) -> &'static str {
        self.kind.event_name()
    }
}

/// Emitted after an order status change has been committed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderStatusChangedEvent {
    pub order_id: OrderId,
    pub old_status: OrderStatus,
    pub new_status: OrderStatus,
}

impl OrderStatusChangedEvent {
    pub fn new(order_id: OrderId, old_status: OrderStatus, new_status: OrderStatus) -> Self {
        Self { order_id, old_status, new_status }
    }
}
