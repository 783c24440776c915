use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::notifications::Recipient;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NotificationKind {
    OrderConfirmed,
    OrderRejected,
    OrderReady,
    OrderCompleted,
    /// A delivery task is on offer to an agent
    TaskOffered,
    /// An agent won the task
    TaskAssigned,
    /// Every offer for a task lapsed and nobody is left to offer it to
    TaskUnclaimed,
}

impl NotificationKind {
    /// The event name used on the realtime channel.
    pub fn event_name(&self) -> &'static str {
        match self {
            NotificationKind::OrderConfirmed => "orderConfirmed",
            NotificationKind::OrderRejected => "orderRejected",
            NotificationKind::OrderReady => "orderReady",
            NotificationKind::OrderCompleted => "orderCompleted",
            NotificationKind::TaskOffered => "taskOffered",
            NotificationKind::TaskAssigned => "taskAssigned",
            NotificationKind::TaskUnclaimed => "taskUnclaimed",
        }
    }

    pub fn default_recipients(&self) -> Vec<Recipient> {
        use Recipient::*;
        match self {
            NotificationKind::OrderConfirmed => vec![Admin, Merchant, Customer],
            NotificationKind::OrderRejected => vec![Admin, Merchant, Driver, Customer],
            NotificationKind::OrderReady => vec![Driver, Customer],
            NotificationKind::OrderCompleted => vec![Admin, Merchant, Driver, Customer],
            NotificationKind::TaskOffered => vec![Driver],
            NotificationKind::TaskAssigned => vec![Admin, Merchant, Customer],
            NotificationKind::TaskUnclaimed => vec![Admin],
        }
    }

    /// Push notification title and body for this kind of event.
    pub fn title_and_body(&self, payload: &Value) -> (String, String) {
        let order = match payload.get("orderId").and_then(Value::as_str) {
            Some(id) => format!("Order {id}"),
            None => "Your order".to_string(),
        };
        let (title, body) = match self {
            NotificationKind::OrderConfirmed => ("Order confirmed", format!("{order} has been confirmed")),
            NotificationKind::OrderRejected => ("Order cancelled", format!("{order} has been cancelled")),
            NotificationKind::OrderReady => ("Order ready", format!("{order} is ready")),
            NotificationKind::OrderCompleted => ("Order delivered", format!("{order} has been completed")),
            NotificationKind::TaskOffered => ("New delivery task", format!("A delivery is available. {order}")),
            NotificationKind::TaskAssigned => ("Agent assigned", format!("An agent has picked up the delivery. {order}")),
            NotificationKind::TaskUnclaimed => {
                ("Task unclaimed", format!("No agent accepted the delivery. {order} needs manual assignment."))
            },
        };
        (title.to_string(), body)
    }
}
