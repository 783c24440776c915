use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    db_types::{Actor, CommissionDetail, Money, NewTask, Order, OrderId, PaymentMode, Task, TaskId},
    refund::{RefundOutcome, RefundPlan},
};

/// Everything that must commit together when an order is confirmed.
#[derive(Debug, Clone)]
pub struct OrderConfirmation {
    pub order_id: OrderId,
    pub actor: Actor,
    pub at: DateTime<Utc>,
    /// Present when the merchant is on the Commission pricing model and has a commission rule
    pub commission: Option<CommissionEntry>,
    /// The delivery task to create. `None` for Take Away orders.
    pub task: Option<NewTask>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommissionEntry {
    pub merchant_id: String,
    pub total_amount: Money,
    pub split: CommissionDetail,
    pub payment_mode: PaymentMode,
}

#[derive(Debug, Clone)]
pub struct ConfirmedOrder {
    pub order: Order,
    pub task: Option<Task>,
}

#[derive(Debug, Clone)]
pub struct OrderCancellation {
    pub order_id: OrderId,
    pub actor: Actor,
    pub at: DateTime<Utc>,
    pub plan: RefundPlan,
}

#[derive(Debug, Clone)]
pub struct CancelledOrder {
    pub order: Order,
    pub refund: RefundOutcome,
    /// The agent that was holding the delivery and is free again
    pub released_agent: Option<String>,
}

#[derive(Debug, Clone)]
pub struct OrderCompletion {
    pub order_id: OrderId,
    pub actor: Actor,
    pub at: DateTime<Utc>,
    /// Delivery orders can only complete once an agent holds the task
    pub requires_task: bool,
}

#[derive(Debug, Clone)]
pub struct CompletedOrder {
    pub order: Order,
    pub task: Option<Task>,
    pub released_agent: Option<String>,
}

/// The result of an agent's attempt to accept a task. Only `Accepted` changes any state.
#[derive(Debug, Clone)]
pub enum AcceptOutcome {
    Accepted(Task),
    /// Another agent won the race (or the task was already completed)
    AlreadyAssigned { task_id: TaskId, agent_id: Option<String> },
    /// The agent was never offered this task, or declined it
    NotOffered,
    /// The agent's offer lapsed before they accepted
    OfferExpired,
    /// The agent is not free to take on a delivery
    AgentUnavailable,
    /// The order behind the task is no longer in progress
    OrderClosed,
}

impl AcceptOutcome {
    pub fn is_accepted(&self) -> bool {
        matches!(self, AcceptOutcome::Accepted(_))
    }
}

/// Outcome of applying an inventory reduction for the purchased items.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventoryReport {
    pub adjusted: Vec<String>,
    /// Product ids that do not belong to the merchant's catalogue
    pub unknown: Vec<String>,
}
