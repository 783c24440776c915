use std::fmt::Display;

use chrono::{DateTime, Utc};
use famto_engine::{
    db_types::{Actor, ActorRole, Money, Order, OrderId, OrderStatus, PaymentStatus, TaskId},
    refund::RefundOutcome,
    traits::{AcceptOutcome, CancelledOrder, CompletedOrder},
    ConfirmResult,
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonResponse {
    pub success: bool,
    pub message: String,
}

impl JsonResponse {
    pub fn success<S: Display>(message: S) -> Self {
        Self { success: true, message: message.to_string() }
    }

    pub fn failure<S: Display>(message: S) -> Self {
        Self { success: false, message: message.to_string() }
    }
}

/// Who is asking for an order transition.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActorParams {
    pub role: ActorRole,
    pub user_id: String,
}

impl From<ActorParams> for Actor {
    fn from(params: ActorParams) -> Self {
        Actor::new(params.role, params.user_id)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentParams {
    pub agent_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderResult {
    pub id: OrderId,
    pub status: OrderStatus,
    pub payment_status: PaymentStatus,
    pub customer_id: String,
    pub merchant_id: Option<String>,
    pub agent_id: Option<String>,
    pub grand_total: Money,
    pub merchant_earnings: Option<Money>,
    pub famto_earnings: Option<Money>,
    pub refund_id: Option<String>,
    pub updated_at: DateTime<Utc>,
}

impl From<&Order> for OrderResult {
    fn from(order: &Order) -> Self {
        Self {
            id: order.id.clone(),
            status: order.status,
            payment_status: order.payment_status,
            customer_id: order.customer_id.clone(),
            merchant_id: order.merchant_id.clone(),
            agent_id: order.agent_id.clone(),
            grand_total: order.grand_total(),
            merchant_earnings: order.merchant_earnings,
            famto_earnings: order.famto_earnings,
            refund_id: order.refund_id.clone(),
            updated_at: order.updated_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfirmResponse {
    pub order: OrderResult,
    pub task_id: Option<TaskId>,
    pub offered_to: Vec<String>,
    pub warnings: Vec<String>,
}

impl From<ConfirmResult> for ConfirmResponse {
    fn from(result: ConfirmResult) -> Self {
        Self {
            order: OrderResult::from(&result.order),
            task_id: result.task.map(|t| t.id),
            offered_to: result.offered_to,
            warnings: result.warnings.iter().map(|w| w.to_string()).collect(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefundResult {
    /// `wallet`, `gateway` or `none`
    pub method: String,
    pub amount: Money,
    pub refund_id: Option<String>,
}

impl From<&RefundOutcome> for RefundResult {
    fn from(outcome: &RefundOutcome) -> Self {
        let (method, refund_id) = match outcome {
            RefundOutcome::WalletCredited { .. } => ("wallet", None),
            RefundOutcome::GatewayRefunded { refund_id, .. } => ("gateway", Some(refund_id.clone())),
            RefundOutcome::NoMovement => ("none", None),
        };
        Self { method: method.to_string(), amount: outcome.amount(), refund_id }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RejectResponse {
    pub order: OrderResult,
    pub refund: RefundResult,
    pub released_agent: Option<String>,
}

impl From<CancelledOrder> for RejectResponse {
    fn from(cancelled: CancelledOrder) -> Self {
        Self {
            order: OrderResult::from(&cancelled.order),
            refund: RefundResult::from(&cancelled.refund),
            released_agent: cancelled.released_agent,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompleteResponse {
    pub order: OrderResult,
    pub released_agent: Option<String>,
}

impl From<CompletedOrder> for CompleteResponse {
    fn from(completed: CompletedOrder) -> Self {
        Self { order: OrderResult::from(&completed.order), released_agent: completed.released_agent }
    }
}

/// The answer to an agent's accept request. Losing the race is a normal answer, not an error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AcceptResponse {
    pub accepted: bool,
    pub outcome: String,
    pub task_id: TaskId,
    /// The agent holding the task, if anyone does
    pub agent_id: Option<String>,
}

impl AcceptResponse {
    pub fn new(task_id: TaskId, requested_by: &str, outcome: &AcceptOutcome) -> Self {
        let (name, agent_id) = match outcome {
            AcceptOutcome::Accepted(_) => ("accepted", Some(requested_by.to_string())),
            AcceptOutcome::AlreadyAssigned { agent_id, .. } => ("alreadyAssigned", agent_id.clone()),
            AcceptOutcome::NotOffered => ("notOffered", None),
            AcceptOutcome::OfferExpired => ("offerExpired", None),
            AcceptOutcome::AgentUnavailable => ("agentUnavailable", None),
            AcceptOutcome::OrderClosed => ("orderClosed", None),
        };
        Self { accepted: outcome.is_accepted(), outcome: name.to_string(), task_id, agent_id }
    }
}

#[cfg(test)]
mod test {
    use famto_engine::db_types::ActorRole;

    use super::*;

    #[test]
    fn actor_params_use_camel_case() {
        let params: ActorParams = serde_json::from_str(r#"{"role":"Merchant","userId":"m-1"}"#).unwrap();
        let actor = Actor::from(params);
        assert_eq!(actor, Actor::new(ActorRole::Merchant, "m-1"));
    }

    #[test]
    fn losing_the_race_names_the_winner() {
        let outcome = AcceptOutcome::AlreadyAssigned { task_id: TaskId(3), agent_id: Some("agent-7".into()) };
        let response = AcceptResponse::new(TaskId(3), "agent-2", &outcome);
        assert!(!response.accepted);
        assert_eq!(
            serde_json::to_string(&response).unwrap(),
            r#"{"accepted":false,"outcome":"alreadyAssigned","taskId":3,"agentId":"agent-7"}"#
        );
    }

    #[test]
    fn refund_summaries() {
        let outcome = RefundOutcome::GatewayRefunded { amount: Money::from(10_000), refund_id: "rfnd_1".into() };
        let result = RefundResult::from(&outcome);
        assert_eq!(result.method, "gateway");
        assert_eq!(result.amount, Money::from(10_000));
        assert_eq!(result.refund_id.as_deref(), Some("rfnd_1"));
        assert_eq!(RefundResult::from(&RefundOutcome::NoMovement).method, "none");
    }
}
