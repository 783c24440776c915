use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::{
    db_types::{Agent, AutoAllocation, Merchant, NewTask, Order, OrderId, Task, TaskId, TaskOffer},
    traits::data_objects::AcceptOutcome,
};

/// Storage behaviour needed to dispatch delivery tasks to agents.
///
/// Implementations must resolve [`accept_task`](DispatchDatabase::accept_task) with a single conditional update, so
/// that of any number of concurrent acceptances for a task, exactly one succeeds.
#[allow(async_fn_in_trait)]
pub trait DispatchDatabase: Clone {
    async fn fetch_order(&self, order_id: &OrderId) -> Result<Option<Order>, DispatchError>;

    async fn fetch_merchant(&self, merchant_id: &str) -> Result<Option<Merchant>, DispatchError>;

    /// The auto-allocation policy. If none has been configured, the (inactive) default policy is returned.
    async fn fetch_allocation_policy(&self) -> Result<AutoAllocation, DispatchError>;

    /// The id of the agent pricing rule with the given name, if there is one.
    async fn fetch_pricing_rule_id(&self, rule_name: &str) -> Result<Option<String>, DispatchError>;

    /// All agents that are free and approved.
    async fn fetch_available_agents(&self) -> Result<Vec<Agent>, DispatchError>;

    async fn fetch_agent(&self, agent_id: &str) -> Result<Option<Agent>, DispatchError>;

    /// Creates the task for an order, unless the order already has one. Returns the task and whether it was created.
    async fn insert_task(&self, task: NewTask, at: DateTime<Utc>) -> Result<(Task, bool), DispatchError>;

    async fn fetch_task(&self, task_id: TaskId) -> Result<Option<Task>, DispatchError>;

    async fn fetch_task_for_order(&self, order_id: &OrderId) -> Result<Option<Task>, DispatchError>;

    /// Records a pending offer of the task to each agent. Agents that have been offered the task before are skipped,
    /// and nothing is recorded once the task is taken or its order has left On-going.
    /// Returns the agents that received a new offer.
    async fn record_offers(
        &self,
        task_id: TaskId,
        agent_ids: &[String],
        offered_at: DateTime<Utc>,
        expires_at: DateTime<Utc>,
    ) -> Result<Vec<String>, DispatchError>;

    async fn fetch_offers(&self, task_id: TaskId) -> Result<Vec<TaskOffer>, DispatchError>;

    /// Resolves one agent's acceptance of a task.
    ///
    /// The acceptance succeeds only if, at commit time, the task is still Unassigned, the agent holds a live offer
    /// for it, the agent is Free and the order is On-going. On success the task becomes Assigned to the agent, the
    /// agent becomes Busy, the order records the agent, and the other pending offers are withdrawn.
    async fn accept_task(&self, task_id: TaskId, agent_id: &str, at: DateTime<Utc>)
        -> Result<AcceptOutcome, DispatchError>;

    /// Marks the agent's pending offer as declined. Returns false if there was no pending offer.
    async fn decline_offer(&self, task_id: TaskId, agent_id: &str) -> Result<bool, DispatchError>;

    /// Marks every pending offer that has lapsed by `at` as expired, and returns the affected tasks.
    async fn expire_offers(&self, at: DateTime<Utc>) -> Result<Vec<TaskId>, DispatchError>;

    /// Unassigned tasks of On-going orders that nobody holds a live offer for at `at`.
    async fn fetch_unclaimed_tasks(&self, at: DateTime<Utc>) -> Result<Vec<Task>, DispatchError>;
}

#[derive(Debug, Clone, Error)]
pub enum DispatchError {
    #[error("We have an internal database engine (configuration/uptime etc.) : {0}")]
    DatabaseError(String),
    #[error("The requested order {0} does not exist")]
    OrderNotFound(OrderId),
    #[error("The requested task {0} does not exist")]
    TaskNotFound(TaskId),
    #[error("The requested agent {0} does not exist")]
    AgentNotFound(String),
    #[error("Order {0} has no delivery task, since it is a Take Away order")]
    NoTaskRequired(OrderId),
}

impl From<sqlx::Error> for DispatchError {
    fn from(e: sqlx::Error) -> Self {
        DispatchError::DatabaseError(e.to_string())
    }
}
