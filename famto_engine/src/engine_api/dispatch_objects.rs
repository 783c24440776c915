use serde::{Deserialize, Serialize};

use crate::db_types::TaskId;

/// The result of dispatching an order's delivery task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DispatchReport {
    pub task_id: TaskId,
    /// False if the order already had a task
    pub created: bool,
    /// The agents that received a new offer. Empty when auto-allocation is off.
    pub offered_to: Vec<String>,
}

/// What an expiry sweep did.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpiryReport {
    /// Tasks that had at least one offer lapse during this sweep
    pub expired: Vec<TaskId>,
    /// Tasks that were offered to a fresh set of agents
    pub reoffered: Vec<TaskId>,
    /// Tasks left for manual assignment. The admin has been told about each of them.
    pub unclaimed: Vec<TaskId>,
}
