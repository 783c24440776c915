use std::fmt::Display;

use serde::{Deserialize, Serialize};

use crate::db_types::{Order, Task};

/// A problem during confirmation that did not stop the order from being confirmed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConfirmWarning {
    /// The merchant is on the Commission pricing model but has no commission rule
    CommissionRuleMissing(String),
    CommissionFailed(String),
    /// Ordered products that are not in the merchant's catalogue
    InventoryNotAdjusted(Vec<String>),
    InventoryFailed(String),
    /// The task was created, but offering it to agents failed. It can be assigned manually.
    DispatchFailed(String),
}

impl Display for ConfirmWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfirmWarning::CommissionRuleMissing(m) => write!(f, "Merchant {m} has no commission rule"),
            ConfirmWarning::CommissionFailed(e) => write!(f, "Commission could not be computed. {e}"),
            ConfirmWarning::InventoryNotAdjusted(ids) => {
                write!(f, "Stock was not adjusted for unknown products: {}", ids.join(", "))
            },
            ConfirmWarning::InventoryFailed(e) => write!(f, "Stock could not be adjusted. {e}"),
            ConfirmWarning::DispatchFailed(e) => write!(f, "The delivery task was not offered to agents. {e}"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ConfirmResult {
    pub order: Order,
    pub task: Option<Task>,
    pub offered_to: Vec<String>,
    pub warnings: Vec<ConfirmWarning>,
}
