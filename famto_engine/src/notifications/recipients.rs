use std::{fmt::Display, str::FromStr};

use log::*;
use serde::{Deserialize, Serialize};

use crate::{db_types::Order, traits::ManagerDirectory};

/// Who a notification is addressed to, before resolution to a concrete user id.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Recipient {
    /// The platform administrator
    Admin,
    /// The order's merchant
    Merchant,
    /// The order's delivery agent
    Driver,
    /// The order's customer
    Customer,
    /// Whichever manager holds the named role
    Manager(String),
}

impl FromStr for Recipient {
    type Err = std::convert::Infallible;

    /// Parses a role name. Any name other than the four fixed roles is taken to be a manager role.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let role = s.trim();
        let recipient = match role.to_ascii_lowercase().as_str() {
            "admin" => Recipient::Admin,
            "merchant" => Recipient::Merchant,
            "driver" | "agent" => Recipient::Driver,
            "customer" => Recipient::Customer,
            _ => Recipient::Manager(role.to_string()),
        };
        Ok(recipient)
    }
}

impl Display for Recipient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Recipient::Admin => f.write_str("admin"),
            Recipient::Merchant => f.write_str("merchant"),
            Recipient::Driver => f.write_str("driver"),
            Recipient::Customer => f.write_str("customer"),
            Recipient::Manager(role) => write!(f, "manager ({role})"),
        }
    }
}

/// A recipient resolved to a user id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedRecipient {
    pub role: Recipient,
    pub user_id: String,
}

impl ResolvedRecipient {
    pub fn new<S: Into<String>>(role: Recipient, user_id: S) -> Self {
        Self { role, user_id: user_id.into() }
    }
}

/// The parties of an order, against which roles are resolved.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecipientContext {
    pub merchant_id: Option<String>,
    pub agent_id: Option<String>,
    pub customer_id: Option<String>,
}

impl From<&Order> for RecipientContext {
    fn from(order: &Order) -> Self {
        Self {
            merchant_id: order.merchant_id.clone(),
            agent_id: order.agent_id.clone(),
            customer_id: Some(order.customer_id.clone()),
        }
    }
}

impl RecipientContext {
    pub fn with_agent<S: Into<String>>(mut self, agent_id: S) -> Self {
        self.agent_id = Some(agent_id.into());
        self
    }
}

/// Resolves each role to a user id. Roles that have no counterpart for this order (a driver before allocation, a
/// merchant on a Pick and Drop order, a manager role nobody holds) are skipped.
pub async fn resolve_recipients<D: ManagerDirectory>(
    roles: &[Recipient],
    admin_id: &str,
    context: &RecipientContext,
    directory: &D,
) -> Vec<ResolvedRecipient> {
    let mut resolved = Vec::with_capacity(roles.len());
    for role in roles {
        let user_id = match role {
            Recipient::Admin => Some(admin_id.to_string()),
            Recipient::Merchant => context.merchant_id.clone(),
            Recipient::Driver => context.agent_id.clone(),
            Recipient::Customer => context.customer_id.clone(),
            Recipient::Manager(name) => match directory.find_manager_by_role(name).await {
                Ok(id) => id,
                Err(e) => {
                    warn!("📬️ Could not look up the manager for role {name}. {e}");
                    None
                },
            },
        };
        match user_id {
            Some(id) => resolved.push(ResolvedRecipient::new(role.clone(), id)),
            None => debug!("📬️ No {role} to notify. Skipping."),
        }
    }
    resolved
}
