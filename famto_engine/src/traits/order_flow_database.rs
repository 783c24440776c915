use chrono::{DateTime, Utc};
use famto_common::MoneyError;
use thiserror::Error;

use crate::{
    db_types::{
        Actor,
        CommissionLog,
        CommissionRuleRecord,
        Customer,
        CustomerTransaction,
        NewOrder,
        NewScheduledOrder,
        Order,
        OrderId,
        OrderItem,
        OrderStatus,
        ScheduledOrder,
    },
    refund::RefundError,
    traits::{
        data_objects::{
            CancelledOrder,
            CompletedOrder,
            ConfirmedOrder,
            InventoryReport,
            OrderCancellation,
            OrderCompletion,
            OrderConfirmation,
        },
        DispatchDatabase,
        DispatchError,
        GatewayError,
        ManagerDirectory,
        PaymentGateway,
    },
};

/// This trait defines the highest level of behaviour for backends supporting the order lifecycle.
///
/// Every status transition is a compare-and-set against the status the transition starts from. When the stored
/// order is not in that status any more, the transition fails with [`OrderFlowError::InvalidStateTransition`] and
/// nothing is written.
#[allow(async_fn_in_trait)]
pub trait OrderFlowDatabase: DispatchDatabase + ManagerDirectory {
    /// The URL of the database
    fn url(&self) -> &str;

    /// Stores a new order in Pending status under a freshly allocated order id.
    async fn insert_order(&self, order: NewOrder, at: DateTime<Utc>) -> Result<Order, OrderFlowError>;

    async fn fetch_commission_rule(&self, merchant_id: &str) -> Result<Option<CommissionRuleRecord>, OrderFlowError>;

    /// In a single atomic transaction,
    /// * moves the order from Pending to On-going and stamps the `accepted` step,
    /// * records the commission split on the order and appends a commission log entry, if one is given,
    /// * creates the delivery task, if one is given. This is idempotent.
    ///
    /// If the task cannot be created, nothing is committed and [`OrderFlowError::TaskCreationError`] is returned.
    async fn confirm_order(&self, confirmation: OrderConfirmation) -> Result<ConfirmedOrder, OrderFlowError>;

    /// In a single atomic transaction,
    /// * moves the order from Pending or On-going to Cancelled and stamps the `cancelled` step,
    /// * carries out the refund plan: crediting the wallet, or storing the gateway refund id, followed by appending a
    ///   `Refund/Credit` transaction for the customer,
    /// * withdraws open offers for the order's task and frees the agent that was holding it, if any.
    ///
    /// The payment gateway is never called while a transaction is open. Backends claim the order for the refund
    /// first, and refuse other transitions with [`OrderFlowError::RefundInProgress`] until the claim is settled. If
    /// the gateway refund fails, the claim is dropped and the order is left as it was.
    async fn cancel_order<G: PaymentGateway>(
        &self,
        cancellation: OrderCancellation,
        gateway: &G,
    ) -> Result<CancelledOrder, OrderFlowError>;

    /// Stamps the `ready` step of an On-going order. Delivery orders must have an agent.
    async fn mark_order_ready(
        &self,
        order_id: &OrderId,
        actor: &Actor,
        requires_task: bool,
        at: DateTime<Utc>,
    ) -> Result<Order, OrderFlowError>;

    /// Moves the order from On-going to Completed. For delivery orders, the task is completed and the agent is freed.
    async fn complete_order(&self, completion: OrderCompletion) -> Result<CompletedOrder, OrderFlowError>;

    /// Decrements the merchant's available product quantities by the purchased quantities, never below zero.
    async fn reduce_available_quantity(
        &self,
        items: &[OrderItem],
        merchant_id: &str,
    ) -> Result<InventoryReport, OrderFlowError>;

    async fn fetch_customer(&self, customer_id: &str) -> Result<Option<Customer>, OrderFlowError>;

    async fn fetch_customer_transactions(&self, customer_id: &str)
        -> Result<Vec<CustomerTransaction>, OrderFlowError>;

    async fn fetch_commission_logs(&self, order_id: &OrderId) -> Result<Vec<CommissionLog>, OrderFlowError>;

    /// Stores a scheduled order under a freshly allocated id. It starts out unviewed.
    async fn insert_scheduled_order(
        &self,
        order: NewScheduledOrder,
        at: DateTime<Utc>,
    ) -> Result<ScheduledOrder, OrderFlowError>;

    async fn fetch_scheduled_order(&self, id: &str) -> Result<Option<ScheduledOrder>, OrderFlowError>;

    /// Returns false if there is no such scheduled order.
    async fn mark_scheduled_order_viewed(&self, id: &str) -> Result<bool, OrderFlowError>;

    async fn fetch_unviewed_scheduled_orders(&self, merchant_id: &str) -> Result<Vec<ScheduledOrder>, OrderFlowError>;
}

/// The lifecycle step that was attempted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderAction {
    Confirm,
    Reject,
    MarkReady,
    Complete,
}

impl std::fmt::Display for OrderAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OrderAction::Confirm => f.write_str("confirm"),
            OrderAction::Reject => f.write_str("reject"),
            OrderAction::MarkReady => f.write_str("mark ready"),
            OrderAction::Complete => f.write_str("complete"),
        }
    }
}

#[derive(Debug, Clone, Error)]
pub enum OrderFlowError {
    #[error("We have an internal database engine (configuration/uptime etc.) : {0}")]
    DatabaseError(String),
    #[error("The requested order {0} does not exist")]
    OrderNotFound(OrderId),
    #[error("The requested customer {0} does not exist")]
    CustomerNotFound(String),
    #[error("Cannot {action} order {order_id} while it is {status}")]
    InvalidStateTransition { order_id: OrderId, status: OrderStatus, action: OrderAction },
    #[error("Order {0} is being cancelled. Its refund is in progress")]
    RefundInProgress(OrderId),
    #[error("Order {0} has no agent assigned to its delivery task")]
    TaskNotAssigned(OrderId),
    #[error("Could not create the delivery task. {0}")]
    TaskCreationError(String),
    #[error("The payment gateway refund failed. {0}")]
    PaymentGatewayFailure(#[from] GatewayError),
    #[error("Invalid order. {0}")]
    InvalidOrder(String),
    #[error("{0}")]
    Refund(#[from] RefundError),
    #[error("{0}")]
    Money(#[from] MoneyError),
    #[error("{0}")]
    Dispatch(#[from] DispatchError),
}

impl From<sqlx::Error> for OrderFlowError {
    fn from(e: sqlx::Error) -> Self {
        OrderFlowError::DatabaseError(e.to_string())
    }
}

impl OrderFlowError {
    pub fn invalid_transition(order: &Order, action: OrderAction) -> Self {
        Self::InvalidStateTransition { order_id: order.id.clone(), status: order.status, action }
    }
}
