//! # Backend and collaborator contracts
//!
//! The engine is storage-agnostic. The traits in this module define what a backend (and the outside services the
//! engine talks to) must provide.
//!
//! * [`DispatchDatabase`] covers delivery tasks, offers, agents and the auto-allocation policy. It is where the
//!   accept race is resolved.
//! * [`OrderFlowDatabase`] builds on it with the order lifecycle: creation, confirmation, cancellation with refunds,
//!   and completion.
//! * [`ManagerDirectory`] resolves manager roles for notifications.
//! * [`PaymentGateway`] refunds online payments.
//! * [`PushSender`] and [`RealtimeChannel`] are the two notification delivery channels.
mod data_objects;
mod dispatch_database;
mod notification_channels;
mod order_flow_database;
mod payment_gateway;

pub use data_objects::{
    AcceptOutcome,
    CancelledOrder,
    CommissionEntry,
    CompletedOrder,
    ConfirmedOrder,
    InventoryReport,
    OrderCancellation,
    OrderCompletion,
    OrderConfirmation,
};
pub use dispatch_database::{DispatchDatabase, DispatchError};
pub use notification_channels::{ManagerDirectory, NotificationError, PushSender, RealtimeChannel};
pub use order_flow_database::{OrderAction, OrderFlowDatabase, OrderFlowError};
pub use payment_gateway::{GatewayError, PaymentGateway, RefundReceipt};
