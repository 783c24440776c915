//! Notification fan-out.
//!
//! Business flows describe *who* should hear about an event in terms of [`Recipient`] roles. The [`Notifier`]
//! resolves those roles to user ids once, and publishes a [`NotificationEvent`](crate::events::NotificationEvent) to
//! the event channel. The fan-out handler ([`fan_out_handler`]) then delivers the event over push and realtime
//! channels on its own tasks.
mod fan_out;
mod kinds;
mod notifier;
mod recipients;
mod registry;

pub use fan_out::{deliver, fan_out_handler, DeliveryReport};
pub use kinds::NotificationKind;
pub use notifier::Notifier;
pub use recipients::{resolve_recipients, Recipient, RecipientContext, ResolvedRecipient};
pub use registry::{
    ConnectionGuard,
    ConnectionId,
    ConnectionRegistry,
    InMemoryConnectionRegistry,
    RealtimeMessage,
    RealtimeSender,
    RegistryChannel,
};
