use log::*;
use serde_json::Value;

use crate::{
    events::{EventProducer, EventProducers, NotificationEvent},
    notifications::{resolve_recipients, NotificationKind, Recipient, RecipientContext, ResolvedRecipient},
    traits::ManagerDirectory,
};

/// Resolves notification recipients and hands the event to the fan-out. Publishing never fails: problems are
/// logged and the caller carries on.
#[derive(Clone)]
pub struct Notifier {
    admin_id: String,
    producers: Vec<EventProducer<NotificationEvent>>,
}

impl Notifier {
    pub fn new<S: Into<String>>(admin_id: S, producers: &EventProducers) -> Self {
        Self { admin_id: admin_id.into(), producers: producers.notification_producer.clone() }
    }

    pub fn admin_id(&self) -> &str {
        &self.admin_id
    }

    /// Notifies the given roles, resolved against `context`.
    pub async fn notify<D: ManagerDirectory>(
        &self,
        directory: &D,
        kind: NotificationKind,
        roles: &[Recipient],
        context: &RecipientContext,
        payload: Value,
    ) {
        let recipients = resolve_recipients(roles, &self.admin_id, context, directory).await;
        self.notify_resolved(kind, recipients, payload).await;
    }

    /// Notifies the default recipients of `kind`.
    pub async fn notify_default<D: ManagerDirectory>(
        &self,
        directory: &D,
        kind: NotificationKind,
        context: &RecipientContext,
        payload: Value,
    ) {
        self.notify(directory, kind, &kind.default_recipients(), context, payload).await;
    }

    pub async fn notify_resolved(&self, kind: NotificationKind, recipients: Vec<ResolvedRecipient>, payload: Value) {
        if recipients.is_empty() {
            debug!("📬️ Nobody to notify of '{}'", kind.event_name());
            return;
        }
        if self.producers.is_empty() {
            trace!("📬️ No notification subscribers. '{}' is dropped", kind.event_name());
            return;
        }
        let event = NotificationEvent::new(kind, recipients, payload);
        for producer in &self.producers {
            producer.publish_event(event.clone()).await;
        }
    }
}
