//! Delivery of notification events over push and realtime channels.
//!
//! Every recipient gets the event on both channels. Deliveries run concurrently and each failure is logged and
//! counted, never propagated: by the time an event reaches the fan-out, the business transaction behind it has
//! already committed.
use std::{future::Future, pin::Pin, sync::Arc};

use futures_util::future::join_all;
use log::*;

use crate::{
    events::{Handler, NotificationEvent},
    traits::{PushSender, RealtimeChannel},
};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeliveryReport {
    pub delivered: usize,
    pub failed: usize,
}

impl DeliveryReport {
    pub fn attempted(&self) -> usize {
        self.delivered + self.failed
    }

    pub fn is_complete(&self) -> bool {
        self.failed == 0
    }
}

pub async fn deliver<P, R>(push: &P, realtime: &R, event: &NotificationEvent) -> DeliveryReport
where
    P: PushSender,
    R: RealtimeChannel,
{
    let event_name = event.event_name();
    let pushes = event.recipients.iter().map(|r| async move {
        let result = push.send(&r.user_id, &event.title, &event.body, &event.payload).await;
        if let Err(e) = &result {
            warn!("📬️ Push notification '{event_name}' to {} {} failed. {e}", r.role, r.user_id);
        }
        result.is_ok()
    });
    let emits = event.recipients.iter().map(|r| async move {
        let result = realtime.emit(&r.user_id, event_name, &event.payload).await;
        if let Err(e) = &result {
            debug!("📬️ Realtime event '{event_name}' to {} {} was not delivered. {e}", r.role, r.user_id);
        }
        result.is_ok()
    });
    let (pushed, emitted) = futures_util::join!(join_all(pushes), join_all(emits));
    let report = pushed.into_iter().chain(emitted).fold(DeliveryReport::default(), |mut report, ok| {
        if ok {
            report.delivered += 1;
        } else {
            report.failed += 1;
        }
        report
    });
    trace!("📬️ '{event_name}' fan-out complete. {report:?}");
    report
}

/// Creates an event handler that fans every notification event out over the given channels.
pub fn fan_out_handler<P, R>(push: Arc<P>, realtime: Arc<R>) -> Handler<NotificationEvent>
where
    P: PushSender + 'static,
    R: RealtimeChannel + 'static,
{
    Arc::new(move |event: NotificationEvent| {
        let push = Arc::clone(&push);
        let realtime = Arc::clone(&realtime);
        Box::pin(async move {
            let report = deliver(push.as_ref(), realtime.as_ref(), &event).await;
            if !report.is_complete() {
                let name = event.event_name();
                warn!("📬️ '{name}' failed on {} of {} deliveries", report.failed, report.attempted());
            }
        }) as Pin<Box<dyn Future<Output = ()> + Send>>
    })
}
