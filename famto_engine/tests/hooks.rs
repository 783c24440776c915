use std::sync::{
    atomic::{AtomicI32, Ordering},
    Arc,
};

use famto_engine::{
    db_types::{AllocationType, DeliveryMode, Money, NewAgent, NewOrder, OrderStatus, PaymentMode},
    events::{EventHandlers, EventHooks, OrderStatusChangedEvent},
    notifications::{fan_out_handler, NotificationKind, Notifier, Recipient, RecipientContext},
    test_utils::{
        doubles::{RecordingPush, RecordingRealtime},
        seed,
    },
};
use log::*;
use serde_json::json;
use tokio::runtime::Runtime;

mod support;

use support::*;

#[derive(Default, Clone)]
struct HookCalled {
    called: Arc<AtomicI32>,
}

impl HookCalled {
    pub fn called(&self) {
        let _ = self.called.fetch_add(1, Ordering::Relaxed);
    }

    pub fn count(&self) -> i32 {
        self.called.load(Ordering::Relaxed)
    }
}

#[test]
fn status_changes_reach_the_hook() {
    let rt = Runtime::new().unwrap();
    rt.block_on(async {
        let sys = setup().await;
        seed::customer(&sys.db, "cust-1", Money::default()).await;
        let completed = sys
            .place(NewOrder::new("cust-1", items(), PaymentMode::CashOnDelivery).with_delivery_mode(DeliveryMode::TakeAway))
            .await;
        sys.api.confirm(&completed.id, admin()).await.unwrap();
        sys.api.mark_completed(&completed.id, admin()).await.unwrap();
        let rejected = sys.place(home_delivery("cust-1", "m-1", PaymentMode::CashOnDelivery)).await;
        sys.api.reject(&rejected.id, admin()).await.unwrap();
        // Failed transitions emit nothing
        let _ = sys.api.reject(&rejected.id, admin()).await.unwrap_err();
        settle().await;

        let changes = sys.status_changes.lock().await.clone();
        assert_eq!(changes, vec![
            OrderStatusChangedEvent::new(completed.id.clone(), OrderStatus::Pending, OrderStatus::OnGoing),
            OrderStatusChangedEvent::new(completed.id.clone(), OrderStatus::OnGoing, OrderStatus::Completed),
            OrderStatusChangedEvent::new(rejected.id.clone(), OrderStatus::Pending, OrderStatus::Cancelled),
        ]);
        sys.tear_down().await;
    });
}

#[test]
fn notifications_fan_out_to_the_parties() {
    let rt = Runtime::new().unwrap();
    rt.block_on(async {
        let sys = setup().await;
        seed::customer(&sys.db, "cust-1", Money::default()).await;
        seed::allocation_policy(&sys.db, &active_policy(AllocationType::All, 0.0)).await;
        seed::agent(&sys.db, NewAgent::available("agent-1", "Anil")).await;
        let order = sys.place(home_delivery("cust-1", "m-1", PaymentMode::CashOnDelivery)).await;
        let task = sys.api.confirm(&order.id, merchant_actor("m-1")).await.unwrap().task.unwrap();
        settle().await;
        for party in [ADMIN_ID, "m-1", "cust-1"] {
            assert_eq!(sys.realtime.events_for(party), vec!["orderConfirmed".to_string()], "{party}");
        }
        assert_eq!(sys.realtime.events_for("agent-1"), vec!["taskOffered".to_string()]);

        assert!(sys.api.dispatcher().accept_task(task.id, "agent-1").await.unwrap().is_accepted());
        sys.api.mark_ready(&order.id, merchant_actor("m-1")).await.unwrap();
        settle().await;
        assert_eq!(sys.realtime.events_for("cust-1"), vec!["orderConfirmed", "taskAssigned", "orderReady"]);
        assert_eq!(sys.realtime.events_for("agent-1"), vec!["taskOffered", "orderReady"]);
        let pushed = sys.push.messages().into_iter().filter(|(target, _, _)| target == "cust-1");
        let titles = pushed.map(|(_, title, _)| title).collect::<Vec<_>>();
        assert_eq!(titles, vec!["Order confirmed", "Agent assigned", "Order ready"]);
        sys.tear_down().await;
    });
}

#[test]
fn manager_roles_resolve_through_the_directory() {
    let rt = Runtime::new().unwrap();
    rt.block_on(async {
        let sys = setup().await;
        seed::manager(&sys.db, "mgr-7", "Finance").await;
        seed::manager(&sys.db, "mgr-3", "finance").await;

        let push = Arc::new(RecordingPush::failing_for(&["cust-9"]));
        let realtime = Arc::new(RecordingRealtime::failing_for(&[ADMIN_ID]));
        let delivered = HookCalled::default();
        let counter = delivered.clone();
        let fan_out = fan_out_handler(Arc::clone(&push), Arc::clone(&realtime));
        let mut hooks = EventHooks::default();
        hooks.on_notification(move |event| {
            counter.called();
            debug!("🪝️ {event:?}");
            fan_out(event)
        });
        let handlers = EventHandlers::new(16, hooks);
        let notifier = Notifier::new(ADMIN_ID, &handlers.producers());
        handlers.start_handlers().await;

        let roles: [Recipient; 4] = ["Admin", "Customer", "FINANCE", "Driver"].map(|r| r.parse().unwrap());
        assert_eq!(roles[2], Recipient::Manager("FINANCE".into()));
        let context = RecipientContext { customer_id: Some("cust-9".into()), ..Default::default() };
        let payload = json!({ "orderId": "O2610042" });
        notifier.notify(&sys.db, NotificationKind::OrderCompleted, &roles, &context, payload).await;
        // A role nobody holds is skipped
        let nobody = [Recipient::Manager("Logistics".into())];
        notifier.notify(&sys.db, NotificationKind::OrderCompleted, &nobody, &context, json!({})).await;
        settle().await;

        assert_eq!(delivered.count(), 1);
        // Lowest id holding the role, case-insensitively
        assert_eq!(realtime.events_for("mgr-3"), vec!["orderCompleted".to_string()]);
        assert!(realtime.events_for("mgr-7").is_empty());
        assert_eq!(realtime.events_for("cust-9"), vec!["orderCompleted".to_string()]);
        // One channel failing does not stop the other
        assert!(realtime.events_for(ADMIN_ID).is_empty());
        let mut targets = push.targets();
        targets.sort();
        assert_eq!(targets, vec![ADMIN_ID.to_string(), "mgr-3".to_string()]);
        let (_, title, body) = push.messages().into_iter().next().unwrap();
        assert_eq!(title, "Order delivered");
        assert_eq!(body, "Order O2610042 has been completed");
        sys.tear_down().await;
    });
}
