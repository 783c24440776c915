use std::fmt::Debug;

use chrono::Utc;
use log::*;
use serde_json::json;

use crate::{
    commission::{self, CommissionRule},
    db_types::{
        item_total,
        Actor,
        CommissionLog,
        Customer,
        CustomerTransaction,
        DeliveryOption,
        Money,
        NewOrder,
        NewScheduledOrder,
        NewTask,
        Order,
        OrderId,
        OrderItem,
        OrderStatus,
        PricingModel,
        ScheduleWindow,
        ScheduledOrder,
        Task,
    },
    engine_api::{
        dispatch_api::DispatchApi,
        order_objects::{ConfirmResult, ConfirmWarning},
    },
    events::{EventProducers, OrderStatusChangedEvent},
    notifications::{NotificationKind, Notifier, RecipientContext},
    refund,
    traits::{
        CancelledOrder,
        CommissionEntry,
        CompletedOrder,
        OrderAction,
        OrderCancellation,
        OrderCompletion,
        OrderConfirmation,
        OrderFlowDatabase,
        OrderFlowError,
        PaymentGateway,
    },
};

/// Largest bill a single order may carry, in rupees.
const MAX_GRAND_TOTAL: i64 = 1_000_000_000;

/// `OrderFlowApi` is the primary API for moving orders through their lifecycle:
///
/// ```text
/// Pending --confirm--> On-going --complete--> Completed
///    |                    |
///    +-------reject-------+------> Cancelled
/// ```
///
/// Each transition commits atomically in the backend. Notifications and status-change events go out afterwards and
/// can never undo a committed transition.
pub struct OrderFlowApi<B, G> {
    db: B,
    gateway: G,
    dispatcher: DispatchApi<B>,
    notifier: Notifier,
    producers: EventProducers,
}

impl<B, G> Debug for OrderFlowApi<B, G> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "OrderFlowApi")
    }
}

impl<B: Clone, G> OrderFlowApi<B, G> {
    pub fn new<S: Into<String>>(db: B, gateway: G, producers: EventProducers, admin_id: S) -> Self {
        let notifier = Notifier::new(admin_id, &producers);
        let dispatcher = DispatchApi::new(db.clone(), notifier.clone());
        Self { db, gateway, dispatcher, notifier, producers }
    }

    pub fn db(&self) -> &B {
        &self.db
    }

    pub fn dispatcher(&self) -> &DispatchApi<B> {
        &self.dispatcher
    }
}

impl<B, G> OrderFlowApi<B, G>
where
    B: OrderFlowDatabase,
    G: PaymentGateway,
{
    /// Places a new order. It starts out Pending, with its bill fixed from here on.
    pub async fn create_order(&self, order: NewOrder) -> Result<Order, OrderFlowError> {
        validate_items(&order.items)?;
        let grand_total = order.bill.grand_total;
        if grand_total.value() < 0 || grand_total > Money::from_major(MAX_GRAND_TOTAL) {
            let msg = format!("The grand total of {grand_total} is out of range");
            return Err(OrderFlowError::InvalidOrder(msg));
        }
        let mut order = order;
        match (order.delivery_option, order.delivery.schedule.take()) {
            (DeliveryOption::Scheduled, None) => {
                return Err(OrderFlowError::InvalidOrder("A scheduled order needs a delivery window".into()));
            },
            (DeliveryOption::OnDemand, Some(_)) => {
                return Err(OrderFlowError::InvalidOrder("An on-demand order cannot have a delivery window".into()));
            },
            (_, Some(window)) => order.delivery.schedule = Some(validate_window(window)?),
            (_, None) => {},
        }
        let order = self.db.insert_order(order, Utc::now()).await?;
        info!("🔄️📦️ Order {} placed by customer {} for {}", order.id, order.customer_id, order.grand_total());
        Ok(order)
    }

    /// Accepts a Pending order.
    ///
    /// The status change, the commission split (for merchants on the Commission model) and the delivery task (for
    /// anything but Take Away) commit together. If the task cannot be created, the order stays Pending and
    /// [`OrderFlowError::TaskCreationError`] is returned.
    ///
    /// Once committed, the task is offered to agents and the ordered quantities are taken off the merchant's stock.
    /// Problems with the commission, the stock or the offers do not undo the confirmation. They are reported in
    /// [`ConfirmResult::warnings`].
    pub async fn confirm(&self, order_id: &OrderId, actor: Actor) -> Result<ConfirmResult, OrderFlowError> {
        let order = self.fetch_existing_order(order_id).await?;
        if order.status != OrderStatus::Pending {
            warn!("🔄️✅️ Order {order_id} cannot be confirmed. It is {}", order.status);
            return Err(OrderFlowError::invalid_transition(&order, OrderAction::Confirm));
        }
        let mut warnings = Vec::new();
        let commission = self.commission_entry(&order, &mut warnings).await?;
        let task = order.delivery_mode.needs_task().then(|| NewTask::for_order(&order));
        let now = Utc::now();
        let confirmation = OrderConfirmation { order_id: order_id.clone(), actor, at: now, commission, task };
        let confirmed = self.db.confirm_order(confirmation).await?;
        let order = confirmed.order;
        info!("🔄️✅️ Order {order_id} is on its way");

        let mut offered_to = Vec::new();
        if let Some(task) = &confirmed.task {
            match self.dispatcher.offer_task(&order, task, now).await {
                Ok(agents) => offered_to = agents,
                Err(e) => {
                    error!("🔄️✅️ Could not offer task {} for order {order_id}. {e}", task.id);
                    warnings.push(ConfirmWarning::DispatchFailed(e.to_string()));
                },
            }
        }
        if let Some(merchant_id) = &order.merchant_id {
            match self.db.reduce_available_quantity(&order.items, merchant_id).await {
                Ok(report) if !report.unknown.is_empty() => {
                    warn!("🔄️✅️ Stock not adjusted for unknown products {:?} on order {order_id}", report.unknown);
                    warnings.push(ConfirmWarning::InventoryNotAdjusted(report.unknown));
                },
                Ok(_) => trace!("🔄️✅️ Stock adjusted for order {order_id}"),
                Err(e) => {
                    error!("🔄️✅️ Could not adjust stock for order {order_id}. {e}");
                    warnings.push(ConfirmWarning::InventoryFailed(e.to_string()));
                },
            }
        }

        let payload = json!({ "orderId": order.id, "status": order.status });
        self.notify(NotificationKind::OrderConfirmed, &order, payload).await;
        self.call_status_changed_hook(&order, OrderStatus::Pending).await;
        Ok(ConfirmResult { order, task: confirmed.task, offered_to, warnings })
    }

    async fn commission_entry(
        &self,
        order: &Order,
        warnings: &mut Vec<ConfirmWarning>,
    ) -> Result<Option<CommissionEntry>, OrderFlowError> {
        let Some(merchant_id) = &order.merchant_id else {
            return Ok(None);
        };
        let merchant = match self.db.fetch_merchant(merchant_id).await? {
            Some(m) if m.pricing_model == PricingModel::Commission => m,
            _ => return Ok(None),
        };
        let Some(rule) = self.db.fetch_commission_rule(&merchant.id).await? else {
            warn!("🔄️💰️ Merchant {merchant_id} is on commission, but has no commission rule. Order {}", order.id);
            warnings.push(ConfirmWarning::CommissionRuleMissing(merchant.id));
            return Ok(None);
        };
        let rule = CommissionRule::from(&rule);
        let split = order.item_total().and_then(|total| commission::split(total, rule).map(|split| (total, split)));
        match split {
            Ok((total_amount, split)) => {
                debug!(
                    "🔄️💰️ Commission on order {}: merchant {}, platform {}",
                    order.id, split.merchant_earnings, split.famto_earnings
                );
                Ok(Some(CommissionEntry { merchant_id: merchant.id, total_amount, split, payment_mode: order.payment_mode }))
            },
            Err(e) => {
                error!("🔄️💰️ Could not compute the commission on order {}. {e}", order.id);
                warnings.push(ConfirmWarning::CommissionFailed(e.to_string()));
                Ok(None)
            },
        }
    }

    /// Cancels a Pending or On-going order and returns the customer's money.
    ///
    /// Wallet payments are credited back to the wallet. Online payments are refunded through the payment gateway, and
    /// if the gateway fails, the order is left as it was and [`OrderFlowError::PaymentGatewayFailure`] is returned.
    /// Cash-on-delivery orders involve no money.
    pub async fn reject(&self, order_id: &OrderId, actor: Actor) -> Result<CancelledOrder, OrderFlowError> {
        let order = self.fetch_existing_order(order_id).await?;
        if order.status.is_terminal() {
            warn!("🔄️❌️ Order {order_id} cannot be rejected. It is already {}", order.status);
            return Err(OrderFlowError::invalid_transition(&order, OrderAction::Reject));
        }
        let plan = refund::resolve(&order)?;
        debug!("🔄️❌️ Refund plan for order {order_id}: {plan:?}");
        let cancellation = OrderCancellation { order_id: order_id.clone(), actor, at: Utc::now(), plan };
        let cancelled = self.db.cancel_order(cancellation, &self.gateway).await?;
        info!("🔄️❌️ Order {order_id} cancelled. Refund: {:?}", cancelled.refund);
        if let Some(agent_id) = &cancelled.released_agent {
            debug!("🔄️❌️ Agent {agent_id} is free again");
        }
        let payload = json!({ "orderId": order_id, "status": cancelled.order.status, "refund": cancelled.refund });
        self.notify(NotificationKind::OrderRejected, &cancelled.order, payload).await;
        self.call_status_changed_hook(&cancelled.order, order.status).await;
        Ok(cancelled)
    }

    /// Stamps an On-going order as ready. Delivery orders need an agent first.
    pub async fn mark_ready(&self, order_id: &OrderId, actor: Actor) -> Result<Order, OrderFlowError> {
        let order = self.fetch_existing_order(order_id).await?;
        let requires_task = order.delivery_mode.needs_task();
        let order = self.db.mark_order_ready(order_id, &actor, requires_task, Utc::now()).await?;
        info!("🔄️🍱️ Order {order_id} is ready");
        let payload = json!({ "orderId": order_id, "status": order.status });
        self.notify(NotificationKind::OrderReady, &order, payload).await;
        Ok(order)
    }

    /// Completes an On-going order.
    ///
    /// Take Away orders complete as soon as the customer picks them up. Delivery orders complete together with their
    /// Assigned task, and the agent becomes free again.
    pub async fn mark_completed(&self, order_id: &OrderId, actor: Actor) -> Result<CompletedOrder, OrderFlowError> {
        let order = self.fetch_existing_order(order_id).await?;
        let requires_task = order.delivery_mode.needs_task();
        let completion = OrderCompletion { order_id: order_id.clone(), actor, at: Utc::now(), requires_task };
        let completed = self.db.complete_order(completion).await?;
        info!("🔄️🏁️ Order {order_id} completed");
        let payload = json!({ "orderId": order_id, "status": completed.order.status });
        self.notify(NotificationKind::OrderCompleted, &completed.order, payload).await;
        self.call_status_changed_hook(&completed.order, order.status).await;
        Ok(completed)
    }

    /// Registers a multi-day order commitment for the merchant's inbox. Materialising it into daily orders happens
    /// elsewhere.
    pub async fn create_scheduled_order(&self, order: NewScheduledOrder) -> Result<ScheduledOrder, OrderFlowError> {
        validate_items(&order.items)?;
        let mut order = order;
        order.window = validate_window(order.window)?;
        let order = self.db.insert_scheduled_order(order, Utc::now()).await?;
        info!("🔄️📅️ Scheduled order {} placed for {} days", order.id, order.num_of_days);
        Ok(order)
    }

    pub async fn mark_scheduled_order_viewed(&self, id: &str) -> Result<(), OrderFlowError> {
        if self.db.mark_scheduled_order_viewed(id).await? {
            Ok(())
        } else {
            Err(OrderFlowError::OrderNotFound(OrderId::from(id)))
        }
    }

    pub async fn unviewed_scheduled_orders(&self, merchant_id: &str) -> Result<Vec<ScheduledOrder>, OrderFlowError> {
        self.db.fetch_unviewed_scheduled_orders(merchant_id).await
    }

    pub async fn fetch_order(&self, order_id: &OrderId) -> Result<Option<Order>, OrderFlowError> {
        Ok(self.db.fetch_order(order_id).await?)
    }

    pub async fn fetch_task_for_order(&self, order_id: &OrderId) -> Result<Option<Task>, OrderFlowError> {
        Ok(self.db.fetch_task_for_order(order_id).await?)
    }

    pub async fn fetch_customer(&self, customer_id: &str) -> Result<Option<Customer>, OrderFlowError> {
        self.db.fetch_customer(customer_id).await
    }

    pub async fn fetch_customer_transactions(
        &self,
        customer_id: &str,
    ) -> Result<Vec<CustomerTransaction>, OrderFlowError> {
        self.db.fetch_customer_transactions(customer_id).await
    }

    pub async fn fetch_commission_logs_for_order(&self, order_id: &OrderId) -> Result<Vec<CommissionLog>, OrderFlowError> {
        self.db.fetch_commission_logs(order_id).await
    }

    async fn fetch_existing_order(&self, order_id: &OrderId) -> Result<Order, OrderFlowError> {
        self.db.fetch_order(order_id).await?.ok_or_else(|| OrderFlowError::OrderNotFound(order_id.clone()))
    }

    async fn notify(&self, kind: NotificationKind, order: &Order, payload: serde_json::Value) {
        let context = RecipientContext::from(order);
        self.notifier.notify_default(&self.db, kind, &context, payload).await;
    }

    async fn call_status_changed_hook(&self, order: &Order, old_status: OrderStatus) {
        for emitter in &self.producers.order_status_producer {
            debug!("🔄️ Notifying order status change hook subscribers");
            let event = OrderStatusChangedEvent::new(order.id.clone(), old_status, order.status);
            emitter.publish_event(event).await;
        }
    }
}

fn validate_items(items: &[OrderItem]) -> Result<(), OrderFlowError> {
    if items.is_empty() {
        return Err(OrderFlowError::InvalidOrder("An order needs at least one item".into()));
    }
    if let Some(item) = items.iter().find(|i| i.quantity <= 0 || i.price.value() < 0) {
        return Err(OrderFlowError::InvalidOrder(format!("Item '{}' has an invalid quantity or price", item.name)));
    }
    item_total(items).map_err(|e| OrderFlowError::InvalidOrder(format!("The item total is out of range. {e}")))?;
    Ok(())
}

/// Rebuilds the window from its dates, so that `num_of_days` always covers `start_date..=end_date`.
fn validate_window(window: ScheduleWindow) -> Result<ScheduleWindow, OrderFlowError> {
    let ScheduleWindow { start_date, end_date, time, num_of_days } = window;
    let window = ScheduleWindow::new(start_date, end_date, time)
        .ok_or_else(|| OrderFlowError::InvalidOrder("The delivery window is empty".into()))?;
    if num_of_days != window.num_of_days {
        debug!("🔄️📅️ Delivery window {start_date}..={end_date} spans {} days, not {num_of_days}", window.num_of_days);
    }
    Ok(window)
}
