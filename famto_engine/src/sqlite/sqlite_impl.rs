//! `SqliteDatabase` is a concrete implementation of a Famto engine backend.
//!
//! Unsurprisingly, it uses SQLite as the backend and implements all the traits defined in the [`traits`] module.
//!
//! Every write transaction opens with the conditional update that decides whether it may proceed. The transaction
//! then holds the write lock for its whole duration, and a competing transaction waits (up to the busy timeout)
//! rather than acting on a stale view.
//!
//! [`traits`]: crate::traits
use std::fmt::Debug;

use chrono::{DateTime, Utc};
use famto_common::MoneyError;
use log::*;
use sqlx::SqlitePool;

use super::db::{
    agents,
    allocation,
    commission,
    counters,
    customers,
    db_url,
    managers,
    merchants,
    new_pool,
    offers,
    orders,
    scheduled_orders,
    tasks,
};
use crate::{
    db_types::{
        format_period_id,
        id_period,
        Actor,
        Agent,
        AutoAllocation,
        CommissionLog,
        CommissionRuleRecord,
        Customer,
        CustomerTransaction,
        DeliveryOption,
        Merchant,
        Money,
        MoneyChannel,
        NewOrder,
        NewScheduledOrder,
        NewTask,
        OfferStatus,
        Order,
        OrderId,
        OrderItem,
        OrderStatus,
        ScheduledOrder,
        Step,
        StepRecord,
        Task,
        TaskId,
        TaskOffer,
        TaskStatus,
        TransactionType,
    },
    refund::{RefundOutcome, RefundPlan},
    traits::{
        AcceptOutcome,
        CancelledOrder,
        CompletedOrder,
        ConfirmedOrder,
        DispatchDatabase,
        DispatchError,
        InventoryReport,
        ManagerDirectory,
        NotificationError,
        OrderAction,
        OrderCancellation,
        OrderCompletion,
        OrderConfirmation,
        OrderFlowDatabase,
        OrderFlowError,
        PaymentGateway,
        RefundReceipt,
    },
};

const ORDER_ID_PREFIX: char = 'O';
/// How long a refund claim shields an order before another cancellation may take it over. Outlasts any gateway call.
const REFUND_CLAIM_LEASE_SECS: i64 = 120;
const SCHEDULED_ORDER_ID_PREFIX: char = 'S';

#[derive(Clone)]
pub struct SqliteDatabase {
    url: String,
    pool: SqlitePool,
}

impl Debug for SqliteDatabase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "SqliteDatabase ({:?})", self.pool)
    }
}

impl DispatchDatabase for SqliteDatabase {
    async fn fetch_order(&self, order_id: &OrderId) -> Result<Option<Order>, DispatchError> {
        let mut conn = self.pool.acquire().await?;
        let order = orders::fetch_order(order_id, &mut conn).await?;
        Ok(order)
    }

    async fn fetch_merchant(&self, merchant_id: &str) -> Result<Option<Merchant>, DispatchError> {
        let mut conn = self.pool.acquire().await?;
        let merchant = merchants::fetch_merchant(merchant_id, &mut conn).await?;
        Ok(merchant)
    }

    async fn fetch_allocation_policy(&self) -> Result<AutoAllocation, DispatchError> {
        let mut conn = self.pool.acquire().await?;
        let policy = allocation::fetch_policy(&mut conn).await?.unwrap_or_default();
        Ok(policy)
    }

    async fn fetch_pricing_rule_id(&self, rule_name: &str) -> Result<Option<String>, DispatchError> {
        let mut conn = self.pool.acquire().await?;
        let id = allocation::fetch_pricing_rule_id(rule_name, &mut conn).await?;
        Ok(id)
    }

    async fn fetch_available_agents(&self) -> Result<Vec<Agent>, DispatchError> {
        let mut conn = self.pool.acquire().await?;
        let agents = agents::fetch_available_agents(&mut conn).await?;
        Ok(agents)
    }

    async fn fetch_agent(&self, agent_id: &str) -> Result<Option<Agent>, DispatchError> {
        let mut conn = self.pool.acquire().await?;
        let agent = agents::fetch_agent(agent_id, &mut conn).await?;
        Ok(agent)
    }

    async fn insert_task(&self, task: NewTask, at: DateTime<Utc>) -> Result<(Task, bool), DispatchError> {
        let mut tx = self.pool.begin().await?;
        let result = tasks::insert_task(task, at, &mut tx).await?;
        tx.commit().await?;
        Ok(result)
    }

    async fn fetch_task(&self, task_id: TaskId) -> Result<Option<Task>, DispatchError> {
        let mut conn = self.pool.acquire().await?;
        let task = tasks::fetch_task(task_id, &mut conn).await?;
        Ok(task)
    }

    async fn fetch_task_for_order(&self, order_id: &OrderId) -> Result<Option<Task>, DispatchError> {
        let mut conn = self.pool.acquire().await?;
        let task = tasks::fetch_task_for_order(order_id, &mut conn).await?;
        Ok(task)
    }

    async fn record_offers(
        &self,
        task_id: TaskId,
        agent_ids: &[String],
        offered_at: DateTime<Utc>,
        expires_at: DateTime<Utc>,
    ) -> Result<Vec<String>, DispatchError> {
        let mut tx = self.pool.begin().await?;
        let offered = offers::insert_offers(task_id, agent_ids, offered_at, expires_at, &mut tx).await?;
        tx.commit().await?;
        Ok(offered)
    }

    async fn fetch_offers(&self, task_id: TaskId) -> Result<Vec<TaskOffer>, DispatchError> {
        let mut conn = self.pool.acquire().await?;
        let offers = offers::fetch_offers(task_id, &mut conn).await?;
        Ok(offers)
    }

    /// In a single atomic transaction,
    /// * assigns the task to the agent, if the task is Unassigned and the agent holds a live offer,
    /// * marks the agent as Busy, if they are Free,
    /// * records the agent on the order, if the order is On-going and has no agent yet,
    /// * accepts the agent's offer and withdraws every other pending offer for the task.
    ///
    /// If any of the conditions fails, nothing is written and the reason is reported in the outcome.
    async fn accept_task(
        &self,
        task_id: TaskId,
        agent_id: &str,
        at: DateTime<Utc>,
    ) -> Result<AcceptOutcome, DispatchError> {
        let mut tx = self.pool.begin().await?;
        let Some(task) = tasks::assign_task(task_id, agent_id, at, &mut tx).await? else {
            tx.rollback().await?;
            return self.refused_acceptance(task_id, agent_id).await;
        };
        if !agents::claim_agent(agent_id, at, &mut tx).await? {
            tx.rollback().await?;
            debug!("🗃️ Agent {agent_id} is not free. Task {task_id} stays unassigned");
            return Ok(AcceptOutcome::AgentUnavailable);
        }
        if !orders::assign_agent(&task.order_id, agent_id, at, &mut tx).await? {
            tx.rollback().await?;
            debug!("🗃️ Order {} is no longer in progress. Task {task_id} stays unassigned", task.order_id);
            return Ok(AcceptOutcome::OrderClosed);
        }
        offers::resolve_offer(task_id, agent_id, OfferStatus::Accepted, &mut tx).await?;
        let withdrawn = offers::withdraw_offers(task_id, &mut tx).await?;
        tx.commit().await?;
        debug!("🗃️ Task {task_id} assigned to {agent_id}. {withdrawn} other offers withdrawn");
        Ok(AcceptOutcome::Accepted(task))
    }

    async fn decline_offer(&self, task_id: TaskId, agent_id: &str) -> Result<bool, DispatchError> {
        let mut conn = self.pool.acquire().await?;
        let declined = offers::resolve_offer(task_id, agent_id, OfferStatus::Declined, &mut conn).await?;
        Ok(declined)
    }

    async fn expire_offers(&self, at: DateTime<Utc>) -> Result<Vec<TaskId>, DispatchError> {
        let mut conn = self.pool.acquire().await?;
        let task_ids = offers::expire_offers(at, &mut conn).await?;
        Ok(task_ids)
    }

    async fn fetch_unclaimed_tasks(&self, at: DateTime<Utc>) -> Result<Vec<Task>, DispatchError> {
        let mut conn = self.pool.acquire().await?;
        let tasks = tasks::fetch_unclaimed_tasks(at, &mut conn).await?;
        Ok(tasks)
    }
}

impl ManagerDirectory for SqliteDatabase {
    async fn find_manager_by_role(&self, role: &str) -> Result<Option<String>, NotificationError> {
        let mut conn = self.pool.acquire().await?;
        let id = managers::find_by_role(role, &mut conn).await?;
        Ok(id)
    }
}

impl OrderFlowDatabase for SqliteDatabase {
    fn url(&self) -> &str {
        self.url.as_str()
    }

    /// The order id is drawn from the per-period counter inside the same transaction as the insert, so an id is never
    /// handed out twice and never skipped by a failed insert.
    async fn insert_order(&self, order: NewOrder, at: DateTime<Utc>) -> Result<Order, OrderFlowError> {
        let mut tx = self.pool.begin().await?;
        let prefix = match order.delivery_option {
            DeliveryOption::OnDemand => ORDER_ID_PREFIX,
            DeliveryOption::Scheduled => SCHEDULED_ORDER_ID_PREFIX,
        };
        let period = id_period(prefix, at);
        let seq = counters::next_in_period(&period, &mut tx).await?;
        let id = OrderId::from(format_period_id(&period, seq));
        if customers::fetch_customer(&order.customer_id, &mut tx).await?.is_none() {
            return Err(OrderFlowError::CustomerNotFound(order.customer_id));
        }
        let order = orders::insert_order(id, order, at, &mut tx).await?;
        tx.commit().await?;
        Ok(order)
    }

    async fn fetch_commission_rule(&self, merchant_id: &str) -> Result<Option<CommissionRuleRecord>, OrderFlowError> {
        let mut conn = self.pool.acquire().await?;
        let rule = commission::fetch_rule(merchant_id, &mut conn).await?;
        Ok(rule)
    }

    async fn confirm_order(&self, confirmation: OrderConfirmation) -> Result<ConfirmedOrder, OrderFlowError> {
        let OrderConfirmation { order_id, actor, at, commission: entry, task } = confirmation;
        let mut tx = self.pool.begin().await?;
        let record = StepRecord::new(&actor, at);
        let pending = [OrderStatus::Pending];
        if !orders::transition_status(&order_id, &pending, OrderStatus::OnGoing, Step::Accepted, &record, false, &mut tx)
            .await?
        {
            tx.rollback().await?;
            return self.refused_transition(&order_id, OrderAction::Confirm, false).await;
        }
        if let Some(entry) = &entry {
            orders::set_commission(&order_id, &entry.split, &mut tx).await?;
            commission::insert_log(&order_id, entry, at, &mut tx).await?;
        }
        let task = match task {
            Some(new_task) => {
                let (task, created) = tasks::insert_task(new_task, at, &mut tx).await.map_err(|e| {
                    error!("🗃️ Could not create the delivery task for order {order_id}. {e}");
                    OrderFlowError::TaskCreationError(e.to_string())
                })?;
                if !created {
                    debug!("🗃️ Order {order_id} already had task {}", task.id);
                }
                Some(task)
            },
            None => None,
        };
        let order =
            orders::fetch_order(&order_id, &mut tx).await?.ok_or_else(|| OrderFlowError::OrderNotFound(order_id.clone()))?;
        tx.commit().await?;
        debug!("🗃️ Order {order_id} confirmed by {:?} {}", actor.role, actor.user_id);
        Ok(ConfirmedOrder { order, task })
    }

    /// Wallet credits and cash orders cancel in a single transaction. A gateway refund is never awaited inside a
    /// transaction: the order is claimed first, the gateway is called with no lock held, and the cancellation then
    /// commits under the claim. While the claim is held, every other transition on the order is refused.
    async fn cancel_order<G: PaymentGateway>(
        &self,
        cancellation: OrderCancellation,
        gateway: &G,
    ) -> Result<CancelledOrder, OrderFlowError> {
        let OrderCancellation { order_id, actor, at, plan } = cancellation;
        let receipt = match &plan {
            RefundPlan::GatewayRefund { payment_id, amount, .. } => {
                Some(self.refund_under_claim(&order_id, payment_id, *amount, at, gateway).await?)
            },
            RefundPlan::WalletCredit { .. } | RefundPlan::NoMovement => None,
        };
        let mut tx = self.pool.begin().await?;
        let record = StepRecord::new(&actor, at);
        let moved = match &receipt {
            Some(receipt) => orders::cancel_claimed(&order_id, at, &record, &receipt.refund_id, &mut tx).await?,
            None => {
                let open = [OrderStatus::Pending, OrderStatus::OnGoing];
                let to = OrderStatus::Cancelled;
                orders::transition_status(&order_id, &open, to, Step::Cancelled, &record, false, &mut tx).await?
            },
        };
        if !moved {
            tx.rollback().await?;
            if let Some(receipt) = &receipt {
                error!("🗃️ Gateway refund {} went through but order {order_id} lost its refund claim", receipt.refund_id);
            }
            return self.refused_transition(&order_id, OrderAction::Reject, false).await;
        }
        let refund = match (plan, receipt) {
            (RefundPlan::WalletCredit { customer_id, amount }, _) => {
                let Some(new_balance) = customers::credit_wallet(&customer_id, amount, at, &mut tx).await? else {
                    let customer = customers::fetch_customer(&customer_id, &mut tx).await?;
                    tx.rollback().await?;
                    let Some(customer) = customer else {
                        return Err(OrderFlowError::CustomerNotFound(customer_id));
                    };
                    let e = MoneyError::Overflow(format!("{} + {amount}", customer.wallet_balance));
                    warn!("🗃️ Cannot credit the wallet of customer {customer_id} for order {order_id}. {e}");
                    return Err(e.into());
                };
                let channel = MoneyChannel::Wallet;
                let kind = TransactionType::RefundCredit;
                customers::insert_transaction(&customer_id, &order_id, kind, amount, channel, None, at, &mut tx).await?;
                RefundOutcome::WalletCredited { amount, new_balance }
            },
            (RefundPlan::GatewayRefund { customer_id, amount, .. }, Some(receipt)) => {
                let channel = MoneyChannel::Gateway;
                let kind = TransactionType::RefundCredit;
                let reference = Some(receipt.refund_id.as_str());
                customers::insert_transaction(&customer_id, &order_id, kind, amount, channel, reference, at, &mut tx)
                    .await?;
                RefundOutcome::GatewayRefunded { amount, refund_id: receipt.refund_id }
            },
            (RefundPlan::NoMovement, _) | (RefundPlan::GatewayRefund { .. }, None) => RefundOutcome::NoMovement,
        };
        offers::withdraw_offers_for_order(&order_id, &mut tx).await?;
        let released_agent = match tasks::fetch_task_for_order(&order_id, &mut tx).await? {
            Some(Task { status: TaskStatus::Assigned, agent_id: Some(agent_id), .. }) => {
                agents::release_agent(&agent_id, at, &mut tx).await?.then_some(agent_id)
            },
            _ => None,
        };
        let order =
            orders::fetch_order(&order_id, &mut tx).await?.ok_or_else(|| OrderFlowError::OrderNotFound(order_id.clone()))?;
        if let Err(e) = tx.commit().await {
            if let RefundOutcome::GatewayRefunded { refund_id, .. } = &refund {
                error!("🗃️ Gateway refund {refund_id} went through but cancelling order {order_id} failed. {e}");
            }
            return Err(e.into());
        }
        debug!("🗃️ Order {order_id} cancelled by {:?} {}", actor.role, actor.user_id);
        Ok(CancelledOrder { order, refund, released_agent })
    }

    async fn mark_order_ready(
        &self,
        order_id: &OrderId,
        actor: &Actor,
        requires_task: bool,
        at: DateTime<Utc>,
    ) -> Result<Order, OrderFlowError> {
        let mut tx = self.pool.begin().await?;
        let record = StepRecord::new(actor, at);
        if !orders::stamp_step(order_id, Step::Ready, &record, requires_task, &mut tx).await? {
            tx.rollback().await?;
            return self.refused_transition(order_id, OrderAction::MarkReady, requires_task).await;
        }
        let order =
            orders::fetch_order(order_id, &mut tx).await?.ok_or_else(|| OrderFlowError::OrderNotFound(order_id.clone()))?;
        tx.commit().await?;
        Ok(order)
    }

    /// In a single atomic transaction,
    /// * moves the order from On-going to Completed and stamps the `completed` step. Delivery orders must have an
    ///   agent,
    /// * completes the order's Assigned task and frees its agent, for delivery orders.
    async fn complete_order(&self, completion: OrderCompletion) -> Result<CompletedOrder, OrderFlowError> {
        let OrderCompletion { order_id, actor, at, requires_task } = completion;
        let mut tx = self.pool.begin().await?;
        let record = StepRecord::new(&actor, at);
        let ongoing = [OrderStatus::OnGoing];
        let moved = orders::transition_status(
            &order_id,
            &ongoing,
            OrderStatus::Completed,
            Step::Completed,
            &record,
            requires_task,
            &mut tx,
        )
        .await?;
        if !moved {
            tx.rollback().await?;
            return self.refused_transition(&order_id, OrderAction::Complete, requires_task).await;
        }
        let (task, released_agent) = if requires_task {
            let Some(task) = tasks::complete_task(&order_id, at, &mut tx).await? else {
                tx.rollback().await?;
                warn!("🗃️ Order {order_id} has an agent but its task is not Assigned. It cannot be completed");
                return Err(OrderFlowError::TaskNotAssigned(order_id));
            };
            let released = match &task.agent_id {
                Some(agent_id) => agents::release_agent(agent_id, at, &mut tx).await?.then(|| agent_id.clone()),
                None => None,
            };
            (Some(task), released)
        } else {
            (None, None)
        };
        let order =
            orders::fetch_order(&order_id, &mut tx).await?.ok_or_else(|| OrderFlowError::OrderNotFound(order_id.clone()))?;
        tx.commit().await?;
        debug!("🗃️ Order {order_id} completed by {:?} {}", actor.role, actor.user_id);
        Ok(CompletedOrder { order, task, released_agent })
    }

    async fn reduce_available_quantity(
        &self,
        items: &[OrderItem],
        merchant_id: &str,
    ) -> Result<InventoryReport, OrderFlowError> {
        let mut tx = self.pool.begin().await?;
        let mut report = InventoryReport::default();
        for (product_id, quantity) in merchants::tracked_items(items) {
            if merchants::reduce_quantity(product_id, merchant_id, quantity, &mut tx).await? {
                report.adjusted.push(product_id.to_string());
            } else {
                report.unknown.push(product_id.to_string());
            }
        }
        tx.commit().await?;
        Ok(report)
    }

    async fn fetch_customer(&self, customer_id: &str) -> Result<Option<Customer>, OrderFlowError> {
        let mut conn = self.pool.acquire().await?;
        let customer = customers::fetch_customer(customer_id, &mut conn).await?;
        Ok(customer)
    }

    async fn fetch_customer_transactions(
        &self,
        customer_id: &str,
    ) -> Result<Vec<CustomerTransaction>, OrderFlowError> {
        let mut conn = self.pool.acquire().await?;
        let txs = customers::fetch_transactions(customer_id, &mut conn).await?;
        Ok(txs)
    }

    async fn fetch_commission_logs(&self, order_id: &OrderId) -> Result<Vec<CommissionLog>, OrderFlowError> {
        let mut conn = self.pool.acquire().await?;
        let logs = commission::fetch_logs(order_id, &mut conn).await?;
        Ok(logs)
    }

    async fn insert_scheduled_order(
        &self,
        order: NewScheduledOrder,
        at: DateTime<Utc>,
    ) -> Result<ScheduledOrder, OrderFlowError> {
        let mut tx = self.pool.begin().await?;
        let period = id_period(SCHEDULED_ORDER_ID_PREFIX, at);
        let seq = counters::next_in_period(&period, &mut tx).await?;
        let id = format_period_id(&period, seq);
        if customers::fetch_customer(&order.customer_id, &mut tx).await?.is_none() {
            return Err(OrderFlowError::CustomerNotFound(order.customer_id));
        }
        let order = scheduled_orders::insert_scheduled_order(&id, order, at, &mut tx).await?;
        tx.commit().await?;
        Ok(order)
    }

    async fn fetch_scheduled_order(&self, id: &str) -> Result<Option<ScheduledOrder>, OrderFlowError> {
        let mut conn = self.pool.acquire().await?;
        let order = scheduled_orders::fetch_scheduled_order(id, &mut conn).await?;
        Ok(order)
    }

    async fn mark_scheduled_order_viewed(&self, id: &str) -> Result<bool, OrderFlowError> {
        let mut conn = self.pool.acquire().await?;
        let found = scheduled_orders::mark_viewed(id, &mut conn).await?;
        Ok(found)
    }

    async fn fetch_unviewed_scheduled_orders(&self, merchant_id: &str) -> Result<Vec<ScheduledOrder>, OrderFlowError> {
        let mut conn = self.pool.acquire().await?;
        let orders = scheduled_orders::fetch_unviewed(merchant_id, &mut conn).await?;
        Ok(orders)
    }
}

impl SqliteDatabase {
    /// Creates a new database API object
    pub async fn new(max_connections: u32) -> Result<Self, sqlx::Error> {
        let url = db_url();
        SqliteDatabase::new_with_url(url.as_str(), max_connections).await
    }

    pub async fn new_with_url(url: &str, max_connections: u32) -> Result<Self, sqlx::Error> {
        trace!("Creating new database connection pool with url {url}");
        let pool = new_pool(url, max_connections).await?;
        let url = url.to_string();
        Ok(Self { url, pool })
    }

    /// Returns a reference to the database connection pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }

    /// Brings the schema up to date. Migrations that have already run are skipped.
    pub async fn run_migrations(&self) -> Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("./src/sqlite/migrations").run(&self.pool).await?;
        info!("🗃️ Database migrations are up to date");
        Ok(())
    }

    /// Claims the order, then asks the gateway for the refund with no transaction open. If the gateway fails, the
    /// claim is dropped and the order is left as it was.
    ///
    /// A successful refund is written to the order straight away, under the claim. If the cancellation is then
    /// interrupted, the next cancellation that takes over the claim completes with the recorded refund instead of
    /// refunding the payment a second time.
    async fn refund_under_claim<G: PaymentGateway>(
        &self,
        order_id: &OrderId,
        payment_id: &str,
        amount: Money,
        at: DateTime<Utc>,
        gateway: &G,
    ) -> Result<RefundReceipt, OrderFlowError> {
        let mut conn = self.pool.acquire().await?;
        let stale_before = at - chrono::Duration::seconds(REFUND_CLAIM_LEASE_SECS);
        if !orders::claim_for_refund(order_id, at, stale_before, &mut conn).await? {
            drop(conn);
            return self.refused_transition(order_id, OrderAction::Reject, false).await;
        }
        let recorded = orders::fetch_order(order_id, &mut conn).await?.and_then(|o| o.refund_id);
        drop(conn);
        if let Some(refund_id) = recorded {
            warn!("🗃️ Order {order_id} was already refunded as {refund_id}. Completing its interrupted cancellation");
            return Ok(RefundReceipt { refund_id });
        }
        trace!("🗃️ Order {order_id} claimed for a refund of {amount}");
        match gateway.refund(payment_id, amount).await {
            Ok(receipt) => {
                let mut conn = self.pool.acquire().await?;
                match orders::record_refund(order_id, at, &receipt.refund_id, &mut conn).await {
                    Ok(true) => {},
                    Ok(false) => {
                        warn!("🗃️ The refund claim on order {order_id} was taken over while the gateway was busy")
                    },
                    Err(e) => {
                        let refund_id = &receipt.refund_id;
                        error!("🗃️ Gateway refund {refund_id} went through but was not recorded on order {order_id}. {e}");
                        return Err(e.into());
                    },
                }
                Ok(receipt)
            },
            Err(e) => {
                error!("🗃️ Refund of {amount} for order {order_id} failed. The order was not cancelled. {e}");
                let mut conn = self.pool.acquire().await?;
                if !orders::release_refund_claim(order_id, at, &mut conn).await? {
                    warn!("🗃️ The refund claim on order {order_id} was taken over while the gateway was busy");
                }
                Err(e.into())
            },
        }
    }

    /// Works out why a conditional status update matched no row.
    async fn refused_transition<T>(
        &self,
        order_id: &OrderId,
        action: OrderAction,
        requires_agent: bool,
    ) -> Result<T, OrderFlowError> {
        let mut conn = self.pool.acquire().await?;
        let order = orders::fetch_order(order_id, &mut conn)
            .await?
            .ok_or_else(|| OrderFlowError::OrderNotFound(order_id.clone()))?;
        if !order.status.is_terminal() && order.refund_claimed_at.is_some() {
            warn!("🗃️ Cannot {action} order {order_id}. A refund for its cancellation is in progress");
            return Err(OrderFlowError::RefundInProgress(order_id.clone()));
        }
        if requires_agent && order.status == OrderStatus::OnGoing && order.agent_id.is_none() {
            warn!("🗃️ Cannot {action} order {order_id}. No agent has accepted its delivery task yet");
            return Err(OrderFlowError::TaskNotAssigned(order_id.clone()));
        }
        warn!("🗃️ Cannot {action} order {order_id} while it is {}", order.status);
        Err(OrderFlowError::invalid_transition(&order, action))
    }

    /// Works out why an acceptance was refused.
    async fn refused_acceptance(&self, task_id: TaskId, agent_id: &str) -> Result<AcceptOutcome, DispatchError> {
        let mut conn = self.pool.acquire().await?;
        let task = tasks::fetch_task(task_id, &mut conn).await?.ok_or(DispatchError::TaskNotFound(task_id))?;
        if task.status != TaskStatus::Unassigned {
            debug!("🗃️ Agent {agent_id} lost the race for task {task_id}");
            return Ok(AcceptOutcome::AlreadyAssigned { task_id, agent_id: task.agent_id });
        }
        let offer = offers::fetch_offer(task_id, agent_id, &mut conn).await?;
        let outcome = match offer.map(|o| o.status) {
            Some(OfferStatus::Pending) | Some(OfferStatus::Expired) => AcceptOutcome::OfferExpired,
            Some(OfferStatus::Withdrawn) => AcceptOutcome::OrderClosed,
            Some(OfferStatus::Accepted) | Some(OfferStatus::Declined) | None => AcceptOutcome::NotOffered,
        };
        debug!("🗃️ Agent {agent_id} cannot accept task {task_id}: {outcome:?}");
        Ok(outcome)
    }
}
