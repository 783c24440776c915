use std::fmt::Debug;

use chrono::{DateTime, Utc};
use log::*;
use serde_json::{json, Value};

use crate::{
    db_types::{
        Agent,
        AllocationType,
        AutoAllocation,
        Merchant,
        NewTask,
        Order,
        OrderId,
        PriorityType,
        Task,
        TaskId,
        TaskStatus,
        MONTHLY_SALARIED_RULE,
    },
    engine_api::dispatch_objects::{DispatchReport, ExpiryReport},
    geo::{self, GeoPoint, Located},
    notifications::{NotificationKind, Notifier, Recipient, RecipientContext, ResolvedRecipient},
    pool::PoolCriteria,
    traits::{AcceptOutcome, DispatchDatabase, DispatchError, ManagerDirectory},
};

/// `DispatchApi` creates delivery tasks, offers them to eligible agents and settles the race between agents accepting
/// the same task.
pub struct DispatchApi<B> {
    db: B,
    notifier: Notifier,
}

impl<B> Debug for DispatchApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "DispatchApi")
    }
}

impl<B> DispatchApi<B> {
    pub fn new(db: B, notifier: Notifier) -> Self {
        Self { db, notifier }
    }

    pub fn db(&self) -> &B {
        &self.db
    }
}

impl<B> DispatchApi<B>
where B: DispatchDatabase + ManagerDirectory
{
    /// Makes sure the order has a delivery task and offers it to the eligible agents.
    ///
    /// Calling this again for the same order re-uses the existing task. Agents that were offered it before are not
    /// offered it again.
    pub async fn dispatch(&self, order_id: &OrderId) -> Result<DispatchReport, DispatchError> {
        let order = self.db.fetch_order(order_id).await?.ok_or_else(|| DispatchError::OrderNotFound(order_id.clone()))?;
        if !order.delivery_mode.needs_task() {
            return Err(DispatchError::NoTaskRequired(order_id.clone()));
        }
        let now = Utc::now();
        let (task, created) = self.db.insert_task(NewTask::for_order(&order), now).await?;
        let offered_to = self.offer_task(&order, &task, now).await?;
        Ok(DispatchReport { task_id: task.id, created, offered_to })
    }

    /// Offers an Unassigned task to the agents the auto-allocation policy picks out, and notifies each of them.
    /// Returns the agents that received a new offer.
    ///
    /// Nothing is offered when auto-allocation is switched off. The task then waits for manual assignment.
    pub async fn offer_task(&self, order: &Order, task: &Task, at: DateTime<Utc>) -> Result<Vec<String>, DispatchError> {
        if task.status != TaskStatus::Unassigned {
            debug!("🛵️ Task {} is already {}. Nothing to offer", task.id, task.status);
            return Ok(Vec::new());
        }
        let policy = self.db.fetch_allocation_policy().await?;
        if !policy.is_active {
            info!("🛵️ Auto-allocation is off. Task {} for order {} awaits manual assignment", task.id, order.id);
            return Ok(Vec::new());
        }
        self.offer_to_pool(order, task, &policy, at).await
    }

    async fn offer_to_pool(
        &self,
        order: &Order,
        task: &Task,
        policy: &AutoAllocation,
        at: DateTime<Utc>,
    ) -> Result<Vec<String>, DispatchError> {
        let pool = self.eligible_agents(order, task, policy).await?;
        let agent_ids = pool.into_iter().map(|a| a.id).collect::<Vec<_>>();
        let expires_at = at + policy.expire_time();
        let offered = self.db.record_offers(task.id, &agent_ids, at, expires_at).await?;
        if offered.is_empty() {
            debug!("🛵️ Nobody new to offer task {} to", task.id);
            return Ok(offered);
        }
        info!("🛵️ Task {} for order {} offered to {} agents until {expires_at}", task.id, order.id, offered.len());
        let recipients = offered.iter().map(|id| ResolvedRecipient::new(Recipient::Driver, id.as_str())).collect();
        let payload = offer_payload(order, task, expires_at);
        self.notifier.notify_resolved(NotificationKind::TaskOffered, recipients, payload).await;
        Ok(offered)
    }

    /// The agents the policy allows to take this task, nearest first when allocating by distance.
    async fn eligible_agents(
        &self,
        order: &Order,
        task: &Task,
        policy: &AutoAllocation,
    ) -> Result<Vec<Agent>, DispatchError> {
        let merchant = match &order.merchant_id {
            Some(id) => self.db.fetch_merchant(id).await?,
            None => None,
        };
        let salaried_rule = match policy.priority_type {
            PriorityType::MonthlySalaried => self.db.fetch_pricing_rule_id(MONTHLY_SALARIED_RULE).await?,
            PriorityType::Default => None,
        };
        let criteria = PoolCriteria::new(merchant.as_ref(), policy.priority_type, salaried_rule);
        let pool = criteria.select(self.db.fetch_available_agents().await?);
        if policy.allocation_type == AllocationType::All {
            return Ok(pool);
        }
        let origin = task.pickup.location.or_else(|| merchant.as_ref().and_then(Merchant::location));
        let Some(origin) = origin else {
            warn!("🛵️ Task {} has no pickup location to measure distances from. Offering to the whole pool", task.id);
            return Ok(pool);
        };
        let mut nearby = geo::within(&origin, pool, policy.max_radius_km);
        nearby.sort_by(|a, b| distance_from(&origin, a).total_cmp(&distance_from(&origin, b)));
        Ok(nearby)
    }

    /// Settles an agent's attempt to accept a task. Of any number of concurrent attempts on the same task, exactly
    /// one is [`AcceptOutcome::Accepted`]. The others are told why they lost and change nothing.
    pub async fn accept_task(&self, task_id: TaskId, agent_id: &str) -> Result<AcceptOutcome, DispatchError> {
        let outcome = self.db.accept_task(task_id, agent_id, Utc::now()).await?;
        match &outcome {
            AcceptOutcome::Accepted(task) => {
                info!("🛵️ Agent {agent_id} accepted task {task_id} for order {}", task.order_id);
                if let Some(order) = self.db.fetch_order(&task.order_id).await? {
                    let context = RecipientContext::from(&order).with_agent(agent_id);
                    let payload = json!({ "orderId": order.id, "taskId": task_id, "agentId": agent_id });
                    self.notifier.notify_default(&self.db, NotificationKind::TaskAssigned, &context, payload).await;
                }
            },
            other => debug!("🛵️ Agent {agent_id} did not get task {task_id}: {other:?}"),
        }
        Ok(outcome)
    }

    /// Records that an agent turned an offer down. Returns false if the agent had no pending offer for the task.
    pub async fn decline_task(&self, task_id: TaskId, agent_id: &str) -> Result<bool, DispatchError> {
        let declined = self.db.decline_offer(task_id, agent_id).await?;
        if declined {
            debug!("🛵️ Agent {agent_id} declined task {task_id}");
        }
        Ok(declined)
    }

    /// Expires every offer that has lapsed by `now`.
    ///
    /// Each task that lost its last live offer in this sweep, and is still waiting for an agent, is offered once to
    /// the eligible agents who have not seen it yet. If there are none, the task is left for manual assignment and
    /// the admin is notified.
    pub async fn expire_stale_offers(&self, now: DateTime<Utc>) -> Result<ExpiryReport, DispatchError> {
        let expired = self.db.expire_offers(now).await?;
        let mut report = ExpiryReport { expired, ..Default::default() };
        if report.expired.is_empty() {
            return Ok(report);
        }
        debug!("🛵️ Offers lapsed for {} tasks", report.expired.len());
        let policy = self.db.fetch_allocation_policy().await?;
        let unclaimed = self.db.fetch_unclaimed_tasks(now).await?;
        for task in unclaimed.into_iter().filter(|t| report.expired.contains(&t.id)) {
            let Some(order) = self.db.fetch_order(&task.order_id).await? else {
                warn!("🛵️ Task {} refers to order {}, which does not exist", task.id, task.order_id);
                continue;
            };
            let offered =
                if policy.is_active { self.offer_to_pool(&order, &task, &policy, now).await? } else { Vec::new() };
            if offered.is_empty() {
                info!("🛵️ Nobody accepted task {} for order {}. It needs manual assignment", task.id, order.id);
                let context = RecipientContext::from(&order);
                let payload = json!({ "orderId": order.id, "taskId": task.id });
                self.notifier.notify_default(&self.db, NotificationKind::TaskUnclaimed, &context, payload).await;
                report.unclaimed.push(task.id);
            } else {
                report.reoffered.push(task.id);
            }
        }
        Ok(report)
    }
}

fn distance_from<T: Located>(origin: &GeoPoint, candidate: &T) -> f64 {
    candidate.position().map(|p| origin.distance_km(&p)).unwrap_or(f64::INFINITY)
}

fn offer_payload(order: &Order, task: &Task, expires_at: DateTime<Utc>) -> Value {
    json!({
        "orderId": order.id,
        "taskId": task.id,
        "deliveryMode": order.delivery_mode,
        "pickup": task.pickup.0,
        "dropOff": task.drop_off.0,
        "distanceKm": order.delivery.distance_km,
        "grandTotal": order.grand_total(),
        "expiresAt": expires_at,
    })
}
