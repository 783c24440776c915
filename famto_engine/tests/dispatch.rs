use chrono::{Duration, Utc};
use famto_engine::{
    db_types::{
        AgentStatus,
        AllocationType,
        ApprovalStatus,
        AutoAllocation,
        DeliveryDetail,
        DeliveryMode,
        Money,
        NewAgent,
        NewOrder,
        OfferStatus,
        Order,
        PaymentMode,
        PricingModel,
        PriorityType,
        Task,
        TaskStatus,
        MONTHLY_SALARIED_RULE,
    },
    pool::FISH_AND_MEAT_TAG,
    test_utils::seed,
    traits::{AcceptOutcome, DispatchDatabase, DispatchError},
};
use tokio::runtime::Runtime;

mod support;

use support::*;

/// Places and confirms a delivery order for the given merchant, returning the order and its task.
async fn confirmed_delivery(sys: &TestSystem, merchant_id: &str) -> (Order, Task, Vec<String>) {
    let order = sys.place(home_delivery("cust-1", merchant_id, PaymentMode::CashOnDelivery)).await;
    let result = sys.api.confirm(&order.id, merchant_actor(merchant_id)).await.expect("Error confirming order");
    let task = result.task.expect("Delivery order should have a task");
    (result.order, task, result.offered_to)
}

async fn seed_pool(sys: &TestSystem) {
    seed::customer(&sys.db, "cust-1", Money::default()).await;
    seed::agent(&sys.db, NewAgent::available("agent-fm", "Faisal").at(kochi()).with_tag(FISH_AND_MEAT_TAG)).await;
    seed::agent(&sys.db, NewAgent::available("agent-near", "Nisha").at(ernakulam_north())).await;
    seed::agent(&sys.db, NewAgent::available("agent-far", "Thomas").at(thrissur())).await;
    seed::agent(&sys.db, NewAgent::available("agent-busy", "Biju").at(kochi()).with_status(AgentStatus::Busy)).await;
    seed::agent(
        &sys.db,
        NewAgent::available("agent-new", "Meera").at(kochi()).with_approval(ApprovalStatus::Pending),
    )
    .await;
}

#[test]
fn fish_and_meat_merchants_get_tagged_agents_only() {
    let rt = Runtime::new().unwrap();
    rt.block_on(async {
        let sys = setup().await;
        seed_pool(&sys).await;
        seed::allocation_policy(&sys.db, &active_policy(AllocationType::All, 0.0)).await;
        let butcher = seed::merchant("m-meat", Some("Meat"), PricingModel::Subscription, Some(kochi()));
        seed::insert_merchant(&sys.db, &butcher).await;
        let cafe = seed::merchant("m-cafe", Some("Restaurant"), PricingModel::Subscription, Some(kochi()));
        seed::insert_merchant(&sys.db, &cafe).await;

        let (_, _, offered) = confirmed_delivery(&sys, "m-meat").await;
        assert_eq!(offered, vec!["agent-fm".to_string()]);
        let (_, _, offered) = confirmed_delivery(&sys, "m-cafe").await;
        assert_eq!(offered, vec!["agent-far".to_string(), "agent-near".to_string()]);
        sys.tear_down().await;
    });
}

#[test]
fn offers_are_pushed_to_each_agent() {
    let rt = Runtime::new().unwrap();
    rt.block_on(async {
        let sys = setup().await;
        seed_pool(&sys).await;
        seed::allocation_policy(&sys.db, &active_policy(AllocationType::All, 0.0)).await;
        let (order, task, _) = confirmed_delivery(&sys, "m-none").await;
        settle().await;
        for agent in ["agent-near", "agent-far"] {
            assert_eq!(sys.realtime.events_for(agent), vec!["taskOffered".to_string()]);
            assert!(sys.push.targets().contains(&agent.to_string()));
        }
        assert!(sys.realtime.events_for("agent-fm").is_empty());
        let (_, _, payload) = sys
            .realtime
            .events()
            .into_iter()
            .find(|(r, name, _)| r == "agent-near" && name == "taskOffered")
            .expect("Missing taskOffered event");
        assert_eq!(payload["orderId"], order.id.as_str());
        assert_eq!(payload["taskId"], task.id.value());
        sys.tear_down().await;
    });
}

#[test]
fn salaried_priority_without_a_rule_offers_to_nobody() {
    let rt = Runtime::new().unwrap();
    rt.block_on(async {
        let sys = setup().await;
        seed_pool(&sys).await;
        let policy = AutoAllocation { priority_type: PriorityType::MonthlySalaried, ..active_policy(AllocationType::All, 0.0) };
        seed::allocation_policy(&sys.db, &policy).await;
        let (_, task, offered) = confirmed_delivery(&sys, "m-none").await;
        assert!(offered.is_empty());
        assert!(sys.db.fetch_offers(task.id).await.unwrap().is_empty());
        sys.tear_down().await;
    });
}

#[test]
fn salaried_priority_picks_salaried_agents() {
    let rt = Runtime::new().unwrap();
    rt.block_on(async {
        let sys = setup().await;
        seed_pool(&sys).await;
        seed::pricing_rule(&sys.db, "rule-salary", MONTHLY_SALARIED_RULE).await;
        seed::pricing_rule(&sys.db, "rule-per-km", "Per-km").await;
        seed::agent(&sys.db, NewAgent::available("agent-salaried", "Suresh").with_salary_structure("rule-salary")).await;
        seed::agent(&sys.db, NewAgent::available("agent-per-km", "Priya").with_salary_structure("rule-per-km")).await;
        let policy = AutoAllocation { priority_type: PriorityType::MonthlySalaried, ..active_policy(AllocationType::All, 0.0) };
        seed::allocation_policy(&sys.db, &policy).await;
        let (_, _, offered) = confirmed_delivery(&sys, "m-none").await;
        assert_eq!(offered, vec!["agent-salaried".to_string()]);
        sys.tear_down().await;
    });
}

#[test]
fn nearest_allocation_respects_the_radius() {
    let rt = Runtime::new().unwrap();
    rt.block_on(async {
        let sys = setup().await;
        seed_pool(&sys).await;
        seed::agent(&sys.db, NewAgent::available("agent-here", "Hari").at(kochi())).await;
        seed::agent(&sys.db, NewAgent::available("agent-nowhere", "Latha")).await;
        seed::allocation_policy(&sys.db, &active_policy(AllocationType::Nearest, 10.0)).await;
        let (_, _, offered) = confirmed_delivery(&sys, "m-none").await;
        // Nearest first; Thrissur is far outside 10 km and agents without a position are never near
        assert_eq!(offered, vec!["agent-here".to_string(), "agent-near".to_string()]);
        sys.tear_down().await;
    });
}

#[test]
fn nearest_allocation_falls_back_to_the_merchant_location() {
    let rt = Runtime::new().unwrap();
    rt.block_on(async {
        let sys = setup().await;
        seed_pool(&sys).await;
        let merchant = seed::merchant("m-thrissur", None, PricingModel::Subscription, Some(thrissur()));
        seed::insert_merchant(&sys.db, &merchant).await;
        seed::allocation_policy(&sys.db, &active_policy(AllocationType::Nearest, 10.0)).await;
        let new_order = home_delivery("cust-1", "m-thrissur", PaymentMode::CashOnDelivery)
            .with_delivery(DeliveryDetail { distance_km: 3.0, ..Default::default() });
        let order = sys.place(new_order).await;
        let result = sys.api.confirm(&order.id, admin()).await.unwrap();
        assert_eq!(result.offered_to, vec!["agent-far".to_string()]);
        sys.tear_down().await;
    });
}

#[test]
fn inactive_policy_leaves_the_task_for_manual_assignment() {
    let rt = Runtime::new().unwrap();
    rt.block_on(async {
        let sys = setup().await;
        seed_pool(&sys).await;
        let policy = AutoAllocation { is_active: false, ..active_policy(AllocationType::All, 0.0) };
        seed::allocation_policy(&sys.db, &policy).await;
        let (_, task, offered) = confirmed_delivery(&sys, "m-none").await;
        assert!(offered.is_empty());
        assert_eq!(task.status, TaskStatus::Unassigned);
        let outcome = sys.api.dispatcher().accept_task(task.id, "agent-near").await.unwrap();
        assert!(matches!(outcome, AcceptOutcome::NotOffered), "{outcome:?}");
        sys.tear_down().await;
    });
}

#[test]
fn dispatch_reuses_the_task() {
    let rt = Runtime::new().unwrap();
    rt.block_on(async {
        let sys = setup().await;
        seed_pool(&sys).await;
        seed::allocation_policy(&sys.db, &active_policy(AllocationType::All, 0.0)).await;
        let (order, task, offered) = confirmed_delivery(&sys, "m-none").await;
        assert_eq!(offered.len(), 2);
        seed::agent(&sys.db, NewAgent::available("agent-late", "Rahul")).await;
        let report = sys.api.dispatcher().dispatch(&order.id).await.unwrap();
        assert_eq!(report.task_id, task.id);
        assert!(!report.created);
        // Only the newcomer gets a fresh offer
        assert_eq!(report.offered_to, vec!["agent-late".to_string()]);

        let take_away = NewOrder::new("cust-1", items(), PaymentMode::CashOnDelivery)
            .with_delivery_mode(DeliveryMode::TakeAway);
        let take_away = sys.place(take_away).await;
        let err = sys.api.dispatcher().dispatch(&take_away.id).await.unwrap_err();
        assert!(matches!(err, DispatchError::NoTaskRequired(_)), "{err}");
        sys.tear_down().await;
    });
}

#[test]
fn declined_offers_cannot_be_accepted() {
    let rt = Runtime::new().unwrap();
    rt.block_on(async {
        let sys = setup().await;
        seed_pool(&sys).await;
        seed::allocation_policy(&sys.db, &active_policy(AllocationType::All, 0.0)).await;
        let (_, task, _) = confirmed_delivery(&sys, "m-none").await;
        assert!(sys.api.dispatcher().decline_task(task.id, "agent-near").await.unwrap());
        // Declining twice, or without an offer, changes nothing
        assert!(!sys.api.dispatcher().decline_task(task.id, "agent-near").await.unwrap());
        assert!(!sys.api.dispatcher().decline_task(task.id, "agent-fm").await.unwrap());
        let outcome = sys.api.dispatcher().accept_task(task.id, "agent-near").await.unwrap();
        assert!(matches!(outcome, AcceptOutcome::NotOffered), "{outcome:?}");
        let outcome = sys.api.dispatcher().accept_task(task.id, "agent-far").await.unwrap();
        assert!(outcome.is_accepted(), "{outcome:?}");
        sys.tear_down().await;
    });
}

#[test]
fn lapsed_offers_cannot_be_accepted() {
    let rt = Runtime::new().unwrap();
    rt.block_on(async {
        let sys = setup().await;
        seed_pool(&sys).await;
        let policy = AutoAllocation { expire_time_secs: 0, ..active_policy(AllocationType::All, 0.0) };
        seed::allocation_policy(&sys.db, &policy).await;
        let (order, task, offered) = confirmed_delivery(&sys, "m-none").await;
        assert_eq!(offered.len(), 2);
        let outcome = sys.api.dispatcher().accept_task(task.id, "agent-near").await.unwrap();
        assert!(matches!(outcome, AcceptOutcome::OfferExpired), "{outcome:?}");
        let task = sys.db.fetch_task(task.id).await.unwrap().unwrap();
        assert_eq!(task.status, TaskStatus::Unassigned);
        let agent = sys.db.fetch_agent("agent-near").await.unwrap().unwrap();
        assert_eq!(agent.status, AgentStatus::Free);
        let order = sys.db.fetch_order(&order.id).await.unwrap().unwrap();
        assert!(order.agent_id.is_none());
        sys.tear_down().await;
    });
}

#[test]
fn busy_agents_cannot_accept() {
    let rt = Runtime::new().unwrap();
    rt.block_on(async {
        let sys = setup().await;
        seed_pool(&sys).await;
        seed::allocation_policy(&sys.db, &active_policy(AllocationType::All, 0.0)).await;
        let (_, first, _) = confirmed_delivery(&sys, "m-none").await;
        let (_, second, _) = confirmed_delivery(&sys, "m-none").await;
        assert!(sys.api.dispatcher().accept_task(first.id, "agent-near").await.unwrap().is_accepted());
        let outcome = sys.api.dispatcher().accept_task(second.id, "agent-near").await.unwrap();
        assert!(matches!(outcome, AcceptOutcome::AgentUnavailable), "{outcome:?}");
        let second = sys.db.fetch_task(second.id).await.unwrap().unwrap();
        assert_eq!(second.status, TaskStatus::Unassigned);
        assert!(sys.api.dispatcher().accept_task(second.id, "agent-far").await.unwrap().is_accepted());
        sys.tear_down().await;
    });
}

#[test]
fn sweep_reoffers_then_reports_unclaimed_tasks() {
    let rt = Runtime::new().unwrap();
    rt.block_on(async {
        let sys = setup().await;
        seed_pool(&sys).await;
        seed::allocation_policy(&sys.db, &active_policy(AllocationType::All, 0.0)).await;
        let (order, task, offered) = confirmed_delivery(&sys, "m-none").await;
        assert_eq!(offered.len(), 2);

        // Nothing has lapsed yet
        let report = sys.api.dispatcher().expire_stale_offers(Utc::now()).await.unwrap();
        assert!(report.expired.is_empty());

        seed::agent(&sys.db, NewAgent::available("agent-late", "Rahul")).await;
        let later = Utc::now() + Duration::seconds(90);
        let report = sys.api.dispatcher().expire_stale_offers(later).await.unwrap();
        assert_eq!(report.expired, vec![task.id]);
        assert_eq!(report.reoffered, vec![task.id]);
        assert!(report.unclaimed.is_empty());
        let offers = sys.db.fetch_offers(task.id).await.unwrap();
        let pending = offers.iter().filter(|o| o.status == OfferStatus::Pending).map(|o| o.agent_id.as_str());
        assert_eq!(pending.collect::<Vec<_>>(), vec!["agent-late"]);
        assert_eq!(offers.iter().filter(|o| o.status == OfferStatus::Expired).count(), 2);

        let much_later = later + Duration::seconds(90);
        let report = sys.api.dispatcher().expire_stale_offers(much_later).await.unwrap();
        assert_eq!(report.expired, vec![task.id]);
        assert!(report.reoffered.is_empty());
        assert_eq!(report.unclaimed, vec![task.id]);
        settle().await;
        assert!(sys.realtime.events_for(ADMIN_ID).contains(&"taskUnclaimed".to_string()));

        let task = sys.db.fetch_task(task.id).await.unwrap().unwrap();
        assert_eq!(task.status, TaskStatus::Unassigned);
        let order = sys.db.fetch_order(&order.id).await.unwrap().unwrap();
        assert!(order.agent_id.is_none());
        sys.tear_down().await;
    });
}

#[test]
fn sweep_ignores_assigned_tasks() {
    let rt = Runtime::new().unwrap();
    rt.block_on(async {
        let sys = setup().await;
        seed_pool(&sys).await;
        seed::allocation_policy(&sys.db, &active_policy(AllocationType::All, 0.0)).await;
        let (_, task, _) = confirmed_delivery(&sys, "m-none").await;
        assert!(sys.api.dispatcher().accept_task(task.id, "agent-far").await.unwrap().is_accepted());
        let report = sys.api.dispatcher().expire_stale_offers(Utc::now() + Duration::seconds(90)).await.unwrap();
        // The losing offer was withdrawn when the task was taken, so nothing is left to lapse
        assert!(report.expired.is_empty());
        assert!(report.unclaimed.is_empty());
        sys.tear_down().await;
    });
}
