use std::time::Duration;

use chrono::NaiveDate;
use cucumber::{given, then, when};
use famto_engine::{
    db_types::{
        Actor,
        ActorRole,
        AllocationType,
        AutoAllocation,
        CommissionType,
        DeliveryDetail,
        Money,
        NewAgent,
        NewOrder,
        OrderItem,
        OrderStatus,
        PaymentMode,
        PricingModel,
        PriorityType,
        ScheduleWindow,
        Stop,
    },
    geo::GeoPoint,
    pool::FISH_AND_MEAT_TAG,
    test_utils::seed,
    traits::{AcceptOutcome, DispatchDatabase, OrderFlowError},
};

use crate::cucumber::{famto_world::ADMIN_ID, FamtoWorld};

fn rupees(amount: i64) -> Money {
    Money::from_major(amount)
}

fn payment_mode(word: &str) -> PaymentMode {
    match word {
        "wallet" => PaymentMode::FamtoCash,
        "cash" => PaymentMode::CashOnDelivery,
        "online" => PaymentMode::OnlinePayment,
        _ => panic!("Unknown payment mode: {word}"),
    }
}

fn kochi() -> GeoPoint {
    GeoPoint::new(9.9312, 76.2673)
}

fn delivery() -> DeliveryDetail {
    DeliveryDetail {
        pickup: Stop { address: None, location: Some(kochi()) },
        drop_off: Stop { address: None, location: Some(GeoPoint::new(9.9894, 76.2886)) },
        distance_km: 6.5,
        schedule: None,
    }
}

#[given(expr = "customer '{word}' with {int} rupees in their wallet")]
async fn customer_with_balance(world: &mut FamtoWorld, customer_id: String, balance: i64) {
    seed::customer(&world.system().db, &customer_id, rupees(balance)).await;
}

#[given(expr = "merchant '{word}' selling {string} on a {int}% commission")]
async fn commission_merchant(world: &mut FamtoWorld, merchant_id: String, category: String, percent: i64) {
    let db = &world.system().db;
    let merchant = seed::merchant(&merchant_id, Some(&category), PricingModel::Commission, Some(kochi()));
    seed::insert_merchant(db, &merchant).await;
    seed::commission_rule(db, &merchant_id, CommissionType::Percentage, percent * 100).await;
}

#[given(expr = "merchant '{word}' selling {string} on a subscription")]
async fn subscription_merchant(world: &mut FamtoWorld, merchant_id: String, category: String) {
    let merchant = seed::merchant(&merchant_id, Some(&category), PricingModel::Subscription, Some(kochi()));
    seed::insert_merchant(&world.system().db, &merchant).await;
}

#[given(expr = "agent '{word}' is free")]
async fn free_agent(world: &mut FamtoWorld, agent_id: String) {
    seed::agent(&world.system().db, NewAgent::available(agent_id.as_str(), "Agent").at(kochi())).await;
}

#[given(expr = "agent '{word}' is free and works Fish & Meat deliveries")]
async fn free_tagged_agent(world: &mut FamtoWorld, agent_id: String) {
    let agent = NewAgent::available(agent_id.as_str(), "Agent").at(kochi()).with_tag(FISH_AND_MEAT_TAG);
    seed::agent(&world.system().db, agent).await;
}

#[given(expr = "auto-allocation offers tasks to every agent for {int} seconds")]
async fn allocate_to_all(world: &mut FamtoWorld, expire_time_secs: i64) {
    let policy = AutoAllocation {
        allocation_type: AllocationType::All,
        priority_type: PriorityType::Default,
        max_radius_km: 0.0,
        expire_time_secs,
        is_active: true,
    };
    seed::allocation_policy(&world.system().db, &policy).await;
}

#[when(expr = "customer '{word}' orders {word} from '{word}' for {int} rupees paid by {word}")]
async fn place_order(
    world: &mut FamtoWorld,
    customer_id: String,
    name: String,
    merchant_id: String,
    amount: i64,
    payment: String,
) {
    let items = vec![OrderItem::new("Meal", 1, rupees(amount))];
    let mut order =
        NewOrder::new(customer_id, items, payment_mode(&payment)).with_merchant(merchant_id).with_delivery(delivery());
    if order.payment_mode == PaymentMode::OnlinePayment {
        order = order.with_payment_id(format!("pay_{name}"));
    }
    let order = world.api().create_order(order).await.expect("Error placing order");
    world.orders.insert(name, order.id);
}

#[when(expr = "customer '{word}' orders {word} for {int} days from {string} for {int} rupees paid by {word}")]
async fn place_scheduled_order(
    world: &mut FamtoWorld,
    customer_id: String,
    name: String,
    days: i64,
    start: String,
    amount: i64,
    payment: String,
) {
    let start = NaiveDate::parse_from_str(&start, "%Y-%m-%d").expect("Dates look like 2026-11-01");
    let end = start + chrono::Duration::days(days - 1);
    let window = ScheduleWindow::new(start, end, "13:00").expect("Invalid delivery window");
    let items = vec![OrderItem::new("Meal plan", days, rupees(amount / days))];
    let mut order =
        NewOrder::new(customer_id, items, payment_mode(&payment)).with_delivery(delivery()).scheduled(window);
    if order.payment_mode == PaymentMode::OnlinePayment {
        order = order.with_payment_id(format!("pay_{name}"));
    }
    let order = world.api().create_order(order).await.expect("Error placing order");
    world.orders.insert(name, order.id);
}

#[when(expr = "order {word} is confirmed")]
async fn confirm_order(world: &mut FamtoWorld, name: String) {
    let id = world.order_id(&name);
    let actor = Actor::new(ActorRole::Admin, ADMIN_ID);
    world.api().confirm(&id, actor).await.expect("Error confirming order");
}

#[when(expr = "order {word} is rejected")]
async fn reject_order(world: &mut FamtoWorld, name: String) {
    let id = world.order_id(&name);
    let actor = Actor::new(ActorRole::Admin, ADMIN_ID);
    world.last_error = world.api().reject(&id, actor).await.err();
}

#[when(expr = "order {word} is completed")]
async fn complete_order(world: &mut FamtoWorld, name: String) {
    let id = world.order_id(&name);
    let actor = Actor::system();
    world.last_error = world.api().mark_completed(&id, actor).await.err();
}

#[when(expr = "agent '{word}' accepts the delivery of order {word}")]
async fn accept_delivery(world: &mut FamtoWorld, agent_id: String, name: String) {
    let id = world.order_id(&name);
    let task = world.api().fetch_task_for_order(&id).await.expect("Error fetching task").expect("Order has no task");
    let outcome = world.api().dispatcher().accept_task(task.id, &agent_id).await.expect("Error accepting task");
    world.last_accept.insert(agent_id, outcome);
}

#[when(expr = "I pause for {int}ms")]
async fn pause(_world: &mut FamtoWorld, ms: u64) {
    tokio::time::sleep(Duration::from_millis(ms)).await;
}

#[then(expr = "order {word} is {word}")]
async fn check_status(world: &mut FamtoWorld, name: String, status: String) {
    let expected = status.parse::<OrderStatus>().expect("Not an order status");
    let id = world.order_id(&name);
    let order = world.api().fetch_order(&id).await.expect("Error fetching order").expect("Order does not exist");
    assert_eq!(order.status, expected, "Order {id} has the wrong status");
}

#[then(expr = "customer '{word}' has {int} rupees in their wallet")]
async fn check_wallet(world: &mut FamtoWorld, customer_id: String, balance: i64) {
    let customer = world.api().fetch_customer(&customer_id).await.expect("Error fetching customer");
    let customer = customer.unwrap_or_else(|| panic!("Customer {customer_id} does not exist"));
    assert_eq!(customer.wallet_balance, rupees(balance), "Wallet balance is incorrect");
}

#[then(expr = "customer '{word}' has {int} refund transaction(s)")]
async fn check_refunds(world: &mut FamtoWorld, customer_id: String, count: usize) {
    let txs = world.api().fetch_customer_transactions(&customer_id).await.expect("Error fetching transactions");
    assert_eq!(txs.len(), count, "Wrong number of transactions: {txs:?}");
}

#[then(expr = "the payment gateway was asked to refund {int} rupees for {word}")]
async fn check_gateway_refund(world: &mut FamtoWorld, amount: i64, name: String) {
    let calls = world.system().gateway.calls();
    assert_eq!(calls, vec![(format!("pay_{name}"), rupees(amount))]);
}

#[then("the payment gateway was not called")]
async fn check_gateway_untouched(world: &mut FamtoWorld) {
    assert!(world.system().gateway.calls().is_empty());
}

#[then("the rejection failed at the payment gateway")]
async fn check_gateway_failure(world: &mut FamtoWorld) {
    match &world.last_error {
        Some(OrderFlowError::PaymentGatewayFailure(_)) => {},
        other => panic!("Expected a gateway failure, got {other:?}"),
    }
}

#[then(expr = "the platform earns {int} rupees on order {word}")]
async fn check_commission(world: &mut FamtoWorld, amount: i64, name: String) {
    let id = world.order_id(&name);
    let order = world.api().fetch_order(&id).await.expect("Error fetching order").expect("Order does not exist");
    assert_eq!(order.famto_earnings, Some(rupees(amount)));
    let logs = world.api().fetch_commission_logs_for_order(&id).await.expect("Error fetching commission logs");
    assert_eq!(logs.len(), 1);
}

#[then(expr = "the delivery of order {word} is on offer to {string}")]
async fn check_offers(world: &mut FamtoWorld, name: String, agents: String) {
    let id = world.order_id(&name);
    let task = world.api().fetch_task_for_order(&id).await.expect("Error fetching task").expect("Order has no task");
    let offers = world.system().db.fetch_offers(task.id).await.expect("Error fetching offers");
    let mut offered = offers.into_iter().map(|o| o.agent_id).collect::<Vec<_>>();
    offered.sort();
    let mut expected = agents.split(',').map(|s| s.trim().to_string()).filter(|s| !s.is_empty()).collect::<Vec<_>>();
    expected.sort();
    assert_eq!(offered, expected);
}

#[then(expr = "agent '{word}' gets the delivery")]
async fn check_accepted(world: &mut FamtoWorld, agent_id: String) {
    let outcome = world.last_accept.get(&agent_id).unwrap_or_else(|| panic!("{agent_id} never tried"));
    assert!(outcome.is_accepted(), "{agent_id}: {outcome:?}");
}

#[then(expr = "agent '{word}' is told the delivery is taken")]
async fn check_lost(world: &mut FamtoWorld, agent_id: String) {
    let outcome = world.last_accept.get(&agent_id).unwrap_or_else(|| panic!("{agent_id} never tried"));
    assert!(matches!(outcome, AcceptOutcome::AlreadyAssigned { .. }), "{agent_id}: {outcome:?}");
}

#[then(expr = "agent '{word}' was told about {string}")]
async fn check_realtime(world: &mut FamtoWorld, recipient: String, event: String) {
    let events = world.system().realtime.events_for(&recipient);
    assert!(events.contains(&event), "{recipient} received {events:?}");
}
