#![allow(dead_code)]
use std::{sync::Arc, time::Duration};

use famto_engine::{
    db_types::{
        Actor,
        ActorRole,
        AllocationType,
        AutoAllocation,
        DeliveryDetail,
        DeliveryMode,
        Money,
        NewOrder,
        Order,
        OrderItem,
        PaymentMode,
        PriorityType,
        Stop,
    },
    events::{EventHandlers, EventHooks, OrderStatusChangedEvent},
    geo::GeoPoint,
    notifications::fan_out_handler,
    test_utils::{
        doubles::{RecordingGateway, RecordingPush, RecordingRealtime},
        prepare_env::{prepare_test_env, random_db_path},
    },
    OrderFlowApi,
    SqliteDatabase,
};
use log::*;
use sqlx::{migrate::MigrateDatabase, Sqlite};
use tokio::sync::Mutex;

pub const ADMIN_ID: &str = "admin";

pub struct TestSystem {
    pub url: String,
    pub db: SqliteDatabase,
    pub api: OrderFlowApi<SqliteDatabase, RecordingGateway>,
    pub gateway: RecordingGateway,
    pub push: Arc<RecordingPush>,
    pub realtime: Arc<RecordingRealtime>,
    pub status_changes: Arc<Mutex<Vec<OrderStatusChangedEvent>>>,
}

pub async fn setup() -> TestSystem {
    setup_with_gateway(RecordingGateway::default()).await
}

pub async fn setup_with_gateway(gateway: RecordingGateway) -> TestSystem {
    let url = random_db_path();
    prepare_test_env(&url).await;
    let db = SqliteDatabase::new_with_url(&url, 8).await.expect("Error creating database");
    let push = Arc::new(RecordingPush::default());
    let realtime = Arc::new(RecordingRealtime::default());
    let status_changes = Arc::new(Mutex::new(Vec::new()));
    let mut hooks = EventHooks::default();
    hooks.on_notification = Some(fan_out_handler(Arc::clone(&push), Arc::clone(&realtime)));
    let changes = Arc::clone(&status_changes);
    hooks.on_order_status_changed(move |ev| {
        let changes = Arc::clone(&changes);
        Box::pin(async move {
            changes.lock().await.push(ev);
        })
    });
    let handlers = EventHandlers::new(64, hooks);
    let producers = handlers.producers();
    handlers.start_handlers().await;
    let api = OrderFlowApi::new(db.clone(), gateway.clone(), producers, ADMIN_ID);
    TestSystem { url, db, api, gateway, push, realtime, status_changes }
}

impl TestSystem {
    pub async fn tear_down(self) {
        self.db.close().await;
        if let Err(e) = Sqlite::drop_database(&self.url).await {
            warn!("🚀️ Failed to remove test database {}: {e}", self.url);
        }
    }

    pub async fn place(&self, order: NewOrder) -> Order {
        self.api.create_order(order).await.expect("Error creating order")
    }
}

/// Gives the event handlers time to work through their queues.
pub async fn settle() {
    tokio::time::sleep(Duration::from_millis(250)).await;
}

pub fn merchant_actor(id: &str) -> Actor {
    Actor::new(ActorRole::Merchant, id)
}

pub fn admin() -> Actor {
    Actor::new(ActorRole::Admin, ADMIN_ID)
}

pub fn kochi() -> GeoPoint {
    GeoPoint::new(9.9312, 76.2673)
}

pub fn ernakulam_north() -> GeoPoint {
    GeoPoint::new(9.9894, 76.2886)
}

pub fn thrissur() -> GeoPoint {
    GeoPoint::new(10.5276, 76.2144)
}

/// Two plates of biryani at ₹150 and a ₹40 drink
pub fn items() -> Vec<OrderItem> {
    vec![
        OrderItem::new("Chicken Biryani", 2, Money::from_major(150)).with_product("p-biryani"),
        OrderItem::new("Lime Soda", 1, Money::from_major(40)).with_product("p-soda"),
    ]
}

pub fn delivery_from(pickup: GeoPoint) -> DeliveryDetail {
    DeliveryDetail {
        pickup: Stop { address: None, location: Some(pickup) },
        drop_off: Stop { address: None, location: Some(ernakulam_north()) },
        distance_km: 6.5,
        schedule: None,
    }
}

pub fn home_delivery(customer_id: &str, merchant_id: &str, payment_mode: PaymentMode) -> NewOrder {
    NewOrder::new(customer_id, items(), payment_mode)
        .with_merchant(merchant_id)
        .with_delivery_mode(DeliveryMode::HomeDelivery)
        .with_delivery(delivery_from(kochi()))
}

pub fn active_policy(allocation_type: AllocationType, max_radius_km: f64) -> AutoAllocation {
    AutoAllocation {
        allocation_type,
        priority_type: PriorityType::Default,
        max_radius_km,
        expire_time_secs: 60,
        is_active: true,
    }
}
