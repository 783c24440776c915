use std::{collections::HashMap, sync::Arc};

use cucumber::World;
use famto_engine::{
    db_types::OrderId,
    events::{EventHandlers, EventHooks},
    notifications::fan_out_handler,
    test_utils::{
        doubles::{RecordingGateway, RecordingPush, RecordingRealtime},
        prepare_env::{create_database, random_db_path, run_migrations},
    },
    traits::{AcceptOutcome, OrderFlowError},
    OrderFlowApi,
    SqliteDatabase,
};
use log::*;

pub const ADMIN_ID: &str = "admin";

#[derive(Default, Debug, World)]
pub struct FamtoWorld {
    pub system: Option<DeliverySystem>,
    /// Feature-file order names mapped to the ids the engine handed out
    pub orders: HashMap<String, OrderId>,
    pub last_error: Option<OrderFlowError>,
    pub last_accept: HashMap<String, AcceptOutcome>,
}

#[derive(Debug)]
pub struct DeliverySystem {
    pub db_path: String,
    pub db: SqliteDatabase,
    pub api: OrderFlowApi<SqliteDatabase, RecordingGateway>,
    pub gateway: RecordingGateway,
    pub realtime: Arc<RecordingRealtime>,
}

impl FamtoWorld {
    pub fn system(&self) -> &DeliverySystem {
        self.system.as_ref().expect("System not initialised")
    }

    pub fn api(&self) -> &OrderFlowApi<SqliteDatabase, RecordingGateway> {
        &self.system().api
    }

    pub fn order_id(&self, name: &str) -> OrderId {
        self.orders.get(name).cloned().unwrap_or_else(|| panic!("No order called {name} was placed"))
    }
}

impl DeliverySystem {
    pub async fn new(gateway: RecordingGateway) -> Self {
        let url = prepare_test_env().await;
        let db = SqliteDatabase::new_with_url(&url, 4).await.expect("Error creating connection to database");
        debug!("Created database: {url}");
        let realtime = Arc::new(RecordingRealtime::default());
        let mut hooks = EventHooks::default();
        hooks.on_notification = Some(fan_out_handler(Arc::new(RecordingPush::default()), Arc::clone(&realtime)));
        let handlers = EventHandlers::new(32, hooks);
        let producers = handlers.producers();
        handlers.start_handlers().await;
        let api = OrderFlowApi::new(db.clone(), gateway.clone(), producers, ADMIN_ID);
        Self { db_path: url, db, api, gateway, realtime }
    }
}

pub async fn prepare_test_env() -> String {
    let path = random_db_path();
    create_database(&path).await;
    run_migrations(&path).await;
    path
}
