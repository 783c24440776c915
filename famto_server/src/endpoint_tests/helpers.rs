use actix_web::{body::MessageBody, http::StatusCode, test, test::TestRequest, web, web::ServiceConfig, App};
use famto_engine::{
    db_types::{DeliveryDetail, DeliveryMode, Money, NewOrder, Order, OrderItem, PaymentMode, Stop},
    events::EventProducers,
    geo::GeoPoint,
    test_utils::{
        doubles::RecordingGateway,
        prepare_env::{prepare_test_env, random_db_path},
    },
    OrderFlowApi,
    SqliteDatabase,
};
use log::debug;
use serde_json::Value;

use crate::routes::{
    health,
    AcceptTaskRoute,
    CompleteOrderRoute,
    ConfirmOrderRoute,
    DeclineTaskRoute,
    OrderReadyRoute,
    RejectOrderRoute,
};

pub const ADMIN_ID: &str = "admin";

pub type TestApi = OrderFlowApi<SqliteDatabase, RecordingGateway>;

/// A migrated throwaway database and an engine API over it. Events go nowhere.
pub struct TestBackend {
    pub url: String,
    pub db: SqliteDatabase,
    pub gateway: RecordingGateway,
}

impl TestBackend {
    pub async fn new() -> Self {
        let url = random_db_path();
        prepare_test_env(&url).await;
        let db = SqliteDatabase::new_with_url(&url, 4).await.expect("Error creating database");
        Self { url, db, gateway: RecordingGateway::default() }
    }

    pub fn api(&self) -> TestApi {
        OrderFlowApi::new(self.db.clone(), self.gateway.clone(), EventProducers::default(), ADMIN_ID)
    }

    pub async fn place_order(&self, customer_id: &str, payment_mode: PaymentMode) -> Order {
        let items = vec![OrderItem::new("Masala Dosa", 2, Money::from_major(60))];
        let stop = |lat, lon| Stop { address: None, location: Some(GeoPoint::new(lat, lon)) };
        let delivery = DeliveryDetail {
            pickup: stop(9.9312, 76.2673),
            drop_off: stop(9.9894, 76.2886),
            distance_km: 6.5,
            schedule: None,
        };
        let order = NewOrder::new(customer_id, items, payment_mode)
            .with_merchant("m-1")
            .with_delivery_mode(DeliveryMode::HomeDelivery)
            .with_delivery(delivery);
        self.api().create_order(order).await.expect("Error placing order")
    }

    pub async fn tear_down(self) {
        self.db.close().await;
        let path = self.url.trim_start_matches("sqlite://");
        if let Err(e) = std::fs::remove_file(path) {
            debug!("🚀️ Could not remove {path}. {e}");
        }
    }
}

pub async fn post_request<F>(path: &str, body: Value, configure: F) -> (StatusCode, String)
where F: FnOnce(&mut ServiceConfig) {
    let req = TestRequest::post().uri(path).set_json(body).to_request();
    call(req, configure).await
}

pub async fn get_request<F>(path: &str, configure: F) -> (StatusCode, String)
where F: FnOnce(&mut ServiceConfig) {
    let req = TestRequest::get().uri(path).to_request();
    call(req, configure).await
}

async fn call<F>(req: actix_http::Request, configure: F) -> (StatusCode, String)
where F: FnOnce(&mut ServiceConfig) {
    let app = App::new().configure(configure);
    let service = test::init_service(app).await;
    debug!("Making request");
    let res = test::call_service(&service, req).await;
    let status = res.status();
    let body = res.into_body().try_into_bytes().map(|b| String::from_utf8_lossy(&b).into_owned()).unwrap_or_default();
    (status, body)
}

/// Every order and task route, over the given API.
pub fn order_routes(api: TestApi) -> impl FnOnce(&mut ServiceConfig) {
    move |cfg| {
        cfg.app_data(web::Data::new(api))
            .service(health)
            .service(ConfirmOrderRoute::<SqliteDatabase, RecordingGateway>::new())
            .service(RejectOrderRoute::<SqliteDatabase, RecordingGateway>::new())
            .service(OrderReadyRoute::<SqliteDatabase, RecordingGateway>::new())
            .service(CompleteOrderRoute::<SqliteDatabase, RecordingGateway>::new())
            .service(AcceptTaskRoute::<SqliteDatabase, RecordingGateway>::new())
            .service(DeclineTaskRoute::<SqliteDatabase, RecordingGateway>::new());
    }
}
