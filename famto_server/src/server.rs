use std::{sync::Arc, time::Duration};

use actix_web::{dev::Server, http::KeepAlive, middleware::Logger, web, App, HttpServer};
use famto_engine::{
    events::{EventHandlers, EventHooks, EventProducers},
    notifications::{fan_out_handler, RegistryChannel},
    OrderFlowApi,
    SqliteDatabase,
};
use futures::FutureExt;
use log::*;

use crate::{
    config::ServerConfig,
    errors::ServerError,
    expiry_worker::start_expiry_worker,
    integrations::{HttpPushSender, RazorpayGateway},
    realtime::Registry,
    routes::{
        health,
        realtime_events,
        AcceptTaskRoute,
        CompleteOrderRoute,
        ConfirmOrderRoute,
        DeclineTaskRoute,
        OrderReadyRoute,
        RejectOrderRoute,
    },
};

pub async fn run_server(config: ServerConfig) -> Result<(), ServerError> {
    let db = SqliteDatabase::new_with_url(&config.database_url, 25)
        .await
        .map_err(|e| ServerError::InitializeError(e.to_string()))?;
    db.run_migrations().await.map_err(|e| ServerError::InitializeError(e.to_string()))?;
    let gateway =
        RazorpayGateway::new(config.razorpay.clone()).map_err(|e| ServerError::InitializeError(e.to_string()))?;
    let push = HttpPushSender::new(config.push.clone()).map_err(|e| ServerError::InitializeError(e.to_string()))?;
    let registry = Arc::new(Registry::new());

    let hooks = create_event_hooks(push, Arc::clone(&registry));
    let handlers = EventHandlers::new(config.event_buffer_size, hooks);
    let producers = handlers.producers();
    handlers.start_handlers().await;
    // Runs for the life of the process
    let _worker =
        start_expiry_worker(db.clone(), producers.clone(), config.admin_id.clone(), config.offer_sweep_interval);

    let srv = create_server_instance(config, db, gateway, producers, registry)?;
    srv.await.map_err(ServerError::IOError)
}

/// Notifications fan out over push and the realtime connections. Status changes are logged.
pub fn create_event_hooks(push: HttpPushSender, registry: Arc<Registry>) -> EventHooks {
    let mut hooks = EventHooks::default();
    let realtime = RegistryChannel::new(registry);
    hooks.on_notification = Some(fan_out_handler(Arc::new(push), Arc::new(realtime)));
    hooks.on_order_status_changed(|event| {
        async move {
            info!("🔄️ Order {} moved from {} to {}", event.order_id, event.old_status, event.new_status);
        }
        .boxed()
    });
    hooks
}

pub fn create_server_instance(
    config: ServerConfig,
    db: SqliteDatabase,
    gateway: RazorpayGateway,
    producers: EventProducers,
    registry: Arc<Registry>,
) -> Result<Server, ServerError> {
    let admin_id = config.admin_id.clone();
    let srv = HttpServer::new(move || {
        let orders_api = OrderFlowApi::new(db.clone(), gateway.clone(), producers.clone(), admin_id.as_str());
        App::new()
            .wrap(Logger::new("%t (%D ms) %s %a %{Host}i %U").log_target("famto::access_log"))
            .app_data(web::Data::new(orders_api))
            .app_data(web::Data::from(Arc::clone(&registry)))
            .service(health)
            .service(realtime_events)
            .service(ConfirmOrderRoute::<SqliteDatabase, RazorpayGateway>::new())
            .service(RejectOrderRoute::<SqliteDatabase, RazorpayGateway>::new())
            .service(OrderReadyRoute::<SqliteDatabase, RazorpayGateway>::new())
            .service(CompleteOrderRoute::<SqliteDatabase, RazorpayGateway>::new())
            .service(AcceptTaskRoute::<SqliteDatabase, RazorpayGateway>::new())
            .service(DeclineTaskRoute::<SqliteDatabase, RazorpayGateway>::new())
    })
    .keep_alive(KeepAlive::Timeout(Duration::from_secs(600)))
    .bind((config.host.as_str(), config.port))?
    .run();
    Ok(srv)
}
