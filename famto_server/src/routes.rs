//! Request handler definitions
//!
//! Define each route and it handler here. The surface is deliberately thin: every handler parses its input, calls
//! one engine API method and maps the result. Handlers that are more than a line or two MUST go into a separate
//! module. Keep this module neat and tidy 🙏
//!
//! A note about performance:
//! Since each worker thread processes its requests sequentially, handlers which block the current thread will cause the
//! current worker to stop processing new requests. Any long, non-cpu-bound operation (e.g. I/O, database operations,
//! etc.) should be expressed as futures or asynchronous functions.
use actix_web::{get, web, HttpResponse, Responder};
use famto_engine::{
    db_types::{OrderId, TaskId},
    traits::{OrderFlowDatabase, PaymentGateway},
    OrderFlowApi,
};
use log::*;

use crate::{
    data_objects::{
        AcceptResponse,
        ActorParams,
        AgentParams,
        CompleteResponse,
        ConfirmResponse,
        JsonResponse,
        OrderResult,
        RejectResponse,
    },
    errors::ServerError,
    realtime::{self, Registry},
};

// Web-actix cannot handle generics in handlers, so it's implemented manually using the `route!` macro
#[macro_export]
macro_rules! route {
    ($name:ident => $method:ident $path:literal impl $($bounds:ty),+) => {
        paste::paste! { pub struct [<$name:camel Route>]< $( [< T $bounds:camel> ],)+ >( $( core::marker::PhantomData<fn() -> [< T $bounds:camel> ] >,)+ );}
        paste::paste! { impl< $( [< T $bounds:camel> ],)+ > [<$name:camel Route>]< $( [< T $bounds:camel> ],)+ > {
            #[allow(clippy::new_without_default)]
            pub fn new() -> Self {
                Self($( core::marker::PhantomData::<fn() -> [< T $bounds:camel> ] >,)+)
            }
        }}
        paste::paste! { impl<$( [< T $bounds:camel >] , )+> actix_web::dev::HttpServiceFactory for [<$name:camel Route>]<$([<T $bounds:camel>],)+>
        where
            $([<T $bounds:camel>]: $bounds + 'static,)+
        {
            fn register(self, config: &mut actix_web::dev::AppService) {
                let res = actix_web::Resource::new($path)
                    .name(stringify!($name))
                    .guard(actix_web::guard::$method())
                    .to($name::< $( [< T $bounds:camel >], )+>);
                actix_web::dev::HttpServiceFactory::register(res, config);
            }
        }}
    };
}

// ----------------------------------------------   Health  ----------------------------------------------------
#[get("/health")]
pub async fn health() -> impl Responder {
    trace!("💻️ Received health check request");
    HttpResponse::Ok().body("👍️\n")
}

//----------------------------------------------   Orders  ----------------------------------------------------
route!(confirm_order => Post "/orders/{order_id}/confirm" impl OrderFlowDatabase, PaymentGateway);
/// Confirms a pending order. Commission, stock and dispatch problems do not fail the request; they are listed in the
/// response's `warnings`.
pub async fn confirm_order<B, G>(
    path: web::Path<String>,
    body: web::Json<ActorParams>,
    api: web::Data<OrderFlowApi<B, G>>,
) -> Result<HttpResponse, ServerError>
where
    B: OrderFlowDatabase,
    G: PaymentGateway,
{
    let order_id = OrderId::from(path.into_inner());
    debug!("💻️ Confirm request for order {order_id} from {}", body.user_id);
    let result = api.confirm(&order_id, body.into_inner().into()).await?;
    Ok(HttpResponse::Ok().json(ConfirmResponse::from(result)))
}

route!(reject_order => Post "/orders/{order_id}/reject" impl OrderFlowDatabase, PaymentGateway);
pub async fn reject_order<B, G>(
    path: web::Path<String>,
    body: web::Json<ActorParams>,
    api: web::Data<OrderFlowApi<B, G>>,
) -> Result<HttpResponse, ServerError>
where
    B: OrderFlowDatabase,
    G: PaymentGateway,
{
    let order_id = OrderId::from(path.into_inner());
    debug!("💻️ Reject request for order {order_id} from {}", body.user_id);
    let cancelled = api.reject(&order_id, body.into_inner().into()).await?;
    Ok(HttpResponse::Ok().json(RejectResponse::from(cancelled)))
}

route!(order_ready => Post "/orders/{order_id}/ready" impl OrderFlowDatabase, PaymentGateway);
pub async fn order_ready<B, G>(
    path: web::Path<String>,
    body: web::Json<ActorParams>,
    api: web::Data<OrderFlowApi<B, G>>,
) -> Result<HttpResponse, ServerError>
where
    B: OrderFlowDatabase,
    G: PaymentGateway,
{
    let order_id = OrderId::from(path.into_inner());
    let order = api.mark_ready(&order_id, body.into_inner().into()).await?;
    Ok(HttpResponse::Ok().json(OrderResult::from(&order)))
}

route!(complete_order => Post "/orders/{order_id}/complete" impl OrderFlowDatabase, PaymentGateway);
pub async fn complete_order<B, G>(
    path: web::Path<String>,
    body: web::Json<ActorParams>,
    api: web::Data<OrderFlowApi<B, G>>,
) -> Result<HttpResponse, ServerError>
where
    B: OrderFlowDatabase,
    G: PaymentGateway,
{
    let order_id = OrderId::from(path.into_inner());
    let completed = api.mark_completed(&order_id, body.into_inner().into()).await?;
    Ok(HttpResponse::Ok().json(CompleteResponse::from(completed)))
}

//----------------------------------------------   Tasks  ----------------------------------------------------
route!(accept_task => Post "/tasks/{task_id}/accept" impl OrderFlowDatabase, PaymentGateway);
/// An agent claims a task they were offered. Exactly one concurrent caller gets `"accepted": true`.
pub async fn accept_task<B, G>(
    path: web::Path<i64>,
    body: web::Json<AgentParams>,
    api: web::Data<OrderFlowApi<B, G>>,
) -> Result<HttpResponse, ServerError>
where
    B: OrderFlowDatabase,
    G: PaymentGateway,
{
    let task_id = TaskId(path.into_inner());
    let outcome = api.dispatcher().accept_task(task_id, &body.agent_id).await?;
    Ok(HttpResponse::Ok().json(AcceptResponse::new(task_id, &body.agent_id, &outcome)))
}

route!(decline_task => Post "/tasks/{task_id}/decline" impl OrderFlowDatabase, PaymentGateway);
pub async fn decline_task<B, G>(
    path: web::Path<i64>,
    body: web::Json<AgentParams>,
    api: web::Data<OrderFlowApi<B, G>>,
) -> Result<HttpResponse, ServerError>
where
    B: OrderFlowDatabase,
    G: PaymentGateway,
{
    let task_id = TaskId(path.into_inner());
    let response = if api.dispatcher().decline_task(task_id, &body.agent_id).await? {
        JsonResponse::success(format!("Offer for task {task_id} declined"))
    } else {
        JsonResponse::failure(format!("{} has no open offer for task {task_id}", body.agent_id))
    };
    Ok(HttpResponse::Ok().json(response))
}

//----------------------------------------------   Realtime  ----------------------------------------------------
/// Streams the user's notifications as server-sent events for as long as the client stays connected.
#[get("/realtime/{user_id}")]
pub async fn realtime_events(path: web::Path<String>, registry: web::Data<Registry>) -> impl Responder {
    let user_id = path.into_inner();
    debug!("💻️ Opening realtime stream for {user_id}");
    realtime::event_stream(registry.into_inner(), &user_id)
}
