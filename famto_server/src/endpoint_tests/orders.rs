use actix_web::http::StatusCode;
use famto_engine::{
    db_types::{Money, OrderStatus, PaymentMode},
    test_utils::seed,
};
use serde_json::{json, Value};

use super::helpers::{get_request, order_routes, post_request, TestBackend, ADMIN_ID};

fn admin() -> Value {
    json!({ "role": "Admin", "userId": ADMIN_ID })
}

#[actix_web::test]
async fn health_check() {
    let _ = env_logger::try_init().ok();
    let backend = TestBackend::new().await;
    let (status, body) = get_request("/health", order_routes(backend.api())).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "👍️\n");
    backend.tear_down().await;
}

#[actix_web::test]
async fn confirm_an_order() {
    let _ = env_logger::try_init().ok();
    let backend = TestBackend::new().await;
    seed::customer(&backend.db, "cust-1", Money::default()).await;
    let order = backend.place_order("cust-1", PaymentMode::CashOnDelivery).await;
    let path = format!("/orders/{}/confirm", order.id);
    let (status, body) = post_request(&path, admin(), order_routes(backend.api())).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    let body: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(body["order"]["id"], order.id.to_string());
    assert!(body["taskId"].is_number());
    // No allocation policy, so nobody was offered the task
    assert_eq!(body["offeredTo"], json!([]));

    let stored = backend.api().fetch_order(&order.id).await.unwrap().unwrap();
    assert_eq!(stored.status, OrderStatus::OnGoing);
    backend.tear_down().await;
}

#[actix_web::test]
async fn unknown_orders_are_not_found() {
    let _ = env_logger::try_init().ok();
    let backend = TestBackend::new().await;
    let (status, body) = post_request("/orders/O2610999/confirm", admin(), order_routes(backend.api())).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, r#"{"error":"The data was not found. The requested order O2610999 does not exist"}"#);
    backend.tear_down().await;
}

#[actix_web::test]
async fn malformed_actors_are_rejected() {
    let _ = env_logger::try_init().ok();
    let backend = TestBackend::new().await;
    let body = json!({ "role": "Overlord", "userId": "x" });
    let (status, _) = post_request("/orders/O2610001/confirm", body, order_routes(backend.api())).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    backend.tear_down().await;
}

#[actix_web::test]
async fn reject_refunds_the_wallet() {
    let _ = env_logger::try_init().ok();
    let backend = TestBackend::new().await;
    seed::customer(&backend.db, "cust-1", Money::from_major(10)).await;
    let order = backend.place_order("cust-1", PaymentMode::FamtoCash).await;
    let path = format!("/orders/{}/reject", order.id);
    let (status, body) = post_request(&path, admin(), order_routes(backend.api())).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    let body: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(body["refund"]["method"], "wallet");
    assert_eq!(body["refund"]["amount"], 12_000);

    let customer = backend.api().fetch_customer("cust-1").await.unwrap().unwrap();
    assert_eq!(customer.wallet_balance, Money::from_major(130));

    // A cancelled order cannot be rejected again
    let (status, body) = post_request(&path, admin(), order_routes(backend.api())).await;
    assert_eq!(status, StatusCode::CONFLICT, "{body}");
    assert!(backend.gateway.calls().is_empty());
    backend.tear_down().await;
}

#[actix_web::test]
async fn ready_needs_an_agent() {
    let _ = env_logger::try_init().ok();
    let backend = TestBackend::new().await;
    seed::customer(&backend.db, "cust-1", Money::default()).await;
    let order = backend.place_order("cust-1", PaymentMode::CashOnDelivery).await;
    let api = backend.api();
    let (status, _) = post_request(&format!("/orders/{}/confirm", order.id), admin(), order_routes(api)).await;
    assert_eq!(status, StatusCode::OK);
    let merchant = json!({ "role": "Merchant", "userId": "m-1" });
    let (status, body) = post_request(&format!("/orders/{}/ready", order.id), merchant, order_routes(backend.api())).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert!(body.contains("has no agent assigned"), "{body}");
    backend.tear_down().await;
}
