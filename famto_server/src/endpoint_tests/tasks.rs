use actix_web::http::StatusCode;
use famto_engine::{
    db_types::{AllocationType, AutoAllocation, Money, NewAgent, PaymentMode, PriorityType, TaskId},
    test_utils::seed,
};
use serde_json::{json, Value};

use super::helpers::{order_routes, post_request, TestBackend, ADMIN_ID};

async fn offered_task(backend: &TestBackend, agents: &[&str]) -> TaskId {
    seed::customer(&backend.db, "cust-1", Money::default()).await;
    let policy = AutoAllocation {
        allocation_type: AllocationType::All,
        priority_type: PriorityType::Default,
        max_radius_km: 0.0,
        expire_time_secs: 60,
        is_active: true,
    };
    seed::allocation_policy(&backend.db, &policy).await;
    for agent in agents {
        seed::agent(&backend.db, NewAgent::available(*agent, "Rider")).await;
    }
    let order = backend.place_order("cust-1", PaymentMode::CashOnDelivery).await;
    let admin = json!({ "role": "Admin", "userId": ADMIN_ID });
    let (status, body) = post_request(&format!("/orders/{}/confirm", order.id), admin, order_routes(backend.api())).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    let body: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(body["offeredTo"].as_array().map(|a| a.len()), Some(agents.len()));
    TaskId(body["taskId"].as_i64().unwrap())
}

#[actix_web::test]
async fn first_agent_wins() {
    let _ = env_logger::try_init().ok();
    let backend = TestBackend::new().await;
    let task_id = offered_task(&backend, &["agent-1", "agent-2"]).await;
    let path = format!("/tasks/{}/accept", task_id.0);

    let (status, body) = post_request(&path, json!({ "agentId": "agent-1" }), order_routes(backend.api())).await;
    assert_eq!(status, StatusCode::OK);
    let expected = format!(r#"{{"accepted":true,"outcome":"accepted","taskId":{},"agentId":"agent-1"}}"#, task_id.0);
    assert_eq!(body, expected);

    let (status, body) = post_request(&path, json!({ "agentId": "agent-2" }), order_routes(backend.api())).await;
    assert_eq!(status, StatusCode::OK);
    let expected =
        format!(r#"{{"accepted":false,"outcome":"alreadyAssigned","taskId":{},"agentId":"agent-1"}}"#, task_id.0);
    assert_eq!(body, expected);
    backend.tear_down().await;
}

#[actix_web::test]
async fn uninvited_agents_are_turned_away() {
    let _ = env_logger::try_init().ok();
    let backend = TestBackend::new().await;
    let task_id = offered_task(&backend, &["agent-1"]).await;
    let path = format!("/tasks/{}/accept", task_id.0);
    let (status, body) = post_request(&path, json!({ "agentId": "agent-9" }), order_routes(backend.api())).await;
    assert_eq!(status, StatusCode::OK);
    let body: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(body["accepted"], false);
    assert_eq!(body["outcome"], "notOffered");
    backend.tear_down().await;
}

#[actix_web::test]
async fn declining_an_offer() {
    let _ = env_logger::try_init().ok();
    let backend = TestBackend::new().await;
    let task_id = offered_task(&backend, &["agent-1"]).await;
    let path = format!("/tasks/{}/decline", task_id.0);
    let (status, body) = post_request(&path, json!({ "agentId": "agent-1" }), order_routes(backend.api())).await;
    assert_eq!(status, StatusCode::OK);
    let body: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(body["success"], true);
    // Nothing left to decline
    let (_, body) = post_request(&path, json!({ "agentId": "agent-1" }), order_routes(backend.api())).await;
    let body: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(body["success"], false);
    backend.tear_down().await;
}

#[actix_web::test]
async fn unknown_tasks_are_not_found() {
    let _ = env_logger::try_init().ok();
    let backend = TestBackend::new().await;
    let (status, body) =
        post_request("/tasks/4242/accept", json!({ "agentId": "agent-1" }), order_routes(backend.api())).await;
    assert_eq!(status, StatusCode::NOT_FOUND, "{body}");
    backend.tear_down().await;
}
