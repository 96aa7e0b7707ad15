// crates/api/tests/routes_test.rs

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use eabridge_api::{build_router, BridgeConfig};
use eabridge_core::DEFAULT_EA_ID;
use eabridge_queue::QueueStore;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

fn test_app(config: &BridgeConfig) -> (Router, Arc<QueueStore>) {
    let store = Arc::new(QueueStore::new());
    (build_router(Arc::clone(&store), config), store)
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    (status, serde_json::from_slice(&bytes).unwrap())
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn market_order(ea_id: &str, comment: &str) -> Value {
    json!({
        "ea_id": ea_id,
        "symbol": "EURUSD",
        "order_type": "BUY",
        "volume": 0.1,
        "comment": comment,
    })
}

#[tokio::test]
async fn open_position_then_poll_returns_command() {
    let (app, _) = test_app(&BridgeConfig::default());

    let (status, body) = send(
        &app,
        post_json(
            "/position/open",
            json!({
                "ea_id": "E1",
                "symbol": "EURUSD",
                "order_type": "BUY_STOP",
                "volume": 0.01,
                "price": 1.25
            }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["ea_id"], "E1");
    assert_eq!(body["symbol"], "EURUSD");
    assert_eq!(body["order_type"], "BUY_STOP");
    assert_eq!(body["volume"], 0.01);
    assert_eq!(body["price"], 1.25);
    assert_eq!(body["comment"], "");
    assert_eq!(body["status"], "pending");
    let command_id = body["command_id"].as_str().unwrap().to_string();

    let (status, body) = send(&app, get("/commands?ea_id=E1")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["ea_id"], "E1");
    let commands = body["commands"].as_array().unwrap();
    assert_eq!(commands.len(), 1);
    assert_eq!(commands[0]["command_id"], command_id.as_str());
    assert_eq!(commands[0]["symbol"], "EURUSD");
    assert_eq!(commands[0]["order_type"], "BUY_STOP");
    assert_eq!(commands[0]["volume"], 0.01);
    assert_eq!(commands[0]["price"], 1.25);
}

#[tokio::test]
async fn commands_come_back_in_submission_order() {
    let (app, _) = test_app(&BridgeConfig::default());

    for comment in ["c1", "c2", "c3"] {
        let (status, _) = send(&app, post_json("/position/open", market_order("E1", comment))).await;
        assert_eq!(status, StatusCode::OK);
    }

    let (_, body) = send(&app, get("/commands?ea_id=E1")).await;
    let comments: Vec<&str> = body["commands"]
        .as_array()
        .unwrap()
        .iter()
        .map(|c| c["comment"].as_str().unwrap())
        .collect();
    assert_eq!(comments, vec!["c1", "c2", "c3"]);
}

#[tokio::test]
async fn queues_are_isolated_per_ea() {
    let (app, _) = test_app(&BridgeConfig::default());

    send(&app, post_json("/position/open", market_order("A", "for-a"))).await;

    let (status, body) = send(&app, get("/commands?ea_id=B")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "ea_id": "B", "commands": [] }));

    let (_, body) = send(&app, get("/commands?ea_id=A")).await;
    assert_eq!(body["commands"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn omitted_ea_id_uses_default_on_both_routes() {
    let (app, _) = test_app(&BridgeConfig::default());

    let (status, body) = send(
        &app,
        post_json(
            "/position/open",
            json!({ "symbol": "GBPUSD", "order_type": "SELL", "volume": 1 }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["ea_id"], DEFAULT_EA_ID);

    let (_, implicit) = send(&app, get("/commands")).await;
    let (_, explicit) = send(&app, get(&format!("/commands?ea_id={DEFAULT_EA_ID}"))).await;
    assert_eq!(implicit, explicit);
    assert_eq!(implicit["ea_id"], DEFAULT_EA_ID);
    assert_eq!(implicit["commands"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn configured_default_ea_id_is_shared() {
    let config = BridgeConfig {
        default_ea_id: "MAIN_EA".to_string(),
        ..Default::default()
    };
    let (app, store) = test_app(&config);

    let (_, body) = send(
        &app,
        post_json(
            "/position/open",
            json!({ "symbol": "XAUUSD", "order_type": "BUY", "volume": 0.2 }),
        ),
    )
    .await;
    assert_eq!(body["ea_id"], "MAIN_EA");
    assert_eq!(store.pending_count("MAIN_EA"), 1);

    let (_, body) = send(&app, get("/commands")).await;
    assert_eq!(body["ea_id"], "MAIN_EA");
    assert_eq!(body["commands"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn unknown_ea_polls_empty() {
    let (app, _) = test_app(&BridgeConfig::default());

    let (status, body) = send(&app, get("/commands?ea_id=never-used")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["commands"], json!([]));
}

#[tokio::test]
async fn invalid_orders_are_rejected_and_never_queued() {
    let (app, store) = test_app(&BridgeConfig::default());

    let (status, body) = send(
        &app,
        post_json(
            "/position/open",
            json!({ "ea_id": "E1", "symbol": "EURUSD", "order_type": "BUY", "volume": -1 }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "volume must be a positive number");

    let (status, body) = send(
        &app,
        post_json(
            "/position/open",
            json!({ "ea_id": "E1", "symbol": "EURUSD", "order_type": "NOT_A_TYPE", "volume": 1 }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("NOT_A_TYPE"));

    let (status, body) = send(
        &app,
        post_json(
            "/position/open",
            json!({ "ea_id": "E1", "symbol": "EURUSD", "order_type": "SELL_LIMIT", "volume": 1 }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "price is required for SELL_LIMIT orders");

    let (_, body) = send(&app, get("/commands?ea_id=E1")).await;
    assert_eq!(body["commands"], json!([]));
    assert_eq!(store.total_pending(), 0);
}

#[tokio::test]
async fn malformed_body_gets_structured_error() {
    let (app, store) = test_app(&BridgeConfig::default());

    let request = Request::builder()
        .method("POST")
        .uri("/position/open")
        .header("content-type", "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let (status, body) = send(&app, request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().starts_with("invalid request"));

    let (status, body) = send(
        &app,
        post_json("/position/open", json!({ "symbol": "EURUSD", "order_type": "BUY" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());
    assert_eq!(store.total_pending(), 0);
}

#[tokio::test]
async fn consume_drains_the_queue() {
    let (app, _) = test_app(&BridgeConfig::default());

    send(&app, post_json("/position/open", market_order("E1", "c1"))).await;
    send(&app, post_json("/position/open", market_order("E1", "c2"))).await;

    let (_, body) = send(&app, get("/commands?ea_id=E1")).await;
    assert_eq!(body["commands"].as_array().unwrap().len(), 2);

    let (_, body) = send(&app, get("/commands?ea_id=E1&consume=true")).await;
    let commands = body["commands"].as_array().unwrap();
    assert_eq!(commands.len(), 2);
    assert!(commands.iter().all(|c| c["status"] == "delivered"));

    let (_, body) = send(&app, get("/commands?ea_id=E1")).await;
    assert_eq!(body["commands"], json!([]));
}

#[tokio::test]
async fn bad_query_gets_structured_error() {
    let (app, _) = test_app(&BridgeConfig::default());

    let (status, body) = send(&app, get("/commands?ea_id=E1&consume=maybe")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn acknowledge_removes_selected_commands() {
    let (app, _) = test_app(&BridgeConfig::default());

    let (_, first) = send(&app, post_json("/position/open", market_order("E1", "c1"))).await;
    let (_, second) = send(&app, post_json("/position/open", market_order("E1", "c2"))).await;

    let (status, body) = send(
        &app,
        post_json(
            "/commands/ack",
            json!({ "ea_id": "E1", "command_ids": [first["command_id"]] }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["ea_id"], "E1");
    assert_eq!(body["acknowledged"], json!([first["command_id"]]));

    let (_, body) = send(&app, get("/commands?ea_id=E1")).await;
    let commands = body["commands"].as_array().unwrap();
    assert_eq!(commands.len(), 1);
    assert_eq!(commands[0]["command_id"], second["command_id"]);

    // Acknowledging again is harmless.
    let (_, body) = send(
        &app,
        post_json(
            "/commands/ack",
            json!({ "ea_id": "E1", "command_ids": [first["command_id"]] }),
        ),
    )
    .await;
    assert_eq!(body["acknowledged"], json!([]));
}

#[tokio::test]
async fn queues_and_health_report_depth() {
    let (app, _) = test_app(&BridgeConfig::default());

    send(&app, post_json("/position/open", market_order("B", "b1"))).await;
    send(&app, post_json("/position/open", market_order("A", "a1"))).await;
    send(&app, post_json("/position/open", market_order("A", "a2"))).await;

    let (status, body) = send(&app, get("/queues")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({
            "queues": [
                { "ea_id": "A", "pending": 2 },
                { "ea_id": "B", "pending": 1 },
            ],
            "total_pending": 3,
        })
    );

    let (status, body) = send(&app, get("/health")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["pending"], 3);
}
