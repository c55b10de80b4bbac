use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use serde_json::{Value, json};
use tower::ServiceExt;

use funnel_core::config::Config;
use funnel_core::{AppState, create_app};

fn test_config() -> Config {
    Config {
        server_port: 0,
        gateway_base_url: "http://127.0.0.1:1".to_string(),
        gateway_secret_key: None,
        gateway_company_id: None,
        utmify_base_url: "http://127.0.0.1:1".to_string(),
        utmify_api_token: None,
        qr_service_url: "https://api.qrserver.com/v1/create-qr-code/".to_string(),
        platform_name: "Loja Teste".to_string(),
        default_product_name: "Kit Teste".to_string(),
        status_retention: Duration::from_secs(3600),
        sweep_interval: Duration::from_secs(60),
        extra_paid_statuses: Vec::new(),
    }
}

fn app() -> axum::Router {
    create_app(AppState::from_config(test_config()))
}

async fn send_json(
    app: &axum::Router,
    method: &str,
    uri: &str,
    body: Value,
) -> (StatusCode, Value) {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let parsed = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, parsed)
}

async fn get_json(app: &axum::Router, uri: &str) -> (StatusCode, Value) {
    let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let parsed = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, parsed)
}

#[tokio::test]
async fn malformed_body_is_rejected_with_400() {
    let app = app();
    let request = Request::builder()
        .method("POST")
        .uri("/webhook/gateway")
        .header("content-type", "application/json")
        .body(Body::from("not json {"))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn missing_transaction_id_is_rejected_with_400() {
    let app = app();
    let (status, body) = send_json(
        &app,
        "POST",
        "/webhook/gateway",
        json!({ "status": "PAID" }),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "No transaction ID");
}

#[tokio::test]
async fn unrecognized_status_answers_200_and_mutates_nothing() {
    let app = app();

    let (status, body) = send_json(
        &app,
        "POST",
        "/webhook/gateway",
        json!({ "id": "tx-foo", "status": "FOO" }),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], json!(false));
    assert_eq!(body["receivedStatus"], "FOO");

    // Store untouched: the id still reads as unknown/pending.
    let (_, polled) = get_json(&app, "/payment-status?transactionId=tx-foo").await;
    assert_eq!(polled["success"], json!(false));
    assert_eq!(polled["paid"], json!(false));
    assert_eq!(polled["status"], "pending");
}

#[tokio::test]
async fn paid_webhook_records_paid_with_stored_attribution() {
    let app = app();

    // Seed attribution as the charge-creation flow would.
    let (status, _) = send_json(
        &app,
        "POST",
        "/payment-status",
        json!({
            "transactionId": "tx-10",
            "status": "pending",
            "utmParams": { "utm_source": "meta", "utm_campaign": "launch" },
        }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send_json(
        &app,
        "POST",
        "/webhook/gateway",
        json!({
            "data": {
                "id": "tx-10",
                "status": "paid",
                "amount": 9790,
                "customer": { "name": "Maria", "email": "m@example.com" },
            },
        }),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], json!(true));
    assert_eq!(body["transactionId"], "tx-10");

    let (_, polled) = get_json(&app, "/payment-status?transactionId=tx-10").await;
    assert_eq!(polled["paid"], json!(true));
    assert_eq!(polled["status"], "paid");
    assert_eq!(polled["utmParams"]["utm_source"], "meta");
}

#[tokio::test]
async fn duplicate_paid_webhook_is_safe_and_converges() {
    let app = app();
    let webhook = json!({ "id": "tx-dup", "status": "APPROVED", "amount": 500 });

    let (first, _) = send_json(&app, "POST", "/webhook/gateway", webhook.clone()).await;
    let (second, body) = send_json(&app, "POST", "/webhook/gateway", webhook).await;

    assert_eq!(first, StatusCode::OK);
    assert_eq!(second, StatusCode::OK);
    assert_eq!(body["success"], json!(true));

    let (_, polled) = get_json(&app, "/payment-status?transactionId=tx-dup").await;
    assert_eq!(polled["paid"], json!(true));
    assert_eq!(polled["status"], "paid");
    // Fallback attribution was applied exactly once and stayed put.
    assert_eq!(polled["utmParams"]["utm_source"], "organic");
}

#[tokio::test]
async fn synonym_statuses_all_settle_the_transaction() {
    for (i, synonym) in ["PAGO", "CONFIRMADO", "TRANSACTION_APPROVED", "DONE"]
        .iter()
        .enumerate()
    {
        let app = app();
        let id = format!("tx-syn-{i}");
        let (status, body) = send_json(
            &app,
            "POST",
            "/webhook/gateway",
            json!({ "id": id, "pay_status": synonym }),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], json!(true), "{synonym} should settle");

        let (_, polled) = get_json(&app, &format!("/payment-status?transactionId={id}")).await;
        assert_eq!(polled["paid"], json!(true));
    }
}

#[tokio::test]
async fn lowercase_status_is_normalized_before_classification() {
    let app = app();
    let (status, body) = send_json(
        &app,
        "POST",
        "/webhook/gateway",
        json!({ "id": "tx-lc", "status": "  paid " }),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], json!(true));
}

#[tokio::test]
async fn webhook_probe_endpoint_reports_alive() {
    let app = app();
    let (status, body) = get_json(&app, "/webhook/gateway").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Gateway webhook active");
}

#[tokio::test]
async fn empty_stored_attribution_falls_back_to_organic() {
    let app = app();

    // Record exists but carries no usable source.
    send_json(
        &app,
        "POST",
        "/payment-status",
        json!({ "transactionId": "tx-empty-utm", "status": "pending" }),
    )
    .await;

    send_json(
        &app,
        "POST",
        "/webhook/gateway",
        json!({ "id": "tx-empty-utm", "status": "PAID" }),
    )
    .await;

    let (_, polled) = get_json(&app, "/payment-status?transactionId=tx-empty-utm").await;
    assert_eq!(polled["utmParams"]["utm_source"], "organic");
    assert_eq!(polled["utmParams"]["utm_medium"], "organic");
    assert_eq!(polled["utmParams"]["utm_campaign"], "organic");
}
