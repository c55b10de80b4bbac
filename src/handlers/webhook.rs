use axum::{
    Json,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use chrono::Utc;
use serde_json::{Value, json};

use crate::AppState;
use crate::attribution::OrderInput;
use crate::services::normalize;

/// Inbound gateway notification. Body shape is unversioned upstream, so
/// everything is probed out of the raw document.
///
/// Responses are deliberately generous: a recognized-but-unpaid status
/// still gets a 200 so the gateway does not retry a status this service
/// will never act on. Only malformed input earns a 400.
pub async fn receive(State(state): State<AppState>, body: String) -> Response {
    let payload: Value = match serde_json::from_str(&body) {
        Ok(value) => value,
        Err(err) => {
            tracing::error!(error = %err, "webhook body is not valid JSON");
            return (
                StatusCode::BAD_REQUEST,
                Json(json!({ "error": "Invalid JSON" })),
            )
                .into_response();
        }
    };

    let Some(transaction_id) = normalize::extract_transaction_id(&payload) else {
        tracing::error!("webhook carries no transaction id");
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": "No transaction ID" })),
        )
            .into_response();
    };

    let raw_status = normalize::extract_status(&payload);
    tracing::info!(%transaction_id, %raw_status, "gateway webhook received");

    if !normalize::is_paid_status(&raw_status, &state.config.extra_paid_statuses) {
        tracing::warn!(
            %transaction_id,
            %raw_status,
            "unrecognized webhook status, taking no action"
        );
        return (
            StatusCode::OK,
            Json(json!({
                "success": false,
                "message": format!("Unrecognized status: \"{raw_status}\""),
                "receivedStatus": raw_status,
                "acceptedStatuses": normalize::PAID_STATUSES,
            })),
        )
            .into_response();
    }

    // Stored attribution wins when usable; otherwise the organic fallback.
    // The paid event never goes out with an empty tracking block.
    let stored = state.store.get(&transaction_id).await;
    let tracking = match stored {
        Some(record) if normalize::usable_tracking(&record.utm_params) => record.utm_params,
        _ => {
            tracing::warn!(%transaction_id, "no usable stored attribution, using organic fallback");
            normalize::organic_fallback()
        }
    };

    let customer = normalize::extract_customer(&payload);
    let amount = normalize::extract_amount(&payload);

    let order = OrderInput {
        order_id: transaction_id.clone(),
        amount,
        customer_name: customer.name,
        customer_email: customer.email,
        customer_document: customer.document,
        customer_phone: Some(customer.phone).filter(|p| !p.is_empty()),
        product_name: state.config.default_product_name.clone(),
        tracking: tracking.clone(),
        created_at: Utc::now(),
        approved_at: Some(Utc::now()),
    };

    // Forwarding failure is logged and swallowed: the gateway already got
    // its answer and must not retry on our account. The dashboard dedupes
    // by order id, so a duplicate delivery re-sending this event is fine.
    if !state.utmify.send_paid(&order).await {
        tracing::error!(%transaction_id, "failed to forward paid attribution event");
    }

    state
        .store
        .record(&transaction_id, Some("paid".to_string()), Some(tracking))
        .await;
    tracing::info!(%transaction_id, "payment confirmed and recorded");

    (
        StatusCode::OK,
        Json(json!({
            "success": true,
            "message": "Payment approved and forwarded",
            "transactionId": transaction_id,
        })),
    )
        .into_response()
}

/// Liveness probe the gateway dashboard uses to validate the callback URL.
pub async fn probe() -> impl IntoResponse {
    Json(json!({
        "message": "Gateway webhook active",
        "timestamp": Utc::now().to_rfc3339(),
    }))
}
