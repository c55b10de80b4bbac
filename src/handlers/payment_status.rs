use axum::{
    Json,
    extract::{Query, State},
    response::IntoResponse,
};
use serde::Deserialize;
use serde_json::{Map, Value, json};

use crate::AppState;
use crate::error::AppError;
use crate::store::normalize_id;

#[derive(Debug, Deserialize)]
pub struct SaveStatusRequest {
    #[serde(rename = "transactionId")]
    pub transaction_id: Option<Value>,
    pub status: Option<String>,
    #[serde(rename = "utmParams")]
    pub utm_params: Option<Map<String, Value>>,
}

#[derive(Debug, Deserialize)]
pub struct StatusQuery {
    #[serde(rename = "transactionId")]
    pub transaction_id: Option<String>,
    #[serde(rename = "orderId")]
    pub order_id: Option<String>,
}

/// Merge-writes a payment record. Callers are the charge-creation flow,
/// the storefront polling flow, and the webhook.
pub async fn save_status(
    State(state): State<AppState>,
    Json(body): Json<SaveStatusRequest>,
) -> Result<impl IntoResponse, AppError> {
    let id = body
        .transaction_id
        .as_ref()
        .and_then(normalize_id)
        .ok_or(AppError::MissingField("transactionId"))?;

    let record = state.store.record(&id, body.status, body.utm_params).await;
    tracing::info!(transaction_id = %id, status = %record.status, "payment status saved");

    Ok(Json(json!({
        "success": true,
        "message": "Status saved",
        "data": {
            "status": record.status,
            "timestamp": record.timestamp.timestamp_millis(),
            "utmParams": record.utm_params,
        },
    })))
}

/// Poll target for the storefront. Unknown ids read as unpaid/pending;
/// a configured gateway is consulted first for non-mock ids so a missed
/// webhook cannot strand a paid customer.
pub async fn get_status(
    State(state): State<AppState>,
    Query(query): Query<StatusQuery>,
) -> Result<impl IntoResponse, AppError> {
    let id = query
        .transaction_id
        .or(query.order_id)
        .map(|raw| raw.trim().to_string())
        .filter(|raw| !raw.is_empty())
        .ok_or(AppError::MissingField("transactionId"))?;

    if state.gateway.is_configured() && !id.starts_with("mock-") {
        match state.gateway.charge_is_paid(&id).await {
            Ok(true) => {
                tracing::info!(transaction_id = %id, "gateway reports charge paid");
                let utm_params = state
                    .store
                    .get(&id)
                    .await
                    .map(|record| record.utm_params)
                    .unwrap_or_default();

                return Ok(Json(json!({
                    "success": true,
                    "paid": true,
                    "status": "paid",
                    "timestamp": chrono::Utc::now().timestamp_millis(),
                    "utmParams": utm_params,
                })));
            }
            Ok(false) => {}
            // Poll failures stay silent; the next interval retries.
            Err(err) => tracing::warn!(transaction_id = %id, error = %err, "gateway poll failed"),
        }
    }

    let Some(record) = state.store.get(&id).await else {
        return Ok(Json(json!({
            "success": false,
            "paid": false,
            "status": "pending",
            "utmParams": {},
        })));
    };

    Ok(Json(json!({
        "success": true,
        "paid": record.is_paid(),
        "status": record.status,
        "timestamp": record.timestamp.timestamp_millis(),
        "utmParams": record.utm_params,
    })))
}
