use axum::{Json, extract::State, response::IntoResponse};
use chrono::Utc;
use serde::Deserialize;
use serde_json::{Map, Value, json};

use crate::AppState;
use crate::attribution::OrderInput;
use crate::error::AppError;
use crate::store::normalize_id;

#[derive(Debug, Default, Deserialize)]
pub struct ForwardCustomer {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub document: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ForwardRequest {
    pub order_id: Option<Value>,
    pub status: String,
    #[serde(default)]
    pub amount: f64,
    #[serde(default)]
    pub customer: ForwardCustomer,
    #[serde(default)]
    pub tracking_parameters: Map<String, Value>,
    pub product_name: Option<String>,
}

/// Routes a lifecycle transition to the matching attribution send. All
/// transitions funnel through the same payload builder downstream.
pub async fn forward(
    State(state): State<AppState>,
    Json(body): Json<ForwardRequest>,
) -> Result<impl IntoResponse, AppError> {
    let order_id = body
        .order_id
        .as_ref()
        .and_then(normalize_id)
        .ok_or(AppError::MissingField("orderId"))?;

    let status = body.status.trim().to_string();
    let order = OrderInput {
        order_id: order_id.clone(),
        amount: body.amount,
        customer_name: body.customer.name.unwrap_or_else(|| "Cliente".to_string()),
        customer_email: body.customer.email.unwrap_or_default(),
        customer_document: body.customer.document.unwrap_or_default(),
        customer_phone: body.customer.phone,
        product_name: body
            .product_name
            .filter(|name| !name.trim().is_empty())
            .unwrap_or_else(|| state.config.default_product_name.clone()),
        tracking: body.tracking_parameters,
        created_at: Utc::now(),
        approved_at: (status == "paid").then(Utc::now),
    };

    let sent = match status.as_str() {
        "waiting_payment" | "pending" => state.utmify.send_pending(&order).await,
        "paid" => state.utmify.send_paid(&order).await,
        "refused" => state.utmify.send_refused(&order).await,
        "refunded" => state.utmify.send_refunded(&order).await,
        other => {
            return Err(AppError::Validation(format!(
                "Unrecognized attribution status: {other}"
            )));
        }
    };

    if !sent {
        return Err(AppError::Internal(
            "Failed to forward event to attribution API".to_string(),
        ));
    }

    Ok(Json(json!({
        "success": true,
        "message": "Attribution event forwarded",
        "orderId": order_id,
        "status": status,
    })))
}
