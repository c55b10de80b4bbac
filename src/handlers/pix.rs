use axum::{
    Json,
    extract::{Query, State},
    response::IntoResponse,
};
use serde::Deserialize;
use serde_json::json;

use crate::AppState;
use crate::error::AppError;
use crate::services::{CreatePixRequest, create_pix_charge};

#[derive(Debug, Deserialize)]
pub struct GetPixQuery {
    #[serde(rename = "transactionId")]
    pub transaction_id: Option<String>,
    #[serde(rename = "orderId")]
    pub order_id: Option<String>,
}

pub async fn create(
    State(state): State<AppState>,
    Json(body): Json<CreatePixRequest>,
) -> Result<impl IntoResponse, AppError> {
    let response = create_pix_charge(&state, body).await?;
    Ok(Json(response))
}

/// Re-fetches an existing charge so the storefront can re-render the PIX
/// code after a reload. Live gateway only; mock charges are never
/// re-fetchable.
pub async fn get(
    State(state): State<AppState>,
    Query(query): Query<GetPixQuery>,
) -> Result<impl IntoResponse, AppError> {
    let id = query
        .transaction_id
        .or(query.order_id)
        .map(|raw| raw.trim().to_string())
        .filter(|raw| !raw.is_empty())
        .ok_or(AppError::MissingField("transactionId"))?;

    let details = state.gateway.fetch_charge(&id).await?;

    Ok(Json(json!({
        "success": true,
        "pixCode": details.pix_code,
        "qrCodeUrl": details.qr_code_url,
        "transactionId": details.transaction_id,
        "status": details.status,
    })))
}
