//! Charge-creation orchestration: validate and create the charge, seed the
//! status store as pending with the attribution bag, then fire the
//! waiting_payment event at the dashboard.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::AppState;
use crate::attribution::OrderInput;
use crate::error::AppError;
use crate::gateway::{ChargeItem, ChargeRequest, CustomerAddress};

fn default_phone() -> String {
    "11999999999".to_string()
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePixRequest {
    pub amount: f64,
    pub customer_name: String,
    pub customer_email: String,
    pub customer_document: String,
    #[serde(default = "default_phone")]
    pub customer_phone: String,
    pub customer_address: Option<CustomerAddress>,
    #[serde(default)]
    pub items: Vec<ChargeItem>,
    pub product_name: Option<String>,
    #[serde(default)]
    pub tracking_parameters: Map<String, Value>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePixResponse {
    pub success: bool,
    pub pix_code: String,
    pub pix_qr_code: String,
    pub transaction_id: String,
    pub expires_at: String,
    pub is_mock: bool,
}

pub async fn create_pix_charge(
    state: &AppState,
    req: CreatePixRequest,
) -> Result<CreatePixResponse, AppError> {
    let product_name = req
        .product_name
        .clone()
        .filter(|name| !name.trim().is_empty())
        .unwrap_or_else(|| state.config.default_product_name.clone());

    let charge = ChargeRequest {
        amount: req.amount,
        customer_name: req.customer_name.clone(),
        customer_email: req.customer_email.clone(),
        customer_document: req.customer_document.clone(),
        customer_phone: req.customer_phone.clone(),
        address: req.customer_address.clone(),
        items: req.items.clone(),
        product_name: product_name.clone(),
    };

    let outcome = state.gateway.create_charge(&charge).await?;

    // Seed the record before anything can observe the id, so the first
    // client poll already sees pending plus attribution.
    state
        .store
        .record(
            &outcome.transaction_id,
            Some("pending".to_string()),
            Some(req.tracking_parameters.clone()),
        )
        .await;

    let order = OrderInput {
        order_id: outcome.transaction_id.clone(),
        amount: req.amount,
        customer_name: req.customer_name,
        customer_email: req.customer_email,
        customer_document: req.customer_document,
        customer_phone: Some(req.customer_phone),
        product_name,
        tracking: req.tracking_parameters,
        created_at: Utc::now(),
        approved_at: None,
    };

    // Side channel only; a dropped pending event never fails the checkout.
    if !state.utmify.send_pending(&order).await {
        tracing::warn!(
            transaction_id = %outcome.transaction_id,
            "waiting_payment attribution event was not delivered"
        );
    }

    Ok(CreatePixResponse {
        success: true,
        pix_code: outcome.pix_code,
        pix_qr_code: outcome.qr_code_url,
        transaction_id: outcome.transaction_id,
        expires_at: outcome.expires_at,
        is_mock: outcome.is_mock,
    })
}
