pub mod payment_status;
pub mod pix;
pub mod utmify;
pub mod webhook;

use axum::{Json, extract::State, response::IntoResponse};
use serde_json::json;

use crate::AppState;

pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    Json(json!({
        "status": "healthy",
        "version": env!("CARGO_PKG_VERSION"),
        "gatewayConfigured": state.gateway.is_configured(),
        "storeEntries": state.store.len().await,
    }))
}
