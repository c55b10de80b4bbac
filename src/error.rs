use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Missing required field: {0}")]
    MissingField(&'static str),

    /// A charge the gateway rejected outright. Kept separate from
    /// `Upstream` because the refusal reason must reach the customer.
    #[error("Transaction refused by gateway: {reason}")]
    ChargeRefused {
        reason: String,
        code: Option<String>,
        transaction_id: Option<String>,
    },

    #[error("Upstream error ({status}): {body}")]
    Upstream { status: u16, body: String },

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validation(_) | AppError::MissingField(_) => StatusCode::BAD_REQUEST,
            AppError::ChargeRefused { .. } => StatusCode::BAD_REQUEST,
            AppError::Upstream { status, .. } => {
                // Surface the upstream status where it is meaningful.
                StatusCode::from_u16(*status)
                    .ok()
                    .filter(|code| code.is_client_error() || code.is_server_error())
                    .unwrap_or(StatusCode::BAD_GATEWAY)
            }
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Config(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = match &self {
            AppError::ChargeRefused {
                reason,
                code,
                transaction_id,
            } => Json(json!({
                "error": self.to_string(),
                "status": status.as_u16(),
                "refusedReason": { "description": reason, "acquirerCode": code },
                "transactionId": transaction_id,
            })),
            AppError::Upstream { body, .. } => Json(json!({
                "error": self.to_string(),
                "status": status.as_u16(),
                "details": body,
            })),
            _ => Json(json!({
                "error": self.to_string(),
                "status": status.as_u16(),
            })),
        };

        (status, body).into_response()
    }
}
