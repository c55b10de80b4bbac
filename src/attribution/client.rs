use reqwest::Client;
use std::time::Duration;

use super::payload::{OrderInput, OrderStatus, build_order};

/// HTTP client for the attribution dashboard's orders-ingestion API.
///
/// Deliberately infallible at the boundary: every send reports success as a
/// bool so a marketing failure can never break checkout or webhook
/// processing.
#[derive(Clone)]
pub struct UtmifyClient {
    client: Client,
    base_url: String,
    api_token: Option<String>,
    platform: String,
}

impl UtmifyClient {
    pub fn new(base_url: String, api_token: Option<String>, platform: String) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .unwrap_or_default();

        UtmifyClient {
            client,
            base_url,
            api_token,
            platform,
        }
    }

    pub async fn send_pending(&self, input: &OrderInput) -> bool {
        self.send(input, OrderStatus::WaitingPayment).await
    }

    pub async fn send_paid(&self, input: &OrderInput) -> bool {
        self.send(input, OrderStatus::Paid).await
    }

    pub async fn send_refused(&self, input: &OrderInput) -> bool {
        self.send(input, OrderStatus::Refused).await
    }

    pub async fn send_refunded(&self, input: &OrderInput) -> bool {
        self.send(input, OrderStatus::Refunded).await
    }

    async fn send(&self, input: &OrderInput, status: OrderStatus) -> bool {
        // Missing token is a deployment problem, not a runtime error: skip
        // the call instead of failing the caller.
        let Some(token) = self.api_token.as_deref() else {
            tracing::error!(
                order_id = %input.order_id,
                "UTMIFY_API_TOKEN not configured, attribution event dropped"
            );
            return false;
        };

        let order = build_order(input, status, &self.platform);
        let url = format!(
            "{}/api-credentials/orders",
            self.base_url.trim_end_matches('/')
        );

        let response = self
            .client
            .post(&url)
            .header("x-api-token", token)
            .json(&order)
            .send()
            .await;

        match response {
            Ok(resp) if resp.status().is_success() => {
                tracing::info!(
                    order_id = %order.order_id,
                    status = order.status,
                    "attribution event forwarded"
                );
                true
            }
            Ok(resp) => {
                let http_status = resp.status().as_u16();
                let body = resp.text().await.unwrap_or_default();
                tracing::error!(
                    order_id = %order.order_id,
                    http_status,
                    %body,
                    "attribution API rejected event"
                );
                false
            }
            Err(err) => {
                tracing::error!(
                    order_id = %order.order_id,
                    error = %err,
                    "failed to reach attribution API"
                );
                false
            }
        }
    }
}
