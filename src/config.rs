use anyhow::Result;
use dotenvy::dotenv;
use std::env;
use std::time::Duration;

pub const DEFAULT_GATEWAY_BASE_URL: &str = "https://api.coldfypay.com/functions/v1";
pub const DEFAULT_UTMIFY_BASE_URL: &str = "https://api.utmify.com.br";
pub const DEFAULT_QR_SERVICE_URL: &str = "https://api.qrserver.com/v1/create-qr-code/";

#[derive(Debug, Clone)]
pub struct Config {
    pub server_port: u16,
    pub gateway_base_url: String,
    pub gateway_secret_key: Option<String>,
    pub gateway_company_id: Option<String>,
    pub utmify_base_url: String,
    pub utmify_api_token: Option<String>,
    pub qr_service_url: String,
    /// Platform name reported to the attribution dashboard.
    pub platform_name: String,
    /// Product line used when the checkout payload carries no items.
    pub default_product_name: String,
    /// How long a payment record survives without a write.
    pub status_retention: Duration,
    pub sweep_interval: Duration,
    /// Extra accepted "paid" statuses, appended to the built-in list.
    pub extra_paid_statuses: Vec<String>,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenv().ok(); // Load .env file if present

        Ok(Config {
            server_port: env::var("SERVER_PORT")
                .unwrap_or_else(|_| "3000".to_string())
                .parse()?,
            gateway_base_url: env::var("GATEWAY_BASE_URL")
                .unwrap_or_else(|_| DEFAULT_GATEWAY_BASE_URL.to_string()),
            gateway_secret_key: env::var("GATEWAY_SECRET_KEY").ok().filter(|v| !v.is_empty()),
            gateway_company_id: env::var("GATEWAY_COMPANY_ID").ok().filter(|v| !v.is_empty()),
            utmify_base_url: env::var("UTMIFY_BASE_URL")
                .unwrap_or_else(|_| DEFAULT_UTMIFY_BASE_URL.to_string()),
            utmify_api_token: env::var("UTMIFY_API_TOKEN").ok().filter(|v| !v.is_empty()),
            qr_service_url: env::var("QR_SERVICE_URL")
                .unwrap_or_else(|_| DEFAULT_QR_SERVICE_URL.to_string()),
            platform_name: env::var("PLATFORM_NAME")
                .unwrap_or_else(|_| "Funnel E-commerce".to_string()),
            default_product_name: env::var("DEFAULT_PRODUCT_NAME")
                .unwrap_or_else(|_| "Kit Padrao".to_string()),
            status_retention: Duration::from_secs(
                env::var("STATUS_RETENTION_SECS")
                    .unwrap_or_else(|_| "3600".to_string())
                    .parse()?,
            ),
            sweep_interval: Duration::from_secs(
                env::var("SWEEP_INTERVAL_SECS")
                    .unwrap_or_else(|_| "60".to_string())
                    .parse()?,
            ),
            extra_paid_statuses: parse_extra_statuses(
                &env::var("EXTRA_PAID_STATUSES").unwrap_or_default(),
            ),
        })
    }

    /// Both gateway credentials must be present for live charges; anything
    /// less falls back to mock mode.
    pub fn gateway_configured(&self) -> bool {
        self.gateway_secret_key.is_some() && self.gateway_company_id.is_some()
    }
}

fn parse_extra_statuses(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(|entry| entry.to_uppercase())
        .collect()
}
