pub mod attribution;
pub mod config;
pub mod error;
pub mod gateway;
pub mod handlers;
pub mod services;
pub mod store;

use std::sync::Arc;

use axum::{
    Router,
    routing::{get, post},
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::attribution::UtmifyClient;
use crate::config::Config;
use crate::gateway::GatewayClient;
use crate::store::{InMemoryStatusStore, StatusStore};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub store: Arc<dyn StatusStore>,
    pub gateway: GatewayClient,
    pub utmify: UtmifyClient,
}

impl AppState {
    pub fn from_config(config: Config) -> Self {
        let gateway = GatewayClient::new(
            config.gateway_base_url.clone(),
            config.gateway_secret_key.clone(),
            config.gateway_company_id.clone(),
            config.qr_service_url.clone(),
        );
        let utmify = UtmifyClient::new(
            config.utmify_base_url.clone(),
            config.utmify_api_token.clone(),
            config.platform_name.clone(),
        );

        AppState {
            config: Arc::new(config),
            store: Arc::new(InMemoryStatusStore::new()),
            gateway,
            utmify,
        }
    }
}

pub fn create_app(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .route(
            "/payment-status",
            post(handlers::payment_status::save_status).get(handlers::payment_status::get_status),
        )
        .route("/pix/create", post(handlers::pix::create))
        .route("/pix/get", get(handlers::pix::get))
        .route("/utmify", post(handlers::utmify::forward))
        .route(
            "/webhook/gateway",
            post(handlers::webhook::receive).get(handlers::webhook::probe),
        )
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
