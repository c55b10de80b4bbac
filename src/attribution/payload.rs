//! Projection of an internal transaction into the attribution dashboard's
//! orders schema. One builder for every lifecycle transition; the caller
//! picks the target status.

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{Map, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderStatus {
    WaitingPayment,
    Paid,
    Refused,
    Refunded,
}

impl OrderStatus {
    pub fn as_wire(&self) -> &'static str {
        match self {
            OrderStatus::WaitingPayment => "waiting_payment",
            OrderStatus::Paid => "paid",
            OrderStatus::Refused => "refused",
            OrderStatus::Refunded => "refunded",
        }
    }
}

/// Internal transaction view consumed by the builder.
#[derive(Debug, Clone)]
pub struct OrderInput {
    pub order_id: String,
    /// Major currency units (e.g. 97.90).
    pub amount: f64,
    pub customer_name: String,
    pub customer_email: String,
    pub customer_document: String,
    pub customer_phone: Option<String>,
    pub product_name: String,
    /// Raw attribution bag as stored alongside the transaction.
    pub tracking: Map<String, Value>,
    pub created_at: DateTime<Utc>,
    pub approved_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UtmifyOrder {
    pub order_id: String,
    pub platform: String,
    pub payment_method: &'static str,
    pub status: &'static str,
    pub created_at: String,
    pub approved_date: Option<String>,
    pub refunded_at: Option<String>,
    pub customer: OrderCustomer,
    pub products: Vec<OrderProduct>,
    pub tracking_parameters: TrackingParameters,
    pub commission: OrderCommission,
    pub is_test: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct OrderCustomer {
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub document: Option<String>,
    pub country: &'static str,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderProduct {
    pub id: String,
    pub name: String,
    pub plan_id: Option<String>,
    pub plan_name: Option<String>,
    pub quantity: u32,
    pub price_in_cents: i64,
}

/// Field names here are the dashboard's own; they stay snake_case.
#[derive(Debug, Clone, Serialize)]
pub struct TrackingParameters {
    pub src: Option<String>,
    pub sck: Option<String>,
    pub utm_source: Option<String>,
    pub utm_campaign: Option<String>,
    pub utm_medium: Option<String>,
    pub utm_content: Option<String>,
    pub utm_term: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderCommission {
    pub total_price_in_cents: i64,
    pub gateway_fee_in_cents: i64,
    pub user_commission_in_cents: i64,
    pub currency: &'static str,
}

/// Dashboard expects `YYYY-MM-DD HH:MM:SS`, UTC, second precision.
pub fn format_order_date(date: DateTime<Utc>) -> String {
    date.format("%Y-%m-%d %H:%M:%S").to_string()
}

fn tracking_str(params: &Map<String, Value>, key: &str) -> Option<String> {
    params
        .get(key)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

fn extract_tracking(params: &Map<String, Value>) -> TrackingParameters {
    // Attribution must never go out empty: source, campaign and medium each
    // fall back to "organic" independently. Content and term stay null.
    let utm_source = tracking_str(params, "utm_source")
        .or_else(|| tracking_str(params, "src"))
        .unwrap_or_else(|| "organic".to_string());

    TrackingParameters {
        src: Some(utm_source.clone()),
        sck: None,
        utm_source: Some(utm_source),
        utm_campaign: Some(
            tracking_str(params, "utm_campaign").unwrap_or_else(|| "organic".to_string()),
        ),
        utm_medium: Some(
            tracking_str(params, "utm_medium").unwrap_or_else(|| "organic".to_string()),
        ),
        utm_content: tracking_str(params, "utm_content"),
        utm_term: tracking_str(params, "utm_term"),
    }
}

pub fn build_order(input: &OrderInput, status: OrderStatus, platform: &str) -> UtmifyOrder {
    let total_in_cents = (input.amount * 100.0).round() as i64;

    let approved_date = match status {
        OrderStatus::Paid => Some(format_order_date(input.approved_at.unwrap_or_else(Utc::now))),
        _ => None,
    };
    let refunded_at = match status {
        OrderStatus::Refunded => Some(format_order_date(Utc::now())),
        _ => None,
    };

    UtmifyOrder {
        order_id: input.order_id.clone(),
        platform: platform.to_string(),
        payment_method: "pix",
        status: status.as_wire(),
        created_at: format_order_date(input.created_at),
        approved_date,
        refunded_at,
        customer: OrderCustomer {
            name: if input.customer_name.is_empty() {
                "Cliente".to_string()
            } else {
                input.customer_name.clone()
            },
            email: input.customer_email.clone(),
            phone: input.customer_phone.clone().filter(|p| !p.is_empty()),
            document: Some(input.customer_document.clone()).filter(|d| !d.is_empty()),
            country: "BR",
        },
        products: vec![OrderProduct {
            id: "funnel-product".to_string(),
            name: input.product_name.clone(),
            plan_id: None,
            plan_name: None,
            quantity: 1,
            price_in_cents: total_in_cents,
        }],
        tracking_parameters: extract_tracking(&input.tracking),
        // Gateway fee is not exposed upstream; the whole total counts as
        // commission.
        commission: OrderCommission {
            total_price_in_cents: total_in_cents,
            gateway_fee_in_cents: 0,
            user_commission_in_cents: total_in_cents,
            currency: "BRL",
        },
        is_test: false,
    }
}
