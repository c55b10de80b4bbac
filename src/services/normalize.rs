//! Shape probing over the gateway's unversioned webhook payloads.
//!
//! Every extraction walks an explicit ordered path list over the raw JSON
//! document, first non-empty match wins. The lists are public constants so
//! the probing order is documented and testable instead of living in
//! conditional chains.

use serde_json::{Map, Value};

/// Accepted "paid" vocabulary, assembled empirically from observed gateway
/// payloads. The list is extended through configuration, never edited:
/// an unrecognized status must stay a visible no-op rather than a guess.
pub const PAID_STATUSES: &[&str] = &[
    "PAID",
    "APPROVED",
    "APROVADO",
    "SUCCESS",
    "SUCCESSFUL",
    "COMPLETED",
    "COMPLETE",
    "PAGO",
    "CONFIRMADO",
    "CONFIRMED",
    "PAYMENT_CONFIRMED",
    "TRANSACTION_APPROVED",
    "FINISHED",
    "DONE",
];

/// Candidate locations for the transaction identifier.
pub const TRANSACTION_ID_PATHS: &[&[&str]] = &[
    &["data", "id"],
    &["id"],
    &["trans_id"],
    &["transaction_id"],
    &["transactionId"],
];

/// Candidate locations for the raw status string.
pub const STATUS_PATHS: &[&[&str]] = &[
    &["data", "status"],
    &["status"],
    &["pay_status"],
    &["trans_status"],
    &["payment_status"],
    &["transaction_status"],
];

/// Candidate locations for the amount, in minor currency units.
pub const AMOUNT_PATHS: &[&[&str]] = &[&["data", "amount"], &["amount"], &["trans_amt"]];

#[derive(Debug, Clone, Default, PartialEq)]
pub struct WebhookCustomer {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub document: String,
}

fn walk<'a>(body: &'a Value, path: &[&str]) -> &'a Value {
    let mut node = body;
    for segment in path {
        node = &node[*segment];
    }
    node
}

fn probe_string(body: &Value, paths: &[&[&str]]) -> Option<String> {
    for path in paths {
        let candidate = match walk(body, path) {
            Value::String(s) => s.trim().to_string(),
            Value::Number(n) => n.to_string(),
            _ => continue,
        };
        if !candidate.is_empty() {
            return Some(candidate);
        }
    }
    None
}

pub fn extract_transaction_id(body: &Value) -> Option<String> {
    probe_string(body, TRANSACTION_ID_PATHS)
}

/// Raw status, uppercased and trimmed; empty when no candidate matched.
pub fn extract_status(body: &Value) -> String {
    probe_string(body, STATUS_PATHS)
        .map(|s| s.to_uppercase())
        .unwrap_or_default()
}

pub fn is_paid_status(normalized: &str, extra: &[String]) -> bool {
    PAID_STATUSES.contains(&normalized) || extra.iter().any(|s| s == normalized)
}

pub fn extract_customer(body: &Value) -> WebhookCustomer {
    let field = |paths: &[&[&str]]| probe_string(body, paths).unwrap_or_default();

    WebhookCustomer {
        name: probe_string(
            body,
            &[&["data", "customer", "name"], &["customer_name"], &["customer", "name"]],
        )
        .unwrap_or_else(|| "Cliente".to_string()),
        email: field(&[&["data", "customer", "email"], &["customer_email"], &["customer", "email"]]),
        phone: field(&[&["data", "customer", "phone"], &["customer_phone"], &["customer", "phone"]]),
        document: field(&[
            &["data", "customer", "document"],
            &["customer_document"],
            &["customer", "document"],
        ]),
    }
}

/// Amount in major units: upstream sends minor units, divide by 100.
pub fn extract_amount(body: &Value) -> f64 {
    for path in AMOUNT_PATHS {
        if let Some(minor) = walk(body, path).as_f64() {
            return minor / 100.0;
        }
    }
    0.0
}

/// Fixed attribution block used when a paid webhook arrives for a
/// transaction with no stored (or unusable) campaign data.
pub fn organic_fallback() -> Map<String, Value> {
    let mut params = Map::new();
    params.insert("utm_source".to_string(), Value::String("organic".to_string()));
    params.insert("utm_medium".to_string(), Value::String("organic".to_string()));
    params.insert("utm_campaign".to_string(), Value::String("organic".to_string()));
    params.insert("utm_content".to_string(), Value::Null);
    params.insert("utm_term".to_string(), Value::Null);
    params
}

/// Stored attribution is usable only when the bag is non-empty and carries
/// a non-empty `utm_source`.
pub fn usable_tracking(params: &Map<String, Value>) -> bool {
    !params.is_empty()
        && params
            .get("utm_source")
            .and_then(Value::as_str)
            .map(str::trim)
            .is_some_and(|s| !s.is_empty())
}
