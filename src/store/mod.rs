//! Payment-status store: the single in-process source of truth for
//! "has this transaction been paid", keyed by the gateway's charge id.

pub mod memory;

pub use memory::{InMemoryStatusStore, spawn_sweeper};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::{Map, Value};
use std::time::Duration;

/// Store-side vocabulary accepted as settled. Distinct from the webhook
/// allow-list: these are the values callers of `POST /payment-status`
/// actually write, compared verbatim.
pub const SETTLED_STATUSES: &[&str] = &["paid", "approved", "completed"];

#[derive(Debug, Clone)]
pub struct PaymentRecord {
    /// Last raw status written for this transaction.
    pub status: String,
    /// Refreshed on every write; only consulted by the TTL sweep.
    pub timestamp: DateTime<Utc>,
    /// Campaign attribution bag. Sticky: merged writes never clear it.
    pub utm_params: Map<String, Value>,
}

impl PaymentRecord {
    pub fn is_paid(&self) -> bool {
        SETTLED_STATUSES.contains(&self.status.as_str())
    }
}

/// Normalizes an inbound transaction id. Callers send both strings and
/// numbers; both collapse to a trimmed string key.
pub fn normalize_id(raw: &Value) -> Option<String> {
    let id = match raw {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        _ => return None,
    };
    if id.is_empty() { None } else { Some(id) }
}

/// Storage seam for payment state. The in-memory map is the only
/// implementation today; the trait exists so a real cache or database can
/// replace it without touching the handlers.
#[async_trait]
pub trait StatusStore: Send + Sync {
    /// Merge-write. Incoming status wins when present, else the stored one,
    /// else `pending`. Incoming attribution wins only when non-empty.
    /// The timestamp is always refreshed. Last write wins under races.
    async fn record(
        &self,
        id: &str,
        status: Option<String>,
        utm_params: Option<Map<String, Value>>,
    ) -> PaymentRecord;

    /// Unknown ids are an expected condition, never an error.
    async fn get(&self, id: &str) -> Option<PaymentRecord>;

    /// Evicts every record older than `retention`, regardless of status.
    /// Returns the number of evicted entries.
    async fn sweep(&self, retention: Duration) -> usize;

    async fn len(&self) -> usize;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn normalize_id_trims_strings() {
        assert_eq!(normalize_id(&json!("  tx-9 ")), Some("tx-9".to_string()));
    }

    #[test]
    fn normalize_id_accepts_numbers() {
        assert_eq!(normalize_id(&json!(48211)), Some("48211".to_string()));
    }

    #[test]
    fn normalize_id_rejects_empty_and_null() {
        assert_eq!(normalize_id(&json!("   ")), None);
        assert_eq!(normalize_id(&Value::Null), None);
    }

    #[test]
    fn settled_vocabulary_is_exact() {
        for status in ["paid", "approved", "completed"] {
            let record = PaymentRecord {
                status: status.to_string(),
                timestamp: Utc::now(),
                utm_params: Map::new(),
            };
            assert!(record.is_paid(), "{status} should classify as paid");
        }

        let record = PaymentRecord {
            status: "PAID".to_string(),
            timestamp: Utc::now(),
            utm_params: Map::new(),
        };
        assert!(!record.is_paid(), "store comparison is verbatim");
    }
}
