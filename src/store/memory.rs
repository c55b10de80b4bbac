use async_trait::async_trait;
use chrono::Utc;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

use super::{PaymentRecord, StatusStore};

/// In-memory TTL map. State is lost on restart by design; retention is a
/// bounded window, so a paid record is evicted just like a pending one.
#[derive(Clone, Default)]
pub struct InMemoryStatusStore {
    entries: Arc<RwLock<HashMap<String, PaymentRecord>>>,
}

impl InMemoryStatusStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl StatusStore for InMemoryStatusStore {
    async fn record(
        &self,
        id: &str,
        status: Option<String>,
        utm_params: Option<Map<String, Value>>,
    ) -> PaymentRecord {
        let key = id.trim().to_string();

        // Single write lock around the read-modify-write so concurrent
        // writers cannot interleave between lookup and insert.
        let mut entries = self.entries.write().await;
        let existing = entries.get(&key);

        let merged = PaymentRecord {
            status: status
                .filter(|s| !s.is_empty())
                .or_else(|| existing.map(|r| r.status.clone()))
                .unwrap_or_else(|| "pending".to_string()),
            timestamp: Utc::now(),
            utm_params: utm_params
                .filter(|params| !params.is_empty())
                .or_else(|| existing.map(|r| r.utm_params.clone()))
                .unwrap_or_default(),
        };

        entries.insert(key, merged.clone());
        merged
    }

    async fn get(&self, id: &str) -> Option<PaymentRecord> {
        let entries = self.entries.read().await;
        entries.get(id.trim()).cloned()
    }

    async fn sweep(&self, retention: Duration) -> usize {
        let cutoff = Utc::now()
            - chrono::Duration::from_std(retention).unwrap_or_else(|_| chrono::Duration::hours(1));

        let mut entries = self.entries.write().await;
        let before = entries.len();
        entries.retain(|_, record| record.timestamp > cutoff);
        before - entries.len()
    }

    async fn len(&self) -> usize {
        self.entries.read().await.len()
    }
}

/// Periodic eviction task. Spawned once at startup and left running for the
/// life of the process.
pub fn spawn_sweeper(
    store: Arc<dyn StatusStore>,
    interval: Duration,
    retention: Duration,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        // First tick fires immediately; skip it so a fresh boot does not
        // race record seeding.
        ticker.tick().await;

        loop {
            ticker.tick().await;
            let evicted = store.sweep(retention).await;
            if evicted > 0 {
                tracing::debug!(evicted, "evicted expired payment records");
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn utm(source: &str) -> Map<String, Value> {
        let mut params = Map::new();
        params.insert("utm_source".to_string(), json!(source));
        params
    }

    #[tokio::test]
    async fn record_defaults_to_pending() {
        let store = InMemoryStatusStore::new();
        let record = store.record("tx-1", None, None).await;

        assert_eq!(record.status, "pending");
        assert!(record.utm_params.is_empty());
    }

    #[tokio::test]
    async fn later_write_without_attribution_keeps_existing() {
        let store = InMemoryStatusStore::new();
        store.record("tx-1", Some("pending".into()), Some(utm("facebook"))).await;
        let record = store.record("tx-1", Some("paid".into()), None).await;

        assert_eq!(record.status, "paid");
        assert_eq!(record.utm_params, utm("facebook"));
    }

    #[tokio::test]
    async fn empty_attribution_map_does_not_clear() {
        let store = InMemoryStatusStore::new();
        store.record("tx-1", None, Some(utm("google"))).await;
        let record = store.record("tx-1", None, Some(Map::new())).await;

        assert_eq!(record.utm_params, utm("google"));
    }

    #[tokio::test]
    async fn non_empty_attribution_replaces() {
        let store = InMemoryStatusStore::new();
        store.record("tx-1", None, Some(utm("google"))).await;
        let record = store.record("tx-1", None, Some(utm("tiktok"))).await;

        assert_eq!(record.utm_params, utm("tiktok"));
    }

    #[tokio::test]
    async fn omitted_status_keeps_existing() {
        let store = InMemoryStatusStore::new();
        store.record("tx-1", Some("approved".into()), None).await;
        let record = store.record("tx-1", None, Some(utm("bing"))).await;

        assert_eq!(record.status, "approved");
    }

    #[tokio::test]
    async fn keys_are_trimmed_on_both_paths() {
        let store = InMemoryStatusStore::new();
        store.record(" tx-1 ", Some("paid".into()), None).await;

        assert!(store.get("tx-1").await.is_some());
        assert!(store.get("  tx-1").await.is_some());
    }

    #[tokio::test]
    async fn sweep_evicts_only_expired_entries() {
        let store = InMemoryStatusStore::new();
        store.record("fresh", Some("paid".into()), None).await;

        // Backdate one entry past the retention window.
        {
            let mut entries = store.entries.write().await;
            let record = entries.get_mut("fresh").unwrap().clone();
            entries.insert(
                "stale".to_string(),
                PaymentRecord {
                    timestamp: record.timestamp - chrono::Duration::seconds(10),
                    ..record
                },
            );
        }

        let evicted = store.sweep(Duration::from_secs(5)).await;

        assert_eq!(evicted, 1);
        assert!(store.get("fresh").await.is_some());
        assert!(store.get("stale").await.is_none());
    }
}
