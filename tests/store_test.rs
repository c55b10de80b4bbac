use std::time::Duration;

use serde_json::{Map, Value, json};

use funnel_core::store::{InMemoryStatusStore, StatusStore};

fn utm(source: &str) -> Map<String, Value> {
    let mut params = Map::new();
    params.insert("utm_source".to_string(), json!(source));
    params.insert("utm_campaign".to_string(), json!("launch"));
    params
}

#[tokio::test]
async fn unknown_id_reads_as_absent_not_error() {
    let store = InMemoryStatusStore::new();
    assert!(store.get("never-seen").await.is_none());
}

#[tokio::test]
async fn attribution_survives_every_later_write_that_omits_it() {
    let store = InMemoryStatusStore::new();

    store.record("tx-1", Some("pending".into()), Some(utm("meta"))).await;
    store.record("tx-1", Some("approved".into()), None).await;
    store.record("tx-1", None, Some(Map::new())).await;
    let record = store.record("tx-1", Some("paid".into()), None).await;

    assert_eq!(record.status, "paid");
    assert_eq!(record.utm_params, utm("meta"));
    assert!(record.is_paid());
}

#[tokio::test]
async fn last_supplied_attribution_wins() {
    let store = InMemoryStatusStore::new();

    store.record("tx-2", None, Some(utm("meta"))).await;
    store.record("tx-2", None, Some(utm("google"))).await;
    let record = store.record("tx-2", Some("paid".into()), None).await;

    assert_eq!(record.utm_params, utm("google"));
}

#[tokio::test]
async fn ttl_eviction_is_status_blind() {
    let store = InMemoryStatusStore::new();
    store.record("paid-tx", Some("paid".into()), None).await;
    store.record("pending-tx", None, None).await;

    // Inside the window: both present.
    assert_eq!(store.sweep(Duration::from_secs(60)).await, 0);
    assert!(store.get("paid-tx").await.is_some());
    assert!(store.get("pending-tx").await.is_some());

    // Window elapsed: both evicted, paid or not.
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(store.sweep(Duration::from_millis(10)).await, 2);
    assert!(store.get("paid-tx").await.is_none());
    assert!(store.get("pending-tx").await.is_none());
}

#[tokio::test]
async fn concurrent_writers_converge_on_one_record() {
    let store = std::sync::Arc::new(InMemoryStatusStore::new());

    let mut handles = Vec::new();
    for i in 0..16 {
        let store = store.clone();
        handles.push(tokio::spawn(async move {
            let status = if i % 2 == 0 { "pending" } else { "paid" };
            store.record("tx-race", Some(status.to_string()), None).await;
        }));
    }
    for handle in handles {
        handle.await.unwrap();
    }

    assert_eq!(store.len().await, 1);
    let record = store.get("tx-race").await.unwrap();
    assert!(record.status == "pending" || record.status == "paid");
}
