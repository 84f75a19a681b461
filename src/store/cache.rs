//! A bounded, time-expiring cache of analytics payloads.
//!
//! Entries carry the instant they were written. Reads treat entries older than the TTL as misses
//! but leave them in place; they are replaced by the next write or removed by eviction. After
//! every write the namespace is trimmed back to its capacity, oldest entries first.

use super::kv::KvStore;
use crate::Result;
use crate::clock::Clock;
use crate::metrics::DayCount;
use core::time::Duration;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;

const LOG_TARGET: &str = "     cache";

/// Key prefix shared by all analytics entries.
pub const NAMESPACE: &str = "analytics";

/// Default time-to-live of an entry.
pub const DEFAULT_TTL: Duration = Duration::from_secs(15 * 60);

/// Default number of entries kept in the namespace.
pub const DEFAULT_CAPACITY: usize = 50;

/// Stored form of a cache entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheEntry<T> {
    pub key: String,
    pub inserted_at_epoch_ms: i64,
    pub payload: T,
}

#[derive(Debug)]
pub struct CacheStore<S> {
    store: Arc<S>,
    clock: Arc<dyn Clock>,
    ttl: Duration,
    capacity: usize,
}

impl<S> Clone for CacheStore<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            clock: Arc::clone(&self.clock),
            ttl: self.ttl,
            capacity: self.capacity,
        }
    }
}

impl<S: KvStore> CacheStore<S> {
    /// `capacity` is clamped to at least one entry.
    #[must_use]
    pub fn new(store: Arc<S>, clock: Arc<dyn Clock>, ttl: Duration, capacity: usize) -> Self {
        Self {
            store,
            clock,
            ttl,
            capacity: capacity.max(1),
        }
    }

    /// Cache key of the analytics for `username` over `days`.
    #[must_use]
    pub fn key(username: &str, days: DayCount) -> String {
        format!("{NAMESPACE}:{username}:{days}")
    }

    /// The payload stored under `key`, if present, decodable and not older than the TTL.
    ///
    /// Storage failures are logged and reported as a miss.
    pub async fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let value = match self.store.get(key).await {
            Ok(Some(value)) => value,
            Ok(None) => {
                log::debug!(target: LOG_TARGET, "Cache miss for {key}");
                return None;
            }
            Err(e) => {
                log::warn!(target: LOG_TARGET, "Could not read cache entry {key}, treating as a miss: {e:#}");
                return None;
            }
        };

        let entry: CacheEntry<T> = match serde_json::from_value(value) {
            Ok(entry) => entry,
            Err(e) => {
                log::debug!(target: LOG_TARGET, "Cache miss for {key}, entry is unreadable: {e}");
                return None;
            }
        };

        let age_ms = self.now_ms() - entry.inserted_at_epoch_ms;
        if age_ms < 0 {
            log::debug!(target: LOG_TARGET, "Cache timestamp is in the future for {key} (clock skew detected), treating as fresh");
        } else if u128::from(age_ms.unsigned_abs()) > self.ttl.as_millis() {
            log::debug!(
                target: LOG_TARGET,
                "Cache expired for {key} (age: {:.1} min, TTL: {:.1} min)",
                minutes(age_ms),
                self.ttl.as_secs_f64() / 60.0
            );
            return None;
        } else {
            log::debug!(target: LOG_TARGET, "Cache hit for {key} (age: {:.1} min)", minutes(age_ms));
        }

        Some(entry.payload)
    }

    /// Store `payload` under `key`, then evict the oldest entries beyond capacity.
    pub async fn set<T: Serialize>(&self, key: &str, payload: &T) -> Result<()> {
        let value = serde_json::to_value(CacheEntry {
            key: key.to_string(),
            inserted_at_epoch_ms: self.now_ms(),
            payload,
        })?;

        self.store.set(key, value).await?;
        let _ = self.evict().await?;
        Ok(())
    }

    /// Remove the oldest entries until at most `capacity` remain. Returns how many were removed.
    ///
    /// Entries whose timestamp cannot be read sort as the oldest. Equal timestamps are ordered
    /// by key.
    pub async fn evict(&self) -> Result<usize> {
        let keys = self.store.keys(&prefix()).await?;
        if keys.len() <= self.capacity {
            return Ok(0);
        }

        let mut stamped = Vec::with_capacity(keys.len());
        for key in keys {
            let stamp = self.store.get(&key).await?.as_ref().and_then(inserted_at).unwrap_or(0);
            stamped.push((stamp, key));
        }
        stamped.sort();

        let excess = stamped.len() - self.capacity;
        for (_, key) in stamped.iter().take(excess) {
            let _ = self.store.remove(key).await?;
        }

        log::debug!(target: LOG_TARGET, "Evicted {excess} cache entr(y/ies) to stay within {} entries", self.capacity);
        Ok(excess)
    }

    /// Remove every analytics entry regardless of age. Returns how many were removed.
    pub async fn clear(&self) -> Result<usize> {
        let mut cleared = 0;
        for key in self.store.keys(&prefix()).await? {
            if self.store.remove(&key).await? {
                cleared += 1;
            }
        }

        log::info!(target: LOG_TARGET, "Cleared {cleared} cache entr(y/ies)");
        Ok(cleared)
    }

    /// Number of analytics entries currently stored, fresh or not.
    pub async fn len(&self) -> Result<usize> {
        Ok(self.store.keys(&prefix()).await?.len())
    }

    fn now_ms(&self) -> i64 {
        self.clock.now().timestamp_millis()
    }
}

fn prefix() -> String {
    format!("{NAMESPACE}:")
}

#[expect(clippy::cast_precision_loss, reason = "only used for log output")]
fn minutes(ms: i64) -> f64 {
    ms as f64 / 60_000.0
}

fn inserted_at(value: &Value) -> Option<i64> {
    value.get("insertedAtEpochMs").and_then(Value::as_i64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::store::MemoryStore;
    use chrono::{TimeZone, Utc};
    use serde_json::json;

    fn setup(capacity: usize) -> (Arc<MemoryStore>, Arc<ManualClock>, CacheStore<MemoryStore>) {
        let store = Arc::new(MemoryStore::new());
        let clock = Arc::new(ManualClock::new(Utc.with_ymd_and_hms(2024, 3, 10, 12, 0, 0).unwrap()));
        let cache = CacheStore::new(Arc::clone(&store), Arc::clone(&clock) as Arc<dyn Clock>, DEFAULT_TTL, capacity);
        (store, clock, cache)
    }

    #[test]
    fn key_format() {
        assert_eq!(CacheStore::<MemoryStore>::key("alice", DayCount::Fourteen), "analytics:alice:14");
    }

    #[tokio::test]
    async fn round_trip_within_ttl() {
        let (_, clock, cache) = setup(DEFAULT_CAPACITY);
        let payload = json!({"metrics": {"bestStreak": 3}, "languages": ["Rust"]});

        cache.set("analytics:alice:14", &payload).await.unwrap();
        clock.advance(chrono::Duration::minutes(10));

        assert_eq!(cache.get::<Value>("analytics:alice:14").await, Some(payload));
    }

    #[tokio::test]
    async fn expires_strictly_after_ttl() {
        let (store, clock, cache) = setup(DEFAULT_CAPACITY);
        cache.set("analytics:alice:14", &json!(1)).await.unwrap();

        clock.advance(chrono::Duration::minutes(15));
        assert_eq!(cache.get::<Value>("analytics:alice:14").await, Some(json!(1)));

        clock.advance(chrono::Duration::milliseconds(1));
        assert_eq!(cache.get::<Value>("analytics:alice:14").await, None);

        // stale entries stay until replaced or evicted
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn future_timestamps_are_fresh() {
        let (_, clock, cache) = setup(DEFAULT_CAPACITY);
        cache.set("analytics:alice:7", &json!("x")).await.unwrap();
        clock.advance(chrono::Duration::hours(-1));

        assert_eq!(cache.get::<Value>("analytics:alice:7").await, Some(json!("x")));
    }

    #[tokio::test]
    async fn undecodable_entry_is_a_miss() {
        let (store, _, cache) = setup(DEFAULT_CAPACITY);
        store.set("analytics:alice:7", json!("garbage")).await.unwrap();

        assert_eq!(cache.get::<Value>("analytics:alice:7").await, None);
    }

    #[tokio::test]
    async fn evicts_oldest_beyond_capacity() {
        let (_, clock, cache) = setup(50);

        for i in 0..55 {
            cache.set(&format!("analytics:user{i}:14"), &json!(i)).await.unwrap();
            clock.advance(chrono::Duration::milliseconds(1));
        }

        assert_eq!(cache.len().await.unwrap(), 50);
        for i in 0..5 {
            assert_eq!(cache.get::<Value>(&format!("analytics:user{i}:14")).await, None, "user{i}");
        }
        for i in 5..55 {
            assert_eq!(cache.get::<Value>(&format!("analytics:user{i}:14")).await, Some(json!(i)));
        }
    }

    #[tokio::test]
    async fn unreadable_stamps_are_evicted_first() {
        let (store, _, cache) = setup(2);
        store.set("analytics:broken:7", json!({"payload": 1})).await.unwrap();
        cache.set("analytics:a:7", &json!(1)).await.unwrap();
        cache.set("analytics:b:7", &json!(2)).await.unwrap();

        assert!(store.get("analytics:broken:7").await.unwrap().is_none());
        assert_eq!(cache.len().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn eviction_ignores_other_namespaces() {
        let (store, _, cache) = setup(1);
        store.set("recent_users", json!(["alice"])).await.unwrap();
        store.set("gh_token", json!("t")).await.unwrap();
        cache.set("analytics:a:7", &json!(1)).await.unwrap();
        cache.set("analytics:b:7", &json!(2)).await.unwrap();

        assert_eq!(cache.len().await.unwrap(), 1);
        assert!(store.get("recent_users").await.unwrap().is_some());
        assert!(store.get("gh_token").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn clear_removes_only_analytics() {
        let (store, _, cache) = setup(DEFAULT_CAPACITY);
        store.set("recent_users", json!([])).await.unwrap();
        cache.set("analytics:a:7", &json!(1)).await.unwrap();
        cache.set("analytics:b:30", &json!(2)).await.unwrap();

        assert_eq!(cache.clear().await.unwrap(), 2);
        assert_eq!(cache.len().await.unwrap(), 0);
        assert_eq!(store.len(), 1);
        assert_eq!(cache.clear().await.unwrap(), 0);
    }
}
