use crate::Result;
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::{Mutex, PoisonError};

/// A persistent key/value capability holding JSON values.
///
/// Implementations must be safe to share between concurrently running requests. No ordering is
/// promised between writes issued by different requests; the last write to a key wins.
pub trait KvStore: Send + Sync + core::fmt::Debug {
    /// Value stored under `key`, or `None` if the key is absent.
    fn get(&self, key: &str) -> impl Future<Output = Result<Option<Value>>> + Send;

    fn set(&self, key: &str, value: Value) -> impl Future<Output = Result<()>> + Send;

    /// Remove `key`. Returns whether it existed.
    fn remove(&self, key: &str) -> impl Future<Output = Result<bool>> + Send;

    /// All keys starting with `prefix`, in no particular order.
    fn keys(&self, prefix: &str) -> impl Future<Output = Result<Vec<String>>> + Send;
}

/// An in-process store, used by tests and for ephemeral sessions.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<BTreeMap<String, Value>>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored keys.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, BTreeMap<String, Value>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl KvStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<Value>> {
        Ok(self.lock().get(key).cloned())
    }

    async fn set(&self, key: &str, value: Value) -> Result<()> {
        let _ = self.lock().insert(key.to_string(), value);
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<bool> {
        Ok(self.lock().remove(key).is_some())
    }

    async fn keys(&self, prefix: &str) -> Result<Vec<String>> {
        Ok(self.lock().keys().filter(|k| k.starts_with(prefix)).cloned().collect())
    }
}
