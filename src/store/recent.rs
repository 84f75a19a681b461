use super::kv::KvStore;
use crate::Result;
use serde_json::Value;
use std::sync::Arc;

const LOG_TARGET: &str = "    recent";

/// Storage key of the list.
pub const RECENT_KEY: &str = "recent_users";

/// Default number of remembered usernames.
pub const DEFAULT_RECENT_CAPACITY: usize = 20;

/// Most-recently-used list of looked-up usernames, newest first and without duplicates.
#[derive(Debug)]
pub struct RecentSubjects<S> {
    store: Arc<S>,
    capacity: usize,
}

impl<S> Clone for RecentSubjects<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            capacity: self.capacity,
        }
    }
}

impl<S: KvStore> RecentSubjects<S> {
    #[must_use]
    pub fn new(store: Arc<S>, capacity: usize) -> Self {
        Self {
            store,
            capacity: capacity.max(1),
        }
    }

    /// Move `username` to the front of the list, dropping the oldest names beyond capacity.
    pub async fn push(&self, username: &str) -> Result<Vec<String>> {
        let mut list = self.list().await?;
        list.retain(|name| name != username);
        list.insert(0, username.to_string());
        list.truncate(self.capacity);

        self.store.set(RECENT_KEY, Value::from(list.clone())).await?;
        Ok(list)
    }

    /// The stored list. Anything that is not a list of strings reads as empty.
    pub async fn list(&self) -> Result<Vec<String>> {
        let Some(value) = self.store.get(RECENT_KEY).await? else {
            return Ok(Vec::new());
        };

        match serde_json::from_value(value) {
            Ok(list) => Ok(list),
            Err(e) => {
                log::debug!(target: LOG_TARGET, "Ignoring malformed recent list: {e}");
                Ok(Vec::new())
            }
        }
    }

    pub async fn clear(&self) -> Result<()> {
        self.store.set(RECENT_KEY, Value::Array(Vec::new())).await
    }
}
