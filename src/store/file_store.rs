//! A directory-backed key/value store.
//!
//! Each key lives in its own JSON file holding both the key and the value, so the original key
//! survives the file name sanitization. Every write goes to its own
//! temporary file that is then renamed over the target, so a reader never observes a half-written
//! value and concurrent writers of one key do not disturb each other. The last rename wins.

use super::kv::KvStore;
use crate::Result;
use camino::{Utf8Path, Utf8PathBuf};
use core::sync::atomic::{AtomicU64, Ordering};
use ohno::IntoAppError;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::io::ErrorKind;

const LOG_TARGET: &str = "     store";

/// Distinguishes the temporary files of concurrent writers.
static WRITE_SEQ: AtomicU64 = AtomicU64::new(0);

#[derive(Debug, Serialize, Deserialize)]
struct StoredValue {
    key: String,
    value: Value,
}

#[derive(Debug, Clone)]
pub struct FileStore {
    dir: Utf8PathBuf,
}

impl FileStore {
    /// A store rooted at `dir`. The directory is created on first write.
    #[must_use]
    pub fn new(dir: impl Into<Utf8PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    #[must_use]
    pub fn dir(&self) -> &Utf8Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> Utf8PathBuf {
        self.dir.join(format!("{}.json", sanitize_key(key)))
    }

    async fn read(path: &Utf8Path) -> Result<Option<StoredValue>> {
        let text = match tokio::fs::read_to_string(path).await {
            Ok(text) => text,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e).into_app_err_with(|| format!("reading '{path}'")),
        };

        match serde_json::from_str(&text) {
            Ok(stored) => Ok(Some(stored)),
            Err(e) => {
                log::debug!(target: LOG_TARGET, "Ignoring unreadable store file '{path}': {e}");
                Ok(None)
            }
        }
    }
}

impl KvStore for FileStore {
    async fn get(&self, key: &str) -> Result<Option<Value>> {
        let stored = Self::read(&self.path_for(key)).await?;
        Ok(stored.filter(|s| s.key == key).map(|s| s.value))
    }

    async fn set(&self, key: &str, value: Value) -> Result<()> {
        tokio::fs::create_dir_all(&self.dir)
            .await
            .into_app_err_with(|| format!("creating directory '{}'", self.dir))?;

        let path = self.path_for(key);
        let seq = WRITE_SEQ.fetch_add(1, Ordering::Relaxed);
        let tmp = path.with_extension(format!("json.{}-{seq}.tmp", std::process::id()));
        let text = serde_json::to_string(&StoredValue { key: key.to_string(), value })?;

        tokio::fs::write(&tmp, text)
            .await
            .into_app_err_with(|| format!("writing '{tmp}'"))?;
        tokio::fs::rename(&tmp, &path)
            .await
            .into_app_err_with(|| format!("moving '{tmp}' to '{path}'"))?;
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<bool> {
        let path = self.path_for(key);
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e).into_app_err_with(|| format!("removing '{path}'")),
        }
    }

    async fn keys(&self, prefix: &str) -> Result<Vec<String>> {
        let mut entries = match tokio::fs::read_dir(&self.dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e).into_app_err_with(|| format!("listing '{}'", self.dir)),
        };

        let mut keys = Vec::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .into_app_err_with(|| format!("listing '{}'", self.dir))?
        {
            let Ok(path) = Utf8PathBuf::from_path_buf(entry.path()) else {
                continue;
            };
            if path.extension() != Some("json") {
                continue;
            }
            if let Some(stored) = Self::read(&path).await?
                && stored.key.starts_with(prefix)
            {
                keys.push(stored.key);
            }
        }

        Ok(keys)
    }
}

/// Map a key onto a safe file name component.
fn sanitize_key(key: &str) -> String {
    key.replace("..", "__").replace(['/', '\\', ':', '*', '?', '"', '<', '>', '|'], "_")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn store(tmp: &tempfile::TempDir) -> FileStore {
        FileStore::new(Utf8PathBuf::from_path_buf(tmp.path().join("kv")).unwrap())
    }

    #[test]
    fn sanitizes_keys() {
        assert_eq!(sanitize_key("analytics:alice:14"), "analytics_alice_14");
        assert_eq!(sanitize_key("../../etc/passwd"), "______etc_passwd");
        assert_eq!(sanitize_key("recent_users"), "recent_users");
    }

    #[tokio::test]
    #[cfg_attr(miri, ignore = "Miri cannot call GetTempPathW")]
    async fn set_get_remove() {
        let tmp = tempfile::tempdir().unwrap();
        let store = store(&tmp);

        assert!(store.get("analytics:alice:7").await.unwrap().is_none());
        store.set("analytics:alice:7", json!({"n": 1})).await.unwrap();
        assert_eq!(store.get("analytics:alice:7").await.unwrap(), Some(json!({"n": 1})));

        assert!(store.remove("analytics:alice:7").await.unwrap());
        assert!(!store.remove("analytics:alice:7").await.unwrap());
        assert!(store.get("analytics:alice:7").await.unwrap().is_none());
    }

    #[tokio::test]
    #[cfg_attr(miri, ignore = "Miri cannot call GetTempPathW")]
    async fn keys_recovers_original_names() {
        let tmp = tempfile::tempdir().unwrap();
        let store = store(&tmp);

        store.set("analytics:alice:7", json!(1)).await.unwrap();
        store.set("analytics:bob:30", json!(2)).await.unwrap();
        store.set("recent_users", json!([])).await.unwrap();

        let mut keys = store.keys("analytics:").await.unwrap();
        keys.sort();
        assert_eq!(keys, vec!["analytics:alice:7", "analytics:bob:30"]);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    #[cfg_attr(miri, ignore = "Miri cannot call GetTempPathW")]
    async fn concurrent_writes_to_one_key_all_succeed() {
        let tmp = tempfile::tempdir().unwrap();
        let store = std::sync::Arc::new(store(&tmp));

        for round in 0..20 {
            let mut writers = tokio::task::JoinSet::new();
            for writer in 0..8 {
                let store = std::sync::Arc::clone(&store);
                let _ = writers.spawn(async move {
                    store.set("recent_users", json!([round, writer])).await
                });
            }
            while let Some(outcome) = writers.join_next().await {
                outcome.unwrap().unwrap();
            }

            let value = store.get("recent_users").await.unwrap().unwrap();
            assert_eq!(value[0], json!(round));
        }

        assert_eq!(store.keys("").await.unwrap(), vec!["recent_users"]);
        let leftovers = std::fs::read_dir(store.dir()).unwrap().count();
        assert_eq!(leftovers, 1, "temporary files must not outlive their write");
    }

    #[tokio::test]
    #[cfg_attr(miri, ignore = "Miri cannot call GetTempPathW")]
    async fn missing_directory_is_empty() {
        let tmp = tempfile::tempdir().unwrap();
        let store = store(&tmp);
        assert!(store.keys("").await.unwrap().is_empty());
    }

    #[tokio::test]
    #[cfg_attr(miri, ignore = "Miri cannot call GetTempPathW")]
    async fn corrupt_file_reads_as_absent() {
        let tmp = tempfile::tempdir().unwrap();
        let store = store(&tmp);
        store.set("k", json!(1)).await.unwrap();
        std::fs::write(store.dir().join("k.json"), "not json").unwrap();

        assert!(store.get("k").await.unwrap().is_none());
        assert!(store.keys("").await.unwrap().is_empty());
    }
}
