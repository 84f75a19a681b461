//! Persistent state: the key/value capability and the stores layered on top of it.
//!
//! [`KvStore`] is the only storage abstraction; it is injected everywhere state is kept.
//! [`MemoryStore`] backs tests, [`FileStore`] backs the command-line tool.
//!
//! On top of it sit the analytics [`CacheStore`], the [`RecentSubjects`] list and the
//! [`CredentialStore`].

mod cache;
mod credential;
mod file_store;
mod kv;
mod recent;

pub use cache::{CacheEntry, CacheStore, DEFAULT_CAPACITY, DEFAULT_TTL, NAMESPACE};
pub use credential::{CredentialStore, TOKEN_KEY, sanitize_token};
pub use file_store::FileStore;
pub use kv::{KvStore, MemoryStore};
pub use recent::{DEFAULT_RECENT_CAPACITY, RECENT_KEY, RecentSubjects};
