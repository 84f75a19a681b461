use super::kv::KvStore;
use crate::Result;
use serde_json::Value;
use std::sync::Arc;

/// Storage key of the access token.
pub const TOKEN_KEY: &str = "gh_token";

/// Persisted GitHub access token.
#[derive(Debug)]
pub struct CredentialStore<S> {
    store: Arc<S>,
}

impl<S> Clone for CredentialStore<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
        }
    }
}

impl<S: KvStore> CredentialStore<S> {
    #[must_use]
    pub const fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Sanitize and persist `token`. Returns the value actually stored.
    ///
    /// Storing an empty token effectively clears the credential.
    pub async fn set(&self, token: &str) -> Result<String> {
        let token = sanitize_token(token);
        self.store.set(TOKEN_KEY, Value::String(token.clone())).await?;
        Ok(token)
    }

    /// The stored token, or `None` when nothing (or an empty string) is stored.
    pub async fn get(&self) -> Result<Option<String>> {
        let value = self.store.get(TOKEN_KEY).await?;
        Ok(value
            .as_ref()
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(str::to_string))
    }
}

/// Trim surrounding whitespace and strip characters that commonly sneak in when pasting.
#[must_use]
pub fn sanitize_token(token: &str) -> String {
    token.trim().chars().filter(|c| !matches!(c, '<' | '>' | '"' | '\'')).collect()
}
