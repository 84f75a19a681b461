use super::error::AnalyticsError;
use super::messages::{AnalyticsPayload, Request, Response, Source};
use super::pipeline::Pipeline;
use super::validation::{validate_days, validate_username};
use crate::clock::Clock;
use crate::config::Config;
use crate::store::{CacheStore, CredentialStore, KvStore, RecentSubjects};
use ohno::EnrichableExt;
use serde_json::Value;
use std::sync::Arc;

const LOG_TARGET: &str = "    router";

/// Error text for input that does not decode into a known message.
pub const UNKNOWN_MESSAGE: &str = "Unknown message type";

/// Single entry point for every message.
///
/// Each call to [`RequestRouter::handle`] resolves to exactly one [`Response`]; errors never
/// escape as anything else. The router holds no per-request state, so concurrent calls are
/// independent of each other, sharing only the stores.
#[derive(Debug)]
pub struct RequestRouter<S> {
    pipeline: Pipeline,
    cache: CacheStore<S>,
    recent: RecentSubjects<S>,
    credentials: CredentialStore<S>,
    token_override: Option<String>,
}

impl<S: KvStore> RequestRouter<S> {
    /// Create a router. Cached analytics live in `cache_store`; the credential and the recent
    /// list live in `settings_store`. The two may be the same store.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be created.
    pub fn new(config: &Config, cache_store: Arc<S>, settings_store: Arc<S>, clock: Arc<dyn Clock>) -> crate::Result<Self> {
        Ok(Self {
            pipeline: Pipeline::new(config, Arc::clone(&clock))?,
            cache: CacheStore::new(cache_store, clock, config.cache_ttl, config.cache_capacity),
            recent: RecentSubjects::new(Arc::clone(&settings_store), config.recent_capacity),
            credentials: CredentialStore::new(settings_store),
            token_override: None,
        })
    }

    /// Use `token` instead of the stored credential. Empty tokens are ignored.
    #[must_use]
    pub fn with_token_override(mut self, token: Option<String>) -> Self {
        self.token_override = token.map(|t| t.trim().to_string()).filter(|t| !t.is_empty());
        self
    }

    pub async fn handle(&self, request: Request) -> Response {
        match request {
            Request::FetchAnalytics { username, days } => match self.fetch_analytics(&username, days.as_ref()).await {
                Ok((source, payload)) => Response::analytics(source, payload),
                Err(e) => {
                    match &e {
                        AnalyticsError::Validation(_) => log::debug!(target: LOG_TARGET, "Rejected analytics request: {e}"),
                        _ => log::warn!(target: LOG_TARGET, "Analytics request for '{username}' failed: {e}"),
                    }
                    Response::failure(e.to_string())
                }
            },

            Request::SetCredential { token } => match self.credentials.set(&token).await {
                Ok(stored) => {
                    log::info!(target: LOG_TARGET, "Stored access token ({} characters)", stored.len());
                    Response::ok()
                }
                Err(e) => storage_failure(e, "store the access token"),
            },

            Request::ClearCache => match self.cache.clear().await {
                Ok(count) => Response::cleared(count),
                Err(e) => storage_failure(e, "clear the cache"),
            },

            Request::ListRecent => match self.recent.list().await {
                Ok(list) => Response::recent(list),
                Err(e) => storage_failure(e, "read the recent list"),
            },

            Request::ClearRecent => match self.recent.clear().await {
                Ok(()) => Response::ok(),
                Err(e) => storage_failure(e, "clear the recent list"),
            },
        }
    }

    /// Decode `value` as a [`Request`] and handle it.
    pub async fn handle_value(&self, value: Value) -> Response {
        match serde_json::from_value::<Request>(value) {
            Ok(request) => self.handle(request).await,
            Err(e) => {
                log::debug!(target: LOG_TARGET, "Undecodable message: {e}");
                Response::failure(UNKNOWN_MESSAGE)
            }
        }
    }

    /// Handle one JSON-encoded message and return the JSON-encoded response.
    pub async fn handle_json(&self, text: &str) -> String {
        let response = match serde_json::from_str::<Value>(text) {
            Ok(value) => self.handle_value(value).await,
            Err(e) => {
                log::debug!(target: LOG_TARGET, "Malformed message: {e}");
                Response::failure(UNKNOWN_MESSAGE)
            }
        };

        encode_response(&response)
    }

    async fn fetch_analytics(&self, raw_username: &str, raw_days: Option<&Value>) -> Result<(Source, AnalyticsPayload), AnalyticsError> {
        let username = validate_username(raw_username)?;
        let days = validate_days(raw_days)?;
        let key = CacheStore::<S>::key(&username, days);

        if let Some(payload) = self.cache.get::<AnalyticsPayload>(&key).await {
            log::info!(target: LOG_TARGET, "Serving cached analytics for '{username}' ({days} days)");
            self.remember(&username).await;
            return Ok((Source::Cache, payload));
        }

        let token = self.token().await;
        log::info!(
            target: LOG_TARGET,
            "Computing analytics for '{username}' ({days} days, {})",
            if token.is_some() { "authenticated" } else { "unauthenticated" }
        );

        let payload = self.pipeline.run(&username, days, token.as_deref()).await?;

        if payload.partial {
            log::warn!(target: LOG_TARGET, "Not caching partial analytics for '{username}'");
        } else if let Err(e) = self.cache.set(&key, &payload).await {
            log::warn!(target: LOG_TARGET, "Could not cache analytics for '{username}': {e:#}");
        }

        self.remember(&username).await;
        Ok((Source::Fresh, payload))
    }

    async fn token(&self) -> Option<String> {
        if let Some(token) = &self.token_override {
            return Some(token.clone());
        }

        match self.credentials.get().await {
            Ok(token) => token,
            Err(e) => {
                log::warn!(target: LOG_TARGET, "Could not read the stored access token, continuing unauthenticated: {e:#}");
                None
            }
        }
    }

    async fn remember(&self, username: &str) {
        if let Err(e) = self.recent.push(username).await {
            log::warn!(target: LOG_TARGET, "Could not update the recent list: {e:#}");
        }
    }
}

fn storage_failure(error: ohno::AppError, what: &str) -> Response {
    let error = AnalyticsError::Storage(error.enrich_with(|| format!("could not {what}")));
    log::warn!(target: LOG_TARGET, "{error}");
    Response::failure(error.to_string())
}

/// Serialize a response, falling back to a bare failure if that is impossible.
#[must_use]
pub fn encode_response(response: &Response) -> String {
    serde_json::to_string(response).unwrap_or_else(|e| format!(r#"{{"ok":false,"error":"could not encode response: {e}"}}"#))
}
