//! GitHub API client
//!
//! Issues single HTTP calls against the GitHub REST and GraphQL endpoints and classifies the
//! outcome into success, transient failure or fatal failure. Retrying is the caller's business;
//! see [`RetryPolicy`](super::RetryPolicy).

use core::fmt;
use core::time::Duration;
use ohno::app_err;
use reqwest::StatusCode;
use reqwest::header::{ACCEPT, HeaderMap, HeaderValue};
use serde::{Deserialize, Serialize};
use serde_json::Value;

const LOG_TARGET: &str = "    client";

/// Rate limit telemetry taken from response headers. Either half may be unknown.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RateTelemetry {
    pub remaining: Option<u64>,
    /// Epoch seconds at which the quota resets.
    pub reset: Option<i64>,
}

impl RateTelemetry {
    /// Extract rate limit information from API response headers.
    #[must_use]
    pub fn from_headers(headers: &HeaderMap) -> Self {
        let parse = |name: &str| headers.get(name).and_then(|h| h.to_str().ok()).map(str::trim);

        Self {
            remaining: parse("x-ratelimit-remaining").and_then(|s| s.parse().ok()),
            reset: parse("x-ratelimit-reset").and_then(|s| s.parse().ok()),
        }
    }

    /// Whether the headers say the quota is used up.
    #[must_use]
    pub const fn is_exhausted(&self) -> bool {
        matches!(self.remaining, Some(0))
    }
}

/// Why a single fetch failed.
#[derive(Debug)]
pub enum FetchError {
    /// Network failure, server error or rate limiting. Worth retrying.
    Transient(ohno::AppError, RateTelemetry),

    /// Authorization failure, missing resource or malformed response. Never retried.
    Fatal(ohno::AppError, RateTelemetry),
}

impl FetchError {
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        matches!(self, Self::Transient(..))
    }

    /// Rate limit telemetry observed alongside the failure, if any.
    #[must_use]
    pub const fn rate(&self) -> RateTelemetry {
        match self {
            Self::Transient(_, rate) | Self::Fatal(_, rate) => *rate,
        }
    }

    #[must_use]
    pub fn into_error(self) -> ohno::AppError {
        match self {
            Self::Transient(e, _) | Self::Fatal(e, _) => e,
        }
    }

    /// A fatal failure with no telemetry, for exercising error paths in tests.
    #[cfg(test)]
    pub(crate) fn fatal(error: ohno::AppError) -> Self {
        Self::Fatal(error, RateTelemetry::default())
    }
}

impl fmt::Display for FetchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Transient(e, _) => write!(f, "transient fetch failure: {e}"),
            Self::Fatal(e, _) => write!(f, "fetch failed: {e}"),
        }
    }
}

/// A decoded response body together with its rate limit telemetry.
pub type Fetched = (Value, RateTelemetry);

/// GitHub API client.
#[derive(Debug, Clone)]
#[expect(clippy::struct_field_names, reason = "client field stores the underlying HTTP client")]
pub struct Client {
    client: reqwest::Client,
    base_url: String,
    graphql_url: String,
}

impl Client {
    /// Create a client for the given REST base URL and GraphQL endpoint.
    pub fn new(base_url: impl Into<String>, graphql_url: impl Into<String>, user_agent: &str, timeout: Duration) -> crate::Result<Self> {
        let mut headers = HeaderMap::new();
        let _ = headers.insert(ACCEPT, HeaderValue::from_static("application/vnd.github+json"));

        let client = reqwest::Client::builder()
            .user_agent(user_agent)
            .default_headers(headers)
            .timeout(timeout)
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            graphql_url: graphql_url.into(),
        })
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    #[must_use]
    pub fn graphql_url(&self) -> &str {
        &self.graphql_url
    }

    /// URL of one page of a user's public events.
    #[must_use]
    pub fn events_url(&self, username: &str, page: u32, page_size: u32) -> String {
        format!("{}/users/{username}/events/public?per_page={page_size}&page={page}", self.base_url)
    }

    /// URL listing a user's most recently updated repositories.
    #[must_use]
    pub fn repos_url(&self, username: &str, count: u32) -> String {
        format!("{}/users/{username}/repos?sort=updated&per_page={count}", self.base_url)
    }

    /// Perform one GET and decode the JSON body.
    pub async fn get_json(&self, url: &str, token: Option<&str>) -> Result<Fetched, FetchError> {
        log::debug!(target: LOG_TARGET, "GET {url}");
        let request = with_credential(self.client.get(url), token);
        Self::send(request, url).await
    }

    /// Perform one POST with a JSON body and decode the JSON response.
    pub async fn post_json(&self, url: &str, body: &Value, token: Option<&str>) -> Result<Fetched, FetchError> {
        log::debug!(target: LOG_TARGET, "POST {url}");
        let request = with_credential(self.client.post(url).json(body), token);
        Self::send(request, url).await
    }

    async fn send(request: reqwest::RequestBuilder, url: &str) -> Result<Fetched, FetchError> {
        let resp = match request.send().await {
            Ok(r) => r,
            Err(e) => return Err(FetchError::Transient(e.into(), RateTelemetry::default())),
        };

        let rate = RateTelemetry::from_headers(resp.headers());
        let status = resp.status();

        if status.is_success() {
            return match resp.json::<Value>().await {
                Ok(body) => Ok((body, rate)),
                Err(e) => Err(FetchError::Fatal(
                    app_err!("malformed response body from '{url}': {e}"),
                    rate,
                )),
            };
        }

        let error = app_err!(
            "GitHub API error {status} for '{url}' (remaining={}, reset={})",
            rate.remaining.map_or_else(|| "?".to_string(), |r| r.to_string()),
            rate.reset.map_or_else(|| "?".to_string(), |r| r.to_string()),
        );

        if is_transient_status(status, &rate) {
            Err(FetchError::Transient(error, rate))
        } else {
            Err(FetchError::Fatal(error, rate))
        }
    }
}

fn with_credential(request: reqwest::RequestBuilder, token: Option<&str>) -> reqwest::RequestBuilder {
    match token {
        Some(t) if !t.is_empty() => request.bearer_auth(t),
        _ => request,
    }
}

/// 5xx and 429 are transient, as is a 403 that coincides with an exhausted quota.
fn is_transient_status(status: StatusCode, rate: &RateTelemetry) -> bool {
    status.is_server_error() || status == StatusCode::TOO_MANY_REQUESTS || (status == StatusCode::FORBIDDEN && rate.is_exhausted())
}
