use crate::feed::RateTelemetry;
use crate::metrics::{DayCount, MetricsSnapshot};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// An inbound message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Request {
    /// Compute (or fetch from cache) the analytics of a user.
    FetchAnalytics {
        #[serde(default)]
        username: String,

        /// Kept loose here and normalized by validation, so that `"14"`, `14.0` or a missing value
        /// are understood and a bad value yields a validation error rather than a decoding one.
        #[serde(default)]
        days: Option<Value>,
    },

    /// Persist the access token.
    #[serde(alias = "SET_TOKEN")]
    SetCredential {
        #[serde(default)]
        token: String,
    },

    /// Drop every cached analytics result.
    ClearCache,

    ListRecent,

    ClearRecent,
}

/// Where an analytics payload came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Source {
    Cache,
    Fresh,
}

/// Which upstream data the metrics were computed from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Origin {
    /// Paged public events.
    Events,

    /// The pre-aggregated contribution calendar.
    Calendar,
}

/// Computed analytics of one user, as cached and returned.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsPayload {
    pub username: String,
    pub days: DayCount,
    pub metrics: MetricsSnapshot,
    pub languages: Vec<String>,
    pub rate: RateTelemetry,
    pub fetched_at: DateTime<Utc>,
    pub origin: Origin,

    /// Set when a later page of the feed failed and the metrics are a lower bound.
    pub partial: bool,

    /// Number of feed pages read; zero for the calendar.
    pub pages: u32,
}

/// Reply to a [`Request`].
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Response {
    pub ok: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<Source>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<AnalyticsPayload>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cleared: Option<usize>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recent: Option<Vec<String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl Response {
    #[must_use]
    pub fn ok() -> Self {
        Self { ok: true, ..Self::default() }
    }

    #[must_use]
    pub fn analytics(source: Source, payload: AnalyticsPayload) -> Self {
        Self {
            ok: true,
            source: Some(source),
            payload: Some(payload),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn cleared(count: usize) -> Self {
        Self {
            ok: true,
            cleared: Some(count),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn recent(list: Vec<String>) -> Self {
        Self {
            ok: true,
            recent: Some(list),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            ok: false,
            error: Some(error.into()),
            ..Self::default()
        }
    }
}
