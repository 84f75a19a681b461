//! Public activity feed records.
//!
//! The feed returns loosely-typed JSON records. Each record is decoded into a [`RawEvent`], a
//! closed union over the event kinds we care about. Decoding never fails: anything unrecognized
//! or malformed becomes [`EventBody::Other`] and is ignored downstream.

use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::Value;

/// One record of the activity feed.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(from = "Value")]
pub struct RawEvent {
    /// When the event happened; `None` if the record carried no usable timestamp.
    pub created_at: Option<DateTime<Utc>>,
    pub body: EventBody,
}

/// The kind-specific part of a feed record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventBody {
    /// Commits pushed to a branch. `commits` is `None` when the feed omitted the list.
    Push { commits: Option<Vec<CommitAuthor>> },
    PullRequest { action: Option<String> },
    Issue { action: Option<String> },
    Review,
    /// A comment on an issue or on a pull request diff.
    Comment,
    /// A repository was starred (`WatchEvent` in the feed).
    Star { action: Option<String> },
    Release { action: Option<String> },
    Other,
}

/// Declared author of a pushed commit.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommitAuthor {
    pub name: Option<String>,
    pub email: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PushPayload {
    #[serde(default)]
    commits: Option<Vec<CommitWire>>,
}

#[derive(Debug, Deserialize)]
struct CommitWire {
    #[serde(default)]
    author: Option<AuthorWire>,
}

#[derive(Debug, Deserialize)]
struct AuthorWire {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    email: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ActionPayload {
    #[serde(default)]
    action: Option<String>,
}

impl EventBody {
    fn decode(kind: &str, payload: Value) -> Self {
        match kind {
            "PushEvent" => serde_json::from_value::<PushPayload>(payload).map_or(Self::Other, |p| Self::Push {
                commits: p.commits.map(|commits| {
                    commits
                        .into_iter()
                        .map(|c| c.author.map_or_else(CommitAuthor::default, |a| CommitAuthor { name: a.name, email: a.email }))
                        .collect()
                }),
            }),
            "PullRequestEvent" => Self::with_action(payload, |action| Self::PullRequest { action }),
            "IssuesEvent" => Self::with_action(payload, |action| Self::Issue { action }),
            "PullRequestReviewEvent" => Self::Review,
            "IssueCommentEvent" | "PullRequestReviewCommentEvent" => Self::Comment,
            "WatchEvent" => Self::with_action(payload, |action| Self::Star { action }),
            "ReleaseEvent" => Self::with_action(payload, |action| Self::Release { action }),
            _ => Self::Other,
        }
    }

    fn with_action(payload: Value, make: impl FnOnce(Option<String>) -> Self) -> Self {
        serde_json::from_value::<ActionPayload>(payload).map_or(Self::Other, |p| make(p.action))
    }
}

impl From<Value> for RawEvent {
    fn from(mut value: Value) -> Self {
        let created_at = value
            .get("created_at")
            .and_then(Value::as_str)
            .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
            .map(|ts| ts.with_timezone(&Utc));

        let payload = value.get_mut("payload").map_or(Value::Null, Value::take);
        let body = match value.get("type").and_then(Value::as_str) {
            Some(kind) => EventBody::decode(kind, payload),
            None => EventBody::Other,
        };

        Self { created_at, body }
    }
}
