//! Sequential paging through a user's public event feed.
//!
//! The feed is reverse-chronological, so paging stops as soon as a record predates the cutoff,
//! when a short page signals the end of the feed, or when the page cap is hit. A failure on any
//! page after the first keeps what was already collected.

use super::client::{Client, FetchError, RateTelemetry};
use super::event::RawEvent;
use super::retry::RetryPolicy;
use chrono::{DateTime, Utc};
use ohno::app_err;
use serde_json::Value;

const LOG_TARGET: &str = " paginator";

/// Page size requested from the feed (the API maximum).
pub const DEFAULT_PAGE_SIZE: u32 = 100;

/// Page cap for a full-fidelity fetch.
pub const FULL_PAGE_CAP: u32 = 10;

/// Page cap for a bounded, quota-friendly fetch.
pub const BOUNDED_PAGE_CAP: u32 = 3;

/// Everything gathered from the feed for one request.
#[derive(Debug)]
pub struct FeedPage {
    /// Records at or after the cutoff, in feed order.
    pub events: Vec<RawEvent>,

    /// Telemetry of the last page fetched successfully.
    pub rate: RateTelemetry,

    /// Number of pages fetched successfully.
    pub pages: u32,

    /// Set when a later page failed and `events` is therefore incomplete.
    pub failure: Option<FetchError>,
}

impl FeedPage {
    #[must_use]
    pub const fn is_partial(&self) -> bool {
        self.failure.is_some()
    }
}

/// Why paging stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stop {
    Continue,
    ShortPage,
    Cutoff,
}

#[derive(Debug, Clone)]
pub struct Paginator<'a> {
    client: &'a Client,
    retry: RetryPolicy,
    page_size: u32,
    max_pages: u32,
}

impl<'a> Paginator<'a> {
    #[must_use]
    pub fn new(client: &'a Client, retry: RetryPolicy, page_size: u32, max_pages: u32) -> Self {
        Self {
            client,
            retry,
            page_size: page_size.max(1),
            max_pages: max_pages.max(1),
        }
    }

    /// Fetch every record of `username`'s feed created at or after `cutoff`.
    ///
    /// # Errors
    ///
    /// Returns the fetch error only when the very first page cannot be retrieved. Failures on
    /// later pages are reported through [`FeedPage::failure`].
    pub async fn fetch(&self, username: &str, token: Option<&str>, cutoff: DateTime<Utc>) -> Result<FeedPage, FetchError> {
        let mut events = Vec::new();
        let mut rate = RateTelemetry::default();
        let mut pages = 0;

        for page in 1..=self.max_pages {
            let records = match self.fetch_page(username, page, token).await {
                Ok((records, page_rate)) => {
                    rate = page_rate;
                    records
                }
                Err(e) if page == 1 => return Err(e),
                Err(e) => {
                    log::warn!(
                        target: LOG_TARGET,
                        "Could not fetch page {page} of events for '{username}', keeping {} event(s) from earlier pages: {e}",
                        events.len()
                    );
                    return Ok(FeedPage {
                        events,
                        rate,
                        pages,
                        failure: Some(e),
                    });
                }
            };

            pages = page;
            let before = events.len();
            let stop = self.absorb(records, cutoff, &mut events);
            log::debug!(
                target: LOG_TARGET,
                "Page {page} for '{username}': {} event(s) within the window",
                events.len() - before
            );

            match stop {
                Stop::Continue => {}
                Stop::ShortPage => {
                    log::debug!(target: LOG_TARGET, "Page {page} for '{username}' is the last page of the feed");
                    break;
                }
                Stop::Cutoff => {
                    log::debug!(target: LOG_TARGET, "Page {page} for '{username}' reached events older than {cutoff}");
                    break;
                }
            }

            if page == self.max_pages {
                log::debug!(
                    target: LOG_TARGET,
                    "Reached maximum page limit ({}) for '{username}', stopping pagination after {} events",
                    self.max_pages,
                    events.len()
                );
            }
        }

        Ok(FeedPage {
            events,
            rate,
            pages,
            failure: None,
        })
    }

    /// Fetch one page with its own retry budget and check that it is a list.
    async fn fetch_page(&self, username: &str, page: u32, token: Option<&str>) -> Result<(Vec<Value>, RateTelemetry), FetchError> {
        let url = self.client.events_url(username, page, self.page_size);
        let client = self.client;
        let url_ref = url.as_str();

        let (body, rate) = self.retry.run("events page", move || client.get_json(url_ref, token)).await?;

        match body {
            Value::Array(records) => Ok((records, rate)),
            other => Err(FetchError::Fatal(
                app_err!("expected a list of events from '{url}', got {}", json_kind(&other)),
                rate,
            )),
        }
    }

    /// Keep the records of one page that fall at or after `cutoff` and decide whether to go on.
    fn absorb(&self, records: Vec<Value>, cutoff: DateTime<Utc>, events: &mut Vec<RawEvent>) -> Stop {
        let short = records.len() < self.page_size as usize;
        let mut reached_cutoff = false;

        for record in records {
            let event = RawEvent::from(record);
            match event.created_at {
                Some(ts) if ts < cutoff => reached_cutoff = true,
                Some(_) => events.push(event),
                None => {}
            }
        }

        if reached_cutoff {
            Stop::Cutoff
        } else if short {
            Stop::ShortPage
        } else {
            Stop::Continue
        }
    }
}

const fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a list",
        Value::Object(_) => "an object",
    }
}
