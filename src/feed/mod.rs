//! Access to the GitHub public activity feed.
//!
//! # Implementation Model
//!
//! [`Client`] performs single HTTP calls and classifies their outcome as success, transient
//! failure or fatal failure, attaching the [`RateTelemetry`] read from the response headers.
//! [`RetryPolicy`] wraps a single call with bounded exponential backoff. [`Paginator`] drives
//! the two across successive pages of the events feed, and [`RawEvent`] is the total decoding
//! of one feed record.
//!
//! Two auxiliary queries share the same client: the credential-gated contribution calendar
//! ([`fetch_calendar`]) and the language profile of a user's repositories
//! ([`fetch_languages`]).

mod calendar;
mod client;
mod event;
mod languages;
mod paginator;
mod retry;

pub use calendar::{Calendar, CalendarDay, fetch_calendar};
pub use client::{Client, FetchError, Fetched, RateTelemetry};
pub use event::{CommitAuthor, EventBody, RawEvent};
pub use languages::{MAX_LANGUAGES, fetch_languages};
pub use paginator::{BOUNDED_PAGE_CAP, DEFAULT_PAGE_SIZE, FULL_PAGE_CAP, FeedPage, Paginator};
pub use retry::{DEFAULT_BASE_DELAY, DEFAULT_MAX_ATTEMPTS, RetryPolicy};
