//! The uncached path from a validated request to an analytics payload.

use super::error::AnalyticsError;
use super::messages::{AnalyticsPayload, Origin};
use crate::clock::Clock;
use crate::config::Config;
use crate::feed::{Client, FetchError, Paginator, RateTelemetry, RetryPolicy, fetch_calendar, fetch_languages};
use crate::metrics::{Category, ClassifiedEvent, Classifier, ClassifierMode, DayCount, MetricsSnapshot, Window, aggregate};
use std::sync::Arc;

const LOG_TARGET: &str = "  pipeline";

/// Metrics computed from one upstream source, before the language profile is attached.
#[derive(Debug)]
struct Computed {
    metrics: MetricsSnapshot,
    rate: RateTelemetry,
    origin: Origin,
    partial: bool,
    pages: u32,
}

#[derive(Debug)]
pub struct Pipeline {
    client: Client,
    retry: RetryPolicy,
    page_size: u32,
    page_cap: u32,
    mode: ClassifierMode,
    use_calendar: bool,
    include_languages: bool,
    clock: Arc<dyn Clock>,
}

impl Pipeline {
    /// Build the pipeline described by `config`.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be created.
    pub fn new(config: &Config, clock: Arc<dyn Clock>) -> crate::Result<Self> {
        let client = Client::new(
            config.api_base_url.as_str(),
            config.graphql_url.as_str(),
            &config.user_agent,
            config.request_timeout,
        )?;

        Ok(Self {
            client,
            retry: config.retry_policy(),
            page_size: config.page_size,
            page_cap: config.page_cap(),
            mode: config.classifier_mode(),
            use_calendar: config.use_calendar,
            include_languages: config.include_languages,
            clock,
        })
    }

    /// Compute the analytics of `username` over the `days` ending today.
    ///
    /// # Errors
    ///
    /// Fails only when the events feed cannot deliver its first page. Calendar and language
    /// failures degrade to the events feed and to an empty language list respectively.
    pub async fn run(&self, username: &str, days: DayCount, token: Option<&str>) -> Result<AnalyticsPayload, AnalyticsError> {
        let window = Window::ending_on(self.clock.today(), days);

        let calendar = match token {
            Some(token) if self.use_calendar => match self.from_calendar(username, token, &window).await {
                Ok(computed) => Some(computed),
                Err(e) => {
                    log::warn!(target: LOG_TARGET, "Contribution calendar unavailable for '{username}', falling back to the events feed: {e}");
                    None
                }
            },
            _ => None,
        };

        let computed = match calendar {
            Some(computed) => computed,
            None => self.from_events(username, token, &window).await?,
        };

        let languages = if self.include_languages {
            self.languages(username, token).await
        } else {
            Vec::new()
        };

        Ok(AnalyticsPayload {
            username: username.to_string(),
            days,
            metrics: computed.metrics,
            languages,
            rate: computed.rate,
            fetched_at: self.clock.now(),
            origin: computed.origin,
            partial: computed.partial,
            pages: computed.pages,
        })
    }

    async fn from_events(&self, username: &str, token: Option<&str>, window: &Window) -> Result<Computed, FetchError> {
        let paginator = Paginator::new(&self.client, self.retry, self.page_size, self.page_cap);
        let feed = paginator.fetch(username, token, window.start_instant()).await?;

        let classifier = Classifier::new(self.mode, username, window);
        let metrics = aggregate(classifier.classify_all(&feed.events), window);

        log::info!(
            target: LOG_TARGET,
            "Computed metrics for '{username}' from {} event(s) on {} page(s)",
            feed.events.len(),
            feed.pages
        );

        Ok(Computed {
            metrics,
            rate: feed.rate,
            origin: Origin::Events,
            partial: feed.is_partial(),
            pages: feed.pages,
        })
    }

    async fn from_calendar(&self, username: &str, token: &str, window: &Window) -> Result<Computed, FetchError> {
        let calendar = fetch_calendar(&self.client, self.retry, username, token, window.start_instant(), self.clock.now()).await?;

        let events = calendar
            .days
            .iter()
            .filter(|d| window.contains(d.date) && d.contribution_count > 0)
            .map(|d| ClassifiedEvent {
                day: d.date,
                category: Category::Unclassified,
                weight: d.contribution_count,
            });

        Ok(Computed {
            metrics: aggregate(events, window),
            rate: calendar.rate,
            origin: Origin::Calendar,
            partial: false,
            pages: 0,
        })
    }

    async fn languages(&self, username: &str, token: Option<&str>) -> Vec<String> {
        match fetch_languages(&self.client, self.retry, username, token).await {
            Ok(languages) => languages,
            Err(e) => {
                log::warn!(target: LOG_TARGET, "Could not determine languages of '{username}': {e}");
                Vec::new()
            }
        }
    }
}
