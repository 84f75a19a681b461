//! Pre-aggregated contribution calendar via the GraphQL API.
//!
//! Requires a credential. Instead of paging through raw events, one query returns the daily
//! contribution counts GitHub itself computed. The counts carry no category breakdown.

use super::client::{Client, FetchError, RateTelemetry};
use super::retry::RetryPolicy;
use chrono::{DateTime, NaiveDate, Utc};
use ohno::app_err;
use serde::Deserialize;
use serde_json::json;

const LOG_TARGET: &str = "  calendar";

const CALENDAR_QUERY: &str = "query($username: String!, $from: DateTime!, $to: DateTime!) {
  user(login: $username) {
    contributionsCollection(from: $from, to: $to) {
      contributionCalendar {
        totalContributions
        weeks {
          contributionDays {
            date
            contributionCount
          }
        }
      }
    }
  }
}";

/// Daily contribution totals for a date range.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Calendar {
    pub days: Vec<CalendarDay>,
    pub rate: RateTelemetry,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalendarDay {
    pub date: NaiveDate,
    pub contribution_count: u64,
}

#[derive(Debug, Deserialize)]
struct GraphQlResponse {
    #[serde(default)]
    data: Option<Data>,
    #[serde(default)]
    errors: Option<Vec<GraphQlError>>,
}

#[derive(Debug, Deserialize)]
struct GraphQlError {
    #[serde(default)]
    message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Data {
    user: Option<User>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct User {
    contributions_collection: ContributionsCollection,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ContributionsCollection {
    contribution_calendar: ContributionCalendar,
}

#[derive(Debug, Deserialize)]
struct ContributionCalendar {
    #[serde(default)]
    weeks: Vec<Week>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Week {
    #[serde(default)]
    contribution_days: Vec<CalendarDay>,
}

/// Query the contribution calendar of `username` between `from` and `to`.
pub async fn fetch_calendar(
    client: &Client,
    retry: RetryPolicy,
    username: &str,
    token: &str,
    from: DateTime<Utc>,
    to: DateTime<Utc>,
) -> Result<Calendar, FetchError> {
    let body = json!({
        "query": CALENDAR_QUERY,
        "variables": {
            "username": username,
            "from": from.to_rfc3339_opts(chrono::SecondsFormat::Secs, true),
            "to": to.to_rfc3339_opts(chrono::SecondsFormat::Secs, true),
        }
    });

    log::info!(target: LOG_TARGET, "Querying contribution calendar for '{username}'");

    let url = client.graphql_url();
    let body_ref = &body;
    let (value, rate) = retry
        .run("contribution calendar", move || client.post_json(url, body_ref, Some(token)))
        .await?;

    let response: GraphQlResponse =
        serde_json::from_value(value).map_err(|e| FetchError::Fatal(app_err!("malformed calendar response: {e}"), rate))?;

    parse_response(response, username, rate)
}

fn parse_response(response: GraphQlResponse, username: &str, rate: RateTelemetry) -> Result<Calendar, FetchError> {
    if let Some(first) = response.errors.as_ref().and_then(|errors| errors.first()) {
        let message = first.message.as_deref().unwrap_or("GraphQL query failed");
        return Err(FetchError::Fatal(app_err!("{message}"), rate));
    }

    let user = response
        .data
        .and_then(|d| d.user)
        .ok_or_else(|| FetchError::Fatal(app_err!("user '{username}' not found"), rate))?;

    let days = user
        .contributions_collection
        .contribution_calendar
        .weeks
        .into_iter()
        .flat_map(|week| week.contribution_days)
        .collect();

    Ok(Calendar { days, rate })
}
