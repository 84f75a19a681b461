//! Primary languages of a user's recently updated repositories.

use super::client::{Client, FetchError};
use super::retry::RetryPolicy;
use ohno::app_err;
use serde::Deserialize;
use std::collections::BTreeMap;

const LOG_TARGET: &str = " languages";

/// Number of recently updated repositories inspected.
pub const REPO_SAMPLE: u32 = 30;

/// Maximum number of languages reported.
pub const MAX_LANGUAGES: usize = 10;

#[derive(Debug, Deserialize)]
struct Repo {
    #[serde(default)]
    fork: bool,
    #[serde(default)]
    language: Option<String>,
}

/// Fetch the languages of `username`'s own repositories, most common first.
pub async fn fetch_languages(client: &Client, retry: RetryPolicy, username: &str, token: Option<&str>) -> Result<Vec<String>, FetchError> {
    let url = client.repos_url(username, REPO_SAMPLE);
    let url_ref = url.as_str();

    log::info!(target: LOG_TARGET, "Querying repositories of '{username}' for languages");
    let (value, rate) = retry.run("repository list", move || client.get_json(url_ref, token)).await?;

    let repos: Vec<Repo> =
        serde_json::from_value(value).map_err(|e| FetchError::Fatal(app_err!("malformed repository list from '{url}': {e}"), rate))?;

    Ok(rank_languages(&repos))
}

fn rank_languages(repos: &[Repo]) -> Vec<String> {
    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for repo in repos.iter().filter(|r| !r.fork) {
        if let Some(lang) = repo.language.as_deref().filter(|l| !l.is_empty()) {
            *counts.entry(lang).or_default() += 1;
        }
    }

    let mut ranked: Vec<_> = counts.into_iter().collect();
    // BTreeMap order breaks ties by name; the sort is stable.
    ranked.sort_by(|a, b| b.1.cmp(&a.1));
    ranked.into_iter().take(MAX_LANGUAGES).map(|(lang, _)| lang.to_string()).collect()
}
