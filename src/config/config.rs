use crate::Result;
use crate::feed::{BOUNDED_PAGE_CAP, DEFAULT_BASE_DELAY, DEFAULT_MAX_ATTEMPTS, DEFAULT_PAGE_SIZE, FULL_PAGE_CAP, RetryPolicy};
use crate::metrics::ClassifierMode;
use crate::store::{DEFAULT_CAPACITY, DEFAULT_RECENT_CAPACITY, DEFAULT_TTL};
use camino::{Utf8Path, Utf8PathBuf};
use core::time::Duration;
use ohno::{IntoAppError, app_err};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;

/// The default configuration TOML content, embedded from `default_config.toml`
pub const DEFAULT_CONFIG_TOML: &str = include_str!("../../default_config.toml");

/// Name of the configuration file looked up in the platform configuration directory.
pub const CONFIG_FILE_NAME: &str = "ghpd.toml";

/// Largest page size the events API accepts.
const MAX_PAGE_SIZE: u32 = 100;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Base URL of the GitHub REST API
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,

    /// GitHub GraphQL endpoint
    #[serde(default = "default_graphql_url")]
    pub graphql_url: String,

    /// User-Agent header sent with every request
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Number of events requested per page
    #[serde(default = "default_page_size")]
    pub page_size: u32,

    /// Page cap of a full fetch
    #[serde(default = "default_max_pages")]
    pub max_pages: u32,

    /// Page cap of a bounded fetch
    #[serde(default = "default_bounded_max_pages")]
    pub bounded_max_pages: u32,

    /// Whether to use the bounded page cap
    #[serde(default)]
    pub bounded: bool,

    /// Attempts per HTTP call, including the first one
    #[serde(default = "default_retry_attempts")]
    pub retry_attempts: u32,

    /// Delay before the first retry
    #[serde(default = "default_retry_base_delay", with = "humantime_serde")]
    pub retry_base_delay: Duration,

    /// Timeout of a single HTTP call
    #[serde(default = "default_request_timeout", with = "humantime_serde")]
    pub request_timeout: Duration,

    /// Duration during which cached analytics are served
    #[serde(default = "default_cache_ttl", with = "humantime_serde")]
    pub cache_ttl: Duration,

    /// Maximum number of cached analytics results
    #[serde(default = "default_cache_capacity")]
    pub cache_capacity: usize,

    /// Number of usernames remembered in the recent list
    #[serde(default = "default_recent_capacity")]
    pub recent_capacity: usize,

    /// Count only commits whose author matches the user
    #[serde(default)]
    pub author_match: bool,

    /// Prefer the contribution calendar when a token is available
    #[serde(default = "default_true")]
    pub use_calendar: bool,

    /// Include the language profile in results
    #[serde(default = "default_true")]
    pub include_languages: bool,
}

fn default_api_base_url() -> String {
    "https://api.github.com".to_string()
}

fn default_graphql_url() -> String {
    "https://api.github.com/graphql".to_string()
}

fn default_user_agent() -> String {
    "ghpd".to_string()
}

const fn default_page_size() -> u32 {
    DEFAULT_PAGE_SIZE
}

const fn default_max_pages() -> u32 {
    FULL_PAGE_CAP
}

const fn default_bounded_max_pages() -> u32 {
    BOUNDED_PAGE_CAP
}

const fn default_retry_attempts() -> u32 {
    DEFAULT_MAX_ATTEMPTS
}

const fn default_retry_base_delay() -> Duration {
    DEFAULT_BASE_DELAY
}

const fn default_request_timeout() -> Duration {
    Duration::from_secs(30)
}

const fn default_cache_ttl() -> Duration {
    DEFAULT_TTL
}

const fn default_cache_capacity() -> usize {
    DEFAULT_CAPACITY
}

const fn default_recent_capacity() -> usize {
    DEFAULT_RECENT_CAPACITY
}

const fn default_true() -> bool {
    true
}

impl Config {
    /// Load configuration from a file or use defaults
    ///
    /// Without an explicit path, `ghpd.toml` in the platform configuration directory is used if
    /// it exists.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, parsed or fails validation
    pub fn load(config_path: Option<&Utf8Path>) -> Result<Self> {
        let (final_path, text) = if let Some(path) = config_path {
            let text = fs::read_to_string(path).into_app_err_with(|| format!("reading ghpd configuration file '{path}'"))?;
            (path.to_path_buf(), text)
        } else {
            let Some(path) = Self::default_path() else {
                return Ok(Self::default());
            };

            match fs::read_to_string(&path) {
                Ok(text) => (path, text),
                Err(e) if e.kind() == io::ErrorKind::NotFound => {
                    // No config file found, use defaults
                    return Ok(Self::default());
                }
                Err(e) => return Err(e).into_app_err_with(|| format!("reading ghpd configuration file '{path}'")),
            }
        };

        Self::parse(&text).map_err(|e| app_err!("parsing configuration file '{final_path}': {e}"))
    }

    /// Parse and validate configuration text.
    ///
    /// # Errors
    ///
    /// Returns an error if the text is not valid TOML for this structure or fails validation
    pub fn parse(text: &str) -> Result<Self> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// `ghpd.toml` in the platform configuration directory, if one can be determined.
    #[must_use]
    pub fn default_path() -> Option<Utf8PathBuf> {
        let dirs = directories::ProjectDirs::from("", "", "ghpd")?;
        Utf8PathBuf::from_path_buf(dirs.config_dir().join(CONFIG_FILE_NAME)).ok()
    }

    /// Save the default configuration to a TOML file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written
    pub fn save_default(output_path: &Utf8Path) -> Result<()> {
        if let Some(parent) = output_path.parent()
            && !parent.as_str().is_empty()
        {
            fs::create_dir_all(parent).into_app_err_with(|| format!("creating directory '{parent}'"))?;
        }

        fs::write(output_path, DEFAULT_CONFIG_TOML).into_app_err_with(|| format!("writing default configuration to {output_path}"))?;
        Ok(())
    }

    /// Validate configuration values
    ///
    /// # Errors
    ///
    /// Returns an error if a value is zero where at least one is required, or out of range
    pub fn validate(&self) -> Result<()> {
        if self.page_size == 0 || self.page_size > MAX_PAGE_SIZE {
            return Err(app_err!("page_size must be between 1 and {MAX_PAGE_SIZE}, got {}", self.page_size));
        }

        if self.max_pages == 0 {
            return Err(app_err!("max_pages must be at least 1"));
        }

        if self.bounded_max_pages == 0 {
            return Err(app_err!("bounded_max_pages must be at least 1"));
        }

        if self.retry_attempts == 0 {
            return Err(app_err!("retry_attempts must be at least 1"));
        }

        if self.cache_capacity == 0 {
            return Err(app_err!("cache_capacity must be at least 1"));
        }

        if self.recent_capacity == 0 {
            return Err(app_err!("recent_capacity must be at least 1"));
        }

        Ok(())
    }

    /// Page cap in effect for the current mode.
    #[must_use]
    pub const fn page_cap(&self) -> u32 {
        if self.bounded { self.bounded_max_pages } else { self.max_pages }
    }

    #[must_use]
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.retry_attempts, self.retry_base_delay)
    }

    #[must_use]
    pub const fn classifier_mode(&self) -> ClassifierMode {
        if self.author_match {
            ClassifierMode::AuthorMatch
        } else {
            ClassifierMode::Simple
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base_url: default_api_base_url(),
            graphql_url: default_graphql_url(),
            user_agent: default_user_agent(),
            page_size: default_page_size(),
            max_pages: default_max_pages(),
            bounded_max_pages: default_bounded_max_pages(),
            bounded: false,
            retry_attempts: default_retry_attempts(),
            retry_base_delay: default_retry_base_delay(),
            request_timeout: default_request_timeout(),
            cache_ttl: default_cache_ttl(),
            cache_capacity: default_cache_capacity(),
            recent_capacity: default_recent_capacity(),
            author_match: false,
            use_calendar: true,
            include_languages: true,
        }
    }
}
