//! Setup shared by every command: logging, configuration and the request router.

use crate::Result;
use crate::clock::{Clock, SystemClock};
use crate::config::Config;
use crate::router::RequestRouter;
use crate::store::FileStore;
use camino::Utf8PathBuf;
use clap::{Args, ValueEnum};
use directories::BaseDirs;
use ohno::IntoAppError;
use std::sync::Arc;

const LOG_TARGET: &str = "    common";

/// Log level for diagnostic output
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogLevel {
    /// No logging output
    None,

    /// Only error messages
    Error,

    /// Warning and error messages
    Warn,

    /// Info, warning, and error messages
    Info,

    /// Debug, info, warning, and error messages
    Debug,

    /// Trace, debug, info, warning, and error messages
    Trace,
}

/// Arguments shared by all commands
#[derive(Args, Debug, Clone)]
pub struct CommonArgs {
    /// GitHub personal access token, used instead of the stored one
    #[arg(long, value_name = "TOKEN", env = "GITHUB_TOKEN", global = true, hide_env_values = true)]
    pub github_token: Option<String>,

    /// Path to configuration file (default is `ghpd.toml` in the platform configuration directory)
    #[arg(long, short = 'c', value_name = "PATH", global = true)]
    pub config: Option<Utf8PathBuf>,

    /// Directory holding cached results and settings
    #[arg(long, value_name = "PATH", global = true)]
    pub data_dir: Option<Utf8PathBuf>,

    /// Set the logging level for diagnostic output
    #[arg(long, value_name = "LEVEL", default_value = "none", global = true)]
    pub log_level: LogLevel,
}

#[derive(Debug)]
pub struct Common {
    pub config: Config,
    pub data_dir: Utf8PathBuf,
    github_token: Option<String>,
}

impl Common {
    /// Initialize logging and load the configuration
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration cannot be loaded or no data directory can be found
    pub fn new(args: &CommonArgs) -> Result<Self> {
        Self::init_logging(args.log_level);

        let config = Config::load(args.config.as_deref())?;

        // Determine data directory: use provided path or default cache directory for the platform
        let data_dir = if let Some(path) = &args.data_dir {
            path.clone()
        } else {
            let base = BaseDirs::new().into_app_err("could not determine cache directory")?;
            Utf8PathBuf::from_path_buf(base.cache_dir().join("ghpd"))
                .map_err(|p| ohno::app_err!("cache directory '{}' is not valid UTF-8", p.display()))?
        };

        Ok(Self {
            config,
            data_dir,
            github_token: args.github_token.clone(),
        })
    }

    /// Build a router over the file stores in the data directory, using the system clock.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be created
    pub fn router(&self) -> Result<RequestRouter<FileStore>> {
        let cache = Arc::new(FileStore::new(self.data_dir.join("cache")));
        let settings = Arc::new(FileStore::new(self.data_dir.join("settings")));
        let clock: Arc<dyn Clock> = Arc::new(SystemClock);

        log::debug!(target: LOG_TARGET, "Using data directory '{}'", self.data_dir);

        Ok(RequestRouter::new(&self.config, cache, settings, clock)?.with_token_override(self.github_token.clone()))
    }

    fn init_logging(log_level: LogLevel) {
        let level = match log_level {
            LogLevel::None => return,
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        };

        let env = env_logger::Env::default().filter_or("RUST_LOG", level);

        // a second initialization (e.g. from tests) keeps the first logger
        let _ = env_logger::Builder::from_env(env)
            .format_timestamp(None)
            .format_module_path(false)
            .format_target(matches!(log_level, LogLevel::Debug | LogLevel::Trace))
            .try_init();
    }
}
