//! Tunables loaded from `ghpd.toml`.

#[expect(clippy::module_inception, reason = "the module holds the Config type and nothing else")]
mod config;

pub use config::{CONFIG_FILE_NAME, Config, DEFAULT_CONFIG_TOML};
