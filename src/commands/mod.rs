//! Command-line interface for ghpd
//!
//! # Implementation Model
//!
//! The `run` function parses command-line arguments using clap and routes to the appropriate
//! command handler. Every command except `init` first loads the configuration and builds a
//! [`RequestRouter`](crate::router::RequestRouter) over file-backed stores in the data directory,
//! then expresses its work as router messages, so the command line and the `serve` message loop
//! behave identically.
//!
//! ## Commands
//!
//! - **fetch**: Compute and print the analytics of one user
//! - **set-token**: Persist a GitHub access token
//! - **clear-cache**: Drop all cached analytics
//! - **recent**: List or clear the recently analyzed users
//! - **serve**: Answer newline-delimited JSON messages on standard input
//! - **init**: Generate a default configuration file

mod common;
mod fetch;
mod host;
mod init;
mod run;
mod serve;
mod settings;

pub use common::{Common, CommonArgs, LogLevel};
pub use fetch::{FetchArgs, fetch_analytics};
pub use host::Host;
pub use init::{InitArgs, init_config};
pub use run::run;
pub use serve::{serve, serve_lines};
pub use settings::{RecentArgs, SetTokenArgs, clear_cache, recent, set_token};
