//! Command dispatch logic for ghpd

use super::Host;
use super::common::{Common, CommonArgs};
use super::fetch::{FetchArgs, fetch_analytics};
use super::init::{InitArgs, init_config};
use super::serve::serve;
use super::settings::{RecentArgs, SetTokenArgs, clear_cache, recent, set_token};
use crate::Result;
use clap::builder::Styles;
use clap::builder::styling::{AnsiColor, Effects};
use clap::{Parser, Subcommand};

const CLAP_STYLES: Styles = Styles::styled()
    .header(AnsiColor::Green.on_default().effects(Effects::BOLD))
    .usage(AnsiColor::Green.on_default().effects(Effects::BOLD))
    .literal(AnsiColor::Cyan.on_default().effects(Effects::BOLD))
    .placeholder(AnsiColor::Cyan.on_default());

#[derive(Parser, Debug)]
#[command(name = "ghpd", author, version, long_about = None)]
#[command(about = "Productivity analytics from a GitHub user's public activity")]
#[command(styles = CLAP_STYLES)]
struct Cli {
    #[command(flatten)]
    common: CommonArgs,

    #[command(subcommand)]
    command: GhpdSubcommand,
}

#[derive(Subcommand, Debug)]
enum GhpdSubcommand {
    /// Compute contribution metrics for a user
    Fetch(FetchArgs),
    /// Store a GitHub access token for later requests
    SetToken(SetTokenArgs),
    /// Remove all cached analytics
    ClearCache,
    /// Show or clear the recently analyzed users
    Recent(RecentArgs),
    /// Answer newline-delimited JSON messages read from standard input
    Serve,
    /// Generate a default configuration file
    Init(InitArgs),
}

/// Dispatch command-line arguments to the appropriate handler
///
/// This function parses the command-line arguments and executes the corresponding
/// subcommand. It's designed to be called from main.rs with the program arguments.
///
/// # Errors
///
/// Returns an error if command parsing fails or if the executed command fails
pub async fn run<I, T, H>(host: &mut H, args: I) -> Result<()>
where
    I: IntoIterator<Item = T>,
    T: Into<std::ffi::OsString> + Clone,
    H: Host,
{
    let cli = Cli::parse_from(args);

    if let GhpdSubcommand::Init(init_args) = &cli.command {
        return init_config(host, init_args);
    }

    let common = Common::new(&cli.common)?;
    match &cli.command {
        GhpdSubcommand::Fetch(fetch_args) => fetch_analytics(host, common, fetch_args).await,
        GhpdSubcommand::SetToken(token_args) => set_token(host, &common, token_args).await,
        GhpdSubcommand::ClearCache => clear_cache(host, &common).await,
        GhpdSubcommand::Recent(recent_args) => recent(host, &common, recent_args).await,
        GhpdSubcommand::Serve => serve(host, &common).await,
        GhpdSubcommand::Init(init_args) => init_config(host, init_args),
    }
}
