//! Commands that manage stored state: the access token, the cache and the recent list.

use super::Host;
use super::common::Common;
use crate::Result;
use crate::router::{Request, Response};
use clap::Parser;
use ohno::bail;
use std::io::Write;

#[derive(Parser, Debug)]
pub struct SetTokenArgs {
    /// GitHub personal access token; pass an empty string to forget the stored token
    #[arg(value_name = "TOKEN")]
    pub token: String,
}

#[derive(Parser, Debug)]
pub struct RecentArgs {
    /// Forget the list instead of printing it
    #[arg(long)]
    pub clear: bool,
}

pub async fn set_token<H: Host>(host: &mut H, common: &Common, args: &SetTokenArgs) -> Result<()> {
    let response = common.router()?.handle(Request::SetCredential { token: args.token.clone() }).await;
    check(&response)?;

    let _ = writeln!(host.output(), "Access token stored");
    Ok(())
}

pub async fn clear_cache<H: Host>(host: &mut H, common: &Common) -> Result<()> {
    let response = common.router()?.handle(Request::ClearCache).await;
    check(&response)?;

    let _ = writeln!(host.output(), "Removed {} cached result(s)", response.cleared.unwrap_or_default());
    Ok(())
}

pub async fn recent<H: Host>(host: &mut H, common: &Common, args: &RecentArgs) -> Result<()> {
    let router = common.router()?;

    if args.clear {
        check(&router.handle(Request::ClearRecent).await)?;
        let _ = writeln!(host.output(), "Recent list cleared");
        return Ok(());
    }

    let response = router.handle(Request::ListRecent).await;
    check(&response)?;

    let mut out = host.output();
    for name in response.recent.unwrap_or_default() {
        let _ = writeln!(out, "{name}");
    }
    Ok(())
}

fn check(response: &Response) -> Result<()> {
    if !response.ok {
        bail!("{}", response.error.as_deref().unwrap_or("request failed"));
    }
    Ok(())
}
