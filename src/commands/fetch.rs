use super::Host;
use super::common::Common;
use crate::Result;
use crate::metrics::Category;
use crate::router::{AnalyticsPayload, Origin, Request, Response, Source, encode_response};
use clap::Parser;
use ohno::bail;
use std::io::Write;

#[derive(Parser, Debug)]
pub struct FetchArgs {
    /// GitHub username to analyze
    #[arg(value_name = "USERNAME")]
    pub username: String,

    /// Length of the window in days (7, 14 or 30)
    #[arg(long, short = 'd', default_value_t = 14, value_name = "DAYS")]
    pub days: i64,

    /// Print the raw JSON response instead of a summary
    #[arg(long)]
    pub json: bool,

    /// Fetch fewer pages of events to go easy on the rate limit
    #[arg(long)]
    pub bounded: bool,
}

pub async fn fetch_analytics<H: Host>(host: &mut H, mut common: Common, args: &FetchArgs) -> Result<()> {
    if args.bounded {
        common.config.bounded = true;
    }

    let router = common.router()?;
    let response = router
        .handle(Request::FetchAnalytics {
            username: args.username.clone(),
            days: Some(args.days.into()),
        })
        .await;

    if args.json {
        let _ = writeln!(host.output(), "{}", encode_response(&response));
        if !response.ok {
            let _ = writeln!(host.error(), "{}", response.error.as_deref().unwrap_or("analytics request failed"));
            host.exit(1);
        }
        return Ok(());
    }

    match response {
        Response {
            ok: true,
            source: Some(source),
            payload: Some(payload),
            ..
        } => {
            write_summary(&mut host.output(), source, &payload)?;
            Ok(())
        }
        Response { error, .. } => bail!("{}", error.unwrap_or_else(|| "analytics request failed".to_string())),
    }
}

fn write_summary(out: &mut impl Write, source: Source, payload: &AnalyticsPayload) -> Result<()> {
    let m = &payload.metrics;
    let origin = match payload.origin {
        Origin::Events => format!("events, {} page(s)", payload.pages),
        Origin::Calendar => "contribution calendar".to_string(),
    };
    let source = match source {
        Source::Cache => "cached",
        Source::Fresh => "fresh",
    };

    writeln!(out, "{}: last {} days ({source}, {origin})", payload.username, payload.days)?;
    if payload.partial {
        writeln!(out, "  note:          the feed failed part-way, counts are a lower bound")?;
    }
    writeln!(
        out,
        "  contributions: {} ({:.1}/day)",
        m.total_contributions(),
        m.avg_contributions_per_day()
    )?;
    writeln!(
        out,
        "  active days:   {} of {} ({}% consistency)",
        m.active_days(),
        m.window().len(),
        m.consistency()
    )?;
    if m.best_day_count() > 0 {
        writeln!(out, "  best day:      {} ({})", m.best_day(), m.best_day_count())?;
    }
    writeln!(out, "  best streak:   {} day(s), current {}", m.best_streak(), m.current_streak())?;

    let breakdown: Vec<String> = Category::ALL
        .into_iter()
        .filter(|&c| c != Category::Unclassified || m.totals().get(c) > 0)
        .map(|c| format!("{c} {}", m.totals().get(c)))
        .collect();
    writeln!(out, "  breakdown:     {}", breakdown.join(", "))?;

    if !payload.languages.is_empty() {
        writeln!(out, "  languages:     {}", payload.languages.join(", "))?;
    }
    if let Some(remaining) = payload.rate.remaining {
        writeln!(out, "  rate limit:    {remaining} request(s) remaining")?;
    }

    Ok(())
}
