//! policy-feed: binary entrypoint
//! Loads the feed list, pulls every source once, and writes the dated
//! Markdown report. Meant to be run by a scheduler; exits when done.

use anyhow::Result;
use chrono::Utc;
use clap::Parser;
use std::path::PathBuf;

use policy_feed::ingest::config::load_feeds_default;
use policy_feed::telemetry::{init_tracing, TextfileExporter};
use policy_feed::window::{parse_window_duration, parse_window_end, DEFAULT_WINDOW};
use policy_feed::{build_report, write_report, HttpFetcher, ReportWindow, REPORT_TZ};

#[derive(Parser, Debug)]
#[command(name = "policy-feed", version)]
#[command(about = "Collect recent press releases and hearings into a dated Markdown report")]
struct Cli {
    /// Feed list (TOML or JSON). Defaults to $FEEDS_PATH, then config/feeds.toml
    #[arg(long)]
    feeds: Option<PathBuf>,

    /// Trailing window, e.g. "24h", "7d", "1d 12h"
    #[arg(long, default_value = DEFAULT_WINDOW)]
    since: String,

    /// Window end (RFC 3339); defaults to now
    #[arg(long)]
    end: Option<String>,

    /// Directory receiving <YYYY-MM-DD>.md
    #[arg(long, env = "REPORTS_DIR", default_value = "reports")]
    reports_dir: PathBuf,

    /// Per-request timeout in seconds
    #[arg(long, default_value_t = 30)]
    timeout_secs: u64,

    /// Retries per source on transport errors and 5xx
    #[arg(long, default_value_t = 2)]
    retries: u8,

    /// Write a Prometheus textfile with run counters
    #[arg(long)]
    metrics_out: Option<PathBuf>,

    /// Also print the report to stdout
    #[arg(long)]
    stdout: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env in local/dev; no-op when absent.
    let _ = dotenvy::dotenv();
    init_tracing();

    let cli = Cli::parse();

    // Recorder must exist before any metric is touched.
    let exporter = match cli.metrics_out {
        Some(_) => Some(TextfileExporter::install()?),
        None => None,
    };

    let config = load_feeds_default(cli.feeds.as_deref())?;
    let duration = parse_window_duration(&cli.since)?;
    let end = match cli.end.as_deref() {
        Some(raw) => parse_window_end(raw)?,
        None => Utc::now(),
    };
    let window = ReportWindow::new(end, duration)?;

    let fetcher = HttpFetcher::new()?
        .with_timeout(cli.timeout_secs)
        .with_retries(cli.retries);

    let (markdown, stats) = build_report(&fetcher, &config, &window, REPORT_TZ).await;
    let path = write_report(&cli.reports_dir, &window, REPORT_TZ, &markdown)?;

    if let (Some(exporter), Some(out)) = (&exporter, &cli.metrics_out) {
        exporter.write_to(out)?;
    }

    let summary = format!("Wrote {} with {} items.", path.display(), stats.items_kept());
    if cli.stdout {
        print!("{markdown}");
        eprintln!("{summary}");
    } else {
        println!("{summary}");
    }
    Ok(())
}
