//! End-to-end run: ingest → window → render.

use chrono_tz::Tz;
use metrics::gauge;

use crate::ingest::config::FeedConfig;
use crate::ingest::types::SourceFetcher;
use crate::ingest::{run_once, IngestOutcome};
use crate::report::render_markdown;
use crate::window::{filter_window, ReportSections, ReportWindow};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReportStats {
    pub sources: usize,
    pub failed_sources: usize,
    pub items_seen: usize,
    pub items_dropped: usize,
    pub press_releases: usize,
    pub hearings: usize,
}

impl ReportStats {
    pub fn items_kept(&self) -> usize {
        self.press_releases + self.hearings
    }
}

/// Apply the window to an ingest outcome and render it. Pure.
pub fn assemble(
    title: &str,
    outcome: IngestOutcome,
    window: &ReportWindow,
    tz: Tz,
) -> (String, ReportSections) {
    let sections = filter_window(outcome.items, window, tz);
    let markdown = render_markdown(title, &sections, window, tz);
    (markdown, sections)
}

/// Fetch every configured source and produce the report text.
/// Source failures are logged and reflected in the stats, never returned.
pub async fn build_report(
    fetcher: &dyn SourceFetcher,
    config: &FeedConfig,
    window: &ReportWindow,
    tz: Tz,
) -> (String, ReportStats) {
    if config.source_count() == 0 {
        tracing::warn!(target: "ingest", "no sources configured; report will be empty");
    }

    let outcome = run_once(fetcher, config, tz).await;
    let mut stats = ReportStats {
        sources: config.source_count(),
        failed_sources: outcome.failures.len(),
        items_seen: outcome.items.len(),
        items_dropped: outcome.dropped,
        ..Default::default()
    };

    let (markdown, sections) = assemble(&config.title, outcome, window, tz);
    stats.press_releases = sections.press_releases.len();
    stats.hearings = sections.hearings.len();

    gauge!("feed_report_items", "category" => "press_release").set(stats.press_releases as f64);
    gauge!("feed_report_items", "category" => "hearing").set(stats.hearings as f64);
    gauge!("feed_report_window_end_seconds").set(window.end.timestamp() as f64);

    tracing::info!(
        target: "report",
        sources = stats.sources,
        failed = stats.failed_sources,
        seen = stats.items_seen,
        kept = stats.items_kept(),
        window = %window.label(),
        "report assembled"
    );
    (markdown, stats)
}
