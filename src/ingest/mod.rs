// src/ingest/mod.rs
pub mod config;
pub mod fetch;
pub mod providers;
pub mod types;

use crate::ingest::config::FeedConfig;
use crate::ingest::providers::ParsedSource;
use crate::ingest::types::{Category, NormalizedItem, SourceError, SourceFailure, SourceFetcher};
use chrono_tz::Tz;
use metrics::{counter, describe_counter, describe_histogram, histogram};
use once_cell::sync::OnceCell;

/// Upper bound for titles and labels after normalization.
pub const MAX_TEXT_CHARS: usize = 300;

/// One-time metrics registration (so series show up in the textfile).
fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!("feed_items_total", "Items parsed from sources, by category.");
        describe_counter!(
            "feed_items_dropped_total",
            "Entries dropped for a missing or unparseable timestamp."
        );
        describe_counter!(
            "feed_source_errors_total",
            "Sources skipped after a fetch or parse error."
        );
        describe_histogram!("feed_source_ms", "Fetch + parse time per source in milliseconds.");
    });
}

/// Normalize text to a single Markdown-safe line: decode entities, strip tags,
/// fold typographic quotes, collapse whitespace (newlines included).
pub fn normalize_text(s: &str) -> String {
    // 1) HTML entity decode
    let mut out = html_escape::decode_html_entities(s).to_string();

    // 2) Strip HTML tags
    static RE_TAGS: OnceCell<regex::Regex> = OnceCell::new();
    let re_tags = RE_TAGS.get_or_init(|| regex::Regex::new(r"(?is)</?[a-z][^>]*>").unwrap());
    out = re_tags.replace_all(&out, "").to_string();

    // 3) Normalize “ ” ‘ ’ « » to ASCII quotes
    out = out
        .replace(['\u{201C}', '\u{201D}', '\u{00AB}', '\u{00BB}'], "\"")
        .replace(['\u{2018}', '\u{2019}'], "'");

    // 4) Collapse whitespace
    static RE_WS: OnceCell<regex::Regex> = OnceCell::new();
    let re_ws = RE_WS.get_or_init(|| regex::Regex::new(r"\s+").unwrap());
    out = re_ws.replace_all(&out, " ").trim().to_string();

    // 5) Length cap
    if out.chars().count() > MAX_TEXT_CHARS {
        out = out.chars().take(MAX_TEXT_CHARS).collect::<String>().trim_end().to_string();
    }

    out
}

/// Everything one run collected, before windowing.
#[derive(Debug, Default)]
pub struct IngestOutcome {
    pub items: Vec<NormalizedItem>,
    pub failures: Vec<SourceFailure>,
    /// Entries dropped for a missing/unparseable timestamp.
    pub dropped: usize,
}

/// Fetch and parse a single source.
pub async fn ingest_source(
    fetcher: &dyn SourceFetcher,
    url: &str,
    category: Category,
    tz: Tz,
) -> Result<ParsedSource, SourceError> {
    let body = fetcher.fetch(url).await?;
    providers::parse_source(&body, url, category, tz)
}

/// Run ingest once over every configured source. A failing source is logged
/// and recorded in `failures`; it never aborts the run.
pub async fn run_once(fetcher: &dyn SourceFetcher, config: &FeedConfig, tz: Tz) -> IngestOutcome {
    ensure_metrics_described();

    let mut out = IngestOutcome::default();
    for category in [Category::PressRelease, Category::Hearing] {
        for url in config.urls(category) {
            let t0 = std::time::Instant::now();
            let res = ingest_source(fetcher, url, category, tz).await;
            histogram!("feed_source_ms").record(t0.elapsed().as_secs_f64() * 1_000.0);

            match res {
                Ok(parsed) => {
                    tracing::info!(
                        target: "ingest",
                        %url,
                        category = category.as_str(),
                        fetcher = fetcher.name(),
                        items = parsed.items.len(),
                        dropped = parsed.dropped,
                        "source ingested"
                    );
                    counter!("feed_items_total", "category" => category.as_str())
                        .increment(parsed.items.len() as u64);
                    counter!("feed_items_dropped_total").increment(parsed.dropped as u64);
                    out.dropped += parsed.dropped;
                    out.items.extend(parsed.items);
                }
                Err(error) => {
                    tracing::warn!(
                        target: "ingest",
                        %url,
                        category = category.as_str(),
                        error = %error,
                        "source failed; skipping"
                    );
                    counter!("feed_source_errors_total", "category" => category.as_str())
                        .increment(1);
                    out.failures.push(SourceFailure {
                        url: url.clone(),
                        category,
                        error,
                    });
                }
            }
        }
    }
    out
}
