// src/ingest/providers/mod.rs
pub mod calendar;
pub mod feed;

use chrono::{DateTime, FixedOffset};
use chrono_tz::Tz;

use crate::ingest::types::{Category, NormalizedItem, SourceError};

/// Items parsed from one source plus how many entries had no usable timestamp.
#[derive(Debug, Default)]
pub struct ParsedSource {
    pub source_label: String,
    pub items: Vec<NormalizedItem>,
    pub dropped: usize,
}

/// Route raw content to the parser for its category.
pub fn parse_source(
    body: &str,
    url: &str,
    category: Category,
    tz: Tz,
) -> Result<ParsedSource, SourceError> {
    match category {
        Category::PressRelease => feed::parse_feed(body, url),
        Category::Hearing => calendar::parse_calendar(body, url, tz),
    }
}

/// Host part of `url` without a leading `www.`; the raw string if it does not parse.
pub fn url_host(url: &str) -> String {
    url::Url::parse(url)
        .ok()
        .and_then(|u| u.host_str().map(|h| h.trim_start_matches("www.").to_string()))
        .filter(|h| !h.is_empty())
        .unwrap_or_else(|| url.to_string())
}

/// Parse a feed timestamp. RFC 2822 and RFC 3339 are accepted; a value
/// without an explicit offset is rejected.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<FixedOffset>> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }
    DateTime::parse_from_rfc2822(s)
        .or_else(|_| DateTime::parse_from_rfc3339(s))
        .ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn host_fallback_strips_www() {
        assert_eq!(url_host("https://www.mass.gov/feeds/news"), "mass.gov");
        assert_eq!(url_host("https://malegislature.gov/x.ics"), "malegislature.gov");
        assert_eq!(url_host("not a url"), "not a url");
    }

    #[test]
    fn timestamps_need_an_offset() {
        let a = parse_timestamp("Mon, 01 Jan 2024 23:30:00 -0500").unwrap();
        let b = parse_timestamp("2024-01-01T23:30:00-05:00").unwrap();
        assert_eq!(a, b);
        assert!(parse_timestamp("Tue, 02 Jan 2024 10:00:00 EST").is_some());
        assert!(parse_timestamp("2024-01-01T23:30:00").is_none());
        assert!(parse_timestamp("yesterday").is_none());
        assert!(parse_timestamp("  ").is_none());
    }
}
