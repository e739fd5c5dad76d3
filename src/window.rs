//! # Report Window
//! Trailing time window `(end - duration, end]` and the pure filter that
//! applies it.
//!
//! All comparisons happen in the reporting timezone. `end` is always passed
//! in; nothing here reads the clock.

use anyhow::{anyhow, bail, Context, Result};
use chrono::{DateTime, Duration, Utc};
use chrono_tz::Tz;

use crate::ingest::types::{Category, NormalizedItem};

/// Presentation zone for every rendered time.
pub const REPORT_TZ: Tz = chrono_tz::America::New_York;

/// Default `--since` value.
pub const DEFAULT_WINDOW: &str = "24h";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReportWindow {
    pub end: DateTime<Utc>,
    pub duration: Duration,
}

impl ReportWindow {
    pub fn new(end: DateTime<Utc>, duration: Duration) -> Result<Self> {
        if duration <= Duration::zero() {
            bail!("window duration must be positive");
        }
        if end.checked_sub_signed(duration).is_none() {
            bail!(
                "window of {} before {end} reaches past the supported date range",
                format_duration(duration)
            );
        }
        Ok(Self { end, duration })
    }

    /// Exclusive lower bound.
    pub fn start(&self) -> DateTime<Utc> {
        self.end - self.duration
    }

    /// `start < t <= end`, evaluated in the zone of `t`.
    pub fn contains(&self, t: &DateTime<Tz>) -> bool {
        let zone = t.timezone();
        let start = self.start().with_timezone(&zone);
        let end = self.end.with_timezone(&zone);
        start < *t && *t <= end
    }

    /// Short label for placeholders: `24h`, `7d`, `90m`.
    pub fn label(&self) -> String {
        let secs = self.duration.num_seconds();
        if secs > 86_400 && secs % 86_400 == 0 {
            format!("{}d", secs / 86_400)
        } else if secs % 3_600 == 0 {
            format!("{}h", secs / 3_600)
        } else if secs % 60 == 0 {
            format!("{}m", secs / 60)
        } else {
            format!("{secs}s")
        }
    }
}

fn format_duration(d: Duration) -> String {
    d.to_std()
        .map(|s| humantime::format_duration(s).to_string())
        .unwrap_or_else(|_| format!("{}s", d.num_seconds()))
}

/// Parse a `--since` expression: humantime syntax (`24h`, `7d`, `1d 12h`) or a
/// bare integer meaning hours.
pub fn parse_window_duration(raw: &str) -> Result<Duration> {
    let s = raw.trim();
    let std_dur = if !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit()) {
        let hours: u64 = s.parse().with_context(|| format!("invalid window {raw:?}"))?;
        std::time::Duration::from_secs(hours.saturating_mul(3_600))
    } else {
        humantime::parse_duration(s).map_err(|e| anyhow!("invalid window {raw:?}: {e}"))?
    };
    if std_dur.is_zero() {
        bail!("window {raw:?} must be longer than zero");
    }
    Duration::from_std(std_dur).with_context(|| format!("window {raw:?} is too large"))
}

/// Parse an explicit `--end` instant (RFC 3339).
pub fn parse_window_end(raw: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw.trim())
        .map(|dt| dt.with_timezone(&Utc))
        .with_context(|| format!("invalid --end {raw:?}; expected RFC 3339"))
}

/// An item that passed the window, with its time in the reporting zone.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportEntry {
    pub item: NormalizedItem,
    pub local_time: DateTime<Tz>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReportSections {
    pub press_releases: Vec<ReportEntry>,
    pub hearings: Vec<ReportEntry>,
}

impl ReportSections {
    pub fn len(&self) -> usize {
        self.press_releases.len() + self.hearings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Keep items inside `window` and order each category by
/// (time, source label, title, link).
pub fn filter_window(items: Vec<NormalizedItem>, window: &ReportWindow, tz: Tz) -> ReportSections {
    let mut sections = ReportSections::default();
    for item in items {
        let local_time = item.timestamp.with_timezone(&tz);
        if !window.contains(&local_time) {
            continue;
        }
        let entry = ReportEntry { item, local_time };
        match entry.item.category {
            Category::PressRelease => sections.press_releases.push(entry),
            Category::Hearing => sections.hearings.push(entry),
        }
    }
    sort_entries(&mut sections.press_releases);
    sort_entries(&mut sections.hearings);
    sections
}

fn sort_entries(v: &mut [ReportEntry]) {
    v.sort_by(|a, b| {
        a.local_time
            .cmp(&b.local_time)
            .then_with(|| a.item.source_label.cmp(&b.item.source_label))
            .then_with(|| a.item.title.cmp(&b.item.title))
            .then_with(|| a.item.link.cmp(&b.item.link))
    });
}
