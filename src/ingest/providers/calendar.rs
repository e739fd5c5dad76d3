// src/ingest/providers/calendar.rs
//! Hearing calendars (ICS) via the icalendar crate's parser.

use chrono::{DateTime, FixedOffset, NaiveDateTime, TimeZone};
use chrono_tz::Tz;
use icalendar::parser::{read_calendar, unfold, Component};
use icalendar::{CalendarDateTime, DatePerhapsTime};

use super::{url_host, ParsedSource};
use crate::ingest::normalize_text;
use crate::ingest::types::{Category, NormalizedItem, SourceError};

const NO_TITLE: &str = "(no title)";

/// Parse an ICS calendar into normalized items.
///
/// Floating and date-only `DTSTART` values are read in `tz`, date-only events
/// at noon so they stay on their calendar day.
pub fn parse_calendar(body: &str, url: &str, tz: Tz) -> Result<ParsedSource, SourceError> {
    let body = body.trim_start_matches('\u{feff}');
    if !body.trim_start().to_ascii_uppercase().starts_with("BEGIN:VCALENDAR") {
        return Err(SourceError::Parse("not an iCalendar document".into()));
    }
    let unfolded = unfold(body);
    let calendar = read_calendar(&unfolded).map_err(|e| SourceError::parse(format!("ics: {e}")))?;

    let calendar_name = ["X-WR-CALNAME", "NAME"].iter().find_map(|key| {
        calendar
            .properties
            .iter()
            .find(|p| p.name == *key)
            .map(|p| normalize_text(&unescape_text(p.val.as_ref())))
            .filter(|n| !n.is_empty())
    });
    let source_label = calendar_name.unwrap_or_else(|| url_host(url));

    let mut out = ParsedSource {
        source_label: source_label.clone(),
        ..Default::default()
    };
    for vevent in calendar.components.iter().filter(|c| c.name == "VEVENT") {
        let Some(timestamp) = event_start(vevent, tz) else {
            tracing::debug!(target: "ingest", %url, "event without usable DTSTART dropped");
            out.dropped += 1;
            continue;
        };
        let title = vevent
            .find_prop("SUMMARY")
            .map(|p| normalize_text(&unescape_text(p.val.as_ref())))
            .unwrap_or_default();
        let link = vevent
            .find_prop("URL")
            .map(|p| p.val.as_ref().trim().to_string())
            .unwrap_or_default();

        out.items.push(NormalizedItem {
            title: if title.is_empty() { NO_TITLE.to_string() } else { title },
            timestamp,
            source_label: source_label.clone(),
            link,
            category: Category::Hearing,
        });
    }
    Ok(out)
}

fn event_start(vevent: &Component<'_>, tz: Tz) -> Option<DateTime<FixedOffset>> {
    let start = DatePerhapsTime::try_from(vevent.find_prop("DTSTART")?).ok()?;
    match start {
        DatePerhapsTime::Date(d) => in_zone(tz, d.and_hms_opt(12, 0, 0)?),
        DatePerhapsTime::DateTime(CalendarDateTime::Utc(dt)) => Some(dt.fixed_offset()),
        DatePerhapsTime::DateTime(CalendarDateTime::Floating(naive)) => in_zone(tz, naive),
        DatePerhapsTime::DateTime(CalendarDateTime::WithTimezone { date_time, tzid }) => {
            let zone: Tz = tzid.trim_matches(|c| c == '"' || c == '/').parse().ok()?;
            in_zone(zone, date_time)
        }
    }
}

/// Local wall time in `zone`. Ambiguous times (DST fall-back) take the earlier
/// instant; nonexistent ones (spring-forward gap) are dropped.
fn in_zone(zone: Tz, naive: NaiveDateTime) -> Option<DateTime<FixedOffset>> {
    zone.from_local_datetime(&naive)
        .earliest()
        .map(|dt| dt.fixed_offset())
}

/// Undo RFC 5545 TEXT escaping (`\,` `\;` `\\` `\n`).
fn unescape_text(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut chars = s.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') | Some('N') => out.push(' '),
            Some(other) => out.push(other),
            None => out.push('\\'),
        }
    }
    out
}
