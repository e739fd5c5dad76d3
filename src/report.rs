//! # Report Renderer
//! Markdown rendering of the windowed sections plus the file sink.
//!
//! Output is a pure function of its inputs (no generation timestamp), so
//! re-running a window yields byte-identical text.

use anyhow::{Context, Result};
use chrono_tz::Tz;
use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};

use crate::window::{ReportEntry, ReportSections, ReportWindow};

const TIME_FMT: &str = "%Y-%m-%d %H:%M";
const DATE_FMT: &str = "%Y-%m-%d";

/// Calendar date of the window end in `tz`; names both the heading and the file.
pub fn report_date(window: &ReportWindow, tz: Tz) -> String {
    window.end.with_timezone(&tz).format(DATE_FMT).to_string()
}

pub fn render_markdown(
    title: &str,
    sections: &ReportSections,
    window: &ReportWindow,
    tz: Tz,
) -> String {
    let mut lines: Vec<String> = Vec::new();
    lines.push(format!("# {} — {}", one_line(title), report_date(window, tz)));
    lines.push(String::new());
    lines.push(format!(
        "_Window: {} → {} ({})_",
        window.start().with_timezone(&tz).format(TIME_FMT),
        window.end.with_timezone(&tz).format(TIME_FMT),
        tz.name()
    ));
    lines.push(String::new());

    let label = window.label();
    push_section(
        &mut lines,
        "Press Releases",
        &sections.press_releases,
        &format!("> No new press releases in the last {label}."),
    );
    push_section(
        &mut lines,
        "Hearings",
        &sections.hearings,
        &format!("> No hearings in the last {label}."),
    );

    while lines.last().is_some_and(|l| l.is_empty()) {
        lines.pop();
    }
    let mut out = lines.join("\n");
    out.push('\n');
    out
}

fn push_section(lines: &mut Vec<String>, heading: &str, entries: &[ReportEntry], placeholder: &str) {
    lines.push(format!("## {heading}"));
    lines.push(String::new());
    if entries.is_empty() {
        lines.push(placeholder.to_string());
    } else {
        lines.extend(entries.iter().map(render_entry));
    }
    lines.push(String::new());
}

/// `- **{time}** — {title} — _{source}_ — <{link}>`
pub fn render_entry(entry: &ReportEntry) -> String {
    let mut line = format!(
        "- **{}** — {} — _{}_",
        entry.local_time.format(TIME_FMT),
        one_line(&entry.item.title),
        escape_emphasis(&one_line(&entry.item.source_label))
    );
    let link = autolink_target(&entry.item.link);
    if !link.is_empty() {
        let _ = write!(line, " — <{link}>");
    }
    line
}

/// Collapse any embedded line breaks so one item stays one line.
fn one_line(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Backslash-escape characters that would close or nest the `_..._` span.
fn escape_emphasis(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        if matches!(c, '\\' | '_' | '*') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

/// Autolinks end at whitespace or `>`; drop the former, percent-encode angle brackets.
fn autolink_target(link: &str) -> String {
    link.split_whitespace()
        .flat_map(str::chars)
        .fold(String::with_capacity(link.len()), |mut acc, c| {
            match c {
                '<' => acc.push_str("%3C"),
                '>' => acc.push_str("%3E"),
                c => acc.push(c),
            }
            acc
        })
}

/// Write (or overwrite) `<dir>/<YYYY-MM-DD>.md`.
pub fn write_report(dir: &Path, window: &ReportWindow, tz: Tz, markdown: &str) -> Result<PathBuf> {
    fs::create_dir_all(dir).with_context(|| format!("creating reports dir {}", dir.display()))?;
    let path = dir.join(format!("{}.md", report_date(window, tz)));
    fs::write(&path, markdown).with_context(|| format!("writing report {}", path.display()))?;
    tracing::info!(target: "report", path = %path.display(), bytes = markdown.len(), "report written");
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingest::types::{Category, NormalizedItem};
    use chrono::{DateTime, Duration, TimeZone, Utc};

    fn entry(title: &str, link: &str, ts: &str) -> ReportEntry {
        let timestamp = DateTime::parse_from_rfc3339(ts).unwrap();
        ReportEntry {
            local_time: timestamp.with_timezone(&chrono_tz::America::New_York),
            item: NormalizedItem {
                title: title.into(),
                timestamp,
                source_label: "Mass.gov".into(),
                link: link.into(),
                category: Category::PressRelease,
            },
        }
    }

    #[test]
    fn entry_line_has_time_title_source_link() {
        let e = entry("Budget\nupdate", "https://mass.gov/a", "2024-01-01T14:05:00Z");
        assert_eq!(
            render_entry(&e),
            "- **2024-01-01 09:05** — Budget update — _Mass.gov_ — <https://mass.gov/a>"
        );
    }

    #[test]
    fn entry_without_link_omits_segment() {
        let e = entry("Hearing", "", "2024-01-01T14:05:00Z");
        assert_eq!(render_entry(&e), "- **2024-01-01 09:05** — Hearing — _Mass.gov_");
    }

    #[test]
    fn markdown_specials_in_label_and_link_are_neutralized() {
        let mut e = entry("Notice", "https://mass.gov/a?x=<b>", "2024-01-01T14:05:00Z");
        e.item.source_label = "ma_gov *press*".into();
        assert_eq!(
            render_entry(&e),
            r"- **2024-01-01 09:05** — Notice — _ma\_gov \*press\*_ — <https://mass.gov/a?x=%3Cb%3E>"
        );
    }

    #[test]
    fn date_comes_from_end_in_report_zone() {
        // 03:00 UTC on Jan 2 is still Jan 1 in New York.
        let end = Utc.with_ymd_and_hms(2024, 1, 2, 3, 0, 0).unwrap();
        let w = ReportWindow::new(end, Duration::hours(24)).unwrap();
        assert_eq!(report_date(&w, chrono_tz::America::New_York), "2024-01-01");
    }
}
