// src/ingest/providers/feed.rs
//! Press-release feeds: RSS 2.0, RSS 1.0 (RDF) and Atom.

use quick_xml::de::from_str;
use quick_xml::events::Event;
use quick_xml::Reader;
use serde::Deserialize;

use super::{parse_timestamp, url_host, ParsedSource};
use crate::ingest::normalize_text;
use crate::ingest::types::{Category, NormalizedItem, SourceError};

const UNTITLED: &str = "(untitled)";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FeedKind {
    Rss,
    Rdf,
    Atom,
}

/* ----------------------------
RSS 2.0 / RSS 1.0
---------------------------- */

#[derive(Debug, Deserialize)]
struct Rss {
    channel: RssChannel,
}

#[derive(Debug, Deserialize)]
struct Rdf {
    channel: Option<RssChannel>,
    #[serde(rename = "item", default)]
    item: Vec<RssItem>,
}

#[derive(Debug, Deserialize)]
struct RssChannel {
    title: Option<String>,
    #[serde(rename = "item", default)]
    item: Vec<RssItem>,
}

#[derive(Debug, Deserialize)]
struct RssItem {
    title: Option<String>,
    // `<link>` and a stray `<atom:link/>` may share a key, so collect all of them.
    #[serde(rename = "link", default)]
    link: Vec<TextNode>,
    #[serde(rename = "pubDate")]
    pub_date: Option<String>,
    #[serde(alias = "dc:date")]
    date: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TextNode {
    #[serde(rename = "$text", default)]
    value: String,
}

/* ----------------------------
Atom
---------------------------- */

#[derive(Debug, Deserialize)]
struct AtomFeed {
    title: Option<TextNode>,
    #[serde(rename = "entry", default)]
    entry: Vec<AtomEntry>,
}

#[derive(Debug, Deserialize)]
struct AtomEntry {
    title: Option<TextNode>,
    #[serde(rename = "link", default)]
    link: Vec<AtomLink>,
    published: Option<String>,
    updated: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AtomLink {
    #[serde(rename = "@href", default)]
    href: String,
    #[serde(rename = "@rel")]
    rel: Option<String>,
}

/// Source-agnostic view of one entry before it becomes a `NormalizedItem`.
struct RawEntry {
    title: Option<String>,
    link: Option<String>,
    /// Candidate timestamps, most preferred first.
    times: [Option<String>; 2],
}

impl From<RssItem> for RawEntry {
    fn from(it: RssItem) -> Self {
        let link = it
            .link
            .into_iter()
            .map(|l| l.value)
            .find(|v| !v.trim().is_empty());
        RawEntry {
            title: it.title,
            link,
            times: [it.pub_date, it.date],
        }
    }
}

impl From<AtomEntry> for RawEntry {
    fn from(it: AtomEntry) -> Self {
        let alternate = it
            .link
            .iter()
            .position(|l| matches!(l.rel.as_deref(), None | Some("alternate")));
        let link = it
            .link
            .into_iter()
            .nth(alternate.unwrap_or(0))
            .map(|l| l.href);
        RawEntry {
            title: it.title.map(|t| t.value),
            link,
            times: [it.published, it.updated],
        }
    }
}

/// Parse a press-release feed into normalized items.
pub fn parse_feed(body: &str, url: &str) -> Result<ParsedSource, SourceError> {
    let xml = scrub_html_entities_for_xml(body.trim_start_matches('\u{feff}'));

    let (feed_title, entries): (Option<String>, Vec<RawEntry>) = match detect_kind(&xml)? {
        FeedKind::Rss => {
            let rss: Rss = from_str(&xml).map_err(|e| SourceError::parse(format!("rss: {e}")))?;
            (rss.channel.title, collect_entries(rss.channel.item))
        }
        FeedKind::Rdf => {
            let rdf: Rdf = from_str(&xml).map_err(|e| SourceError::parse(format!("rdf: {e}")))?;
            (rdf.channel.and_then(|c| c.title), collect_entries(rdf.item))
        }
        FeedKind::Atom => {
            let atom: AtomFeed =
                from_str(&xml).map_err(|e| SourceError::parse(format!("atom: {e}")))?;
            (atom.title.map(|t| t.value), collect_entries(atom.entry))
        }
    };

    let source_label = feed_title
        .as_deref()
        .map(normalize_text)
        .filter(|t| !t.is_empty())
        .unwrap_or_else(|| url_host(url));

    let mut out = ParsedSource {
        source_label: source_label.clone(),
        items: Vec::with_capacity(entries.len()),
        dropped: 0,
    };
    for e in entries {
        let Some(timestamp) = e.times.iter().flatten().find_map(|t| parse_timestamp(t)) else {
            tracing::debug!(target: "ingest", %url, title = ?e.title, "entry without usable timestamp dropped");
            out.dropped += 1;
            continue;
        };
        let title = e.title.as_deref().map(normalize_text).unwrap_or_default();
        out.items.push(NormalizedItem {
            title: if title.is_empty() { UNTITLED.to_string() } else { title },
            timestamp,
            source_label: source_label.clone(),
            link: e.link.as_deref().map(str::trim).unwrap_or_default().to_string(),
            category: Category::PressRelease,
        });
    }
    Ok(out)
}

fn collect_entries<T: Into<RawEntry>>(items: Vec<T>) -> Vec<RawEntry> {
    items.into_iter().map(Into::into).collect()
}

/// Look at the root element to pick the dialect.
fn detect_kind(xml: &str) -> Result<FeedKind, SourceError> {
    let mut reader = Reader::from_str(xml);
    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) | Ok(Event::Empty(e)) => {
                return match e.local_name().as_ref() {
                    b"rss" => Ok(FeedKind::Rss),
                    b"RDF" => Ok(FeedKind::Rdf),
                    b"feed" => Ok(FeedKind::Atom),
                    other => Err(SourceError::Parse(format!(
                        "unrecognized feed root <{}>",
                        String::from_utf8_lossy(other)
                    ))),
                };
            }
            Ok(Event::Eof) => return Err(SourceError::Parse("empty document".into())),
            Ok(_) => continue,
            Err(e) => return Err(SourceError::parse(format!("xml: {e}"))),
        }
    }
}

/// HTML named entities are not valid XML; turn the common ones into numeric
/// references so the XML parser accepts them (decoded later by `normalize_text`).
fn scrub_html_entities_for_xml(s: &str) -> String {
    const ENTITIES: &[(&str, &str)] = &[
        ("&nbsp;", "&#160;"),
        ("&ndash;", "&#8211;"),
        ("&mdash;", "&#8212;"),
        ("&lsquo;", "&#8216;"),
        ("&rsquo;", "&#8217;"),
        ("&ldquo;", "&#8220;"),
        ("&rdquo;", "&#8221;"),
        ("&hellip;", "&#8230;"),
        ("&middot;", "&#183;"),
        ("&bull;", "&#8226;"),
        ("&copy;", "&#169;"),
        ("&reg;", "&#174;"),
        ("&trade;", "&#8482;"),
    ];
    let mut out = s.to_string();
    for (from, to) in ENTITIES {
        if out.contains(from) {
            out = out.replace(from, to);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    const RSS: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0" xmlns:dc="http://purl.org/dc/elements/1.1/">
  <channel>
    <title>Governor&nbsp;Press Office</title>
    <link>https://www.mass.gov/news</link>
    <item>
      <title>Governor signs &ldquo;housing&rdquo; bill</title>
      <link>https://www.mass.gov/news/a</link>
      <pubDate>Mon, 01 Jan 2024 23:30:00 -0500</pubDate>
    </item>
    <item>
      <title><![CDATA[Budget <em>update</em>]]></title>
      <link>https://www.mass.gov/news/b</link>
      <dc:date>2024-01-01T12:00:00Z</dc:date>
    </item>
    <item>
      <title>No date at all</title>
      <link>https://www.mass.gov/news/c</link>
    </item>
  </channel>
</rss>"#;

    #[test]
    fn rss_maps_fields_and_drops_undated() {
        let out = parse_feed(RSS, "https://www.mass.gov/feed").unwrap();
        assert_eq!(out.source_label, "Governor Press Office");
        assert_eq!(out.items.len(), 2);
        assert_eq!(out.dropped, 1);

        let a = &out.items[0];
        assert_eq!(a.title, r#"Governor signs "housing" bill"#);
        assert_eq!(a.link, "https://www.mass.gov/news/a");
        assert_eq!(a.timestamp.to_rfc3339(), "2024-01-01T23:30:00-05:00");
        assert_eq!(a.category, Category::PressRelease);

        assert_eq!(out.items[1].title, "Budget update");
    }

    #[test]
    fn atom_prefers_alternate_link_and_published() {
        let atom = r#"<feed xmlns="http://www.w3.org/2005/Atom">
  <title type="text">Senate News</title>
  <entry>
    <title type="html">Session &amp; schedule</title>
    <link rel="self" href="https://senate.test/self/1"/>
    <link rel="alternate" href="https://senate.test/news/1"/>
    <published>2024-01-01T09:00:00-05:00</published>
    <updated>2024-01-01T10:00:00-05:00</updated>
  </entry>
  <entry>
    <title>Updated only</title>
    <link href="https://senate.test/news/2"/>
    <updated>2024-01-01T11:00:00-05:00</updated>
  </entry>
</feed>"#;
        let out = parse_feed(atom, "https://senate.test/atom").unwrap();
        assert_eq!(out.source_label, "Senate News");
        assert_eq!(out.items.len(), 2);
        assert_eq!(out.items[0].title, "Session & schedule");
        assert_eq!(out.items[0].link, "https://senate.test/news/1");
        assert_eq!(out.items[0].timestamp.to_rfc3339(), "2024-01-01T09:00:00-05:00");
        assert_eq!(out.items[1].timestamp.to_rfc3339(), "2024-01-01T11:00:00-05:00");
    }

    #[test]
    fn atom_links_split_by_other_elements() {
        let atom = r#"<feed xmlns="http://www.w3.org/2005/Atom">
  <title>Blog</title>
  <entry>
    <title>Hearing recap</title>
    <link rel="alternate" type="text/html" href="https://blog.test/recap"/>
    <id>https://blog.test/?p=12</id>
    <link rel="replies" type="text/html" href="https://blog.test/recap#comments"/>
    <published>2024-01-01T09:00:00-05:00</published>
  </entry>
</feed>"#;
        let out = parse_feed(atom, "https://blog.test/feed/atom").unwrap();
        assert_eq!(out.items.len(), 1);
        assert_eq!(out.items[0].link, "https://blog.test/recap");
    }

    #[test]
    fn rss_items_split_by_channel_elements() {
        let rss = r#"<rss version="2.0" xmlns:atom="http://www.w3.org/2005/Atom"><channel>
  <title>House Clerk</title>
  <item><title>First</title><link>https://house.test/1</link><pubDate>Mon, 01 Jan 2024 08:00:00 -0500</pubDate></item>
  <atom:link href="https://house.test/rss" rel="self" type="application/rss+xml"/>
  <item><title>Second</title><link>https://house.test/2</link><pubDate>Mon, 01 Jan 2024 09:00:00 -0500</pubDate></item>
  <lastBuildDate>Mon, 01 Jan 2024 10:00:00 -0500</lastBuildDate>
  <item><title>Third</title><link>https://house.test/3</link><pubDate>Mon, 01 Jan 2024 10:00:00 -0500</pubDate></item>
</channel></rss>"#;
        let out = parse_feed(rss, "https://house.test/rss").unwrap();
        let titles: Vec<&str> = out.items.iter().map(|i| i.title.as_str()).collect();
        assert_eq!(titles, vec!["First", "Second", "Third"]);
    }

    #[test]
    fn rdf_items_live_next_to_channel() {
        let rdf = r#"<rdf:RDF xmlns:rdf="http://www.w3.org/1999/02/22-rdf-syntax-ns#" xmlns="http://purl.org/rss/1.0/" xmlns:dc="http://purl.org/dc/elements/1.1/">
  <channel><title></title></channel>
  <item>
    <title>Bill H.1 introduced</title>
    <link>https://legiscan.test/H1</link>
    <dc:date>2024-01-01T08:00:00-05:00</dc:date>
  </item>
</rdf:RDF>"#;
        let out = parse_feed(rdf, "https://legiscan.test/rss").unwrap();
        // Empty channel title falls back to the URL host.
        assert_eq!(out.source_label, "legiscan.test");
        assert_eq!(out.items.len(), 1);
    }

    #[test]
    fn non_feed_is_a_parse_error() {
        let err = parse_feed("<html><body>Not found</body></html>", "https://x.test").unwrap_err();
        assert!(matches!(err, SourceError::Parse(_)));
        assert!(parse_feed("", "https://x.test").is_err());
    }

    #[test]
    fn naive_timestamp_is_dropped() {
        let rss = r#"<rss><channel><title>T</title>
<item><title>a</title><pubDate>2024-01-01T10:00:00</pubDate></item>
</channel></rss>"#;
        let out = parse_feed(rss, "https://x.test").unwrap();
        assert!(out.items.is_empty());
        assert_eq!(out.dropped, 1);
    }
}
