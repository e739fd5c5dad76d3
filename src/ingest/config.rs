// src/ingest/config.rs
use anyhow::{anyhow, Context, Result};
use serde::de::IgnoredAny;
use serde::Deserialize;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use crate::ingest::types::Category;

pub const ENV_PATH: &str = "FEEDS_PATH";
pub const DEFAULT_TITLE: &str = "Massachusetts Policy Feed";

const FALLBACK_TOML: &str = "config/feeds.toml";
const FALLBACK_JSON: &str = "config/feeds.json";

/// Source lists for one run. Order is the order of the file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedConfig {
    pub title: String,
    pub press_releases: Vec<String>,
    pub hearings: Vec<String>,
}

impl FeedConfig {
    pub fn urls(&self, category: Category) -> &[String] {
        match category {
            Category::PressRelease => &self.press_releases,
            Category::Hearing => &self.hearings,
        }
    }

    pub fn source_count(&self) -> usize {
        self.press_releases.len() + self.hearings.len()
    }
}

/// Load feed lists from an explicit path. Supports TOML or JSON formats.
pub fn load_feeds_from(path: &Path) -> Result<FeedConfig> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("reading feed list from {}", path.display()))?;
    let ext = path
        .extension()
        .and_then(|s| s.to_str())
        .unwrap_or_default()
        .to_ascii_lowercase();
    parse_feeds(&content, ext.as_str())
        .with_context(|| format!("parsing feed list {}", path.display()))
}

/// Resolve the feed list path:
/// 1) explicit path (CLI)
/// 2) $FEEDS_PATH
/// 3) config/feeds.toml
/// 4) config/feeds.json
pub fn resolve_feeds_path(explicit: Option<&Path>) -> Result<PathBuf> {
    if let Some(p) = explicit {
        return Ok(p.to_path_buf());
    }
    if let Ok(p) = std::env::var(ENV_PATH) {
        let pb = PathBuf::from(p);
        if pb.exists() {
            return Ok(pb);
        }
        return Err(anyhow!(
            "{ENV_PATH} points to non-existent path {}",
            pb.display()
        ));
    }
    for fallback in [FALLBACK_TOML, FALLBACK_JSON] {
        let pb = PathBuf::from(fallback);
        if pb.exists() {
            return Ok(pb);
        }
    }
    Err(anyhow!(
        "no feed list found (pass --feeds, set {ENV_PATH}, or create {FALLBACK_TOML})"
    ))
}

pub fn load_feeds_default(explicit: Option<&Path>) -> Result<FeedConfig> {
    let path = resolve_feeds_path(explicit)?;
    load_feeds_from(&path)
}

fn parse_feeds(s: &str, hint_ext: &str) -> Result<FeedConfig> {
    let raw = match hint_ext {
        "toml" => toml::from_str::<RawFeeds>(s)?,
        "json" => serde_json::from_str::<RawFeeds>(s)?,
        // Unknown extension: TOML first, then JSON.
        _ => match toml::from_str::<RawFeeds>(s) {
            Ok(v) => v,
            Err(_) => serde_json::from_str::<RawFeeds>(s)
                .map_err(|_| anyhow!("unsupported feed list format"))?,
        },
    };
    Ok(raw.into_config())
}

#[derive(Deserialize)]
struct RawFeeds {
    #[serde(default)]
    title: Option<String>,
    #[serde(default, alias = "rss")]
    press_releases: Option<UrlList>,
    #[serde(default, alias = "ics")]
    hearings: Option<UrlList>,
}

/// A category value that is not a list is tolerated and yields no sources.
#[derive(Deserialize)]
#[serde(untagged)]
enum UrlList {
    List(Vec<UrlEntry>),
    Malformed(IgnoredAny),
}

#[derive(Deserialize)]
#[serde(untagged)]
enum UrlEntry {
    Url(String),
    Malformed(IgnoredAny),
}

impl RawFeeds {
    fn into_config(self) -> FeedConfig {
        let title = self
            .title
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .unwrap_or_else(|| DEFAULT_TITLE.to_string());
        FeedConfig {
            title,
            press_releases: clean_list(self.press_releases, Category::PressRelease),
            hearings: clean_list(self.hearings, Category::Hearing),
        }
    }
}

fn clean_list(list: Option<UrlList>, category: Category) -> Vec<String> {
    let entries = match list {
        None => return Vec::new(),
        Some(UrlList::Malformed(_)) => {
            tracing::warn!(target: "ingest", category = category.as_str(), "category is not a list; no sources");
            return Vec::new();
        }
        Some(UrlList::List(v)) => v,
    };

    let mut seen = HashSet::new();
    let mut out = Vec::with_capacity(entries.len());
    for e in entries {
        let UrlEntry::Url(raw) = e else {
            tracing::warn!(target: "ingest", category = category.as_str(), "skipping non-string source entry");
            continue;
        };
        let t = raw.trim();
        if t.is_empty() {
            continue;
        }
        if !is_http_url(t) {
            tracing::warn!(target: "ingest", category = category.as_str(), url = t, "skipping invalid source url");
            continue;
        }
        if seen.insert(t.to_string()) {
            out.push(t.to_string());
        }
    }
    out
}

fn is_http_url(s: &str) -> bool {
    url::Url::parse(s)
        .map(|u| matches!(u.scheme(), "http" | "https") && u.host_str().is_some())
        .unwrap_or(false)
}
