// src/ingest/types.rs
use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

/// Which report section a source feeds into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    PressRelease,
    Hearing,
}

impl Category {
    pub fn as_str(self) -> &'static str {
        match self {
            Category::PressRelease => "press_release",
            Category::Hearing => "hearing",
        }
    }
}

/// One dated entry from any source, reduced to the common shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormalizedItem {
    pub title: String,
    /// Absolute instant; keeps the offset the source stated.
    pub timestamp: DateTime<FixedOffset>,
    pub source_label: String, // feed/calendar title, or URL host
    pub link: String,         // may be empty for calendar events
    pub category: Category,
}

/// A source that failed as a whole (fetch or parse). The run keeps going.
#[derive(Debug)]
pub struct SourceFailure {
    pub url: String,
    pub category: Category,
    pub error: SourceError,
}

#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    #[error("fetch failed: {0}")]
    Fetch(String),

    #[error("HTTP {status} from {url}")]
    Status { status: u16, url: String },

    #[error("parse failed: {0}")]
    Parse(String),
}

impl SourceError {
    pub fn parse(e: impl std::fmt::Display) -> Self {
        SourceError::Parse(e.to_string())
    }

    /// Transport errors and 5xx are worth another attempt; everything else is final.
    pub fn is_retryable(&self) -> bool {
        match self {
            SourceError::Fetch(_) => true,
            SourceError::Status { status, .. } => *status >= 500,
            SourceError::Parse(_) => false,
        }
    }
}

#[async_trait::async_trait]
pub trait SourceFetcher: Send + Sync {
    /// Return the raw body behind `url`.
    async fn fetch(&self, url: &str) -> Result<String, SourceError>;
    fn name(&self) -> &'static str;
}
