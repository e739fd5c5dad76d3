// src/lib.rs
// Public library surface for the binary and integration tests.

pub mod ingest;
pub mod pipeline;
pub mod report;
pub mod telemetry;
pub mod window;

// ---- Re-exports for stable public API ----
pub use crate::ingest::config::{load_feeds_default, load_feeds_from, FeedConfig};
pub use crate::ingest::fetch::{FixtureFetcher, HttpFetcher};
pub use crate::ingest::types::{Category, NormalizedItem, SourceError, SourceFetcher};
pub use crate::pipeline::{build_report, ReportStats};
pub use crate::report::{render_markdown, write_report};
pub use crate::window::{filter_window, ReportWindow, REPORT_TZ};
