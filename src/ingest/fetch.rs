// src/ingest/fetch.rs
use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;

use crate::ingest::types::{SourceError, SourceFetcher};

const MAX_BACKOFF_SHIFT: u32 = 6;
const USER_AGENT: &str = concat!("policy-feed/", env!("CARGO_PKG_VERSION"));

#[derive(Clone)]
pub struct HttpFetcher {
    client: Client,
    timeout: Duration,
    max_retries: u8,
    backoff_base: Duration,
}

impl HttpFetcher {
    pub fn new() -> Result<Self, SourceError> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| SourceError::Fetch(format!("building http client: {e}")))?;
        Ok(Self {
            client,
            timeout: Duration::from_secs(30),
            max_retries: 2,
            backoff_base: Duration::from_millis(500),
        })
    }

    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout = Duration::from_secs(secs);
        self
    }

    pub fn with_retries(mut self, retries: u8) -> Self {
        self.max_retries = retries;
        self
    }

    pub fn with_backoff(mut self, base: Duration) -> Self {
        self.backoff_base = base;
        self
    }

    /// Delay before retry number `attempt` (1-based); doubling stops at 64x the base.
    fn backoff_delay(&self, attempt: u32) -> Duration {
        let shift = attempt.saturating_sub(1).min(MAX_BACKOFF_SHIFT);
        self.backoff_base * (1u32 << shift)
    }

    async fn fetch_once(&self, url: &str) -> Result<String, SourceError> {
        let rsp = self
            .client
            .get(url)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| SourceError::Fetch(e.to_string()))?;

        let status = rsp.status();
        if !status.is_success() {
            return Err(SourceError::Status {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }
        rsp.text()
            .await
            .map_err(|e| SourceError::Fetch(format!("reading body: {e}")))
    }
}

#[async_trait]
impl SourceFetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<String, SourceError> {
        let mut attempt: u32 = 0;
        loop {
            attempt += 1;
            match self.fetch_once(url).await {
                Ok(body) => return Ok(body),
                Err(e) if e.is_retryable() && attempt <= u32::from(self.max_retries) => {
                    let delay = self.backoff_delay(attempt);
                    tracing::debug!(target: "ingest", %url, attempt, error = %e, ?delay, "retrying source");
                    tokio::time::sleep(delay).await;
                }
                Err(e) => return Err(e),
            }
        }
    }

    fn name(&self) -> &'static str {
        "http"
    }
}

/// Serves bodies from memory. URLs without a fixture fail like an unreachable host.
#[derive(Debug, Default, Clone)]
pub struct FixtureFetcher {
    bodies: HashMap<String, String>,
}

impl FixtureFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, url: &str, body: &str) -> Self {
        self.bodies.insert(url.to_string(), body.to_string());
        self
    }
}

#[async_trait]
impl SourceFetcher for FixtureFetcher {
    async fn fetch(&self, url: &str) -> Result<String, SourceError> {
        self.bodies
            .get(url)
            .cloned()
            .ok_or_else(|| SourceError::Fetch(format!("no fixture for {url}")))
    }

    fn name(&self) -> &'static str {
        "fixture"
    }
}
