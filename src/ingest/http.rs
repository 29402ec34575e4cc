// src/ingest/http.rs
use std::time::{Duration, Instant};

use async_trait::async_trait;
use metrics::histogram;

use crate::error::FeedError;
use crate::ingest::feed::parse_feed;
use crate::ingest::types::{Entry, FeedFetcher, Provider};

const USER_AGENT: &str = concat!("status-relay/", env!("CARGO_PKG_VERSION"));

/// Fetches provider feeds over HTTP with a per-request timeout.
#[derive(Clone)]
pub struct HttpFeedFetcher {
    client: reqwest::Client,
    timeout: Duration,
}

impl HttpFeedFetcher {
    pub fn new(timeout: Duration) -> Self {
        Self {
            client: reqwest::Client::new(),
            timeout,
        }
    }

    async fn get_and_parse(&self, provider: &Provider) -> Result<Vec<Entry>, FeedError> {
        let resp = self
            .client
            .get(&provider.feed_url)
            .header(reqwest::header::USER_AGENT, USER_AGENT)
            .timeout(self.timeout)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            return Err(FeedError::Status {
                status: status.as_u16(),
            });
        }

        let body = resp.text().await?;
        parse_feed(&body)
    }
}

#[async_trait]
impl FeedFetcher for HttpFeedFetcher {
    async fn fetch(&self, provider: &Provider) -> Result<Vec<Entry>, FeedError> {
        let t0 = Instant::now();
        let result = self.get_and_parse(provider).await;
        record_fetch(provider, t0.elapsed(), &result);
        result
    }
}

/// Every attempt lands in `feed_fetch_ms`, labelled by outcome, so timeouts and
/// error pages show up next to successful fetches.
fn record_fetch(
    provider: &Provider,
    elapsed: Duration,
    result: &Result<Vec<Entry>, FeedError>,
) {
    let ms = elapsed.as_secs_f64() * 1_000.0;
    let outcome = if result.is_ok() { "ok" } else { "error" };
    histogram!("feed_fetch_ms", "outcome" => outcome).record(ms);

    match result {
        Ok(entries) => tracing::debug!(
            provider = %provider.name,
            entries = entries.len(),
            elapsed_ms = ms,
            "feed fetched"
        ),
        Err(e) => tracing::debug!(
            provider = %provider.name,
            error = %e,
            elapsed_ms = ms,
            "feed fetch failed"
        ),
    }
}
