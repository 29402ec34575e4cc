//! # Update Engine
//! Per-provider pipeline (fetch → dedup → history → broadcast) and one poll
//! tick over all providers.
//!
//! Failures are scoped: a provider whose fetch fails this tick contributes zero
//! accepted entries and leaves every other provider's state untouched.

use std::sync::Arc;
use std::time::Instant;

use chrono::{NaiveDateTime, SubsecRound, Utc};
use futures_util::future::join_all;
use metrics::{counter, describe_counter, describe_gauge, describe_histogram, gauge, histogram};
use once_cell::sync::OnceCell;

use crate::dedup::Watermarks;
use crate::format::{format_entry, format_record};
use crate::history::HistoryStore;
use crate::ingest::types::{FeedFetcher, Provider};
use crate::subscribers::SubscriberRegistry;

pub const TEST_EVENT_PROVIDER: &str = "System Test";
pub const TEST_EVENT_TITLE: &str = "Manual Trigger";
pub const TEST_EVENT_SUMMARY: &str =
    "Status: Investigating This is a simulated event to test the WebSocket connection.";

/// One-time metrics registration (so series show up on /metrics).
fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!("feed_fetch_errors_total", "Provider fetch/parse errors.");
        describe_counter!(
            "feed_entries_accepted_total",
            "Entries that passed the watermark and were recorded."
        );
        describe_counter!(
            "broadcast_delivery_failures_total",
            "Pushes to subscribers that failed and were dropped."
        );
        describe_counter!("poll_ticks_total", "Completed poll ticks.");
        describe_gauge!("subscribers_connected", "Currently registered subscribers.");
        describe_gauge!("poll_last_tick_ts", "Unix ts when the last poll tick finished.");
        describe_histogram!("poll_tick_ms", "Poll tick wall time in milliseconds.");
        describe_histogram!("feed_fetch_ms", "Feed fetch + parse time in milliseconds.");
    });
}

/// What happened to one provider during one tick.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderOutcome {
    pub provider: String,
    pub fetched: usize,
    pub accepted: Vec<String>,
    pub error: Option<String>,
}

impl ProviderOutcome {
    pub fn is_failure(&self) -> bool {
        self.error.is_some()
    }
}

#[derive(Debug, Clone, Default)]
pub struct TickReport {
    pub outcomes: Vec<ProviderOutcome>,
}

impl TickReport {
    pub fn accepted(&self) -> usize {
        self.outcomes.iter().map(|o| o.accepted.len()).sum()
    }

    pub fn failed(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_failure()).count()
    }
}

/// Owns the shared watermark and history state and drives the pipeline.
pub struct UpdateEngine {
    fetcher: Arc<dyn FeedFetcher>,
    watermarks: Watermarks,
    history: HistoryStore,
    subscribers: Arc<SubscriberRegistry>,
}

impl UpdateEngine {
    pub fn new(
        fetcher: Arc<dyn FeedFetcher>,
        subscribers: Arc<SubscriberRegistry>,
        history_limit: usize,
    ) -> Self {
        ensure_metrics_described();
        Self {
            fetcher,
            watermarks: Watermarks::new(),
            history: HistoryStore::with_capacity(history_limit),
            subscribers,
        }
    }

    pub fn watermarks(&self) -> &Watermarks {
        &self.watermarks
    }

    pub fn history(&self) -> &HistoryStore {
        &self.history
    }

    pub fn subscribers(&self) -> &Arc<SubscriberRegistry> {
        &self.subscribers
    }

    /// Fetch one provider and record/broadcast whatever is new.
    pub async fn process_provider(&self, provider: &Provider) -> ProviderOutcome {
        let name = provider.name.as_str();
        let entries = match self.fetcher.fetch(provider).await {
            Ok(entries) => entries,
            Err(e) => {
                tracing::warn!(provider = name, error = %e, "provider error");
                counter!("feed_fetch_errors_total", "provider" => name.to_string()).increment(1);
                return ProviderOutcome {
                    provider: name.to_string(),
                    fetched: 0,
                    accepted: Vec::new(),
                    error: Some(e.to_string()),
                };
            }
        };

        let mut accepted = Vec::new();
        for entry in &entries {
            if !self.watermarks.should_accept(name, entry) {
                continue;
            }
            let record = format_entry(name, entry);
            self.record_and_broadcast(name, accepted.len(), &record);
            accepted.push(record);
        }

        if let Some(newest) = entries.first() {
            self.watermarks.advance(name, newest.published_at);
        }

        counter!("feed_entries_accepted_total").increment(accepted.len() as u64);
        ProviderOutcome {
            provider: name.to_string(),
            fetched: entries.len(),
            accepted,
            error: None,
        }
    }

    /// Run the pipeline for every provider concurrently and wait for all of them.
    pub async fn run_tick(&self, providers: &[Provider]) -> TickReport {
        let t0 = Instant::now();
        let outcomes = join_all(providers.iter().map(|p| self.process_provider(p))).await;
        let report = TickReport { outcomes };

        histogram!("poll_tick_ms").record(t0.elapsed().as_secs_f64() * 1_000.0);
        counter!("poll_ticks_total").increment(1);
        gauge!("poll_last_tick_ts").set(Utc::now().timestamp() as f64);
        report
    }

    /// Record and push a synthetic update, bypassing the watermark.
    pub fn publish_manual(
        &self,
        provider: &str,
        title: &str,
        summary: &str,
        at: NaiveDateTime,
    ) -> String {
        let record = format_record(provider, title, summary, &at);
        self.record_and_broadcast(provider, 0, &record);
        record
    }

    /// The canned `/test-event` update, stamped with the current time.
    pub fn publish_test_event(&self) -> String {
        let now = Utc::now().naive_utc().trunc_subsecs(0);
        self.publish_manual(TEST_EVENT_PROVIDER, TEST_EVENT_TITLE, TEST_EVENT_SUMMARY, now)
    }

    // History first, then subscribers: a client that reconnects right after a
    // push always finds the record in history.
    fn record_and_broadcast(&self, provider: &str, position: usize, record: &str) {
        self.history.insert(provider, position, record.to_string());
        tracing::info!(target: "updates", provider, "{}", record.trim_end());
        let report = self.subscribers.broadcast(record);
        if report.failed > 0 {
            tracing::debug!(
                provider,
                delivered = report.delivered,
                failed = report.failed,
                "broadcast partially failed"
            );
        }
    }
}
