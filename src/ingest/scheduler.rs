// src/ingest/scheduler.rs
use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::engine::UpdateEngine;
use crate::ingest::types::ProviderSource;

/// Drives the engine: poll all providers, wait `interval`, repeat.
///
/// The interval is measured from the end of one tick to the start of the next.
/// Cancellation stops the loop before the next tick; a tick already running is
/// allowed to finish.
pub struct PollScheduler {
    engine: Arc<UpdateEngine>,
    source: Arc<dyn ProviderSource>,
    interval: Duration,
}

impl PollScheduler {
    pub fn new(
        engine: Arc<UpdateEngine>,
        source: Arc<dyn ProviderSource>,
        interval: Duration,
    ) -> Self {
        Self {
            engine,
            source,
            interval,
        }
    }

    pub fn spawn(self, cancel: CancellationToken) -> JoinHandle<()> {
        tokio::spawn(self.run(cancel))
    }

    pub async fn run(self, cancel: CancellationToken) {
        tracing::info!(
            target: "poll",
            interval_secs = self.interval.as_secs_f64(),
            "poll scheduler started"
        );
        let mut tick: u64 = 0;

        while !cancel.is_cancelled() {
            tick += 1;
            let providers = self.source.providers();
            if providers.is_empty() {
                tracing::debug!(target: "poll", tick, "no providers configured");
            } else {
                let report = self.engine.run_tick(&providers).await;
                tracing::info!(
                    target: "poll",
                    tick,
                    providers = providers.len(),
                    accepted = report.accepted(),
                    failed = report.failed(),
                    "poll tick"
                );
            }

            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = tokio::time::sleep(self.interval) => {}
            }
        }

        tracing::info!(target: "poll", ticks = tick, "poll scheduler stopped");
    }
}
