// src/lib.rs
// Public library surface for the binary and integration tests.

pub mod api;
pub mod config;
pub mod dedup;
pub mod engine;
pub mod error;
pub mod format;
pub mod history;
pub mod ingest;
pub mod subscribers;
pub mod telemetry;

// ---- Re-exports for stable public API ----
pub use crate::api::{router, AppState};
pub use crate::config::AppConfig;
pub use crate::engine::{ProviderOutcome, TickReport, UpdateEngine};
pub use crate::error::{DeliveryError, FeedError};
pub use crate::ingest::{Entry, FeedFetcher, PollScheduler, Provider, ProviderSource};
pub use crate::subscribers::{Subscriber, SubscriberId, SubscriberRegistry};

use std::sync::Arc;

use crate::ingest::{FileProviders, HttpFeedFetcher};

/// Everything the binary runs, wired from one `AppConfig`.
pub struct Service {
    pub scheduler: PollScheduler,
    pub state: AppState,
}

impl Service {
    /// HTTP fetcher + file-backed provider list, as used in production.
    pub fn from_config(cfg: &AppConfig) -> Self {
        let fetcher = Arc::new(HttpFeedFetcher::new(cfg.fetch_timeout));
        let source = Arc::new(FileProviders::new(cfg.providers_path.clone()));
        Self::with_parts(fetcher, source, cfg)
    }

    pub fn with_parts(
        fetcher: Arc<dyn FeedFetcher>,
        source: Arc<dyn ProviderSource>,
        cfg: &AppConfig,
    ) -> Self {
        let subscribers = Arc::new(SubscriberRegistry::new());
        let engine = Arc::new(UpdateEngine::new(fetcher, subscribers, cfg.history_limit));
        let scheduler = PollScheduler::new(Arc::clone(&engine), source, cfg.poll_interval);
        let state = AppState::new(engine);
        Self { scheduler, state }
    }
}
