// src/ingest/types.rs
use async_trait::async_trait;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::error::FeedError;

/// One tracked status feed. `name` is the unique key across all engine state.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Provider {
    pub name: String,
    #[serde(rename = "rss", alias = "feed_url")]
    pub feed_url: String,
}

impl Provider {
    pub fn new(name: impl Into<String>, feed_url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            feed_url: feed_url.into(),
        }
    }
}

/// Raw status item as returned by a feed source, newest-first within one fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    pub title: String,
    pub summary: String, // may carry HTML markup
    pub published_at: NaiveDateTime, // UTC, second precision
}

/// Fetch-and-parse capability for a single provider's feed.
#[async_trait]
pub trait FeedFetcher: Send + Sync {
    async fn fetch(&self, provider: &Provider) -> Result<Vec<Entry>, FeedError>;
}

/// Snapshot of the provider list, taken once at the start of every tick.
pub trait ProviderSource: Send + Sync {
    fn providers(&self) -> Vec<Provider>;
}

/// Fixed provider list, for tests and embedded setups.
#[derive(Debug, Clone, Default)]
pub struct StaticProviders(pub Vec<Provider>);

impl ProviderSource for StaticProviders {
    fn providers(&self) -> Vec<Provider> {
        self.0.clone()
    }
}
