// src/ingest/mod.rs
//! Everything on the feed side of the engine: provider lists, fetching,
//! parsing and the poll loop that ties them to the engine.

pub mod config;
pub mod feed;
pub mod http;
pub mod scheduler;
pub mod types;

pub use config::{load_providers_from, FileProviders};
pub use feed::parse_feed;
pub use http::HttpFeedFetcher;
pub use scheduler::PollScheduler;
pub use types::{Entry, FeedFetcher, Provider, ProviderSource, StaticProviders};
