//! Error types for the feed and delivery edges of the engine.
//!
//! Both are scoped to a single provider or subscriber and are caught where they
//! occur; neither ever reaches the poll loop.

use thiserror::Error;

/// Failure to obtain entries for one provider during one tick.
#[derive(Debug, Error)]
pub enum FeedError {
    /// Network, TLS or timeout failure while reaching the feed source.
    #[error("fetch failed: {0}")]
    Fetch(#[from] reqwest::Error),

    /// The feed source answered with a non-success HTTP status.
    #[error("feed source answered with HTTP {status}")]
    Status { status: u16 },

    /// The body could not be read as an RSS or Atom document.
    #[error("parse failed: {0}")]
    Parse(String),
}

impl FeedError {
    pub fn parse(reason: impl Into<String>) -> Self {
        Self::Parse(reason.into())
    }
}

/// Failure to push one message to one subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum DeliveryError {
    /// The remote side is gone.
    #[error("subscriber closed")]
    Closed,

    /// The subscriber's outbound queue is full; the message was dropped for it.
    #[error("subscriber is lagging, message dropped")]
    Lagging,
}
