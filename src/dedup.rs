//! # Dedup tracker
//! Per-provider watermark of the newest publish time ever observed.
//!
//! The watermark follows the first (newest) entry of every fetch, not the newest
//! *accepted* entry, so an older entry reappearing later is never re-accepted.

use std::collections::HashMap;

use chrono::NaiveDateTime;
use parking_lot::Mutex;

use crate::ingest::types::Entry;

#[derive(Debug, Default)]
pub struct Watermarks {
    inner: Mutex<HashMap<String, NaiveDateTime>>,
}

impl Watermarks {
    pub fn new() -> Self {
        Self::default()
    }

    /// True if the provider has no watermark yet or the entry is strictly newer.
    pub fn should_accept(&self, provider: &str, entry: &Entry) -> bool {
        match self.inner.lock().get(provider) {
            None => true,
            Some(seen) => entry.published_at > *seen,
        }
    }

    /// Overwrite the watermark unconditionally.
    pub fn advance(&self, provider: &str, newest_published_at: NaiveDateTime) {
        self.inner
            .lock()
            .insert(provider.to_string(), newest_published_at);
    }

    pub fn get(&self, provider: &str) -> Option<NaiveDateTime> {
        self.inner.lock().get(provider).copied()
    }
}
