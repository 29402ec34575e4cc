//! Bounded in-memory record of formatted updates per provider.

use std::collections::{BTreeMap, VecDeque};

use parking_lot::RwLock;

/// Per-provider history, newest-first, at most `cap` records per provider.
#[derive(Debug)]
pub struct HistoryStore {
    inner: RwLock<BTreeMap<String, VecDeque<String>>>,
    cap: usize,
}

impl HistoryStore {
    /// `cap` is clamped to at least one record.
    pub fn with_capacity(cap: usize) -> Self {
        Self {
            inner: RwLock::new(BTreeMap::new()),
            cap: cap.max(1),
        }
    }

    pub fn capacity(&self) -> usize {
        self.cap
    }

    /// Prepend a record, evicting the oldest once the bound is exceeded.
    pub fn push(&self, provider: &str, record: String) {
        self.insert(provider, 0, record);
    }

    /// Insert at `position` from the front (clamped to the current length), then
    /// evict from the tail down to the bound.
    ///
    /// A fetch delivers entries newest-first; inserting the n-th accepted entry of
    /// that fetch at position n keeps the whole list newest-first.
    pub fn insert(&self, provider: &str, position: usize, record: String) {
        let mut map = self.inner.write();
        let list = map.entry(provider.to_string()).or_default();
        list.insert(position.min(list.len()), record);
        list.truncate(self.cap);
    }

    /// Records for one provider, newest-first.
    pub fn for_provider(&self, provider: &str) -> Vec<String> {
        self.inner
            .read()
            .get(provider)
            .map(|v| v.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Every provider with at least one record, ordered by provider name.
    pub fn snapshot(&self) -> BTreeMap<String, Vec<String>> {
        self.inner
            .read()
            .iter()
            .filter(|(_, v)| !v.is_empty())
            .map(|(k, v)| (k.clone(), v.iter().cloned().collect()))
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.read().values().all(VecDeque::is_empty)
    }
}
