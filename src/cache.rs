use dashmap::DashMap;
use std::sync::Arc;

/// Resolve cache, short_id -> target_url. Never authoritative: the link
/// store is.
///
/// Writers:
/// - `db::warm_cache` loads every stored link at startup.
/// - `shorten` and a resolve miss go through `handlers::links::cache_link`,
///   which re-reads the store after writing and drops the entry if the link
///   was deleted meanwhile.
/// - `delete` evicts after the row is gone.
///
/// An entry present here therefore always has a live row, or is about to be
/// evicted by the delete that removed it.
#[derive(Clone, Debug, Default)]
pub struct LinkCache {
    inner: Arc<DashMap<String, String>>,
}

impl LinkCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self, short_id: impl Into<String>, target_url: impl Into<String>) {
        self.inner.insert(short_id.into(), target_url.into());
    }

    pub fn get(&self, short_id: &str) -> Option<String> {
        self.inner.get(short_id).map(|v| v.clone())
    }

    /// No-op if the id was never cached.
    pub fn remove(&self, short_id: &str) {
        self.inner.remove(short_id);
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }
}
