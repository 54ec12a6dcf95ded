use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use log::debug;

use super::budget::ByteBudget;
use super::types::ResourceRecord;
use crate::utils::url_utils::strip_fragment;

struct CacheInner {
    entries: HashMap<String, Arc<ResourceRecord>>,
    budget: ByteBudget,
}

/// Run-scoped, budget-guarded resource cache.
///
/// Keys are fragment-stripped URLs so in-page anchors collapse to one entry.
/// Insertion is first-writer-wins: the CDP capture path and the direct fetch
/// path can race on the same URL, and whichever lands first counts the bytes.
/// A cache hit never consults the budget; bytes already paid for stay usable.
pub struct ResourceCache {
    inner: Mutex<CacheInner>,
}

impl ResourceCache {
    pub fn new(budget: ByteBudget) -> Self {
        Self {
            inner: Mutex::new(CacheInner {
                entries: HashMap::new(),
                budget,
            }),
        }
    }

    /// Look up a URL, ignoring any fragment.
    pub fn get(&self, url: &str) -> Option<Arc<ResourceRecord>> {
        let key = strip_fragment(url);
        let inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        inner.entries.get(&key).cloned()
    }

    /// Try to admit a freshly fetched resource.
    ///
    /// Returns the cached record on success (the existing one if another
    /// writer got there first), or `None` when the budget rejects the body.
    pub fn admit(&self, url: &str, record: ResourceRecord) -> Option<Arc<ResourceRecord>> {
        let key = strip_fragment(url);
        let mut inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());

        if let Some(existing) = inner.entries.get(&key) {
            return Some(Arc::clone(existing));
        }
        let len = record.len();
        if !inner.budget.admits(len) {
            debug!("budget rejected {len} bytes for {key}");
            return None;
        }
        inner.budget.consume(len);
        let record = Arc::new(record);
        inner.entries.insert(key, Arc::clone(&record));
        Some(record)
    }

    /// True once the aggregate byte cap has been reached.
    ///
    /// Callers use this to short-circuit before doing network I/O that could
    /// never be admitted.
    pub fn is_budget_exhausted(&self) -> bool {
        let inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        inner.budget.is_exhausted()
    }

    pub fn bytes_used(&self) -> usize {
        let inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        inner.budget.used()
    }

    pub fn max_single_bytes(&self) -> usize {
        let inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        inner.budget.max_single_bytes()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(len: usize) -> ResourceRecord {
        ResourceRecord::new(vec![0xAB; len], "image/png")
    }

    #[test]
    fn fragment_variants_hit_one_entry() {
        let cache = ResourceCache::new(ByteBudget::new(100, 100));
        cache.admit("https://example.com/x.png#a", record(10)).unwrap();
        assert!(cache.get("https://example.com/x.png#b").is_some());
        assert!(cache.get("https://example.com/x.png").is_some());
        assert_eq!(cache.bytes_used(), 10);
    }

    #[test]
    fn first_writer_wins_and_counts_once() {
        let cache = ResourceCache::new(ByteBudget::new(100, 100));
        let first = cache.admit("https://example.com/a", record(10)).unwrap();
        let second = cache.admit("https://example.com/a", record(50)).unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(cache.bytes_used(), 10);
    }

    #[test]
    fn budget_rejection_returns_none() {
        let cache = ResourceCache::new(ByteBudget::new(100, 30));
        assert!(cache.admit("https://example.com/big", record(31)).is_none());
        cache.admit("https://example.com/a", record(30)).unwrap();
        cache.admit("https://example.com/b", record(30)).unwrap();
        cache.admit("https://example.com/c", record(30)).unwrap();
        // 90 used, only 10 left in the aggregate.
        assert!(cache.admit("https://example.com/d", record(11)).is_none());
        cache.admit("https://example.com/e", record(10)).unwrap();
        assert!(cache.is_budget_exhausted());
    }

    #[test]
    fn hits_survive_exhaustion() {
        let cache = ResourceCache::new(ByteBudget::new(10, 10));
        cache.admit("https://example.com/a", record(10)).unwrap();
        assert!(cache.is_budget_exhausted());
        assert!(cache.get("https://example.com/a").is_some());
    }
}
