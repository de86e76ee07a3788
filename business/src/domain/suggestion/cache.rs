use std::num::NonZeroUsize;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::{DateTime, Utc};
use lru::LruCache;

use crate::domain::clock::Clock;

use super::model::Suggestion;
use super::settings::deadline_after;

#[derive(Debug, Clone)]
struct CacheEntry {
    suggestion: Suggestion,
    expires_at: DateTime<Utc>,
}

/// In-memory suggestion cache keyed by request fingerprint.
///
/// Entries are only returned while `now < expires_at`. Expired entries are
/// dropped when read and by [`SuggestionCache::sweep`]. With `max_entries`
/// set, inserting a new key at capacity evicts the least recently used entry;
/// without it the cache is bounded by TTL alone.
pub struct SuggestionCache {
    entries: Mutex<LruCache<String, CacheEntry>>,
    ttl: Duration,
    clock: Arc<dyn Clock>,
}

impl SuggestionCache {
    pub fn new(ttl: Duration, max_entries: Option<usize>, clock: Arc<dyn Clock>) -> Self {
        let entries = match max_entries.and_then(NonZeroUsize::new) {
            Some(cap) => LruCache::new(cap),
            None => LruCache::unbounded(),
        };
        Self {
            entries: Mutex::new(entries),
            ttl,
            clock,
        }
    }

    pub fn get(&self, fingerprint: &str) -> Option<Suggestion> {
        let now = self.clock.now();
        let mut entries = self.entries.lock().ok()?;

        // `get` promotes the entry to most recently used.
        let expired = match entries.get(fingerprint) {
            Some(entry) if now < entry.expires_at => return Some(entry.suggestion.clone()),
            Some(_) => true,
            None => false,
        };

        if expired {
            entries.pop(fingerprint);
        }
        None
    }

    pub fn put(&self, fingerprint: &str, suggestion: Suggestion) {
        let expires_at = deadline_after(self.clock.now(), self.ttl);
        let Ok(mut entries) = self.entries.lock() else {
            return;
        };

        entries.put(
            fingerprint.to_string(),
            CacheEntry {
                suggestion,
                expires_at,
            },
        );
    }

    /// Removes every expired entry and returns how many were dropped.
    pub fn sweep(&self) -> usize {
        let now = self.clock.now();
        let Ok(mut entries) = self.entries.lock() else {
            return 0;
        };
        let expired: Vec<String> = entries
            .iter()
            .filter(|(_, entry)| now >= entry.expires_at)
            .map(|(key, _)| key.clone())
            .collect();
        for key in &expired {
            entries.pop(key);
        }
        expired.len()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
