use std::sync::atomic::{AtomicU64, Ordering};

/// Counters for observability. Nothing in the pipeline branches on them.
#[derive(Debug, Default)]
pub struct SuggestionMetrics {
    total_requests: AtomicU64,
    cache_hits: AtomicU64,
    api_calls: AtomicU64,
    queued: AtomicU64,
    errors: AtomicU64,
    fallbacks: AtomicU64,
}

/// Point-in-time copy of the counters plus current cache and queue sizes.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MetricsSnapshot {
    pub total_requests: u64,
    pub cache_hits: u64,
    pub api_calls: u64,
    pub queued: u64,
    pub errors: u64,
    pub fallbacks: u64,
    pub rate_limit_rejections: u64,
    pub cache_size: usize,
    pub queue_depth: usize,
}

impl MetricsSnapshot {
    pub fn cache_hit_rate(&self) -> f64 {
        if self.total_requests == 0 {
            return 0.0;
        }
        self.cache_hits as f64 / self.total_requests as f64
    }
}

impl SuggestionMetrics {
    pub fn record_request(&self) {
        self.total_requests.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_cache_hit(&self) {
        self.cache_hits.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_api_call(&self) {
        self.api_calls.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_queued(&self) {
        self.queued.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_error(&self) {
        self.errors.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_fallback(&self) {
        self.fallbacks.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(
        &self,
        rate_limit_rejections: u64,
        cache_size: usize,
        queue_depth: usize,
    ) -> MetricsSnapshot {
        MetricsSnapshot {
            total_requests: self.total_requests.load(Ordering::Relaxed),
            cache_hits: self.cache_hits.load(Ordering::Relaxed),
            api_calls: self.api_calls.load(Ordering::Relaxed),
            queued: self.queued.load(Ordering::Relaxed),
            errors: self.errors.load(Ordering::Relaxed),
            fallbacks: self.fallbacks.load(Ordering::Relaxed),
            rate_limit_rejections,
            cache_size,
            queue_depth,
        }
    }
}
