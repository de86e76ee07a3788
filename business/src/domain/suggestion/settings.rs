use std::time::Duration;

use chrono::{DateTime, Utc};

/// Tunables for the suggestion pipeline.
///
/// All values are supplied by the composition root; nothing here is computed.
#[derive(Debug, Clone, PartialEq)]
pub struct SuggestionSettings {
    /// Outbound calls admitted per rate window.
    pub rate_limit_per_window: u32,
    pub rate_window: Duration,
    pub cache_ttl: Duration,
    /// `None` keeps the cache TTL-only.
    pub cache_max_entries: Option<usize>,
    pub max_retries: u32,
    pub retry_base_delay: Duration,
    pub queue_tick: Duration,
    pub cache_sweep_interval: Duration,
}

impl Default for SuggestionSettings {
    fn default() -> Self {
        Self {
            rate_limit_per_window: 100,
            rate_window: Duration::from_secs(60),
            cache_ttl: Duration::from_millis(3_600_000),
            cache_max_entries: None,
            max_retries: 3,
            retry_base_delay: Duration::from_millis(1000),
            queue_tick: Duration::from_millis(100),
            cache_sweep_interval: Duration::from_secs(300),
        }
    }
}

/// Converts a std duration into a chrono one, saturating on overflow.
fn to_chrono(duration: Duration) -> chrono::Duration {
    chrono::Duration::from_std(duration).unwrap_or(chrono::Duration::MAX)
}

/// `now + duration`, pinned to the last representable instant instead of
/// overflowing. A huge TTL or backoff then means "effectively never".
pub(crate) fn deadline_after(now: DateTime<Utc>, duration: Duration) -> DateTime<Utc> {
    now.checked_add_signed(to_chrono(duration))
        .unwrap_or(DateTime::<Utc>::MAX_UTC)
}
