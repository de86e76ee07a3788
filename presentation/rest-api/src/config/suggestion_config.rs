use std::env;
use std::str::FromStr;
use std::time::Duration;

use business::domain::suggestion::settings::SuggestionSettings;

/// Suggestion pipeline tunables.
///
/// Environment variables (unparseable values keep the default):
/// - SUGGESTION_RATE_LIMIT_PER_MINUTE: Outbound calls per minute (default: 100)
/// - SUGGESTION_CACHE_TTL_MS: Cache entry lifetime (default: 3600000)
/// - SUGGESTION_CACHE_MAX_ENTRIES: Optional LRU cap, 0 or unset disables it
/// - SUGGESTION_MAX_RETRIES: Queue retries before giving up (default: 3)
/// - SUGGESTION_RETRY_BASE_DELAY_MS: Backoff base (default: 1000)
/// - SUGGESTION_QUEUE_TICK_MS: Queue drain interval (default: 100)
/// - SUGGESTION_CACHE_SWEEP_SECS: Expired entry sweep interval (default: 300)
pub struct SuggestionConfig {
    pub settings: SuggestionSettings,
}

impl SuggestionConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = SuggestionSettings::default();

        let settings = SuggestionSettings {
            // A zero ceiling would park every request in the queue forever.
            rate_limit_per_window: lookup("SUGGESTION_RATE_LIMIT_PER_MINUTE")
                .and_then(|v| v.trim().parse::<u32>().ok())
                .filter(|ceiling| *ceiling > 0)
                .unwrap_or(defaults.rate_limit_per_window),
            rate_window: Duration::from_secs(60),
            cache_ttl: millis_or(lookup("SUGGESTION_CACHE_TTL_MS"), defaults.cache_ttl),
            cache_max_entries: lookup("SUGGESTION_CACHE_MAX_ENTRIES")
                .and_then(|v| v.trim().parse::<usize>().ok())
                .filter(|cap| *cap > 0),
            max_retries: parse_or(lookup("SUGGESTION_MAX_RETRIES"), defaults.max_retries),
            retry_base_delay: millis_or(
                lookup("SUGGESTION_RETRY_BASE_DELAY_MS"),
                defaults.retry_base_delay,
            ),
            queue_tick: millis_or(lookup("SUGGESTION_QUEUE_TICK_MS"), defaults.queue_tick),
            cache_sweep_interval: lookup("SUGGESTION_CACHE_SWEEP_SECS")
                .and_then(|v| v.trim().parse::<u64>().ok())
                .filter(|secs| *secs > 0)
                .map(Duration::from_secs)
                .unwrap_or(defaults.cache_sweep_interval),
        };

        Self { settings }
    }
}

fn parse_or<T: FromStr>(raw: Option<String>, default: T) -> T {
    raw.and_then(|v| v.trim().parse().ok()).unwrap_or(default)
}

// Zero would make tokio intervals panic, so it counts as unparseable too.
fn millis_or(raw: Option<String>, default: Duration) -> Duration {
    raw.and_then(|v| v.trim().parse::<u64>().ok())
        .filter(|ms| *ms > 0)
        .map(Duration::from_millis)
        .unwrap_or(default)
}
