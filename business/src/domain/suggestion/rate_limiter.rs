use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::{DateTime, Utc};

use crate::domain::clock::Clock;

use super::settings::deadline_after;

#[derive(Debug)]
struct RateWindow {
    count: u32,
    resets_at: DateTime<Utc>,
}

/// Fixed-window limiter guarding outbound completion calls.
///
/// The window is wall-clock based: once `now >= resets_at` the count goes
/// back to zero and the next window starts at `now`. Tokens are not smoothed,
/// so a burst straddling a reset can admit up to twice the ceiling.
pub struct RateLimiter {
    window: Mutex<RateWindow>,
    ceiling: u32,
    window_length: Duration,
    rejections: AtomicU64,
    clock: Arc<dyn Clock>,
}

impl RateLimiter {
    pub fn new(ceiling: u32, window_length: Duration, clock: Arc<dyn Clock>) -> Self {
        let resets_at = deadline_after(clock.now(), window_length);
        Self {
            window: Mutex::new(RateWindow {
                count: 0,
                resets_at,
            }),
            ceiling,
            window_length,
            rejections: AtomicU64::new(0),
            clock,
        }
    }

    /// Admits one call if the current window still has room.
    pub fn try_acquire(&self) -> bool {
        let now = self.clock.now();
        let Ok(mut window) = self.window.lock() else {
            return false;
        };

        if now >= window.resets_at {
            window.count = 0;
            window.resets_at = deadline_after(now, self.window_length);
        }

        if window.count < self.ceiling {
            window.count += 1;
            true
        } else {
            self.rejections.fetch_add(1, Ordering::Relaxed);
            false
        }
    }

    /// Whether `try_acquire` would currently admit a call. Neither consumes a
    /// slot nor counts a rejection.
    pub fn has_capacity(&self) -> bool {
        let now = self.clock.now();
        self.window
            .lock()
            .map(|window| now >= window.resets_at || window.count < self.ceiling)
            .unwrap_or(false)
    }

    pub fn time_until_reset(&self) -> Duration {
        let now = self.clock.now();
        self.window
            .lock()
            .ok()
            .and_then(|window| (window.resets_at - now).to_std().ok())
            .unwrap_or(Duration::ZERO)
    }

    pub fn rejections(&self) -> u64 {
        self.rejections.load(Ordering::Relaxed)
    }

    pub fn ceiling(&self) -> u32 {
        self.ceiling
    }
}
