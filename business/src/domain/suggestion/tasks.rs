use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use crate::domain::logger::Logger;
use crate::domain::scheduling::PeriodicTask;

use super::cache::SuggestionCache;
use super::retry_queue::RetryQueue;

/// Evicts expired cache entries.
pub struct CacheSweepTask {
    pub cache: Arc<SuggestionCache>,
    pub logger: Arc<dyn Logger>,
    pub interval: Duration,
}

#[async_trait]
impl PeriodicTask for CacheSweepTask {
    fn name(&self) -> &'static str {
        "suggestion-cache-sweep"
    }

    fn interval(&self) -> Duration {
        self.interval
    }

    async fn tick(&self) {
        let removed = self.cache.sweep();
        if removed > 0 {
            self.logger.info(&format!(
                "Cache sweep removed {} expired suggestions, {} remain",
                removed,
                self.cache.len()
            ));
        }
    }
}

/// Runs one retry queue drain per tick.
pub struct QueueDrainTask {
    pub queue: Arc<RetryQueue>,
    pub logger: Arc<dyn Logger>,
    pub interval: Duration,
}

#[async_trait]
impl PeriodicTask for QueueDrainTask {
    fn name(&self) -> &'static str {
        "suggestion-queue-drain"
    }

    fn interval(&self) -> Duration {
        self.interval
    }

    async fn tick(&self) {
        let report = self.queue.drain().await;
        if report.attempted > 0 {
            self.logger.debug(&format!(
                "Queue drain: {} attempted, {} succeeded, {} retried, {} failed, {} pending",
                report.attempted,
                report.succeeded,
                report.retried,
                report.failed,
                self.queue.len()
            ));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::clock::{Clock, ManualClock};
    use crate::domain::suggestion::model::Suggestion;
    use crate::domain::suggestion::rate_limiter::RateLimiter;
    use crate::domain::suggestion::retry_queue::SuggestionRequest;
    use crate::domain::suggestion::services::{
        CompletionError, CompletionPrompt, SuggestionCompletionService,
    };
    use chrono::Utc;
    use mockall::mock;
    use mockall::predicate::str::contains;

    mock! {
        pub Log {}

        impl Logger for Log {
            fn info(&self, message: &str);
            fn warn(&self, message: &str);
            fn error(&self, message: &str);
            fn debug(&self, message: &str);
        }
    }

    mock! {
        pub Completion {}

        #[async_trait]
        impl SuggestionCompletionService for Completion {
            fn is_configured(&self) -> bool;
            async fn complete(&self, prompt: &CompletionPrompt) -> Result<String, CompletionError>;
        }
    }

    #[tokio::test]
    async fn should_log_number_of_swept_entries() {
        let clock = Arc::new(ManualClock::default());
        let cache = Arc::new(SuggestionCache::new(
            Duration::from_secs(1),
            None,
            clock.clone(),
        ));
        cache.put("a", Suggestion::service_unavailable(Utc::now()));
        cache.put("b", Suggestion::service_unavailable(Utc::now()));
        clock.advance(chrono::Duration::seconds(2));

        let mut logger = MockLog::new();
        logger
            .expect_info()
            .with(contains("removed 2 expired"))
            .times(1)
            .returning(|_| ());
        let task = CacheSweepTask {
            cache: cache.clone(),
            logger: Arc::new(logger),
            interval: Duration::from_secs(300),
        };

        task.tick().await;

        assert!(cache.is_empty());
    }

    #[tokio::test]
    async fn should_stay_quiet_when_nothing_expired() {
        let clock = Arc::new(ManualClock::default());
        let cache = Arc::new(SuggestionCache::new(Duration::from_secs(60), None, clock));
        cache.put("a", Suggestion::service_unavailable(Utc::now()));

        let mut logger = MockLog::new();
        logger.expect_info().never();
        let task = CacheSweepTask {
            cache: cache.clone(),
            logger: Arc::new(logger),
            interval: Duration::from_secs(300),
        };

        task.tick().await;

        assert_eq!(cache.len(), 1);
    }

    #[tokio::test]
    async fn should_drain_queue_on_tick() {
        let clock = Arc::new(ManualClock::default());
        let mut completion = MockCompletion::new();
        completion
            .expect_complete()
            .times(1)
            .returning(|_| Ok("{}".to_string()));
        let mut logger = MockLog::new();
        logger.expect_debug().returning(|_| ());
        let logger: Arc<dyn Logger> = Arc::new(logger);
        let queue = Arc::new(RetryQueue::new(
            Arc::new(completion),
            Arc::new(RateLimiter::new(10, Duration::from_secs(60), clock.clone())),
            clock.clone(),
            logger.clone(),
            3,
            Duration::from_millis(100),
        ));
        let pending = queue.enqueue(SuggestionRequest::new(
            CompletionPrompt {
                system: "s".to_string(),
                user: "u".to_string(),
            },
            clock.now(),
        ));
        let task = QueueDrainTask {
            queue: queue.clone(),
            logger,
            interval: Duration::from_millis(100),
        };

        task.tick().await;

        assert!(pending.wait().await.is_ok());
        assert!(queue.is_empty());
    }
}
