use std::sync::Arc;

use async_trait::async_trait;

use crate::domain::clock::Clock;
use crate::domain::logger::Logger;
use crate::domain::scheduling::PeriodicTask;
use crate::domain::suggestion::cache::SuggestionCache;
use crate::domain::suggestion::fallback::FallbackGenerator;
use crate::domain::suggestion::fingerprint::fingerprint;
use crate::domain::suggestion::metrics::{MetricsSnapshot, SuggestionMetrics};
use crate::domain::suggestion::model::Suggestion;
use crate::domain::suggestion::parser::parse_suggestion;
use crate::domain::suggestion::prompt::build_prompt;
use crate::domain::suggestion::rate_limiter::RateLimiter;
use crate::domain::suggestion::retry_queue::{QueueError, RetryQueue, SuggestionRequest};
use crate::domain::suggestion::services::{CompletionPrompt, SuggestionCompletionService};
use crate::domain::suggestion::settings::{SuggestionSettings, deadline_after};
use crate::domain::suggestion::tasks::{CacheSweepTask, QueueDrainTask};
use crate::domain::suggestion::use_cases::generate::{
    GenerateSuggestionParams, GenerateSuggestionUseCase,
};

enum FetchFailure {
    Failed(String),
    Unavailable,
}

pub struct GenerateSuggestionUseCaseImpl {
    pub completion: Arc<dyn SuggestionCompletionService>,
    pub cache: Arc<SuggestionCache>,
    pub limiter: Arc<RateLimiter>,
    pub queue: Arc<RetryQueue>,
    pub fallback: FallbackGenerator,
    pub metrics: SuggestionMetrics,
    pub clock: Arc<dyn Clock>,
    pub logger: Arc<dyn Logger>,
    pub settings: SuggestionSettings,
}

impl GenerateSuggestionUseCaseImpl {
    /// Wires cache, limiter and retry queue from `settings`.
    pub fn new(
        completion: Arc<dyn SuggestionCompletionService>,
        settings: SuggestionSettings,
        clock: Arc<dyn Clock>,
        logger: Arc<dyn Logger>,
    ) -> Self {
        let cache = Arc::new(SuggestionCache::new(
            settings.cache_ttl,
            settings.cache_max_entries,
            clock.clone(),
        ));
        let limiter = Arc::new(RateLimiter::new(
            settings.rate_limit_per_window,
            settings.rate_window,
            clock.clone(),
        ));
        let queue = Arc::new(RetryQueue::new(
            completion.clone(),
            limiter.clone(),
            clock.clone(),
            logger.clone(),
            settings.max_retries,
            settings.retry_base_delay,
        ));

        Self {
            completion,
            cache,
            limiter,
            queue,
            fallback: FallbackGenerator,
            metrics: SuggestionMetrics::default(),
            clock,
            logger,
            settings,
        }
    }

    /// Cache sweep and queue drain, for the composition root to schedule.
    pub fn background_tasks(&self) -> Vec<Arc<dyn PeriodicTask>> {
        vec![
            Arc::new(CacheSweepTask {
                cache: self.cache.clone(),
                logger: self.logger.clone(),
                interval: self.settings.cache_sweep_interval,
            }),
            Arc::new(QueueDrainTask {
                queue: self.queue.clone(),
                logger: self.logger.clone(),
                interval: self.settings.queue_tick,
            }),
        ]
    }

    /// Rejects queued callers; called once background tasks are stopped.
    pub fn shutdown(&self) {
        self.queue.shutdown();
    }

    fn rule_based(&self, params: &GenerateSuggestionParams) -> Suggestion {
        self.metrics.record_fallback();
        self.fallback.generate(
            &params.section,
            &params.form_data,
            &params.platform_context,
            self.clock.now(),
        )
    }

    async fn fetch(&self, prompt: CompletionPrompt) -> Result<String, FetchFailure> {
        if !self.limiter.try_acquire() {
            self.metrics.record_queued();
            self.logger.debug(&format!(
                "Rate limit reached, queueing suggestion request (window resets in {}ms)",
                self.limiter.time_until_reset().as_millis()
            ));
            return self
                .wait_for_queue(SuggestionRequest::new(prompt, self.clock.now()))
                .await;
        }

        self.metrics.record_api_call();
        match self.completion.complete(&prompt).await {
            Ok(content) => Ok(content),
            Err(err) if err.is_transient() && self.settings.max_retries > 0 => {
                let delay = self.queue.backoff_delay(1);
                self.logger.warn(&format!(
                    "Suggestion call failed ({}), retrying in {}ms",
                    err,
                    delay.as_millis()
                ));
                let now = self.clock.now();
                let request =
                    SuggestionRequest::new(prompt, now).retrying(1, deadline_after(now, delay));
                self.wait_for_queue(request).await
            }
            Err(err) => Err(FetchFailure::Failed(err.to_string())),
        }
    }

    async fn wait_for_queue(&self, request: SuggestionRequest) -> Result<String, FetchFailure> {
        match self.queue.enqueue(request).wait().await {
            Ok(completed) => Ok(completed.content),
            Err(QueueError::Closed) => Err(FetchFailure::Unavailable),
            Err(err) => Err(FetchFailure::Failed(err.to_string())),
        }
    }
}

#[async_trait]
impl GenerateSuggestionUseCase for GenerateSuggestionUseCaseImpl {
    async fn execute(&self, params: GenerateSuggestionParams) -> Suggestion {
        self.metrics.record_request();
        let key = fingerprint(&params.section, &params.form_data, &params.platform_context);

        if let Some(cached) = self.cache.get(&key) {
            self.metrics.record_cache_hit();
            self.logger
                .debug(&format!("Suggestion cache hit for section {}", params.section));
            return cached;
        }
        self.logger
            .debug(&format!("Suggestion cache miss for section {}", params.section));

        if !self.completion.is_configured() {
            self.logger.debug(&format!(
                "No completion API key configured, using rules for section {}",
                params.section
            ));
            return self.rule_based(&params);
        }

        let prompt = build_prompt(&params.section, &params.form_data, &params.platform_context);

        let content = match self.fetch(prompt).await {
            Ok(content) => content,
            Err(FetchFailure::Failed(reason)) => {
                self.metrics.record_error();
                self.logger.warn(&format!(
                    "Falling back to rules for section {}: {}",
                    params.section, reason
                ));
                return self.rule_based(&params);
            }
            Err(FetchFailure::Unavailable) => {
                self.metrics.record_error();
                self.logger.warn(&format!(
                    "Suggestion service unavailable for section {}",
                    params.section
                ));
                return Suggestion::service_unavailable(self.clock.now());
            }
        };

        match parse_suggestion(&content, self.clock.now()) {
            Ok(suggestion) => {
                self.cache.put(&key, suggestion.clone());
                self.logger.info(&format!(
                    "Generated AI suggestion for section {} ({} fields)",
                    params.section,
                    suggestion.field_suggestions.len()
                ));
                suggestion
            }
            Err(err) => {
                self.metrics.record_error();
                self.logger.warn(&format!(
                    "Discarding completion for section {}: {}",
                    params.section, err
                ));
                self.rule_based(&params)
            }
        }
    }

    fn metrics(&self) -> MetricsSnapshot {
        self.metrics.snapshot(
            self.limiter.rejections(),
            self.cache.len(),
            self.queue.len(),
        )
    }
}
