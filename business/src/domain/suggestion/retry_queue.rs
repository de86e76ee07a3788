use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::oneshot;
use uuid::Uuid;

use crate::domain::clock::Clock;
use crate::domain::logger::Logger;

use super::rate_limiter::RateLimiter;
use super::services::{CompletionError, CompletionPrompt, SuggestionCompletionService};
use super::settings::deadline_after;

/// A completion call that could not be sent straight away.
#[derive(Debug, Clone)]
pub struct SuggestionRequest {
    pub id: Uuid,
    pub prompt: CompletionPrompt,
    pub retry_count: u32,
    pub enqueued_at: DateTime<Utc>,
    /// Earliest instant the next attempt may run.
    pub ready_at: DateTime<Utc>,
}

impl SuggestionRequest {
    /// A request that may be attempted on the next drain.
    pub fn new(prompt: CompletionPrompt, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            prompt,
            retry_count: 0,
            enqueued_at: now,
            ready_at: now,
        }
    }

    /// Marks the request as already having failed `retry_count` times.
    pub fn retrying(mut self, retry_count: u32, ready_at: DateTime<Utc>) -> Self {
        self.retry_count = retry_count;
        self.ready_at = ready_at;
        self
    }
}

/// Successful outcome of a queued request.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletedRequest {
    pub content: String,
    /// Retries consumed before the call succeeded.
    pub retry_count: u32,
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum QueueError {
    #[error("queue.retries_exhausted")]
    Exhausted(CompletionError),
    #[error("queue.rejected")]
    Rejected(CompletionError),
    #[error("queue.closed")]
    Closed,
}

type Responder = oneshot::Sender<Result<CompletedRequest, QueueError>>;

struct QueuedRequest {
    request: SuggestionRequest,
    responder: Responder,
}

impl QueuedRequest {
    fn resolve(self, outcome: Result<CompletedRequest, QueueError>) {
        // The caller may have gone away; nothing to do then.
        let _ = self.responder.send(outcome);
    }
}

/// Handle the enqueuing caller awaits. Resolves exactly once.
pub struct PendingSuggestion {
    id: Uuid,
    receiver: oneshot::Receiver<Result<CompletedRequest, QueueError>>,
}

impl PendingSuggestion {
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub async fn wait(self) -> Result<CompletedRequest, QueueError> {
        self.receiver.await.unwrap_or(Err(QueueError::Closed))
    }
}

/// What a single drain pass did.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DrainReport {
    /// Another pass was already running, so this one did nothing.
    pub skipped: bool,
    pub attempted: usize,
    pub succeeded: usize,
    pub retried: usize,
    pub failed: usize,
    /// The pass stopped because the limiter refused an eligible request.
    pub rate_limited: bool,
}

enum NextRequest {
    Ready(QueuedRequest),
    Idle,
    RateLimited,
}

#[derive(Default)]
struct QueueState {
    requests: VecDeque<QueuedRequest>,
    closed: bool,
}

struct DrainGuard<'a>(&'a AtomicBool);

impl Drop for DrainGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// FIFO of deferred completion calls with exponential backoff.
///
/// Requests become eligible once `ready_at <= now`. Each drain attempts
/// eligible requests in queue order while the rate limiter admits them. A
/// failed request goes back to the tail, so it can end up behind requests
/// that arrived after it.
pub struct RetryQueue {
    // `closed` shares the lock with the requests so no push can land after shutdown drains.
    state: Mutex<QueueState>,
    draining: AtomicBool,
    completion: Arc<dyn SuggestionCompletionService>,
    limiter: Arc<RateLimiter>,
    clock: Arc<dyn Clock>,
    logger: Arc<dyn Logger>,
    max_retries: u32,
    base_delay: Duration,
}

impl RetryQueue {
    pub fn new(
        completion: Arc<dyn SuggestionCompletionService>,
        limiter: Arc<RateLimiter>,
        clock: Arc<dyn Clock>,
        logger: Arc<dyn Logger>,
        max_retries: u32,
        base_delay: Duration,
    ) -> Self {
        Self {
            state: Mutex::new(QueueState::default()),
            draining: AtomicBool::new(false),
            completion,
            limiter,
            clock,
            logger,
            max_retries,
            base_delay,
        }
    }

    /// Appends the request to the tail and returns the handle to await.
    pub fn enqueue(&self, request: SuggestionRequest) -> PendingSuggestion {
        let (responder, receiver) = oneshot::channel();
        let id = request.id;

        if let Ok(mut state) = self.state.lock()
            && !state.closed
        {
            state.requests.push_back(QueuedRequest { request, responder });
        }
        // Otherwise the responder is dropped here and the handle reports Closed.

        PendingSuggestion { id, receiver }
    }

    /// Delay before the attempt that follows the `retry_count`-th failure.
    pub fn backoff_delay(&self, retry_count: u32) -> Duration {
        let factor = 1u32.checked_shl(retry_count).unwrap_or(u32::MAX);
        self.base_delay.saturating_mul(factor)
    }

    /// Runs one pass over the queue. Overlapping calls return a skipped report.
    pub async fn drain(&self) -> DrainReport {
        if self.draining.swap(true, Ordering::AcqRel) {
            return DrainReport {
                skipped: true,
                ..DrainReport::default()
            };
        }
        let _guard = DrainGuard(&self.draining);
        let mut report = DrainReport::default();

        loop {
            let mut queued = match self.take_next_ready() {
                NextRequest::Ready(queued) => queued,
                NextRequest::Idle => break,
                NextRequest::RateLimited => {
                    report.rate_limited = true;
                    break;
                }
            };
            report.attempted += 1;

            match self.completion.complete(&queued.request.prompt).await {
                Ok(content) => {
                    report.succeeded += 1;
                    let retry_count = queued.request.retry_count;
                    queued.resolve(Ok(CompletedRequest {
                        content,
                        retry_count,
                    }));
                }
                Err(err) if err.is_transient() && queued.request.retry_count < self.max_retries => {
                    report.retried += 1;
                    queued.request.retry_count += 1;
                    let delay = self.backoff_delay(queued.request.retry_count);
                    queued.request.ready_at = deadline_after(self.clock.now(), delay);
                    self.logger.debug(&format!(
                        "Suggestion request {} failed ({}), retry {} in {}ms",
                        queued.request.id,
                        err,
                        queued.request.retry_count,
                        delay.as_millis()
                    ));
                    self.requeue(queued);
                }
                Err(err) if err.is_transient() => {
                    report.failed += 1;
                    self.logger.error(&format!(
                        "Suggestion request {} gave up after {} retries: {}",
                        queued.request.id, queued.request.retry_count, err
                    ));
                    queued.resolve(Err(QueueError::Exhausted(err)));
                }
                Err(err) => {
                    report.failed += 1;
                    self.logger.warn(&format!(
                        "Suggestion request {} rejected: {}",
                        queued.request.id, err
                    ));
                    queued.resolve(Err(QueueError::Rejected(err)));
                }
            }
        }

        report
    }

    /// Drops every pending request; their callers observe `QueueError::Closed`.
    pub fn shutdown(&self) {
        let dropped = match self.state.lock() {
            Ok(mut state) => {
                state.closed = true;
                state.requests.drain(..).count()
            }
            Err(_) => 0,
        };
        if dropped > 0 {
            self.logger
                .warn(&format!("Retry queue closed with {} pending requests", dropped));
        }
    }

    pub fn len(&self) -> usize {
        self.state.lock().map(|s| s.requests.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Earliest `ready_at` among pending requests.
    pub fn next_ready_at(&self) -> Option<DateTime<Utc>> {
        self.state
            .lock()
            .ok()?
            .requests
            .iter()
            .map(|queued| queued.request.ready_at)
            .min()
    }

    fn take_next_ready(&self) -> NextRequest {
        let now = self.clock.now();
        let Ok(mut state) = self.state.lock() else {
            return NextRequest::Idle;
        };
        let Some(position) = state
            .requests
            .iter()
            .position(|q| q.request.ready_at <= now)
        else {
            return NextRequest::Idle;
        };
        // A full window stays full until it resets; asking again would only
        // inflate the rejection count on every tick.
        if !self.limiter.has_capacity() || !self.limiter.try_acquire() {
            return NextRequest::RateLimited;
        }
        match state.requests.remove(position) {
            Some(queued) => NextRequest::Ready(queued),
            None => NextRequest::Idle,
        }
    }

    /// Puts a retried request back at the tail. After shutdown the request is
    /// dropped instead, which resolves its caller with `QueueError::Closed`.
    fn requeue(&self, queued: QueuedRequest) {
        if let Ok(mut state) = self.state.lock()
            && !state.closed
        {
            state.requests.push_back(queued);
        }
    }
}
