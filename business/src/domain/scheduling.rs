use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

/// Background work that runs on a fixed interval.
///
/// `tick` can be called directly, so tests drive tasks without a runtime
/// timer.
#[async_trait]
pub trait PeriodicTask: Send + Sync {
    fn name(&self) -> &'static str;
    fn interval(&self) -> Duration;
    async fn tick(&self);
}

/// A started periodic task. Stop it explicitly; dropping the handle leaves
/// the task running until the runtime shuts down.
pub struct ScheduledTask {
    name: &'static str,
    stop: watch::Sender<bool>,
    handle: JoinHandle<()>,
}

impl ScheduledTask {
    /// Spawns the task. The first tick happens one interval after start.
    pub fn start(task: Arc<dyn PeriodicTask>) -> Self {
        let (stop, mut stopped) = watch::channel(false);
        let name = task.name();
        let period = task.interval().max(Duration::from_millis(1));

        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval_at(tokio::time::Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                tokio::select! {
                    _ = ticker.tick() => task.tick().await,
                    _ = stopped.changed() => break,
                }
            }
        });

        Self { name, stop, handle }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Signals the loop to exit and waits for it. A tick in progress finishes first.
    pub async fn stop(self) {
        let _ = self.stop.send(true);
        let _ = self.handle.await;
    }
}
