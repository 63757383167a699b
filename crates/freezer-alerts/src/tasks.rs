//! Named periodic background tasks.
//!
//! Each task id has at most one live schedule. Scheduling under an id that is
//! already present cancels the old schedule first. Runs of the same id never
//! overlap, including across a replacement.

use parking_lot::Mutex;
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

struct ScheduledTask {
    token: CancellationToken,
    handle: JoinHandle<()>,
}

type RunLock = Arc<tokio::sync::Mutex<()>>;

#[derive(Default)]
pub struct PeriodicTasks {
    tasks: Mutex<HashMap<String, ScheduledTask>>,
    run_locks: Mutex<HashMap<String, RunLock>>,
}

impl PeriodicTasks {
    pub fn new() -> Self {
        Self::default()
    }

    fn run_lock(&self, task_id: &str) -> RunLock {
        self.run_locks
            .lock()
            .entry(task_id.to_string())
            .or_default()
            .clone()
    }

    /// Run `work` after `initial_delay`, then every `interval`.
    ///
    /// Replaces any schedule already registered under `task_id`. A cycle that
    /// is already running when the schedule is cancelled or replaced runs to
    /// completion. Must be called from within a tokio runtime.
    pub fn schedule_periodic<F, Fut>(
        &self,
        task_id: &str,
        interval: Duration,
        initial_delay: Duration,
        work: F,
    ) where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let period = interval.max(Duration::from_secs(1));
        let token = CancellationToken::new();
        let child = token.clone();
        let lock = self.run_lock(task_id);
        let id = task_id.to_string();

        // Cancel the old schedule before the new one exists so a cycle that is
        // due and waiting on the run lock cannot fire alongside its replacement.
        let mut tasks = self.tasks.lock();
        if let Some(previous) = tasks.remove(task_id) {
            tracing::debug!(task_id, "Replacing existing schedule");
            previous.token.cancel();
        }

        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval_at(Instant::now() + initial_delay, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    biased;
                    _ = child.cancelled() => break,
                    _ = ticker.tick() => {}
                }

                let _running = lock.lock().await;
                if child.is_cancelled() {
                    break;
                }
                tracing::debug!(task_id = %id, "Running periodic task");
                work().await;
            }
            tracing::debug!(task_id = %id, "Periodic task stopped");
        });

        tasks.insert(task_id.to_string(), ScheduledTask { token, handle });
    }

    /// Cancel the schedule for `task_id`. Returns whether one existed.
    pub fn cancel(&self, task_id: &str) -> bool {
        match self.tasks.lock().remove(task_id) {
            Some(task) => {
                task.token.cancel();
                true
            }
            None => false,
        }
    }

    pub fn is_scheduled(&self, task_id: &str) -> bool {
        self.tasks
            .lock()
            .get(task_id)
            .is_some_and(|task| !task.handle.is_finished())
    }

    /// Number of live schedules.
    pub fn pending_count(&self) -> usize {
        self.tasks
            .lock()
            .values()
            .filter(|task| !task.handle.is_finished())
            .count()
    }

    /// Run `fut` once, serialized with the scheduled runs of `task_id`.
    pub async fn run_exclusive<T>(&self, task_id: &str, fut: impl Future<Output = T>) -> T {
        let lock = self.run_lock(task_id);
        let _running = lock.lock().await;
        fut.await
    }

    /// Cancel every schedule and wait for in-flight cycles to finish.
    pub async fn shutdown(&self) {
        let drained: Vec<ScheduledTask> = self.tasks.lock().drain().map(|(_, t)| t).collect();
        for task in &drained {
            task.token.cancel();
        }
        for task in drained {
            if let Err(e) = task.handle.await {
                tracing::warn!("Periodic task ended abnormally: {}", e);
            }
        }
    }
}

impl Drop for PeriodicTasks {
    fn drop(&mut self) {
        for task in self.tasks.get_mut().values() {
            task.token.cancel();
        }
    }
}
