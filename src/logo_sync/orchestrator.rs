//! Bounded worker pool for one file's fetch tasks

use futures::future::join_all;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::Semaphore;
use tracing::{error, info, warn};

use super::planner::{FetchTask, ResultIndex};
use super::worker::{FetchConvertWorker, TaskOutcome};

/// Counters for one pool run
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct PoolStats {
    pub succeeded: usize,
    pub failed: usize,
    pub bytes_fetched: u64,
}

/// Runs up to `max_workers` fetch-convert tasks at a time
pub struct WorkerPool {
    worker: Arc<FetchConvertWorker>,
    max_workers: usize,
    progress_interval: usize,
}

impl WorkerPool {
    pub fn new(worker: FetchConvertWorker, max_workers: usize, progress_interval: usize) -> Self {
        Self {
            worker: Arc::new(worker),
            max_workers: max_workers.max(1),
            progress_interval: progress_interval.max(1),
        }
    }

    /// Run every task to a terminal state and record the artifacts on disk
    ///
    /// Success is decided by the filesystem after all tasks finished, not by
    /// what the workers reported.
    pub async fn run_all(&self, label: &str, tasks: Vec<FetchTask>, results: &mut ResultIndex) -> PoolStats {
        let total = tasks.len();
        if total == 0 {
            return PoolStats::default();
        }

        let semaphore = Arc::new(Semaphore::new(self.max_workers));
        let completed = Arc::new(AtomicUsize::new(0));

        let handles: Vec<_> = tasks
            .iter()
            .cloned()
            .map(|task| {
                let semaphore = semaphore.clone();
                let completed = completed.clone();
                let worker = self.worker.clone();
                let label = label.to_string();
                let interval = self.progress_interval;

                tokio::spawn(async move {
                    let Ok(_permit) = semaphore.acquire_owned().await else {
                        return TaskOutcome::Failed;
                    };
                    let outcome = worker.run(&task).await;

                    let done = completed.fetch_add(1, Ordering::SeqCst) + 1;
                    if done % interval == 0 || done == total {
                        info!("{}: {}/{} images processed", label, done, total);
                    }
                    outcome
                })
            })
            .collect();

        let outcomes = join_all(handles)
            .await
            .into_iter()
            .zip(&tasks)
            .map(|(joined, task)| {
                joined.unwrap_or_else(|e| {
                    error!("Worker for {} did not complete: {}", task.url, e);
                    TaskOutcome::Failed
                })
            })
            .collect();

        settle(tasks, outcomes, results).await
    }
}

/// Decide each task by what is on disk and record the artifacts that exist
pub async fn settle(tasks: Vec<FetchTask>, outcomes: Vec<TaskOutcome>, results: &mut ResultIndex) -> PoolStats {
    let mut stats = PoolStats::default();

    for (task, outcome) in tasks.into_iter().zip(outcomes) {
        if tokio::fs::try_exists(&task.target).await.unwrap_or(false) {
            if let TaskOutcome::Succeeded { bytes_fetched } = outcome {
                stats.bytes_fetched += bytes_fetched;
            }
            stats.succeeded += 1;
            results.insert(task.url, task.target);
        } else {
            if outcome.is_success() {
                warn!("Missing after download: {}", task.target.display());
            }
            stats.failed += 1;
        }
    }

    stats
}
