//! Per-file logo sync: plan, fetch, rewrite, persist

use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info};

use super::converter::ConversionProfile;
use super::orchestrator::WorkerPool;
use super::planner::TaskPlanner;
use super::report::FileReport;
use super::rewriter::ScheduleRewriter;
use super::worker::FetchConvertWorker;
use crate::config::Config;
use crate::schedule::{ScheduleDay, ScheduleFile};
use crate::utils::http_client::ImageSource;

/// How a single schedule file ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileOutcome {
    /// Logos were resolved and the file was written back
    Processed(FileReport),
    /// Valid file without logo references; left untouched
    Unchanged,
    /// Unreadable, malformed or not writable; left untouched
    Skipped,
}

/// Planner, worker pool and rewriter wired for one run
pub struct LogoSyncPipeline {
    planner: TaskPlanner,
    pool: WorkerPool,
    rewriter: ScheduleRewriter,
}

impl LogoSyncPipeline {
    pub fn new(config: &Config, source: Arc<dyn ImageSource>) -> Self {
        let worker = FetchConvertWorker::new(source, ConversionProfile::from_config(&config.images));

        Self {
            planner: TaskPlanner::new(&config.storage.output_root, config.images.target_width),
            pool: WorkerPool::new(
                worker,
                config.fetch.max_workers,
                config.fetch.progress_interval,
            ),
            rewriter: ScheduleRewriter::new(&config.storage.public_prefix),
        }
    }

    /// Process one schedule file; never fails the batch
    pub async fn process_file(&self, path: &Path, day: ScheduleDay) -> FileOutcome {
        let started = Instant::now();

        let mut file = match ScheduleFile::load(path, day).await {
            Ok(file) => file,
            Err(e) => {
                error!("Skipping schedule file: {}", e);
                return FileOutcome::Skipped;
            }
        };

        if !file.has_schedule_list() {
            debug!("{} has no schedule list, leaving it untouched", path.display());
            return FileOutcome::Unchanged;
        }

        let plan = match self.planner.plan(&file).await {
            Ok(plan) => plan,
            Err(e) => {
                error!("Cannot prepare artifacts for {}: {}", path.display(), e);
                return FileOutcome::Skipped;
            }
        };

        if plan.references.is_empty() {
            debug!("{} has no logo references, leaving it untouched", path.display());
            return FileOutcome::Unchanged;
        }

        let label = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());

        let mut results = plan.results;
        if !plan.tasks.is_empty() {
            info!("{}: downloading {} images", label, plan.tasks.len());
        }
        let pool_stats = self.pool.run_all(&label, plan.tasks, &mut results).await;

        let rewrite_stats = self.rewriter.apply(&mut file, &plan.references, &results);

        if let Err(e) = file.persist().await {
            error!("Failed to write {}: {}", path.display(), e);
            return FileOutcome::Skipped;
        }
        info!("Updated JSON: {}", path.display());

        let report = FileReport {
            path: path.to_path_buf(),
            references: plan.references.len(),
            distinct_urls: plan.distinct_urls,
            cache_hits: plan.cache_hits,
            downloaded: pool_stats.succeeded,
            failed: pool_stats.failed,
            rewritten: rewrite_stats.rewritten,
            unresolved: rewrite_stats.unresolved,
            bytes_fetched: pool_stats.bytes_fetched,
            duration: started.elapsed(),
        };
        report.log();

        FileOutcome::Processed(report)
    }
}
