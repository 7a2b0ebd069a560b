//! Batch driver: walks the configured collections one file at a time

use std::io;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{info, warn};

use crate::config::CollectionConfig;
use crate::logo_sync::{BatchReport, FileOutcome, LogoSyncPipeline};
use crate::schedule::ScheduleDay;

/// `*.json` files directly inside `dir`, sorted by path
pub async fn discover_schedule_files(dir: &Path) -> io::Result<Vec<PathBuf>> {
    let mut entries = tokio::fs::read_dir(dir).await?;
    let mut files = Vec::new();

    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        if path.extension().is_some_and(|ext| ext == "json")
            && tokio::fs::metadata(&path).await.is_ok_and(|meta| meta.is_file())
        {
            files.push(path);
        }
    }

    files.sort();
    Ok(files)
}

pub struct BatchDriver {
    pipeline: LogoSyncPipeline,
    collections: Vec<CollectionConfig>,
}

impl BatchDriver {
    pub fn new(pipeline: LogoSyncPipeline, collections: Vec<CollectionConfig>) -> Self {
        Self {
            pipeline,
            collections,
        }
    }

    /// Files to process with their day, in processing order
    pub async fn discover(&self) -> Vec<(PathBuf, ScheduleDay)> {
        let mut discovered = Vec::new();

        for collection in &self.collections {
            let day = collection.resolved_day();
            match discover_schedule_files(&collection.path).await {
                Ok(files) => {
                    info!(
                        "Found {} schedule files in {} ({})",
                        files.len(),
                        collection.path.display(),
                        day
                    );
                    discovered.extend(files.into_iter().map(|path| (path, day)));
                }
                Err(e) => warn!(
                    "Skipping collection {}: {}",
                    collection.path.display(),
                    e
                ),
            }
        }

        discovered
    }

    /// Process every discovered file sequentially
    pub async fn run(&self) -> BatchReport {
        let started = Instant::now();
        let files = self.discover().await;

        let mut report = BatchReport {
            files_discovered: files.len(),
            ..Default::default()
        };

        for (path, day) in files {
            match self.pipeline.process_file(&path, day).await {
                FileOutcome::Processed(file_report) => report.record(&file_report),
                FileOutcome::Unchanged => report.files_unchanged += 1,
                FileOutcome::Skipped => report.files_skipped += 1,
            }
        }

        report.duration = started.elapsed();
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_discovery_is_flat_and_sorted() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("b.json"), "{}").unwrap();
        std::fs::write(dir.path().join("a.json"), "{}").unwrap();
        std::fs::write(dir.path().join("notes.txt"), "").unwrap();
        std::fs::create_dir(dir.path().join("nested.json")).unwrap();
        std::fs::create_dir(dir.path().join("sub")).unwrap();
        std::fs::write(dir.path().join("sub").join("c.json"), "{}").unwrap();

        let files = discover_schedule_files(dir.path()).await.unwrap();

        assert_eq!(
            files,
            vec![dir.path().join("a.json"), dir.path().join("b.json")]
        );
    }

    #[tokio::test]
    async fn test_missing_directory_is_an_error() {
        let dir = TempDir::new().unwrap();
        assert!(discover_schedule_files(&dir.path().join("absent")).await.is_err());
    }
}
