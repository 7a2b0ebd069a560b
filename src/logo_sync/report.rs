//! Per-file and per-run counters

use std::path::PathBuf;
use std::time::Duration;
use tracing::info;

use crate::utils::human_format::{format_bytes, format_duration};

/// What happened to one schedule file
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileReport {
    pub path: PathBuf,
    pub references: usize,
    pub distinct_urls: usize,
    pub cache_hits: usize,
    pub downloaded: usize,
    pub failed: usize,
    pub rewritten: usize,
    pub unresolved: usize,
    pub bytes_fetched: u64,
    pub duration: Duration,
}

impl FileReport {
    pub fn log(&self) {
        info!(
            "{}: {} references, {} distinct, {} cached, {} downloaded ({}), {} failed, {} rewritten in {}",
            self.path.display(),
            self.references,
            self.distinct_urls,
            self.cache_hits,
            self.downloaded,
            format_bytes(self.bytes_fetched),
            self.failed,
            self.rewritten,
            format_duration(self.duration.as_millis() as u64)
        );
    }
}

/// Totals over a whole batch run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchReport {
    pub files_discovered: usize,
    pub files_processed: usize,
    /// Valid files with nothing to rewrite
    pub files_unchanged: usize,
    /// Unreadable or malformed files
    pub files_skipped: usize,
    pub references: usize,
    pub cache_hits: usize,
    pub downloaded: usize,
    pub failed: usize,
    pub rewritten: usize,
    pub unresolved: usize,
    pub bytes_fetched: u64,
    pub duration: Duration,
}

impl BatchReport {
    pub fn record(&mut self, file: &FileReport) {
        self.files_processed += 1;
        self.references += file.references;
        self.cache_hits += file.cache_hits;
        self.downloaded += file.downloaded;
        self.failed += file.failed;
        self.rewritten += file.rewritten;
        self.unresolved += file.unresolved;
        self.bytes_fetched += file.bytes_fetched;
    }

    pub fn log_summary(&self) {
        info!(
            "Processed {}/{} schedule files ({} unchanged, {} skipped) in {}",
            self.files_processed,
            self.files_discovered,
            self.files_unchanged,
            self.files_skipped,
            format_duration(self.duration.as_millis() as u64)
        );
        info!(
            "Logos: {} references, {} cached, {} downloaded ({}), {} failed, {} rewritten, {} left unresolved",
            self.references,
            self.cache_hits,
            self.downloaded,
            format_bytes(self.bytes_fetched),
            self.failed,
            self.rewritten,
            self.unresolved
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_batch_report_accumulates() {
        let mut batch = BatchReport::default();
        let file = FileReport {
            references: 3,
            cache_hits: 1,
            downloaded: 1,
            failed: 1,
            rewritten: 2,
            unresolved: 1,
            bytes_fetched: 2048,
            ..Default::default()
        };

        batch.record(&file);
        batch.record(&file);

        assert_eq!(batch.files_processed, 2);
        assert_eq!(batch.references, 6);
        assert_eq!(batch.rewritten, 4);
        assert_eq!(batch.bytes_fetched, 4096);
    }
}
