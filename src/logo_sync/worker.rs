//! Fetch-convert worker: one task from download to committed artifact

use std::sync::Arc;
use tracing::{debug, warn};

use super::converter::{ConversionProfile, convert_to_webp};
use super::planner::FetchTask;
use crate::errors::{AppError, AppResult, ImageError};
use crate::utils::fs::{part_path, remove_if_exists, write_atomic};
use crate::utils::http_client::ImageSource;
use crate::utils::url::UrlUtils;

/// Terminal state of a single task as seen by the worker
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskOutcome {
    Succeeded { bytes_fetched: u64 },
    Failed,
}

impl TaskOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, TaskOutcome::Succeeded { .. })
    }
}

/// Executes fetch tasks against a shared image source
pub struct FetchConvertWorker {
    source: Arc<dyn ImageSource>,
    profile: ConversionProfile,
}

impl FetchConvertWorker {
    pub fn new(source: Arc<dyn ImageSource>, profile: ConversionProfile) -> Self {
        Self { source, profile }
    }

    /// Run `task` to completion; failures are logged, never returned
    pub async fn run(&self, task: &FetchTask) -> TaskOutcome {
        match self.try_run(task).await {
            Ok(bytes_fetched) => {
                debug!(
                    "Stored {} ({} bytes fetched)",
                    task.target.display(),
                    bytes_fetched
                );
                TaskOutcome::Succeeded { bytes_fetched }
            }
            Err(e) => {
                let url = UrlUtils::obfuscate_credentials(task.url.as_str());
                match &e {
                    AppError::Fetch(_) => warn!("Download failed for {}: {}", url, e),
                    _ => warn!("Image convert failed for {}: {}", url, e),
                }
                remove_if_exists(&part_path(&task.target)).await;
                TaskOutcome::Failed
            }
        }
    }

    async fn try_run(&self, task: &FetchTask) -> AppResult<u64> {
        let bytes = self.source.fetch_bytes(task.url.as_str()).await?;
        let bytes_fetched = bytes.len() as u64;

        let resize = !task.url.has_resize_directive();
        let profile = self.profile;
        let converted = tokio::task::spawn_blocking(move || convert_to_webp(&bytes, resize, &profile))
            .await
            .map_err(|e| ImageError::Aborted {
                message: e.to_string(),
            })??;

        write_atomic(&task.target, &converted.data)
            .await
            .map_err(|e| ImageError::write(&task.target, e))?;

        Ok(bytes_fetched)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ImageConfig;
    use crate::errors::{FetchError, FetchResult};
    use crate::logo_sync::normalizer::NormalizedUrl;
    use async_trait::async_trait;
    use bytes::Bytes;
    use image::{DynamicImage, GenericImageView, ImageFormat, Rgb, RgbImage};
    use std::io::Cursor;
    use tempfile::TempDir;

    struct FixedSource(FetchResult<Bytes>);

    #[async_trait]
    impl ImageSource for FixedSource {
        async fn fetch_bytes(&self, url: &str) -> FetchResult<Bytes> {
            match &self.0 {
                Ok(bytes) => Ok(bytes.clone()),
                Err(_) => Err(FetchError::status(url, 404, 1)),
            }
        }
    }

    fn png(width: u32, height: u32) -> Bytes {
        let image = DynamicImage::ImageRgb8(RgbImage::from_pixel(width, height, Rgb([1, 2, 3])));
        let mut out = Cursor::new(Vec::new());
        image.write_to(&mut out, ImageFormat::Png).unwrap();
        Bytes::from(out.into_inner())
    }

    fn worker(source: FixedSource) -> FetchConvertWorker {
        FetchConvertWorker::new(
            Arc::new(source),
            ConversionProfile::from_config(&ImageConfig::default()),
        )
    }

    #[tokio::test]
    async fn test_success_commits_artifact() {
        let dir = TempDir::new().unwrap();
        let task = FetchTask {
            url: NormalizedUrl::new("https://img.example.com/a.png"),
            target: dir.path().join("a_0123456789.webp"),
        };

        let outcome = worker(FixedSource(Ok(png(400, 200)))).run(&task).await;

        assert!(outcome.is_success());
        assert!(task.target.exists());
        assert!(!part_path(&task.target).exists());
        let stored = image::open(&task.target).unwrap();
        assert_eq!(stored.dimensions(), (250, 125));
    }

    #[tokio::test]
    async fn test_directive_skips_local_resize() {
        let dir = TempDir::new().unwrap();
        let task = FetchTask {
            url: NormalizedUrl::new("https://img.example.com/a.png?lock=250x125"),
            target: dir.path().join("a_0123456789.webp"),
        };

        let outcome = worker(FixedSource(Ok(png(300, 90)))).run(&task).await;

        assert!(outcome.is_success());
        assert_eq!(image::open(&task.target).unwrap().dimensions(), (300, 90));
    }

    #[tokio::test]
    async fn test_failures_leave_no_files() {
        let dir = TempDir::new().unwrap();
        let task = FetchTask {
            url: NormalizedUrl::new("https://img.example.com/missing.png"),
            target: dir.path().join("missing_0123456789.webp"),
        };

        let not_found = FetchError::status("https://img.example.com/missing.png", 404, 1);
        let outcome = worker(FixedSource(Err(not_found))).run(&task).await;
        assert_eq!(outcome, TaskOutcome::Failed);

        let outcome = worker(FixedSource(Ok(Bytes::from_static(b"not an image"))))
            .run(&task)
            .await;
        assert_eq!(outcome, TaskOutcome::Failed);

        assert!(!task.target.exists());
        assert!(!part_path(&task.target).exists());
    }
}
