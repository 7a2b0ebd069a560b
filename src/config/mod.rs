use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use tracing::info;

pub mod defaults;
pub mod duration_serde;

use crate::errors::{AppError, AppResult};
use crate::schedule::ScheduleDay;
use defaults::*;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default = "default_collections")]
    pub collections: Vec<CollectionConfig>,
    #[serde(default)]
    pub images: ImageConfig,
    #[serde(default)]
    pub fetch: FetchConfig,
}

/// Where artifacts are written and how they are addressed publicly
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(default = "default_output_root")]
    pub output_root: PathBuf,
    /// Prefix for rewritten `show_logo` values; must serve `output_root`
    #[serde(default = "default_public_prefix")]
    pub public_prefix: String,
}

/// A directory of per-channel schedule files for one day
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CollectionConfig {
    pub path: PathBuf,
    /// Inferred from the path when omitted
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub day: Option<ScheduleDay>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageConfig {
    #[serde(default = "default_target_width")]
    pub target_width: u32,
    #[serde(default = "default_webp_quality")]
    pub webp_quality: f32,
    /// libwebp effort, 0 (fast) to 6 (slowest, smallest)
    #[serde(default = "default_webp_method")]
    pub webp_method: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchConfig {
    #[serde(default = "default_max_workers")]
    pub max_workers: usize,
    #[serde(default = "default_request_timeout", with = "duration_serde::duration")]
    pub request_timeout: Duration,
    /// Retries after the first attempt
    #[serde(default = "default_retries")]
    pub retries: u32,
    /// Seconds; delay before retry n is `backoff_factor * 2^(n-1)`
    #[serde(default = "default_backoff_factor")]
    pub backoff_factor: f64,
    #[serde(default = "default_max_backoff", with = "duration_serde::duration")]
    pub max_backoff: Duration,
    #[serde(default = "default_retry_statuses")]
    pub retry_statuses: Vec<u16>,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    #[serde(default = "default_max_image_bytes")]
    pub max_image_bytes: u64,
    /// Completed tasks between progress log lines
    #[serde(default = "default_progress_interval")]
    pub progress_interval: usize,
}

fn default_collections() -> Vec<CollectionConfig> {
    vec![
        CollectionConfig {
            path: PathBuf::from(DEFAULT_TODAY_COLLECTION),
            day: Some(ScheduleDay::Today),
        },
        CollectionConfig {
            path: PathBuf::from(DEFAULT_TOMORROW_COLLECTION),
            day: Some(ScheduleDay::Tomorrow),
        },
    ]
}

fn default_output_root() -> PathBuf {
    PathBuf::from(DEFAULT_OUTPUT_ROOT)
}

fn default_public_prefix() -> String {
    DEFAULT_PUBLIC_PREFIX.to_string()
}

fn default_target_width() -> u32 {
    DEFAULT_TARGET_WIDTH
}

fn default_webp_quality() -> f32 {
    DEFAULT_WEBP_QUALITY
}

fn default_webp_method() -> i32 {
    DEFAULT_WEBP_METHOD
}

fn default_max_workers() -> usize {
    DEFAULT_MAX_WORKERS
}

fn default_request_timeout() -> Duration {
    Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS)
}

fn default_retries() -> u32 {
    DEFAULT_RETRIES
}

fn default_backoff_factor() -> f64 {
    DEFAULT_BACKOFF_FACTOR
}

fn default_max_backoff() -> Duration {
    Duration::from_secs(DEFAULT_MAX_BACKOFF_SECS)
}

fn default_retry_statuses() -> Vec<u16> {
    DEFAULT_RETRY_STATUSES.to_vec()
}

fn default_max_image_bytes() -> u64 {
    DEFAULT_MAX_IMAGE_BYTES
}

fn default_progress_interval() -> usize {
    DEFAULT_PROGRESS_INTERVAL
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            output_root: default_output_root(),
            public_prefix: default_public_prefix(),
        }
    }
}

impl Default for ImageConfig {
    fn default() -> Self {
        Self {
            target_width: default_target_width(),
            webp_quality: default_webp_quality(),
            webp_method: default_webp_method(),
        }
    }
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            max_workers: default_max_workers(),
            request_timeout: default_request_timeout(),
            retries: default_retries(),
            backoff_factor: default_backoff_factor(),
            max_backoff: default_max_backoff(),
            retry_statuses: default_retry_statuses(),
            user_agent: default_user_agent(),
            max_image_bytes: default_max_image_bytes(),
            progress_interval: default_progress_interval(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            storage: StorageConfig::default(),
            collections: default_collections(),
            images: ImageConfig::default(),
            fetch: FetchConfig::default(),
        }
    }
}

impl CollectionConfig {
    /// Day classifier for files in this collection
    pub fn resolved_day(&self) -> ScheduleDay {
        self.day
            .unwrap_or_else(|| ScheduleDay::infer_from_path(&self.path))
    }
}

impl Config {
    pub fn load_from_file(config_file: &str) -> Result<Self> {
        if std::path::Path::new(&config_file).exists() {
            let contents = std::fs::read_to_string(config_file)?;
            let config: Self = toml::from_str(&contents)?;
            config.validate()?;
            Ok(config)
        } else {
            let default_config = Self::default();
            let contents = toml::to_string_pretty(&default_config)?;
            std::fs::write(config_file, contents)?;
            info!("Created default config file: {}", config_file);
            Ok(default_config)
        }
    }

    /// Reject values the pipeline cannot run with
    pub fn validate(&self) -> AppResult<()> {
        if self.images.target_width == 0 {
            return Err(AppError::configuration("images.target_width must be > 0"));
        }
        if !(0.0..=100.0).contains(&self.images.webp_quality) {
            return Err(AppError::configuration(
                "images.webp_quality must be within 0..=100",
            ));
        }
        if !(0..=6).contains(&self.images.webp_method) {
            return Err(AppError::configuration(
                "images.webp_method must be within 0..=6",
            ));
        }
        if self.fetch.max_workers == 0 {
            return Err(AppError::configuration("fetch.max_workers must be > 0"));
        }
        if self.fetch.backoff_factor < 0.0 || !self.fetch.backoff_factor.is_finite() {
            return Err(AppError::configuration(
                "fetch.backoff_factor must be a non-negative number",
            ));
        }
        if self.storage.public_prefix.trim().is_empty() {
            return Err(AppError::configuration(
                "storage.public_prefix must not be empty",
            ));
        }
        Ok(())
    }
}
