/// Configuration default values
///
/// This module contains all the default values for configuration options,
/// making them easily changeable in one central location.
// Storage defaults
pub const DEFAULT_OUTPUT_ROOT: &str = "./downloaded-images";
pub const DEFAULT_PUBLIC_PREFIX: &str = "http://localhost:8080/downloaded-images";

// Collection defaults
pub const DEFAULT_TODAY_COLLECTION: &str = "./today";
pub const DEFAULT_TOMORROW_COLLECTION: &str = "./tomorrow";

// Image defaults
pub const DEFAULT_TARGET_WIDTH: u32 = 250;
pub const DEFAULT_WEBP_QUALITY: f32 = 80.0;
pub const DEFAULT_WEBP_METHOD: i32 = 6;

// Fetch defaults
pub const DEFAULT_MAX_WORKERS: usize = 30;
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 20;
pub const DEFAULT_RETRIES: u32 = 3;
pub const DEFAULT_BACKOFF_FACTOR: f64 = 0.5;
pub const DEFAULT_MAX_BACKOFF_SECS: u64 = 120;
pub const DEFAULT_RETRY_STATUSES: [u16; 5] = [429, 500, 502, 503, 504];
pub const DEFAULT_MAX_IMAGE_BYTES: u64 = 20 * 1024 * 1024; // 20MB
pub const DEFAULT_PROGRESS_INTERVAL: usize = 25;

pub fn default_user_agent() -> String {
    format!("epg-logo-sync/{}", env!("CARGO_PKG_VERSION"))
}
