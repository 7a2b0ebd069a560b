//! Centralized error handling for the logo sync pipeline
//!
//! # Error Categories
//!
//! - **Fetch Errors**: transport failures and final HTTP statuses
//! - **Image Errors**: decode, encode and artifact write failures
//! - **Schedule Errors**: unreadable or malformed schedule files
//!
//! None of these abort a batch run. Workers and the batch driver log them and
//! move on to the next task or file.

pub mod types;

pub use types::*;

/// Convenience type alias for Results using AppError
pub type AppResult<T> = Result<T, AppError>;

/// Convenience type alias for fetch Results
pub type FetchResult<T> = Result<T, FetchError>;

/// Convenience type alias for image conversion Results
pub type ImageResult<T> = Result<T, ImageError>;

/// Convenience type alias for schedule Results
pub type ScheduleResult<T> = Result<T, ScheduleError>;
