//! Utility modules for the logo sync pipeline
//!
//! This module contains reusable helpers that are not tied to a single
//! pipeline stage.

pub mod fs;
pub mod http_client;
pub mod human_format;
pub mod url;

pub use http_client::{ImageSource, RetryPolicy, RetryingHttpClient};
