//! Error type definitions for the logo sync pipeline
//!
//! Errors are grouped by the layer that raises them: remote fetches, image
//! conversion and schedule file handling. `AppError` wraps all of them for
//! code that crosses layers.

use std::path::PathBuf;
use thiserror::Error;

/// Top-level application error type
#[derive(Error, Debug)]
pub enum AppError {
    /// Remote fetch errors
    #[error("Fetch error: {0}")]
    Fetch(#[from] FetchError),

    /// Image decode/encode errors
    #[error("Image error: {0}")]
    Image(#[from] ImageError),

    /// Schedule file errors
    #[error("Schedule error: {0}")]
    Schedule(#[from] ScheduleError),

    /// Configuration errors
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    /// Filesystem errors outside of schedule handling
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Errors raised while downloading a remote image
#[derive(Error, Debug)]
pub enum FetchError {
    /// Transport level failure (DNS, connect, TLS, timeout, body read)
    #[error("Request to {url} failed: {message}")]
    Transport { url: String, message: String },

    /// Final non-success status after the retry policy gave up
    #[error("HTTP {status} from {url} after {attempts} attempt(s)")]
    Status {
        url: String,
        status: u16,
        attempts: u32,
    },

    /// Body exceeded the configured limit
    #[error("Response from {url} too large: {size} bytes (max: {max_size})")]
    TooLarge {
        url: String,
        size: u64,
        max_size: u64,
    },

    /// The URL could not be used for a request at all
    #[error("Invalid URL {url}: {message}")]
    InvalidUrl { url: String, message: String },
}

/// Errors raised while converting downloaded bytes into an artifact
#[derive(Error, Debug)]
pub enum ImageError {
    /// Bytes are not a decodable image
    #[error("Failed to decode image: {0}")]
    Decode(#[from] image::ImageError),

    /// Image dimensions cannot be used for the configured resize policy
    #[error("Invalid image dimensions {width}x{height}")]
    InvalidDimensions { width: u32, height: u32 },

    /// WEBP encoder failure
    #[error("Failed to encode WEBP: {message}")]
    Encode { message: String },

    /// Temporary or final artifact file could not be written
    #[error("Failed to write artifact {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The blocking conversion task did not complete
    #[error("Conversion task aborted: {message}")]
    Aborted { message: String },
}

/// Errors raised while loading or persisting schedule files
#[derive(Error, Debug)]
pub enum ScheduleError {
    /// File could not be read or written
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// File content is not valid JSON
    #[error("Invalid JSON in {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// JSON is valid but the top level is not an object
    #[error("Unexpected document shape in {path}: {message}")]
    Shape { path: PathBuf, message: String },

    /// File name has no usable stem to derive a slug from
    #[error("Cannot derive slug from {path}")]
    InvalidName { path: PathBuf },
}

impl AppError {
    /// Create a configuration error
    pub fn configuration<S: Into<String>>(message: S) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Create an I/O error bound to a path
    pub fn io<P: Into<PathBuf>>(path: P, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

impl FetchError {
    /// Create a transport error
    pub fn transport<U: Into<String>, M: Into<String>>(url: U, message: M) -> Self {
        Self::Transport {
            url: url.into(),
            message: message.into(),
        }
    }

    /// Create a final status error
    pub fn status<U: Into<String>>(url: U, status: u16, attempts: u32) -> Self {
        Self::Status {
            url: url.into(),
            status,
            attempts,
        }
    }
}

impl ImageError {
    /// Create an encode error
    pub fn encode<M: Into<String>>(message: M) -> Self {
        Self::Encode {
            message: message.into(),
        }
    }

    /// Create a write error
    pub fn write<P: Into<PathBuf>>(path: P, source: std::io::Error) -> Self {
        Self::Write {
            path: path.into(),
            source,
        }
    }
}

impl ScheduleError {
    /// Create an I/O error
    pub fn io<P: Into<PathBuf>>(path: P, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Create a JSON error
    pub fn json<P: Into<PathBuf>>(path: P, source: serde_json::Error) -> Self {
        Self::Json {
            path: path.into(),
            source,
        }
    }

    /// Create a document shape error
    pub fn shape<P: Into<PathBuf>, M: Into<String>>(path: P, message: M) -> Self {
        Self::Shape {
            path: path.into(),
            message: message.into(),
        }
    }
}
