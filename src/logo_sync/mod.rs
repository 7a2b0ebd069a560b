//! Logo acquisition and normalization pipeline
//!
//! Per schedule file the stages run in order:
//!
//! 1. [`planner`] normalizes and deduplicates logo URLs and skips artifacts
//!    already on disk
//! 2. [`orchestrator`] runs the remaining [`worker`] tasks with bounded
//!    concurrency
//! 3. [`rewriter`] points resolved `show_logo` fields at the public artifact
//!    URLs before the file is written back

pub mod converter;
pub mod normalizer;
pub mod orchestrator;
pub mod pipeline;
pub mod planner;
pub mod report;
pub mod rewriter;
pub mod worker;

pub use normalizer::{NormalizedUrl, normalize_logo_url};
pub use pipeline::{FileOutcome, LogoSyncPipeline};
pub use planner::{FetchTask, ResultIndex, TaskPlanner, artifact_filename};
pub use report::{BatchReport, FileReport};
