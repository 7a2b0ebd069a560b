//! Writer for the EPG collaborator's per-channel output
//!
//! The upstream EPG step produces one `{collection}/{channel-slug}.json` per
//! channel and day. A day without programmes gets no file at all, so the
//! batch driver never sees an empty schedule for it.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use tracing::{debug, info};

use crate::errors::{ScheduleError, ScheduleResult};
use crate::utils::fs::write_atomic;

static WHITESPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());
static DISALLOWED: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[^a-z0-9\-]").unwrap());
static REPEATED_DASH: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"-{2,}").unwrap());

/// One programme in a channel's day schedule
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleEntry {
    pub show_name: String,
    pub start_time: String,
    pub end_time: String,
    pub show_logo: String,
}

/// Document written per channel and day
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChannelSchedule {
    pub channel_name: String,
    pub date: String,
    pub schedule: Vec<ScheduleEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExportOutcome {
    Written(PathBuf),
    /// Nothing scheduled for the day; no file was created
    Skipped,
}

/// File-name slug for a channel name
///
/// Lowercases, turns whitespace runs into `-`, drops anything outside
/// `[a-z0-9-]`, collapses dashes and trims them. Falls back to `channel`.
pub fn slugify(name: &str) -> String {
    let lowered = name.trim().to_lowercase();
    let dashed = WHITESPACE.replace_all(&lowered, "-");
    let cleaned = DISALLOWED.replace_all(&dashed, "");
    let collapsed = REPEATED_DASH.replace_all(&cleaned, "-");
    let trimmed = collapsed.trim_matches('-');

    if trimmed.is_empty() {
        "channel".to_string()
    } else {
        trimmed.to_string()
    }
}

/// Write a channel's schedule into `collection_dir` unless it is empty
pub async fn write_channel_schedule(
    collection_dir: &Path,
    schedule: &ChannelSchedule,
) -> ScheduleResult<ExportOutcome> {
    if schedule.schedule.is_empty() {
        debug!(
            "No programmes for {} on {}, not writing a file",
            schedule.channel_name, schedule.date
        );
        return Ok(ExportOutcome::Skipped);
    }

    tokio::fs::create_dir_all(collection_dir)
        .await
        .map_err(|e| ScheduleError::io(collection_dir, e))?;

    let path = collection_dir.join(format!("{}.json", slugify(&schedule.channel_name)));
    let json = serde_json::to_string_pretty(schedule).map_err(|e| ScheduleError::json(&path, e))?;
    write_atomic(&path, json.as_bytes())
        .await
        .map_err(|e| ScheduleError::io(&path, e))?;

    info!(
        "Wrote {} programmes for {} to {}",
        schedule.schedule.len(),
        schedule.channel_name,
        path.display()
    );
    Ok(ExportOutcome::Written(path))
}
