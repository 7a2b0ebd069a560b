//! Task planning for one schedule file
//!
//! Groups a file's logo references by [`NormalizedUrl`], maps each distinct URL
//! onto a deterministic artifact path and emits a fetch task only for the
//! artifacts that are not on disk yet.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use tracing::{debug, trace};

use super::normalizer::NormalizedUrl;
use crate::errors::{AppError, AppResult};
use crate::schedule::{ScheduleDay, ScheduleFile};
use crate::utils::url::UrlUtils;

const ARTIFACT_EXTENSION: &str = "webp";
const HASH_PREFIX_LEN: usize = 10;

/// One download-and-convert job
#[derive(Debug, Clone)]
pub struct FetchTask {
    pub url: NormalizedUrl,
    pub target: PathBuf,
}

/// Successful artifacts of one file pass, keyed by normalized URL
#[derive(Debug, Default)]
pub struct ResultIndex {
    entries: HashMap<NormalizedUrl, PathBuf>,
}

impl ResultIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, url: NormalizedUrl, artifact: PathBuf) {
        self.entries.insert(url, artifact);
    }

    pub fn get(&self, url: &NormalizedUrl) -> Option<&Path> {
        self.entries.get(url).map(PathBuf::as_path)
    }

    pub fn contains(&self, url: &NormalizedUrl) -> bool {
        self.entries.contains_key(url)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// A schedule position together with its normalized URL
#[derive(Debug, Clone)]
pub struct PlannedReference {
    pub index: usize,
    pub original_url: String,
    pub normalized: NormalizedUrl,
}

/// Everything the pool and rewriter need for one file
#[derive(Debug)]
pub struct FilePlan {
    pub target_dir: PathBuf,
    pub references: Vec<PlannedReference>,
    pub tasks: Vec<FetchTask>,
    pub results: ResultIndex,
    pub distinct_urls: usize,
    pub cache_hits: usize,
}

fn md5_hex(input: &str) -> String {
    format!("{:x}", md5::compute(input.as_bytes()))
}

/// Artifact file name for a normalized URL
///
/// `{stem}_{hash10}.webp` where the stem comes from the decoded last path
/// segment and the hash from the canonical key, so parameter order never
/// changes the name.
pub fn artifact_filename(url: &NormalizedUrl) -> String {
    let digest = md5_hex(url.canonical_key());

    let mut basename = UrlUtils::decoded_basename(url.canonical_key());
    if basename.is_empty() {
        basename = format!("{digest}.img");
    }

    let stem = Path::new(&basename)
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or(basename);

    format!(
        "{}_{}.{}",
        stem,
        &digest[..HASH_PREFIX_LEN],
        ARTIFACT_EXTENSION
    )
    .replace(' ', "_")
}

/// Builds [`FilePlan`]s under a fixed output root
#[derive(Debug, Clone)]
pub struct TaskPlanner {
    output_root: PathBuf,
    target_width: u32,
}

impl TaskPlanner {
    pub fn new(output_root: impl Into<PathBuf>, target_width: u32) -> Self {
        Self {
            output_root: output_root.into(),
            target_width,
        }
    }

    /// `{output_root}/{slug}/{day}`
    pub fn target_dir(&self, slug: &str, day: ScheduleDay) -> PathBuf {
        self.output_root.join(slug).join(day.as_str())
    }

    /// Plan the fetches for `file`, creating its target directory
    pub async fn plan(&self, file: &ScheduleFile) -> AppResult<FilePlan> {
        let target_dir = self.target_dir(file.slug(), file.day());

        let references: Vec<PlannedReference> = file
            .logo_references()
            .into_iter()
            .map(|reference| PlannedReference {
                normalized: NormalizedUrl::from_remote(&reference.url, self.target_width),
                index: reference.index,
                original_url: reference.url,
            })
            .collect();

        // Distinct URLs in first-seen order keep the task list deterministic
        let mut seen = HashSet::new();
        let distinct: Vec<&NormalizedUrl> = references
            .iter()
            .map(|reference| &reference.normalized)
            .filter(|url| seen.insert(*url))
            .collect();

        if !distinct.is_empty() {
            tokio::fs::create_dir_all(&target_dir)
                .await
                .map_err(|e| AppError::io(&target_dir, e))?;
        }

        let mut results = ResultIndex::new();
        let mut tasks = Vec::new();
        let mut cache_hits = 0;

        for url in &distinct {
            let target = target_dir.join(artifact_filename(url));

            if tokio::fs::try_exists(&target).await.unwrap_or(false) {
                trace!("Artifact already present for {}: {}", url, target.display());
                results.insert((*url).clone(), target);
                cache_hits += 1;
            } else {
                tasks.push(FetchTask {
                    url: (*url).clone(),
                    target,
                });
            }
        }

        debug!(
            "Planned {}: {} references, {} distinct URLs, {} cached, {} to fetch",
            file.path().display(),
            references.len(),
            distinct.len(),
            cache_hits,
            tasks.len()
        );

        Ok(FilePlan {
            target_dir,
            distinct_urls: distinct.len(),
            references,
            tasks,
            results,
            cache_hits,
        })
    }
}
