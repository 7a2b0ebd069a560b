//! Schedule rewriting: point resolved `show_logo` values at local artifacts

use tracing::{trace, warn};

use super::planner::{PlannedReference, ResultIndex};
use crate::schedule::{ScheduleDay, ScheduleFile};
use crate::utils::url::UrlUtils;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RewriteStats {
    pub rewritten: usize,
    pub unresolved: usize,
}

/// Maps artifacts onto public URLs under a fixed prefix
#[derive(Debug, Clone)]
pub struct ScheduleRewriter {
    public_prefix: String,
}

impl ScheduleRewriter {
    pub fn new(public_prefix: &str) -> Self {
        Self {
            public_prefix: public_prefix.trim_end_matches('/').to_string(),
        }
    }

    /// `{prefix}/{slug}/{day}/{filename}`
    pub fn public_url(&self, slug: &str, day: ScheduleDay, filename: &str) -> String {
        format!("{}/{}/{}/{}", self.public_prefix, slug, day, filename)
    }

    /// Rewrite every resolved reference in place
    ///
    /// Unresolved references keep their original URL and are reported.
    pub fn apply(&self, file: &mut ScheduleFile, references: &[PlannedReference], results: &ResultIndex) -> RewriteStats {
        let mut stats = RewriteStats::default();

        for reference in references {
            let filename = results
                .get(&reference.normalized)
                .and_then(|artifact| artifact.file_name())
                .map(|name| name.to_string_lossy().into_owned());

            let Some(filename) = filename else {
                warn!(
                    "Failed image for {}",
                    UrlUtils::obfuscate_credentials(&reference.original_url)
                );
                stats.unresolved += 1;
                continue;
            };

            let public = self.public_url(file.slug(), file.day(), &filename);
            trace!("schedule[{}].show_logo -> {}", reference.index, public);
            if file.set_show_logo(reference.index, public) {
                stats.rewritten += 1;
            }
        }

        stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logo_sync::normalizer::NormalizedUrl;
    use serde_json::json;
    use std::path::{Path, PathBuf};
    use tracing_test::traced_test;

    fn reference(index: usize, url: &str) -> PlannedReference {
        PlannedReference {
            index,
            original_url: url.to_string(),
            normalized: NormalizedUrl::from_remote(url, 250),
        }
    }

    #[test]
    fn test_public_url_trims_prefix_slash() {
        let rewriter = ScheduleRewriter::new("https://cdn.example.com/logos/");
        assert_eq!(
            rewriter.public_url("news-24", ScheduleDay::Tomorrow, "a_0123456789.webp"),
            "https://cdn.example.com/logos/news-24/tomorrow/a_0123456789.webp"
        );
    }

    #[test]
    #[traced_test]
    fn test_unresolved_reference_is_kept_and_reported() {
        let mut file = ScheduleFile::from_document(
            Path::new("/epg/today/News 24.json"),
            ScheduleDay::Today,
            json!({
                "channel_name": "News 24",
                "schedule": [
                    {"show_name": "Morning", "show_logo": "https://img.example.com/ok.png"},
                    {"show_name": "Night", "show_logo": "https://img.example.com/gone.png?token=abc"}
                ]
            }),
        )
        .unwrap();

        let references = vec![
            reference(0, "https://img.example.com/ok.png"),
            reference(1, "https://img.example.com/gone.png?token=abc"),
        ];
        let mut results = ResultIndex::new();
        results.insert(
            references[0].normalized.clone(),
            PathBuf::from("/out/news-24/today/ok_0123456789.webp"),
        );

        let rewriter = ScheduleRewriter::new("http://localhost:8080/downloaded-images");
        let stats = rewriter.apply(&mut file, &references, &results);

        assert_eq!(stats, RewriteStats { rewritten: 1, unresolved: 1 });
        assert_eq!(
            file.show_logo(0),
            Some("http://localhost:8080/downloaded-images/news-24/today/ok_0123456789.webp")
        );
        assert_eq!(file.show_logo(1), Some("https://img.example.com/gone.png?token=abc"));
        assert!(logs_contain("Failed image for https://img.example.com/gone.png?token=****"));
    }
}
