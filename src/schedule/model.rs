//! Per-channel schedule documents
//!
//! Documents are kept as ordered JSON maps so that every field the EPG
//! collaborator wrote survives a rewrite unchanged and in its original order.
//! Only `schedule[i].show_logo` is ever modified.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::path::{Path, PathBuf};

use crate::errors::{ScheduleError, ScheduleResult};
use crate::utils::fs::write_atomic;

/// Which day a schedule collection covers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScheduleDay {
    Today,
    Tomorrow,
}

impl ScheduleDay {
    pub fn as_str(&self) -> &'static str {
        match self {
            ScheduleDay::Today => "today",
            ScheduleDay::Tomorrow => "tomorrow",
        }
    }

    /// `today` when the path mentions it (case-insensitive), otherwise `tomorrow`
    pub fn infer_from_path(path: &Path) -> Self {
        if path.to_string_lossy().to_lowercase().contains("today") {
            ScheduleDay::Today
        } else {
            ScheduleDay::Tomorrow
        }
    }
}

impl fmt::Display for ScheduleDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A `show_logo` value found at a position in the schedule array
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogoReference {
    pub index: usize,
    pub url: String,
}

/// Slug for a schedule file: stem lowercased with spaces turned into `-`
pub fn slug_from_path(path: &Path) -> Option<String> {
    let stem = path.file_stem()?.to_str()?;
    if stem.is_empty() {
        return None;
    }
    Some(stem.to_lowercase().replace(' ', "-"))
}

/// One channel's schedule for one day, loaded from disk
#[derive(Debug, Clone)]
pub struct ScheduleFile {
    path: PathBuf,
    slug: String,
    day: ScheduleDay,
    document: Map<String, Value>,
}

impl ScheduleFile {
    /// Read and parse a schedule file
    pub async fn load(path: &Path, day: ScheduleDay) -> ScheduleResult<Self> {
        let contents = tokio::fs::read(path)
            .await
            .map_err(|e| ScheduleError::io(path, e))?;
        let document: Value =
            serde_json::from_slice(&contents).map_err(|e| ScheduleError::json(path, e))?;
        Self::from_document(path, day, document)
    }

    /// Wrap an already parsed document
    pub fn from_document(path: &Path, day: ScheduleDay, document: Value) -> ScheduleResult<Self> {
        let slug = slug_from_path(path).ok_or_else(|| ScheduleError::InvalidName {
            path: path.to_path_buf(),
        })?;

        let Value::Object(document) = document else {
            return Err(ScheduleError::shape(path, "top level is not a JSON object"));
        };

        Ok(Self {
            path: path.to_path_buf(),
            slug,
            day,
            document,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn slug(&self) -> &str {
        &self.slug
    }

    pub fn day(&self) -> ScheduleDay {
        self.day
    }

    /// Whether `schedule` is present and is an array
    pub fn has_schedule_list(&self) -> bool {
        matches!(self.document.get("schedule"), Some(Value::Array(_)))
    }

    fn items(&self) -> &[Value] {
        match self.document.get("schedule") {
            Some(Value::Array(items)) => items,
            _ => &[],
        }
    }

    /// Items whose `show_logo` is a non-empty string, in schedule order
    pub fn logo_references(&self) -> Vec<LogoReference> {
        self.items()
            .iter()
            .enumerate()
            .filter_map(|(index, item)| {
                let url = item.get("show_logo")?.as_str()?;
                (!url.is_empty()).then(|| LogoReference {
                    index,
                    url: url.to_string(),
                })
            })
            .collect()
    }

    pub fn show_logo(&self, index: usize) -> Option<&str> {
        self.items().get(index)?.get("show_logo")?.as_str()
    }

    /// Overwrite `show_logo` of the item at `index`; false if there is no such object
    pub fn set_show_logo(&mut self, index: usize, value: String) -> bool {
        let Some(Value::Array(items)) = self.document.get_mut("schedule") else {
            return false;
        };
        match items.get_mut(index) {
            Some(Value::Object(item)) => {
                item.insert("show_logo".to_string(), Value::String(value));
                true
            }
            _ => false,
        }
    }

    /// Two-space indented JSON with non-ASCII characters kept literal
    pub fn to_pretty_json(&self) -> ScheduleResult<String> {
        serde_json::to_string_pretty(&self.document).map_err(|e| ScheduleError::json(&self.path, e))
    }

    /// Overwrite the source file with the current document
    pub async fn persist(&self) -> ScheduleResult<()> {
        let json = self.to_pretty_json()?;
        write_atomic(&self.path, json.as_bytes())
            .await
            .map_err(|e| ScheduleError::io(&self.path, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample() -> ScheduleFile {
        ScheduleFile::from_document(
            Path::new("/epg/today/Star Sports 1.json"),
            ScheduleDay::Today,
            json!({
                "channel_name": "Star Sports 1",
                "date": "October 19, 2026",
                "schedule": [
                    {"show_name": "News", "show_logo": "https://img.example.com/a.png"},
                    {"show_name": "Film", "show_logo": ""},
                    {"show_name": "Talk"},
                    {"show_name": "Match", "show_logo": 42},
                    "not an object",
                    {"show_name": "Late", "show_logo": "https://img.example.com/b.png"}
                ]
            }),
        )
        .unwrap()
    }

    #[test]
    fn test_slug_and_day() {
        let file = sample();
        assert_eq!(file.slug(), "star-sports-1");
        assert_eq!(file.day(), ScheduleDay::Today);
        assert_eq!(
            ScheduleDay::infer_from_path(Path::new("/data/TODAY/x.json")),
            ScheduleDay::Today
        );
        assert_eq!(
            ScheduleDay::infer_from_path(Path::new("/data/next/x.json")),
            ScheduleDay::Tomorrow
        );
    }

    #[test]
    fn test_logo_references_skip_empty_and_non_strings() {
        let refs = sample().logo_references();
        assert_eq!(
            refs,
            vec![
                LogoReference {
                    index: 0,
                    url: "https://img.example.com/a.png".to_string()
                },
                LogoReference {
                    index: 5,
                    url: "https://img.example.com/b.png".to_string()
                },
            ]
        );
    }

    #[test]
    fn test_set_show_logo_preserves_key_order() {
        let mut file = sample();
        assert!(file.set_show_logo(0, "https://cdn.example.com/x.webp".to_string()));
        assert!(!file.set_show_logo(4, "ignored".to_string()));
        assert!(!file.set_show_logo(99, "ignored".to_string()));

        let json = file.to_pretty_json().unwrap();
        let channel = json.find("\"channel_name\"").unwrap();
        let date = json.find("\"date\"").unwrap();
        let schedule = json.find("\"schedule\"").unwrap();
        assert!(channel < date && date < schedule);
        assert_eq!(file.show_logo(0), Some("https://cdn.example.com/x.webp"));
    }

    #[test]
    fn test_pretty_json_keeps_non_ascii() {
        let file = ScheduleFile::from_document(
            Path::new("/epg/today/zee.json"),
            ScheduleDay::Today,
            json!({"channel_name": "ज़ी टीवी", "schedule": []}),
        )
        .unwrap();
        let json = file.to_pretty_json().unwrap();
        assert!(json.contains("ज़ी टीवी"));
        assert!(json.contains("\n  \"schedule\": []"));
    }

    #[test]
    fn test_non_object_document_is_rejected() {
        let result = ScheduleFile::from_document(
            Path::new("/epg/today/list.json"),
            ScheduleDay::Today,
            json!([1, 2, 3]),
        );
        assert!(matches!(result, Err(ScheduleError::Shape { .. })));
    }

    #[test]
    fn test_missing_schedule_has_no_references() {
        let file = ScheduleFile::from_document(
            Path::new("/epg/today/empty.json"),
            ScheduleDay::Today,
            json!({"channel_name": "Empty", "schedule": {"oops": true}}),
        )
        .unwrap();
        assert!(!file.has_schedule_list());
        assert!(file.logo_references().is_empty());
    }
}
