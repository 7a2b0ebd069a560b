//! Logo URL normalization
//!
//! Origin image servers accept a `lock=WIDTHxHEIGHT` query parameter that asks
//! for a pre-scaled rendition. Rewriting it to the target width lets the
//! origin do the resize, and mapping every variant of the same asset onto one
//! [`NormalizedUrl`] lets a file pass fetch it once.

use std::fmt;
use std::hash::{Hash, Hasher};
use url::Url;

/// Query parameter carrying the resize directive
pub const RESIZE_PARAM: &str = "lock";

const RESIZE_SEPARATOR: char = 'x';

/// Rewrite the resize directive of `url` for `target_width`
///
/// Never fails: a URL without a directive, or one that cannot be handled,
/// comes back unmodified.
///
/// ```rust
/// use epg_logo_sync::logo_sync::normalizer::normalize_logo_url;
///
/// assert_eq!(
///     normalize_logo_url("https://img.example.com/a.png?lock=100x50", 250),
///     "https://img.example.com/a.png?lock=250x125"
/// );
/// assert_eq!(
///     normalize_logo_url("https://img.example.com/a.png", 250),
///     "https://img.example.com/a.png"
/// );
/// ```
pub fn normalize_logo_url(url: &str, target_width: u32) -> String {
    try_normalize(url, target_width).unwrap_or_else(|| url.to_string())
}

fn try_normalize(url: &str, target_width: u32) -> Option<String> {
    let mut parsed = Url::parse(url).ok()?;
    let pairs: Vec<(String, String)> = parsed.query_pairs().into_owned().collect();

    // No directive: hand the input back untouched
    let directive = pairs
        .iter()
        .find(|(key, _)| key == RESIZE_PARAM)
        .map(|(_, value)| value.as_str())?;
    let rebuilt: Vec<(String, String)> = match rewrite_directive(directive, target_width)? {
        // Every pair, repeated directives included, goes back as it was
        DirectiveRewrite::Unchanged => pairs,
        DirectiveRewrite::Rewritten(rewritten) => {
            // First directive is replaced in place, repeats are dropped
            let mut seen = false;
            pairs
                .into_iter()
                .filter_map(|(key, value)| {
                    if key != RESIZE_PARAM {
                        return Some((key, value));
                    }
                    if seen {
                        return None;
                    }
                    seen = true;
                    Some((key, rewritten.clone()))
                })
                .collect()
        }
    };

    {
        let mut query = parsed.query_pairs_mut();
        query.clear().extend_pairs(rebuilt);
    }

    Some(parsed.to_string())
}

#[derive(Debug, PartialEq, Eq)]
enum DirectiveRewrite {
    /// No separator: nothing to scale, the query is only re-serialized
    Unchanged,
    Rewritten(String),
}

/// Rewrite of a directive value, or `None` when it cannot be split into a pair
fn rewrite_directive(value: &str, target_width: u32) -> Option<DirectiveRewrite> {
    if !value.contains(RESIZE_SEPARATOR) {
        return Some(DirectiveRewrite::Unchanged);
    }

    let mut parts = value.split(RESIZE_SEPARATOR);
    let (width, height) = (parts.next()?, parts.next()?);
    if parts.next().is_some() {
        return None;
    }

    let rewritten = match (parse_dimension(width), parse_dimension(height)) {
        (Some(width), Some(height)) if width != 0 => {
            let scale = f64::from(target_width) / width as f64;
            let new_height = (height as f64 * scale).round_ties_even().max(1.0) as i64;
            format!("{target_width}{RESIZE_SEPARATOR}{new_height}")
        }
        _ => format!("{target_width}{RESIZE_SEPARATOR}{target_width}"),
    };

    Some(DirectiveRewrite::Rewritten(rewritten))
}

fn parse_dimension(value: &str) -> Option<i64> {
    value.trim().parse::<i64>().ok()
}

/// A normalized logo URL used as the fetch and deduplication key
///
/// Equality and hashing ignore query parameter order: two URLs carrying the
/// same parameter multiset in a different order are the same asset.
#[derive(Debug, Clone)]
pub struct NormalizedUrl {
    url: String,
    key: String,
    has_resize_directive: bool,
}

impl NormalizedUrl {
    /// Wrap an already normalized URL
    pub fn new(url: impl Into<String>) -> Self {
        let url = url.into();

        match Url::parse(&url) {
            Ok(parsed) => {
                let has_resize_directive = parsed.query_pairs().any(|(key, _)| key == RESIZE_PARAM);
                let key = canonical_key(&parsed);
                Self {
                    url,
                    key,
                    has_resize_directive,
                }
            }
            Err(_) => Self {
                has_resize_directive: url.contains(&format!("{RESIZE_PARAM}=")),
                key: url.clone(),
                url,
            },
        }
    }

    /// Normalize a remote URL for `target_width` and wrap it
    pub fn from_remote(url: &str, target_width: u32) -> Self {
        Self::new(normalize_logo_url(url, target_width))
    }

    /// URL to request
    pub fn as_str(&self) -> &str {
        &self.url
    }

    /// Order-independent form used for equality and artifact naming
    pub fn canonical_key(&self) -> &str {
        &self.key
    }

    /// Whether the origin was asked for a specific size
    pub fn has_resize_directive(&self) -> bool {
        self.has_resize_directive
    }
}

fn canonical_key(parsed: &Url) -> String {
    let mut pairs: Vec<(String, String)> = parsed.query_pairs().into_owned().collect();
    pairs.sort();

    let mut canonical = parsed.clone();
    if pairs.is_empty() {
        canonical.set_query(None);
    } else {
        canonical.query_pairs_mut().clear().extend_pairs(pairs);
    }
    canonical.to_string()
}

impl PartialEq for NormalizedUrl {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key
    }
}

impl Eq for NormalizedUrl {}

impl Hash for NormalizedUrl {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.key.hash(state);
    }
}

impl fmt::Display for NormalizedUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use std::collections::HashSet;

    #[rstest]
    #[case("https://img.example.com/a.png?lock=100x50", "https://img.example.com/a.png?lock=250x125")]
    #[case("https://img.example.com/a.png?lock=abcxdef", "https://img.example.com/a.png?lock=250x250")]
    #[case("https://img.example.com/a.png?lock=100xdef", "https://img.example.com/a.png?lock=250x250")]
    #[case("https://img.example.com/a.png?lock=0x50", "https://img.example.com/a.png?lock=250x250")]
    #[case("https://img.example.com/a.png?lock=1000x1", "https://img.example.com/a.png?lock=250x1")]
    #[case("https://img.example.com/a.png?lock=500x201", "https://img.example.com/a.png?lock=250x100")]
    #[case("https://img.example.com/a.png?lock=500x203", "https://img.example.com/a.png?lock=250x102")]
    #[case("https://img.example.com/a.png?v=2&lock=100x50", "https://img.example.com/a.png?v=2&lock=250x125")]
    fn test_directive_rewrite(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(normalize_logo_url(input, 250), expected);
    }

    #[rstest]
    #[case("https://img.example.com/a.png")]
    #[case("https://img.example.com/a.png?v=2&size=big")]
    #[case("https://img.example.com/a%20b.png?q=hello%20world")]
    #[case("not a url at all")]
    #[case("")]
    #[case("https://img.example.com/a.png?lock=1x2x3")]
    #[case("https://img.example.com/a.png?lock=250&lock=10x10")]
    #[case("https://img.example.com/a.png?lock=250&v=1&lock=10x10")]
    fn test_returned_unchanged(#[case] input: &str) {
        assert_eq!(normalize_logo_url(input, 250), input);
    }

    #[test]
    fn test_separatorless_directive_is_noop_rewrite() {
        let normalized = normalize_logo_url("https://img.example.com/a.png?lock=250", 250);
        assert_eq!(normalized, "https://img.example.com/a.png?lock=250");
    }

    #[test]
    fn test_repeated_directive_collapses_to_one() {
        let normalized = normalize_logo_url(
            "https://img.example.com/a.png?lock=100x50&v=1&lock=10x10",
            250,
        );
        assert_eq!(normalized, "https://img.example.com/a.png?lock=250x125&v=1");
    }

    #[test]
    fn test_rounding_is_half_to_even() {
        // 250 * 3 / 4 = 187.5 rounds to 188, 250 * 1 / 4 = 62.5 rounds to 62
        assert_eq!(
            rewrite_directive("4x3", 250),
            Some(DirectiveRewrite::Rewritten("250x188".to_string()))
        );
        assert_eq!(
            rewrite_directive("4x1", 250),
            Some(DirectiveRewrite::Rewritten("250x62".to_string()))
        );
    }

    #[test]
    fn test_equality_ignores_parameter_order() {
        let a = NormalizedUrl::from_remote("https://img.example.com/a.png?lock=100x50&v=2", 250);
        let b = NormalizedUrl::from_remote("https://img.example.com/a.png?v=2&lock=200x100", 250);
        let c = NormalizedUrl::from_remote("https://img.example.com/a.png?v=3&lock=100x50", 250);

        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_ne!(a.as_str(), b.as_str());

        let set: HashSet<_> = [a, b, c].into_iter().collect();
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn test_resize_directive_detection() {
        assert!(NormalizedUrl::from_remote("https://img.example.com/a.png?lock=100x50", 250).has_resize_directive());
        assert!(!NormalizedUrl::from_remote("https://img.example.com/a.png?block=1", 250).has_resize_directive());
        assert!(!NormalizedUrl::from_remote("https://img.example.com/a.png", 250).has_resize_directive());
    }
}
