//! Crash-safe file persistence
//!
//! Every file this crate produces is written to a `.part` sibling first and
//! renamed onto its final path, so a reader sees either nothing (or the
//! previous version) or the complete new file.

use std::io;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Temporary sibling used while `path` is being written
pub fn part_path(path: &Path) -> PathBuf {
    path.with_extension("part")
}

/// Write `contents` to `path` through a `.part` sibling and an atomic rename
///
/// The parent directory must already exist. On failure the `.part` file is
/// removed and the final path is left untouched.
pub async fn write_atomic(path: &Path, contents: &[u8]) -> io::Result<()> {
    let tmp = part_path(path);

    let result = async {
        tokio::fs::write(&tmp, contents).await?;
        tokio::fs::rename(&tmp, path).await
    }
    .await;

    if result.is_err() {
        remove_if_exists(&tmp).await;
    }
    result
}

/// Remove a file, ignoring a missing file and logging anything else
pub async fn remove_if_exists(path: &Path) {
    match tokio::fs::remove_file(path).await {
        Ok(()) => debug!("Removed {}", path.display()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(e) => debug!("Failed to remove {}: {}", path.display(), e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_part_path_keeps_directory() {
        let path = Path::new("/out/news/today/logo_0123456789.webp");
        assert_eq!(
            part_path(path),
            PathBuf::from("/out/news/today/logo_0123456789.part")
        );
    }

    #[tokio::test]
    async fn test_write_atomic_replaces_and_leaves_no_part() {
        let dir = TempDir::new().unwrap();
        let target = dir.path().join("channel.json");
        tokio::fs::write(&target, b"old").await.unwrap();

        write_atomic(&target, b"new").await.unwrap();

        assert_eq!(tokio::fs::read(&target).await.unwrap(), b"new");
        assert!(!part_path(&target).exists());
    }

    #[tokio::test]
    async fn test_write_atomic_missing_parent_fails_cleanly() {
        let dir = TempDir::new().unwrap();
        let target = dir.path().join("missing").join("logo.webp");

        assert!(write_atomic(&target, b"data").await.is_err());
        assert!(!target.exists());
        assert!(!part_path(&target).exists());
    }
}
