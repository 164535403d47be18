//! Screenshot artifact RAII guard.
//!
//! [`ArtifactGuard`] removes the screenshot file when it goes out of scope,
//! whether the workflow succeeded, failed, or was interrupted, unless the
//! caller asked to keep it.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// Removes `path` on `Drop` unless `keep` was set.
#[must_use = "ArtifactGuard must be kept alive until the artifact is no longer needed"]
#[derive(Debug)]
pub struct ArtifactGuard {
    path: PathBuf,
    keep: bool,
}

impl ArtifactGuard {
    pub fn new(path: impl Into<PathBuf>, keep: bool) -> Self {
        Self {
            path: path.into(),
            keep,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn keeps(&self) -> bool {
        self.keep
    }
}

impl Drop for ArtifactGuard {
    fn drop(&mut self) {
        if self.keep {
            log::debug!("keeping screenshot {}", self.path.display());
            return;
        }
        match fs::remove_file(&self.path) {
            Ok(()) => log::debug!("removed screenshot {}", self.path.display()),
            // Nothing was captured; nothing to clean.
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => log::warn!("could not remove {}: {e}", self.path.display()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_removes_artifact_on_drop() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("shot.png");
        fs::write(&path, b"png").unwrap();
        {
            let _guard = ArtifactGuard::new(&path, false);
        }
        assert!(!path.exists());
    }

    #[test]
    fn test_keep_leaves_artifact() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("shot.png");
        fs::write(&path, b"png").unwrap();
        {
            let guard = ArtifactGuard::new(&path, true);
            assert!(guard.keeps());
        }
        assert!(path.exists());
    }

    #[test]
    fn test_removes_artifact_on_error_path() {
        fn failing(path: &Path) -> Result<(), String> {
            let _guard = ArtifactGuard::new(path, false);
            fs::write(path, b"partial").unwrap();
            Err("capture failed".into())
        }
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("shot.png");
        assert!(failing(&path).is_err());
        assert!(!path.exists());
    }

    #[test]
    fn test_missing_artifact_is_ignored() {
        let dir = tempfile::tempdir().unwrap();
        let _guard = ArtifactGuard::new(dir.path().join("never-written.png"), false);
    }
}
