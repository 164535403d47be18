//! Release automation: bump the version file, mirror it into metadata, then
//! commit, tag, push, and optionally publish a GitHub release.
//!
//! Commands are built as plain argument vectors so they can be printed in
//! dry-run mode and checked in tests without touching a repository.

use std::path::{Path, PathBuf};
use std::process::Command;

use crate::errors::TermshotError;
use crate::process;
use crate::version::{self, BumpKind, Version};

pub const DEFAULT_VERSION_FILE: &str = "VERSION";

/// Everything a release will change.
#[derive(Debug, Clone)]
pub struct ReleasePlan {
    pub version_file: PathBuf,
    pub mirrors: Vec<PathBuf>,
    pub from: Version,
    pub to: Version,
}

impl ReleasePlan {
    /// Read the current version and compute the next one.
    pub fn prepare(
        version_file: &Path,
        kind: BumpKind,
        mirrors: &[PathBuf],
    ) -> Result<Self, TermshotError> {
        let from = version::read_version_file(version_file)?;
        if let Some(missing) = mirrors.iter().find(|m| !m.is_file()) {
            return Err(TermshotError::ReleaseError(format!(
                "mirror file {} does not exist",
                missing.display()
            )));
        }
        Ok(Self {
            version_file: version_file.to_path_buf(),
            mirrors: mirrors.to_vec(),
            from,
            to: from.bump(kind),
        })
    }

    pub fn tag(&self) -> String {
        self.to.tag()
    }

    /// Write the new version to the version file and every mirror.
    pub fn apply(&self) -> Result<(), TermshotError> {
        version::write_version_file(&self.version_file, &self.to)?;
        for mirror in &self.mirrors {
            if !version::mirror_json(mirror, &self.to)? {
                log::warn!("{} already at {}", mirror.display(), self.to);
            }
        }
        Ok(())
    }

    fn touched_files(&self) -> Vec<String> {
        std::iter::once(&self.version_file)
            .chain(self.mirrors.iter())
            .map(|p| p.to_string_lossy().into_owned())
            .collect()
    }

    /// add, commit, annotated tag, push branch, push tag.
    pub fn git_commands(&self) -> Vec<Vec<String>> {
        let tag = self.tag();
        let message = format!("Release {tag}");

        let mut add = vec!["git".to_owned(), "add".to_owned(), "--".to_owned()];
        add.extend(self.touched_files());

        vec![
            add,
            argv(&["git", "commit", "-m", &message]),
            argv(&["git", "tag", "-a", &tag, "-m", &message]),
            argv(&["git", "push"]),
            argv(&["git", "push", "origin", &tag]),
        ]
    }

    pub fn publish_command(&self) -> Vec<String> {
        let tag = self.tag();
        argv(&["gh", "release", "create", &tag, "--title", &tag, "--generate-notes"])
    }
}

fn argv(parts: &[&str]) -> Vec<String> {
    parts.iter().map(|s| (*s).to_owned()).collect()
}

/// Fail unless `git status --porcelain` is empty.
pub fn ensure_clean_worktree() -> Result<(), TermshotError> {
    let git = process::require_program("git")?;
    let output = Command::new(git)
        .args(["status", "--porcelain"])
        .output()
        .map_err(|e| TermshotError::ReleaseError(format!("git status failed: {e}")))?;
    if !output.status.success() {
        return Err(TermshotError::ReleaseError(format!(
            "git status failed: {}",
            String::from_utf8_lossy(&output.stderr).trim()
        )));
    }
    if !output.stdout.iter().all(u8::is_ascii_whitespace) {
        return Err(TermshotError::ReleaseError(
            "working tree has uncommitted changes (use --allow-dirty to override)".into(),
        ));
    }
    Ok(())
}

/// Run `argv` synchronously.  In dry-run mode only log it.
pub fn run_command(argv: &[String], dry_run: bool) -> Result<(), TermshotError> {
    let Some((program, args)) = argv.split_first() else {
        return Ok(());
    };
    let rendered = argv.join(" ");
    if dry_run {
        log::info!("dry run: {rendered}");
        return Ok(());
    }

    let resolved = process::require_program(program)?;
    log::debug!("running {rendered}");
    let status = Command::new(resolved)
        .args(args)
        .status()
        .map_err(|e| TermshotError::ReleaseError(format!("`{rendered}` failed to start: {e}")))?;
    if !status.success() {
        return Err(TermshotError::ReleaseError(format!(
            "`{rendered}` exited with {status}"
        )));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
