//! Error types for `termshot_core`.
//!
//! All failures are funnelled through [`TermshotError`], which uses
//! `thiserror` for `Display` and `Error` derives.  Every variant is terminal
//! at the point it is raised; the binaries map it to a process exit code via
//! [`TermshotError::exit_code`].

use std::path::PathBuf;

use thiserror::Error;

/// Top-level error type for the `termshot_core` library.
///
/// Each variant corresponds to a distinct failure category.
#[derive(Debug, Error)]
pub enum TermshotError {
    /// A required external program (screencapture, git, gh) is not installed.
    #[error("missing dependency: {0}")]
    MissingDependency(String),

    /// Caller-supplied options violate an invariant.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// The screenshot utility exited non-zero.
    #[error("screencapture failed with exit code {code}{}", stderr_suffix(.stderr))]
    CaptureFailed { code: i32, stderr: String },

    /// The screenshot utility reported success but left no file behind.
    #[error("screenshot file was not created: {}", .0.display())]
    ArtifactMissing(PathBuf),

    /// Spawning or signalling the launched application failed.
    #[error("process error: {0}")]
    ProcessError(String),

    /// Version bump, metadata mirroring, or git / gh step failed.
    #[error("release error: {0}")]
    ReleaseError(String),

    /// SIGINT / SIGTERM / SIGHUP arrived while waiting.
    #[error("interrupted")]
    Interrupted,

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

fn stderr_suffix(stderr: &str) -> String {
    let trimmed = stderr.trim();
    if trimmed.is_empty() {
        String::new()
    } else {
        format!(": {trimmed}")
    }
}

impl TermshotError {
    /// Process exit status the CLI tools use for this error.
    pub fn exit_code(&self) -> u8 {
        match self {
            TermshotError::MissingDependency(_) => 127,
            TermshotError::InvalidArgument(_) => 2,
            TermshotError::Interrupted => 130,
            _ => 1,
        }
    }
}
