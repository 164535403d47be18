//! Verification report: the JSON stub handed to a downstream vision model.
//!
//! The shape is fixed: `screenshot`, `prompt`, `file_size`, `timestamp`,
//! `status`, `note`, in that order.  The only validation is that the
//! screenshot exists and is not smaller than [`MIN_SCREENSHOT_BYTES`].

use std::fmt;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::errors::TermshotError;

/// Screenshots smaller than this are treated as corrupt or blank.
pub const MIN_SCREENSHOT_BYTES: u64 = 1000;

const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

const NOTE_PENDING: &str = "Screenshot captured. Analyze the image at `screenshot` with a \
                            vision model using `prompt`; no analysis has been performed.";

/// Outcome of the size check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportStatus {
    /// Artifact looks usable; analysis is up to the consumer.
    PendingAnalysis,
    /// Artifact is below [`MIN_SCREENSHOT_BYTES`].
    Invalid,
}

impl ReportStatus {
    pub fn for_size(file_size: u64) -> Self {
        if file_size < MIN_SCREENSHOT_BYTES {
            ReportStatus::Invalid
        } else {
            ReportStatus::PendingAnalysis
        }
    }
}

impl fmt::Display for ReportStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ReportStatus::PendingAnalysis => "pending_analysis",
            ReportStatus::Invalid => "invalid",
        })
    }
}

/// Fixed-shape verification record.
#[derive(Debug, Clone, Serialize)]
pub struct VerificationReport {
    pub screenshot: PathBuf,
    pub prompt: String,
    pub file_size: u64,
    pub timestamp: String,
    pub status: ReportStatus,
    pub note: String,
}

impl VerificationReport {
    /// Build a report for an artifact of `file_size` bytes captured at `at`.
    pub fn new(
        screenshot: impl Into<PathBuf>,
        prompt: impl Into<String>,
        file_size: u64,
        at: DateTime<Utc>,
    ) -> Self {
        let status = ReportStatus::for_size(file_size);
        let note = match status {
            ReportStatus::PendingAnalysis => NOTE_PENDING.to_owned(),
            ReportStatus::Invalid => format!(
                "Screenshot is only {file_size} bytes (minimum {MIN_SCREENSHOT_BYTES}); \
                 it is probably blank or corrupt."
            ),
        };
        Self {
            screenshot: screenshot.into(),
            prompt: prompt.into(),
            file_size,
            timestamp: at.format(TIMESTAMP_FORMAT).to_string(),
            status,
            note,
        }
    }

    /// Stat `screenshot` and build a report stamped with the current time.
    pub fn inspect(screenshot: &Path, prompt: &str) -> Result<Self, TermshotError> {
        let file_size = match fs::metadata(screenshot) {
            Ok(meta) if meta.is_file() => meta.len(),
            _ => return Err(TermshotError::ArtifactMissing(screenshot.to_path_buf())),
        };
        Ok(Self::new(screenshot, prompt, file_size, Utc::now()))
    }

    pub fn is_valid(&self) -> bool {
        self.status == ReportStatus::PendingAnalysis
    }

    pub fn to_json(&self) -> Result<String, TermshotError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Write pretty JSON to `output` (creating parent directories) or to
    /// stdout when `output` is `None`.
    pub fn emit(&self, output: Option<&Path>) -> Result<(), TermshotError> {
        let json = self.to_json()?;
        match output {
            Some(path) => {
                if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                    fs::create_dir_all(parent)?;
                }
                fs::write(path, format!("{json}\n"))?;
                log::debug!("report written to {}", path.display());
            }
            None => {
                let mut stdout = io::stdout().lock();
                writeln!(stdout, "{json}")?;
                stdout.flush()?;
            }
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
