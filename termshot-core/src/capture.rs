//! Screenshot capture via the macOS `screencapture` utility.
//!
//! A [`CaptureRequest`] is a handful of flags.  Capturing means validating
//! them, waiting out the requested delay, translating them into an argument
//! list, and running the utility synchronously once.  Success is the
//! utility's zero exit status; there are no retries.
//!
//! # Argument order
//!
//! 1. `-i` when interactive or window-only,
//! 2. `-w` when window-only,
//! 3. `-o` when shadow suppression is requested,
//! 4. `-c` when copying to the clipboard,
//! 5. the output path, unless copying to the clipboard.
//!
//! # Examples
//!
//! ```no_run
//! use termshot_core::capture::{capture, CaptureRequest, Screencapture};
//!
//! let tool = Screencapture::locate(None).expect("screencapture missing");
//! let request = CaptureRequest::to_file("/tmp/term.png").window_only().no_shadow();
//! let outcome = capture(&request, &tool).expect("capture failed");
//! println!("{:?} bytes", outcome.file_size);
//! ```

use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::time::Duration;

use serde::Serialize;

use crate::errors::TermshotError;
use crate::process;
use crate::signal;

/// Default name of the screenshot utility looked up on `PATH`.
pub const SCREENCAPTURE_PROGRAM: &str = "screencapture";

// ---------------------------------------------------------------------------
// Request
// ---------------------------------------------------------------------------

/// What to capture and where to put it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CaptureRequest {
    /// Destination file.  Required unless `clipboard` is set.
    pub output: Option<PathBuf>,
    /// Seconds to wait before invoking the utility.
    pub delay_secs: u64,
    /// Let the user select a region.
    pub interactive: bool,
    /// Restrict interactive selection to windows.
    pub window_only: bool,
    /// Omit the window shadow.
    pub no_shadow: bool,
    /// Copy to the clipboard instead of writing a file.
    pub clipboard: bool,
}

impl CaptureRequest {
    pub fn to_file(path: impl Into<PathBuf>) -> Self {
        Self {
            output: Some(path.into()),
            ..Self::default()
        }
    }

    pub fn to_clipboard() -> Self {
        Self {
            clipboard: true,
            ..Self::default()
        }
    }

    pub fn delay(mut self, secs: u64) -> Self {
        self.delay_secs = secs;
        self
    }

    pub fn interactive(mut self) -> Self {
        self.interactive = true;
        self
    }

    pub fn window_only(mut self) -> Self {
        self.window_only = true;
        self
    }

    pub fn no_shadow(mut self) -> Self {
        self.no_shadow = true;
        self
    }

    /// Enforce the output / clipboard invariant.
    pub fn validate(&self) -> Result<(), TermshotError> {
        match (&self.output, self.clipboard) {
            (Some(path), true) => Err(TermshotError::InvalidArgument(format!(
                "output path {} cannot be combined with clipboard mode",
                path.display()
            ))),
            (None, false) => Err(TermshotError::InvalidArgument(
                "output path is required unless clipboard mode is set".into(),
            )),
            (Some(path), false) if path.as_os_str().is_empty() => Err(
                TermshotError::InvalidArgument("output path must not be empty".into()),
            ),
            _ => Ok(()),
        }
    }

    /// Ordered argument list for the utility.  Assumes a validated request.
    pub fn to_args(&self) -> Vec<OsString> {
        let mut args: Vec<OsString> = Vec::new();
        if self.interactive || self.window_only {
            args.push("-i".into());
        }
        if self.window_only {
            args.push("-w".into());
        }
        if self.no_shadow {
            args.push("-o".into());
        }
        if self.clipboard {
            args.push("-c".into());
        } else if let Some(path) = &self.output {
            args.push(path.clone().into_os_string());
        }
        args
    }
}

// ---------------------------------------------------------------------------
// Utility handle
// ---------------------------------------------------------------------------

/// Resolved location of the screenshot utility.
#[derive(Debug, Clone)]
pub struct Screencapture {
    program: PathBuf,
}

impl Screencapture {
    /// Resolve the utility.  `override_path` (from `--screencapture` or
    /// `TERMSHOT_SCREENCAPTURE`) takes precedence over a `PATH` search.
    pub fn locate(override_path: Option<&Path>) -> Result<Self, TermshotError> {
        let program = match override_path {
            Some(path) => process::find_in_path(&path.to_string_lossy()).ok_or_else(|| {
                TermshotError::MissingDependency(format!(
                    "screenshot utility {} is not an executable file",
                    path.display()
                ))
            })?,
            None => process::find_in_path(SCREENCAPTURE_PROGRAM).ok_or_else(|| {
                TermshotError::MissingDependency(
                    "`screencapture` not found on PATH (macOS only)".into(),
                )
            })?,
        };
        log::debug!("using screenshot utility {}", program.display());
        Ok(Self { program })
    }

    pub fn program(&self) -> &Path {
        &self.program
    }
}

// ---------------------------------------------------------------------------
// Outcome
// ---------------------------------------------------------------------------

/// Where the screenshot ended up.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "path", rename_all = "lowercase")]
pub enum Destination {
    Clipboard,
    File(PathBuf),
}

/// Result of a successful capture.
#[derive(Debug, Clone, Serialize)]
pub struct CaptureOutcome {
    pub destination: Destination,
    /// Size of the written file; `None` for clipboard captures.
    pub file_size: Option<u64>,
    /// Pixel dimensions when the file is a readable PNG.
    pub dimensions: Option<(u32, u32)>,
}

impl CaptureOutcome {
    /// One-line human summary.
    pub fn summary(&self) -> String {
        match &self.destination {
            Destination::Clipboard => "Copied screenshot to clipboard".to_owned(),
            Destination::File(path) => {
                let mut line = format!(
                    "Saved screenshot to {} ({} bytes",
                    path.display(),
                    self.file_size.unwrap_or(0)
                );
                if let Some((w, h)) = self.dimensions {
                    line.push_str(&format!(", {w}x{h}"));
                }
                line.push(')');
                line
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Validate `request`, wait out its delay, and run the utility once.
///
/// # Errors
///
/// - [`TermshotError::InvalidArgument`] if the request is inconsistent.
/// - [`TermshotError::Interrupted`] if a signal arrives during the delay or
///   while the utility runs.
/// - [`TermshotError::CaptureFailed`] on a non-zero exit (including the
///   user cancelling an interactive selection).
/// - [`TermshotError::ArtifactMissing`] if no file was written.
pub fn capture(
    request: &CaptureRequest,
    tool: &Screencapture,
) -> Result<CaptureOutcome, TermshotError> {
    request.validate()?;

    if request.delay_secs > 0 {
        log::debug!("waiting {}s before capture", request.delay_secs);
        signal::sleep_interruptible(Duration::from_secs(request.delay_secs))?;
    }
    signal::check()?;

    let args = request.to_args();
    log::debug!("running {} {:?}", tool.program.display(), args);

    let output = Command::new(&tool.program).args(&args).output().map_err(|e| {
        TermshotError::ProcessError(format!(
            "failed to execute {}: {e}",
            tool.program.display()
        ))
    })?;
    // A signal delivered while the utility ran must not be reported as a
    // successful capture.
    signal::check()?;

    if !output.status.success() {
        let code = output.status.code().unwrap_or(-1);
        let stderr = String::from_utf8_lossy(&output.stderr).into_owned();
        log::error!("screencapture exited with {code}");
        return Err(TermshotError::CaptureFailed { code, stderr });
    }

    let Some(path) = request.output.as_ref().filter(|_| !request.clipboard) else {
        return Ok(CaptureOutcome {
            destination: Destination::Clipboard,
            file_size: None,
            dimensions: None,
        });
    };

    let file_size = match fs::metadata(path) {
        Ok(meta) if meta.is_file() => meta.len(),
        _ => return Err(TermshotError::ArtifactMissing(path.clone())),
    };
    let dimensions = image_dimensions(path);

    log::info!("captured {} ({file_size} bytes)", path.display());
    Ok(CaptureOutcome {
        destination: Destination::File(path.clone()),
        file_size: Some(file_size),
        dimensions,
    })
}

/// Best-effort PNG header probe.
pub fn image_dimensions(path: &Path) -> Option<(u32, u32)> {
    match image::image_dimensions(path) {
        Ok(dims) => Some(dims),
        Err(e) => {
            log::debug!("could not read dimensions of {}: {e}", path.display());
            None
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
