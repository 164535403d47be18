//! Verify workflow: launch an app, wait, capture the screen, terminate the
//! app, and produce a [`VerificationReport`].
//!
//! The run is a straight line of phases (see [`Phase`]).  A capture failure
//! jumps to [`Phase::Failed`] after a best-effort termination of the app.
//! The screenshot is removed when the run returns, on every path, unless
//! `keep` is set.

use std::fmt;
use std::path::PathBuf;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use crate::capture::{self, CaptureRequest, Screencapture};
use crate::cleanup::ArtifactGuard;
use crate::errors::TermshotError;
use crate::process::{self, LaunchedApp};
use crate::report::VerificationReport;
use crate::signal;

pub const DEFAULT_WAIT_SECS: u64 = 3;

pub const DEFAULT_PROMPT: &str =
    "Describe what is visible in this terminal screenshot and report any rendering problems.";

/// Workflow phases, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Launching,
    Waiting,
    Capturing,
    Terminating,
    Reporting,
    Done,
    Failed,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Phase::Idle => "idle",
            Phase::Launching => "launching",
            Phase::Waiting => "waiting",
            Phase::Capturing => "capturing",
            Phase::Terminating => "terminating",
            Phase::Reporting => "reporting",
            Phase::Done => "done",
            Phase::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// Options for one verify run.
#[derive(Debug, Clone)]
pub struct VerifyConfig {
    /// Shell command to launch before capturing.  `None` captures as-is.
    pub app: Option<String>,
    pub wait_secs: u64,
    pub prompt: String,
    /// Where the screenshot is written.
    pub screenshot: PathBuf,
    /// Keep the screenshot after the run.
    pub keep: bool,
    /// Utility path override.
    pub screencapture: Option<PathBuf>,
}

impl Default for VerifyConfig {
    fn default() -> Self {
        Self {
            app: None,
            wait_secs: DEFAULT_WAIT_SECS,
            prompt: DEFAULT_PROMPT.to_owned(),
            screenshot: default_screenshot_path(),
            keep: false,
            screencapture: None,
        }
    }
}

/// `$TMPDIR/termshot-verify-<nanos>.png`
pub fn default_screenshot_path() -> PathBuf {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos())
        .unwrap_or_default();
    std::env::temp_dir().join(format!("termshot-verify-{nanos}.png"))
}

/// Phase tracker; logs every transition.
#[derive(Debug)]
struct Progress {
    phase: Phase,
}

impl Progress {
    fn new() -> Self {
        log::debug!("verify: {}", Phase::Idle);
        Self { phase: Phase::Idle }
    }

    fn enter(&mut self, next: Phase) {
        log::debug!("verify: {} -> {next}", self.phase);
        self.phase = next;
    }
}

/// Run the workflow once.
///
/// Returns the report even when the artifact is undersized; callers decide
/// the exit status from [`VerificationReport::is_valid`].
pub fn run(config: &VerifyConfig) -> Result<VerificationReport, TermshotError> {
    let mut progress = Progress::new();
    let result = run_phases(config, &mut progress);
    if result.is_err() {
        progress.enter(Phase::Failed);
    }
    result
}

fn run_phases(
    config: &VerifyConfig,
    progress: &mut Progress,
) -> Result<VerificationReport, TermshotError> {
    let tool = Screencapture::locate(config.screencapture.as_deref())?;
    // Dropped last: removes the screenshot however this function returns.
    let guard = ArtifactGuard::new(&config.screenshot, config.keep);

    progress.enter(Phase::Launching);
    let mut app = match config.app.as_deref() {
        Some(command) => Some(LaunchedApp::spawn(command)?),
        None => None,
    };

    progress.enter(Phase::Waiting);
    signal::sleep_interruptible(Duration::from_secs(config.wait_secs))?;
    if let Some(app) = app.as_mut() {
        if !app.is_running() {
            log::warn!("`{}` exited before the capture", app.command());
        } else if let Some(snapshot) = app.pid().and_then(process::probe) {
            log::debug!("target process before capture: {snapshot:?}");
        }
    }

    progress.enter(Phase::Capturing);
    let request = CaptureRequest::to_file(guard.path()).no_shadow();
    if let Err(e) = capture::capture(&request, &tool) {
        if let Some(app) = app.as_mut() {
            app.terminate();
        }
        return Err(e);
    }

    progress.enter(Phase::Terminating);
    if let Some(app) = app.as_mut() {
        app.terminate();
    }
    signal::check()?;

    progress.enter(Phase::Reporting);
    let report = VerificationReport::inspect(guard.path(), &config.prompt)?;
    if !report.is_valid() {
        log::warn!(
            "screenshot {} is only {} bytes",
            report.screenshot.display(),
            report.file_size
        );
    }

    progress.enter(Phase::Done);
    Ok(report)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_phase_display() {
        assert_eq!(Phase::Capturing.to_string(), "capturing");
        assert_eq!(Phase::Failed.to_string(), "failed");
    }

    #[test]
    fn test_default_config() {
        let c = VerifyConfig::default();
        assert_eq!(c.wait_secs, DEFAULT_WAIT_SECS);
        assert!(c.app.is_none());
        assert!(!c.keep);
        assert!(c
            .screenshot
            .file_name()
            .unwrap()
            .to_string_lossy()
            .starts_with("termshot-verify-"));
    }

    #[test]
    fn test_missing_utility_fails_before_launch() {
        let config = VerifyConfig {
            app: Some("definitely-not-launched".into()),
            screencapture: Some(PathBuf::from("/nonexistent/screencapture")),
            wait_secs: 0,
            ..VerifyConfig::default()
        };
        assert!(matches!(
            run(&config),
            Err(TermshotError::MissingDependency(_))
        ));
    }

    #[cfg(unix)]
    mod with_fake_utility {
        use super::*;
        use std::fs;
        use std::os::unix::fs::PermissionsExt;
        use std::path::Path;

        fn fake_tool(dir: &Path, bytes: usize, exit: i32) -> PathBuf {
            let script = dir.join("screencapture");
            fs::write(
                &script,
                format!(
                    "#!/bin/sh\nfor last; do :; done\nhead -c {bytes} /dev/zero > \"$last\"\nexit {exit}\n"
                ),
            )
            .unwrap();
            fs::set_permissions(&script, fs::Permissions::from_mode(0o755)).unwrap();
            script
        }

        fn config(dir: &Path, bytes: usize, exit: i32, keep: bool) -> VerifyConfig {
            VerifyConfig {
                app: None,
                wait_secs: 0,
                prompt: "check the banner".into(),
                screenshot: dir.join("shot.png"),
                keep,
                screencapture: Some(fake_tool(dir, bytes, exit)),
            }
        }

        #[test]
        fn test_successful_run_removes_artifact() {
            let dir = tempfile::tempdir().unwrap();
            let cfg = config(dir.path(), 4096, 0, false);
            let report = run(&cfg).unwrap();
            assert!(report.is_valid());
            assert_eq!(report.file_size, 4096);
            assert_eq!(report.prompt, "check the banner");
            assert!(!cfg.screenshot.exists());
        }

        #[test]
        fn test_keep_retains_artifact() {
            let dir = tempfile::tempdir().unwrap();
            let cfg = config(dir.path(), 4096, 0, true);
            run(&cfg).unwrap();
            assert!(cfg.screenshot.exists());
        }

        #[test]
        fn test_undersized_capture_is_flagged_invalid() {
            let dir = tempfile::tempdir().unwrap();
            let cfg = config(dir.path(), 200, 0, false);
            let report = run(&cfg).unwrap();
            assert!(!report.is_valid());
            assert!(!cfg.screenshot.exists());
        }

        #[test]
        fn test_failed_capture_still_cleans_up() {
            let dir = tempfile::tempdir().unwrap();
            let cfg = config(dir.path(), 4096, 1, false);
            let err = run(&cfg).unwrap_err();
            assert!(matches!(err, TermshotError::CaptureFailed { code: 1, .. }));
            assert!(!cfg.screenshot.exists());
        }

        #[test]
        fn test_launched_app_is_terminated() {
            let dir = tempfile::tempdir().unwrap();
            let marker = dir.path().join("still-running");
            let mut cfg = config(dir.path(), 4096, 0, false);
            cfg.wait_secs = 1;
            // Writes the marker only if it survives well past the run.
            cfg.app = Some(format!("sleep 5 && touch {}", marker.display()));
            run(&cfg).unwrap();
            std::thread::sleep(Duration::from_secs(6));
            assert!(!marker.exists());
        }
    }
}
