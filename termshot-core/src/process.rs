//! Subprocess helpers: `PATH` lookup, process probing, and the launched
//! application handle used by the verify workflow.
//!
//! # Thread safety
//!
//! `sysinfo::System` is wrapped in `parking_lot::Mutex` + `OnceLock` so that
//! probing can be called from anywhere without re-enumerating the process
//! table from scratch.

use std::env;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};
use std::sync::OnceLock;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use serde::Serialize;
use sysinfo::{Pid, ProcessRefreshKind, ProcessesToUpdate, RefreshKind, System};

use crate::errors::TermshotError;

/// Grace period between SIGTERM and SIGKILL.
pub const TERMINATE_GRACE: Duration = Duration::from_secs(2);

// ---------------------------------------------------------------------------
// Singleton
// ---------------------------------------------------------------------------

static SYSTEM: OnceLock<Mutex<System>> = OnceLock::new();

fn get_system() -> &'static Mutex<System> {
    SYSTEM.get_or_init(|| {
        Mutex::new(System::new_with_specifics(
            RefreshKind::nothing().with_processes(ProcessRefreshKind::nothing().with_memory()),
        ))
    })
}

// ---------------------------------------------------------------------------
// PATH lookup
// ---------------------------------------------------------------------------

/// Locate `program` on `PATH`.  Names containing a path separator are
/// checked as-is.
pub fn find_in_path(program: &str) -> Option<PathBuf> {
    let candidate = Path::new(program);
    if candidate.components().count() > 1 {
        return is_executable(candidate).then(|| candidate.to_path_buf());
    }
    let paths = env::var_os("PATH")?;
    env::split_paths(&paths)
        .map(|dir| dir.join(program))
        .find(|p| is_executable(p))
}

/// Like [`find_in_path`] but fails with `MissingDependency`.
pub fn require_program(program: &str) -> Result<PathBuf, TermshotError> {
    find_in_path(program).ok_or_else(|| {
        TermshotError::MissingDependency(format!("`{program}` not found on PATH"))
    })
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;
    path.metadata()
        .map(|m| m.is_file() && m.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

#[cfg(not(unix))]
fn is_executable(path: &Path) -> bool {
    path.is_file()
}

// ---------------------------------------------------------------------------
// Probing
// ---------------------------------------------------------------------------

/// Owned snapshot of a running process.
#[derive(Debug, Clone, Serialize)]
pub struct ProcessSnapshot {
    pub pid: u32,
    pub name: String,
    pub status: String,
    pub memory_bytes: u64,
}

/// Look up `pid` in the process table.  Returns `None` when it is gone.
pub fn probe(pid: u32) -> Option<ProcessSnapshot> {
    let mutex = get_system();
    let mut sys = mutex.lock();
    let target = Pid::from_u32(pid);

    sys.refresh_processes(ProcessesToUpdate::Some(&[target]), true);

    sys.process(target).map(|p| ProcessSnapshot {
        pid,
        name: p.name().to_string_lossy().into_owned(),
        status: p.status().to_string(),
        memory_bytes: p.memory(),
    })
}

// ---------------------------------------------------------------------------
// Launched application
// ---------------------------------------------------------------------------

/// Background application started by the verify workflow.
///
/// The command runs through `sh -c` in its own process group so that the
/// whole tree can be signalled at once.  Dropping the handle terminates the
/// group (best effort).
#[must_use = "dropping LaunchedApp terminates the application immediately"]
pub struct LaunchedApp {
    command: String,
    child: Option<Child>,
}

impl LaunchedApp {
    /// Spawn `command` with stdin detached and stdout/stderr inherited.
    pub fn spawn(command: &str) -> Result<Self, TermshotError> {
        if command.trim().is_empty() {
            return Err(TermshotError::InvalidArgument(
                "app command must not be empty".into(),
            ));
        }

        let mut cmd = Command::new("sh");
        cmd.arg("-c")
            .arg(command)
            .stdin(Stdio::null())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit());

        #[cfg(unix)]
        {
            use std::os::unix::process::CommandExt;
            cmd.process_group(0);
        }

        let child = cmd.spawn().map_err(|e| {
            TermshotError::ProcessError(format!("failed to launch `{command}`: {e}"))
        })?;

        log::debug!("launched `{command}` as pid {}", child.id());
        Ok(Self {
            command: command.to_owned(),
            child: Some(child),
        })
    }

    pub fn pid(&self) -> Option<u32> {
        self.child.as_ref().map(Child::id)
    }

    pub fn command(&self) -> &str {
        &self.command
    }

    /// Whether the application is still running.  Reaps it if it exited.
    pub fn is_running(&mut self) -> bool {
        match self.child.as_mut() {
            Some(child) => matches!(child.try_wait(), Ok(None)),
            None => false,
        }
    }

    /// Send SIGTERM to the process group, wait up to [`TERMINATE_GRACE`]
    /// for every member to exit, then SIGKILL the group.  The group is
    /// signalled even when the `sh` leader already exited, since background
    /// jobs it started stay behind in the group.  Failures are logged and
    /// swallowed.
    pub fn terminate(&mut self) {
        let Some(mut child) = self.child.take() else {
            return;
        };
        let pid = child.id();

        signal_group(pid, GroupSignal::Terminate);

        let deadline = Instant::now() + TERMINATE_GRACE;
        let mut leader_exited = false;
        loop {
            if !leader_exited {
                match child.try_wait() {
                    Ok(Some(status)) => {
                        log::debug!("`{}` exited ({status})", self.command);
                        leader_exited = true;
                    }
                    Ok(None) => {}
                    Err(e) => {
                        log::debug!("waiting for `{}` failed: {e}", self.command);
                        break;
                    }
                }
            }
            // The leader must be reaped first; a zombie still counts as a
            // group member.
            if leader_exited && !group_alive(pid) {
                return;
            }
            if Instant::now() >= deadline {
                break;
            }
            std::thread::sleep(Duration::from_millis(50));
        }

        log::debug!("`{}` ignored SIGTERM; killing its process group", self.command);
        signal_group(pid, GroupSignal::Kill);
        if !leader_exited {
            if let Err(e) = child.kill() {
                log::debug!("kill `{}` failed: {e}", self.command);
            }
            let _ = child.wait();
        }
    }
}

impl Drop for LaunchedApp {
    fn drop(&mut self) {
        self.terminate();
    }
}

#[derive(Debug, Clone, Copy)]
enum GroupSignal {
    Terminate,
    Kill,
}

#[cfg(unix)]
fn signal_group(pid: u32, signal: GroupSignal) {
    let Ok(pgid) = libc::pid_t::try_from(pid) else {
        return;
    };
    let signum = match signal {
        GroupSignal::Terminate => libc::SIGTERM,
        GroupSignal::Kill => libc::SIGKILL,
    };
    // SAFETY: plain syscall; a negative pid addresses the process group
    // created by `process_group(0)` in `spawn`.
    let rc = unsafe { libc::kill(-pgid, signum) };
    if rc != 0 {
        let err = std::io::Error::last_os_error();
        // ESRCH: the group is already empty.
        if err.raw_os_error() != Some(libc::ESRCH) {
            log::debug!("{signal:?} to process group {pgid} failed: {err}");
        }
    }
}

#[cfg(not(unix))]
fn signal_group(_pid: u32, _signal: GroupSignal) {}

/// Whether any process is left in the group led by `pid`.
#[cfg(unix)]
fn group_alive(pid: u32) -> bool {
    let Ok(pgid) = libc::pid_t::try_from(pid) else {
        return false;
    };
    // SAFETY: signal 0 performs the permission and existence check only.
    unsafe { libc::kill(-pgid, 0) == 0 }
}

#[cfg(not(unix))]
fn group_alive(_pid: u32) -> bool {
    false
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_find_in_path_missing() {
        assert!(find_in_path("definitely-not-a-real-program-xyz").is_none());
    }

    #[test]
    fn test_require_program_missing_is_dependency_error() {
        let err = require_program("definitely-not-a-real-program-xyz").unwrap_err();
        assert!(matches!(err, TermshotError::MissingDependency(_)));
        assert_eq!(err.exit_code(), 127);
    }

    #[cfg(unix)]
    #[test]
    fn test_find_in_path_sh() {
        assert!(find_in_path("sh").is_some());
    }

    #[test]
    fn test_spawn_rejects_empty_command() {
        assert!(matches!(
            LaunchedApp::spawn("   "),
            Err(TermshotError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_snapshot_serialization() {
        let s = ProcessSnapshot {
            pid: 42,
            name: "htop".into(),
            status: "Run".into(),
            memory_bytes: 1024,
        };
        let json = serde_json::to_string(&s).unwrap();
        assert!(json.contains("\"pid\":42"));
        assert!(json.contains("htop"));
    }

    #[cfg(unix)]
    #[test]
    fn test_terminate_stops_long_running_app() {
        let mut app = LaunchedApp::spawn("sleep 30").unwrap();
        assert!(app.is_running());
        let start = Instant::now();
        app.terminate();
        assert!(!app.is_running());
        assert!(start.elapsed() < TERMINATE_GRACE + Duration::from_secs(1));
    }

    #[cfg(unix)]
    #[test]
    fn test_probe_current_process() {
        let snap = probe(std::process::id()).expect("own process visible");
        assert_eq!(snap.pid, std::process::id());
    }

    #[cfg(unix)]
    #[test]
    fn test_terminate_kills_group_members_ignoring_sigterm() {
        let dir = tempfile::tempdir().unwrap();
        let marker = dir.path().join("survivor");
        let mut app = LaunchedApp::spawn(&format!(
            "trap '' TERM; (sleep 4; touch '{}') & wait",
            marker.display()
        ))
        .unwrap();
        std::thread::sleep(Duration::from_millis(300));
        app.terminate();
        std::thread::sleep(Duration::from_secs(4));
        assert!(!marker.exists());
    }

    #[cfg(unix)]
    #[test]
    fn test_terminate_reaches_jobs_left_by_exited_leader() {
        let dir = tempfile::tempdir().unwrap();
        let marker = dir.path().join("orphan");
        let mut app = LaunchedApp::spawn(&format!(
            "(trap '' TERM; sleep 4; touch '{}') &",
            marker.display()
        ))
        .unwrap();
        std::thread::sleep(Duration::from_millis(300));
        assert!(!app.is_running());
        app.terminate();
        std::thread::sleep(Duration::from_secs(4));
        assert!(!marker.exists());
    }

    #[cfg(unix)]
    #[test]
    fn test_terminate_after_exit_is_noop() {
        let mut app = LaunchedApp::spawn("true").unwrap();
        std::thread::sleep(Duration::from_millis(300));
        app.terminate();
        app.terminate();
        assert!(app.pid().is_none());
    }
}
