//! Interrupt handling.
//!
//! The handlers only flip an atomic flag.  Every wait in the crate goes
//! through [`sleep_interruptible`], which polls that flag and turns a pending
//! signal into [`TermshotError::Interrupted`] so that RAII guards (artifact
//! cleanup, app termination) run on the ordinary return path.  Blocking steps
//! that cannot poll (running the screenshot utility, terminating the app)
//! are followed by [`check`].

use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::{Duration, Instant};

use crate::errors::TermshotError;

static INTERRUPTED: AtomicBool = AtomicBool::new(false);

const POLL_INTERVAL: Duration = Duration::from_millis(100);

#[cfg(unix)]
extern "C" fn on_signal(_signum: libc::c_int) {
    INTERRUPTED.store(true, Ordering::SeqCst);
}

/// Install SIGINT / SIGTERM / SIGHUP handlers.  Idempotent.
#[cfg(unix)]
pub fn install_handlers() {
    let handler = on_signal as extern "C" fn(libc::c_int) as libc::sighandler_t;
    for signum in [libc::SIGINT, libc::SIGTERM, libc::SIGHUP] {
        // SAFETY: `on_signal` only performs an atomic store, which is
        // async-signal-safe.
        let prev = unsafe { libc::signal(signum, handler) };
        if prev == libc::SIG_ERR {
            log::warn!("failed to install handler for signal {signum}");
        }
    }
}

#[cfg(not(unix))]
pub fn install_handlers() {}

/// Whether an interrupt has been received since start-up.
pub fn interrupted() -> bool {
    INTERRUPTED.load(Ordering::SeqCst)
}

/// Return `Err(Interrupted)` if a signal is pending.
pub fn check() -> Result<(), TermshotError> {
    if interrupted() {
        Err(TermshotError::Interrupted)
    } else {
        Ok(())
    }
}

/// Sleep for at least `duration`, waking early only on interrupt.
pub fn sleep_interruptible(duration: Duration) -> Result<(), TermshotError> {
    let deadline = Instant::now() + duration;
    loop {
        check()?;
        let now = Instant::now();
        if now >= deadline {
            return Ok(());
        }
        thread::sleep((deadline - now).min(POLL_INTERVAL));
    }
}
