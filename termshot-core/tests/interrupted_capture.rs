//! A signal that lands while the screenshot utility runs turns a zero exit
//! into `Interrupted`.  The interrupt flag is process-wide and never reset,
//! so this binary holds a single test.

#![cfg(unix)]

use std::fs;
use std::os::unix::fs::PermissionsExt;

use termshot_core::capture::{capture, CaptureRequest, Screencapture};
use termshot_core::errors::TermshotError;
use termshot_core::signal;

#[test]
fn test_signal_during_utility_run_is_interrupted() {
    signal::install_handlers();

    let dir = tempfile::tempdir().unwrap();
    let script = dir.path().join("screencapture");
    fs::write(
        &script,
        "#!/bin/sh\nkill -TERM $PPID\nfor last; do :; done\nhead -c 4096 /dev/zero > \"$last\"\n",
    )
    .unwrap();
    fs::set_permissions(&script, fs::Permissions::from_mode(0o755)).unwrap();
    let tool = Screencapture::locate(Some(&script)).unwrap();

    let out = dir.path().join("shot.png");
    let err = capture(&CaptureRequest::to_file(&out), &tool).unwrap_err();
    assert!(matches!(err, TermshotError::Interrupted));
    assert_eq!(err.exit_code(), 130);
    assert!(signal::interrupted());
}
