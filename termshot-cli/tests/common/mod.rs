#![allow(dead_code)]

use assert_cmd::cargo::CommandCargoExt;
use assert_cmd::Command;
use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

pub struct TestEnv {
    _tmp: TempDir,
    pub root: PathBuf,
    pub screencapture: PathBuf,
    pub invocations: PathBuf,
}

impl TestEnv {
    /// Fake utility that writes `bytes` zero bytes to its last argument.
    pub fn new(bytes: usize) -> Self {
        Self::with_script(&format!(
            "for last; do :; done\n[ \"$last\" = \"-c\" ] || head -c {bytes} /dev/zero > \"$last\"\nexit 0"
        ))
    }

    pub fn failing(code: i32) -> Self {
        Self::with_script(&format!("echo 'could not create image' >&2\nexit {code}"))
    }

    fn with_script(body: &str) -> Self {
        let tmp = TempDir::new().expect("create temp dir");
        let root = tmp.path().to_path_buf();
        let invocations = root.join("invocations.log");
        let screencapture = root.join("screencapture");
        fs::write(
            &screencapture,
            format!(
                "#!/bin/sh\necho \"$@\" >> '{}'\n{body}\n",
                invocations.display()
            ),
        )
        .expect("write fake screencapture");
        fs::set_permissions(&screencapture, fs::Permissions::from_mode(0o755))
            .expect("chmod fake screencapture");

        Self {
            _tmp: tmp,
            root,
            screencapture,
            invocations,
        }
    }

    pub fn path(&self, name: &str) -> PathBuf {
        self.root.join(name)
    }

    pub fn cmd(&self, bin: &str) -> Command {
        let mut cmd = Command::cargo_bin(bin).expect("binary built");
        cmd.env("TERMSHOT_SCREENCAPTURE", &self.screencapture)
            .env_remove("RUST_LOG")
            .env_remove("TERMSHOT_VERIFY_WAIT")
            .env_remove("TERMSHOT_VERIFY_PROMPT")
            .current_dir(&self.root);
        cmd
    }

    /// Unwrapped `std::process::Command` for tests that signal the child.
    pub fn spawn_cmd(&self, bin: &str) -> std::process::Command {
        let mut cmd = std::process::Command::cargo_bin(bin).expect("binary built");
        cmd.env("TERMSHOT_SCREENCAPTURE", &self.screencapture)
            .env_remove("RUST_LOG")
            .env_remove("TERMSHOT_VERIFY_WAIT")
            .env_remove("TERMSHOT_VERIFY_PROMPT")
            .current_dir(&self.root);
        cmd
    }

    /// Argument lines the fake utility received, one per invocation.
    pub fn invocations(&self) -> Vec<String> {
        fs::read_to_string(&self.invocations)
            .map(|s| s.lines().map(str::to_owned).collect())
            .unwrap_or_default()
    }
}

pub fn write(path: &Path, contents: &str) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("create parent");
    }
    fs::write(path, contents).expect("write fixture");
}
