//! Shared start-up for the termshot binaries.

use std::process::ExitCode;

use termshot_core::errors::TermshotError;
use tracing_subscriber::EnvFilter;

/// Install a stderr subscriber.  `log` records from `termshot_core` are
/// forwarded through the `tracing-log` bridge.  `RUST_LOG` wins over
/// `verbose`.
pub fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

/// Print `<bin>: <error>` and convert to the matching exit status.
pub fn fail(bin: &str, err: &TermshotError) -> ExitCode {
    eprintln!("{bin}: {err}");
    ExitCode::from(err.exit_code())
}
