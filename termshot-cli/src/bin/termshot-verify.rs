//! Launch an app, wait, capture the screen, and emit a JSON report for a
//! downstream vision model.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use termshot_core::verify::{self, VerifyConfig, DEFAULT_PROMPT, DEFAULT_WAIT_SECS};

#[derive(Parser)]
#[command(
    name = "termshot-verify",
    version,
    about = "Capture a terminal app and emit a to-be-analyzed JSON report"
)]
struct Args {
    /// Shell command to launch before capturing
    #[arg(short, long)]
    app: Option<String>,

    /// Seconds to wait between launch and capture
    #[arg(short, long, default_value_t = DEFAULT_WAIT_SECS, env = "TERMSHOT_VERIFY_WAIT")]
    wait: u64,

    /// Instructions for the vision model
    #[arg(short, long, default_value = DEFAULT_PROMPT, env = "TERMSHOT_VERIFY_PROMPT")]
    prompt: String,

    /// Write the report here instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Screenshot path (default: a temp file). Removed on exit unless --keep,
    /// including a file that already existed there
    #[arg(short, long)]
    screenshot: Option<PathBuf>,

    /// Keep the screenshot after exiting
    #[arg(short, long)]
    keep: bool,

    /// Path to the screenshot utility
    #[arg(long, env = "TERMSHOT_SCREENCAPTURE")]
    screencapture: Option<PathBuf>,

    /// Enable verbose logging to stderr
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> ExitCode {
    let args = Args::parse();
    termshot_cli::init_logging(args.verbose);
    termshot_core::signal::install_handlers();

    let config = VerifyConfig {
        app: args.app,
        wait_secs: args.wait,
        prompt: args.prompt,
        screenshot: args.screenshot.unwrap_or_else(verify::default_screenshot_path),
        keep: args.keep,
        screencapture: args.screencapture,
    };

    let report = match verify::run(&config) {
        Ok(report) => report,
        Err(e) => return termshot_cli::fail("termshot-verify", &e),
    };

    if let Err(e) = report.emit(args.output.as_deref()) {
        return termshot_cli::fail("termshot-verify", &e);
    }
    if let Some(path) = &args.output {
        eprintln!("termshot-verify: report written to {}", path.display());
    }

    if report.is_valid() {
        ExitCode::SUCCESS
    } else {
        eprintln!("termshot-verify: {}", report.note);
        ExitCode::FAILURE
    }
}
