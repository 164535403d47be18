//! Standalone CLI tool for capturing a screenshot via `screencapture`.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use termshot_core::capture::{self, CaptureRequest, Screencapture};

#[derive(Parser)]
#[command(name = "termshot-capture", version, about = "Capture a screenshot with macOS screencapture")]
struct Args {
    /// Output file path (required unless --clipboard)
    #[arg(required_unless_present = "clipboard", conflicts_with = "clipboard")]
    output: Option<PathBuf>,

    /// Seconds to wait before capturing
    #[arg(short, long, default_value_t = 0)]
    delay: u64,

    /// Select a region interactively
    #[arg(short, long)]
    interactive: bool,

    /// Select a single window (implies --interactive)
    #[arg(short, long)]
    window: bool,

    /// Omit the window shadow
    #[arg(short, long)]
    no_shadow: bool,

    /// Copy to the clipboard instead of writing a file
    #[arg(short, long)]
    clipboard: bool,

    /// Print the outcome as JSON instead of a summary line
    #[arg(long)]
    json: bool,

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

    let request = CaptureRequest {
        output: args.output,
        delay_secs: args.delay,
        interactive: args.interactive,
        window_only: args.window,
        no_shadow: args.no_shadow,
        clipboard: args.clipboard,
    };

    let result = Screencapture::locate(args.screencapture.as_deref())
        .and_then(|tool| capture::capture(&request, &tool));

    match result {
        Ok(outcome) if args.json => match serde_json::to_string_pretty(&outcome) {
            Ok(json) => {
                println!("{json}");
                ExitCode::SUCCESS
            }
            Err(e) => termshot_cli::fail("termshot-capture", &e.into()),
        },
        Ok(outcome) => {
            println!("{}", outcome.summary());
            ExitCode::SUCCESS
        }
        Err(e) => termshot_cli::fail("termshot-capture", &e),
    }
}
