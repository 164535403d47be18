//! Bump the project version, mirror it into metadata files, and tag a
//! release.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, ValueEnum};
use termshot_core::errors::TermshotError;
use termshot_core::release::{self, ReleasePlan, DEFAULT_VERSION_FILE};
use termshot_core::version::BumpKind;

#[derive(Parser)]
#[command(name = "termshot-release", version, about = "Bump the version and cut a release")]
struct Args {
    /// Which component to bump
    #[arg(value_enum)]
    bump: Bump,

    /// Plain-text file holding the current version
    #[arg(long, default_value = DEFAULT_VERSION_FILE, env = "TERMSHOT_VERSION_FILE")]
    version_file: PathBuf,

    /// JSON metadata file whose "version" field follows the version file
    #[arg(long = "mirror")]
    mirrors: Vec<PathBuf>,

    /// Only update files; skip commit, tag, and push
    #[arg(long)]
    no_git: bool,

    /// Create a GitHub release with `gh` after pushing
    #[arg(long, conflicts_with = "no_git")]
    publish: bool,

    /// Allow uncommitted changes in the working tree
    #[arg(long)]
    allow_dirty: bool,

    /// Print what would happen without changing anything
    #[arg(long)]
    dry_run: bool,

    /// Enable verbose logging to stderr
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Clone, Copy, ValueEnum)]
enum Bump {
    Patch,
    Minor,
    Major,
}

impl From<Bump> for BumpKind {
    fn from(b: Bump) -> Self {
        match b {
            Bump::Patch => BumpKind::Patch,
            Bump::Minor => BumpKind::Minor,
            Bump::Major => BumpKind::Major,
        }
    }
}

fn run(args: &Args) -> Result<ReleasePlan, TermshotError> {
    let plan = ReleasePlan::prepare(&args.version_file, args.bump.into(), &args.mirrors)?;
    log::debug!("release plan: {plan:?}");

    if !args.no_git && !args.allow_dirty {
        release::ensure_clean_worktree()?;
    }

    if args.dry_run {
        println!("would write {} to {}", plan.to, plan.version_file.display());
        for mirror in &plan.mirrors {
            println!("would mirror {} into {}", plan.to, mirror.display());
        }
    } else {
        plan.apply()?;
    }

    let mut commands = Vec::new();
    if !args.no_git {
        commands.extend(plan.git_commands());
    }
    if args.publish {
        commands.push(plan.publish_command());
    }
    for argv in &commands {
        if args.dry_run {
            println!("would run: {}", argv.join(" "));
        }
        release::run_command(argv, args.dry_run)?;
    }

    Ok(plan)
}

fn main() -> ExitCode {
    let args = Args::parse();
    termshot_cli::init_logging(args.verbose);

    match run(&args) {
        Ok(plan) => {
            println!("{} -> {}", plan.from, plan.to);
            ExitCode::SUCCESS
        }
        Err(e) => termshot_cli::fail("termshot-release", &e),
    }
}
