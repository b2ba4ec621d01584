//! CLI entry point for the kernel archiver.

use std::io::{self, IsTerminal};
use std::process::ExitCode;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use kernel_archiver::{Credentials, Harvester, KaggleClient, Redactor, RunError, RunOptions};
use tracing::{debug, info, warn};

mod cli;

use cli::Args;

/// Conventional exit status for a run stopped by SIGINT.
const EXIT_INTERRUPTED: u8 = 130;

#[tokio::main]
async fn main() -> ExitCode {
    // Parse CLI arguments first (before tracing, so --help works without logs)
    let args = Args::parse();
    init_tracing(args.default_log_level());

    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            if matches!(error.downcast_ref::<RunError>(), Some(RunError::Interrupted)) {
                warn!("Interrupted; staging directory removed, no archive written");
                return ExitCode::from(EXIT_INTERRUPTED);
            }
            eprintln!("Error: {error:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(args: Args) -> Result<()> {
    debug!(?args, "CLI arguments parsed");
    info!("Kernel archiver starting");

    let credentials = Credentials::resolve().context("authentication failed")?;
    let client = KaggleClient::new(credentials).context("cannot initialize Kaggle API client")?;

    let redactor = if args.add_mask() {
        Redactor::stdout()
    } else {
        Redactor::disabled()
    };
    let progress = if should_use_spinner(io::stderr().is_terminal(), args.quiet) {
        spinner()
    } else {
        ProgressBar::hidden()
    };

    let options = RunOptions {
        user: args.user.clone(),
        include_private: args.include_private(),
        page_size: args.max_page_size,
        output: args.output.clone(),
        tmp_dir: args.tmp_dir.clone(),
    };

    let report = Harvester::new(&client, options)
        .with_redactor(redactor)
        .with_progress(progress)
        .run_until_interrupted()
        .await?;

    if !report.failed.is_empty() {
        warn!(
            count = report.failed.len(),
            "Some kernels could not be downloaded and were left out of the archive"
        );
    }
    info!(archive = %report.archive.display(), kernels = report.stats.fetched, "Done");
    Ok(())
}

fn init_tracing(default_level: &str) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level));
    let _ = tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_env_filter(filter)
        .try_init();
}

fn is_dumb_terminal() -> bool {
    std::env::var("TERM")
        .map(|value| value.eq_ignore_ascii_case("dumb"))
        .unwrap_or(false)
}

fn should_use_spinner(stderr_is_terminal: bool, quiet: bool) -> bool {
    stderr_is_terminal && !quiet && !is_dumb_terminal()
}

fn spinner() -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::with_template("{spinner} [{pos}] {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    spinner.enable_steady_tick(Duration::from_millis(100));
    spinner
}
