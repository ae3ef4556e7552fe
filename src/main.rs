//! perm-cracker - Parallel vocabulary-permutation password search
//!
//! Entry point for the CLI application.
//!
//! Exit codes: 0 password found, 1 not found or interrupted,
//! 2 invalid configuration or archive.

use anyhow::{Context, Result};
use clap::Parser;
use perm_cracker::archive::ZipProber;
use perm_cracker::config::{CliArgs, CrackConfig};
use perm_cracker::error::CrackError;
use perm_cracker::progress::{print_header, print_summary, ProgressReporter};
use perm_cracker::search::{SearchCoordinator, SearchReport};
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

const EXIT_NOT_FOUND: u8 = 1;
const EXIT_USAGE: u8 = 2;

fn main() -> ExitCode {
    match run() {
        Ok(report) if report.outcome.is_found() => ExitCode::SUCCESS,
        Ok(_) => ExitCode::from(EXIT_NOT_FOUND),
        Err(e) => {
            error!("{:#}", e);
            eprintln!("Error: {:#}", e);
            if is_usage_error(&e) {
                ExitCode::from(EXIT_USAGE)
            } else {
                ExitCode::FAILURE
            }
        }
    }
}

fn run() -> Result<SearchReport> {
    // Parse CLI arguments
    let args = CliArgs::parse();

    // Setup logging
    setup_logging(args.verbose, args.quiet)?;

    // Validate and create config
    let config = CrackConfig::from_args(args)
        .map_err(CrackError::from)
        .context("Invalid configuration")?;

    // Validate the archive before any worker exists
    let mut prober = ZipProber::open(&config.archive_path).map_err(CrackError::from)?;
    if let Some(ref dir) = config.extract_to {
        prober = prober.with_extract_dir(dir);
    }
    let archive_size = prober.size();

    let coordinator = SearchCoordinator::new(config.search_config(), Arc::new(prober))?;

    // Print header
    if config.show_progress {
        print_header(
            &config.archive_path,
            archive_size,
            config.vocabulary.len(),
            config.range,
            coordinator.total_candidates(),
            config.worker_count,
        );
    }

    // Setup signal handler for graceful shutdown
    let cancel = coordinator.cancel_handle();
    ctrlc::set_handler(move || {
        eprintln!("\nInterrupt received, waiting for in-flight attempts...");
        cancel.cancel();
    })
    .context("Failed to set signal handler")?;

    // Create progress reporter
    let mut progress = if config.show_progress {
        let mut reporter = ProgressReporter::new(coordinator.total_candidates());
        reporter.track(coordinator.monitor());
        Some(reporter)
    } else {
        None
    };

    // Run the search
    let report = coordinator.run().context("Search failed")?;

    // Finish progress
    if let Some(ref mut p) = progress {
        if report.outcome.is_found() {
            p.finish("Password found");
        } else if report.completed {
            p.finish("Search space exhausted");
        } else {
            p.finish("Search interrupted");
        }
    }

    if config.json {
        let json = serde_json::to_string_pretty(&report).context("Failed to encode report")?;
        println!("{}", json);
    } else if config.show_progress {
        print_summary(&report, &config.archive_path);
    } else if let Some(password) = report.outcome.password() {
        println!("{}", password);
    }

    if !report.completed {
        info!("Search was interrupted before completion");
    }

    Ok(report)
}

/// Configuration and archive problems are the caller's to fix
fn is_usage_error(e: &anyhow::Error) -> bool {
    e.downcast_ref::<CrackError>()
        .map(|e| matches!(e, CrackError::Config(_) | CrackError::Archive(_)))
        .unwrap_or(false)
}

fn setup_logging(verbose: bool, quiet: bool) -> Result<()> {
    let filter = if verbose {
        EnvFilter::new("perm_cracker=debug,warn")
    } else if quiet {
        EnvFilter::new("perm_cracker=warn,warn")
    } else {
        EnvFilter::new("perm_cracker=info,warn")
    };

    // stdout is reserved for the password and the JSON report
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .init();

    Ok(())
}
