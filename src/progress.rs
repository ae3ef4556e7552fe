//! Progress reporting for the password search
//!
//! Provides a live progress bar using indicatif, plus the header and
//! summary printed around a run.

use crate::search::{
    LengthRange, SearchMonitor, SearchOutcome, SearchPhase, SearchProgress, SearchReport,
};
use console::style;
use humansize::{format_size, BINARY};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

const TICK: Duration = Duration::from_millis(100);

/// Progress reporter that displays search status
pub struct ProgressReporter {
    /// Progress bar
    bar: ProgressBar,

    /// Stop signal for the ticker thread
    stop: Arc<AtomicBool>,

    /// Ticker thread, if tracking
    ticker: Option<JoinHandle<()>>,
}

impl ProgressReporter {
    /// Create a progress bar over `total` candidates
    pub fn new(total: u64) -> Self {
        let bar = ProgressBar::new(total);

        let template = "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {percent:>3}% {msg}";
        let bar_style = ProgressStyle::default_bar()
            .template(template)
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("=> ")
            .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏");
        bar.set_style(bar_style);
        bar.enable_steady_tick(TICK);

        Self {
            bar,
            stop: Arc::new(AtomicBool::new(false)),
            ticker: None,
        }
    }

    /// Poll `monitor` on a background thread until finished
    pub fn track(&mut self, monitor: SearchMonitor) {
        let bar = self.bar.clone();
        let stop = Arc::clone(&self.stop);

        let handle = thread::Builder::new()
            .name("progress".into())
            .spawn(move || {
                while !stop.load(Ordering::Relaxed) {
                    let progress = monitor.snapshot();
                    if monitor.is_stopping() && progress.active_workers > 0 {
                        bar.set_message(format!(
                            "Stopping, waiting for {} in-flight attempt(s)",
                            progress.active_workers
                        ));
                    } else {
                        render(&bar, &progress);
                    }
                    thread::sleep(TICK);
                }
            });

        // A missing ticker only costs the live display
        self.ticker = handle.ok();
    }

    /// Update the progress display
    pub fn update(&self, progress: &SearchProgress) {
        render(&self.bar, progress);
    }

    /// Finish the progress display with a final message
    pub fn finish(&mut self, message: &str) {
        self.stop_ticker();
        self.bar.finish_with_message(message.to_string());
    }

    /// Finish and clear the progress display
    pub fn finish_and_clear(&mut self) {
        self.stop_ticker();
        self.bar.finish_and_clear();
    }

    fn stop_ticker(&mut self) {
        self.stop.store(true, Ordering::SeqCst);
        if let Some(handle) = self.ticker.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for ProgressReporter {
    fn drop(&mut self) {
        self.stop_ticker();
    }
}

fn render(bar: &ProgressBar, progress: &SearchProgress) {
    bar.set_position(progress.attempts.min(progress.total));
    bar.set_message(format!(
        "Tried: {}/{} | Rate: {:.0}/s | Workers: {}",
        format_number(progress.attempts),
        format_number(progress.total),
        progress.attempts_per_second(),
        progress.active_workers,
    ));
}

/// Format a number with thousands separators
pub fn format_number(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);

    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }

    out
}

/// Print a header at the start of the search
pub fn print_header(
    archive: &Path,
    archive_size: u64,
    words: usize,
    range: LengthRange,
    candidates: u64,
    workers: usize,
) {
    println!();
    println!(
        "{} {}",
        style("perm-cracker").cyan().bold(),
        env!("CARGO_PKG_VERSION")
    );
    println!("{}", style("─".repeat(50)).dim());
    println!(
        "  {} {} ({})",
        style("Archive:").bold(),
        archive.display(),
        format_size(archive_size, BINARY)
    );
    println!("  {} {}", style("Seed words:").bold(), format_number(words as u64));
    println!("  {} {}", style("Words/password:").bold(), range);
    println!("  {} {}", style("Candidates:").bold(), format_number(candidates));
    println!("  {} {}", style("Workers:").bold(), workers);
    println!();
}

/// Print a summary of the search results
pub fn print_summary(report: &SearchReport, archive: &Path) {
    let duration_secs = report.duration.as_secs_f64();

    println!();
    match &report.outcome {
        SearchOutcome::Found { password, .. } => {
            println!("{}", style("Password Found").green().bold());
            println!("{}", style("─".repeat(50)).dim());
            println!("  {} {}", style("Password:").bold(), style(password).green());
        }
        SearchOutcome::NotFound { .. } if report.phase == SearchPhase::Cancelled => {
            println!("{}", style("Search Interrupted").yellow().bold());
            println!("{}", style("─".repeat(50)).dim());
        }
        SearchOutcome::NotFound { .. } => {
            println!("{}", style("Password Not Found").red().bold());
            println!("{}", style("─".repeat(50)).dim());
        }
    }
    println!("  {} {}", style("Archive:").bold(), archive.display());
    println!(
        "  {} {} of {}",
        style("Attempts:").bold(),
        format_number(report.outcome.attempts()),
        format_number(report.total_candidates)
    );
    println!(
        "  {} {:.1}s ({:.0} passwords/sec)",
        style("Duration:").bold(),
        duration_secs,
        report.attempts_per_second()
    );
    println!("  {} {}", style("Workers:").bold(), report.workers);
    if report.probe_errors > 0 {
        println!(
            "  {} {}",
            style("Probe errors:").yellow().bold(),
            format_number(report.probe_errors)
        );
    }
    println!();
}
