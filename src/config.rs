//! Configuration types for perm-cracker
//!
//! This module defines:
//! - CLI argument parsing using clap derive macros
//! - Runtime configuration with validation
//! - Wordlist loading

use crate::error::ConfigError;
use crate::search::candidates::candidate_count;
use crate::search::{LengthRange, SearchConfig};
use clap::Parser;
use std::fs;
use std::path::{Path, PathBuf};

/// Maximum reasonable worker count
pub const MAX_WORKERS: usize = 512;

/// Parallel vocabulary-permutation password search for ZIP archives
#[derive(Parser, Debug, Clone)]
#[command(
    name = "perm-cracker",
    version,
    about = "Parallel vocabulary-permutation password search for ZIP archives",
    long_about = "Builds every ordered arrangement of 2 to 3 distinct seed words (configurable),\n\
                  splits the candidates across worker threads, and stops as soon as one\n\
                  worker unlocks the archive.",
    after_help = "EXAMPLES:\n    \
        perm-cracker locked.zip -w 12345 -w abcd\n    \
        perm-cracker locked.zip --wordlist seeds.txt -j 8 -x ./out\n    \
        perm-cracker locked.zip --wordlist seeds.txt --max-candidates 10000000\n    \
        perm-cracker locked.zip --wordlist seeds.txt --min-len 1 --max-len 4 --json"
)]
pub struct CliArgs {
    /// Encrypted ZIP archive to search
    #[arg(value_name = "ARCHIVE")]
    pub archive: PathBuf,

    /// Seed word (can be repeated)
    #[arg(short = 'w', long = "word", value_name = "WORD", action = clap::ArgAction::Append)]
    pub words: Vec<String>,

    /// File with one seed word per line ('#' starts a comment)
    #[arg(long, value_name = "FILE")]
    pub wordlist: Option<PathBuf>,

    /// Fewest seed words per candidate
    #[arg(long, default_value = "2", value_name = "NUM")]
    pub min_len: usize,

    /// Most seed words per candidate
    #[arg(long, default_value = "3", value_name = "NUM")]
    pub max_len: usize,

    /// Refuse to start when the vocabulary yields more candidates than this
    #[arg(long, value_name = "NUM")]
    pub max_candidates: Option<u64>,

    /// Number of worker threads
    #[arg(
        short = 'j',
        long,
        default_value_t = default_workers(),
        value_name = "NUM"
    )]
    pub workers: usize,

    /// Extract the archive here once the password is found
    #[arg(short = 'x', long, value_name = "DIR")]
    pub extract_to: Option<PathBuf>,

    /// Quiet mode - suppress progress output
    #[arg(short = 'q', long)]
    pub quiet: bool,

    /// Verbose output (log every failed attempt)
    #[arg(short = 'v', long)]
    pub verbose: bool,

    /// Print the final report as JSON on stdout
    #[arg(long)]
    pub json: bool,
}

fn default_workers() -> usize {
    // Probing is CPU bound (key derivation + decompression)
    num_cpus::get()
}

/// Validated runtime configuration
#[derive(Debug, Clone)]
pub struct CrackConfig {
    /// Archive to search
    pub archive_path: PathBuf,

    /// Seed words: `--word` values first, then wordlist lines
    pub vocabulary: Vec<String>,

    /// Words per candidate
    pub range: LengthRange,

    /// Number of worker threads
    pub worker_count: usize,

    /// Extraction directory
    pub extract_to: Option<PathBuf>,

    /// Show progress indicator
    pub show_progress: bool,

    /// Verbose logging
    pub verbose: bool,

    /// JSON report on stdout
    pub json: bool,
}

impl CrackConfig {
    /// Create and validate configuration from CLI arguments
    ///
    /// Archive existence is not checked here; that belongs to archive
    /// validation so it is reported as an archive error.
    pub fn from_args(args: CliArgs) -> Result<Self, ConfigError> {
        // Validate worker count
        if args.workers == 0 {
            return Err(ConfigError::InvalidWorkerCount { count: 0 });
        }
        if args.workers > MAX_WORKERS {
            return Err(ConfigError::TooManyWorkers {
                count: args.workers,
                max: MAX_WORKERS,
            });
        }

        let range = LengthRange::new(args.min_len, args.max_len)?;

        let mut vocabulary = args.words.clone();
        if let Some(ref path) = args.wordlist {
            vocabulary.extend(load_wordlist(path)?);
        }

        if vocabulary.is_empty() {
            return Err(ConfigError::EmptyVocabulary);
        }

        if let Some(limit) = args.max_candidates {
            let count = candidate_count(vocabulary.len(), range);
            if count > limit {
                return Err(ConfigError::SearchSpaceTooLarge { count, limit });
            }
        }

        // Validate extraction directory
        if let Some(ref dir) = args.extract_to {
            if dir.exists() && !dir.is_dir() {
                return Err(ConfigError::InvalidExtractDir {
                    path: dir.clone(),
                    reason: "exists and is not a directory".to_string(),
                });
            }
        }

        Ok(Self {
            archive_path: args.archive,
            vocabulary,
            range,
            worker_count: args.workers,
            extract_to: args.extract_to,
            // Per-attempt debug lines would fight the progress bar
            show_progress: !args.quiet && !args.verbose && !args.json,
            verbose: args.verbose,
            json: args.json,
        })
    }

    /// Search parameters for the coordinator
    pub fn search_config(&self) -> SearchConfig {
        SearchConfig::new(self.vocabulary.clone())
            .with_range(self.range)
            .with_workers(self.worker_count)
    }
}

/// Read seed words from a file, one per line
///
/// Lines are trimmed; blank lines and lines starting with '#' are skipped.
/// Order is preserved and duplicates are kept.
pub fn load_wordlist(path: &Path) -> Result<Vec<String>, ConfigError> {
    let content = fs::read_to_string(path).map_err(|e| ConfigError::WordlistUnreadable {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;

    Ok(content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(String::from)
        .collect())
}
