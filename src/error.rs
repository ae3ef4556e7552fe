//! Error types for perm-cracker
//!
//! This module defines the error hierarchy for a search run:
//! - Archive errors (missing or unreadable container), fatal before any worker starts
//! - Probe errors (one failed password attempt), recovered inside the worker
//! - Configuration errors (worker count, vocabulary, length range)
//! - Worker thread errors
//!
//! Fatal errors are all raised before the first worker thread is spawned,
//! so there is never a partially started search to unwind.

use std::path::PathBuf;
use thiserror::Error;

/// Top-level error type for perm-cracker
#[derive(Error, Debug)]
pub enum CrackError {
    /// Archive could not be located or opened
    #[error("Archive error: {0}")]
    Archive(#[from] ArchiveError),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Worker/concurrency errors
    #[error("Worker error: {0}")]
    Worker(#[from] WorkerError),
}

impl CrackError {
    /// Returns true if the archive itself was rejected during validation
    pub fn is_archive_error(&self) -> bool {
        matches!(self, CrackError::Archive(_))
    }
}

/// Archive validation errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ArchiveError {
    /// Path does not exist
    #[error("Archive '{}' does not exist", path.display())]
    NotFound { path: PathBuf },

    /// Container cannot be opened at all, independent of the password
    #[error("Cannot open archive '{}': {reason}", path.display())]
    Invalid { path: PathBuf, reason: String },
}

/// Outcome of a single failed password attempt
///
/// Both variants count as a failed attempt; the split only feeds logging.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProbeError {
    /// The archive rejected the password
    #[error("wrong password")]
    WrongPassword,

    /// Any other per-attempt failure (corrupt entry, I/O, ...)
    #[error("{0}")]
    Other(String),
}

impl ProbeError {
    /// Check if the failure was a plain password rejection
    pub fn is_wrong_password(&self) -> bool {
        matches!(self, ProbeError::WrongPassword)
    }
}

/// Configuration errors, detected before any worker is spawned
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// Worker count below one
    #[error("Invalid worker count {count}: need at least 1 worker")]
    InvalidWorkerCount { count: usize },

    /// Worker count above the CLI guard
    #[error("Too many workers: {count} (limit {max})")]
    TooManyWorkers { count: usize, max: usize },

    /// No vocabulary items supplied
    #[error("Vocabulary is empty: supply at least one word")]
    EmptyVocabulary,

    /// Length range is not 1 <= min <= max
    #[error("Invalid length range {min}..={max}: need 1 <= min <= max")]
    InvalidLengthRange { min: usize, max: usize },

    /// Vocabulary and range produce no candidates at all
    #[error("{words} word(s) with lengths {min}..={max} produce no candidates")]
    NoCandidates { words: usize, min: usize, max: usize },

    /// Candidate space above the CLI's `--max-candidates` guard
    #[error("Search space too large: {count} candidates (limit {limit})")]
    SearchSpaceTooLarge { count: u64, limit: u64 },

    /// Wordlist file could not be read
    #[error("Cannot read wordlist '{}': {reason}", path.display())]
    WordlistUnreadable { path: PathBuf, reason: String },

    /// Extraction directory is unusable
    #[error("Invalid extraction directory '{}': {reason}", path.display())]
    InvalidExtractDir { path: PathBuf, reason: String },
}

/// Worker thread errors
#[derive(Error, Debug)]
pub enum WorkerError {
    /// Worker panicked
    #[error("Worker {id} panicked: {message}")]
    Panicked { id: usize, message: String },

    /// Worker thread could not be started
    #[error("Failed to spawn worker {id}: {reason}")]
    SpawnFailed { id: usize, reason: String },
}

/// Result type alias for CrackError
pub type Result<T> = std::result::Result<T, CrackError>;

/// Result type alias for a single probe
pub type ProbeResult = std::result::Result<(), ProbeError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_probe_error_kind() {
        assert!(ProbeError::WrongPassword.is_wrong_password());
        assert!(!ProbeError::Other("crc mismatch".into()).is_wrong_password());
    }

    #[test]
    fn test_archive_error_is_distinguishable() {
        let err: CrackError = ArchiveError::NotFound {
            path: PathBuf::from("/missing.zip"),
        }
        .into();
        assert!(err.is_archive_error());
        assert!(err.to_string().contains("/missing.zip"));

        let err: CrackError = ConfigError::EmptyVocabulary.into();
        assert!(!err.is_archive_error());
    }

    #[test]
    fn test_crack_error_kinds() {
        // Every fatal error comes from a concrete source; no catch-all variant
        let kind = |e: &CrackError| match e {
            CrackError::Archive(_) => "archive",
            CrackError::Config(_) => "config",
            CrackError::Worker(_) => "worker",
        };

        let err: CrackError = WorkerError::SpawnFailed {
            id: 3,
            reason: "out of threads".into(),
        }
        .into();
        assert_eq!(kind(&err), "worker");

        let err: CrackError = ConfigError::EmptyVocabulary.into();
        assert_eq!(kind(&err), "config");
    }

    #[test]
    fn test_config_error_messages() {
        let err = ConfigError::InvalidWorkerCount { count: 0 };
        assert_eq!(
            err.to_string(),
            "Invalid worker count 0: need at least 1 worker"
        );

        let err = ConfigError::TooManyWorkers { count: 600, max: 512 };
        assert_eq!(err.to_string(), "Too many workers: 600 (limit 512)");

        let err = ConfigError::NoCandidates {
            words: 1,
            min: 2,
            max: 3,
        };
        assert!(err.to_string().contains("produce no candidates"));
    }
}
