//! perm-cracker - Parallel vocabulary-permutation password search
//!
//! Recovers the password of an encrypted ZIP archive when the password is
//! known to be a concatenation of a few distinct words from a small
//! vocabulary (phone numbers, names, dates, ...).
//!
//! # Features
//!
//! - **Ordered candidate space**: every arrangement of 2 to 3 distinct seed
//!   words (configurable), generated in a fixed, reproducible order.
//!
//! - **Parallel probing**: the candidate list is split into contiguous
//!   chunks, one worker thread per chunk.
//!
//! - **First success wins**: exactly one password is reported even when
//!   several workers succeed at once; everyone else stops before their
//!   next attempt.
//!
//! - **Strict verification**: a password is only accepted once every entry
//!   decrypts and passes its integrity check.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │  CLI (config::CliArgs -> CrackConfig)                        │
//! └──────────────────────────────┬───────────────────────────────┘
//!                                │
//!                                ▼
//! ┌──────────────────────────────────────────────────────────────┐
//! │  archive::ZipProber::open  (validated before any thread)     │
//! └──────────────────────────────┬───────────────────────────────┘
//!                                │
//!                                ▼
//! ┌──────────────────────────────────────────────────────────────┐
//! │  search::SearchCoordinator                                   │
//! │   generate ─► partition ─► Worker 0 .. Worker N              │
//! │                               │                              │
//! │                               ▼                              │
//! │            SearchState (counter, result slot, stop flag)     │
//! └──────────────────────────────┬───────────────────────────────┘
//!                                │
//!                                ▼
//!                  SearchReport (Found / NotFound)
//! ```
//!
//! # Example
//!
//! ```no_run
//! let report = perm_cracker::crack_archive(
//!     "locked.zip",
//!     vec!["12345".into(), "abcd".into()],
//!     4,
//! )?;
//!
//! match report.outcome.password() {
//!     Some(password) => println!("password: {password}"),
//!     None => println!("not found after {} attempts", report.attempts),
//! }
//! # Ok::<(), perm_cracker::CrackError>(())
//! ```

pub mod archive;
pub mod config;
pub mod error;
pub mod progress;
pub mod search;

pub use archive::{ArchiveProber, ZipProber};
pub use config::{CliArgs, CrackConfig};
pub use error::{CrackError, Result};
pub use search::{
    crack_archive, LengthRange, SearchConfig, SearchCoordinator, SearchOutcome, SearchReport,
};
