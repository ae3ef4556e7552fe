//! Parallel password search
//!
//! # Architecture
//!
//! ```text
//!   vocabulary ──► candidates::generate ──► Arc<[String]> (read-only)
//!                                               │
//!                                        partition (ceil(T/W))
//!                                               │
//!       ┌───────────────────────┬───────────────┴───────────────────┐
//!       │                       │                                   │
//! ┌─────▼─────┐           ┌─────▼─────┐                       ┌─────▼─────┐
//! │ Worker 0  │           │ Worker 1  │          ...          │ Worker N  │
//! │  probe()  │           │  probe()  │                       │  probe()  │
//! └─────┬─────┘           └─────┬─────┘                       └─────┬─────┘
//!       │                       │                                   │
//!       └──────────┬────────────┴───────────────────────────────────┘
//!                  ▼
//!   ┌───────────────────────────────────────┐
//!   │ SearchState                           │
//!   │  attempts: AtomicU64                  │
//!   │  winner:   OnceLock (first one wins)  │
//!   │  stop:     AtomicBool                 │
//!   │  events ──────────────────────────────┼──► SearchCoordinator::run
//!   └───────────────────────────────────────┘
//! ```

pub mod candidates;
pub mod coordinator;
pub mod partition;
pub mod state;
pub mod worker;

pub use candidates::LengthRange;
pub use coordinator::{
    SearchConfig, SearchCoordinator, SearchMonitor, SearchOutcome, SearchPhase, SearchProgress,
    SearchReport,
};
pub use state::{CancelHandle, FoundPassword};

use crate::archive::ZipProber;
use crate::error::Result;
use std::path::Path;
use std::sync::Arc;

/// Search a ZIP archive for a password built from `vocabulary`
///
/// Uses the default length range (2..=3 words) and does not extract. The
/// archive is validated first; a missing or unreadable archive is returned
/// as an error, never as a `NotFound` outcome.
pub fn crack_archive(
    path: impl AsRef<Path>,
    vocabulary: Vec<String>,
    workers: usize,
) -> Result<SearchReport> {
    let prober = ZipProber::open(path)?;
    let config = SearchConfig::new(vocabulary).with_workers(workers);

    SearchCoordinator::new(config, Arc::new(prober))?.run()
}
