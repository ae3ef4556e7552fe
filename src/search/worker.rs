//! Worker thread logic for the parallel password search
//!
//! Each worker:
//! - Owns one contiguous chunk of the shared candidate list
//! - Probes its candidates strictly in order, never retrying
//! - Counts every probe in the shared attempt counter
//! - Checks the stop flag before each candidate (a probe in flight is never interrupted)
//! - Publishes a found password to the shared result slot and stops

use crate::archive::ArchiveProber;
use crate::error::{ProbeError, WorkerError};
use crate::search::state::{FinishGuard, FoundPassword, SearchState};
use std::ops::Range;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use tracing::{debug, info, trace};

/// A contiguous slice of the shared candidate list
#[derive(Debug, Clone)]
pub struct Chunk {
    candidates: Arc<[String]>,
    range: Range<usize>,
}

impl Chunk {
    /// Chunk covering `range` of `candidates`
    pub fn new(candidates: Arc<[String]>, range: Range<usize>) -> Self {
        Self { candidates, range }
    }

    /// Candidates in this chunk, in order
    pub fn passwords(&self) -> &[String] {
        &self.candidates[self.range.clone()]
    }

    /// Number of candidates
    pub fn len(&self) -> usize {
        self.range.len()
    }

    /// Check if the chunk has no candidates
    pub fn is_empty(&self) -> bool {
        self.range.is_empty()
    }

    /// Index range into the full candidate list
    pub fn range(&self) -> Range<usize> {
        self.range.clone()
    }
}

/// How a worker left its loop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerExit {
    /// This worker's probe succeeded
    Found,

    /// Every candidate in the chunk was tried
    Exhausted,

    /// Stop flag seen before the chunk was done
    Stopped,
}

/// Statistics collected by a worker
#[derive(Debug, Default)]
pub struct WorkerStats {
    /// Probes made by this worker
    pub attempts: AtomicU64,

    /// Probes rejected as a wrong password
    pub rejected: AtomicU64,

    /// Probes that failed for any other reason
    pub errors: AtomicU64,
}

impl WorkerStats {
    fn record_attempt(&self) {
        self.attempts.fetch_add(1, Ordering::Relaxed);
    }

    fn record_failure(&self, error: &ProbeError) {
        if error.is_wrong_password() {
            self.rejected.fetch_add(1, Ordering::Relaxed);
        } else {
            self.errors.fetch_add(1, Ordering::Relaxed);
        }
    }
}

/// A worker thread that probes one chunk
pub struct Worker {
    /// Worker ID
    id: usize,

    /// Thread handle
    handle: Option<JoinHandle<WorkerExit>>,

    /// Worker statistics
    stats: Arc<WorkerStats>,
}

impl Worker {
    /// Spawn a new worker thread
    pub fn spawn(
        id: usize,
        chunk: Chunk,
        prober: Arc<dyn ArchiveProber>,
        state: Arc<SearchState>,
    ) -> Result<Self, WorkerError> {
        let stats = Arc::new(WorkerStats::default());
        let stats_clone = Arc::clone(&stats);

        // Counted before the thread exists so the coordinator never sees zero
        // active workers while one is still starting
        state.worker_started();
        let guard_state = Arc::clone(&state);

        let handle = thread::Builder::new()
            .name(format!("prober-{}", id))
            .spawn(move || worker_loop(id, chunk, prober, state, stats_clone))
            .map_err(|e| {
                guard_state.worker_finished(id);
                WorkerError::SpawnFailed {
                    id,
                    reason: e.to_string(),
                }
            })?;

        Ok(Self {
            id,
            handle: Some(handle),
            stats,
        })
    }

    /// Get worker ID
    pub fn id(&self) -> usize {
        self.id
    }

    /// Shared handle to the worker's statistics
    ///
    /// Stays readable after the worker is joined or detached.
    pub fn stats(&self) -> Arc<WorkerStats> {
        Arc::clone(&self.stats)
    }

    /// Wait for the worker to finish
    pub fn join(mut self) -> Result<WorkerExit, WorkerError> {
        match self.handle.take() {
            Some(handle) => handle.join().map_err(|_| WorkerError::Panicked {
                id: self.id,
                message: "Worker thread panicked".into(),
            }),
            None => Ok(WorkerExit::Stopped),
        }
    }

    /// Let the thread run to completion without waiting for it
    pub fn detach(mut self) {
        self.handle.take();
    }
}

/// Main worker loop
fn worker_loop(
    id: usize,
    chunk: Chunk,
    prober: Arc<dyn ArchiveProber>,
    state: Arc<SearchState>,
    stats: Arc<WorkerStats>,
) -> WorkerExit {
    let _guard = FinishGuard::new(id, &state);

    debug!(
        worker = id,
        start = chunk.range().start,
        candidates = chunk.len(),
        "Worker starting"
    );

    for password in chunk.passwords() {
        if state.should_stop() {
            debug!(
                worker = id,
                attempts = stats.attempts.load(Ordering::Relaxed),
                "Stop requested, abandoning chunk"
            );
            return WorkerExit::Stopped;
        }

        let total = state.record_attempt();
        stats.record_attempt();

        match prober.probe(password) {
            Ok(()) => {
                let found = FoundPassword {
                    password: password.clone(),
                    attempts: state.attempts(),
                    worker: id,
                };

                if state.publish(found) {
                    info!(worker = id, password = %password, attempts = total, "Password accepted");
                } else {
                    debug!(worker = id, password = %password, "Password accepted after another worker won");
                }
                return WorkerExit::Found;
            }
            Err(e) => {
                stats.record_failure(&e);
                if !e.is_wrong_password() {
                    trace!(worker = id, password = %password, error = %e, "Probe error");
                }
                debug!(worker = id, password = %password, attempts = total, "Password failed");
            }
        }
    }

    debug!(
        worker = id,
        attempts = stats.attempts.load(Ordering::Relaxed),
        "Chunk exhausted"
    );

    WorkerExit::Exhausted
}
