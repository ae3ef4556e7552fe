//! Search coordinator - orchestrates the parallel password search
//!
//! The coordinator is responsible for:
//! - Validating the configuration and materializing the candidate list
//! - Partitioning candidates and spawning one worker per chunk
//! - Blocking until the first success, exhaustion, or cancellation
//! - Producing exactly one outcome per run
//!
//! Phases: `Idle -> Validating -> Searching -> {Succeeded | Exhausted | Cancelled}`.
//! `new` covers validation, `run` covers the search; the terminal phase is
//! carried on the `SearchReport`.

use crate::archive::ArchiveProber;
use crate::error::{ConfigError, Result};
use crate::search::candidates::{self, LengthRange};
use crate::search::partition::partition;
use crate::search::state::{CancelHandle, SearchEvent, SearchState};
use crate::search::worker::{Chunk, Worker, WorkerStats};
use chrono::{DateTime, Utc};
use crossbeam_channel::Receiver;
use serde::Serialize;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Worker count used when the caller does not pick one
pub const DEFAULT_WORKERS: usize = 2;

/// Inputs for one search run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchConfig {
    /// Seed words, in the order candidates are built from
    pub vocabulary: Vec<String>,

    /// Words per candidate
    pub range: LengthRange,

    /// Number of parallel workers
    pub worker_count: usize,
}

impl SearchConfig {
    /// Default range (2..=3) and worker count
    pub fn new(vocabulary: Vec<String>) -> Self {
        Self {
            vocabulary,
            range: LengthRange::default(),
            worker_count: DEFAULT_WORKERS,
        }
    }

    /// Override the worker count
    pub fn with_workers(mut self, worker_count: usize) -> Self {
        self.worker_count = worker_count;
        self
    }

    /// Override the length range
    pub fn with_range(mut self, range: LengthRange) -> Self {
        self.range = range;
        self
    }

    /// Check the configuration, returning the candidate count it yields
    pub fn validate(&self) -> std::result::Result<u64, ConfigError> {
        if self.worker_count == 0 {
            return Err(ConfigError::InvalidWorkerCount {
                count: self.worker_count,
            });
        }

        if self.vocabulary.is_empty() {
            return Err(ConfigError::EmptyVocabulary);
        }

        let count = candidates::candidate_count(self.vocabulary.len(), self.range);
        if count == 0 {
            return Err(ConfigError::NoCandidates {
                words: self.vocabulary.len(),
                min: self.range.min(),
                max: self.range.max(),
            });
        }

        Ok(count)
    }
}

/// Coordinator state machine phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchPhase {
    Idle,
    Validating,
    Searching,
    /// A worker published a password
    Succeeded,
    /// Every worker finished its chunk without success
    Exhausted,
    /// Stopped on request before the space was exhausted
    Cancelled,
}

/// Final result of a run
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SearchOutcome {
    /// A worker's probe succeeded
    Found {
        password: String,
        /// Attempt counter when the password was published
        attempts: u64,
    },

    /// No candidate unlocked the archive
    NotFound { attempts: u64 },
}

impl SearchOutcome {
    /// Returns true if a password was found
    pub fn is_found(&self) -> bool {
        matches!(self, SearchOutcome::Found { .. })
    }

    /// The found password, if any
    pub fn password(&self) -> Option<&str> {
        match self {
            SearchOutcome::Found { password, .. } => Some(password),
            SearchOutcome::NotFound { .. } => None,
        }
    }

    /// Attempt count carried by the outcome
    pub fn attempts(&self) -> u64 {
        match self {
            SearchOutcome::Found { attempts, .. } => *attempts,
            SearchOutcome::NotFound { attempts } => *attempts,
        }
    }
}

/// Result of a completed run
#[derive(Debug, Clone, Serialize)]
pub struct SearchReport {
    /// Found or not found
    pub outcome: SearchOutcome,

    /// Terminal phase of the run
    pub phase: SearchPhase,

    /// Attempt counter when the coordinator returned
    pub attempts: u64,

    /// Size of the candidate space
    pub total_candidates: u64,

    /// Workers spawned
    pub workers: usize,

    /// When the search phase began
    pub started_at: DateTime<Utc>,

    /// Time spent searching
    pub duration: Duration,

    /// False if the run was cancelled before the space was exhausted
    pub completed: bool,

    /// Probes that failed for a reason other than a wrong password
    ///
    /// A search where every probe errors out usually means the archive
    /// opens but cannot be decrypted at all (unsupported method, corrupt
    /// entries), not that the password is absent.
    pub probe_errors: u64,
}

impl SearchReport {
    /// Probes per second over the whole run
    pub fn attempts_per_second(&self) -> f64 {
        let secs = self.duration.as_secs_f64();
        if secs > 0.0 {
            self.attempts as f64 / secs
        } else {
            0.0
        }
    }
}

/// Coordinates the parallel password search
pub struct SearchCoordinator {
    /// Shared, read-only candidate list
    candidates: Arc<[String]>,

    /// Requested worker count
    worker_count: usize,

    /// Archive collaborator
    prober: Arc<dyn ArchiveProber>,

    /// Counter, result slot, stop flag
    state: Arc<SearchState>,

    /// Wakes `run`
    events: Receiver<SearchEvent>,

    /// Worker threads
    workers: Vec<Worker>,

    /// Current phase
    phase: SearchPhase,
}

impl SearchCoordinator {
    /// Validate the configuration and build the candidate list
    ///
    /// No thread is started here; every configuration error surfaces before
    /// `run` is possible.
    pub fn new(config: SearchConfig, prober: Arc<dyn ArchiveProber>) -> Result<Self> {
        debug!(
            from = ?SearchPhase::Idle,
            to = ?SearchPhase::Validating,
            words = config.vocabulary.len(),
            range = %config.range,
            "Phase change"
        );

        let expected = config.validate()?;
        let candidates: Arc<[String]> = candidates::generate(&config.vocabulary, config.range).into();
        debug_assert_eq!(candidates.len() as u64, expected);

        info!(
            candidates = candidates.len(),
            words = config.vocabulary.len(),
            range = %config.range,
            "Total passwords to test"
        );

        let (state, events) = SearchState::new();

        Ok(Self {
            candidates,
            worker_count: config.worker_count,
            prober,
            state,
            events,
            workers: Vec::new(),
            phase: SearchPhase::Validating,
        })
    }

    /// Size of the candidate space
    pub fn total_candidates(&self) -> u64 {
        self.candidates.len() as u64
    }

    /// The ordered candidate list
    pub fn candidates(&self) -> &[String] {
        &self.candidates
    }

    /// Handle for cancelling the run from another thread (e.g. a signal handler)
    pub fn cancel_handle(&self) -> CancelHandle {
        CancelHandle::new(Arc::clone(&self.state))
    }

    /// Read-only view of the run's progress
    pub fn monitor(&self) -> SearchMonitor {
        SearchMonitor {
            state: Arc::clone(&self.state),
            total: self.total_candidates(),
            started: Instant::now(),
        }
    }

    /// Run the search to success, exhaustion, or cancellation
    pub fn run(mut self) -> Result<SearchReport> {
        let start_time = Instant::now();
        let started_at = Utc::now();
        self.transition(SearchPhase::Searching);

        self.spawn_workers()?;
        let spawned = self.workers.len();

        let cancelled = self.wait_for_outcome(spawned);
        let attempts = self.state.attempts();
        let duration = start_time.elapsed();
        let stats: Vec<Arc<WorkerStats>> = self.workers.iter().map(Worker::stats).collect();

        let outcome = match self.state.winner().cloned() {
            Some(found) => {
                self.transition(SearchPhase::Succeeded);
                info!(
                    password = %found.password,
                    worker = found.worker,
                    attempts = found.attempts,
                    "Success! Password found"
                );

                // In-flight probes finish on their own; nobody waits for them
                for worker in std::mem::take(&mut self.workers) {
                    worker.detach();
                }

                SearchOutcome::Found {
                    password: found.password,
                    attempts: found.attempts,
                }
            }
            None => {
                self.join_workers();

                if cancelled {
                    self.transition(SearchPhase::Cancelled);
                    info!(attempts, "Search cancelled before a password was found");
                } else {
                    self.transition(SearchPhase::Exhausted);
                    info!(attempts, "Password not found");
                }

                SearchOutcome::NotFound { attempts }
            }
        };

        // Detached workers may still be finishing a probe; this is a snapshot
        let probe_errors = stats
            .iter()
            .map(|s| s.errors.load(Ordering::Relaxed))
            .sum::<u64>();
        if probe_errors > 0 {
            warn!(probe_errors, "Some probes failed for reasons other than a wrong password");
        }

        Ok(SearchReport {
            outcome,
            phase: self.phase,
            attempts,
            total_candidates: self.total_candidates(),
            workers: spawned,
            started_at,
            duration,
            completed: self.phase != SearchPhase::Cancelled,
            probe_errors,
        })
    }

    fn transition(&mut self, next: SearchPhase) {
        debug!(from = ?self.phase, to = ?next, "Phase change");
        self.phase = next;
    }

    /// Spawn one worker per non-empty chunk
    fn spawn_workers(&mut self) -> Result<()> {
        let ranges = partition(self.candidates.len(), self.worker_count)?;

        for (id, range) in ranges.into_iter().filter(|r| !r.is_empty()).enumerate() {
            let chunk = Chunk::new(Arc::clone(&self.candidates), range);

            match Worker::spawn(id, chunk, Arc::clone(&self.prober), Arc::clone(&self.state)) {
                Ok(worker) => self.workers.push(worker),
                Err(e) => {
                    // Already running workers wind down on their own
                    self.state.halt();
                    return Err(e.into());
                }
            }
        }

        info!(count = self.workers.len(), "Workers spawned");
        Ok(())
    }

    /// Block until a password is published or every worker has finished
    ///
    /// Returns true if cancellation was requested along the way.
    fn wait_for_outcome(&self, spawned: usize) -> bool {
        let mut running = spawned;
        let mut cancelled = false;

        while running > 0 {
            match self.events.recv() {
                Ok(SearchEvent::Found) => break,
                Ok(SearchEvent::Finished { worker }) => {
                    running -= 1;
                    debug!(worker, remaining = running, "Worker finished");
                }
                Ok(SearchEvent::Cancelled) => {
                    info!("Cancellation requested, waiting for in-flight probes");
                    cancelled = true;
                }
                // Unreachable while `self.state` holds the sender
                Err(_) => break,
            }
        }

        cancelled
    }

    /// Join all worker threads, logging any that panicked
    fn join_workers(&mut self) {
        for worker in std::mem::take(&mut self.workers) {
            let id = worker.id();
            match worker.join() {
                Ok(exit) => debug!(worker = id, ?exit, "Worker joined"),
                Err(e) => warn!(error = %e, "Worker failed to join cleanly"),
            }
        }
    }
}

/// Point-in-time progress snapshot
#[derive(Debug, Clone)]
pub struct SearchProgress {
    /// Probes made so far
    pub attempts: u64,

    /// Size of the candidate space
    pub total: u64,

    /// Workers still probing
    pub active_workers: usize,

    /// Elapsed time
    pub elapsed: Duration,
}

impl SearchProgress {
    /// Probes per second
    pub fn attempts_per_second(&self) -> f64 {
        let secs = self.elapsed.as_secs_f64();
        if secs > 0.0 {
            self.attempts as f64 / secs
        } else {
            0.0
        }
    }

    /// Fraction of the space probed, 0.0 to 1.0
    pub fn fraction(&self) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        (self.attempts as f64 / self.total as f64).min(1.0)
    }
}

/// Read-only handle for progress display
#[derive(Debug, Clone)]
pub struct SearchMonitor {
    state: Arc<SearchState>,
    total: u64,
    started: Instant,
}

impl SearchMonitor {
    /// Take a progress snapshot
    pub fn snapshot(&self) -> SearchProgress {
        SearchProgress {
            attempts: self.state.attempts(),
            total: self.total,
            active_workers: self.state.active_workers(),
            elapsed: self.started.elapsed(),
        }
    }

    /// Whether workers have been told to stop (found or cancelled)
    pub fn is_stopping(&self) -> bool {
        self.state.should_stop()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{CrackError, ProbeError, ProbeResult};
    use std::sync::atomic::{AtomicU64, Ordering};
    use std::sync::Mutex;

    fn vocab(words: &[&str]) -> Vec<String> {
        words.iter().map(|w| w.to_string()).collect()
    }

    /// Stub prober that counts calls and accepts a fixed set of passwords
    struct StubProber {
        accept: Vec<String>,
        calls: AtomicU64,
        seen: Mutex<Vec<String>>,
    }

    impl StubProber {
        fn accepting(accept: &[&str]) -> Arc<Self> {
            Arc::new(Self {
                accept: vocab(accept),
                calls: AtomicU64::new(0),
                seen: Mutex::new(Vec::new()),
            })
        }

        fn calls(&self) -> u64 {
            self.calls.load(Ordering::SeqCst)
        }
    }

    impl ArchiveProber for StubProber {
        fn probe(&self, password: &str) -> ProbeResult {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.seen.lock().unwrap().push(password.to_string());
            if self.accept.iter().any(|a| a == password) {
                Ok(())
            } else {
                Err(ProbeError::WrongPassword)
            }
        }
    }

    #[test]
    fn test_config_validation() {
        assert_eq!(SearchConfig::new(vocab(&["a", "b", "c"])).validate(), Ok(12));

        assert!(matches!(
            SearchConfig::new(vocab(&["a", "b"])).with_workers(0).validate(),
            Err(ConfigError::InvalidWorkerCount { count: 0, .. })
        ));
        assert_eq!(
            SearchConfig::new(Vec::new()).validate(),
            Err(ConfigError::EmptyVocabulary)
        );
        assert!(matches!(
            SearchConfig::new(vocab(&["solo"])).validate(),
            Err(ConfigError::NoCandidates { words: 1, .. })
        ));
    }

    #[test]
    fn test_new_rejects_before_spawning() {
        let prober = StubProber::accepting(&[]);
        let result = SearchCoordinator::new(SearchConfig::new(Vec::new()), prober.clone());

        assert!(matches!(result, Err(CrackError::Config(ConfigError::EmptyVocabulary))));
        assert_eq!(prober.calls(), 0);
    }

    #[test]
    fn test_finds_password_among_workers() {
        let prober = StubProber::accepting(&["cab"]);
        let config = SearchConfig::new(vocab(&["a", "b", "c"])).with_workers(3);
        let coordinator = SearchCoordinator::new(config, prober.clone()).unwrap();
        assert_eq!(coordinator.total_candidates(), 12);

        let report = coordinator.run().unwrap();

        assert_eq!(report.outcome.password(), Some("cab"));
        assert!(report.outcome.attempts() >= 1);
        assert!(report.outcome.attempts() <= report.total_candidates);
        assert!(report.completed);
        assert_eq!(report.workers, 3);
    }

    #[test]
    fn test_not_found_counts_every_candidate() {
        let prober = StubProber::accepting(&[]);
        let config = SearchConfig::new(vocab(&["a", "b", "c", "d"])).with_workers(3);
        let report = SearchCoordinator::new(config, prober.clone()).unwrap().run().unwrap();

        // 4*3 + 4*3*2
        assert_eq!(report.outcome, SearchOutcome::NotFound { attempts: 36 });
        assert_eq!(report.attempts, 36);
        assert_eq!(prober.calls(), 36);
        assert!(report.completed);

        let mut seen = prober.seen.lock().unwrap().clone();
        let mut expected = candidates::generate(&vocab(&["a", "b", "c", "d"]), LengthRange::default());
        seen.sort();
        expected.sort();
        assert_eq!(seen, expected);
    }

    #[test]
    fn test_single_found_when_every_probe_succeeds() {
        for _ in 0..20 {
            let prober: Arc<dyn ArchiveProber> = Arc::new(|_: &str| -> ProbeResult { Ok(()) });
            let config = SearchConfig::new(vocab(&["a", "b", "c", "d"])).with_workers(8);
            let coordinator = SearchCoordinator::new(config, prober).unwrap();
            let candidates = coordinator.candidates().to_vec();

            let report = coordinator.run().unwrap();

            let password = report.outcome.password().unwrap().to_string();
            assert!(candidates.contains(&password));
            assert!(report.outcome.attempts() <= 8);
        }
    }

    #[test]
    fn test_more_workers_than_candidates() {
        let prober = StubProber::accepting(&[]);
        let config = SearchConfig::new(vocab(&["12", "ab"])).with_workers(6);
        let report = SearchCoordinator::new(config, prober.clone()).unwrap().run().unwrap();

        assert_eq!(report.total_candidates, 2);
        assert_eq!(report.workers, 2);
        assert_eq!(report.outcome, SearchOutcome::NotFound { attempts: 2 });
    }

    #[test]
    fn test_cancel_before_run() {
        let prober = StubProber::accepting(&["ba"]);
        let config = SearchConfig::new(vocab(&["a", "b", "c"]));
        let coordinator = SearchCoordinator::new(config, prober.clone()).unwrap();

        coordinator.cancel_handle().cancel();
        let report = coordinator.run().unwrap();

        assert!(!report.completed);
        assert_eq!(report.phase, SearchPhase::Cancelled);
        assert_eq!(report.outcome, SearchOutcome::NotFound { attempts: 0 });
        assert_eq!(prober.calls(), 0);
    }

    #[test]
    fn test_terminal_phase_per_outcome() {
        let found = SearchCoordinator::new(
            SearchConfig::new(vocab(&["a", "b", "c"])),
            StubProber::accepting(&["ba"]),
        )
        .unwrap()
        .run()
        .unwrap();
        assert_eq!(found.phase, SearchPhase::Succeeded);
        assert!(found.completed);

        let exhausted = SearchCoordinator::new(
            SearchConfig::new(vocab(&["a", "b", "c"])),
            StubProber::accepting(&[]),
        )
        .unwrap()
        .run()
        .unwrap();
        assert_eq!(exhausted.phase, SearchPhase::Exhausted);
        assert!(exhausted.completed);

        let coordinator = SearchCoordinator::new(
            SearchConfig::new(vocab(&["a", "b", "c"])),
            StubProber::accepting(&[]),
        )
        .unwrap();
        coordinator.cancel_handle().cancel();
        let cancelled = coordinator.run().unwrap();
        assert_eq!(cancelled.phase, SearchPhase::Cancelled);
        assert!(!cancelled.completed);
    }

    #[test]
    fn test_worker_count_has_no_upper_bound() {
        let prober = StubProber::accepting(&[]);
        // 5*4 + 5*4*3 = 80 candidates, one worker each
        let config = SearchConfig::new(vocab(&["a", "b", "c", "d", "e"])).with_workers(600);
        assert_eq!(config.validate(), Ok(80));

        let report = SearchCoordinator::new(config, prober.clone()).unwrap().run().unwrap();

        assert_eq!(report.workers, 80);
        assert_eq!(report.outcome, SearchOutcome::NotFound { attempts: 80 });
        assert_eq!(prober.calls(), 80);
    }

    #[test]
    fn test_large_vocabulary_is_valid() {
        let words: Vec<String> = (0..400).map(|i| format!("w{}", i)).collect();

        // 400*399 + 400*399*398
        assert_eq!(SearchConfig::new(words).validate(), Ok(63_680_400));
    }

    #[test]
    fn test_probe_errors_reported() {
        let prober: Arc<dyn ArchiveProber> =
            Arc::new(|_: &str| -> ProbeResult { Err(ProbeError::Other("unsupported method".into())) });
        let config = SearchConfig::new(vocab(&["a", "b", "c"])).with_workers(2);

        let report = SearchCoordinator::new(config, prober).unwrap().run().unwrap();

        assert_eq!(report.outcome, SearchOutcome::NotFound { attempts: 12 });
        assert_eq!(report.probe_errors, 12);
        assert_eq!(report.phase, SearchPhase::Exhausted);
    }

    #[test]
    fn test_wrong_passwords_are_not_probe_errors() {
        let report = SearchCoordinator::new(
            SearchConfig::new(vocab(&["a", "b"])),
            StubProber::accepting(&[]),
        )
        .unwrap()
        .run()
        .unwrap();

        assert_eq!(report.probe_errors, 0);
    }

    #[test]
    fn test_monitor_snapshot() {
        let prober = StubProber::accepting(&[]);
        let coordinator = SearchCoordinator::new(SearchConfig::new(vocab(&["a", "b"])), prober).unwrap();
        let monitor = coordinator.monitor();

        coordinator.run().unwrap();

        let progress = monitor.snapshot();
        assert_eq!(progress.attempts, 2);
        assert_eq!(progress.total, 2);
        assert_eq!(progress.active_workers, 0);
        assert!((progress.fraction() - 1.0).abs() < f64::EPSILON);
        assert!(!monitor.is_stopping());
    }

    #[test]
    fn test_monitor_sees_stop_after_success() {
        let prober = StubProber::accepting(&["ab"]);
        let coordinator = SearchCoordinator::new(SearchConfig::new(vocab(&["a", "b"])), prober).unwrap();
        let monitor = coordinator.monitor();
        assert!(!monitor.is_stopping());

        coordinator.run().unwrap();

        assert!(monitor.is_stopping());
    }

    #[test]
    fn test_progress_rates() {
        let progress = SearchProgress {
            attempts: 500,
            total: 1000,
            active_workers: 2,
            elapsed: Duration::from_secs(10),
        };

        assert!((progress.attempts_per_second() - 50.0).abs() < 0.1);
        assert!((progress.fraction() - 0.5).abs() < f64::EPSILON);
    }
}
