//! Shared search state
//!
//! One `SearchState` exists per run and is shared by handle between the
//! coordinator and every worker:
//! - the attempt counter, incremented once per probe call
//! - the result slot, which accepts exactly one `FoundPassword`
//! - the stop flag, checked by workers before each candidate
//! - the event channel the coordinator blocks on
//!
//! The counter is only touched by single atomic operations, so it is never
//! held across a probe call.

use crossbeam_channel::{unbounded, Receiver, Sender};
use serde::Serialize;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, OnceLock};

/// A password accepted by the archive
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FoundPassword {
    /// The password that unlocked the archive
    pub password: String,

    /// Attempt counter value when the password was published
    pub attempts: u64,

    /// Worker that found it
    pub worker: usize,
}

/// Events that wake the coordinator
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchEvent {
    /// The result slot was filled
    Found,

    /// A worker left its loop (exhausted, stopped, or panicked)
    Finished { worker: usize },

    /// Cancellation was requested from outside the search
    Cancelled,
}

/// State shared by the coordinator and all workers of one run
#[derive(Debug)]
pub struct SearchState {
    /// Total probe calls across all workers
    attempts: AtomicU64,

    /// Set-once result slot
    winner: OnceLock<FoundPassword>,

    /// Workers stop starting new probes once set
    stop: AtomicBool,

    /// Workers currently inside their loop
    active_workers: AtomicUsize,

    /// Wakes the coordinator
    events: Sender<SearchEvent>,
}

impl SearchState {
    /// Create the state and the receiving end of its event channel
    pub fn new() -> (Arc<Self>, Receiver<SearchEvent>) {
        let (events, receiver) = unbounded();

        let state = Arc::new(Self {
            attempts: AtomicU64::new(0),
            winner: OnceLock::new(),
            stop: AtomicBool::new(false),
            active_workers: AtomicUsize::new(0),
            events,
        });

        (state, receiver)
    }

    /// Count one probe call, returning the new total
    pub fn record_attempt(&self) -> u64 {
        self.attempts.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Current attempt total
    pub fn attempts(&self) -> u64 {
        self.attempts.load(Ordering::SeqCst)
    }

    /// Offer a found password to the result slot
    ///
    /// Returns true only for the first caller. The winner also raises the
    /// stop flag and wakes the coordinator; later callers change nothing.
    pub fn publish(&self, found: FoundPassword) -> bool {
        if self.winner.set(found).is_err() {
            return false;
        }

        self.stop.store(true, Ordering::SeqCst);
        // The coordinator owns a receiver for as long as it can care
        let _ = self.events.send(SearchEvent::Found);
        true
    }

    /// The published password, if any
    pub fn winner(&self) -> Option<&FoundPassword> {
        self.winner.get()
    }

    /// Whether workers should stop starting new probes
    pub fn should_stop(&self) -> bool {
        self.stop.load(Ordering::SeqCst)
    }

    /// Request cancellation and wake the coordinator
    ///
    /// No-op if the search is already stopping.
    pub fn cancel(&self) {
        if !self.stop.swap(true, Ordering::SeqCst) {
            let _ = self.events.send(SearchEvent::Cancelled);
        }
    }

    /// Raise the stop flag without waking the coordinator
    pub(crate) fn halt(&self) {
        self.stop.store(true, Ordering::SeqCst);
    }

    /// Number of workers still inside their loop
    pub fn active_workers(&self) -> usize {
        self.active_workers.load(Ordering::SeqCst)
    }

    pub(crate) fn worker_started(&self) {
        self.active_workers.fetch_add(1, Ordering::SeqCst);
    }

    pub(crate) fn worker_finished(&self, worker: usize) {
        self.active_workers.fetch_sub(1, Ordering::SeqCst);
        let _ = self.events.send(SearchEvent::Finished { worker });
    }
}

/// Sends `Finished` when a worker leaves its loop, including by panic
pub(crate) struct FinishGuard<'a> {
    worker: usize,
    state: &'a SearchState,
}

impl<'a> FinishGuard<'a> {
    pub(crate) fn new(worker: usize, state: &'a SearchState) -> Self {
        Self { worker, state }
    }
}

impl Drop for FinishGuard<'_> {
    fn drop(&mut self) {
        self.state.worker_finished(self.worker);
    }
}

/// Cloneable handle for cancelling a running search (e.g. from a signal handler)
#[derive(Debug, Clone)]
pub struct CancelHandle {
    state: Arc<SearchState>,
}

impl CancelHandle {
    pub(crate) fn new(state: Arc<SearchState>) -> Self {
        Self { state }
    }

    /// Stop workers after their in-flight probe and wake the coordinator
    pub fn cancel(&self) {
        self.state.cancel();
    }

    /// Whether the search has been told to stop (cancelled or found)
    pub fn is_stopping(&self) -> bool {
        self.state.should_stop()
    }
}
