//! Archive access
//!
//! The search engine only needs one capability from an archive: try a
//! password and report whether it worked. `ArchiveProber` is that seam.
//! Implementations must tolerate concurrent calls from every worker and keep
//! no state between calls that could change an answer.

pub mod zipfile;

pub use zipfile::ZipProber;

use crate::error::ProbeResult;

/// Attempts to unlock an archive with a single password
pub trait ArchiveProber: Send + Sync {
    /// `Ok(())` if the password unlocks the archive
    ///
    /// Any error counts as a failed attempt.
    fn probe(&self, password: &str) -> ProbeResult;
}

impl<F> ArchiveProber for F
where
    F: Fn(&str) -> ProbeResult + Send + Sync,
{
    fn probe(&self, password: &str) -> ProbeResult {
        self(password)
    }
}
