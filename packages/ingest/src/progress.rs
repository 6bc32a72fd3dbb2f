//! Row-count progress for the CSV readers.
//!
//! Keeps the readers independent of any rendering backend; the CLI
//! supplies an `indicatif` implementation and tests use [`NullProgress`].

use std::sync::Arc;

/// Receives progress from [`crate::read_records`] and the CLI file loop.
pub trait ProgressCallback: Send + Sync {
    /// Advance by `delta` rows or files.
    fn inc(&self, delta: u64);

    /// Done; remove the indicator.
    fn finish_and_clear(&self);
}

/// Discards all progress.
pub struct NullProgress;

impl ProgressCallback for NullProgress {
    fn inc(&self, _delta: u64) {}
    fn finish_and_clear(&self) {}
}

#[must_use]
pub fn null_progress() -> Arc<dyn ProgressCallback> {
    Arc::new(NullProgress)
}
