//! Cooperative cancellation for in-flight runs.
//!
//! A [`CancelToken`] is a cheaply cloneable shared flag. The runner checks
//! it at batch boundaries in the map phase and per group in the reduce
//! phase; once the flag is set, the run aborts with
//! [`PipelineError::Cancelled`](super::errors::PipelineError::Cancelled) and
//! no partially-built table is returned.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Shared cancellation flag for one or more pipeline runs.
///
/// Clones observe the same flag. Cancellation is sticky: there is no reset.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    /// Create a fresh, uncancelled token.
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation of every run holding a clone of this token.
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::Relaxed);
    }

    /// Returns `true` once [`cancel`](Self::cancel) has been called.
    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::Relaxed)
    }
}
