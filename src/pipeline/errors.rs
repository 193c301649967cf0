//! Pipeline error taxonomy.
//!
//! Empty input is deliberately absent: tokenization that yields zero tokens
//! produces an empty [`FrequencyTable`](super::artifacts::FrequencyTable),
//! not an error. Everything here aborts the whole run — a partial or
//! silently truncated table never escapes the pipeline.

use thiserror::Error;

/// Failure modes of a pipeline run.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// The run was cancelled before completion via a
    /// [`CancelToken`](super::cancel::CancelToken).
    #[error("run cancelled before completion")]
    Cancelled,

    /// A worker task panicked during a parallel phase. Pure stage functions
    /// should never panic, but a dropped task would corrupt the count for
    /// its key, so the panic is caught and surfaced as a run-level failure.
    #[error("worker task panicked in the {stage} stage")]
    WorkerPanic { stage: &'static str },

    /// The dedicated worker pool could not be constructed.
    #[error("failed to build worker pool")]
    Pool(#[from] rayon::ThreadPoolBuildError),

    /// The tokenized input exceeds the configured `max_tokens` limit.
    #[error("input has {count} tokens, exceeding the configured limit of {limit}")]
    TokenLimit { count: usize, limit: usize },
}
