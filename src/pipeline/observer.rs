//! Pipeline observer — hooks for logging, profiling, and debugging.
//!
//! Observers receive notifications at stage boundaries without coupling to
//! stage logic. Use cases include timing stages, capturing intermediate
//! artifacts for debugging, and emitting structured telemetry.

use crate::pipeline::artifacts::{FrequencyTable, GroupedEntries, MappedPairs, TokenStream};
use std::time::{Duration, Instant};

/// Stage name constants, in execution order.
pub const STAGE_TOKENIZE: &str = "tokenize";
pub const STAGE_MAP: &str = "map";
pub const STAGE_SHUFFLE: &str = "shuffle";
pub const STAGE_REDUCE: &str = "reduce";
pub const STAGE_ASSEMBLE: &str = "assemble";

// ============================================================================
// StageClock / StageReport
// ============================================================================

/// Wall-clock timer for one stage.
#[derive(Debug)]
pub struct StageClock {
    start: Instant,
}

impl StageClock {
    /// Start timing a stage.
    pub fn start() -> Self {
        Self {
            start: Instant::now(),
        }
    }

    /// Elapsed time since the clock started.
    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }
}

/// Metrics reported at the end of one stage.
#[derive(Debug, Clone)]
pub struct StageReport {
    elapsed: Duration,
    tokens: Option<usize>,
    pairs: Option<usize>,
    groups: Option<usize>,
    distinct: Option<usize>,
}

impl StageReport {
    /// A report carrying only the elapsed time.
    pub fn new(elapsed: Duration) -> Self {
        Self {
            elapsed,
            tokens: None,
            pairs: None,
            groups: None,
            distinct: None,
        }
    }

    /// Elapsed wall-clock time for the stage.
    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }

    /// Number of tokens produced (tokenize stage).
    pub fn tokens(&self) -> Option<usize> {
        self.tokens
    }

    /// Number of key-value pairs emitted (map stage).
    pub fn pairs(&self) -> Option<usize> {
        self.pairs
    }

    /// Number of groups formed (shuffle stage).
    pub fn groups(&self) -> Option<usize> {
        self.groups
    }

    /// Number of distinct keys in the final table (assemble stage).
    pub fn distinct(&self) -> Option<usize> {
        self.distinct
    }
}

/// Builder for a [`StageReport`] with optional counters.
#[derive(Debug)]
pub struct StageReportBuilder {
    report: StageReport,
}

impl StageReportBuilder {
    /// Start a report from the stage's elapsed time.
    pub fn new(elapsed: Duration) -> Self {
        Self {
            report: StageReport::new(elapsed),
        }
    }

    /// Record the token count.
    pub fn tokens(mut self, tokens: usize) -> Self {
        self.report.tokens = Some(tokens);
        self
    }

    /// Record the pair count.
    pub fn pairs(mut self, pairs: usize) -> Self {
        self.report.pairs = Some(pairs);
        self
    }

    /// Record the group count.
    pub fn groups(mut self, groups: usize) -> Self {
        self.report.groups = Some(groups);
        self
    }

    /// Record the distinct-key count.
    pub fn distinct(mut self, distinct: usize) -> Self {
        self.report.distinct = Some(distinct);
        self
    }

    /// Finish the report.
    pub fn build(self) -> StageReport {
        self.report
    }
}

// ============================================================================
// PipelineObserver
// ============================================================================

/// Callbacks invoked at stage boundaries during a pipeline run.
///
/// All methods have empty default bodies, so implementors override only what
/// they care about. Artifact callbacks receive immutable borrows; observers
/// cannot perturb the run.
pub trait PipelineObserver {
    /// A stage is about to execute.
    fn on_stage_start(&mut self, _stage: &'static str) {}

    /// A stage finished; `report` carries its timing and counters.
    fn on_stage_end(&mut self, _stage: &'static str, _report: &StageReport) {}

    /// The tokenizer produced its stream.
    fn on_tokens(&mut self, _tokens: &TokenStream) {}

    /// The map phase emitted its pairs.
    fn on_pairs(&mut self, _pairs: &MappedPairs) {}

    /// The shuffle barrier formed its groups.
    fn on_groups(&mut self, _groups: &GroupedEntries) {}

    /// The final frequency table was assembled.
    fn on_table(&mut self, _table: &FrequencyTable) {}
}

/// Observer that does nothing — zero-overhead default.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopObserver;

impl PipelineObserver for NoopObserver {}

/// Observer that records `(stage, report)` for every completed stage.
#[derive(Debug, Default)]
pub struct StageTimingObserver {
    reports: Vec<(&'static str, StageReport)>,
}

impl StageTimingObserver {
    /// Create an empty timing observer.
    pub fn new() -> Self {
        Self::default()
    }

    /// The collected reports, in stage execution order.
    pub fn reports(&self) -> &[(&'static str, StageReport)] {
        &self.reports
    }
}

impl PipelineObserver for StageTimingObserver {
    fn on_stage_end(&mut self, stage: &'static str, report: &StageReport) {
        self.reports.push((stage, report.clone()));
    }
}
