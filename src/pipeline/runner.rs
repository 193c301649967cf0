//! Pipeline runner — orchestrates stage execution and artifact flow.
//!
//! The [`Pipeline`] struct holds a statically-composed set of pipeline stages.
//! Calling [`Pipeline::run`] executes them in order — tokenize, map
//! (parallel), shuffle (barrier), reduce (parallel), assemble — threading
//! artifacts between stages and notifying an optional [`PipelineObserver`] at
//! each boundary.
//!
//! # Static dispatch
//!
//! `Pipeline` is generic over all stage types, so the compiler monomorphizes
//! each combination into a unique concrete type. The default stages
//! ([`CountMapper`], [`HashShuffler`], [`SumReducer`]) are zero-sized and add
//! no runtime cost.
//!
//! # Concurrency policy
//!
//! The runner owns the concurrency policy. Map work is split into batches
//! (never one task per token) and executed on a bounded worker pool: the
//! process-wide pool by default, or a dedicated pool of `config.workers`
//! threads. The shuffle stage is the synchronization barrier between the two
//! parallel phases — no reduce task starts before every map batch has
//! completed and been grouped.
//!
//! A run holds no cross-invocation state; each call produces a fresh
//! [`FrequencyTable`].

use crate::pipeline::artifacts::{FrequencyTable, GroupedEntries, MappedPairs};
use crate::pipeline::cancel::CancelToken;
use crate::pipeline::errors::PipelineError;
use crate::pipeline::observer::{
    NoopObserver, PipelineObserver, StageClock, StageReportBuilder, STAGE_ASSEMBLE, STAGE_MAP,
    STAGE_REDUCE, STAGE_SHUFFLE, STAGE_TOKENIZE,
};
use crate::pipeline::traits::{CountMapper, HashShuffler, Mapper, Reducer, Shuffler, SumReducer};
use crate::tokenize::Tokenizer;
use crate::types::{Token, WordCountConfig};
use rayon::prelude::*;
use std::panic::{self, AssertUnwindSafe};

// ---------------------------------------------------------------------------
// Conditional tracing support
// ---------------------------------------------------------------------------

/// Enter a tracing span for a pipeline stage (when the `tracing` feature is
/// enabled). When disabled, this is a no-op and the compiler eliminates it.
macro_rules! trace_stage {
    ($name:expr) => {
        #[cfg(feature = "tracing")]
        let _span = tracing::info_span!("pipeline_stage", stage = $name).entered();
    };
}

/// Map batches per worker thread when no explicit batch size is configured.
/// More batches than threads keeps the pool load-balanced without
/// approaching one-task-per-token granularity.
const BATCHES_PER_THREAD: usize = 8;

// ============================================================================
// Pipeline — statically-composed stage container
// ============================================================================

/// A pipeline composed of concrete stage implementations.
///
/// # Type parameters
///
/// | Param | Trait | Default impl |
/// |-------|-------|--------------|
/// | `M` | [`Mapper`] | [`CountMapper`] |
/// | `S` | [`Shuffler`] | [`HashShuffler`] |
/// | `R` | [`Reducer`] | [`SumReducer`] |
#[derive(Debug, Clone)]
pub struct Pipeline<M = CountMapper, S = HashShuffler, R = SumReducer> {
    pub tokenizer: Tokenizer,
    pub mapper: M,
    pub shuffler: S,
    pub reducer: R,
    pub config: WordCountConfig,
}

/// Type alias for the default word-count pipeline.
pub type WordCountPipeline = Pipeline<CountMapper, HashShuffler, SumReducer>;

impl WordCountPipeline {
    /// Build the standard word-count pipeline with default configuration.
    ///
    /// All stages use their zero-sized defaults:
    /// - Punctuation-stripping whitespace tokenizer, case preserved
    /// - `(token, 1)` mapper
    /// - Single-pass hash shuffler (first-occurrence group order)
    /// - Summing reducer
    pub fn word_count() -> Self {
        Self::with_config(WordCountConfig::default())
    }

    /// Build the standard word-count pipeline with a custom configuration.
    pub fn with_config(config: WordCountConfig) -> Self {
        Pipeline {
            tokenizer: Tokenizer::from_config(&config),
            mapper: CountMapper,
            shuffler: HashShuffler,
            reducer: SumReducer,
            config,
        }
    }
}

impl Default for WordCountPipeline {
    fn default() -> Self {
        Self::word_count()
    }
}

// ============================================================================
// Pipeline::run — execute stages in order
// ============================================================================

impl<M, S, R> Pipeline<M, S, R>
where
    M: Mapper,
    S: Shuffler,
    R: Reducer,
{
    /// Execute the pipeline on `text`, producing a [`FrequencyTable`].
    ///
    /// Shorthand for [`run_cancellable`](Self::run_cancellable) with a fresh
    /// token and no observer.
    pub fn run(&self, text: &str) -> Result<FrequencyTable, PipelineError> {
        self.run_cancellable(text, &CancelToken::new(), &mut NoopObserver)
    }

    /// Execute the pipeline with stage-boundary callbacks.
    pub fn run_with_observer(
        &self,
        text: &str,
        observer: &mut impl PipelineObserver,
    ) -> Result<FrequencyTable, PipelineError> {
        self.run_cancellable(text, &CancelToken::new(), observer)
    }

    /// Execute the pipeline with cooperative cancellation.
    ///
    /// The token is checked when the run starts, at every map batch, after
    /// the shuffle barrier, and at every reduce group. A cancelled run
    /// returns [`PipelineError::Cancelled`] — never a truncated table.
    pub fn run_cancellable(
        &self,
        text: &str,
        cancel: &CancelToken,
        observer: &mut impl PipelineObserver,
    ) -> Result<FrequencyTable, PipelineError> {
        if cancel.is_cancelled() {
            return Err(PipelineError::Cancelled);
        }

        // Stage 0: tokenize
        trace_stage!(STAGE_TOKENIZE);
        observer.on_stage_start(STAGE_TOKENIZE);
        let clock = StageClock::start();
        let tokens = self.tokenizer.tokenize(text);
        let report = StageReportBuilder::new(clock.elapsed())
            .tokens(tokens.len())
            .build();
        observer.on_stage_end(STAGE_TOKENIZE, &report);
        observer.on_tokens(&tokens);

        if let Some(limit) = self.config.max_tokens {
            if tokens.len() > limit {
                return Err(PipelineError::TokenLimit {
                    count: tokens.len(),
                    limit,
                });
            }
        }

        let pool = self.build_pool()?;
        let batch = self.batch_len(tokens.len());

        // Stage 1: map (parallel)
        trace_stage!(STAGE_MAP);
        observer.on_stage_start(STAGE_MAP);
        let clock = StageClock::start();
        let pairs = run_in(&pool, || self.map_phase(tokens.tokens(), cancel, batch))?;
        let report = StageReportBuilder::new(clock.elapsed())
            .pairs(pairs.len())
            .build();
        observer.on_stage_end(STAGE_MAP, &report);
        observer.on_pairs(&pairs);

        // Stage 2: shuffle (barrier)
        trace_stage!(STAGE_SHUFFLE);
        observer.on_stage_start(STAGE_SHUFFLE);
        let clock = StageClock::start();
        let groups = self.shuffler.shuffle(pairs);
        let report = StageReportBuilder::new(clock.elapsed())
            .groups(groups.len())
            .build();
        observer.on_stage_end(STAGE_SHUFFLE, &report);
        observer.on_groups(&groups);

        if cancel.is_cancelled() {
            return Err(PipelineError::Cancelled);
        }

        // Stage 3: reduce (parallel)
        trace_stage!(STAGE_REDUCE);
        observer.on_stage_start(STAGE_REDUCE);
        let clock = StageClock::start();
        let reduced = run_in(&pool, || self.reduce_phase(groups, cancel))?;
        let report = StageReportBuilder::new(clock.elapsed()).build();
        observer.on_stage_end(STAGE_REDUCE, &report);

        // Stage 4: assemble
        trace_stage!(STAGE_ASSEMBLE);
        observer.on_stage_start(STAGE_ASSEMBLE);
        let clock = StageClock::start();
        let table = FrequencyTable::from_reduced(reduced);
        let report = StageReportBuilder::new(clock.elapsed())
            .distinct(table.len())
            .build();
        observer.on_stage_end(STAGE_ASSEMBLE, &report);
        observer.on_table(&table);

        Ok(table)
    }

    /// Build a dedicated pool when `config.workers` is set.
    fn build_pool(&self) -> Result<Option<rayon::ThreadPool>, PipelineError> {
        match self.config.workers {
            Some(workers) => Ok(Some(
                rayon::ThreadPoolBuilder::new()
                    .num_threads(workers)
                    .build()?,
            )),
            None => Ok(None),
        }
    }

    /// Tokens per map batch, derived from the input size when unset.
    fn batch_len(&self, token_count: usize) -> usize {
        if let Some(batch) = self.config.batch_size {
            return batch.max(1);
        }
        let threads = self
            .config
            .workers
            .unwrap_or_else(rayon::current_num_threads)
            .max(1);
        (token_count / (BATCHES_PER_THREAD * threads)).max(1)
    }

    /// Parallel map over token batches. A panic in any batch aborts the run.
    fn map_phase(
        &self,
        tokens: &[Token],
        cancel: &CancelToken,
        batch: usize,
    ) -> Result<MappedPairs, PipelineError> {
        let batches = panic::catch_unwind(AssertUnwindSafe(|| {
            tokens
                .par_chunks(batch)
                .map(|chunk| {
                    if cancel.is_cancelled() {
                        return Err(PipelineError::Cancelled);
                    }
                    Ok(chunk
                        .iter()
                        .map(|token| self.mapper.map(token))
                        .collect::<Vec<_>>())
                })
                .collect::<Result<Vec<_>, PipelineError>>()
        }))
        .map_err(|_| PipelineError::WorkerPanic { stage: STAGE_MAP })??;
        Ok(MappedPairs::from_batches(batches))
    }

    /// Parallel reduce, one task per group, bounded by the pool.
    fn reduce_phase(
        &self,
        groups: GroupedEntries,
        cancel: &CancelToken,
    ) -> Result<Vec<(Token, u64, usize)>, PipelineError> {
        panic::catch_unwind(AssertUnwindSafe(|| {
            groups
                .into_groups()
                .into_par_iter()
                .map(|group| {
                    if cancel.is_cancelled() {
                        return Err(PipelineError::Cancelled);
                    }
                    let count = self.reducer.reduce(&group.key, &group.values);
                    Ok((group.key, count, group.first_seen))
                })
                .collect::<Result<Vec<_>, PipelineError>>()
        }))
        .map_err(|_| PipelineError::WorkerPanic {
            stage: STAGE_REDUCE,
        })?
    }
}

/// Run `f` inside the dedicated pool when one was built, otherwise on the
/// process-wide pool.
fn run_in<T, F>(pool: &Option<rayon::ThreadPool>, f: F) -> T
where
    T: Send,
    F: FnOnce() -> T + Send,
{
    match pool {
        Some(pool) => pool.install(f),
        None => f(),
    }
}

// ============================================================================
// PipelineBuilder — fluent construction with custom stages
// ============================================================================

/// Fluent builder for constructing a [`Pipeline`] with custom stages.
///
/// Starts from the default word-count stages and allows overriding
/// individual ones. [`config`](Self::config) rebuilds the tokenizer from the
/// new configuration, so apply a custom [`tokenizer`](Self::tokenizer)
/// afterwards if both are needed.
///
/// ```
/// # use mapfreq::pipeline::runner::PipelineBuilder;
/// # use mapfreq::types::{CasePolicy, WordCountConfig};
/// let pipeline = PipelineBuilder::new()
///     .config(WordCountConfig::new().with_case(CasePolicy::Fold))
///     .build();
/// ```
pub struct PipelineBuilder<M = CountMapper, S = HashShuffler, R = SumReducer> {
    tokenizer: Tokenizer,
    mapper: M,
    shuffler: S,
    reducer: R,
    config: WordCountConfig,
}

impl PipelineBuilder {
    /// Start building from the default word-count stages.
    pub fn new() -> Self {
        let config = WordCountConfig::default();
        PipelineBuilder {
            tokenizer: Tokenizer::from_config(&config),
            mapper: CountMapper,
            shuffler: HashShuffler,
            reducer: SumReducer,
            config,
        }
    }
}

impl Default for PipelineBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl<M, S, R> PipelineBuilder<M, S, R> {
    /// Set the runtime configuration and rebuild the tokenizer from it.
    pub fn config(mut self, config: WordCountConfig) -> Self {
        self.tokenizer = Tokenizer::from_config(&config);
        self.config = config;
        self
    }

    /// Override the tokenizer.
    pub fn tokenizer(mut self, tokenizer: Tokenizer) -> Self {
        self.tokenizer = tokenizer;
        self
    }

    /// Override the mapper stage.
    pub fn mapper<M2: Mapper>(self, mapper: M2) -> PipelineBuilder<M2, S, R> {
        PipelineBuilder {
            tokenizer: self.tokenizer,
            mapper,
            shuffler: self.shuffler,
            reducer: self.reducer,
            config: self.config,
        }
    }

    /// Override the shuffler stage.
    pub fn shuffler<S2: Shuffler>(self, shuffler: S2) -> PipelineBuilder<M, S2, R> {
        PipelineBuilder {
            tokenizer: self.tokenizer,
            mapper: self.mapper,
            shuffler,
            reducer: self.reducer,
            config: self.config,
        }
    }

    /// Override the reducer stage.
    pub fn reducer<R2: Reducer>(self, reducer: R2) -> PipelineBuilder<M, S, R2> {
        PipelineBuilder {
            tokenizer: self.tokenizer,
            mapper: self.mapper,
            shuffler: self.shuffler,
            reducer,
            config: self.config,
        }
    }

    /// Consume the builder and produce a [`Pipeline`].
    pub fn build(self) -> Pipeline<M, S, R> {
        Pipeline {
            tokenizer: self.tokenizer,
            mapper: self.mapper,
            shuffler: self.shuffler,
            reducer: self.reducer,
            config: self.config,
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::artifacts::TokenStream;
    use crate::pipeline::observer::StageTimingObserver;
    use crate::types::CasePolicy;

    const SAMPLE: &str = "The cat sat on the mat. The cat ran.";

    #[test]
    fn test_word_count_pipeline_constructs() {
        let _pipeline = WordCountPipeline::word_count();
    }

    #[test]
    fn test_pipeline_builder_default() {
        let _pipeline = PipelineBuilder::new().build();
    }

    #[test]
    fn test_run_counts_sample_text() {
        let table = WordCountPipeline::word_count().run(SAMPLE).unwrap();
        assert_eq!(table.count("The"), 2);
        assert_eq!(table.count("cat"), 2);
        assert_eq!(table.count("sat"), 1);
        assert_eq!(table.count("on"), 1);
        assert_eq!(table.count("the"), 1);
        assert_eq!(table.count("mat"), 1);
        assert_eq!(table.count("ran"), 1);
        assert_eq!(table.len(), 7);
    }

    #[test]
    fn test_count_conservation() {
        let pipeline = WordCountPipeline::word_count();
        let table = pipeline.run(SAMPLE).unwrap();
        let tokens = pipeline.tokenizer.tokenize(SAMPLE);
        assert_eq!(table.total(), tokens.len() as u64);
    }

    #[test]
    fn test_determinism_across_runs() {
        let pipeline = WordCountPipeline::word_count();
        let first = pipeline.run(SAMPLE).unwrap();
        let second = pipeline.run(SAMPLE).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_runs_are_independent() {
        let pipeline = WordCountPipeline::word_count();
        let _ = pipeline.run("alpha beta").unwrap();
        let table = pipeline.run("gamma").unwrap();
        // No carry-over from the previous run.
        assert_eq!(table.len(), 1);
        assert_eq!(table.count("alpha"), 0);
    }

    #[test]
    fn test_empty_input_yields_empty_table() {
        let table = WordCountPipeline::word_count().run("").unwrap();
        assert!(table.is_empty());
    }

    #[test]
    fn test_all_punctuation_input_yields_empty_table() {
        let table = WordCountPipeline::word_count().run("?! ... --").unwrap();
        assert!(table.is_empty());
    }

    #[test]
    fn test_case_folding_merges_counts() {
        let config = WordCountConfig::new().with_case(CasePolicy::Fold);
        let table = WordCountPipeline::with_config(config).run(SAMPLE).unwrap();
        assert_eq!(table.count("the"), 3);
        assert_eq!(table.count("The"), 0);
    }

    #[test]
    fn test_bounded_worker_pool() {
        let config = WordCountConfig::new().with_workers(2).with_batch_size(3);
        let table = WordCountPipeline::with_config(config)
            .run("a b a b a c d e f g")
            .unwrap();
        assert_eq!(table.count("a"), 3);
        assert_eq!(table.count("b"), 2);
        assert_eq!(table.total(), 10);
    }

    #[test]
    fn test_first_seen_survives_parallel_map() {
        // Tiny batches force multiple map tasks; order must still be the
        // input order.
        let config = WordCountConfig::new().with_workers(4).with_batch_size(1);
        let table = WordCountPipeline::with_config(config)
            .run("b a b a c")
            .unwrap();
        assert_eq!(table.get("b").unwrap().first_seen, 0);
        assert_eq!(table.get("a").unwrap().first_seen, 1);
        assert_eq!(table.get("c").unwrap().first_seen, 4);
    }

    #[test]
    fn test_token_limit_rejects_run() {
        let config = WordCountConfig::new().with_max_tokens(3);
        let err = WordCountPipeline::with_config(config)
            .run("one two three four")
            .unwrap_err();
        match err {
            PipelineError::TokenLimit { count, limit } => {
                assert_eq!(count, 4);
                assert_eq!(limit, 3);
            }
            other => panic!("expected TokenLimit, got {other:?}"),
        }
    }

    #[test]
    fn test_precancelled_run_fails() {
        let token = CancelToken::new();
        token.cancel();
        let err = WordCountPipeline::word_count()
            .run_cancellable("a b c", &token, &mut NoopObserver)
            .unwrap_err();
        assert!(matches!(err, PipelineError::Cancelled));
    }

    /// Mapper that requests cancellation on its first invocation.
    #[derive(Debug, Clone)]
    struct CancellingMapper {
        token: CancelToken,
    }

    impl Mapper for CancellingMapper {
        fn map(&self, token: &Token) -> (Token, u64) {
            self.token.cancel();
            (token.clone(), 1)
        }
    }

    #[test]
    fn test_cancellation_mid_run_never_returns_a_table() {
        let token = CancelToken::new();
        // One worker and one-token batches make the abort deterministic:
        // after the first batch maps (and cancels), every remaining batch
        // observes the flag.
        let config = WordCountConfig::new().with_workers(1).with_batch_size(1);
        let pipeline = PipelineBuilder::new()
            .config(config)
            .mapper(CancellingMapper {
                token: token.clone(),
            })
            .build();
        let err = pipeline
            .run_cancellable("a b c d", &token, &mut NoopObserver)
            .unwrap_err();
        assert!(matches!(err, PipelineError::Cancelled));
    }

    /// Mapper that panics on a marker token.
    #[derive(Debug, Clone, Copy)]
    struct PanickingMapper;

    impl Mapper for PanickingMapper {
        fn map(&self, token: &Token) -> (Token, u64) {
            assert!(token != "boom", "marker token reached the mapper");
            (token.clone(), 1)
        }
    }

    #[test]
    fn test_map_panic_surfaces_as_worker_error() {
        let pipeline = PipelineBuilder::new().mapper(PanickingMapper).build();
        let err = pipeline.run("a boom c").unwrap_err();
        match err {
            PipelineError::WorkerPanic { stage } => assert_eq!(stage, STAGE_MAP),
            other => panic!("expected WorkerPanic, got {other:?}"),
        }
    }

    /// Reducer that panics on a marker key.
    #[derive(Debug, Clone, Copy)]
    struct PanickingReducer;

    impl Reducer for PanickingReducer {
        fn reduce(&self, key: &Token, values: &[u64]) -> u64 {
            assert!(key != "boom", "marker key reached the reducer");
            values.iter().sum()
        }
    }

    #[test]
    fn test_reduce_panic_surfaces_as_worker_error() {
        let pipeline = PipelineBuilder::new().reducer(PanickingReducer).build();
        let err = pipeline.run("a boom c").unwrap_err();
        match err {
            PipelineError::WorkerPanic { stage } => assert_eq!(stage, STAGE_REDUCE),
            other => panic!("expected WorkerPanic, got {other:?}"),
        }
    }

    #[test]
    fn test_observer_sees_all_stages_in_order() {
        let mut obs = StageTimingObserver::new();
        let _table = WordCountPipeline::word_count()
            .run_with_observer(SAMPLE, &mut obs)
            .unwrap();
        let stages: Vec<&str> = obs.reports().iter().map(|(name, _)| *name).collect();
        assert_eq!(
            stages,
            vec![
                STAGE_TOKENIZE,
                STAGE_MAP,
                STAGE_SHUFFLE,
                STAGE_REDUCE,
                STAGE_ASSEMBLE,
            ]
        );
    }

    #[test]
    fn test_observer_receives_stage_metrics() {
        let mut obs = StageTimingObserver::new();
        let _table = WordCountPipeline::word_count()
            .run_with_observer(SAMPLE, &mut obs)
            .unwrap();
        let (_, tokenize_report) = &obs.reports()[0];
        assert_eq!(tokenize_report.tokens(), Some(9));
        let (_, map_report) = &obs.reports()[1];
        assert_eq!(map_report.pairs(), Some(9));
        let (_, shuffle_report) = &obs.reports()[2];
        assert_eq!(shuffle_report.groups(), Some(7));
        let (_, assemble_report) = &obs.reports()[4];
        assert_eq!(assemble_report.distinct(), Some(7));
    }

    /// Custom observer that captures artifact callbacks.
    #[derive(Default)]
    struct ArtifactObserver {
        saw_tokens: bool,
        saw_pairs: bool,
        saw_groups: bool,
        saw_table: bool,
    }

    impl PipelineObserver for ArtifactObserver {
        fn on_tokens(&mut self, _tokens: &TokenStream) {
            self.saw_tokens = true;
        }
        fn on_pairs(&mut self, _pairs: &MappedPairs) {
            self.saw_pairs = true;
        }
        fn on_groups(&mut self, _groups: &GroupedEntries) {
            self.saw_groups = true;
        }
        fn on_table(&mut self, _table: &FrequencyTable) {
            self.saw_table = true;
        }
    }

    #[test]
    fn test_pipeline_calls_all_artifact_observers() {
        let mut obs = ArtifactObserver::default();
        let _table = WordCountPipeline::word_count()
            .run_with_observer(SAMPLE, &mut obs)
            .unwrap();
        assert!(obs.saw_tokens, "on_tokens not called");
        assert!(obs.saw_pairs, "on_pairs not called");
        assert!(obs.saw_groups, "on_groups not called");
        assert!(obs.saw_table, "on_table not called");
    }

    /// Mapper that lowercases keys, exercising a custom stage end to end.
    #[derive(Debug, Clone, Copy)]
    struct LowercaseMapper;

    impl Mapper for LowercaseMapper {
        fn map(&self, token: &Token) -> (Token, u64) {
            (token.to_lowercase(), 1)
        }
    }

    #[test]
    fn test_builder_with_custom_mapper() {
        let pipeline = PipelineBuilder::new().mapper(LowercaseMapper).build();
        let table = pipeline.run("The the THE").unwrap();
        assert_eq!(table.count("the"), 3);
    }

    #[test]
    fn test_batch_len_never_zero() {
        let pipeline = WordCountPipeline::word_count();
        assert!(pipeline.batch_len(0) >= 1);
        assert!(pipeline.batch_len(1) >= 1);
        assert!(pipeline.batch_len(1_000_000) >= 1);
    }

    #[test]
    fn test_explicit_zero_batch_size_is_clamped() {
        let config = WordCountConfig::new().with_batch_size(0);
        let table = WordCountPipeline::with_config(config).run("a b a").unwrap();
        assert_eq!(table.count("a"), 2);
    }
}
