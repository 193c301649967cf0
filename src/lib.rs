//! Parallel word-frequency counting with a map/shuffle/reduce pipeline.
//!
//! The core is a two-phase parallel aggregation engine: tokens are mapped to
//! `(token, 1)` pairs concurrently, grouped by key at a single
//! synchronization barrier, and reduced to per-token counts concurrently.
//! A deterministic top-N selector ranks the result by count, breaking ties
//! by first occurrence in the text.
//!
//! # Example
//!
//! ```
//! use mapfreq::{Pipeline, TopSelector};
//!
//! let pipeline = Pipeline::default();
//! let table = pipeline.run("the cat sat on the mat").unwrap();
//! assert_eq!(table.count("the"), 2);
//!
//! let top = TopSelector::new().select(&table, 1);
//! assert_eq!(top.entries[0].token, "the");
//! ```

pub mod pipeline;
pub mod present;
pub mod ranking;
pub mod source;
pub mod tokenize;
pub mod types;

pub use pipeline::artifacts::{
    FrequencyTable, GroupedEntries, MappedPairs, RankedEntry, RankedList, TokenStream,
};
pub use pipeline::cancel::CancelToken;
pub use pipeline::errors::PipelineError;
pub use pipeline::observer::{NoopObserver, PipelineObserver, StageTimingObserver};
pub use pipeline::runner::{Pipeline, PipelineBuilder, WordCountPipeline};
pub use pipeline::spec::RunSpec;
pub use pipeline::validation::ValidationEngine;
pub use present::BarChart;
pub use ranking::TopSelector;
pub use source::{FileSource, SourceError, StdinSource, TextSource};
pub use tokenize::Tokenizer;
pub use types::{CasePolicy, Token, WordCountConfig};

#[cfg(feature = "fetch")]
pub use source::HttpSource;
