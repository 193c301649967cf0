//! Core types shared across the pipeline.
//!
//! This module provides the count unit ([`Token`]), the case-folding policy,
//! and the runtime configuration consumed by the tokenizer and the pipeline
//! runner.

use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};

/// A normalized unit of text — the unit of counting.
///
/// Tokens are immutable once produced by the tokenizer; equality is
/// case-sensitive and byte-exact after normalization.
pub type Token = String;

/// The punctuation characters stripped by the default tokenizer.
///
/// Matches the ASCII punctuation set: `!"#$%&'()*+,-./:;<=>?@[\]^_`{|}~`.
pub const DEFAULT_PUNCTUATION: &str = "!\"#$%&'()*+,-./:;<=>?@[\\]^_`{|}~";

/// Whether the tokenizer folds case during normalization.
///
/// The default is [`Preserve`](CasePolicy::Preserve): `"The"` and `"the"`
/// count as distinct tokens.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CasePolicy {
    /// Keep tokens exactly as they appear in the text.
    #[default]
    Preserve,
    /// Lowercase every token during normalization.
    Fold,
}

impl CasePolicy {
    /// Returns the user-facing name used in JSON and error messages.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Preserve => "preserve",
            Self::Fold => "fold",
        }
    }

    fn parse(value: &str) -> Self {
        match value.to_lowercase().as_str() {
            "fold" | "lower" | "lowercase" => CasePolicy::Fold,
            _ => CasePolicy::Preserve,
        }
    }
}

impl std::str::FromStr for CasePolicy {
    type Err = std::convert::Infallible;

    fn from_str(value: &str) -> std::result::Result<Self, Self::Err> {
        Ok(CasePolicy::parse(value))
    }
}

/// Runtime configuration for a word-count run.
///
/// Covers the tokenizer policy (punctuation set, case folding) and the
/// concurrency policy (worker count, batch granularity, input limit).
#[derive(Debug, Clone)]
pub struct WordCountConfig {
    /// Characters deleted from the text before splitting on whitespace.
    pub punctuation: FxHashSet<char>,
    /// Case-folding policy applied during tokenization.
    pub case: CasePolicy,
    /// Worker-pool size for the map and reduce phases.
    ///
    /// `None` uses the process-wide default pool (sized to the available
    /// compute units). `Some(n)` builds a dedicated pool of `n` threads for
    /// the run.
    pub workers: Option<usize>,
    /// Tokens per map task.
    ///
    /// `None` derives a batch size from the input length and worker count,
    /// so a run never spawns one task per token.
    pub batch_size: Option<usize>,
    /// Maximum number of input tokens before rejecting the run.
    pub max_tokens: Option<usize>,
}

impl Default for WordCountConfig {
    fn default() -> Self {
        Self {
            punctuation: DEFAULT_PUNCTUATION.chars().collect(),
            case: CasePolicy::Preserve,
            workers: None,
            batch_size: None,
            max_tokens: None,
        }
    }
}

impl WordCountConfig {
    /// Create a configuration with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the case-folding policy.
    pub fn with_case(mut self, case: CasePolicy) -> Self {
        self.case = case;
        self
    }

    /// Replace the punctuation set with the characters of `chars`.
    pub fn with_punctuation(mut self, chars: &str) -> Self {
        self.punctuation = chars.chars().collect();
        self
    }

    /// Set the worker-pool size for the parallel phases.
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = Some(workers);
        self
    }

    /// Set the number of tokens per map task.
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = Some(batch_size);
        self
    }

    /// Set the maximum number of input tokens before rejecting the run.
    pub fn with_max_tokens(mut self, max_tokens: usize) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let cfg = WordCountConfig::default();
        assert_eq!(cfg.case, CasePolicy::Preserve);
        assert!(cfg.workers.is_none());
        assert!(cfg.batch_size.is_none());
        assert!(cfg.punctuation.contains(&'.'));
        assert!(cfg.punctuation.contains(&'~'));
        assert!(!cfg.punctuation.contains(&' '));
    }

    #[test]
    fn test_config_builders() {
        let cfg = WordCountConfig::new()
            .with_case(CasePolicy::Fold)
            .with_workers(4)
            .with_batch_size(128)
            .with_max_tokens(1_000_000);
        assert_eq!(cfg.case, CasePolicy::Fold);
        assert_eq!(cfg.workers, Some(4));
        assert_eq!(cfg.batch_size, Some(128));
        assert_eq!(cfg.max_tokens, Some(1_000_000));
    }

    #[test]
    fn test_custom_punctuation() {
        let cfg = WordCountConfig::new().with_punctuation(".,");
        assert!(cfg.punctuation.contains(&'.'));
        assert!(cfg.punctuation.contains(&','));
        assert!(!cfg.punctuation.contains(&'!'));
    }

    #[test]
    fn test_case_policy_parse() {
        assert_eq!("fold".parse::<CasePolicy>().unwrap(), CasePolicy::Fold);
        assert_eq!("LOWERCASE".parse::<CasePolicy>().unwrap(), CasePolicy::Fold);
        assert_eq!("preserve".parse::<CasePolicy>().unwrap(), CasePolicy::Preserve);
        // Unrecognized values fall back to the default policy.
        assert_eq!("xyz".parse::<CasePolicy>().unwrap(), CasePolicy::Preserve);
    }

    #[test]
    fn test_case_policy_serde() {
        let json = serde_json::to_string(&CasePolicy::Fold).unwrap();
        assert_eq!(json, "\"fold\"");
        let back: CasePolicy = serde_json::from_str("\"preserve\"").unwrap();
        assert_eq!(back, CasePolicy::Preserve);
    }
}
