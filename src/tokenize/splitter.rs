//! Punctuation-stripping whitespace tokenizer
//!
//! Normalization is a character deletion followed by a whitespace split:
//! punctuation characters are removed outright (not replaced by spaces), so
//! `"end-of-line"` becomes the single token `"endofline"`, and a word
//! consisting only of punctuation vanishes entirely.

use crate::pipeline::artifacts::TokenStream;
use crate::types::{CasePolicy, Token, WordCountConfig, DEFAULT_PUNCTUATION};
use rustc_hash::FxHashSet;

/// A configurable tokenizer for raw text.
#[derive(Debug, Clone)]
pub struct Tokenizer {
    /// Characters deleted before splitting.
    punctuation: FxHashSet<char>,
    /// Case-folding policy.
    case: CasePolicy,
}

impl Default for Tokenizer {
    fn default() -> Self {
        Self::new()
    }
}

impl Tokenizer {
    /// Create a tokenizer with the default punctuation set and no case
    /// folding.
    pub fn new() -> Self {
        Self {
            punctuation: DEFAULT_PUNCTUATION.chars().collect(),
            case: CasePolicy::Preserve,
        }
    }

    /// Create a tokenizer from a runtime configuration.
    pub fn from_config(cfg: &WordCountConfig) -> Self {
        Self {
            punctuation: cfg.punctuation.clone(),
            case: cfg.case,
        }
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

    /// Tokenize `text` into an ordered stream of normalized tokens.
    ///
    /// Empty or all-punctuation input yields an empty stream, never an
    /// error.
    pub fn tokenize(&self, text: &str) -> TokenStream {
        let tokens: Vec<Token> = text
            .split_whitespace()
            .filter_map(|raw| self.normalize(raw))
            .collect();
        TokenStream::from_vec(tokens)
    }

    /// Normalize a single whitespace-delimited word, or drop it if nothing
    /// remains after punctuation deletion.
    fn normalize(&self, raw: &str) -> Option<Token> {
        let stripped: String = raw
            .chars()
            .filter(|c| !self.punctuation.contains(c))
            .collect();
        if stripped.is_empty() {
            return None;
        }
        match self.case {
            CasePolicy::Preserve => Some(stripped),
            CasePolicy::Fold => Some(stripped.to_lowercase()),
        }
    }
}
