//! Text normalization components
//!
//! This module provides punctuation stripping and whitespace tokenization.

pub mod splitter;

pub use splitter::Tokenizer;
