//! First-class pipeline artifacts.
//!
//! Each type represents a typed intermediate result flowing between pipeline
//! stages. Every stage exclusively owns the artifact it produces until it is
//! handed downstream; no stage keeps a mutable handle into a structure it has
//! already passed on.

use crate::types::Token;
use rustc_hash::FxHashMap;
use serde::Serialize;
use std::collections::hash_map;

// ============================================================================
// TokenStream — ordered tokenizer output
// ============================================================================

/// Canonical token sequence produced by the tokenizer stage.
///
/// Order matters: a token's position is its first-occurrence tie-break key
/// for ranking, threaded through shuffle and reduce.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TokenStream {
    tokens: Vec<Token>,
}

impl TokenStream {
    /// Wrap an already-normalized token sequence.
    pub fn from_vec(tokens: Vec<Token>) -> Self {
        Self { tokens }
    }

    /// The tokens in input order.
    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }

    /// Number of tokens (with repetitions).
    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    /// Returns `true` for an empty stream.
    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}

// ============================================================================
// MappedPairs — ephemeral mapper output
// ============================================================================

/// Key-value pairs emitted by the map phase, in token order.
///
/// Exists only between the mapper and the shuffler.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MappedPairs {
    pairs: Vec<(Token, u64)>,
}

impl MappedPairs {
    /// Assemble pairs from per-batch mapper output, preserving input order.
    pub fn from_batches(batches: Vec<Vec<(Token, u64)>>) -> Self {
        Self {
            pairs: batches.into_iter().flatten().collect(),
        }
    }

    /// The pairs in token order.
    pub fn pairs(&self) -> &[(Token, u64)] {
        &self.pairs
    }

    /// Number of pairs — equals the number of input tokens.
    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    /// Returns `true` if no pairs were emitted.
    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }
}

impl IntoIterator for MappedPairs {
    type Item = (Token, u64);
    type IntoIter = std::vec::IntoIter<(Token, u64)>;

    fn into_iter(self) -> Self::IntoIter {
        self.pairs.into_iter()
    }
}

// ============================================================================
// GroupedEntries — shuffle output
// ============================================================================

/// All values observed for one distinct key, plus the position at which the
/// key first appeared in the token sequence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Group {
    pub key: Token,
    pub values: Vec<u64>,
    pub first_seen: usize,
}

/// Per-key value groups produced by the shuffle barrier.
///
/// Groups are stored in first-occurrence order, so downstream stages inherit
/// a deterministic layout regardless of map-phase scheduling.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GroupedEntries {
    groups: Vec<Group>,
}

impl GroupedEntries {
    /// Wrap groups already laid out in first-occurrence order.
    pub fn from_vec(groups: Vec<Group>) -> Self {
        Self { groups }
    }

    /// The groups in first-occurrence order.
    pub fn groups(&self) -> &[Group] {
        &self.groups
    }

    /// Number of distinct keys.
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    /// Returns `true` if there are no groups.
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Consume the groups for the reduce phase.
    pub fn into_groups(self) -> Vec<Group> {
        self.groups
    }
}

// ============================================================================
// FrequencyTable — final pipeline output
// ============================================================================

/// Count and first-occurrence position for one distinct token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokenStat {
    pub count: u64,
    pub first_seen: usize,
}

/// Mapping from token to occurrence count — the pipeline's final output.
///
/// For every distinct token `t` appearing `n` times in the tokenized input,
/// `table.count(t) == n`. Keys are unique.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FrequencyTable {
    entries: FxHashMap<Token, TokenStat>,
}

impl FrequencyTable {
    /// Assemble the table from reduced `(token, count, first_seen)` triples.
    pub fn from_reduced(reduced: Vec<(Token, u64, usize)>) -> Self {
        let entries = reduced
            .into_iter()
            .map(|(token, count, first_seen)| (token, TokenStat { count, first_seen }))
            .collect();
        Self { entries }
    }

    /// Occurrence count for `token`, or `0` if it never appeared.
    pub fn count(&self, token: &str) -> u64 {
        self.entries.get(token).map_or(0, |s| s.count)
    }

    /// Full statistics for `token`, if present.
    pub fn get(&self, token: &str) -> Option<&TokenStat> {
        self.entries.get(token)
    }

    /// Number of distinct tokens.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` for a table with no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Sum of all counts — equals the total number of input tokens.
    pub fn total(&self) -> u64 {
        self.entries.values().map(|s| s.count).sum()
    }

    /// Iterate over `(token, stat)` entries in unspecified order.
    pub fn iter(&self) -> hash_map::Iter<'_, Token, TokenStat> {
        self.entries.iter()
    }
}

// ============================================================================
// RankedList — deterministic top-N output
// ============================================================================

/// One entry of the ranked output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RankedEntry {
    pub token: Token,
    pub count: u64,
}

/// Tokens ranked by count descending, ties broken by first occurrence.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct RankedList {
    pub entries: Vec<RankedEntry>,
}

impl RankedList {
    /// Number of ranked entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` for an empty ranking.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_stream_accessors() {
        let stream = TokenStream::from_vec(vec!["a".into(), "b".into()]);
        assert_eq!(stream.len(), 2);
        assert!(!stream.is_empty());
        assert_eq!(stream.tokens()[1], "b");
    }

    #[test]
    fn test_mapped_pairs_preserve_batch_order() {
        let pairs = MappedPairs::from_batches(vec![
            vec![("a".into(), 1), ("b".into(), 1)],
            vec![("a".into(), 1)],
        ]);
        assert_eq!(pairs.len(), 3);
        let keys: Vec<&str> = pairs.pairs().iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(keys, vec!["a", "b", "a"]);
    }

    #[test]
    fn test_frequency_table_lookup() {
        let table = FrequencyTable::from_reduced(vec![
            ("the".into(), 2, 0),
            ("cat".into(), 1, 1),
        ]);
        assert_eq!(table.count("the"), 2);
        assert_eq!(table.count("cat"), 1);
        assert_eq!(table.count("dog"), 0);
        assert_eq!(table.total(), 3);
        assert_eq!(table.len(), 2);
        assert_eq!(table.get("the").map(|s| s.first_seen), Some(0));
    }

    #[test]
    fn test_empty_table() {
        let table = FrequencyTable::default();
        assert!(table.is_empty());
        assert_eq!(table.total(), 0);
        assert_eq!(table.count("anything"), 0);
    }

    #[test]
    fn test_ranked_list_serializes_as_array() {
        let list = RankedList {
            entries: vec![RankedEntry {
                token: "the".into(),
                count: 2,
            }],
        };
        let json = serde_json::to_value(&list).unwrap();
        assert_eq!(json[0]["token"], "the");
        assert_eq!(json[0]["count"], 2);
    }
}
