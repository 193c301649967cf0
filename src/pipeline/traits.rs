//! Stage trait definitions for the pipeline.
//!
//! Each trait represents one processing stage boundary. Implementations are
//! statically dispatched; the default implementations are zero-sized, so the
//! standard word-count pipeline carries no per-stage state at all.
//!
//! Stage implementations must be `Send + Sync`: the mapper and reducer are
//! invoked from worker-pool tasks.

use crate::pipeline::artifacts::{Group, GroupedEntries, MappedPairs};
use crate::types::Token;
use rustc_hash::FxHashMap;
use std::collections::hash_map::Entry;

// ============================================================================
// Mapper — per-token transformation (parallel phase)
// ============================================================================

/// Per-token transformation into a key-value pair.
///
/// # Contract
///
/// - **Pure**: the output for one token never depends on any other token,
///   which is what makes the phase embarrassingly parallel.
/// - **Stateless**: `map` takes `&self` and must not mutate shared state.
/// - Batching is the runner's concern; implementations see one token at a
///   time.
pub trait Mapper: Send + Sync {
    /// Map one token to a `(key, value)` pair.
    fn map(&self, token: &Token) -> (Token, u64);
}

/// The word-count mapper: every token becomes `(token, 1)`.
#[derive(Debug, Clone, Copy, Default)]
pub struct CountMapper;

impl Mapper for CountMapper {
    #[inline]
    fn map(&self, token: &Token) -> (Token, u64) {
        (token.clone(), 1)
    }
}

// ============================================================================
// Shuffler — key grouping (synchronization barrier)
// ============================================================================

/// Groups mapped pairs by key.
///
/// # Contract
///
/// - All pairs with equal keys land in the same group; the set of output
///   keys equals the set of distinct input keys.
/// - Runs after the entire map phase has completed — it is the barrier
///   between the two parallel phases.
/// - The grouping structure is built by this single owner; worker tasks
///   never touch it.
pub trait Shuffler: Send + Sync {
    /// Group `pairs` by key, recording each key's first-occurrence position.
    fn shuffle(&self, pairs: MappedPairs) -> GroupedEntries;
}

/// Single-pass hash grouping in first-occurrence order.
#[derive(Debug, Clone, Copy, Default)]
pub struct HashShuffler;

impl Shuffler for HashShuffler {
    fn shuffle(&self, pairs: MappedPairs) -> GroupedEntries {
        let mut index: FxHashMap<Token, usize> = FxHashMap::default();
        let mut groups: Vec<Group> = Vec::new();

        for (pos, (key, value)) in pairs.into_iter().enumerate() {
            match index.entry(key) {
                Entry::Occupied(slot) => groups[*slot.get()].values.push(value),
                Entry::Vacant(slot) => {
                    let group = Group {
                        key: slot.key().clone(),
                        values: vec![value],
                        first_seen: pos,
                    };
                    slot.insert(groups.len());
                    groups.push(group);
                }
            }
        }

        GroupedEntries::from_vec(groups)
    }
}

// ============================================================================
// Reducer — per-key aggregation (parallel phase)
// ============================================================================

/// Aggregates one key's value list into a final scalar.
///
/// # Contract
///
/// - **Pure**: independent across distinct keys; no shared mutable state
///   between reducer tasks.
/// - Always succeeds for a well-formed group, including groups of length 1.
pub trait Reducer: Send + Sync {
    /// Reduce one group's values to its final count.
    fn reduce(&self, key: &Token, values: &[u64]) -> u64;
}

/// The word-count reducer: sums the group's values.
///
/// Summation is associative and order-independent, so the value order inside
/// a group is irrelevant to correctness.
#[derive(Debug, Clone, Copy, Default)]
pub struct SumReducer;

impl Reducer for SumReducer {
    #[inline]
    fn reduce(&self, _key: &Token, values: &[u64]) -> u64 {
        values.iter().sum()
    }
}
