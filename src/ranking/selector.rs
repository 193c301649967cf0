//! Deterministic top-N selection over a frequency table.
//!
//! A frequency table has no inherent order, so sorting by count alone is
//! nondeterministic whenever counts tie. The selector therefore sorts by
//! count descending and breaks ties by the token's first-occurrence position
//! in the original text, which the pipeline threads through every stage.

use crate::pipeline::artifacts::{FrequencyTable, RankedEntry, RankedList};
use std::cmp::Reverse;

/// Selects the highest-count entries of a [`FrequencyTable`].
#[derive(Debug, Clone, Copy, Default)]
pub struct TopSelector;

impl TopSelector {
    /// Create a selector.
    pub fn new() -> Self {
        Self
    }

    /// Return the top `n` tokens, sorted by count descending with ties
    /// broken by first occurrence ascending.
    ///
    /// `n = 0` yields an empty list; `n` beyond the number of distinct
    /// tokens yields all of them.
    pub fn select(&self, table: &FrequencyTable, n: usize) -> RankedList {
        let mut ranked: Vec<(&str, u64, usize)> = table
            .iter()
            .map(|(token, stat)| (token.as_str(), stat.count, stat.first_seen))
            .collect();
        ranked.sort_by_key(|&(_, count, first_seen)| (Reverse(count), first_seen));
        ranked.truncate(n);

        RankedList {
            entries: ranked
                .into_iter()
                .map(|(token, count, _)| RankedEntry {
                    token: token.to_string(),
                    count,
                })
                .collect(),
        }
    }
}
