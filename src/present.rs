//! Bar-chart presenter for ranked output.
//!
//! Renders a [`RankedList`] as a horizontal bar chart on any [`io::Write`].
//! The longest bar spans the configured width and the rest scale
//! proportionally, with a minimum of one cell so small counts stay visible.

use crate::pipeline::artifacts::RankedList;
use std::io::{self, Write};

const BAR_CELL: char = '█';

/// Horizontal bar-chart renderer.
#[derive(Debug, Clone)]
pub struct BarChart {
    /// Width in cells of the longest bar.
    width: usize,
}

impl Default for BarChart {
    fn default() -> Self {
        Self { width: 40 }
    }
}

impl BarChart {
    /// Create a renderer with the default width.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the width in cells of the longest bar.
    pub fn with_width(mut self, width: usize) -> Self {
        self.width = width.max(1);
        self
    }

    /// Render `list` to `out`, one row per entry, highest count first.
    ///
    /// An empty list renders nothing.
    pub fn render(&self, list: &RankedList, out: &mut impl Write) -> io::Result<()> {
        let max_count = match list.entries.iter().map(|e| e.count).max() {
            Some(max) if max > 0 => max,
            _ => return Ok(()),
        };
        let label_width = list
            .entries
            .iter()
            .map(|e| e.token.chars().count())
            .max()
            .unwrap_or(0);

        for entry in &list.entries {
            let cells = ((entry.count * self.width as u64) / max_count).max(1) as usize;
            let bar: String = std::iter::repeat(BAR_CELL).take(cells).collect();
            writeln!(
                out,
                "{:<label_width$}  {} {}",
                entry.token, bar, entry.count
            )?;
        }
        Ok(())
    }
}
