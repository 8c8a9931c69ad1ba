//! Per-branch probability submatrix and windowed phylo-k-mer enumeration.
//!
//! A [NodeEntry] holds one [Row] per alignment column for one branch.
//! [NodeEntry::begin] slides a window of `k` rows over the entry, and each
//! [NodeEntryView] enumerates the k-mers of its window whose score reaches a
//! threshold, without materializing the others.
//!
//! # Example
//! ```
//! use xpas::node_entry::NodeEntry;
//! use xpas::row::Row;
//! use xpas::seq::SeqType;
//!
//! let mut entry = NodeEntry::new("3_X0", SeqType::Dna);
//! for _ in 0..5 {
//!     entry.push_back(Row::from_probabilities(&[0.7, 0.1, 0.1, 0.1]));
//! }
//!
//! let mut windows = entry.begin(3, -1.0);
//! assert_eq!(windows.len(), 3);
//! for view in &mut windows {
//!     assert!(view.iter().all(|kmer| kmer.score >= -1.0));
//! }
//! assert!(windows.is_end());
//! ```

use crate::phylo_kmer::{Key, PhyloKmer, Score};
use crate::row::{ProbaPair, Row};
use crate::seq::SeqType;

/// Relative slack of the inner cuts of [PhyloKmerIter], scaled by
/// `max(|threshold|, 1)`.
pub const PRUNING_SLACK: Score = 1e-5;

// =#========================================================================#=
// NODE ENTRY
// =#========================================================================#=
/// The rows of the probability matrix for one node of the tree, one per
/// alignment column, in column order.
#[derive(Debug, Clone, PartialEq)]
pub struct NodeEntry {
    label: String,
    seq_type: SeqType,
    rows: Vec<Row>,
}

impl NodeEntry {
    /// Creates an empty entry.
    pub fn new(label: impl Into<String>, seq_type: SeqType) -> Self {
        Self {
            label: label.into(),
            seq_type,
            rows: Vec::new(),
        }
    }

    /// Creates an entry from its rows.
    pub fn with_rows(label: impl Into<String>, seq_type: SeqType, rows: Vec<Row>) -> Self {
        Self {
            label: label.into(),
            seq_type,
            rows,
        }
    }

    /// Appends the row of the next alignment column.
    pub fn push_back(&mut self, row: Row) {
        self.rows.push(row);
    }

    /// Returns the number of rows.
    pub fn alignment_size(&self) -> usize {
        self.rows.len()
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn seq_type(&self) -> SeqType {
        self.seq_type
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    /// Returns the `variant`-th best candidate at column `position`, `None`
    /// if either is out of bounds.
    pub fn at(&self, position: usize, variant: usize) -> Option<&ProbaPair> {
        self.rows.get(position)?.get(variant)
    }

    /// Returns an iterator over the windows of `kmer_size` consecutive
    /// rows, starting at column 0.
    ///
    /// There are exactly `alignment_size - kmer_size + 1` windows, none if
    /// `kmer_size` is zero or exceeds the alignment size. `kmer_size` must
    /// not exceed [SeqType::max_kmer_size].
    ///
    /// # Arguments
    /// * `kmer_size` - Number of rows per window
    /// * `threshold` - Minimal score of the enumerated k-mers
    pub fn begin(&self, kmer_size: usize, threshold: Score) -> ViewIterator<'_> {
        let end = if kmer_size == 0 || kmer_size > self.rows.len() {
            0
        } else {
            self.rows.len() - kmer_size + 1
        };

        ViewIterator {
            entry: self,
            kmer_size,
            threshold,
            position: 0,
            end,
        }
    }
}

// =#========================================================================#=
// VIEW ITERATOR
// =#========================================================================#=
/// Iterator over the windows of a [NodeEntry], created by
/// [NodeEntry::begin].
///
/// Yields one [NodeEntryView] per start column; once fewer than `kmer_size`
/// rows remain ahead, it stays in its terminal state ([is_end](Self::is_end)).
#[derive(Debug, Clone)]
pub struct ViewIterator<'a> {
    entry: &'a NodeEntry,
    kmer_size: usize,
    threshold: Score,
    position: usize,
    end: usize,
}

impl<'a> ViewIterator<'a> {
    /// Returns whether all windows have been yielded.
    pub fn is_end(&self) -> bool {
        self.position >= self.end
    }

    /// Returns the start column of the next window.
    pub fn position(&self) -> usize {
        self.position
    }
}

impl<'a> Iterator for ViewIterator<'a> {
    type Item = NodeEntryView<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.is_end() {
            return None;
        }

        let start = self.position;
        self.position += 1;
        Some(NodeEntryView {
            rows: &self.entry.rows[start..start + self.kmer_size],
            seq_type: self.entry.seq_type,
            start,
            threshold: self.threshold,
        })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.end.saturating_sub(self.position);
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for ViewIterator<'_> {}

impl std::iter::FusedIterator for ViewIterator<'_> {}

// =#========================================================================#=
// NODE ENTRY VIEW
// =#========================================================================#=
/// A window of `k` consecutive rows of a [NodeEntry] with the threshold to
/// enumerate its k-mers against.
#[derive(Debug, Clone, Copy)]
pub struct NodeEntryView<'a> {
    rows: &'a [Row],
    seq_type: SeqType,
    start: usize,
    threshold: Score,
}

impl<'a> NodeEntryView<'a> {
    /// Returns the alignment column of the first row of this window.
    pub fn start(&self) -> usize {
        self.start
    }

    pub fn kmer_size(&self) -> usize {
        self.rows.len()
    }

    pub fn threshold(&self) -> Score {
        self.threshold
    }

    pub fn rows(&self) -> &'a [Row] {
        self.rows
    }

    /// Returns an iterator over the k-mers of this window scoring at least
    /// the threshold.
    pub fn iter(&self) -> PhyloKmerIter<'a> {
        PhyloKmerIter::new(self.rows, self.seq_type, self.threshold)
    }
}

impl<'a> IntoIterator for &NodeEntryView<'a> {
    type Item = PhyloKmer;
    type IntoIter = PhyloKmerIter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

// =#========================================================================#=
// PHYLO KMER ITERATOR
// =#========================================================================#=
/// Depth-first branch-and-bound enumeration of the k-mers of a window.
///
/// The state is a stack of positions: `cursor[d]` is the variant chosen
/// (or to be tried next) at depth `d`, with the score and key of the
/// prefix before depth `d` in `prefix_scores[d]` and `prefix_keys[d]`.
/// A prefix is cut as soon as its score plus the best scores of the
/// remaining rows (`best_suffix`) falls below the threshold. Since rows
/// are sorted by descending score, a cut also ends its depth.
///
/// `best_suffix` is summed in the opposite order of the k-mer scores, so
/// the bound of an inner depth may round below the score of a complete
/// k-mer. Inner cuts are made against `threshold` lowered by
/// [PRUNING_SLACK]; only complete k-mers are tested exactly.
#[derive(Debug, Clone)]
pub struct PhyloKmerIter<'a> {
    rows: &'a [Row],
    seq_type: SeqType,
    threshold: Score,
    /// Bound of the inner cuts
    cut: Score,
    /// `best_suffix[d]`: sum of the best scores of rows `d..k`
    best_suffix: Vec<Score>,
    cursor: Vec<usize>,
    prefix_scores: Vec<Score>,
    prefix_keys: Vec<Key>,
    depth: usize,
    done: bool,
}

impl<'a> PhyloKmerIter<'a> {
    fn new(rows: &'a [Row], seq_type: SeqType, threshold: Score) -> Self {
        let k = rows.len();

        let mut best_suffix = vec![0.0; k + 1];
        for d in (0..k).rev() {
            let best = rows[d].best().map_or(Score::NEG_INFINITY, |pair| pair.score);
            best_suffix[d] = best_suffix[d + 1] + best;
        }

        let cut = threshold - PRUNING_SLACK * threshold.abs().max(1.0);

        // Nothing to enumerate if even the best k-mer misses the threshold
        let done = k == 0 || !(best_suffix[0] >= cut);

        Self {
            rows,
            seq_type,
            threshold,
            cut,
            best_suffix,
            cursor: vec![0; k],
            prefix_scores: vec![0.0; k + 1],
            prefix_keys: vec![0; k + 1],
            depth: 0,
            done,
        }
    }
}

impl Iterator for PhyloKmerIter<'_> {
    type Item = PhyloKmer;

    fn next(&mut self) -> Option<Self::Item> {
        let k = self.rows.len();

        while !self.done {
            let d = self.depth;
            let row = &self.rows[d];

            let Some(pair) = row.get(self.cursor[d]) else {
                // Depth exhausted, backtrack
                if d == 0 {
                    self.done = true;
                    break;
                }
                self.depth -= 1;
                self.cursor[d - 1] += 1;
                continue;
            };

            let score = self.prefix_scores[d] + pair.score;
            let reachable = if d + 1 == k {
                score >= self.threshold
            } else {
                score + self.best_suffix[d + 1] >= self.cut
            };
            if !reachable {
                self.cursor[d] = row.len();
                continue;
            }

            let key = self.seq_type.push_code(self.prefix_keys[d], pair.index);
            if d + 1 == k {
                self.cursor[d] += 1;
                return Some(PhyloKmer::new(key, score));
            }

            self.prefix_scores[d + 1] = score;
            self.prefix_keys[d + 1] = key;
            self.cursor[d + 1] = 0;
            self.depth = d + 1;
        }

        None
    }
}

impl std::iter::FusedIterator for PhyloKmerIter<'_> {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_view_without_candidates_is_empty() {
        let entry = NodeEntry::with_rows(
            "0",
            SeqType::Dna,
            vec![Row::from_scores(&[-1.0; 4]), Row::from_scores(&[-1.0; 4])],
        );
        let mut windows = entry.begin(2, -1.5);
        let view = windows.next().unwrap();
        assert_eq!(view.iter().count(), 0);
        assert!(windows.is_end());
    }
}
