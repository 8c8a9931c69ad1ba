//! Scored residue candidates of one alignment column.

use crate::phylo_kmer::Score;
use std::cmp::Ordering;

/// One scored residue candidate: the residue code and its score at one
/// column of one node entry.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProbaPair {
    pub score: Score,
    pub index: u8,
}

impl ProbaPair {
    pub const fn new(score: Score, index: u8) -> Self {
        Self { score, index }
    }
}

/// Posterior distribution over the residues at one alignment column, one
/// [ProbaPair] per residue.
///
/// Pairs are sorted by descending score at construction (NaN last, ties
/// in residue order), so that the first pair is the best candidate and
/// enumeration can stop at the first pair that cannot reach a threshold.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Row {
    pairs: Vec<ProbaPair>,
}

impl Row {
    /// Creates a row from arbitrary pairs, sorting them.
    pub fn new(mut pairs: Vec<ProbaPair>) -> Self {
        pairs.sort_by(|a, b| descending(a.score, b.score));
        Self { pairs }
    }

    /// Creates a row from scores in residue code order.
    pub fn from_scores(scores: &[Score]) -> Self {
        Self::new(
            scores
                .iter()
                .enumerate()
                .map(|(code, &score)| ProbaPair::new(score, code as u8))
                .collect(),
        )
    }

    /// Creates a row from probabilities in residue code order, converting
    /// them to log10 scores (a zero probability scores `-inf`).
    pub fn from_probabilities(probabilities: &[f64]) -> Self {
        Self::new(
            probabilities
                .iter()
                .enumerate()
                .map(|(code, &p)| ProbaPair::new(p.log10() as Score, code as u8))
                .collect(),
        )
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// Returns the `variant`-th best pair.
    pub fn get(&self, variant: usize) -> Option<&ProbaPair> {
        self.pairs.get(variant)
    }

    /// Returns the best pair, `None` for an empty row.
    pub fn best(&self) -> Option<&ProbaPair> {
        self.pairs.first()
    }

    pub fn as_slice(&self) -> &[ProbaPair] {
        &self.pairs
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ProbaPair> {
        self.pairs.iter()
    }
}

impl<'a> IntoIterator for &'a Row {
    type Item = &'a ProbaPair;
    type IntoIter = std::slice::Iter<'a, ProbaPair>;

    fn into_iter(self) -> Self::IntoIter {
        self.pairs.iter()
    }
}

fn descending(a: Score, b: Score) -> Ordering {
    let rank = |s: Score| if s.is_nan() { Score::NEG_INFINITY } else { s };
    rank(b).total_cmp(&rank(a))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rows_sort_descending_with_nan_last() {
        let row = Row::from_scores(&[-1.0, Score::NAN, -0.1, -1.0]);
        let order: Vec<u8> = row.iter().map(|pair| pair.index).collect();
        assert_eq!(order, vec![2, 0, 3, 1]);
        assert_eq!(row.best().map(|pair| pair.index), Some(2));
    }
}
