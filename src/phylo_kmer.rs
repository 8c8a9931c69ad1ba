//! Phylo-k-mers and their scores.
//!
//! Scores are log10 posterior probabilities: the score of a k-mer on a branch
//! is the sum of the per-position scores of its residues.

use crate::error::TreeError;
use crate::model::NodeId;
use crate::seq::SeqType;

pub use crate::seq::Key;

/// Score of a phylo-k-mer (log10 of a probability).
pub type Score = f32;

/// Identifier of a branch of the reference tree (postorder id of the node
/// below the branch).
pub type BranchId = u32;

/// Returns the branch id of the node with the given postorder id.
///
/// # Errors
/// [TreeError::BranchIdOverflow] if the id does not fit into a [BranchId].
pub fn branch_id(postorder_id: NodeId) -> Result<BranchId, TreeError> {
    BranchId::try_from(postorder_id).map_err(|_| TreeError::BranchIdOverflow(postorder_id))
}

/// A k-mer key together with its score on some branch.
///
/// The branch itself is not stored, as it is shared by all phylo-k-mers
/// generated from the same node entry.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PhyloKmer {
    pub key: Key,
    pub score: Score,
}

impl PhyloKmer {
    pub const fn new(key: Key, score: Score) -> Self {
        Self { key, score }
    }

    /// Returns the "not a phylo-k-mer" value.
    ///
    /// It is unequal to every phylo-k-mer, itself included, and is never
    /// produced by encoding or scoring.
    pub const fn na() -> Self {
        Self {
            key: Key::MAX,
            score: Score::NAN,
        }
    }

    /// Whether this is the "not a phylo-k-mer" value.
    pub fn is_na(&self) -> bool {
        self.score.is_nan()
    }
}

/// Minimal score of a phylo-k-mer of size `kmer_size`: the score of a k-mer
/// whose residues are all as likely as under a uniform distribution.
///
/// Non-increasing in `kmer_size`.
pub fn score_threshold(seq_type: SeqType, kmer_size: usize) -> Score {
    omega_threshold(seq_type, 1.0, kmer_size)
}

/// Minimal score of a phylo-k-mer of size `kmer_size` under the `omega`
/// filter: `k * log10(omega / alphabet_size)`.
pub fn omega_threshold(seq_type: SeqType, omega: Score, kmer_size: usize) -> Score {
    let per_position = (omega / seq_type.alphabet_size() as Score).log10();
    per_position * kmer_size as Score
}
