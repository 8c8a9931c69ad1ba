//! Ghost-node extension of a reference tree.
//!
//! Every branch of the reference tree gets a ghost node in its middle, and
//! every ghost node a ghost leaf. Ancestral states reconstructed at the ghost
//! nodes stand for sequences diverging from the branch, which is what the
//! phylo-k-mers of that branch are generated from.
//!
//! ```text
//!   parent                 parent
//!     │ b                    │ b/2
//!     │          ──→       p_X0 ──── p_X1   (mean branch length)
//!     │                      │ b/2
//!   node (postorder p)     node
//! ```

use crate::error::TreeError;
use crate::model::NodeId;
use crate::model::tree::PhyloTree;
use crate::phylo_kmer::{BranchId, branch_id};
use std::collections::HashMap;
use tracing::info;

/// Suffix of the ghost node splitting a branch.
pub const GHOST_INTERNAL_SUFFIX: &str = "_X0";

/// Suffix of the ghost leaf hanging from the ghost node.
pub const GHOST_LEAF_SUFFIX: &str = "_X1";

/// Mapping from ghost node labels to the branch of the original tree they
/// were inserted on, identified by the postorder id of the node below it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GhostMapping {
    branches: HashMap<String, BranchId>,
}

impl GhostMapping {
    /// Returns the original branch of a ghost node label.
    pub fn branch(&self, ghost_label: &str) -> Option<BranchId> {
        self.branches.get(ghost_label).copied()
    }

    /// Returns the number of ghost labels (two per branch).
    pub fn len(&self) -> usize {
        self.branches.len()
    }

    /// Returns `true` if no ghost nodes were inserted.
    pub fn is_empty(&self) -> bool {
        self.branches.is_empty()
    }

    /// Returns an iterator over `(ghost label, branch)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (&str, BranchId)> {
        self.branches.iter().map(|(label, &branch)| (label.as_str(), branch))
    }
}

/// Returns the labels of the ghost node and ghost leaf of a branch.
pub fn ghost_labels(branch: BranchId) -> (String, String) {
    (
        format!("{branch}{GHOST_INTERNAL_SUFFIX}"),
        format!("{branch}{GHOST_LEAF_SUFFIX}"),
    )
}

/// Returns the mean branch length over all non-root nodes, `0.0` for a
/// single-node tree.
pub fn mean_branch_length(tree: &PhyloTree) -> f64 {
    let (sum, count) = tree
        .pre_order_iter()
        .filter(|node| !node.is_root())
        .fold((0.0, 0usize), |(sum, count), node| (sum + node.branch_length(), count + 1));

    if count == 0 { 0.0 } else { sum / count as f64 }
}

/// Builds the ghost-node extended version of `tree`.
///
/// # Arguments
/// * `tree` - The reference tree; indexed on a copy if needed
///
/// # Returns
/// The extended, indexed tree and the mapping from ghost labels to the
/// postorder ids of the original tree.
///
/// # Errors
/// * Propagates [TreeError] from indexing, e.g. if the root has a parent
/// * [TreeError::BranchIdOverflow] if the tree has more nodes than branch
///   ids
pub fn extend(tree: &PhyloTree) -> Result<(PhyloTree, GhostMapping), TreeError> {
    let mut extended = tree.clone();
    if !extended.is_indexed() {
        extended.index()?;
    }
    let mean_length = mean_branch_length(&extended);

    let branches = extended
        .pre_order_iter()
        .filter(|node| !node.is_root())
        .map(|node| Ok((node.preorder_id(), branch_id(node.postorder_id())?, node.branch_length())))
        .collect::<Result<Vec<(NodeId, BranchId, f64)>, TreeError>>()?;

    let mut mapping = GhostMapping::default();
    for (id, branch, length) in branches {
        let (internal_label, leaf_label) = ghost_labels(branch);
        let ghost = extended.insert_above(id, internal_label.clone(), length / 2.0, length / 2.0)?;
        extended.add_child(ghost, leaf_label.clone(), mean_length)?;

        mapping.branches.insert(internal_label, branch);
        mapping.branches.insert(leaf_label, branch);
    }
    extended.index()?;

    info!(
        branches = mapping.len() / 2,
        node_count = extended.node_count(),
        mean_length,
        "extended tree with ghost nodes"
    );
    Ok((extended, mapping))
}
