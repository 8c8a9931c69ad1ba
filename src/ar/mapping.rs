//! Correspondence between the nodes of the extended tree and the nodes of
//! the tree returned by a reconstruction tool.
//!
//! Reconstruction tools rename internal nodes with their own conventions,
//! so the probabilities of a ghost node are found under another label. The
//! two trees share their topology and leaf labels, which is what
//! [map_nodes] relies on.

use crate::error::ArError;
use crate::model::PhyloTree;
use std::collections::HashMap;
use tracing::debug;

/// Mapping from extended-tree labels to reconstruction-tree labels.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LabelMapping {
    labels: HashMap<String, String>,
}

impl LabelMapping {
    /// Returns the reconstruction-tree label of an extended-tree label.
    pub fn get(&self, label: &str) -> Option<&str> {
        self.labels.get(label).map(String::as_str)
    }

    pub fn insert(&mut self, label: impl Into<String>, ar_label: impl Into<String>) {
        self.labels.insert(label.into(), ar_label.into());
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.labels.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

/// Maps the labels of `extended_tree` to those of `ar_tree` by walking
/// both trees in postorder in lock-step.
///
/// # Errors
/// [ArError::TopologyMismatch] if the trees differ in size, in the number of
/// children of corresponding nodes, or in the labels of corresponding
/// leaves.
pub fn map_nodes(extended_tree: &PhyloTree, ar_tree: &PhyloTree) -> Result<LabelMapping, ArError> {
    if extended_tree.node_count() != ar_tree.node_count() {
        return Err(ArError::TopologyMismatch(format!(
            "{} nodes in the extended tree, {} in the reconstruction tree",
            extended_tree.node_count(),
            ar_tree.node_count()
        )));
    }

    let mut mapping = LabelMapping::default();
    for (node, ar_node) in extended_tree.post_order_iter().zip(ar_tree.post_order_iter()) {
        if node.children().len() != ar_node.children().len() {
            return Err(ArError::TopologyMismatch(format!(
                "node {:?} has {} children, its counterpart {:?} has {}",
                node.label(),
                node.children().len(),
                ar_node.label(),
                ar_node.children().len()
            )));
        }
        if node.is_leaf() && node.label() != ar_node.label() {
            return Err(ArError::TopologyMismatch(format!(
                "leaf {:?} corresponds to leaf {:?}",
                node.label(),
                ar_node.label()
            )));
        }
        if !node.label().is_empty() {
            mapping.insert(node.label(), ar_node.label());
        }
    }

    debug!(mapped = mapping.len(), "mapped extended tree to reconstruction tree");
    Ok(mapping)
}
