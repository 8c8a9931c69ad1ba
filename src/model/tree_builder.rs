//! Incremental construction of a [PhyloTree].
//!
//! Nodes are first created detached with [TreeBuilder::add_node], then linked
//! with [TreeBuilder::attach]; [TreeBuilder::add_child] does both at once.
//! [TreeBuilder::build] takes the intended root and yields an indexed tree.
//!
//! ```text
//! add_node ──→ attach / add_child ──→ build(root) ──→ PhyloTree (indexed)
//! ```
//!
//! # Example
//! ```
//! use xpas::model::TreeBuilder;
//!
//! let mut builder = TreeBuilder::new();
//! let root = builder.add_node("", 0.0);
//! let a = builder.add_child(root, "A", 0.1).unwrap();
//! builder.add_child(root, "B", 0.2).unwrap();
//!
//! let tree = builder.build(root).unwrap();
//! assert_eq!(tree.node_count(), 3);
//! assert_eq!(tree.get_by_label("A").unwrap().postorder_id(), 0);
//! # let _ = a;
//! ```

use crate::error::TreeError;
use crate::model::node::{NodeId, PhyloNode};
use crate::model::tree::PhyloTree;

// =#========================================================================#=
// TREE BUILDER
// =#========================================================================#=
/// Builder for a [PhyloTree], holding a growing arena of nodes.
///
/// The builder guarantees that every node has at most one parent and that
/// the parent links are acyclic, so that the built tree is well-formed.
#[derive(Debug, Default, Clone)]
pub struct TreeBuilder {
    nodes: Vec<PhyloNode>,
}

impl TreeBuilder {
    /// Creates an empty builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty builder with room for `capacity` nodes.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            nodes: Vec::with_capacity(capacity),
        }
    }

    /// Returns the number of nodes added so far.
    pub fn num_nodes(&self) -> usize {
        self.nodes.len()
    }

    /// Adds a detached node and returns its index.
    pub fn add_node(&mut self, label: impl Into<String>, branch_length: f64) -> NodeId {
        self.nodes.push(PhyloNode::new(label, branch_length));
        self.nodes.len() - 1
    }

    /// Attaches `child` as the last child of `parent`.
    ///
    /// # Errors
    /// * [TreeError::UnknownNode] if either node does not exist
    /// * [TreeError::AlreadyAttached] if `child` already has a parent
    /// * [TreeError::Cycle] if `child` is `parent` or one of its ancestors
    pub fn attach(&mut self, parent: NodeId, child: NodeId) -> Result<(), TreeError> {
        for id in [parent, child] {
            if id >= self.nodes.len() {
                return Err(TreeError::UnknownNode(id));
            }
        }
        if self.nodes[child].parent.is_some() {
            return Err(TreeError::AlreadyAttached(child));
        }

        let mut ancestor = Some(parent);
        while let Some(id) = ancestor {
            if id == child {
                return Err(TreeError::Cycle { parent, child });
            }
            ancestor = self.nodes[id].parent;
        }

        self.nodes[child].parent = Some(parent);
        self.nodes[parent].children.push(child);
        Ok(())
    }

    /// Adds a new node as the last child of `parent` and returns its index.
    ///
    /// # Errors
    /// [TreeError::UnknownNode] if `parent` does not exist.
    pub fn add_child(
        &mut self,
        parent: NodeId,
        label: impl Into<String>,
        branch_length: f64,
    ) -> Result<NodeId, TreeError> {
        if parent >= self.nodes.len() {
            return Err(TreeError::UnknownNode(parent));
        }
        let child = self.add_node(label, branch_length);
        self.attach(parent, child)?;
        Ok(child)
    }

    /// Finishes construction, returning the indexed tree rooted at `root`.
    ///
    /// Nodes not reachable from `root` are discarded.
    ///
    /// # Errors
    /// * [TreeError::UnknownNode] if `root` does not exist
    /// * [TreeError::NonRootNode] if `root` has a parent
    pub fn build(self, root: NodeId) -> Result<PhyloTree, TreeError> {
        PhyloTree::from_arena(self.nodes, root)
    }
}
