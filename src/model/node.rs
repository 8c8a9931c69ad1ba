//! Node of a [PhyloTree](crate::model::PhyloTree).
//!
//! Nodes live in the arena of their tree and refer to each other by
//! [NodeId]; the tree owns all of them. After the tree has been indexed, the
//! [NodeId] of a node equals its preorder id.

/// Index of a node in the arena of its tree.
pub type NodeId = usize;

// =#========================================================================#=
// PHYLO NODE
// =#========================================================================#=
/// A node of a rooted phylogenetic tree.
///
/// # Invariants
/// - The root has no parent; every other node of an indexed tree has a parent
///   whose children contain it.
/// - `preorder_id` and `postorder_id` are only meaningful after
///   [PhyloTree::index](crate::model::PhyloTree::index).
/// - `branch_length` is the length of the branch to the parent
///   (`0.0` if unknown or for the root).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PhyloNode {
    pub(crate) label: String,
    pub(crate) branch_length: f64,
    pub(crate) preorder_id: NodeId,
    pub(crate) postorder_id: NodeId,
    pub(crate) parent: Option<NodeId>,
    pub(crate) children: Vec<NodeId>,
}

impl PhyloNode {
    /// Creates a new detached node.
    pub fn new(label: impl Into<String>, branch_length: f64) -> Self {
        Self {
            label: label.into(),
            branch_length,
            ..Default::default()
        }
    }

    /// Returns the label of this node (empty if unlabelled).
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Returns the length of the branch to the parent.
    pub fn branch_length(&self) -> f64 {
        self.branch_length
    }

    /// Returns the preorder id assigned by the last indexing.
    pub fn preorder_id(&self) -> NodeId {
        self.preorder_id
    }

    /// Returns the postorder id assigned by the last indexing.
    pub fn postorder_id(&self) -> NodeId {
        self.postorder_id
    }

    /// Returns the parent, `None` for the root (or a detached node).
    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    /// Returns the children, left to right.
    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    /// Returns `true` if this node has no children.
    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    /// Returns `true` if this node has no parent.
    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }

    /// Sets the length of the branch to the parent.
    pub fn set_branch_length(&mut self, branch_length: f64) {
        self.branch_length = branch_length;
    }
}
