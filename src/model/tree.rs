//! Indexed phylogenetic tree.
//!
//! Provides [PhyloTree], a rooted tree of [PhyloNode]s using the arena
//! pattern: nodes are stored in a contiguous vector and refer to their parent
//! and children by [NodeId]. Indexing lays the arena out in preorder, so
//! after [PhyloTree::index] the [NodeId] of a node is its preorder id, and
//! the preorder lookup is a plain arena access.

use crate::error::TreeError;
use crate::model::node::{NodeId, PhyloNode};
use crate::newick;
use std::collections::HashMap;
use tracing::{debug, warn};

// =#========================================================================#=
// TREE
// =#========================================================================#=
/// A rooted phylogenetic tree with preorder, postorder and label indices.
///
/// # Structure
/// - The tree owns all nodes; the root is the only node without a parent.
/// - Children are ordered; traversals visit them left to right.
/// - Indices (ids, label map, node count) are derived data, rebuilt from
///   scratch by [index()](Self::index).
///
/// # Construction
/// Trees are built with a [TreeBuilder](crate::model::TreeBuilder) or parsed
/// from Newick, and are indexed immediately. Topology edits
/// ([add_child](Self::add_child), [insert_above](Self::insert_above)) leave
/// the tree unindexed until the next call to [index()](Self::index); the
/// lookups keep answering from the last indexing in the meantime.
#[derive(Debug, Clone)]
pub struct PhyloTree {
    /// Nodes of this tree (arena pattern)
    nodes: Vec<PhyloNode>,

    /// Index of the root in the arena
    root: NodeId,

    /// Number of nodes reachable from the root at the last indexing
    node_count: usize,

    /// Postorder id -> arena index
    postorder: Vec<NodeId>,

    /// Label -> arena index, for labelled nodes
    labels: HashMap<String, NodeId>,

    /// Whether the indices reflect the current topology
    indexed: bool,
}

// ============================================================================
// Construction & Indexing (pub)
// ============================================================================
impl PhyloTree {
    /// Creates a tree from an arena of nodes and the index of its root,
    /// and indexes it.
    ///
    /// # Errors
    /// * [TreeError::UnknownNode] if `root` is not in the arena
    /// * [TreeError::NonRootNode] if `root` has a parent
    pub(crate) fn from_arena(nodes: Vec<PhyloNode>, root: NodeId) -> Result<Self, TreeError> {
        if root >= nodes.len() {
            return Err(TreeError::UnknownNode(root));
        }

        let mut tree = Self {
            nodes,
            root,
            node_count: 0,
            postorder: Vec::new(),
            labels: HashMap::new(),
            indexed: false,
        };
        tree.index()?;
        Ok(tree)
    }

    /// Recomputes preorder ids, postorder ids, the label mapping and the
    /// node count, replacing all previous indices.
    ///
    /// The arena is laid out in preorder (root-to-leaf, left-to-right);
    /// nodes no longer reachable from the root are dropped. Indexing an
    /// indexed tree changes nothing.
    ///
    /// # Errors
    /// [TreeError::NonRootNode] if the root has a parent.
    pub fn index(&mut self) -> Result<(), TreeError> {
        if self.nodes[self.root].parent.is_some() {
            return Err(TreeError::NonRootNode(self.root));
        }

        self.index_preorder_ids();
        self.index_postorder_ids();
        self.index_labels();
        self.node_count = self.nodes.len();
        self.indexed = true;

        debug!(node_count = self.node_count, "indexed tree");
        Ok(())
    }

    /// Returns whether the indices reflect the current topology.
    pub fn is_indexed(&self) -> bool {
        self.indexed
    }
}

// ============================================================================
// Getters / Lookups (pub)
// ============================================================================
impl PhyloTree {
    /// Returns the number of nodes counted by the last indexing.
    pub fn node_count(&self) -> usize {
        self.node_count
    }

    /// Returns the root node.
    pub fn root(&self) -> &PhyloNode {
        &self.nodes[self.root]
    }

    /// Returns the arena index of the root (`0` once indexed).
    pub fn root_id(&self) -> NodeId {
        self.root
    }

    /// Returns the node at the given arena index, if any.
    pub fn node(&self, id: NodeId) -> Option<&PhyloNode> {
        self.nodes.get(id)
    }

    /// Returns the parent of the given node, `None` for the root.
    pub fn parent(&self, id: NodeId) -> Option<&PhyloNode> {
        self.nodes.get(id)?.parent.map(|p| &self.nodes[p])
    }

    /// Returns whether the tree is rooted, i.e. the root has fewer than
    /// three children (an unrooted tree is stored with a trifurcating
    /// pseudo-root).
    pub fn is_rooted(&self) -> bool {
        self.root().children.len() < 3
    }

    /// Looks up a node by preorder id.
    pub fn get_by_preorder_id(&self, preorder_id: NodeId) -> Option<&PhyloNode> {
        if preorder_id < self.node_count {
            self.nodes.get(preorder_id)
        } else {
            None
        }
    }

    /// Looks up a node by postorder id.
    pub fn get_by_postorder_id(&self, postorder_id: NodeId) -> Option<&PhyloNode> {
        self.postorder.get(postorder_id).map(|&id| &self.nodes[id])
    }

    /// Looks up a node by label.
    pub fn get_by_label(&self, label: &str) -> Option<&PhyloNode> {
        self.labels.get(label).map(|&id| &self.nodes[id])
    }

    /// Returns an iterator over the leaves, left to right.
    pub fn leaves(&self) -> impl Iterator<Item = &PhyloNode> {
        self.pre_order_iter().filter(|node| node.is_leaf())
    }

    /// Returns the Newick representation of this tree.
    pub fn to_newick(&self) -> String {
        newick::to_newick(self)
    }
}

impl std::ops::Index<NodeId> for PhyloTree {
    type Output = PhyloNode;

    fn index(&self, id: NodeId) -> &Self::Output {
        &self.nodes[id]
    }
}

// ============================================================================
// Topology edits (pub)
// ============================================================================
impl PhyloTree {
    /// Appends a new child to `parent` and returns its arena index.
    ///
    /// The tree is unindexed afterwards.
    ///
    /// # Errors
    /// [TreeError::UnknownNode] if `parent` is not in the arena.
    pub fn add_child(
        &mut self,
        parent: NodeId,
        label: impl Into<String>,
        branch_length: f64,
    ) -> Result<NodeId, TreeError> {
        if parent >= self.nodes.len() {
            return Err(TreeError::UnknownNode(parent));
        }

        let id = self.nodes.len();
        let mut node = PhyloNode::new(label, branch_length);
        node.parent = Some(parent);
        self.nodes.push(node);
        self.nodes[parent].children.push(id);
        self.indexed = false;

        Ok(id)
    }

    /// Inserts a new node on the branch above `child`, which keeps its
    /// position among the siblings. The new node gets the branch length
    /// `upper_length`, `child` gets `lower_length`.
    ///
    /// The tree is unindexed afterwards.
    ///
    /// # Errors
    /// * [TreeError::UnknownNode] if `child` is not in the arena
    /// * [TreeError::RootHasNoBranch] if `child` is the root
    pub fn insert_above(
        &mut self,
        child: NodeId,
        label: impl Into<String>,
        upper_length: f64,
        lower_length: f64,
    ) -> Result<NodeId, TreeError> {
        let parent = self
            .nodes
            .get(child)
            .ok_or(TreeError::UnknownNode(child))?
            .parent
            .ok_or(TreeError::RootHasNoBranch(child))?;

        let id = self.nodes.len();
        let mut node = PhyloNode::new(label, upper_length);
        node.parent = Some(parent);
        node.children.push(child);
        self.nodes.push(node);

        for sibling in self.nodes[parent].children.iter_mut() {
            if *sibling == child {
                *sibling = id;
            }
        }
        self.nodes[child].parent = Some(id);
        self.nodes[child].branch_length = lower_length;
        self.indexed = false;

        Ok(id)
    }
}

// ============================================================================
// Indexing helpers (private)
// ============================================================================
impl PhyloTree {
    /// Lays out the arena in preorder and assigns preorder ids.
    fn index_preorder_ids(&mut self) {
        let order: Vec<NodeId> = PreOrderIds::new(&self.nodes, self.root).collect();

        let mut new_ids = vec![None; self.nodes.len()];
        for (preorder_id, &old_id) in order.iter().enumerate() {
            new_ids[old_id] = Some(preorder_id);
        }

        let mut old_nodes = std::mem::take(&mut self.nodes);
        self.nodes = order
            .iter()
            .enumerate()
            .map(|(preorder_id, &old_id)| {
                let mut node = std::mem::take(&mut old_nodes[old_id]);
                node.preorder_id = preorder_id;
                node.parent = node.parent.and_then(|p| new_ids[p]);
                node.children = node.children.iter().filter_map(|&c| new_ids[c]).collect();
                node
            })
            .collect();
        self.root = 0;
    }

    /// Assigns postorder ids; expects the arena in preorder.
    fn index_postorder_ids(&mut self) {
        self.postorder = PostOrderIds::new(&self.nodes, self.root).collect();
        for (postorder_id, &id) in self.postorder.iter().enumerate() {
            self.nodes[id].postorder_id = postorder_id;
        }
    }

    fn index_labels(&mut self) {
        self.labels.clear();
        for (id, node) in self.nodes.iter().enumerate() {
            if node.label.is_empty() {
                continue;
            }
            if self.labels.insert(node.label.clone(), id).is_some() {
                warn!(label = %node.label, "duplicate node label, the last node in preorder wins");
            }
        }
    }
}

// =#========================================================================#=
// ITERATORS
// =#========================================================================#=
impl PhyloTree {
    /// Returns an iterator over the tree in preorder (parents before
    /// children, children left to right).
    ///
    /// This is the order in which [index()](Self::index) assigns preorder
    /// ids. Each call starts a fresh traversal.
    pub fn pre_order_iter(&self) -> PreOrderIter<'_> {
        PreOrderIter {
            ids: PreOrderIds::new(&self.nodes, self.root),
        }
    }

    /// Returns an iterator over the tree in postorder (children before
    /// parents, children left to right).
    ///
    /// This is the order in which [index()](Self::index) assigns postorder
    /// ids. Each call starts a fresh traversal.
    pub fn post_order_iter(&self) -> PostOrderIter<'_> {
        PostOrderIter {
            ids: PostOrderIds::new(&self.nodes, self.root),
        }
    }
}

/// Stack-based preorder walk over arena indices.
struct PreOrderIds<'a> {
    nodes: &'a [PhyloNode],
    stack: Vec<NodeId>,
}

impl<'a> PreOrderIds<'a> {
    fn new(nodes: &'a [PhyloNode], root: NodeId) -> Self {
        Self {
            nodes,
            stack: vec![root],
        }
    }
}

impl Iterator for PreOrderIds<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<Self::Item> {
        let id = self.stack.pop()?;

        // Push children in reverse, so the leftmost is processed first
        self.stack.extend(self.nodes[id].children.iter().rev());

        Some(id)
    }
}

/// Stack-based postorder walk over arena indices.
struct PostOrderIds<'a> {
    nodes: &'a [PhyloNode],
    stack: Vec<(NodeId, bool)>, // (index, children_visited)
}

impl<'a> PostOrderIds<'a> {
    fn new(nodes: &'a [PhyloNode], root: NodeId) -> Self {
        Self {
            nodes,
            stack: vec![(root, false)],
        }
    }
}

impl Iterator for PostOrderIds<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<Self::Item> {
        while let Some((id, children_visited)) = self.stack.pop() {
            let node = &self.nodes[id];
            if children_visited || node.is_leaf() {
                return Some(id);
            }

            self.stack.push((id, true));
            self.stack
                .extend(node.children.iter().rev().map(|&child| (child, false)));
        }
        None
    }
}

/// Iterator for preorder traversal, created by [PhyloTree::pre_order_iter].
pub struct PreOrderIter<'a> {
    ids: PreOrderIds<'a>,
}

impl<'a> Iterator for PreOrderIter<'a> {
    type Item = &'a PhyloNode;

    fn next(&mut self) -> Option<Self::Item> {
        let nodes = self.ids.nodes;
        self.ids.next().map(|id| &nodes[id])
    }
}

/// Iterator for postorder traversal, created by [PhyloTree::post_order_iter].
pub struct PostOrderIter<'a> {
    ids: PostOrderIds<'a>,
}

impl<'a> Iterator for PostOrderIter<'a> {
    type Item = &'a PhyloNode;

    fn next(&mut self) -> Option<Self::Item> {
        let nodes = self.ids.nodes;
        self.ids.next().map(|id| &nodes[id])
    }
}
