/// Arena node type and node ids
pub mod node;
/// Indexed phylogenetic tree and its traversals
pub mod tree;
/// Incremental tree construction
pub mod tree_builder;
/// Ghost-node extension of reference trees
pub mod ghost;

pub use ghost::{GhostMapping, extend};
pub use node::{NodeId, PhyloNode};
pub use tree::{PhyloTree, PostOrderIter, PreOrderIter};
pub use tree_builder::TreeBuilder;
