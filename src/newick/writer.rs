//! Newick format writing for [PhyloTree]s.

use crate::model::{NodeId, PhyloTree};
use crate::newick::defs::CHARS_PER_NODE_GUESS;
use crate::parser::utils::escape_label;
use std::fs::File;
use std::io::{self, BufWriter, Write};

/// Writes given list of trees to a file in Newick format, one tree per line.
///
/// # Errors
/// Returns an I/O error if writing fails.
pub fn write_newick_file(file: File, trees: &[PhyloTree]) -> io::Result<()> {
    let mut writer = BufWriter::new(file);
    for tree in trees {
        writer.write_all(to_newick(tree).as_bytes())?;
        writer.write_all(b"\n")?;
    }

    writer.flush()?;
    Ok(())
}

/// Returns the Newick representation of a tree with closing semicolon.
///
/// Every labelled node (internal ones included) is written with its
/// escaped label; every node but the root with its branch length.
///
/// # Example
/// ```
/// use xpas::model::TreeBuilder;
/// use xpas::newick::to_newick;
///
/// let mut builder = TreeBuilder::new();
/// let root = builder.add_node("", 0.0);
/// builder.add_child(root, "Little Spotted Kiwi", 1.0).unwrap();
/// builder.add_child(root, "Tokoeka", 1.5).unwrap();
/// let tree = builder.build(root).unwrap();
///
/// assert_eq!(to_newick(&tree), "('Little Spotted Kiwi':1,Tokoeka:1.5);");
/// ```
pub fn to_newick(tree: &PhyloTree) -> String {
    // Recursive helper for building the Newick string
    fn build_newick(tree: &PhyloTree, newick: &mut String, id: NodeId) {
        let node = &tree[id];

        if !node.is_leaf() {
            newick.push('(');
            for (i, &child) in node.children().iter().enumerate() {
                if i > 0 {
                    newick.push(',');
                }
                build_newick(tree, newick, child);
            }
            newick.push(')');
        }

        newick.push_str(&escape_label(node.label()));

        if !node.is_root() {
            newick.push(':');
            newick.push_str(&node.branch_length().to_string());
        }
    }

    let mut newick = String::with_capacity(tree.node_count() * CHARS_PER_NODE_GUESS);
    build_newick(tree, &mut newick, tree.root_id());
    newick.push(';');

    newick
}
