//! xpas builds databases of phylo-k-mers for phylogenetic placement.
//!
//! A phylo-k-mer is a k-mer that is likely to occur in sequences diverging
//! from a given branch of a reference tree, together with a score (log10
//! probability). The database maps each k-mer to the branches it was
//! generated on and its best score there, so that placement of a query
//! sequence reduces to looking up its k-mers.
//!
//! Core functionality provided:
//! - Tree model: [PhyloTree](model::PhyloTree), an arena tree with preorder
//!   and postorder ids, label lookup and traversals; Newick reading and
//!   writing in [newick]; ghost-node extension in [model::ghost].
//! - Probabilities: [NodeEntry](node_entry::NodeEntry) holds the rows of
//!   one node of an ancestral reconstruction; its windows enumerate
//!   candidate k-mers with branch-and-bound pruning.
//! - Ancestral reconstruction: [ar] runs PhyML or RAxML-NG and reads their
//!   outputs.
//! - Database: [PhyloKmerDb](db::PhyloKmerDb) with bincode persistence,
//!   built branch-parallel by [DbBuilder](builder::DbBuilder) and reduced by
//!   the [filter]s.
//!
//! Limitations:
//! - Alignments are handed to the reconstruction tools as they are; no
//!   column reduction is done.
//! - Placement of query sequences is not part of this crate.
//!
//! # Usage patterns
//! The `xpas-build` binary runs the whole pipeline. As a library:
//!
//! ```no_run
//! use xpas::ar::{ArParameters, Reconstruction, map_nodes};
//! use xpas::builder::{BranchMapping, BuildConfig, DbBuilder};
//! use xpas::model::ghost;
//! use xpas::seq::SeqType;
//!
//! let tree = xpas::newick::parse_file("reference.nwk")?;
//! let (extended, ghosts) = ghost::extend(&tree)?;
//! xpas::newick::write_newick_file(std::fs::File::create("ar/extended.nwk")?, &[extended.clone()])?;
//!
//! let params = ArParameters::new("phyml", "ar/extended.nwk", "reference.phy", "ar");
//! let (matrix, ar_tree) = Reconstruction::detect(params)?.run()?;
//! let labels = map_nodes(&extended, &ar_tree)?;
//! let mapping = BranchMapping::from_ghosts(&ghosts, &labels, tree.node_count() - 1);
//!
//! let config = BuildConfig::new(SeqType::Dna).with_kmer_size(8).with_num_threads(4);
//! let db = DbBuilder::new(config)?.build(&tree.to_newick(), &matrix, &mapping)?;
//! db.save("reference.db")?;
//! # Ok::<(), xpas::error::Error>(())
//! ```

pub mod ar;
pub mod builder;
pub mod db;
pub mod error;
pub mod filter;
pub mod model;
pub mod newick;
pub mod node_entry;
pub mod parser;
pub mod phylo_kmer;
pub mod proba_matrix;
pub mod row;
pub mod seq;

pub use crate::db::PhyloKmerDb;
pub use crate::error::Error;
pub use crate::model::PhyloTree;
pub use crate::phylo_kmer::{BranchId, Key, PhyloKmer, Score};
pub use crate::seq::SeqType;

use crate::parser::parsing_error::ParsingError;
use std::path::Path;

// ============================================================================
// Quick API
// ============================================================================
/// Parses a Newick string using default settings.
///
/// See [`newick::parse_str`] for full documentation.
pub fn parse_newick_str<S: AsRef<str>>(newick: S) -> Result<PhyloTree, ParsingError> {
    newick::parse_str(newick)
}

/// Parses the first tree of a Newick file using default settings.
///
/// See [`newick::parse_file`] for full documentation.
pub fn parse_newick_file<P: AsRef<Path>>(path: P) -> Result<PhyloTree, ParsingError> {
    newick::parse_file(path)
}

/// Loads a database written by [PhyloKmerDb::save].
pub fn load_db<P: AsRef<Path>>(path: P) -> Result<PhyloKmerDb, error::DbError> {
    PhyloKmerDb::load(path)
}
