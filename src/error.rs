//! Error types of the crate.
//!
//! Each concern has its own error enum; [Error] collects all of them for
//! callers that drive the whole pipeline (e.g. the `xpas-build` binary).
//! Lookup misses are never errors, they are reported as `None`.

use crate::model::NodeId;
use crate::parser::ParsingError;
use crate::phylo_kmer::Score;
use crate::seq::SeqType;
use std::io;
use thiserror::Error;

/// Errors concerning k-mer sizes and residue encoding.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum KmerError {
    #[error("k-mer size must be positive")]
    ZeroKmerSize,
    #[error("k-mer size {kmer_size} exceeds the maximum of {max} for {seq_type} keys")]
    KmerSizeTooLarge {
        kmer_size: usize,
        max: usize,
        seq_type: SeqType,
    },
    #[error("invalid {seq_type} residue {residue:?}")]
    InvalidResidue { residue: char, seq_type: SeqType },
    #[error("invalid {seq_type} residue code {code}")]
    InvalidCode { code: u8, seq_type: SeqType },
}

/// Errors concerning the topology of a [PhyloTree](crate::model::PhyloTree).
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TreeError {
    #[error("can not create a tree from non-root node {0}: the parent of the root must be unset")]
    NonRootNode(NodeId),
    #[error("node {0} does not exist")]
    UnknownNode(NodeId),
    #[error("node {0} already has a parent")]
    AlreadyAttached(NodeId),
    #[error("attaching node {child} below node {parent} would create a cycle")]
    Cycle { parent: NodeId, child: NodeId },
    #[error("node {0} is the root and has no incoming branch")]
    RootHasNoBranch(NodeId),
    #[error("postorder id {0} does not fit into a branch id")]
    BranchIdOverflow(NodeId),
}

/// Errors raised while assembling a [ProbaMatrix](crate::proba_matrix::ProbaMatrix).
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MatrixError {
    #[error("node entry {label:?} has {actual} rows, expected {expected}")]
    AlignmentSizeMismatch {
        label: String,
        expected: usize,
        actual: usize,
    },
    #[error("node entry {label:?} has a row of {actual} residues, expected {expected}")]
    RowWidthMismatch {
        label: String,
        expected: usize,
        actual: usize,
    },
    #[error("node entry {label:?} holds {actual} rows, expected {expected}")]
    SeqTypeMismatch {
        label: String,
        expected: SeqType,
        actual: SeqType,
    },
    #[error("node entry {0:?} is present twice")]
    DuplicateEntry(String),
    #[error("node {label:?}: expected site {expected} but found site {found}")]
    UnorderedSite {
        label: String,
        expected: usize,
        found: usize,
    },
    #[error("line {line}: {msg}")]
    Malformed { line: usize, msg: String },
}

/// Errors of the ancestral reconstruction boundary.
#[derive(Error, Debug)]
pub enum ArError {
    #[error("IO error - {0}")]
    Io(#[from] io::Error),
    #[error("{binary} exited with {status}")]
    Failed { binary: String, status: String },
    #[error("unknown ancestral reconstruction software {0:?}")]
    UnknownSoftware(String),
    #[error("unknown evolutionary model {0:?}")]
    UnknownModel(String),
    #[error("trees do not match - {0}")]
    TopologyMismatch(String),
    #[error(transparent)]
    Matrix(#[from] MatrixError),
    #[error(transparent)]
    Newick(#[from] ParsingError),
    #[error(transparent)]
    Tree(#[from] TreeError),
}

/// Errors of the [PhyloKmerDb](crate::db::PhyloKmerDb).
#[derive(Error, Debug)]
pub enum DbError {
    #[error(transparent)]
    Kmer(#[from] KmerError),
    #[error("omega must be positive and finite, got {0}")]
    InvalidOmega(Score),
    #[error("IO error - {0}")]
    Io(#[from] io::Error),
    #[error("serialization error - {0}")]
    Serialization(#[from] bincode::Error),
    #[error("unsupported database format version {0}")]
    UnsupportedVersion(u32),
}

/// Errors of the database construction.
#[derive(Error, Debug)]
pub enum BuildError {
    #[error(transparent)]
    Db(#[from] DbError),
    #[error("number of threads must be positive")]
    NoThreads,
    #[error("failed to configure thread pool - {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
    #[error("mu must lie in (0, 1], got {0}")]
    InvalidMu(f64),
    #[error("unknown filter {0:?}")]
    UnknownFilter(String),
    #[error("configured for {config} but the probability matrix holds {matrix} data")]
    SeqTypeMismatch { config: SeqType, matrix: SeqType },
}

/// Any error of this crate.
#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Kmer(#[from] KmerError),
    #[error(transparent)]
    Tree(#[from] TreeError),
    #[error(transparent)]
    Parsing(#[from] ParsingError),
    #[error(transparent)]
    Matrix(#[from] MatrixError),
    #[error(transparent)]
    Ar(#[from] ArError),
    #[error(transparent)]
    Db(#[from] DbError),
    #[error(transparent)]
    Build(#[from] BuildError),
    #[error("IO error - {0}")]
    Io(#[from] io::Error),
}
