//! Branch-parallel construction of a [PhyloKmerDb].
//!
//! Each branch of the reference tree is handled by one task of a rayon pool:
//! the task enumerates the phylo-k-mers of all windows of its node entries,
//! keeps the best score per key, and then inserts them into the shared
//! database under its lock. The filter runs once all branches are done.
//!
//! # Example
//! ```
//! use xpas::builder::{BranchMapping, BuildConfig, DbBuilder};
//! use xpas::node_entry::NodeEntry;
//! use xpas::proba_matrix::ProbaMatrix;
//! use xpas::row::Row;
//! use xpas::seq::SeqType;
//!
//! let mut matrix = ProbaMatrix::new(SeqType::Dna, 4);
//! let rows = vec![Row::from_probabilities(&[0.97, 0.01, 0.01, 0.01]); 4];
//! matrix.insert(NodeEntry::with_rows("0_X0", SeqType::Dna, rows)).unwrap();
//!
//! let mut mapping = BranchMapping::new(1);
//! mapping.insert("0_X0", 0);
//!
//! let config = BuildConfig::new(SeqType::Dna).with_kmer_size(3);
//! let db = DbBuilder::new(config).unwrap().build("(A,B);", &matrix, &mapping).unwrap();
//! assert_eq!(db.size(), 1); // AAA
//! ```

use crate::ar::LabelMapping;
use crate::db::PhyloKmerDb;
use crate::error::{BuildError, DbError, TreeError};
use crate::filter::{self, FilterConfig, FilterKind};
use crate::model::ghost::{GHOST_INTERNAL_SUFFIX, GhostMapping};
use crate::model::PhyloTree;
use crate::node_entry::NodeEntry;
use crate::phylo_kmer::{BranchId, Key, Score, branch_id};
use crate::proba_matrix::ProbaMatrix;
use crate::seq::SeqType;
use parking_lot::Mutex;
use rayon::prelude::*;
use rustc_hash::FxHashMap;
use std::collections::HashMap;
use tracing::{debug, info, warn};

/// Default k-mer size.
pub const DEFAULT_KMER_SIZE: usize = 8;

/// Default omega.
pub const DEFAULT_OMEGA: Score = 1.5;

/// Default number of worker threads.
pub const DEFAULT_NUM_THREADS: usize = 1;

// =#========================================================================#=
// BUILD CONFIG
// =#========================================================================#=
/// Parameters of a database construction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BuildConfig {
    pub seq_type: SeqType,
    pub kmer_size: usize,
    pub omega: Score,
    pub num_threads: usize,
    pub filter: FilterConfig,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self::new(SeqType::Dna)
    }
}

impl BuildConfig {
    /// Creates a configuration with default values.
    pub fn new(seq_type: SeqType) -> Self {
        Self {
            seq_type,
            kmer_size: DEFAULT_KMER_SIZE,
            omega: DEFAULT_OMEGA,
            num_threads: DEFAULT_NUM_THREADS,
            filter: FilterConfig::default(),
        }
    }

    pub fn with_kmer_size(mut self, kmer_size: usize) -> Self {
        self.kmer_size = kmer_size;
        self
    }

    pub fn with_omega(mut self, omega: Score) -> Self {
        self.omega = omega;
        self
    }

    pub fn with_num_threads(mut self, num_threads: usize) -> Self {
        self.num_threads = num_threads;
        self
    }

    pub fn with_filter(mut self, filter: FilterConfig) -> Self {
        self.filter = filter;
        self
    }

    /// Checks all parameters.
    ///
    /// # Errors
    /// The first invalid parameter: k-mer size, omega, threads or mu.
    pub fn validate(&self) -> Result<(), BuildError> {
        self.seq_type.check_kmer_size(self.kmer_size).map_err(DbError::from)?;
        if !(self.omega > 0.0 && self.omega.is_finite()) {
            return Err(DbError::InvalidOmega(self.omega).into());
        }
        if self.num_threads == 0 {
            return Err(BuildError::NoThreads);
        }
        self.filter.validate()
    }
}

// =#========================================================================#=
// BRANCH MAPPING
// =#========================================================================#=
/// Assignment of node entry labels to branches of the reference tree.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BranchMapping {
    branches: HashMap<String, BranchId>,
    num_branches: usize,
}

impl BranchMapping {
    /// Creates an empty mapping for a tree with `num_branches` branches.
    pub fn new(num_branches: usize) -> Self {
        Self {
            branches: HashMap::new(),
            num_branches,
        }
    }

    /// Maps every labelled non-root node of `tree` to its own branch, the
    /// postorder id of the node.
    ///
    /// # Errors
    /// [TreeError::BranchIdOverflow] if a postorder id does not fit into a
    /// [BranchId].
    pub fn from_tree(tree: &PhyloTree) -> Result<Self, TreeError> {
        let mut mapping = Self::new(tree.node_count().saturating_sub(1));
        for node in tree.pre_order_iter() {
            if !node.is_root() && !node.label().is_empty() {
                mapping.insert(node.label(), branch_id(node.postorder_id())?);
            }
        }
        Ok(mapping)
    }

    /// Maps the reconstruction labels of the ghost nodes to the branches of
    /// the original tree.
    ///
    /// # Arguments
    /// * `ghosts` - Ghost labels to original branches, from tree extension
    /// * `labels` - Extended-tree labels to reconstruction labels
    /// * `num_branches` - Number of branches of the original tree
    pub fn from_ghosts(ghosts: &GhostMapping, labels: &LabelMapping, num_branches: usize) -> Self {
        let mut mapping = Self::new(num_branches);
        for (ghost_label, branch) in ghosts.iter() {
            if !ghost_label.ends_with(GHOST_INTERNAL_SUFFIX) {
                continue;
            }
            match labels.get(ghost_label) {
                Some(ar_label) => mapping.insert(ar_label, branch),
                None => warn!(ghost_label, "ghost node missing from reconstruction tree"),
            }
        }
        mapping
    }

    pub fn insert(&mut self, label: impl Into<String>, branch: BranchId) {
        let branch_count = branch as usize + 1;
        if branch_count > self.num_branches {
            self.num_branches = branch_count;
        }
        self.branches.insert(label.into(), branch);
    }

    pub fn get(&self, label: &str) -> Option<BranchId> {
        self.branches.get(label).copied()
    }

    /// Returns the number of branches of the tree (at least one more than
    /// the largest mapped branch).
    pub fn num_branches(&self) -> usize {
        self.num_branches
    }

    /// Returns the number of mapped labels.
    pub fn len(&self) -> usize {
        self.branches.len()
    }

    pub fn is_empty(&self) -> bool {
        self.branches.is_empty()
    }
}

// =#========================================================================#=
// DB BUILDER
// =#========================================================================#=
/// Builds databases with a fixed [BuildConfig].
#[derive(Debug, Clone)]
pub struct DbBuilder {
    config: BuildConfig,
}

impl DbBuilder {
    /// Creates a builder after validating the configuration.
    pub fn new(config: BuildConfig) -> Result<Self, BuildError> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &BuildConfig {
        &self.config
    }

    /// Builds and filters the database of a reconstruction.
    ///
    /// # Arguments
    /// * `tree` - Newick string of the reference tree, stored in the database
    /// * `matrix` - Node entries of the reconstruction
    /// * `mapping` - Branches of the node entries; unmapped entries are skipped
    ///
    /// # Errors
    /// * [BuildError::SeqTypeMismatch] if the matrix holds other sequences
    /// * [BuildError::ThreadPool] if the worker pool can not be created
    pub fn build(
        &self,
        tree: &str,
        matrix: &ProbaMatrix,
        mapping: &BranchMapping,
    ) -> Result<PhyloKmerDb, BuildError> {
        let config = &self.config;
        if matrix.seq_type() != config.seq_type {
            return Err(BuildError::SeqTypeMismatch {
                config: config.seq_type,
                matrix: matrix.seq_type(),
            });
        }

        let db = PhyloKmerDb::new(config.seq_type, config.kmer_size, config.omega, tree)?;
        let threshold = db.threshold();
        let groups = self.group_entries(matrix, mapping);

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(config.num_threads)
            .build()?;

        info!(
            branches = groups.len(),
            kmer_size = config.kmer_size,
            omega = config.omega,
            threads = config.num_threads,
            "building database"
        );

        let db = Mutex::new(db);
        pool.install(|| {
            groups.par_iter().for_each(|(branch, entries)| {
                let kmers = best_kmers(entries, config.kmer_size, threshold);
                debug!(branch, kmers = kmers.len(), "enumerated branch");

                let mut db = db.lock();
                for (key, score) in kmers {
                    db.insert(key, *branch, score);
                }
            });
        });
        let mut db = db.into_inner();

        info!(keys = db.size(), entries = db.num_entries(), "generated phylo-k-mers");
        filter::apply(&mut db, &config.filter, mapping.num_branches())?;
        Ok(db)
    }

    /// Groups the node entries to process together, one group per branch
    /// sorted by branch. Entries sharing a branch keep the max score per key.
    fn group_entries<'m>(
        &self,
        matrix: &'m ProbaMatrix,
        mapping: &BranchMapping,
    ) -> Vec<(BranchId, Vec<&'m NodeEntry>)> {
        let merge = self.config.filter.kind == FilterKind::MergeBranches;
        let mut groups: Vec<(BranchId, Vec<&NodeEntry>)> = Vec::new();
        let mut by_branch: FxHashMap<BranchId, usize> = FxHashMap::default();
        let mut skipped = 0usize;
        let mut shared = 0usize;

        for entry in matrix.iter() {
            let Some(branch) = mapping.get(entry.label()) else {
                skipped += 1;
                continue;
            };
            match by_branch.get(&branch) {
                Some(&i) => {
                    shared += 1;
                    groups[i].1.push(entry);
                }
                None => {
                    by_branch.insert(branch, groups.len());
                    groups.push((branch, vec![entry]));
                }
            }
        }

        if skipped > 0 {
            warn!(skipped, "node entries without branch were skipped");
        }
        if shared > 0 && !merge {
            warn!(shared, "node entries share a branch with another entry; keeping the best score per k-mer");
        }
        groups.sort_by_key(|(branch, _)| *branch);
        groups
    }
}

/// Enumerates all windows of the entries and keeps the best score per key.
fn best_kmers(entries: &[&NodeEntry], kmer_size: usize, threshold: Score) -> FxHashMap<Key, Score> {
    let mut kmers: FxHashMap<Key, Score> = FxHashMap::default();
    for entry in entries {
        for view in entry.begin(kmer_size, threshold) {
            for kmer in view.iter() {
                kmers
                    .entry(kmer.key)
                    .and_modify(|score| *score = score.max(kmer.score))
                    .or_insert(kmer.score);
            }
        }
    }
    kmers
}
