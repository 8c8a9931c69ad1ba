//! The phylo-k-mer database.
//!
//! A [PhyloKmerDb] maps k-mer keys to the branches they were generated on,
//! each with its best score. It keeps the parameters it was built with and
//! the Newick string of the reference tree, so a database file is
//! self-contained.
//!
//! # Example
//! ```
//! use xpas::db::PhyloKmerDb;
//! use xpas::seq::SeqType;
//!
//! let mut db = PhyloKmerDb::new(SeqType::Dna, 3, 1.5, "(A,B);").unwrap();
//! assert!(db.insert(12, 0, -0.5));
//! assert!(!db.insert(12, 1, -5.0)); // below the omega threshold
//!
//! let branches = db.search(12).unwrap();
//! assert_eq!(branches.get(&0), Some(&-0.5));
//! assert!(db.search(13).is_none());
//! ```

use crate::error::DbError;
use crate::phylo_kmer::{BranchId, Key, Score, omega_threshold};
use crate::seq::SeqType;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;
use tracing::info;

/// Version of the on-disk format written by [PhyloKmerDb::save].
pub const FORMAT_VERSION: u32 = 1;

/// Scores of one key, by branch.
pub type BranchScores = FxHashMap<BranchId, Score>;

// =#========================================================================#=
// PHYLO KMER DB
// =#========================================================================#=
/// Two-level index `key -> branch -> score`.
///
/// # Invariants
/// - `kmer_size` fits the key width of `seq_type`
/// - every stored score is at least `omega_threshold(seq_type, omega, k)`
///   and never NaN
#[derive(Debug, Clone)]
pub struct PhyloKmerDb {
    seq_type: SeqType,
    kmer_size: usize,
    omega: Score,
    threshold: Score,
    tree: String,
    entries: FxHashMap<Key, BranchScores>,
}

impl PhyloKmerDb {
    /// Creates an empty database.
    ///
    /// # Arguments
    /// * `seq_type` - Alphabet of the k-mers
    /// * `kmer_size` - Size `k` of the k-mers
    /// * `omega` - Scores below `k * log10(omega / alphabet_size)` are refused
    /// * `tree` - Newick string of the reference tree
    ///
    /// # Errors
    /// * [DbError::Kmer] if `kmer_size` is zero or too large for the keys
    /// * [DbError::InvalidOmega] if `omega` is not positive and finite
    pub fn new(
        seq_type: SeqType,
        kmer_size: usize,
        omega: Score,
        tree: impl Into<String>,
    ) -> Result<Self, DbError> {
        seq_type.check_kmer_size(kmer_size)?;
        if !(omega > 0.0 && omega.is_finite()) {
            return Err(DbError::InvalidOmega(omega));
        }

        Ok(Self {
            seq_type,
            kmer_size,
            omega,
            threshold: omega_threshold(seq_type, omega, kmer_size),
            tree: tree.into(),
            entries: FxHashMap::default(),
        })
    }

    /// Stores `score` for `key` on `branch`, replacing a previous score of
    /// the same pair.
    ///
    /// # Returns
    /// `false` if the score was refused (NaN or below the omega threshold).
    pub fn insert(&mut self, key: Key, branch: BranchId, score: Score) -> bool {
        if !(score >= self.threshold) {
            return false;
        }
        self.entries.entry(key).or_default().insert(branch, score);
        true
    }

    /// Returns the scores of `key` by branch, `None` if it was never inserted.
    pub fn search(&self, key: Key) -> Option<&BranchScores> {
        self.entries.get(&key)
    }

    /// Returns the number of distinct keys.
    pub fn size(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns the number of stored `(key, branch, score)` triples.
    pub fn num_entries(&self) -> usize {
        self.entries.values().map(|branches| branches.len()).sum()
    }

    pub fn seq_type(&self) -> SeqType {
        self.seq_type
    }

    pub fn kmer_size(&self) -> usize {
        self.kmer_size
    }

    pub fn omega(&self) -> Score {
        self.omega
    }

    /// Returns the minimal score accepted by [insert](Self::insert).
    pub fn threshold(&self) -> Score {
        self.threshold
    }

    /// Returns the Newick string of the reference tree.
    pub fn tree(&self) -> &str {
        &self.tree
    }

    /// Returns an iterator over keys and their scores, in arbitrary order.
    pub fn iter(&self) -> impl Iterator<Item = (Key, &BranchScores)> {
        self.entries.iter().map(|(&key, branches)| (key, branches))
    }

    /// Returns an iterator over keys in ascending order, each with its
    /// scores sorted by branch.
    pub fn iter_sorted(&self) -> impl Iterator<Item = (Key, Vec<(BranchId, Score)>)> + '_ {
        let mut keys: Vec<Key> = self.entries.keys().copied().collect();
        keys.sort_unstable();

        keys.into_iter().map(move |key| {
            let mut branches: Vec<(BranchId, Score)> = self.entries[&key]
                .iter()
                .map(|(&branch, &score)| (branch, score))
                .collect();
            branches.sort_unstable_by_key(|&(branch, _)| branch);
            (key, branches)
        })
    }

    /// Keeps only the keys for which `keep` returns `true`.
    pub fn retain_keys<F: FnMut(Key) -> bool>(&mut self, mut keep: F) {
        self.entries.retain(|&key, _| keep(key));
    }
}

// ============================================================================
// Persistence (pub)
// ============================================================================
/// On-disk body of a database, keys and branches sorted.
#[derive(Serialize, Deserialize)]
struct StoredDb {
    seq_type: SeqType,
    kmer_size: usize,
    omega: Score,
    tree: String,
    entries: Vec<(Key, Vec<(BranchId, Score)>)>,
}

impl PhyloKmerDb {
    /// Writes the database to `path` (bincode, preceded by the format
    /// version).
    ///
    /// # Errors
    /// Returns an I/O or serialization error if writing fails.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), DbError> {
        let stored = StoredDb {
            seq_type: self.seq_type,
            kmer_size: self.kmer_size,
            omega: self.omega,
            tree: self.tree.clone(),
            entries: self.iter_sorted().collect(),
        };

        let mut writer = BufWriter::new(File::create(path.as_ref())?);
        bincode::serialize_into(&mut writer, &FORMAT_VERSION)?;
        bincode::serialize_into(&mut writer, &stored)?;
        writer.flush()?;

        info!(
            path = %path.as_ref().display(),
            keys = self.size(),
            entries = self.num_entries(),
            "saved database"
        );
        Ok(())
    }

    /// Reads a database written by [save](Self::save).
    ///
    /// # Errors
    /// * [DbError::UnsupportedVersion] if the file has another format version
    /// * [DbError::Kmer] / [DbError::InvalidOmega] if the stored parameters
    ///   are invalid
    /// * I/O or serialization errors if reading fails
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, DbError> {
        let mut reader = BufReader::new(File::open(path.as_ref())?);
        let version: u32 = bincode::deserialize_from(&mut reader)?;
        if version != FORMAT_VERSION {
            return Err(DbError::UnsupportedVersion(version));
        }
        let stored: StoredDb = bincode::deserialize_from(&mut reader)?;

        let mut db = Self::new(stored.seq_type, stored.kmer_size, stored.omega, stored.tree)?;
        db.entries.reserve(stored.entries.len());
        for (key, branches) in stored.entries {
            db.entries.insert(key, branches.into_iter().collect());
        }

        info!(
            path = %path.as_ref().display(),
            keys = db.size(),
            kmer_size = db.kmer_size,
            "loaded database"
        );
        Ok(db)
    }
}
