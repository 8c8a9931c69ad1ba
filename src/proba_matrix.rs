//! All node entries of one ancestral reconstruction.

use crate::error::MatrixError;
use crate::node_entry::NodeEntry;
use crate::seq::SeqType;
use std::collections::HashMap;

/// Posterior probabilities of an ancestral reconstruction: one
/// [NodeEntry] per reconstructed node, all of the same alignment size.
#[derive(Debug, Clone, PartialEq)]
pub struct ProbaMatrix {
    seq_type: SeqType,
    alignment_size: usize,
    entries: Vec<NodeEntry>,
    index: HashMap<String, usize>,
}

impl ProbaMatrix {
    /// Creates an empty matrix for alignments of `alignment_size` columns.
    pub fn new(seq_type: SeqType, alignment_size: usize) -> Self {
        Self {
            seq_type,
            alignment_size,
            entries: Vec::new(),
            index: HashMap::new(),
        }
    }

    /// Adds a node entry.
    ///
    /// # Errors
    /// * [MatrixError::SeqTypeMismatch] if the entry holds other sequences
    /// * [MatrixError::DuplicateEntry] if an entry of that label exists
    /// * [MatrixError::AlignmentSizeMismatch] if the number of rows differs
    ///   from the alignment size
    /// * [MatrixError::RowWidthMismatch] if a row does not have one pair per
    ///   residue
    pub fn insert(&mut self, entry: NodeEntry) -> Result<(), MatrixError> {
        if entry.seq_type() != self.seq_type {
            return Err(MatrixError::SeqTypeMismatch {
                label: entry.label().to_string(),
                expected: self.seq_type,
                actual: entry.seq_type(),
            });
        }
        if self.index.contains_key(entry.label()) {
            return Err(MatrixError::DuplicateEntry(entry.label().to_string()));
        }
        if entry.alignment_size() != self.alignment_size {
            return Err(MatrixError::AlignmentSizeMismatch {
                label: entry.label().to_string(),
                expected: self.alignment_size,
                actual: entry.alignment_size(),
            });
        }
        let width = self.seq_type.alphabet_size();
        if let Some(row) = entry.rows().iter().find(|row| row.len() != width) {
            return Err(MatrixError::RowWidthMismatch {
                label: entry.label().to_string(),
                expected: width,
                actual: row.len(),
            });
        }

        self.index.insert(entry.label().to_string(), self.entries.len());
        self.entries.push(entry);
        Ok(())
    }

    pub fn get(&self, label: &str) -> Option<&NodeEntry> {
        self.index.get(label).map(|&i| &self.entries[i])
    }

    /// Returns an iterator over the entries in insertion order.
    pub fn iter(&self) -> std::slice::Iter<'_, NodeEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn seq_type(&self) -> SeqType {
        self.seq_type
    }

    pub fn alignment_size(&self) -> usize {
        self.alignment_size
    }
}
