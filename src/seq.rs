//! Residue alphabets and the packing of k-mers into integer keys.
//!
//! A k-mer is packed into a [Key] by concatenating the residue codes,
//! `bits_per_residue` bits each, the first residue taking the most
//! significant position. Packing is therefore order-preserving and
//! injective for a fixed `k`, and [SeqType::decode] is its exact inverse.
//!
//! # Example
//! ```
//! use xpas::seq::SeqType;
//!
//! let dna = SeqType::Dna;
//! let key = dna.encode_str("ACGT").unwrap();
//! assert_eq!(key, 0b00_01_10_11);
//! assert_eq!(dna.decode_to_string(key, 4).unwrap(), "ACGT");
//! ```

use crate::error::KmerError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Encoded value of a k-mer.
pub type Key = u64;

/// Width of a [Key] in bits.
const KEY_BITS: usize = Key::BITS as usize;

/// Nucleotides in code order.
const DNA_RESIDUES: &[u8] = b"ACGT";

/// Amino acids in code order (the column order of PhyML and RAxML-NG).
const PROTEIN_RESIDUES: &[u8] = b"ARNDCQEGHILKMFPSTWYV";

/// Kind of sequences a database is built from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SeqType {
    /// Nucleotides, 2 bits per residue.
    Dna,
    /// Amino acids, 5 bits per residue.
    Protein,
}

impl SeqType {
    /// Number of residues of the alphabet.
    pub const fn alphabet_size(self) -> usize {
        match self {
            SeqType::Dna => 4,
            SeqType::Protein => 20,
        }
    }

    /// Number of key bits used by one residue.
    pub const fn bits_per_residue(self) -> usize {
        match self {
            SeqType::Dna => 2,
            SeqType::Protein => 5,
        }
    }

    /// Largest k for which every k-mer is representable as a [Key].
    pub const fn max_kmer_size(self) -> usize {
        KEY_BITS / self.bits_per_residue()
    }

    /// Residues of this alphabet, indexed by their code.
    pub const fn residues(self) -> &'static [u8] {
        match self {
            SeqType::Dna => DNA_RESIDUES,
            SeqType::Protein => PROTEIN_RESIDUES,
        }
    }

    /// Checks that `kmer_size` is positive and keys of that size fit into a [Key].
    pub fn check_kmer_size(self, kmer_size: usize) -> Result<(), KmerError> {
        if kmer_size == 0 {
            return Err(KmerError::ZeroKmerSize);
        }
        if kmer_size > self.max_kmer_size() {
            return Err(KmerError::KmerSizeTooLarge {
                kmer_size,
                max: self.max_kmer_size(),
                seq_type: self,
            });
        }
        Ok(())
    }

    /// Returns the code of a residue (case-insensitive; `U` is read as `T`),
    /// or `None` if it is not part of the alphabet.
    pub fn residue_code(self, residue: u8) -> Option<u8> {
        let residue = match (self, residue.to_ascii_uppercase()) {
            (SeqType::Dna, b'U') => b'T',
            (_, upper) => upper,
        };
        self.residues()
            .iter()
            .position(|&r| r == residue)
            .map(|code| code as u8)
    }

    /// Returns the residue of a code, or `None` if the code is out of range.
    pub fn residue(self, code: u8) -> Option<u8> {
        self.residues().get(code as usize).copied()
    }

    /// Appends one residue code to a partially packed key.
    #[inline(always)]
    pub fn push_code(self, key: Key, code: u8) -> Key {
        (key << self.bits_per_residue()) | Key::from(code)
    }

    /// Packs a sequence of residue codes into a key.
    ///
    /// # Errors
    /// Fails if the sequence is empty or too long for a [Key], or if a code is
    /// not part of the alphabet.
    pub fn encode(self, codes: &[u8]) -> Result<Key, KmerError> {
        self.check_kmer_size(codes.len())?;
        codes.iter().try_fold(0, |key, &code| {
            if (code as usize) < self.alphabet_size() {
                Ok(self.push_code(key, code))
            } else {
                Err(KmerError::InvalidCode {
                    code,
                    seq_type: self,
                })
            }
        })
    }

    /// Unpacks the `kmer_size` residue codes of a key.
    pub fn decode(self, key: Key, kmer_size: usize) -> Vec<u8> {
        let bits = self.bits_per_residue();
        let mask: Key = (1 << bits) - 1;
        (0..kmer_size)
            .rev()
            .map(|i| ((key >> (i * bits)) & mask) as u8)
            .collect()
    }

    /// Packs a k-mer given as text.
    ///
    /// # Errors
    /// Fails on residues outside the alphabet and on invalid lengths.
    pub fn encode_str(self, kmer: &str) -> Result<Key, KmerError> {
        let codes = kmer
            .bytes()
            .map(|b| {
                self.residue_code(b).ok_or(KmerError::InvalidResidue {
                    residue: char::from(b),
                    seq_type: self,
                })
            })
            .collect::<Result<Vec<u8>, KmerError>>()?;
        self.encode(&codes)
    }

    /// Unpacks a key into its textual k-mer.
    ///
    /// # Errors
    /// Fails if the key holds a code outside the alphabet, which only happens
    /// for protein keys not produced by [SeqType::encode].
    pub fn decode_to_string(self, key: Key, kmer_size: usize) -> Result<String, KmerError> {
        self.decode(key, kmer_size)
            .into_iter()
            .map(|code| {
                self.residue(code).map(char::from).ok_or(KmerError::InvalidCode {
                    code,
                    seq_type: self,
                })
            })
            .collect()
    }
}

impl fmt::Display for SeqType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SeqType::Dna => write!(f, "DNA"),
            SeqType::Protein => write!(f, "protein"),
        }
    }
}

impl FromStr for SeqType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "dna" | "nt" | "nucl" => Ok(SeqType::Dna),
            "protein" | "aa" | "amino" => Ok(SeqType::Protein),
            other => Err(format!("unknown sequence type {other:?}")),
        }
    }
}
