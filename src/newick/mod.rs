//! Newick format parser and writer for phylogenetic trees.
//!
//! This module provides [`NewickParser`] to parse Newick strings into
//! indexed [`PhyloTree`]s, and [`to_newick`] to write them back. Reference
//! trees and the trees produced by ancestral reconstruction tools both go
//! through here.
//!
//! # Quick API
//! * [`parse_str`] - parses a single string
//! * [`parse_file`] - parses the first tree of a file
//! * [`to_newick`] / [`write_newick_file`] - writing
//!
//! # Full API
//! Configure a [`NewickParser`] and provide a [`ByteParser`]:
//! * [`NewickParser::parse_str`] - parse a single tree
//! * [`NewickParser::parse_all`] - parse all trees until EOF
//!
//! # Format
//! * `tree ::= node ';'`
//! * `node ::= [ '(' node { ',' node } ')' ] [label] [':' number]`
//!
//! Furthermore:
//! * Whitespace can occur between elements,
//!   just not within an unquoted label or a branch length
//! * Comments are square brackets and can occur anywhere where whitespace
//!   is allowed; annotations like `[&support=0.9]` are skipped as comments
//! * Round trips (parse, write, parse) keep topology, labels and branch
//!   lengths

mod defs;
mod parser;
pub mod writer;

pub use self::parser::NewickParser;
pub use self::writer::{to_newick, write_newick_file};

use crate::model::PhyloTree;
use crate::parser::ParsingError;
use crate::parser::byte_parser::ByteParser;
use std::path::Path;

// ============================================================================
// QUICK PARSING API (pub)
// ============================================================================
/// Parses a single Newick string into an indexed [`PhyloTree`].
///
/// # Returns
/// * [`PhyloTree`] - Tree parsed from the string
/// * [`ParsingError`] - If the string is not valid Newick format
///
/// # Example
/// ```
/// use xpas::newick::parse_str;
///
/// let tree = parse_str("(Fratercula_cirrhata,(Fratercula_arctica,Fratercula_corniculata)) ;").unwrap();
/// assert_eq!(tree.leaves().count(), 3);
/// ```
pub fn parse_str<S: AsRef<str>>(newick: S) -> Result<PhyloTree, ParsingError> {
    let mut byte_parser = ByteParser::for_str(newick.as_ref());
    NewickParser::new().parse_str(&mut byte_parser)
}

/// Parses the first Newick tree of a file.
///
/// # Arguments
/// * `path` - Path to the file (accepting `&str`, `String`, `Path`, or `PathBuf`)
///
/// # Returns
/// * [`PhyloTree`] - The first tree in the file
/// * [`ParsingError`] - If file reading fails or the Newick format is invalid
pub fn parse_file<P: AsRef<Path>>(path: P) -> Result<PhyloTree, ParsingError> {
    let mut byte_parser = ByteParser::for_file(path)?;
    NewickParser::new().parse_str(&mut byte_parser)
}
