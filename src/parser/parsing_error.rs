//! Error type of the Newick parser.
//!
//! A [ParsingError] carries its [ParsingErrorKind], the byte position where
//! it occurred, and a few bytes of the input following that position.

use crate::error::TreeError;
use crate::parser::byte_parser::ByteParser;
use crate::parser::byte_source::ByteSource;
use std::fmt;
use thiserror::Error;

/// Default length of context provided by error from parser
const DEFAULT_CONTEXT_LENGTH: usize = 50;

// =#========================================================================#=
// PARSING ERROR KIND
// =#========================================================================#=
/// Error kinds that can occur while parsing a Newick string.
#[derive(Error, PartialEq, Debug, Clone)]
pub enum ParsingErrorKind {
    #[error("IO error - {0}")]
    IoError(String),
    #[error("Unexpected end of file")]
    UnexpectedEof,
    #[error("Unclosed comment")]
    UnclosedComment,
    #[error("Unclosed quoted label")]
    UnclosedQuote,
    #[error("Invalid newick string: {0}")]
    InvalidNewickString(String),
    #[error("Invalid tree structure - {0}")]
    InvalidTreeStructure(TreeError),
}

// =#========================================================================#=
// PARSING ERROR
// =#========================================================================#=
/// Parsing error with contextual information (position and following bytes).
#[derive(Debug, Clone, PartialEq)]
pub struct ParsingError {
    kind: ParsingErrorKind,
    position: usize,
    context: String,
}

impl ParsingError {
    /// Create a ParsingError from an error kind and parser state
    pub fn from_parser<S: ByteSource>(kind: ParsingErrorKind, parser: &ByteParser<S>) -> Self {
        Self {
            kind,
            position: parser.position(),
            context: parser.get_context_as_string(DEFAULT_CONTEXT_LENGTH),
        }
    }

    /// Convenience constructor for UnexpectedEof
    pub fn unexpected_eof<S: ByteSource>(parser: &ByteParser<S>) -> Self {
        Self::from_parser(ParsingErrorKind::UnexpectedEof, parser)
    }

    /// Convenience constructor for UnclosedComment
    pub fn unclosed_comment<S: ByteSource>(parser: &ByteParser<S>) -> Self {
        Self::from_parser(ParsingErrorKind::UnclosedComment, parser)
    }

    /// Convenience constructor for UnclosedQuote
    pub fn unclosed_quote<S: ByteSource>(parser: &ByteParser<S>) -> Self {
        Self::from_parser(ParsingErrorKind::UnclosedQuote, parser)
    }

    /// Convenience constructor for InvalidNewickString
    pub fn invalid_newick_string<S: ByteSource>(parser: &ByteParser<S>, msg: String) -> Self {
        Self::from_parser(ParsingErrorKind::InvalidNewickString(msg), parser)
    }

    /// Convenience constructor for InvalidTreeStructure
    pub fn invalid_tree_structure<S: ByteSource>(parser: &ByteParser<S>, err: TreeError) -> Self {
        Self::from_parser(ParsingErrorKind::InvalidTreeStructure(err), parser)
    }

    /// Get the error kind
    pub fn kind(&self) -> &ParsingErrorKind {
        &self.kind
    }

    /// Get the position where the error occurred
    pub fn position(&self) -> usize {
        self.position
    }
}

impl fmt::Display for ParsingError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{} at position {}", self.kind, self.position)?;

        if !self.context.is_empty() {
            write!(f, "\n  Context (next {} bytes): {}", self.context.len(), self.context)?;
        }

        Ok(())
    }
}

impl std::error::Error for ParsingError {}

impl From<std::io::Error> for ParsingError {
    fn from(err: std::io::Error) -> Self {
        ParsingError {
            kind: ParsingErrorKind::IoError(err.to_string()),
            position: 0,
            context: String::new(),
        }
    }
}
