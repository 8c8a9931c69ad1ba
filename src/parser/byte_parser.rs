//! Low-level byte-by-byte parser for ASCII text.
//!
//! [ByteParser] offers peeking, consuming, comment skipping and quote-aware
//! label parsing. It is the foundation of the Newick parser.

use crate::parser::byte_source::{ByteSource, InMemoryByteSource};
use crate::parser::parsing_error::ParsingError;
use std::io;
use std::path::Path;

// =#========================================================================#=
// BYTE PARSER
// =#========================================================================#=
/// A byte-by-byte parser for ASCII text.
///
/// # Example
/// ```
/// use xpas::parser::ByteParser;
///
/// let mut parser = ByteParser::for_str("  [comment] (A,B);");
/// parser.skip_comment_and_whitespace().unwrap();
/// assert!(parser.consume_if(b'('));
/// assert_eq!(parser.parse_label(b",);").unwrap(), "A");
/// ```
pub struct ByteParser<S: ByteSource> {
    source: S,
}

impl ByteParser<InMemoryByteSource> {
    /// Creates a new parser over a copy of the given string.
    pub fn for_str(input: &str) -> Self {
        Self::new(InMemoryByteSource::from_vec(input.as_bytes().to_vec()))
    }

    /// Creates a new parser over the content of a file.
    ///
    /// # Errors
    /// Returns the IO error if the file cannot be read.
    pub fn for_file<P: AsRef<Path>>(path: P) -> io::Result<Self> {
        Ok(Self::new(InMemoryByteSource::from_file(path)?))
    }
}

impl<S: ByteSource> ByteParser<S> {
    /// Creates a new parser from a byte source.
    pub fn new(source: S) -> Self {
        Self { source }
    }

    /// Peeks at the current byte without consuming it.
    #[inline(always)]
    pub fn peek(&self) -> Option<u8> {
        self.source.peek()
    }

    /// Consumes and returns the current byte.
    #[inline(always)]
    pub fn next_byte(&mut self) -> Option<u8> {
        self.source.next_byte()
    }

    /// Skips all consecutive whitespace characters.
    pub fn skip_whitespace(&mut self) {
        while let Some(b) = self.peek() {
            if b.is_ascii_whitespace() {
                self.next_byte();
            } else {
                break;
            }
        }
    }

    /// Skips a `[...]` comment if present.
    ///
    /// # Returns
    /// * `Ok(true)` - A comment was found and consumed
    /// * `Ok(false)` - No comment at current position
    ///
    /// # Errors
    /// Returns an error if a comment is opened but never closed.
    pub fn skip_comment(&mut self) -> Result<bool, ParsingError> {
        if !self.consume_if(b'[') {
            return Ok(false);
        }
        while let Some(b) = self.next_byte() {
            if b == b']' {
                return Ok(true);
            }
        }
        Err(ParsingError::unclosed_comment(self))
    }

    /// Skips all consecutive whitespace and comments.
    ///
    /// # Errors
    /// Returns an error if an unclosed comment is encountered.
    pub fn skip_comment_and_whitespace(&mut self) -> Result<(), ParsingError> {
        self.skip_whitespace();
        while self.skip_comment()? {
            self.skip_whitespace();
        }
        Ok(())
    }

    /// Checks if the current byte is `ch`.
    pub fn peek_is(&self, ch: u8) -> bool {
        self.peek() == Some(ch)
    }

    /// Consumes the current byte if it is `ch`.
    pub fn consume_if(&mut self, ch: u8) -> bool {
        if self.peek_is(ch) {
            self.next_byte();
            true
        } else {
            false
        }
    }

    /// Returns whether the end of data has been reached.
    pub fn is_eof(&self) -> bool {
        self.source.is_eof()
    }

    /// Returns the current byte offset in the input.
    pub fn position(&self) -> usize {
        self.source.position()
    }

    /// Returns up to `k` bytes from the current position as a (lossy) string.
    pub fn get_context_as_string(&self, k: usize) -> String {
        String::from_utf8_lossy(&self.source.get_context(k)).into_owned()
    }

    /// Parses a label, quoted or unquoted; unquoted labels end at any of
    /// the `delimiters`. Returns an empty string if the label is absent.
    ///
    /// # Errors
    /// Returns an error on unclosed comments before the label or an
    /// unterminated quoted label.
    pub fn parse_label(&mut self, delimiters: &[u8]) -> Result<String, ParsingError> {
        self.skip_comment_and_whitespace()?;

        if self.peek_is(b'\'') {
            self.parse_quoted_label()
        } else {
            Ok(self.parse_unquoted_label(delimiters))
        }
    }

    /// Parses a label enclosed in single quotes, where `''` stands for a
    /// single quote (e.g. `'Wilson''s'` becomes `Wilson's`).
    ///
    /// # Errors
    /// Returns an error if the closing quote is missing.
    pub fn parse_quoted_label(&mut self) -> Result<String, ParsingError> {
        self.next_byte(); // opening '

        let mut label = Vec::new();
        loop {
            match self.next_byte() {
                Some(b'\'') if self.peek_is(b'\'') => {
                    label.push(b'\'');
                    self.next_byte();
                }
                Some(b'\'') => break,
                Some(b) => label.push(b),
                None => return Err(ParsingError::unclosed_quote(self)),
            }
        }

        Ok(String::from_utf8_lossy(&label).into_owned())
    }

    /// Parses an unquoted label until any of the given delimiters (or EOF).
    pub fn parse_unquoted_label(&mut self, delimiters: &[u8]) -> String {
        let mut label = Vec::new();
        while let Some(b) = self.peek() {
            if delimiters.contains(&b) {
                break;
            }
            label.push(b);
            self.next_byte();
        }
        String::from_utf8_lossy(&label).into_owned()
    }

    /// Parses a floating point number made of digits, `.`, `+`, `-`, `e`
    /// and `E`; returns the raw text if it is not a valid number.
    pub fn parse_number(&mut self) -> Result<f64, String> {
        let mut text = String::new();
        while let Some(b) = self.peek() {
            if b.is_ascii_digit() || matches!(b, b'.' | b'-' | b'+' | b'e' | b'E') {
                text.push(char::from(b));
                self.next_byte();
            } else {
                break;
            }
        }
        text.parse().map_err(|_| text)
    }
}
