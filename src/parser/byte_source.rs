//! Byte sources feeding the [ByteParser](crate::parser::ByteParser).
//!
//! Tree files and reconstruction outputs are small compared to the
//! database, so the only implementation keeps the whole input in memory.

use std::fs;
use std::io;
use std::path::Path;

// =#========================================================================#=
// BYTE SOURCE (Trait)
// =#========================================================================#=
/// Access to the bytes under the cursor of a parser.
pub trait ByteSource {
    /// Peek at the current byte without consuming it, `None` at EOF.
    fn peek(&self) -> Option<u8>;

    /// Get the current byte and advance the position, `None` at EOF.
    fn next_byte(&mut self) -> Option<u8>;

    /// Returns the current byte offset.
    fn position(&self) -> usize;

    /// Returns up to `k` bytes from the current position, for error context.
    fn get_context(&self, k: usize) -> Vec<u8>;

    /// Check if at end of data.
    fn is_eof(&self) -> bool;
}

// =#========================================================================#=
// IN MEMORY BYTE SOURCE
// =#========================================================================#=
/// A byte source that owns its data.
pub struct InMemoryByteSource {
    input: Vec<u8>,
    pos: usize,
}

impl InMemoryByteSource {
    /// Creates a new in-memory byte source from a Vec of bytes.
    pub fn from_vec(bytes: Vec<u8>) -> Self {
        Self {
            input: bytes,
            pos: 0,
        }
    }

    /// Reads a whole file into a new byte source.
    ///
    /// # Errors
    /// Returns the IO error if the file cannot be read.
    pub fn from_file<P: AsRef<Path>>(path: P) -> io::Result<Self> {
        Ok(Self::from_vec(fs::read(path)?))
    }
}

impl ByteSource for InMemoryByteSource {
    #[inline(always)]
    fn peek(&self) -> Option<u8> {
        self.input.get(self.pos).copied()
    }

    #[inline(always)]
    fn next_byte(&mut self) -> Option<u8> {
        let byte = self.peek()?;
        self.pos += 1;
        Some(byte)
    }

    #[inline]
    fn position(&self) -> usize {
        self.pos
    }

    fn get_context(&self, k: usize) -> Vec<u8> {
        let end = (self.pos + k).min(self.input.len());
        self.input[self.pos..end].to_vec()
    }

    fn is_eof(&self) -> bool {
        self.pos >= self.input.len()
    }
}
