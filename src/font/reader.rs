//! Cursor over an owned font buffer.
//!
//! All multi-byte reads are big-endian, as everywhere in the sfnt format.
//! Reads past the end fail with [`ParseError::UnexpectedEof`] instead of
//! panicking, so a truncated file surfaces as a parse error.

use crate::error::ParseError;

/// A read cursor plus the bytes it reads from.
#[derive(Debug, PartialEq, Eq, Default)]
pub struct FontReader {
    data: Vec<u8>,
    position: usize,
}

impl FontReader {
    pub fn new(data: Vec<u8>) -> Self {
        Self { data, position: 0 }
    }

    /// Rebuild a reader from a buffer and a cursor position.
    pub fn from_parts(data: Vec<u8>, position: usize) -> Self {
        Self { data, position }
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn position(&self) -> usize {
        self.position
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Move the cursor to an absolute offset. Seeking to `len()` is allowed.
    pub fn seek(&mut self, offset: usize) -> Result<(), ParseError> {
        if offset > self.data.len() {
            return Err(ParseError::UnexpectedEof {
                offset,
                wanted: 0,
            });
        }
        self.position = offset;
        Ok(())
    }

    pub fn skip(&mut self, count: usize) -> Result<(), ParseError> {
        self.take(count).map(|_| ())
    }

    pub fn read_u16(&mut self) -> Result<u16, ParseError> {
        let b = self.take(2)?;
        Ok(u16::from_be_bytes([b[0], b[1]]))
    }

    pub fn read_i16(&mut self) -> Result<i16, ParseError> {
        let b = self.take(2)?;
        Ok(i16::from_be_bytes([b[0], b[1]]))
    }

    pub fn read_u32(&mut self) -> Result<u32, ParseError> {
        let b = self.take(4)?;
        Ok(u32::from_be_bytes([b[0], b[1], b[2], b[3]]))
    }

    /// Read a four-byte table tag such as `glyf` or `OS/2`.
    pub fn read_tag(&mut self) -> Result<[u8; 4], ParseError> {
        let b = self.take(4)?;
        Ok([b[0], b[1], b[2], b[3]])
    }

    /// Borrow `length` bytes starting at `offset` without moving the cursor.
    pub fn slice(&self, offset: usize, length: usize) -> Option<&[u8]> {
        let end = offset.checked_add(length)?;
        self.data.get(offset..end)
    }

    fn take(&mut self, count: usize) -> Result<&[u8], ParseError> {
        let start = self.position;
        let end = start
            .checked_add(count)
            .filter(|&end| end <= self.data.len())
            .ok_or(ParseError::UnexpectedEof {
                offset: start,
                wanted: count,
            })?;
        self.position = end;
        Ok(&self.data[start..end])
    }
}
