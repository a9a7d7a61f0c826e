//! Byte-granular reads over an immutable input slice.

use crate::error::{DecodeError, Result};

/// A forward-only reader over the raw entry bytes.
///
/// Reads never move the position on failure, so a caller that catches
/// `TruncatedInput` still knows exactly where the stream ran dry.
#[derive(Debug, Clone, Copy)]
pub struct ByteReader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> ByteReader<'a> {
    #[must_use]
    pub const fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    #[must_use]
    pub const fn position(&self) -> usize {
        self.pos
    }

    #[must_use]
    pub const fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.pos >= self.data.len()
    }

    /// The whole underlying source, independent of the read position.
    #[must_use]
    pub const fn source(&self) -> &'a [u8] {
        self.data
    }

    pub fn u8(&mut self) -> Result<u8> {
        let b = *self.data.get(self.pos).ok_or(DecodeError::TruncatedInput)?;
        self.pos += 1;
        Ok(b)
    }

    pub fn u16_le(&mut self) -> Result<u16> {
        let b = self.array::<2>()?;
        Ok(u16::from_le_bytes(b))
    }

    pub fn u16_be(&mut self) -> Result<u16> {
        let b = self.array::<2>()?;
        Ok(u16::from_be_bytes(b))
    }

    pub fn u32_le(&mut self) -> Result<u32> {
        let b = self.array::<4>()?;
        Ok(u32::from_le_bytes(b))
    }

    /// Borrows the next `n` bytes without copying them.
    pub fn bytes(&mut self, n: usize) -> Result<&'a [u8]> {
        let end = self.pos.checked_add(n).ok_or(DecodeError::TruncatedInput)?;
        let slice = self
            .data
            .get(self.pos..end)
            .ok_or(DecodeError::TruncatedInput)?;
        self.pos = end;
        Ok(slice)
    }

    fn array<const N: usize>(&mut self) -> Result<[u8; N]> {
        let slice = self.bytes(N)?;
        let mut out = [0u8; N];
        out.copy_from_slice(slice);
        Ok(out)
    }
}
