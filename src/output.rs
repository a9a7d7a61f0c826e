//! The pre-sized buffer each decode writes into.

use alloc::vec;
use alloc::vec::Vec;

use crate::copy::{Pattern, fill, overlap_copy};
use crate::error::{DecodeError, Result};
use crate::token::Token;

/// A zero-initialised buffer of the declared unpacked size with a write cursor.
///
/// Nothing is ever written past the declared size: every operation that
/// would do so fails with `BoundsViolation` and leaves the buffer untouched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputBuffer {
    data: Vec<u8>,
    pos: usize,
}

impl OutputBuffer {
    #[must_use]
    pub fn with_size(size: usize) -> Self {
        Self {
            data: vec![0; size],
            pos: 0,
        }
    }

    #[must_use]
    pub const fn position(&self) -> usize {
        self.pos
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    #[must_use]
    pub fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    #[must_use]
    pub fn is_full(&self) -> bool {
        self.pos >= self.data.len()
    }

    pub fn push(&mut self, b: u8) -> Result<()> {
        let (pos, limit) = (self.pos, self.data.len());
        let slot = self
            .data
            .get_mut(pos)
            .ok_or_else(|| DecodeError::bounds(pos, 1, limit))?;
        *slot = b;
        self.pos += 1;
        Ok(())
    }

    pub fn extend(&mut self, bytes: &[u8]) -> Result<()> {
        let (pos, limit) = (self.pos, self.data.len());
        let dst = self
            .data
            .get_mut(pos..)
            .and_then(|tail| tail.get_mut(..bytes.len()))
            .ok_or_else(|| DecodeError::bounds(pos, bytes.len(), limit))?;
        dst.copy_from_slice(bytes);
        self.pos += bytes.len();
        Ok(())
    }

    pub fn fill(&mut self, pattern: Pattern, count: usize) -> Result<()> {
        fill(&mut self.data, self.pos, pattern, count)?;
        self.pos += count * pattern.width();
        Ok(())
    }

    /// Copies `length` bytes starting `offset` bytes behind the write cursor.
    pub fn copy_back(&mut self, offset: usize, length: usize) -> Result<()> {
        if offset == 0 || offset > self.pos {
            return Err(DecodeError::bounds(
                self.pos.wrapping_sub(offset),
                length,
                self.pos,
            ));
        }
        overlap_copy(&mut self.data, self.pos - offset, self.pos, length)?;
        self.pos += length;
        Ok(())
    }

    /// Like [`copy_back`](Self::copy_back), but silently stops at the end of
    /// the buffer. Only formats whose reference decoder truncates oversized
    /// matches use this.
    pub fn copy_back_clamped(&mut self, offset: usize, length: usize) -> Result<()> {
        let length = length.min(self.remaining());
        self.copy_back(offset, length)
    }

    /// Executes one decoded token. `End` is a no-op here; the driver loop
    /// is what stops on it.
    pub fn apply(&mut self, token: Token<'_>) -> Result<()> {
        match token {
            Token::Literal(bytes) => self.extend(bytes),
            Token::Byte(b) => self.push(b),
            Token::Fill { pattern, count } => self.fill(pattern, count),
            Token::Copy { offset, length } => self.copy_back(offset, length),
            Token::End => Ok(()),
        }
    }

    /// Everything written so far and beyond; always the declared size.
    #[must_use]
    pub fn as_slice(&self) -> &[u8] {
        &self.data
    }

    /// The already written prefix.
    #[must_use]
    pub fn written(&self) -> &[u8] {
        &self.data[..self.pos]
    }

    #[must_use]
    pub fn into_vec(self) -> Vec<u8> {
        self.data
    }
}
