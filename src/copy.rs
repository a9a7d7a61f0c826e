//! Back-reference copies and fills within a single output buffer.

use crate::error::{DecodeError, Result};

/// Repeat unit for a fill.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pattern {
    Byte(u8),
    /// Written little-endian.
    Word(u16),
}

impl Pattern {
    /// Width of one repetition in bytes.
    #[must_use]
    pub const fn width(self) -> usize {
        match self {
            Self::Byte(_) => 1,
            Self::Word(_) => 2,
        }
    }
}

/// Copies `len` bytes from `from` to `to` inside `buf`.
///
/// Bytes are moved one at a time in increasing index order, so when the
/// ranges overlap the bytes written early in the call are read back later in
/// the same call. A back-distance of 1 therefore repeats the previous byte,
/// a distance of 2 repeats the previous pair, and so on.
///
/// The back-distance `to - from` must be positive and the destination range
/// must fit in `buf`.
pub fn overlap_copy(buf: &mut [u8], from: usize, to: usize, len: usize) -> Result<()> {
    if from >= to {
        return Err(DecodeError::bounds(from, len, to));
    }
    let end = to
        .checked_add(len)
        .ok_or_else(|| DecodeError::bounds(to, len, buf.len()))?;
    if end > buf.len() {
        return Err(DecodeError::bounds(to, len, buf.len()));
    }

    // RLE fast path: distance 1 is a plain fill of the last byte.
    if to - from == 1 {
        let b = buf[from];
        buf[to..end].fill(b);
        return Ok(());
    }

    // Non-overlapping: a block copy is indistinguishable from the byte loop.
    if from + len <= to {
        buf.copy_within(from..from + len, to);
        return Ok(());
    }

    for k in 0..len {
        buf[to + k] = buf[from + k];
    }
    Ok(())
}

/// Writes `pattern` `count` times starting at `at`.
pub fn fill(buf: &mut [u8], at: usize, pattern: Pattern, count: usize) -> Result<()> {
    let limit = buf.len();
    let len = count
        .checked_mul(pattern.width())
        .ok_or_else(|| DecodeError::bounds(at, usize::MAX, limit))?;
    let end = at
        .checked_add(len)
        .ok_or_else(|| DecodeError::bounds(at, len, limit))?;
    let dst = buf
        .get_mut(at..end)
        .ok_or_else(|| DecodeError::bounds(at, len, limit))?;

    match pattern {
        Pattern::Byte(b) => dst.fill(b),
        Pattern::Word(w) => {
            let bytes = w.to_le_bytes();
            for pair in dst.chunks_exact_mut(2) {
                pair.copy_from_slice(&bytes);
            }
        }
    }
    Ok(())
}
