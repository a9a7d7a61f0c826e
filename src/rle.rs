//! Run-length codecs.

use alloc::vec::Vec;

use crate::copy::Pattern;
use crate::error::Result;
use crate::output::OutputBuffer;
use crate::source::ByteReader;

/// Control byte conventions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RunLayout {
    /// Signed control `n`: `0..=127` copies `n + 1` literals, `-127..=-1`
    /// repeats the next byte `1 - n` times, `-128` is skipped.
    #[default]
    PackBits,
    /// High bit set: repeat the next byte `(c & 0x7F) + 1` times.
    /// High bit clear: copy `c + 1` literals.
    HighBitRun,
}

/// Expands a run-length stream into exactly `unpacked_size` bytes.
///
/// Returns the output and the number of input bytes consumed; any input
/// after the point where the output filled up is left alone. There is no
/// end marker in either layout, so running out of input first is
/// `TruncatedInput`, and a run that would overflow the output is a
/// `BoundsViolation`.
pub fn unpack_runs(input: &[u8], unpacked_size: usize, layout: RunLayout) -> Result<(Vec<u8>, usize)> {
    let mut src = ByteReader::new(input);
    let mut out = OutputBuffer::with_size(unpacked_size);

    while !out.is_full() {
        let c = src.u8()?;
        match layout {
            RunLayout::PackBits => {
                let n = c as i8;
                if n >= 0 {
                    out.extend(src.bytes(usize::from(c) + 1)?)?;
                } else if n != i8::MIN {
                    let count = 1 + usize::from(n.unsigned_abs());
                    out.fill(Pattern::Byte(src.u8()?), count)?;
                }
            }
            RunLayout::HighBitRun => {
                let count = usize::from(c & 0x7F) + 1;
                if c & 0x80 != 0 {
                    out.fill(Pattern::Byte(src.u8()?), count)?;
                } else {
                    out.extend(src.bytes(count)?)?;
                }
            }
        }
    }

    Ok((out.into_vec(), src.position()))
}

/// Escape-byte RLE: `marker, 0` is a literal marker byte, `marker, n, v`
/// repeats `v` `n` times, and any other byte is a literal.
///
/// Unlike the count-prefixed layouts this one tolerates running out of
/// input between items: the unwritten tail stays zero.
pub fn unpack_marked(input: &[u8], unpacked_size: usize, marker: u8) -> Result<Vec<u8>> {
    let mut src = ByteReader::new(input);
    let mut out = OutputBuffer::with_size(unpacked_size);

    while !out.is_full() && !src.is_empty() {
        let b = src.u8()?;
        if b != marker {
            out.push(b)?;
            continue;
        }
        match src.u8()? {
            0 => out.push(marker)?,
            n => {
                let v = src.u8()?;
                out.fill(Pattern::Byte(v), usize::from(n))?;
            }
        }
    }
    Ok(out.into_vec())
}
