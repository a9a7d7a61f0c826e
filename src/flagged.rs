//! Flag-byte LZ with two incompatible reference layouts.
//!
//! A flag byte announces eight items, MSB first: a set bit is a 16-bit
//! big-endian back-reference word, a clear bit is a literal byte. The same
//! signature is used with two different splits of that word, so entries are
//! normally decoded through [`decompress_probed`].

use alloc::vec::Vec;

use crate::error::{DecodeError, Result};
use crate::output::OutputBuffer;
use crate::probe::{Candidate, Plausibility, Probed, VariantState, probe};
use crate::source::ByteReader;
use crate::token::{Completion, Token, TokenReader, run_tokens};

const FLAG_GROUP_SIZE: u8 = 8;
const MIN_MATCH: usize = 3;

/// How a reference word splits into distance and length.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FlaggedLayout {
    /// 12-bit distance in the high bits, 4-bit length in the low bits.
    #[default]
    OffsetHigh,
    /// 4-bit length in the high bits, 12-bit distance in the low bits.
    LengthHigh,
}

impl FlaggedLayout {
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::OffsetHigh => "offset-high",
            Self::LengthHigh => "length-high",
        }
    }

    /// Returns `(distance, length)`.
    #[must_use]
    pub const fn split(self, word: u16) -> (usize, usize) {
        let w = word as usize;
        match self {
            Self::OffsetHigh => (w >> 4, (w & 0x0F) + MIN_MATCH),
            Self::LengthHigh => (w & 0x0FFF, (w >> 12) + MIN_MATCH),
        }
    }
}

/// A decoded entry plus how much input it took.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Flagged {
    pub data: Vec<u8>,
    pub consumed: usize,
}

#[derive(Debug, Clone)]
struct FlaggedReader<'a> {
    input: ByteReader<'a>,
    layout: FlaggedLayout,
    flags: u8,
    pending: u8,
}

impl<'a> TokenReader<'a> for FlaggedReader<'a> {
    fn next_token(&mut self) -> Result<Option<Token<'a>>> {
        if self.pending == 0 {
            if self.input.is_empty() {
                return Ok(None);
            }
            self.flags = self.input.u8()?;
            self.pending = FLAG_GROUP_SIZE;
        }
        let is_ref = self.flags & 0x80 != 0;
        self.flags <<= 1;
        self.pending -= 1;

        if !is_ref {
            return Ok(Some(Token::Byte(self.input.u8()?)));
        }
        let (offset, length) = self.layout.split(self.input.u16_be()?);
        if offset == 0 {
            return Err(DecodeError::bounds(0, length, 0));
        }
        Ok(Some(Token::Copy { offset, length }))
    }

    fn consumed(&self) -> usize {
        self.input.position()
    }
}

/// Decodes with a known layout. The input must last until the buffer is
/// full; there is no end marker.
pub fn decompress(input: &[u8], unpacked_size: usize, layout: FlaggedLayout) -> Result<Flagged> {
    let mut reader = FlaggedReader {
        input: ByteReader::new(input),
        layout,
        flags: 0,
        pending: 0,
    };
    let mut out = OutputBuffer::with_size(unpacked_size);
    match run_tokens(&mut reader, &mut out)? {
        Completion::Filled => Ok(Flagged {
            data: out.into_vec(),
            consumed: reader.consumed(),
        }),
        Completion::Terminated { .. } | Completion::Exhausted { .. } => {
            Err(DecodeError::TruncatedInput)
        }
    }
}

/// Decodes with whichever layout yields a plausible result, trying the one
/// in `state` first.
pub fn decompress_probed(
    input: &[u8],
    unpacked_size: usize,
    state: VariantState,
    plausibility: Plausibility,
) -> Result<Probed<Flagged>> {
    let offset_high = |i: &[u8]| decompress(i, unpacked_size, FlaggedLayout::OffsetHigh);
    let length_high = |i: &[u8]| decompress(i, unpacked_size, FlaggedLayout::LengthHigh);
    let candidates = [
        Candidate {
            name: FlaggedLayout::OffsetHigh.name(),
            decode: &offset_high,
        },
        Candidate {
            name: FlaggedLayout::LengthHigh.name(),
            decode: &length_high,
        },
    ];
    probe(input, &candidates, state, |f: &Flagged| {
        plausibility.accepts(f.consumed, input.len())
    })
}

#[cfg(test)]
mod tests {
    use super::{FlaggedLayout, decompress, decompress_probed};
    use crate::DecodeError;
    use crate::probe::{Plausibility, VariantState};

    /// "abcd" then distance 4, length 5, laid out offset-high.
    const OFFSET_HIGH: [u8; 7] = [0x08, b'a', b'b', b'c', b'd', 0x00, 0x42];
    /// "ab" then distance 2, length 4, laid out length-high.
    const LENGTH_HIGH: [u8; 5] = [0x20, b'a', b'b', 0x10, 0x02];

    #[test]
    fn test_known_layouts() {
        let a = decompress(&OFFSET_HIGH, 9, FlaggedLayout::OffsetHigh).unwrap();
        assert_eq!(a.data, b"abcdabcda");
        assert_eq!(a.consumed, OFFSET_HIGH.len());

        let b = decompress(&LENGTH_HIGH, 6, FlaggedLayout::LengthHigh).unwrap();
        assert_eq!(b.data, b"ababab");
    }

    #[test]
    fn test_wrong_layout_fails() {
        assert!(matches!(
            decompress(&LENGTH_HIGH, 6, FlaggedLayout::OffsetHigh),
            Err(DecodeError::BoundsViolation { .. })
        ));
    }

    #[test]
    fn test_probe_switches_and_reports_variant() {
        let res = decompress_probed(
            &LENGTH_HIGH,
            6,
            VariantState::default(),
            Plausibility::ExactConsumption,
        )
        .unwrap();
        assert_eq!(res.value.data, b"ababab");
        assert_eq!(res.state, VariantState::new(1));
        assert_eq!(res.name, "length-high");

        let again = decompress_probed(&OFFSET_HIGH, 9, res.state, Plausibility::ExactConsumption)
            .unwrap();
        assert_eq!(again.state, VariantState::new(0));
    }

    #[test]
    fn test_probe_exhaustion() {
        let garbage = [0xFF, 0xFF, 0xFF];
        assert_eq!(
            decompress_probed(&garbage, 4, VariantState::default(), Plausibility::Loose),
            Err(DecodeError::NoPlausibleVariant { tried: 2 })
        );
    }
}
