//! Prefix-controlled token family.
//!
//! Tokens are introduced by a 1 to 3 bit tag read MSB-first:
//!
//! * `0` then 8 bits: one literal byte.
//! * `10` then a 2-bit count: repeat the previous 2-byte unit.
//! * `110` then a 2-bit count: repeat the previous 3-byte unit.
//! * `111` then a 12-bit distance and a 4-bit length: back-reference of
//!   `length + 3` bytes. Distance 0 ends the stream.
//!
//! The largest inline value of each count field is an escape: the real
//! value follows as a 16-bit field.

use alloc::vec::Vec;

use crate::bits::{MsbCursor, Refill};
use crate::error::{DecodeError, Result};
use crate::output::OutputBuffer;
use crate::token::{Completion, Token, TokenReader, run_tokens};

const REPEAT_COUNT_BITS: u32 = 2;
const REPEAT_ESCAPE: u32 = (1 << REPEAT_COUNT_BITS) - 1;
const DISTANCE_BITS: u32 = 12;
const LENGTH_BITS: u32 = 4;
const LENGTH_ESCAPE: u32 = (1 << LENGTH_BITS) - 1;
const MIN_MATCH: usize = 3;
const ESCAPE_BITS: u32 = 16;

/// Interprets tag-prefixed tokens from an MSB-first bit stream.
#[derive(Debug, Clone)]
pub struct PrefixReader<'a> {
    bits: MsbCursor<'a>,
    input_len: usize,
}

impl<'a> PrefixReader<'a> {
    #[must_use]
    pub const fn new(input: &'a [u8], refill: Refill) -> Self {
        Self {
            bits: MsbCursor::with_refill(input, refill),
            input_len: input.len(),
        }
    }

    /// Repeat count for a 2- or 3-byte run, with the 16-bit escape.
    fn repeat_count(&mut self, tag: u32) -> Result<usize> {
        let n = self.bits.take_checked(REPEAT_COUNT_BITS)?;
        if n != REPEAT_ESCAPE {
            return Ok(n as usize + 1);
        }
        self.explicit(tag)
    }

    fn explicit(&mut self, tag: u32) -> Result<usize> {
        let at = self.consumed();
        let v = self.bits.take_checked(ESCAPE_BITS)?;
        if v == 0 {
            return Err(DecodeError::UnrecognizedControlCode {
                code: tag,
                position: at,
            });
        }
        Ok(v as usize)
    }
}

impl<'a> TokenReader<'a> for PrefixReader<'a> {
    fn next_token(&mut self) -> Result<Option<Token<'a>>> {
        if self.bits.bits_remaining() == 0 {
            return Ok(None);
        }

        if !self.bits.take_bit_checked()? {
            let b = self.bits.take_checked(8)?;
            return Ok(Some(Token::Byte(b as u8)));
        }
        if !self.bits.take_bit_checked()? {
            let count = self.repeat_count(0b10)?;
            return Ok(Some(Token::Copy {
                offset: 2,
                length: count * 2,
            }));
        }
        if !self.bits.take_bit_checked()? {
            let count = self.repeat_count(0b110)?;
            return Ok(Some(Token::Copy {
                offset: 3,
                length: count * 3,
            }));
        }

        let distance = self.bits.take_checked(DISTANCE_BITS)? as usize;
        let l = self.bits.take_checked(LENGTH_BITS)?;
        if distance == 0 {
            return Ok(Some(Token::End));
        }
        let length = if l == LENGTH_ESCAPE {
            self.explicit(0b111)?
        } else {
            l as usize + MIN_MATCH
        };
        Ok(Some(Token::Copy {
            offset: distance,
            length,
        }))
    }

    fn consumed(&self) -> usize {
        (self.bits.bits_consumed().div_ceil(8) as usize).min(self.input_len)
    }
}

/// Decodes a prefix-controlled stream into `unpacked_size` bytes.
///
/// The distance-0 end token is a tolerated early end. Without it the input
/// must last until the buffer is full.
pub fn decompress(input: &[u8], unpacked_size: usize, refill: Refill) -> Result<Vec<u8>> {
    let mut reader = PrefixReader::new(input, refill);
    let mut out = OutputBuffer::with_size(unpacked_size);
    match run_tokens(&mut reader, &mut out)? {
        Completion::Filled | Completion::Terminated { .. } => Ok(out.into_vec()),
        Completion::Exhausted { .. } => Err(DecodeError::TruncatedInput),
    }
}
