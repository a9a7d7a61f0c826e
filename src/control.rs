//! Byte-controlled token family.
//!
//! Every token starts with one control byte whose high bits select the kind
//! and whose low bits carry a short count:
//!
//! | Control       | Meaning                                                       |
//! |---------------|---------------------------------------------------------------|
//! | `0x00`        | end of stream                                                 |
//! | `0x01..=0x3F` | literal run of `c` bytes                                      |
//! | `0x40..=0x5F` | byte fill, `(c & 0x1F) + 3` times (`0x1F`: u16 count follows) |
//! | `0x60..=0x7F` | word fill, same count rule, counted in words                  |
//! | `0x80..=0xBF` | short copy, 2..=5 bytes, 12-bit distance                      |
//! | `0xC0..=0xFE` | long copy, 3..=65 bytes, 16-bit distance                      |
//! | `0xFF`        | copy with explicit u16 length and 16-bit distance             |
//!
//! All multi-byte fields are little-endian. Distances are stored minus one.

use alloc::vec::Vec;

use crate::copy::Pattern;
use crate::error::{DecodeError, Result};
use crate::output::OutputBuffer;
use crate::source::ByteReader;
use crate::token::{Completion, Token, TokenReader, run_tokens};

const END: u8 = 0x00;
const LITERAL_MAX: u8 = 0x3F;
const BYTE_FILL_MAX: u8 = 0x5F;
const WORD_FILL_MAX: u8 = 0x7F;
const SHORT_COPY_MAX: u8 = 0xBF;
const EXPLICIT_COPY: u8 = 0xFF;

/// Low bits of a fill control that switch to an explicit 16-bit count.
const FILL_ESCAPE: u8 = 0x1F;
/// Shortest fill expressible inline.
const FILL_BIAS: usize = 3;
const SHORT_COPY_BIAS: usize = 2;
const LONG_COPY_BIAS: usize = 3;

/// Interprets control bytes from a [`ByteReader`].
#[derive(Debug, Clone)]
pub struct ControlReader<'a> {
    input: ByteReader<'a>,
}

impl<'a> ControlReader<'a> {
    #[must_use]
    pub const fn new(input: &'a [u8]) -> Self {
        Self {
            input: ByteReader::new(input),
        }
    }

    fn fill_count(&mut self, c: u8) -> Result<usize> {
        let low = c & 0x1F;
        if low != FILL_ESCAPE {
            return Ok(usize::from(low) + FILL_BIAS);
        }
        let at = self.input.position();
        let count = usize::from(self.input.u16_le()?);
        if count == 0 {
            return Err(DecodeError::UnrecognizedControlCode {
                code: u32::from(c),
                position: at,
            });
        }
        Ok(count)
    }
}

impl<'a> TokenReader<'a> for ControlReader<'a> {
    fn next_token(&mut self) -> Result<Option<Token<'a>>> {
        if self.input.is_empty() {
            return Ok(None);
        }
        let at = self.input.position();
        let c = self.input.u8()?;

        let token = match c {
            END => Token::End,
            1..=LITERAL_MAX => Token::Literal(self.input.bytes(usize::from(c))?),
            0x40..=BYTE_FILL_MAX => {
                let count = self.fill_count(c)?;
                Token::Fill {
                    pattern: Pattern::Byte(self.input.u8()?),
                    count,
                }
            }
            0x60..=WORD_FILL_MAX => {
                let count = self.fill_count(c)?;
                Token::Fill {
                    pattern: Pattern::Word(self.input.u16_le()?),
                    count,
                }
            }
            0x80..=SHORT_COPY_MAX => {
                let length = usize::from((c >> 4) & 3) + SHORT_COPY_BIAS;
                let low = usize::from(self.input.u8()?);
                let offset = ((usize::from(c & 0x0F) << 8) | low) + 1;
                Token::Copy { offset, length }
            }
            EXPLICIT_COPY => {
                let length = usize::from(self.input.u16_le()?);
                if length == 0 {
                    return Err(DecodeError::UnrecognizedControlCode {
                        code: u32::from(c),
                        position: at,
                    });
                }
                let offset = usize::from(self.input.u16_le()?) + 1;
                Token::Copy { offset, length }
            }
            _ => {
                let length = usize::from(c & 0x3F) + LONG_COPY_BIAS;
                let offset = usize::from(self.input.u16_le()?) + 1;
                Token::Copy { offset, length }
            }
        };
        Ok(Some(token))
    }

    fn consumed(&self) -> usize {
        self.input.position()
    }
}

/// Decodes a byte-controlled stream into a buffer of `unpacked_size` bytes.
///
/// A `0x00` control before the buffer is full is a tolerated early end: the
/// rest of the buffer stays zero. Running out of input without that marker
/// is `TruncatedInput`.
pub fn decompress(input: &[u8], unpacked_size: usize) -> Result<Vec<u8>> {
    let mut reader = ControlReader::new(input);
    let mut out = OutputBuffer::with_size(unpacked_size);
    match run_tokens(&mut reader, &mut out)? {
        Completion::Filled | Completion::Terminated { .. } => Ok(out.into_vec()),
        Completion::Exhausted { .. } => Err(DecodeError::TruncatedInput),
    }
}
