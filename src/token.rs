//! Decoded control codes and the shared decode loop.

use log::{debug, trace};

use crate::copy::Pattern;
use crate::error::Result;
use crate::output::OutputBuffer;

/// One instruction produced by a format's control-code interpreter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Token<'a> {
    /// Raw bytes taken verbatim from the input.
    Literal(&'a [u8]),
    /// A single literal assembled from a bit stream.
    Byte(u8),
    /// `count` repetitions of `pattern`.
    Fill { pattern: Pattern, count: usize },
    /// `length` bytes starting `offset` bytes back. `offset` and `length`
    /// are both positive for every token a reader hands out.
    Copy { offset: usize, length: usize },
    /// Explicit end-of-stream marker.
    End,
}

/// A format-specific control-code interpreter.
pub trait TokenReader<'a> {
    /// Decodes the next token. `Ok(None)` means the input ran out cleanly on
    /// a token boundary; running out in the middle of a token is an error.
    fn next_token(&mut self) -> Result<Option<Token<'a>>>;

    /// Input bytes consumed so far.
    fn consumed(&self) -> usize;
}

/// How a [`run_tokens`] loop ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Completion {
    /// The output buffer reached its declared size.
    Filled,
    /// An `End` token arrived before the buffer was full.
    Terminated { written: usize },
    /// The input ran out before the buffer was full.
    Exhausted { written: usize },
}

/// Feeds tokens from `reader` into `out` until the buffer is full, an `End`
/// token is read, or the input is exhausted.
///
/// A full buffer stops the loop before another token is read, so trailing
/// padding after the last meaningful token is never interpreted.
pub fn run_tokens<'a, R: TokenReader<'a>>(reader: &mut R, out: &mut OutputBuffer) -> Result<Completion> {
    trace!("token loop: {} bytes to produce", out.len());
    loop {
        if out.is_full() {
            return Ok(Completion::Filled);
        }
        match reader.next_token()? {
            Some(Token::End) => {
                debug!(
                    "end marker after {} of {} bytes (input offset {})",
                    out.position(),
                    out.len(),
                    reader.consumed()
                );
                return Ok(Completion::Terminated {
                    written: out.position(),
                });
            }
            Some(token) => out.apply(token)?,
            None => {
                return Ok(Completion::Exhausted {
                    written: out.position(),
                });
            }
        }
    }
}
