//! Ring-buffer LZSS.
//!
//! The most widely reused engine: a flag byte announces eight items, read
//! LSB-first, where a set bit is a literal and a clear bit is a two-byte
//! reference into a sliding ring ("frame") of recent output. References
//! address the ring absolutely rather than relative to the write position.

use alloc::vec;
use alloc::vec::Vec;

use log::{debug, trace};

use crate::error::{DecodeError, Result};

/// Number of items announced by one flag byte.
const FLAG_GROUP_SIZE: u32 = 8;

/// Ring geometry of an LZSS variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LzssParams {
    /// Ring size in bytes; a non-zero power of two.
    pub frame_size: usize,
    /// Byte the ring is pre-filled with.
    pub frame_fill: u8,
    /// Initial ring write position.
    pub frame_init_pos: usize,
    /// Length added to the 4-bit count field; at most `frame_size`.
    pub min_match: usize,
}

impl Default for LzssParams {
    fn default() -> Self {
        Self {
            frame_size: 0x1000,
            frame_fill: 0,
            frame_init_pos: 0xFEE,
            min_match: 3,
        }
    }
}

/// Output of an LZSS run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Lzss {
    /// Always `unpacked_size` bytes long.
    pub data: Vec<u8>,
    /// How many bytes were actually produced before the input ran out.
    pub written: usize,
    /// Input bytes consumed.
    pub consumed: usize,
}

/// Decompresses an LZSS stream into `unpacked_size` bytes.
///
/// Running out of input is a tolerated early end: the remaining output stays
/// zero and [`Lzss::written`] reports how far decoding got. References that
/// would run past `unpacked_size` are cut short.
pub fn decompress(input: &[u8], unpacked_size: usize, params: &LzssParams) -> Result<Lzss> {
    if params.frame_size == 0 || !params.frame_size.is_power_of_two() {
        return Err(DecodeError::InvalidParameters(
            "LZSS frame size must be a non-zero power of two",
        ));
    }
    if params.min_match > params.frame_size {
        return Err(DecodeError::InvalidParameters(
            "LZSS minimum match exceeds the frame size",
        ));
    }
    trace!("lzss: {} -> {} bytes, {:?}", input.len(), unpacked_size, params);

    let frame_mask = params.frame_size - 1;
    let mut frame = vec![params.frame_fill; params.frame_size];
    let mut frame_pos = params.frame_init_pos & frame_mask;

    let mut output = vec![0u8; unpacked_size];
    let mut dst = 0;
    let mut in_idx = 0;
    let end = input.len();

    // Flag bits live above bit 8 as a countdown, so the loop needs no
    // separate item counter.
    let mut ctl: u32 = 0;

    while dst < unpacked_size {
        ctl >>= 1;
        if ctl & 0x100 == 0 {
            if in_idx >= end {
                break;
            }
            ctl = u32::from(input[in_idx]) | (0xFF << FLAG_GROUP_SIZE);
            in_idx += 1;
        }

        if ctl & 1 != 0 {
            if in_idx >= end {
                break;
            }
            let b = input[in_idx];
            in_idx += 1;
            output[dst] = b;
            dst += 1;
            frame[frame_pos] = b;
            frame_pos = (frame_pos + 1) & frame_mask;
        } else {
            if in_idx + 2 > end {
                break;
            }
            let lo = usize::from(input[in_idx]);
            let hi = usize::from(input[in_idx + 1]);
            in_idx += 2;

            let mut offset = lo | ((hi & 0xF0) << 4);
            let count = ((hi & 0x0F) + params.min_match).min(unpacked_size - dst);
            for _ in 0..count {
                let b = frame[offset & frame_mask];
                offset += 1;
                output[dst] = b;
                dst += 1;
                frame[frame_pos] = b;
                frame_pos = (frame_pos + 1) & frame_mask;
            }
        }
    }

    if dst < unpacked_size {
        debug!("lzss: input exhausted after {dst} of {unpacked_size} bytes");
    }

    Ok(Lzss {
        data: output,
        written: dst,
        consumed: in_idx,
    })
}
