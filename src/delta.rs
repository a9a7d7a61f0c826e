//! Differential pixel and sample reconstruction.
//!
//! Each pixel is predicted from an already decoded neighbour and corrected
//! by a signed delta read from an MSB-first bit stream. Arithmetic wraps at
//! the channel width; nothing saturates.
//!
//! Deltas use a signed Exp-Golomb code: `k` zero bits, a one bit, then `k`
//! magnitude bits give `v = 2^k - 1 + magnitude`, which zig-zags to a signed
//! value (`0, -1, 1, -2, 2, ...`).

use alloc::vec;
use alloc::vec::Vec;

use log::trace;

use crate::bits::{BitCursor, BitOrder, MsbCursor};
use crate::error::{DecodeError, Result};
use crate::rle::{RunLayout, unpack_runs};

/// Longest unary prefix accepted in a delta code.
const MAX_GOLOMB_PREFIX: u32 = 16;
/// Bits per pixel spent on the predictor selector.
const SELECTOR_BITS: u32 = 2;
const MAX_CHANNELS: usize = 4;
const ALPHA_CHANNEL: usize = 3;

/// Which neighbour a pixel is predicted from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Predictor {
    Left,
    Up,
    UpLeft,
    /// The layout's fixed reference value.
    Reference,
}

impl Predictor {
    #[must_use]
    pub const fn from_bits(bits: u32) -> Self {
        match bits & 3 {
            0 => Self::Left,
            1 => Self::Up,
            2 => Self::UpLeft,
            _ => Self::Reference,
        }
    }
}

/// Where the alpha channel of a four-channel image comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AlphaMode {
    /// Alpha is delta-coded like any other channel.
    #[default]
    Interleaved,
    /// Colour channels are delta-coded; alpha follows as a separate
    /// byte-aligned [`RunLayout::HighBitRun`] pass over the whole image.
    SeparateRuns,
}

/// Geometry of a delta-coded image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageLayout {
    pub width: usize,
    pub height: usize,
    /// Interleaved channels per pixel, 1 to 4.
    pub channels: usize,
    /// Scan order starts at the bottom row. Output is always top-down.
    pub bottom_up: bool,
    pub alpha: AlphaMode,
    /// Prediction used for [`Predictor::Reference`] and for neighbours
    /// outside the image.
    pub reference: u8,
}

impl Default for ImageLayout {
    fn default() -> Self {
        Self {
            width: 0,
            height: 0,
            channels: 1,
            bottom_up: false,
            alpha: AlphaMode::Interleaved,
            reference: 0,
        }
    }
}

impl ImageLayout {
    /// Bytes per row.
    pub fn stride(&self) -> Result<usize> {
        self.width
            .checked_mul(self.channels)
            .ok_or(DecodeError::InvalidParameters("image row size overflows"))
    }

    /// Size of the decoded image in bytes.
    pub fn output_len(&self) -> Result<usize> {
        self.stride()?
            .checked_mul(self.height)
            .ok_or(DecodeError::InvalidParameters("image size overflows"))
    }

    fn validate(&self) -> Result<()> {
        if self.channels == 0 || self.channels > MAX_CHANNELS {
            return Err(DecodeError::InvalidParameters("channel count must be 1 to 4"));
        }
        if self.alpha == AlphaMode::SeparateRuns && self.channels != MAX_CHANNELS {
            return Err(DecodeError::InvalidParameters(
                "a separate alpha pass needs four channels",
            ));
        }
        self.output_len().map(|_| ())
    }

    /// Channels whose values come from the delta stream.
    const fn coded_channels(&self) -> usize {
        match self.alpha {
            AlphaMode::Interleaved => self.channels,
            AlphaMode::SeparateRuns => self.channels - 1,
        }
    }
}

/// Reads one signed Exp-Golomb delta.
pub fn read_signed_golomb<O: BitOrder>(bits: &mut BitCursor<'_, O>) -> Result<i32> {
    let at = bits.byte_position();
    let mut zeros = 0;
    while !bits.take_bit_checked()? {
        zeros += 1;
        if zeros > MAX_GOLOMB_PREFIX {
            return Err(DecodeError::UnrecognizedControlCode {
                code: zeros,
                position: at,
            });
        }
    }
    let v = ((1u32 << zeros) - 1) + bits.take_checked(zeros)?;
    Ok(zigzag(v))
}

#[inline]
const fn zigzag(v: u32) -> i32 {
    if v & 1 == 0 {
        (v >> 1) as i32
    } else {
        -(((v >> 1) + 1) as i32)
    }
}

/// Reconstructs a delta-coded image.
///
/// The colour stream must cover every pixel; running out of bits is
/// `TruncatedInput`. With [`AlphaMode::SeparateRuns`] the alpha pass must
/// likewise cover the whole image.
pub fn decode_image(input: &[u8], layout: &ImageLayout) -> Result<Vec<u8>> {
    layout.validate()?;
    trace!("delta image: {:?}", layout);

    let channels = layout.channels;
    let stride = layout.stride()?;
    let coded = layout.coded_channels();
    let pixels = layout.width * layout.height;

    // Every pixel costs at least its selector plus one bit per coded channel.
    let min_bits = pixels.saturating_mul(SELECTOR_BITS as usize + coded);
    if input.len().saturating_mul(8) < min_bits {
        return Err(DecodeError::TruncatedInput);
    }

    let mut plane = vec![0u8; layout.output_len()?];
    let mut bits = MsbCursor::new(input);

    for y in 0..layout.height {
        for x in 0..layout.width {
            let predictor = Predictor::from_bits(bits.take_checked(SELECTOR_BITS)?);
            let base = y * stride + x * channels;
            for c in 0..coded {
                let predicted = match predictor {
                    Predictor::Left if x > 0 => plane[base - channels + c],
                    Predictor::Up if y > 0 => plane[base - stride + c],
                    Predictor::UpLeft if x > 0 && y > 0 => plane[base - stride - channels + c],
                    _ => layout.reference,
                };
                let delta = read_signed_golomb(&mut bits)?;
                // Truncating cast: deltas wrap at the channel width.
                plane[base + c] = predicted.wrapping_add(delta as u8);
            }
        }
    }

    if layout.alpha == AlphaMode::SeparateRuns {
        bits.align_byte();
        let (alpha, _) = unpack_runs(bits.rest(), pixels, RunLayout::HighBitRun)?;
        for (px, a) in plane.chunks_exact_mut(channels).zip(alpha) {
            px[ALPHA_CHANNEL] = a;
        }
    }

    if layout.bottom_up && stride > 0 {
        plane = plane.chunks_exact(stride).rev().flatten().copied().collect();
    }
    Ok(plane)
}

/// Interleaved sample stream layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AudioLayout {
    /// Samples per channel.
    pub samples: usize,
    pub channels: usize,
    /// Left shift applied to every decoded delta, below 16.
    pub shift: u32,
}

impl Default for AudioLayout {
    fn default() -> Self {
        Self {
            samples: 0,
            channels: 1,
            shift: 0,
        }
    }
}

impl AudioLayout {
    /// Size of the decoded 16-bit little-endian PCM in bytes.
    pub fn output_len(&self) -> Result<usize> {
        self.samples
            .checked_mul(self.channels)
            .and_then(|n| n.checked_mul(2))
            .ok_or(DecodeError::InvalidParameters("sample count overflows"))
    }
}

/// Reconstructs 16-bit PCM where every sample is the previous sample of the
/// same channel plus a shifted delta.
pub fn decode_samples(input: &[u8], layout: &AudioLayout) -> Result<Vec<u8>> {
    if layout.channels == 0 {
        return Err(DecodeError::InvalidParameters("audio needs at least one channel"));
    }
    if layout.shift >= 16 {
        return Err(DecodeError::InvalidParameters("delta shift must be below 16"));
    }
    let len = layout.output_len()?;
    if input.len().saturating_mul(8) < len / 2 {
        // At least one bit per sample.
        return Err(DecodeError::TruncatedInput);
    }
    let mut out = Vec::with_capacity(len);
    let mut previous = vec![0i16; layout.channels];
    let mut bits = MsbCursor::new(input);

    for _ in 0..layout.samples {
        for prev in &mut previous {
            let delta = read_signed_golomb(&mut bits)?.wrapping_shl(layout.shift);
            *prev = prev.wrapping_add(delta as i16);
            out.extend_from_slice(&prev.to_le_bytes());
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::{AlphaMode, AudioLayout, ImageLayout, decode_image, decode_samples, zigzag};
    use crate::DecodeError;
    use crate::bits::MsbPacker;

    fn gray(width: usize, height: usize, reference: u8) -> ImageLayout {
        ImageLayout {
            width,
            height,
            reference,
            ..ImageLayout::default()
        }
    }

    /// 2x2: ref+1, left-1, up+0, upleft-3.
    fn two_by_two() -> alloc::vec::Vec<u8> {
        MsbPacker::new()
            .put(0b11, 2)
            .put(0b011, 3)
            .put(0b00, 2)
            .put(0b010, 3)
            .put(0b01, 2)
            .put(0b1, 1)
            .put(0b10, 2)
            .put(0b00110, 5)
            .finish()
    }

    #[test]
    fn test_zigzag_mapping() {
        assert_eq!([0, 1, 2, 3, 4, 5].map(zigzag), [0, -1, 1, -2, 2, -3]);
    }

    #[test]
    fn test_predictors() {
        let out = decode_image(&two_by_two(), &gray(2, 2, 0x80)).unwrap();
        assert_eq!(out, [0x81, 0x80, 0x81, 0x7E]);
    }

    #[test]
    fn test_rgb_up_and_up_left() {
        let layout = ImageLayout {
            channels: 3,
            ..gray(2, 2, 0x80)
        };
        let input = MsbPacker::new()
            // reference: +1, 0, -1
            .put(0b11, 2)
            .put(0b011, 3)
            .put(1, 1)
            .put(0b010, 3)
            // left: -1, +1, 0
            .put(0b00, 2)
            .put(0b010, 3)
            .put(0b011, 3)
            .put(1, 1)
            // up: +1, 0, 0
            .put(0b01, 2)
            .put(0b011, 3)
            .put(1, 1)
            .put(1, 1)
            // up-left: 0, +1, 0
            .put(0b10, 2)
            .put(1, 1)
            .put(0b011, 3)
            .put(1, 1)
            .finish();
        let out = decode_image(&input, &layout).unwrap();
        assert_eq!(
            out,
            [0x81, 0x80, 0x7F, 0x80, 0x81, 0x7F, 0x82, 0x80, 0x7F, 0x81, 0x81, 0x7F]
        );
    }

    #[test]
    fn test_bottom_up_flips_rows() {
        let layout = ImageLayout {
            bottom_up: true,
            ..gray(2, 2, 0x80)
        };
        let out = decode_image(&two_by_two(), &layout).unwrap();
        assert_eq!(out, [0x81, 0x7E, 0x81, 0x80]);
    }

    #[test]
    fn test_wraps_instead_of_saturating() {
        let input = MsbPacker::new().put(0b11, 2).put(0b011, 3).finish();
        let out = decode_image(&input, &gray(1, 1, 0xFF)).unwrap();
        assert_eq!(out, [0x00]);
    }

    #[test]
    fn test_separate_alpha_pass() {
        let layout = ImageLayout {
            width: 2,
            height: 1,
            channels: 4,
            alpha: AlphaMode::SeparateRuns,
            ..ImageLayout::default()
        };
        let input = [0xDE, 0x70, 0x81, 0xFF];
        let out = decode_image(&input, &layout).unwrap();
        assert_eq!(out, [1, 0, 0, 0xFF, 1, 0, 0, 0xFF]);
    }

    #[test]
    fn test_truncated_image() {
        let input = two_by_two();
        assert_eq!(
            decode_image(&input[..1], &gray(2, 2, 0)),
            Err(DecodeError::TruncatedInput)
        );
    }

    #[test]
    fn test_overlong_prefix_rejected() {
        assert!(matches!(
            decode_image(&[0, 0, 0, 0x80], &gray(1, 1, 0)),
            Err(DecodeError::UnrecognizedControlCode { .. })
        ));
    }

    #[test]
    fn test_invalid_layouts() {
        let bad = ImageLayout {
            channels: 3,
            alpha: AlphaMode::SeparateRuns,
            ..gray(1, 1, 0)
        };
        assert!(matches!(
            decode_image(&[], &bad),
            Err(DecodeError::InvalidParameters(_))
        ));
        let none = ImageLayout {
            channels: 0,
            ..gray(1, 1, 0)
        };
        assert!(decode_image(&[], &none).is_err());
    }

    #[test]
    fn test_samples() {
        // +2, -1, 0
        let input = [0x2A, 0x80];
        let layout = AudioLayout {
            samples: 3,
            ..AudioLayout::default()
        };
        let out = decode_samples(&input, &layout).unwrap();
        assert_eq!(out, [2, 0, 1, 0, 1, 0]);
    }

    #[test]
    fn test_sample_shift_and_wrap() {
        // +1 << 8 on the left channel, -1 << 8 on the right.
        let input = MsbPacker::new().put(0b011, 3).put(0b010, 3).finish();
        let layout = AudioLayout {
            samples: 1,
            channels: 2,
            shift: 8,
        };
        let out = decode_samples(&input, &layout).unwrap();
        assert_eq!(out, [0x00, 0x01, 0x00, 0xFF]);
    }
}
