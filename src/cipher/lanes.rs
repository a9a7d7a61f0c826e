//! Packed-lane arithmetic and the SIMD-style block transform.
//!
//! The original transforms ran on MMX registers: eight bytes at a time,
//! added or subtracted as packed bytes, words or dwords with wraparound and
//! no carry between lanes. Here a `u64` plays the register and the packed
//! operations are done with carry-isolating bit tricks, so the whole
//! transform works on checked 8-byte chunks of a slice.

use log::trace;

use super::lcg::{LcgParams, LcgStream};
use crate::error::{DecodeError, Result};

/// Width of one packed lane.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum LaneWidth {
    W1,
    W2,
    #[default]
    W4,
    W8,
}

impl LaneWidth {
    #[must_use]
    pub const fn bytes(self) -> usize {
        match self {
            Self::W1 => 1,
            Self::W2 => 2,
            Self::W4 => 4,
            Self::W8 => 8,
        }
    }

    /// Mask of one lane's value bits.
    #[must_use]
    pub const fn mask(self) -> u64 {
        match self {
            Self::W8 => u64::MAX,
            _ => (1u64 << (self.bytes() * 8)) - 1,
        }
    }

    /// The top bit of every lane in a 64-bit register.
    const fn high_bits(self) -> u64 {
        match self {
            Self::W1 => 0x8080_8080_8080_8080,
            Self::W2 => 0x8000_8000_8000_8000,
            Self::W4 => 0x8000_0000_8000_0000,
            Self::W8 => 0x8000_0000_0000_0000,
        }
    }
}

/// Lane-wise wrapping addition (`paddb`/`paddw`/`paddd`/`paddq`).
#[inline]
#[must_use]
pub const fn add(a: u64, b: u64, lane: LaneWidth) -> u64 {
    let h = lane.high_bits();
    ((a & !h).wrapping_add(b & !h)) ^ ((a ^ b) & h)
}

/// Lane-wise wrapping subtraction (`psubb`/`psubw`/`psubd`/`psubq`).
#[inline]
#[must_use]
pub const fn sub(a: u64, b: u64, lane: LaneWidth) -> u64 {
    let h = lane.high_bits();
    ((a | h).wrapping_sub(b & !h)) ^ ((a ^ !b) & h)
}

#[inline]
fn read_le(bytes: &[u8]) -> u64 {
    bytes
        .iter()
        .rev()
        .fold(0u64, |acc, &b| (acc << 8) | u64::from(b))
}

#[inline]
fn write_le(bytes: &mut [u8], v: u64) {
    for (i, b) in bytes.iter_mut().enumerate() {
        *b = (v >> (8 * i)) as u8;
    }
}

/// Applies `op(value, key, lane)` to every `lane`-sized little-endian chunk
/// of `buf`, drawing one key per chunk. A trailing partial chunk is handled
/// byte by byte with the low bytes of one more key.
pub(crate) fn map_lanes(
    buf: &mut [u8],
    lane: LaneWidth,
    mut key: impl FnMut() -> u64,
    op: impl Fn(u64, u64, LaneWidth) -> u64,
) {
    let mut chunks = buf.chunks_exact_mut(lane.bytes());
    for chunk in &mut chunks {
        let v = op(read_le(chunk), key(), lane) & lane.mask();
        write_le(chunk, v);
    }
    let tail = chunks.into_remainder();
    if !tail.is_empty() {
        let k = key().to_le_bytes();
        for (b, kb) in tail.iter_mut().zip(k) {
            *b = op(u64::from(*b), u64::from(kb), LaneWidth::W1) as u8;
        }
    }
}

/// XORs 4-byte little-endian lanes with successive 32-bit keys.
pub(crate) fn xor_keyed_words(buf: &mut [u8], mut key: impl FnMut() -> u32) {
    map_lanes(buf, LaneWidth::W4, || u64::from(key()), |v, k, _| v ^ k);
}

/// Number of key registers a [`LaneProgram`] can address.
pub const REGISTERS: usize = 3;

/// One packed operation against a key register.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LaneOp {
    Add(LaneWidth, usize),
    Sub(LaneWidth, usize),
    Xor(usize),
}

impl LaneOp {
    const fn register(self) -> usize {
        match self {
            Self::Add(_, r) | Self::Sub(_, r) | Self::Xor(r) => r,
        }
    }

    #[inline]
    const fn forward(self, x: u64, regs: &[u64; REGISTERS]) -> u64 {
        match self {
            Self::Add(lane, r) => add(x, regs[r], lane),
            Self::Sub(lane, r) => sub(x, regs[r], lane),
            Self::Xor(r) => x ^ regs[r],
        }
    }

    #[inline]
    const fn inverse(self, x: u64, regs: &[u64; REGISTERS]) -> u64 {
        match self {
            Self::Add(lane, r) => sub(x, regs[r], lane),
            Self::Sub(lane, r) => add(x, regs[r], lane),
            Self::Xor(r) => x ^ regs[r],
        }
    }
}

/// A fixed sequence of packed operations applied to every 8-byte block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LaneProgram {
    /// Applied in order to encrypt, inverted in reverse order to decrypt.
    pub ops: &'static [LaneOp],
    /// Added dword-wise to every register after each block.
    pub step: u64,
    /// Generator that expands the seed into the initial registers.
    pub key_params: LcgParams,
}

impl LaneProgram {
    pub const NEKOPACK: Self = Self {
        ops: &[
            LaneOp::Xor(0),
            LaneOp::Add(LaneWidth::W2, 1),
            LaneOp::Sub(LaneWidth::W1, 2),
            LaneOp::Add(LaneWidth::W4, 0),
        ],
        step: 0x9E37_79B9_7F4A_7C15,
        key_params: LcgParams::ANSI_C,
    };
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Direction {
    Encrypt,
    Decrypt,
}

/// A [`LaneProgram`] bound to seed-derived registers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LaneCipher {
    regs: [u64; REGISTERS],
    program: LaneProgram,
}

impl LaneCipher {
    pub fn new(seed: u32, program: LaneProgram) -> Result<Self> {
        if program.ops.iter().any(|op| op.register() >= REGISTERS) {
            return Err(DecodeError::InvalidParameters(
                "lane program addresses a missing register",
            ));
        }
        let mut keys = LcgStream::new(seed, program.key_params);
        let mut regs = [0u64; REGISTERS];
        for r in &mut regs {
            let lo = u64::from(keys.next_u32());
            let hi = u64::from(keys.next_u32());
            *r = lo | (hi << 32);
        }
        trace!("lane cipher registers {:016x?}", regs);
        Ok(Self { regs, program })
    }

    pub fn encrypt(&self, buf: &mut [u8]) {
        self.run(buf, Direction::Encrypt);
    }

    pub fn decrypt(&self, buf: &mut [u8]) {
        self.run(buf, Direction::Decrypt);
    }

    fn run(&self, buf: &mut [u8], direction: Direction) {
        let mut regs = self.regs;
        let mut blocks = buf.chunks_exact_mut(8);
        for block in &mut blocks {
            let mut x = read_le(block);
            match direction {
                Direction::Encrypt => {
                    for op in self.program.ops {
                        x = op.forward(x, &regs);
                    }
                }
                Direction::Decrypt => {
                    for op in self.program.ops.iter().rev() {
                        x = op.inverse(x, &regs);
                    }
                }
            }
            write_le(block, x);
            for r in &mut regs {
                *r = add(*r, self.program.step, LaneWidth::W4);
            }
        }

        let key = regs[0].to_le_bytes();
        for (b, k) in blocks.into_remainder().iter_mut().zip(key) {
            *b ^= k;
        }
    }
}
