//! Bit extraction over a byte source.
//!
//! Two orderings are supported. [`Msb`] hands out the top bit of each refill
//! word first, which is what the majority of the LZ engines expect.
//! [`Lsb`] hands out bit 0 first and is used by the table-driven decoders.
//!
//! The cache holds at most 32 bits. A request that is larger than what is
//! currently cached is assembled from the tail of the cache and as many
//! refills as it takes, so `take(n)` followed by `take(m)` always yields the
//! same bits as a single `take(n + m)`.
//!
//! Reading past the end of the source never fails on its own: refills simply
//! supply zero bits. Decoders that must reject truncated input use
//! [`BitCursor::take_checked`], which reports `TruncatedInput` once any of the
//! returned bits came from that zero padding. With [`Msb`] and a multi-byte
//! refill, the padding of a short final word sits in its high bytes and is
//! handed out *before* the real tail bits, so it is tracked per refill.

use core::marker::PhantomData;

use crate::error::{DecodeError, Result};

/// Largest single request a cursor serves.
pub const MAX_BITS: u32 = 32;

mod sealed {
    pub trait Sealed {}
}

/// Which end of a refill word is consumed first.
pub trait BitOrder: sealed::Sealed + Copy + core::fmt::Debug {
    /// Whether the missing bytes of a short refill word come out first.
    const PADDING_FIRST: bool;

    /// Positions a freshly read `width`-bit word in the cache.
    fn load(word: u32, width: u32) -> u32;

    /// Removes `n` (1..=32) bits from the front of `cache` and returns them
    /// right-aligned.
    fn extract(cache: &mut u32, n: u32) -> u32;

    /// Joins `part` (`part_bits` wide) onto `acc`, which already holds
    /// `acc_bits` bits that were read earlier.
    fn splice(acc: u64, acc_bits: u32, part: u32, part_bits: u32) -> u64;
}

/// Most-significant bit first.
#[derive(Debug, Clone, Copy)]
pub enum Msb {}

/// Least-significant bit first.
#[derive(Debug, Clone, Copy)]
pub enum Lsb {}

impl sealed::Sealed for Msb {}
impl sealed::Sealed for Lsb {}

impl BitOrder for Msb {
    const PADDING_FIRST: bool = true;

    #[inline]
    fn load(word: u32, width: u32) -> u32 {
        // Left-align so bit 31 is always the next bit out.
        word << (MAX_BITS - width)
    }

    #[inline]
    fn extract(cache: &mut u32, n: u32) -> u32 {
        let v = *cache >> (MAX_BITS - n);
        *cache = cache.checked_shl(n).unwrap_or(0);
        v
    }

    #[inline]
    fn splice(acc: u64, _acc_bits: u32, part: u32, part_bits: u32) -> u64 {
        (acc << part_bits) | u64::from(part)
    }
}

impl BitOrder for Lsb {
    const PADDING_FIRST: bool = false;

    #[inline]
    fn load(word: u32, _width: u32) -> u32 {
        word
    }

    #[inline]
    fn extract(cache: &mut u32, n: u32) -> u32 {
        let v = if n == MAX_BITS {
            *cache
        } else {
            *cache & ((1u32 << n) - 1)
        };
        *cache = cache.checked_shr(n).unwrap_or(0);
        v
    }

    #[inline]
    fn splice(acc: u64, acc_bits: u32, part: u32, _part_bits: u32) -> u64 {
        acc | (u64::from(part) << acc_bits)
    }
}

/// How many source bytes a single refill reads.
///
/// Multi-byte words are assembled little-endian, so with [`Msb`] and
/// `Word16` the first bit out is bit 7 of the *second* byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Refill {
    #[default]
    Byte,
    Word16,
    Word32,
}

impl Refill {
    #[must_use]
    pub const fn bytes(self) -> usize {
        match self {
            Self::Byte => 1,
            Self::Word16 => 2,
            Self::Word32 => 4,
        }
    }

    #[must_use]
    pub const fn bits(self) -> u32 {
        (self.bytes() * 8) as u32
    }
}

/// A bit reader over an immutable byte slice.
#[derive(Debug, Clone, Copy)]
pub struct BitCursor<'a, O: BitOrder> {
    data: &'a [u8],
    pos: usize,
    cache: u32,
    cached_bits: u32,
    consumed: u64,
    /// Padding bits still at the front of the cache.
    pad_front: u32,
    overrun: bool,
    refill: Refill,
    _order: PhantomData<O>,
}

pub type MsbCursor<'a> = BitCursor<'a, Msb>;
pub type LsbCursor<'a> = BitCursor<'a, Lsb>;

impl<'a, O: BitOrder> BitCursor<'a, O> {
    /// Creates a cursor that refills one byte at a time.
    #[must_use]
    pub const fn new(data: &'a [u8]) -> Self {
        Self::with_refill(data, Refill::Byte)
    }

    #[must_use]
    pub const fn with_refill(data: &'a [u8], refill: Refill) -> Self {
        Self {
            data,
            pos: 0,
            cache: 0,
            cached_bits: 0,
            consumed: 0,
            pad_front: 0,
            overrun: false,
            refill,
            _order: PhantomData,
        }
    }

    /// Consumes and returns the next `n` bits, zero-filling past the end of
    /// the source. Requests wider than 32 bits are clamped to 32.
    pub fn take(&mut self, n: u32) -> u32 {
        let n = n.min(MAX_BITS);
        let mut acc = 0u64;
        let mut got = 0;
        while got < n {
            if self.cached_bits == 0 {
                self.refill();
            }
            let k = (n - got).min(self.cached_bits);
            if self.pad_front > 0 {
                self.pad_front -= k.min(self.pad_front);
                self.overrun = true;
            }
            let part = O::extract(&mut self.cache, k);
            self.cached_bits -= k;
            acc = O::splice(acc, got, part, k);
            got += k;
        }
        self.consumed += u64::from(n);
        acc as u32
    }

    /// Like [`take`](Self::take), but fails once the returned bits reach past
    /// the real end of the source.
    pub fn take_checked(&mut self, n: u32) -> Result<u32> {
        if n > MAX_BITS {
            return Err(DecodeError::InvalidParameters("bit request wider than 32"));
        }
        let v = self.take(n);
        if self.is_overrun() {
            return Err(DecodeError::TruncatedInput);
        }
        Ok(v)
    }

    /// Returns the next `n` bits without consuming them.
    #[must_use]
    pub fn peek(&self, n: u32) -> u32 {
        let mut probe = *self;
        probe.take(n)
    }

    #[inline]
    pub fn take_bit(&mut self) -> bool {
        self.take(1) != 0
    }

    pub fn take_bit_checked(&mut self) -> Result<bool> {
        Ok(self.take_checked(1)? != 0)
    }

    /// Drops whatever is left in the cache; the next read starts on a fresh
    /// refill word.
    pub fn align_byte(&mut self) {
        self.consumed += u64::from(self.cached_bits);
        self.cache = 0;
        self.cached_bits = 0;
        self.pad_front = 0;
    }

    /// Index of the next source byte that has not been pulled into the cache.
    #[must_use]
    pub const fn byte_position(&self) -> usize {
        self.pos
    }

    #[must_use]
    pub const fn bits_consumed(&self) -> u64 {
        self.consumed
    }

    /// Real (non-padding) bits still available.
    #[must_use]
    pub fn bits_remaining(&self) -> u64 {
        self.total_bits().saturating_sub(self.consumed)
    }

    /// Whether any zero-fill bit past the end of the source has been handed out.
    #[must_use]
    pub fn is_overrun(&self) -> bool {
        self.overrun || self.consumed > self.total_bits()
    }

    /// The unread tail of the source, starting at [`byte_position`](Self::byte_position).
    #[must_use]
    pub fn rest(&self) -> &'a [u8] {
        self.data.get(self.pos..).unwrap_or(&[])
    }

    fn total_bits(&self) -> u64 {
        self.data.len() as u64 * 8
    }

    fn refill(&mut self) {
        let width = self.refill.bytes();
        let mut word = 0u32;
        let mut got = 0;
        for i in 0..width {
            // Short final words are zero-padded.
            if let Some(&b) = self.data.get(self.pos) {
                word |= u32::from(b) << (8 * i);
                self.pos += 1;
                got += 1;
            }
        }
        self.cache = O::load(word, self.refill.bits());
        self.cached_bits = self.refill.bits();
        self.pad_front = if O::PADDING_FIRST {
            ((width - got) * 8) as u32
        } else {
            0
        };
    }
}

/// MSB-first bit packer for building test fixtures.
#[cfg(test)]
pub(crate) struct MsbPacker {
    out: alloc::vec::Vec<u8>,
    acc: u32,
    n: u32,
}

#[cfg(test)]
impl MsbPacker {
    pub(crate) const fn new() -> Self {
        Self {
            out: alloc::vec::Vec::new(),
            acc: 0,
            n: 0,
        }
    }

    pub(crate) fn put(&mut self, value: u32, width: u32) -> &mut Self {
        for i in (0..width).rev() {
            self.acc = (self.acc << 1) | ((value >> i) & 1);
            self.n += 1;
            if self.n == 8 {
                self.out.push(self.acc as u8);
                self.acc = 0;
                self.n = 0;
            }
        }
        self
    }

    /// Pads the last byte with zero bits.
    pub(crate) fn finish(&mut self) -> alloc::vec::Vec<u8> {
        if self.n > 0 {
            self.out.push((self.acc << (8 - self.n)) as u8);
            self.acc = 0;
            self.n = 0;
        }
        core::mem::take(&mut self.out)
    }
}

#[cfg(test)]
mod tests {
    use super::{LsbCursor, MsbCursor, MsbPacker, Refill};
    use crate::DecodeError;

    #[test]
    fn test_msb_byte_order() {
        let data = [0b1011_0000, 0xFF];
        let mut c = MsbCursor::new(&data);
        assert_eq!(c.take(1), 1);
        assert_eq!(c.take(2), 0b01);
        assert_eq!(c.take(5), 0b10000);
        assert_eq!(c.take(8), 0xFF);
        assert!(!c.is_overrun());
    }

    #[test]
    fn test_lsb_byte_order() {
        let data = [0b1011_0001, 0x0F];
        let mut c = LsbCursor::new(&data);
        assert_eq!(c.take(1), 1);
        assert_eq!(c.take(3), 0b000);
        assert_eq!(c.take(4), 0b1011);
        assert_eq!(c.take(4), 0xF);
    }

    #[test]
    fn test_msb_splices_across_refills() {
        let data = [0x12, 0x34, 0x56];
        let mut c = MsbCursor::new(&data);
        assert_eq!(c.take(4), 0x1);
        assert_eq!(c.take(16), 0x2345);
        assert_eq!(c.take(4), 0x6);
    }

    #[test]
    fn test_lsb_splices_across_refills() {
        let data = [0x12, 0x34, 0x56];
        let mut c = LsbCursor::new(&data);
        assert_eq!(c.take(4), 0x2);
        assert_eq!(c.take(16), 0x6341);
        assert_eq!(c.take(4), 0x5);
    }

    #[test]
    fn test_word16_refill_is_little_endian() {
        let data = [0x34, 0x12];
        let mut c = MsbCursor::with_refill(&data, Refill::Word16);
        assert_eq!(c.take(4), 0x1);
        assert_eq!(c.take(12), 0x234);
    }

    #[test]
    fn test_word32_full_width_take() {
        let data = [0x78, 0x56, 0x34, 0x12, 0xEF, 0xCD, 0xAB, 0x89];
        let mut c = MsbCursor::with_refill(&data, Refill::Word32);
        assert_eq!(c.take(32), 0x1234_5678);
        assert_eq!(c.take(32), 0x89AB_CDEF);

        let mut l = LsbCursor::with_refill(&data, Refill::Word32);
        assert_eq!(l.take(8), 0x78);
        assert_eq!(l.take(32), 0xEF12_3456);
    }

    #[test]
    fn test_exhausted_source_yields_zeros() {
        let data = [0xFF];
        let mut c = MsbCursor::new(&data);
        assert_eq!(c.take(12), 0xFF0);
        assert!(c.is_overrun());
        assert_eq!(c.take(32), 0);
    }

    #[test]
    fn test_take_checked_reports_truncation() {
        let data = [0xAB];
        let mut c = MsbCursor::new(&data);
        assert_eq!(c.take_checked(8), Ok(0xAB));
        assert_eq!(c.take_checked(1), Err(DecodeError::TruncatedInput));
    }

    #[test]
    fn test_peek_does_not_consume() {
        let data = [0xC3];
        let mut c = MsbCursor::new(&data);
        assert_eq!(c.peek(2), 0b11);
        assert_eq!(c.peek(2), 0b11);
        assert_eq!(c.take(4), 0xC);
        assert_eq!(c.bits_consumed(), 4);
    }

    #[test]
    fn test_align_byte_discards_cache() {
        let data = [0xF0, 0xAA];
        let mut c = MsbCursor::new(&data);
        c.take(3);
        c.align_byte();
        assert_eq!(c.byte_position(), 1);
        assert_eq!(c.take(8), 0xAA);
        assert_eq!(c.bits_remaining(), 0);
    }

    #[test]
    fn test_packer_matches_cursor() {
        let data = MsbPacker::new().put(0b101, 3).put(0x1FF, 9).put(1, 1).finish();
        assert_eq!(data, [0b1011_1111, 0b1111_1000]);
        let mut c = MsbCursor::new(&data);
        assert_eq!(c.take(3), 0b101);
        assert_eq!(c.take(9), 0x1FF);
        assert_eq!(c.take(1), 1);
    }

    #[test]
    fn test_msb_short_word_padding_is_truncation() {
        // The two missing high bytes of the word come out before 0xCDAB.
        let data = [0xAB, 0xCD];
        let mut c = MsbCursor::with_refill(&data, Refill::Word32);
        assert_eq!(c.take_checked(16), Err(DecodeError::TruncatedInput));

        let mut c = MsbCursor::with_refill(&data, Refill::Word16);
        assert_eq!(c.take_checked(16), Ok(0xCDAB));
        assert!(!c.is_overrun());

        let data = [0x12, 0x34, 0x56];
        let mut c = MsbCursor::with_refill(&data, Refill::Word16);
        assert_eq!(c.take_checked(16), Ok(0x3412));
        assert_eq!(c.take_checked(1), Err(DecodeError::TruncatedInput));
    }

    #[test]
    fn test_wide_requests_are_clamped() {
        let data = [0xF0, 0x0F, 0xAA, 0x55, 0xFF];
        let c = MsbCursor::new(&data);
        assert_eq!(c.peek(40), c.peek(32));
        let mut c = LsbCursor::new(&data);
        assert_eq!(c.take(33), 0x55AA_0FF0);
        assert_eq!(c.bits_consumed(), 32);
    }

    #[test]
    fn test_short_final_word_is_padded() {
        let data = [0x01, 0x02, 0x03];
        let mut c = LsbCursor::with_refill(&data, Refill::Word32);
        assert_eq!(c.take(24), 0x03_0201);
        assert!(!c.is_overrun());
        assert_eq!(c.take(8), 0);
        assert!(c.is_overrun());
    }
}
