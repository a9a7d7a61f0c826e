//! Mersenne-Twister key streams.
//!
//! Besides the reference MT19937, archives use a port whose state was held
//! in signed 32-bit integers. Every right shift in that port (seeding,
//! generation and tempering) sign-extends, which makes it a different
//! generator for any state word with the top bit set. [`Arithmetic::Signed`]
//! reproduces it.

use super::lanes::xor_keyed_words;

const N: usize = 624;
const M: usize = 397;
const MATRIX_A: u32 = 0x9908_B0DF;
const UPPER_MASK: u32 = 0x8000_0000;
const LOWER_MASK: u32 = 0x7FFF_FFFF;
const INIT_MULTIPLIER: u32 = 1_812_433_253;

/// Right-shift semantics of the generator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Arithmetic {
    /// Logical shifts: the reference MT19937.
    #[default]
    Unsigned,
    /// Arithmetic (sign-extending) shifts.
    Signed,
}

impl Arithmetic {
    #[inline]
    const fn shr(self, v: u32, n: u32) -> u32 {
        match self {
            Self::Unsigned => v >> n,
            Self::Signed => ((v as i32) >> n) as u32,
        }
    }
}

/// MT19937 state.
#[derive(Clone)]
pub struct Twister {
    mt: [u32; N],
    index: usize,
    arithmetic: Arithmetic,
}

impl core::fmt::Debug for Twister {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Twister")
            .field("index", &self.index)
            .field("arithmetic", &self.arithmetic)
            .finish_non_exhaustive()
    }
}

impl Twister {
    #[must_use]
    pub fn new(seed: u32, arithmetic: Arithmetic) -> Self {
        let mut mt = [0u32; N];
        mt[0] = seed;
        for i in 1..N {
            let prev = mt[i - 1];
            mt[i] = INIT_MULTIPLIER
                .wrapping_mul(prev ^ arithmetic.shr(prev, 30))
                .wrapping_add(i as u32);
        }
        Self {
            mt,
            index: N,
            arithmetic,
        }
    }

    fn generate(&mut self) {
        for i in 0..N {
            let y = (self.mt[i] & UPPER_MASK) | (self.mt[(i + 1) % N] & LOWER_MASK);
            let mut next = self.mt[(i + M) % N] ^ self.arithmetic.shr(y, 1);
            if y & 1 != 0 {
                next ^= MATRIX_A;
            }
            self.mt[i] = next;
        }
        self.index = 0;
    }

    pub fn next_u32(&mut self) -> u32 {
        if self.index >= N {
            self.generate();
        }
        let mut y = self.mt[self.index];
        self.index += 1;

        y ^= self.arithmetic.shr(y, 11);
        y ^= (y << 7) & 0x9D2C_5680;
        y ^= (y << 15) & 0xEFC6_0000;
        y ^= self.arithmetic.shr(y, 18);
        y
    }
}

/// XORs a buffer with a twister stream, one output word per 4-byte
/// little-endian lane. Encryption and decryption are the same operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TwisterXor {
    pub seed: u32,
    pub arithmetic: Arithmetic,
}

impl TwisterXor {
    #[must_use]
    pub const fn new(seed: u32, arithmetic: Arithmetic) -> Self {
        Self { seed, arithmetic }
    }

    pub fn apply(&self, buf: &mut [u8]) {
        let mut rng = Twister::new(self.seed, self.arithmetic);
        xor_keyed_words(buf, || rng.next_u32());
    }
}
