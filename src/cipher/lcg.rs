//! Linear-congruential key streams and the lane combiners built on them.

use super::lanes::{LaneWidth, add, map_lanes, sub};

/// `state = state * mul + add` over wrapping 32-bit arithmetic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LcgParams {
    pub mul: u32,
    pub add: u32,
}

impl LcgParams {
    /// The Microsoft C runtime `rand()` constants.
    pub const MSVC: Self = Self {
        mul: 0x0003_43FD,
        add: 0x0026_9EC3,
    };
    /// The ANSI C sample `rand()` constants.
    pub const ANSI_C: Self = Self {
        mul: 0x41C6_4E6D,
        add: 12345,
    };
}

#[derive(Debug, Clone)]
pub struct LcgStream {
    state: u32,
    params: LcgParams,
}

impl LcgStream {
    #[must_use]
    pub const fn new(seed: u32, params: LcgParams) -> Self {
        Self {
            state: seed,
            params,
        }
    }

    /// Steps the generator and returns the full new state.
    pub const fn next_u32(&mut self) -> u32 {
        self.state = self
            .state
            .wrapping_mul(self.params.mul)
            .wrapping_add(self.params.add);
        self.state
    }
}

/// How a key lane is folded into the data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Combine {
    #[default]
    Xor,
    /// Encryption adds the key lane-wise, decryption subtracts it.
    Add,
}

/// Combines each `lane`-sized chunk with one word of an LCG stream.
///
/// 8-byte lanes take two words, low word first. A trailing partial lane
/// is combined byte by byte with the low bytes of the next key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct KeyedLanes {
    pub seed: u32,
    pub params: LcgParams,
    pub lane: LaneWidth,
    pub combine: Combine,
}

impl KeyedLanes {
    #[must_use]
    pub const fn caramel_box(seed: u32) -> Self {
        Self {
            seed,
            params: LcgParams::MSVC,
            lane: LaneWidth::W4,
            combine: Combine::Add,
        }
    }

    pub fn encrypt(&self, buf: &mut [u8]) {
        match self.combine {
            Combine::Xor => self.run(buf, |v, k, _| v ^ k),
            Combine::Add => self.run(buf, add),
        }
    }

    pub fn decrypt(&self, buf: &mut [u8]) {
        match self.combine {
            Combine::Xor => self.run(buf, |v, k, _| v ^ k),
            Combine::Add => self.run(buf, sub),
        }
    }

    fn run(&self, buf: &mut [u8], op: impl Fn(u64, u64, LaneWidth) -> u64) {
        let mut keys = LcgStream::new(self.seed, self.params);
        let wide = self.lane == LaneWidth::W8;
        let key = move || {
            let lo = u64::from(keys.next_u32());
            if wide {
                lo | (u64::from(keys.next_u32()) << 32)
            } else {
                lo
            }
        };
        map_lanes(buf, self.lane, key, op);
    }
}
