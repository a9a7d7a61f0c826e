//! Stream obfuscation layers applied to entry payloads before decoding.
//!
//! Every key here is immutable material: the key stream is re-derived from
//! the seed on each call, so one key can decrypt many entries, in any order
//! and from any thread.

mod lanes;
mod lcg;
mod twister;

pub use lanes::{LaneCipher, LaneOp, LaneProgram, LaneWidth, REGISTERS, add, sub};
pub use lcg::{Combine, KeyedLanes, LcgParams, LcgStream};
pub use twister::{Arithmetic, Twister, TwisterXor};

/// Per-archive key material.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CipherKey {
    Lanes(KeyedLanes),
    Twister(TwisterXor),
    Simd(LaneCipher),
}

impl CipherKey {
    pub fn decrypt(&self, buf: &mut [u8]) {
        match self {
            Self::Lanes(k) => k.decrypt(buf),
            Self::Twister(k) => k.apply(buf),
            Self::Simd(k) => k.decrypt(buf),
        }
    }

    pub fn encrypt(&self, buf: &mut [u8]) {
        match self {
            Self::Lanes(k) => k.encrypt(buf),
            Self::Twister(k) => k.apply(buf),
            Self::Simd(k) => k.encrypt(buf),
        }
    }
}
