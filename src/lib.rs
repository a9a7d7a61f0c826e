//! # Archive payload decoding
//!
//! `arcunpack` is a safe, pure-Rust collection of the decompressors,
//! delta reconstructors and stream obfuscations found inside game and
//! visual-novel archive formats. It works on whole in-memory entries: the
//! caller reads an entry's packed bytes and declared unpacked size from the
//! archive index, and gets back exactly that many bytes.
//!
//! ## Example
//!
//! ```rust
//! use arcunpack::{Codec, Session};
//!
//! // Three literals, a 5-byte copy from distance 2, a 4-byte fill, then end.
//! let packed = [0x03, 0xA0, 0xA1, 0xA2, 0xB0, 0x01, 0x41, 0xFF, 0x00];
//!
//! let mut session = Session::default();
//! let data = session.unpack(&Codec::Control, &packed, 16).expect("decoding failed");
//! assert_eq!(
//!     data,
//!     [0xA0, 0xA1, 0xA2, 0xA1, 0xA2, 0xA1, 0xA2, 0xA1, 0xFF, 0xFF, 0xFF, 0xFF, 0, 0, 0, 0]
//! );
//! ```
//!
//! Formats that stop early (an end token, or a tolerated end of input)
//! leave the rest of the output zeroed. Anything that would read or write
//! out of bounds is reported as a [`DecodeError`] and never panics.

#![no_std]
#![forbid(unsafe_code)]

extern crate alloc;

pub mod bits;
pub mod cipher;
pub mod codec;
pub mod control;
pub mod copy;
pub mod delta;
pub mod error;
pub mod flagged;
pub mod huffman;
pub mod lzss;
pub mod output;
pub mod prefix;
pub mod probe;
pub mod rle;
pub mod source;
pub mod token;

pub use bits::{BitCursor, Lsb, LsbCursor, Msb, MsbCursor, Refill};
pub use cipher::CipherKey;
pub use codec::{Codec, Decoded, EntryDecoder, Session};
pub use delta::{AlphaMode, AudioLayout, ImageLayout};
pub use error::{DecodeError, Result};
pub use flagged::FlaggedLayout;
pub use lzss::LzssParams;
pub use probe::{Plausibility, VariantState};
pub use rle::RunLayout;
