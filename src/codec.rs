//! Codec descriptors and the per-archive decoding session.
//!
//! An archive reader knows, from its own headers, which codec an entry uses
//! and how large the entry is once unpacked. It hands both to a [`Session`],
//! which owns the archive's key material and remembers which probed variant
//! worked last, so sibling entries start with the right guess.

use alloc::borrow::Cow;
use alloc::vec::Vec;

use log::{debug, trace};

use crate::bits::Refill;
use crate::cipher::CipherKey;
use crate::delta::{AudioLayout, ImageLayout};
use crate::error::{DecodeError, Result};
use crate::flagged::FlaggedLayout;
use crate::huffman::PrefixCode;
use crate::lzss::LzssParams;
use crate::probe::{Plausibility, VariantState};
use crate::rle::RunLayout;
use crate::source::ByteReader;
use crate::{control, delta, flagged, huffman, lzss, prefix, rle};

/// Every payload encoding the crate can undo.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Codec {
    /// The payload is the data.
    Stored,
    Lzss(LzssParams),
    Prefix(Refill),
    Control,
    Flagged(FlaggedLayout),
    /// Flagged LZ whose layout is not known up front.
    FlaggedProbed(Plausibility),
    Runs(RunLayout),
    /// Escape-byte RLE with the given marker.
    Marked(u8),
    /// Canonical Huffman over an LSB-first stream, table supplied by the
    /// archive header.
    Huffman(PrefixCode),
    /// Huffman with the tree stored at the front of the payload.
    HuffmanTree,
    DeltaImage(ImageLayout),
    DeltaAudio(AudioLayout),
}

/// A decoded entry and the variant state to carry to the next one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decoded {
    pub data: Vec<u8>,
    pub state: VariantState,
}

/// Decodes one entry payload.
pub trait EntryDecoder {
    /// Decodes `input` into exactly `unpacked_size` bytes.
    ///
    /// `state` is the hint left by the previous entry of the same archive.
    /// Decoders that do not probe return it unchanged.
    fn decode_entry(&self, input: &[u8], unpacked_size: usize, state: VariantState) -> Result<Decoded>;
}

fn check_layout_size(expected: usize, unpacked_size: usize) -> Result<()> {
    if expected == unpacked_size {
        Ok(())
    } else {
        Err(DecodeError::InvalidParameters(
            "layout does not match the declared entry size",
        ))
    }
}

impl EntryDecoder for Codec {
    fn decode_entry(&self, input: &[u8], unpacked_size: usize, state: VariantState) -> Result<Decoded> {
        trace!("decoding {} bytes as {:?}", input.len(), self);
        let data = match self {
            Self::Stored => ByteReader::new(input).bytes(unpacked_size)?.to_vec(),
            Self::Lzss(params) => lzss::decompress(input, unpacked_size, params)?.data,
            Self::Prefix(refill) => prefix::decompress(input, unpacked_size, *refill)?,
            Self::Control => control::decompress(input, unpacked_size)?,
            Self::Flagged(layout) => flagged::decompress(input, unpacked_size, *layout)?.data,
            Self::FlaggedProbed(plausibility) => {
                let probed = flagged::decompress_probed(input, unpacked_size, state, *plausibility)?;
                return Ok(Decoded {
                    data: probed.value.data,
                    state: probed.state,
                });
            }
            Self::Runs(layout) => rle::unpack_runs(input, unpacked_size, *layout)?.0,
            Self::Marked(marker) => rle::unpack_marked(input, unpacked_size, *marker)?,
            Self::Huffman(code) => huffman::decode_lsb_stream(input, code, unpacked_size)?,
            Self::HuffmanTree => huffman::decode_tree_stream(input, unpacked_size)?,
            Self::DeltaImage(layout) => {
                check_layout_size(layout.output_len()?, unpacked_size)?;
                delta::decode_image(input, layout)?
            }
            Self::DeltaAudio(layout) => {
                check_layout_size(layout.output_len()?, unpacked_size)?;
                delta::decode_samples(input, layout)?
            }
        };
        Ok(Decoded { data, state })
    }
}

/// Decoding context for the entries of one archive.
#[derive(Debug, Clone, Default)]
pub struct Session {
    state: VariantState,
    key: Option<CipherKey>,
}

impl Session {
    #[must_use]
    pub const fn new(key: Option<CipherKey>) -> Self {
        Self {
            state: VariantState::new(0),
            key,
        }
    }

    #[must_use]
    pub const fn state(&self) -> VariantState {
        self.state
    }

    #[must_use]
    pub const fn key(&self) -> Option<&CipherKey> {
        self.key.as_ref()
    }

    /// Decrypts (when the archive is keyed) and decodes one entry.
    ///
    /// `raw` is never modified. On failure the variant state is left as it
    /// was, so the next entry can still be decoded.
    pub fn unpack<D: EntryDecoder + ?Sized>(
        &mut self,
        decoder: &D,
        raw: &[u8],
        unpacked_size: usize,
    ) -> Result<Vec<u8>> {
        let input: Cow<'_, [u8]> = match &self.key {
            Some(key) => {
                let mut buf = raw.to_vec();
                key.decrypt(&mut buf);
                Cow::Owned(buf)
            }
            None => Cow::Borrowed(raw),
        };

        let decoded = decoder.decode_entry(&input, unpacked_size, self.state)?;
        if decoded.state != self.state {
            debug!(
                "variant preference moved from {} to {}",
                self.state.preferred(),
                decoded.state.preferred()
            );
        }
        self.state = decoded.state;
        Ok(decoded.data)
    }
}
