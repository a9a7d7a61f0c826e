//! Prefix-code token decoders.
//!
//! [`PrefixCode`] is a canonical code built from a table of code lengths.
//! [`HuffmanTree`] is the other common shape: the tree itself is serialised
//! at the start of the entry, one bit per node.
//!
//! Both are immutable once built and can be shared between threads decoding
//! different entries of the same archive.

use alloc::vec;
use alloc::vec::Vec;

use log::trace;

use crate::bits::{BitCursor, BitOrder, LsbCursor, MsbCursor};
use crate::error::{DecodeError, Result};

/// Longest code length a [`PrefixCode`] accepts.
pub const MAX_CODE_LENGTH: usize = 16;

/// Node limit of an in-stream tree: 256 leaves and 255 branches.
const MAX_TREE_NODES: usize = 511;

/// A canonical prefix code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrefixCode {
    /// Number of codes of each length, index 0 unused.
    counts: [u16; MAX_CODE_LENGTH + 1],
    /// Symbols ordered by (code length, symbol value).
    symbols: Vec<u16>,
    /// Longest length in use; no code is longer.
    max_len: usize,
}

impl PrefixCode {
    /// Builds the canonical code for `lengths`, where `lengths[s]` is the code
    /// length of symbol `s` and 0 means the symbol is unused.
    ///
    /// Incomplete codes are allowed; over-subscribed ones are not.
    pub fn from_lengths(lengths: &[u8]) -> Result<Self> {
        if lengths.len() > usize::from(u16::MAX) {
            return Err(DecodeError::InvalidParameters("too many prefix-code symbols"));
        }

        let mut counts = [0u16; MAX_CODE_LENGTH + 1];
        for &len in lengths {
            let len = usize::from(len);
            if len > MAX_CODE_LENGTH {
                return Err(DecodeError::InvalidParameters("prefix-code length above 16"));
            }
            counts[len] += 1;
        }
        counts[0] = 0;

        let mut left: i64 = 1;
        for &count in &counts[1..] {
            left = (left << 1) - i64::from(count);
            if left < 0 {
                return Err(DecodeError::InvalidParameters("over-subscribed prefix code"));
            }
        }

        let mut offsets = [0usize; MAX_CODE_LENGTH + 2];
        for len in 1..=MAX_CODE_LENGTH {
            offsets[len + 1] = offsets[len] + usize::from(counts[len]);
        }
        let mut symbols = vec![0u16; offsets[MAX_CODE_LENGTH + 1]];
        for (symbol, &len) in lengths.iter().enumerate() {
            if len != 0 {
                let slot = &mut offsets[usize::from(len)];
                symbols[*slot] = symbol as u16;
                *slot += 1;
            }
        }

        let max_len = (1..=MAX_CODE_LENGTH)
            .rev()
            .find(|&len| counts[len] != 0)
            .unwrap_or(0);

        Ok(Self {
            counts,
            symbols,
            max_len,
        })
    }

    /// Number of symbols that have a code.
    #[must_use]
    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    /// Reads one symbol, one bit at a time.
    pub fn decode<O: BitOrder>(&self, bits: &mut BitCursor<'_, O>) -> Result<u16> {
        let start = bits.bits_consumed();
        let mut code: i64 = 0;
        let mut first: i64 = 0;
        let mut index: i64 = 0;
        for &count in &self.counts[1..=self.max_len] {
            code |= i64::from(bits.take_checked(1)?);
            let count = i64::from(count);
            if code - first < count {
                return Ok(self.symbols[(index + code - first) as usize]);
            }
            index += count;
            first = (first + count) << 1;
            code <<= 1;
        }
        Err(DecodeError::UnrecognizedControlCode {
            code: (code >> 1) as u32,
            position: (start / 8) as usize,
        })
    }
}

/// Decodes `unpacked_size` byte symbols from an LSB-first stream with a
/// code table supplied by the format.
pub fn decode_lsb_stream(input: &[u8], code: &PrefixCode, unpacked_size: usize) -> Result<Vec<u8>> {
    let mut bits = LsbCursor::new(input);
    let mut out = Vec::with_capacity(unpacked_size);
    while out.len() < unpacked_size {
        let at = bits.byte_position();
        let symbol = code.decode(&mut bits)?;
        let b = u8::try_from(symbol).map_err(|_| DecodeError::UnrecognizedControlCode {
            code: u32::from(symbol),
            position: at,
        })?;
        out.push(b);
    }
    Ok(out)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Node {
    Leaf(u8),
    Branch(u16, u16),
}

/// A binary code tree serialised in the stream.
///
/// Pre-order: bit 1 is a branch followed by its left then right subtree,
/// bit 0 is a leaf followed by its 8-bit symbol.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HuffmanTree {
    nodes: Vec<Node>,
}

impl HuffmanTree {
    pub fn read(bits: &mut MsbCursor<'_>) -> Result<Self> {
        let mut tree = Self { nodes: Vec::new() };
        tree.read_node(bits)?;
        trace!("huffman tree: {} nodes", tree.nodes.len());
        Ok(tree)
    }

    fn read_node(&mut self, bits: &mut MsbCursor<'_>) -> Result<u16> {
        if self.nodes.len() >= MAX_TREE_NODES {
            return Err(DecodeError::UnrecognizedControlCode {
                code: 1,
                position: bits.byte_position(),
            });
        }
        let idx = self.nodes.len();
        if bits.take_bit_checked()? {
            self.nodes.push(Node::Branch(0, 0));
            let left = self.read_node(bits)?;
            let right = self.read_node(bits)?;
            self.nodes[idx] = Node::Branch(left, right);
        } else {
            let symbol = bits.take_checked(8)? as u8;
            self.nodes.push(Node::Leaf(symbol));
        }
        Ok(idx as u16)
    }

    /// Walks from the root to a leaf. A single-leaf tree consumes no bits.
    pub fn decode(&self, bits: &mut MsbCursor<'_>) -> Result<u8> {
        let mut idx = 0usize;
        loop {
            match self.nodes.get(idx) {
                Some(Node::Leaf(symbol)) => return Ok(*symbol),
                Some(Node::Branch(left, right)) => {
                    idx = usize::from(if bits.take_bit_checked()? { *right } else { *left });
                }
                None => return Err(DecodeError::bounds(idx, 1, self.nodes.len())),
            }
        }
    }
}

/// Reads an in-stream tree, then decodes symbols until `unpacked_size`
/// bytes have been produced.
pub fn decode_tree_stream(input: &[u8], unpacked_size: usize) -> Result<Vec<u8>> {
    let mut bits = MsbCursor::new(input);
    let tree = HuffmanTree::read(&mut bits)?;
    let mut out = Vec::with_capacity(unpacked_size);
    while out.len() < unpacked_size {
        out.push(tree.decode(&mut bits)?);
    }
    Ok(out)
}
