use arcunpack::cipher::{CipherKey, KeyedLanes, LaneCipher, LaneProgram, LaneWidth, add, sub};
use arcunpack::copy::overlap_copy;
use arcunpack::{
    Codec, DecodeError, EntryDecoder, FlaggedLayout, LsbCursor, LzssParams, MsbCursor,
    Plausibility, Refill, RunLayout, VariantState,
};
use proptest::prelude::*;

/// Bit `i` of `data` when `refill`-sized little-endian words are consumed
/// from the top bit down.
fn msb_bit(data: &[u8], refill: Refill, i: usize) -> u32 {
    let word_bits = refill.bits() as usize;
    let bit = word_bits - 1 - i % word_bits;
    word_bit(data, refill, i / word_bits, bit)
}

/// Bit `i` of `data` when `refill`-sized little-endian words are consumed
/// from bit 0 up.
fn lsb_bit(data: &[u8], refill: Refill, i: usize) -> u32 {
    let word_bits = refill.bits() as usize;
    word_bit(data, refill, i / word_bits, i % word_bits)
}

/// Bit `bit` of word `word`, reading missing bytes as zero.
fn word_bit(data: &[u8], refill: Refill, word: usize, bit: usize) -> u32 {
    data.get(word * refill.bytes() + bit / 8)
        .map_or(0, |b| u32::from(b >> (bit % 8)) & 1)
}

fn any_refill() -> impl Strategy<Value = Refill> {
    prop_oneof![Just(Refill::Byte), Just(Refill::Word16), Just(Refill::Word32)]
}

fn byte_stream_codecs() -> Vec<Codec> {
    vec![
        Codec::Stored,
        Codec::Control,
        Codec::Prefix(Refill::Byte),
        Codec::Prefix(Refill::Word32),
        Codec::Lzss(LzssParams::default()),
        Codec::Flagged(FlaggedLayout::OffsetHigh),
        Codec::FlaggedProbed(Plausibility::Loose),
        Codec::Runs(RunLayout::PackBits),
        Codec::Runs(RunLayout::HighBitRun),
        Codec::Marked(0x90),
        Codec::HuffmanTree,
    ]
}

proptest! {
    /// Any split of a read into widths yields the same bits as reading one
    /// bit at a time, for every refill width.
    #[test]
    fn msb_reads_splice(data in prop::collection::vec(any::<u8>(), 0..24),
                        refill in any_refill(),
                        widths in prop::collection::vec(0u32..=32, 0..12)) {
        let mut cursor = MsbCursor::with_refill(&data, refill);
        let mut at = 0usize;
        for n in widths {
            let expected = (0..n as usize).fold(0u32, |acc, j| {
                (acc << 1) | msb_bit(&data, refill, at + j)
            });
            prop_assert_eq!(cursor.take(n), expected);
            at += n as usize;
        }
        prop_assert_eq!(cursor.bits_consumed(), at as u64);
    }

    #[test]
    fn lsb_reads_splice(data in prop::collection::vec(any::<u8>(), 0..24),
                        refill in any_refill(),
                        widths in prop::collection::vec(0u32..=32, 0..12)) {
        let mut cursor = LsbCursor::with_refill(&data, refill);
        let mut at = 0usize;
        for n in widths {
            let expected = (0..n as usize).fold(0u32, |acc, j| {
                acc | (lsb_bit(&data, refill, at + j) << j)
            });
            prop_assert_eq!(cursor.take(n), expected);
            at += n as usize;
        }
        prop_assert_eq!(cursor.bits_consumed(), at as u64);
    }

    /// Checked reads fail exactly when a returned bit lies past the source,
    /// wherever a short final word places its padding.
    #[test]
    fn checked_reads_stop_at_real_end(data in prop::collection::vec(any::<u8>(), 0..12),
                                      refill in any_refill(),
                                      widths in prop::collection::vec(1u32..=32, 0..8)) {
        let word_bits = refill.bits() as usize;
        let real = |i: usize| {
            let bit = word_bits - 1 - i % word_bits;
            (i / word_bits) * refill.bytes() + bit / 8 < data.len()
        };
        let mut cursor = MsbCursor::with_refill(&data, refill);
        let mut at = 0usize;
        for n in widths {
            let all_real = (at..at + n as usize).all(real);
            let got = cursor.take_checked(n);
            if all_real {
                prop_assert!(got.is_ok());
            } else {
                prop_assert_eq!(got, Err(DecodeError::TruncatedInput));
                break;
            }
            at += n as usize;
        }
    }

    /// Overlapping copies behave exactly like a forward byte loop.
    #[test]
    fn overlap_copy_matches_byte_loop(mut buf in prop::collection::vec(any::<u8>(), 2..64),
                                      from in any::<usize>(), gap in any::<usize>(),
                                      len in any::<usize>()) {
        let from = from % (buf.len() - 1);
        let to = from + 1 + gap % (buf.len() - 1 - from);
        let len = len % (buf.len() - to + 1);
        let mut expected = buf.clone();
        for i in 0..len {
            expected[to + i] = expected[from + i];
        }
        prop_assert!(overlap_copy(&mut buf, from, to, len).is_ok());
        prop_assert_eq!(buf, expected);
    }

    /// Packed lane arithmetic is invertible for every lane width.
    #[test]
    fn lane_add_sub_invert(a in any::<u64>(), b in any::<u64>()) {
        for lane in [LaneWidth::W1, LaneWidth::W2, LaneWidth::W4, LaneWidth::W8] {
            prop_assert_eq!(sub(add(a, b, lane), b, lane), a);
        }
    }

    /// Decoders return (successfully or not) on arbitrary input and always
    /// produce the declared size when they succeed.
    #[test]
    fn arbitrary_input_never_panics(data in prop::collection::vec(any::<u8>(), 0..96),
                                    size in 0usize..256) {
        for codec in byte_stream_codecs() {
            if let Ok(decoded) = codec.decode_entry(&data, size, VariantState::default()) {
                prop_assert_eq!(decoded.data.len(), size);
            }
        }
    }

    /// Obfuscation schemes round-trip for any seed and length.
    #[test]
    fn ciphers_round_trip(seed in any::<u32>(), data in prop::collection::vec(any::<u8>(), 0..80)) {
        let keys = [
            CipherKey::Lanes(KeyedLanes::caramel_box(seed)),
            CipherKey::Simd(LaneCipher::new(seed, LaneProgram::NEKOPACK).unwrap()),
        ];
        for key in &keys {
            let mut buf = data.clone();
            key.encrypt(&mut buf);
            key.decrypt(&mut buf);
            prop_assert_eq!(&buf, &data);
        }
    }
}
