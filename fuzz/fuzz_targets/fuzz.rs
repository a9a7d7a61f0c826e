#![no_main]

use arcunpack::cipher::{Arithmetic, CipherKey, KeyedLanes, LaneCipher, LaneProgram, TwisterXor};
use arcunpack::{
    AlphaMode, AudioLayout, Codec, EntryDecoder, FlaggedLayout, ImageLayout, LzssParams,
    Plausibility, Refill, RunLayout, VariantState,
};
use libfuzzer_sys::fuzz_target;

/// Splits a fuzz case into a declared size, a selector byte and a payload.
fn split(data: &[u8]) -> Option<(usize, u8, &[u8])> {
    let (head, payload) = data.split_first_chunk::<3>()?;
    let size = usize::from(u16::from_le_bytes([head[0], head[1]]));
    Some((size, head[2], payload))
}

fn codecs(selector: u8) -> Vec<Codec> {
    let side = usize::from(selector & 0x0F) + 1;
    vec![
        Codec::Stored,
        Codec::Lzss(LzssParams::default()),
        Codec::Prefix(Refill::Byte),
        Codec::Prefix(Refill::Word16),
        Codec::Control,
        Codec::Flagged(FlaggedLayout::OffsetHigh),
        Codec::FlaggedProbed(Plausibility::Loose),
        Codec::Runs(RunLayout::PackBits),
        Codec::Marked(selector),
        Codec::HuffmanTree,
        Codec::DeltaImage(ImageLayout {
            width: side,
            height: side,
            channels: 4,
            bottom_up: selector & 0x10 != 0,
            alpha: if selector & 0x20 != 0 {
                AlphaMode::SeparateRuns
            } else {
                AlphaMode::Interleaved
            },
            reference: selector,
        }),
        Codec::DeltaAudio(AudioLayout {
            samples: side * 8,
            channels: 2,
            shift: u32::from(selector >> 4),
        }),
    ]
}

/// Every decoder must return `Ok` or `Err` on arbitrary input, never panic,
/// and a successful decode always has the declared length.
fn verify_decoder_robustness(size: usize, selector: u8, payload: &[u8]) {
    for codec in codecs(selector) {
        let size = match &codec {
            Codec::DeltaImage(layout) => layout.output_len().unwrap_or(0),
            Codec::DeltaAudio(layout) => layout.output_len().unwrap_or(0),
            _ => size,
        };
        if let Ok(decoded) = codec.decode_entry(payload, size, VariantState::new(usize::from(selector)))
        {
            assert_eq!(decoded.data.len(), size, "{codec:?} returned the wrong length");
        }
    }
}

/// `decrypt(encrypt(data)) == data` for every obfuscation scheme.
fn verify_cipher_round_trip(seed: u32, payload: &[u8]) {
    let mut keys = vec![
        CipherKey::Lanes(KeyedLanes::caramel_box(seed)),
        CipherKey::Twister(TwisterXor::new(seed, Arithmetic::Signed)),
    ];
    if let Ok(simd) = LaneCipher::new(seed, LaneProgram::NEKOPACK) {
        keys.push(CipherKey::Simd(simd));
    }
    for key in &keys {
        let mut buf = payload.to_vec();
        key.encrypt(&mut buf);
        key.decrypt(&mut buf);
        assert_eq!(buf, payload, "{key:?} did not round-trip");
    }
}

fuzz_target!(|data: &[u8]| {
    let Some((size, selector, payload)) = split(data) else {
        return;
    };

    // 1. Robustness: malformed payloads must be rejected, not crash.
    verify_decoder_robustness(size, selector, payload);

    // 2. Correctness: obfuscation must be lossless.
    let seed = u32::from_le_bytes([data[0], data[1], data[2], selector]);
    verify_cipher_round_trip(seed, payload);
});
