use arcunpack::cipher::{KeyedLanes, LaneCipher, LaneProgram};
use arcunpack::{Codec, EntryDecoder, LzssParams, RunLayout, VariantState};
use criterion::{Criterion, Throughput, criterion_group, criterion_main};
use std::hint::black_box;

/// Unpacked size of every benchmark entry.
const SIZE: usize = 64 * 1024;

/// Pseudo-random bytes from a fixed-seed LCG, so runs are reproducible.
fn generate_random(size: usize) -> Vec<u8> {
    let mut seed: u64 = 0xDEAD_BEEF;
    (0..size)
        .map(|_| {
            seed = (seed.wrapping_mul(1_664_525).wrapping_add(1_013_904_223)) & 0xFFFF_FFFF;
            (seed >> 24) as u8
        })
        .collect()
}

/// LZSS stream made only of literals: one flag byte per eight input bytes.
fn lzss_literals(plain: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(plain.len() + plain.len() / 8 + 1);
    for group in plain.chunks(8) {
        out.push(0xFF);
        out.extend_from_slice(group);
    }
    out
}

/// LZSS stream that repeats one 18-byte ring reference after a literal seed.
fn lzss_matches(size: usize) -> Vec<u8> {
    let mut out = vec![0xFF];
    out.extend_from_slice(b"The quic");
    // Remaining groups: eight references each, copying 18 bytes from 0xFEE.
    let refs = size.div_ceil(18);
    for group in 0..refs.div_ceil(8) {
        let n = (refs - group * 8).min(8);
        out.push(0x00);
        for _ in 0..n {
            out.extend_from_slice(&[0xEE, 0xFF]);
        }
    }
    out
}

/// Control-byte stream: literal runs for the first half, then long
/// back-references of up to 65 bytes from distance 64.
fn control_mixed(plain: &[u8]) -> Vec<u8> {
    let mut out = Vec::new();
    let mut written = 0;
    while written < plain.len() {
        let rem = plain.len() - written;
        if written < plain.len() / 2 || rem < 3 {
            let n = rem.min(63);
            out.push(n as u8);
            out.extend_from_slice(&plain[written..written + n]);
            written += n;
        } else {
            let n = rem.min(65);
            out.extend_from_slice(&[0xC0 | (n - 3) as u8, 63, 0]);
            written += n;
        }
    }
    out
}

/// PackBits stream alternating 128-byte runs and 128-byte literals.
fn packbits(plain: &[u8]) -> Vec<u8> {
    let mut out = Vec::new();
    for (i, chunk) in plain.chunks(128).enumerate() {
        if i % 2 == 0 {
            out.push((1 - chunk.len() as i16) as u8);
            out.push(chunk[0]);
        } else {
            out.push((chunk.len() - 1) as u8);
            out.extend_from_slice(chunk);
        }
    }
    out
}

/// Benchmarks each codec on a 64KB entry.
///
/// Throughput is measured against the unpacked size, i.e. the rate at which
/// entry data is restored.
fn bench_codecs(c: &mut Criterion) {
    let mut group = c.benchmark_group("Entry Decoding");
    let random = generate_random(SIZE);

    let scenarios = [
        ("LZSS Literals", Codec::Lzss(LzssParams::default()), lzss_literals(&random)),
        ("LZSS Matches", Codec::Lzss(LzssParams::default()), lzss_matches(SIZE)),
        ("Control Mixed", Codec::Control, control_mixed(&random)),
        ("PackBits", Codec::Runs(RunLayout::PackBits), packbits(&random)),
    ];

    for (name, codec, input) in &scenarios {
        group.throughput(Throughput::Bytes(SIZE as u64));
        group.bench_function(format!("{name} 64KB"), |b| {
            b.iter(|| {
                codec
                    .decode_entry(black_box(input), SIZE, VariantState::default())
                    .unwrap()
            });
        });
    }

    group.finish();
}

/// Benchmarks the obfuscation layers in place over a 64KB buffer.
fn bench_ciphers(c: &mut Criterion) {
    let mut group = c.benchmark_group("Stream Obfuscation");
    let mut buf = generate_random(SIZE);
    let lanes = KeyedLanes::caramel_box(0x1234_5678);
    let simd = LaneCipher::new(0x1234_5678, LaneProgram::NEKOPACK).unwrap();

    group.throughput(Throughput::Bytes(SIZE as u64));
    group.bench_function("CaramelBox 64KB", |b| {
        b.iter(|| lanes.decrypt(black_box(&mut buf)));
    });
    group.bench_function("Nekopack 64KB", |b| {
        b.iter(|| simd.decrypt(black_box(&mut buf)));
    });

    group.finish();
}

criterion_group!(benches, bench_codecs, bench_ciphers);
criterion_main!(benches);
