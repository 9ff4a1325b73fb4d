//! Performance benchmarks for oxipack-codec
//!
//! This benchmark suite evaluates, for every strategy:
//! - Compression speed (throughput in values)
//! - Random access through `get`
//! - Full decompression
//! - Container serialization

use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use oxipack_codec::{BitPacker, StrategyKind, factory};
use std::hint::black_box;

/// Type alias for pattern generator functions
type PatternGenerator = fn(usize) -> Vec<i32>;

/// Generate test data patterns for benchmarking
mod test_data {
    fn lcg(seed: &mut u64) -> u32 {
        *seed = seed.wrapping_mul(6364136223846793005).wrapping_add(1);
        (*seed >> 32) as u32
    }

    /// Small uniform range (10-bit values)
    pub fn small_range(size: usize) -> Vec<i32> {
        let mut seed: u64 = 0x123456789ABCDEF0;
        (0..size).map(|_| (lcg(&mut seed) % 1000) as i32).collect()
    }

    /// Signed values around zero
    pub fn signed(size: usize) -> Vec<i32> {
        let mut seed: u64 = 0x0F0E_0D0C_0B0A_0908;
        (0..size)
            .map(|_| (lcg(&mut seed) % 2001) as i32 - 1000)
            .collect()
    }

    /// Small range with 1% large outliers
    pub fn outliers(size: usize) -> Vec<i32> {
        let mut seed: u64 = 0xDEAD_BEEF_CAFE_F00D;
        (0..size)
            .map(|i| {
                let v = (lcg(&mut seed) % 1000) as i32;
                if i % 100 == 0 { v + 1_000_000 } else { v }
            })
            .collect()
    }

    /// Full 32-bit range (worst case)
    pub fn full_range(size: usize) -> Vec<i32> {
        let mut seed: u64 = 0x1357_9BDF_2468_ACE0;
        (0..size).map(|_| lcg(&mut seed) as i32).collect()
    }
}

const SIZE: usize = 1 << 16;

const PATTERNS: [(&str, PatternGenerator); 4] = [
    ("small_range", test_data::small_range as PatternGenerator),
    ("signed", test_data::signed as PatternGenerator),
    ("outliers", test_data::outliers as PatternGenerator),
    ("full_range", test_data::full_range as PatternGenerator),
];

fn packed(kind: StrategyKind, data: &[i32]) -> Box<dyn BitPacker> {
    let mut packer = factory::create(kind.name()).unwrap();
    packer.compress(data).unwrap();
    packer
}

/// Benchmark compression speed per strategy and pattern
fn bench_compress(c: &mut Criterion) {
    let mut group = c.benchmark_group("compress");
    group.throughput(Throughput::Elements(SIZE as u64));

    for (pattern_name, generator) in PATTERNS {
        let data = generator(SIZE);
        for kind in StrategyKind::ALL {
            let id = format!("{}/{}", kind, pattern_name);
            let mut packer = factory::create(kind.name()).unwrap();
            group.bench_with_input(BenchmarkId::from_parameter(&id), &data, |b, data| {
                b.iter(|| {
                    let words = packer.compress(black_box(data)).unwrap();
                    black_box(words.len());
                });
            });
        }
    }

    group.finish();
}

/// Benchmark random access
fn bench_get(c: &mut Criterion) {
    let mut group = c.benchmark_group("get");
    group.throughput(Throughput::Elements(1024));

    for (pattern_name, generator) in PATTERNS {
        let data = generator(SIZE);
        for kind in StrategyKind::ALL {
            let id = format!("{}/{}", kind, pattern_name);
            let packer = packed(kind, &data);
            group.bench_function(BenchmarkId::from_parameter(&id), |b| {
                b.iter(|| {
                    let mut sum = 0i64;
                    // Stride through the buffer to defeat prefetching.
                    for i in 0..1024 {
                        let index = (i * 7919) % SIZE;
                        sum += i64::from(packer.get(black_box(index)).unwrap());
                    }
                    black_box(sum);
                });
            });
        }
    }

    group.finish();
}

/// Benchmark full decompression
fn bench_decompress(c: &mut Criterion) {
    let mut group = c.benchmark_group("decompress");
    group.throughput(Throughput::Elements(SIZE as u64));

    for (pattern_name, generator) in PATTERNS {
        let data = generator(SIZE);
        for kind in StrategyKind::ALL {
            let id = format!("{}/{}", kind, pattern_name);
            let packer = packed(kind, &data);
            group.bench_function(BenchmarkId::from_parameter(&id), |b| {
                b.iter(|| black_box(packer.decompress().unwrap()));
            });
        }
    }

    group.finish();
}

/// Benchmark container serialization and restore
fn bench_container(c: &mut Criterion) {
    let mut group = c.benchmark_group("container");
    group.sample_size(20);

    let data = test_data::outliers(SIZE);
    for kind in StrategyKind::ALL {
        let bytes = packed(kind, &data).to_block().unwrap().to_bytes().unwrap();
        group.throughput(Throughput::Bytes(bytes.len() as u64));
        group.bench_with_input(BenchmarkId::from_parameter(kind), &bytes, |b, bytes| {
            b.iter(|| black_box(factory::from_bytes(black_box(bytes)).unwrap()));
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_compress,
    bench_get,
    bench_decompress,
    bench_container
);
criterion_main!(benches);
