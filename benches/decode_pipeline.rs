//! Benchmarks for stream decoding.
//!
//! - `single_filter`: each built-in filter on its own
//! - `chained`: ASCII85 over Flate with a PNG predictor, through scratch buffers
//! - `scratch_policy`: the same chain under main-memory and temp-file policies

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use std::hint::black_box;

use pdf_cos::decoders::pipeline;
use pdf_cos::{Dictionary, FilterOptions, FilterRegistry, MemoryUsageSetting, Object, ScratchFile, Stream};

const SIZES: [usize; 3] = [4 * 1024, 64 * 1024, 1024 * 1024];

/// Repeating pattern (compresses well).
fn pattern_bytes(size: usize) -> Vec<u8> {
    (0..size).map(|i| (i % 251) as u8).collect()
}

/// Pseudo-random bytes (compress badly); fixed seed for reproducibility.
fn random_bytes(size: usize) -> Vec<u8> {
    let mut seed: u64 = 42;
    (0..size)
        .map(|_| {
            seed = seed.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
            (seed >> 33) as u8
        })
        .collect()
}

fn stream_dict(filter: Object, params: Object) -> Dictionary {
    let mut dict = Dictionary::new();
    dict.set("Filter", filter);
    dict.set("DecodeParms", params);
    dict
}

fn bench_single_filter(c: &mut Criterion) {
    let mut group = c.benchmark_group("single_filter");
    let options = FilterOptions::default();

    for name in ["FlateDecode", "LZWDecode", "ASCIIHexDecode", "ASCII85Decode", "RunLengthDecode"] {
        for size in SIZES {
            let dict = stream_dict(Object::name(name), Object::Null);
            let filters = pipeline::resolve_filters(FilterRegistry::global(), dict.get_item("Filter"))
                .expect("built-in filter");
            let data = pattern_bytes(size);
            let encoded = pipeline::encode(&filters, &dict, &data, &options).expect("encode");

            group.throughput(Throughput::Bytes(size as u64));
            group.bench_with_input(BenchmarkId::new(name, size), &encoded, |b, encoded| {
                b.iter(|| {
                    let decoded = pipeline::decode(
                        &filters,
                        &dict,
                        Box::new(std::io::Cursor::new(encoded.clone())),
                        None,
                        &options,
                    )
                    .and_then(|d| d.into_bytes())
                    .expect("decode");
                    black_box(decoded)
                })
            });
        }
    }
    group.finish();
}

fn bench_chained(c: &mut Criterion) {
    let mut group = c.benchmark_group("chained");

    for size in SIZES {
        let stream = Stream::new();
        let mut predictor = Dictionary::new();
        predictor.set_int("Predictor", 12);
        predictor.set_int("Columns", 64);
        stream.set(
            "DecodeParms",
            pdf_cos::Array::from(vec![Object::Null, Object::from(predictor)]),
        );
        let filters =
            pdf_cos::Array::from(vec![Object::name("ASCII85Decode"), Object::name("FlateDecode")]);
        stream.set_data(&random_bytes(size), filters).expect("encode");

        group.throughput(Throughput::Bytes(size as u64));
        group.bench_function(BenchmarkId::new("a85_flate_png", size), |b| {
            b.iter(|| black_box(stream.to_decoded_bytes().expect("decode")))
        });
        stream.close().expect("close");
    }
    group.finish();
}

fn bench_scratch_policy(c: &mut Criterion) {
    let mut group = c.benchmark_group("scratch_policy");
    let size = 1024 * 1024;
    let data = pattern_bytes(size);

    let policies = [
        ("main_memory", MemoryUsageSetting::main_memory_only()),
        ("temp_file", MemoryUsageSetting::temp_file_only()),
        ("mixed_64k", MemoryUsageSetting::mixed(64 * 1024)),
    ];
    for (label, setting) in policies {
        let scratch = ScratchFile::new(setting).expect("scratch file");
        let stream = Stream::with_scratch_file(scratch.clone());
        stream.set_data(&data, Object::name("FlateDecode")).expect("encode");

        group.throughput(Throughput::Bytes(size as u64));
        group.bench_function(label, |b| {
            b.iter(|| black_box(stream.to_decoded_bytes().expect("decode")))
        });
        stream.close().expect("close");
        scratch.close().expect("close");
    }
    group.finish();
}

criterion_group!(benches, bench_single_filter, bench_chained, bench_scratch_policy);
criterion_main!(benches);
