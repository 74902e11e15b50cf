//! Benchmark – `jsonrelay::IncrementalReader`
#![allow(missing_docs)]

use std::time::Duration;

use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};
use jsonrelay::{CompletionPolicy, IncrementalReader, ReaderOptions, TreeDecoder};

/// A deterministic stream of `count` newline-separated event objects.
fn make_event_stream(count: usize) -> String {
    let mut s = String::new();
    for i in 0..count {
        s.push_str(&format!(
            "{{\"id\":{i},\"type\":\"delta\",\"text\":\"chunk {i} of \\u00e9vents\",\"scores\":[{i}.5,-1e3,true,null]}}\n"
        ));
    }
    s
}

/// Feeds `payload` in `parts` chunks and returns the number of values read.
fn run_reader(payload: &[u8], parts: usize, policy: CompletionPolicy) -> usize {
    let chunk_size = payload.len().div_ceil(parts).max(1);
    let reader = IncrementalReader::with_options(
        TreeDecoder,
        ReaderOptions {
            policy,
            ..Default::default()
        },
    );
    reader
        .read_all(payload.chunks(chunk_size))
        .expect("payload is valid")
        .len()
}

fn bench_streaming(c: &mut Criterion) {
    let payload = make_event_stream(500);
    let mut group = c.benchmark_group("incremental_reader_streaming");
    group.throughput(Throughput::Bytes(payload.len() as u64));

    for &parts in &[1usize, 100, 1_000, payload.len()] {
        group.bench_with_input(BenchmarkId::from_parameter(parts), &parts, |b, &parts| {
            b.iter(|| {
                let count = run_reader(black_box(payload.as_bytes()), parts, CompletionPolicy::Streaming);
                black_box(count);
            });
        });
    }
    group.finish();
}

fn bench_single_document(c: &mut Criterion) {
    let payload = format!("[{}]", make_event_stream(500).trim_end().replace('\n', ","));
    let mut group = c.benchmark_group("incremental_reader_single_document");
    group.throughput(Throughput::Bytes(payload.len() as u64));

    for &parts in &[1usize, 100, 1_000] {
        group.bench_with_input(BenchmarkId::from_parameter(parts), &parts, |b, &parts| {
            b.iter(|| {
                let count = run_reader(
                    black_box(payload.as_bytes()),
                    parts,
                    CompletionPolicy::SingleDocument,
                );
                black_box(count);
            });
        });
    }
    group.finish();
}

fn bench_many_small_values(c: &mut Criterion) {
    let mut group = c.benchmark_group("incremental_reader_small_values_one_chunk");

    for &count in &[10_000usize, 40_000, 160_000] {
        let payload = "[]".repeat(count);
        group.throughput(Throughput::Elements(count as u64));
        group.bench_with_input(BenchmarkId::from_parameter(count), &payload, |b, payload| {
            b.iter(|| {
                let count = run_reader(black_box(payload.as_bytes()), 1, CompletionPolicy::Streaming);
                black_box(count);
            });
        });
    }
    group.finish();
}

fn criterion() -> Criterion {
    let mut c = Criterion::default();
    if cfg!(feature = "bench-fast") {
        c = c
            .warm_up_time(Duration::from_millis(10))
            .measurement_time(Duration::from_millis(100))
            .sample_size(10);
    } else {
        c = c
            .warm_up_time(Duration::from_secs(3))
            .measurement_time(Duration::from_secs(5));
    }
    c
}

criterion_group! { name = benches; config = criterion(); targets = bench_streaming, bench_single_document, bench_many_small_values }
criterion_main!(benches);
