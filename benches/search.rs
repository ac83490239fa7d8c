//! Benchmarks for the placement core.

use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use criterion::{black_box, criterion_group, criterion_main, Criterion};

use plater::bitmap::Bitmap;
use plater::request::RequestBuilder;
use plater::SearchEngine;

/// Benchmark rotating a mid-sized bitmap by a non-axis-aligned angle.
fn bench_rotate(c: &mut Criterion) {
    let bmp = Bitmap::filled(200, 120);
    c.bench_function("bitmap_rotate", |b| b.iter(|| black_box(&bmp).rotate(black_box(0.37))));
}

/// Benchmark overlap testing between a plate-sized bitmap and a part bitmap.
fn bench_overlaps(c: &mut Criterion) {
    let plate = Bitmap::empty(300, 300);
    let part = Bitmap::filled(40, 40);
    c.bench_function("bitmap_overlaps", |b| {
        b.iter(|| black_box(&plate).overlaps(black_box(&part), 100, 100))
    });
}

/// Benchmark a full small-request search: ten parts, the default
/// multi-strategy sweep.
fn bench_search_run(c: &mut Criterion) {
    c.bench_function("search_engine_run_ten_parts", |b| {
        b.iter(|| {
            let request = Arc::new(
                RequestBuilder::default()
                    .nb_threads(4)
                    .random_iterations(1)
                    .build_from_reader("20000x20000.synth 10\n".as_bytes())
                    .unwrap(),
            );
            let engine = SearchEngine::new(request);
            black_box(engine.run(Arc::new(AtomicBool::new(false))))
        })
    });
}

criterion_group!(benches, bench_rotate, bench_overlaps, bench_search_run);
criterion_main!(benches);
