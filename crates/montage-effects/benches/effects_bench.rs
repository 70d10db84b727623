//! Criterion benchmarks for the built-in effect kernels.
//!
//! Run with: `cargo bench -p montage-effects`
#![allow(missing_docs)]

use std::hint::black_box;
use std::sync::Arc;

use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use montage_core::{EffectNode, Frame, PluginCatalog};
use montage_effects::{FrameProbe, Invert, Mixer, SolidColor};

const SIZES: &[(u32, u32)] = &[(64, 36), (320, 180), (1280, 720)];

fn bench_kernels(c: &mut Criterion) {
    let mut group = c.benchmark_group("kernels");
    for &(w, h) in SIZES {
        let a = Frame::solid(w, h, 0x1020_30ff);
        let b = Frame::solid(w, h, 0xa0b0_c0ff);
        let mixer = Mixer::new(0.25);
        group.throughput(Throughput::Elements(u64::from(w * h)));
        group.bench_with_input(BenchmarkId::new("invert", w), &a, |bench, a| {
            bench.iter(|| Invert::apply(black_box(a)));
        });
        group.bench_with_input(BenchmarkId::new("mix", w), &(a, b), |bench, (a, b)| {
            bench.iter(|| mixer.blend(black_box(a), black_box(b)));
        });
    }
    group.finish();
}

fn bench_chain(c: &mut Criterion) {
    let mut group = c.benchmark_group("chain");
    for &(w, h) in SIZES {
        let probe = FrameProbe::new();
        let mut catalog = PluginCatalog::new();
        catalog
            .register("solid", "", move || SolidColor::new(w, h, 0))
            .unwrap();
        catalog.register("invert", "", || Invert).unwrap();
        catalog.register("probe", "", move || probe.clone()).unwrap();
        let root = EffectNode::new_root("bench", Arc::new(catalog));
        let src = root.create_child("solid", Some("src")).unwrap();
        let inv = root.create_child("invert", Some("inv")).unwrap();
        root.create_child("probe", Some("sink")).unwrap();
        src.connect_sibling("out", "inv", "in").unwrap();
        inv.connect_sibling("out", "sink", "in").unwrap();

        group.throughput(Throughput::Elements(u64::from(w * h)));
        group.bench_function(BenchmarkId::new("solid_invert_probe", w), |bench| {
            bench.iter(|| root.render());
        });
    }
    group.finish();
}

criterion_group!(benches, bench_kernels, bench_chain);
criterion_main!(benches);
