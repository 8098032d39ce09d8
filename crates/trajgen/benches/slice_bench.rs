//! Criterion benchmarks for corridor slicing.
//! Focus sizes: slice_times in {8, 64, 256} on a 6-box corridor.

use criterion::{criterion_group, criterion_main, BatchSize, BenchmarkId, Criterion};
use trajgen::api::{draw_corridor, slice_corridor, CorridorCfg, ReplayToken};

fn bench_slice(c: &mut Criterion) {
    let mut group = c.benchmark_group("slice_corridor");
    let cfg = CorridorCfg {
        segments: 6,
        ..CorridorCfg::default()
    };
    let base = draw_corridor(cfg, ReplayToken { seed: 9, index: 0 }).unwrap();
    let dirs = ['x', 'y', 'z', 'x', 'y', 'z'];
    for &k in &[8usize, 64, 256] {
        group.bench_with_input(BenchmarkId::from_parameter(k), &k, |b, &k| {
            b.iter_batched(
                || base.clone(),
                |mut p| {
                    let _dirs = slice_corridor(&mut p, &dirs, k).unwrap();
                },
                BatchSize::SmallInput,
            )
        });
    }
    group.finish();
}

criterion_group!(benches, bench_slice);
criterion_main!(benches);
