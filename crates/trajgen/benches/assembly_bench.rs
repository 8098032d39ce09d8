//! Criterion benchmarks for solver-input assembly.
//! Focus sizes: segments in {4, 16, 64}, order 5, both limits on.
//! Results: by default under target/criterion; to store under data/bench, run:
//!   CARGO_TARGET_DIR=data/bench cargo bench -p trajgen

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use nalgebra::DVector;
use trajgen::api::{
    construct_a_matrix, construct_p_matrix, draw_corridor, eval_nlp, gradient_from_a,
    AssemblyCfg, CorridorCfg, CostModel, NlpRequest, ReplayToken, TgProblem, Triangle,
};

fn problem(segments: usize) -> TgProblem {
    let cfg = CorridorCfg {
        segments,
        limit_velocity: true,
        limit_acceleration: true,
        ..CorridorCfg::default()
    };
    draw_corridor(cfg, ReplayToken { seed: 42, index: 0 }).unwrap()
}

fn bench_assembly(c: &mut Criterion) {
    let mut group = c.benchmark_group("assembly");
    for &s in &[4usize, 16, 64] {
        let p = problem(s);
        let times: Vec<f64> = p.corridor.iter().map(|b| b.t).collect();
        let coef = DVector::from_fn(p.n_var(), |i, _| (i as f64 * 0.1).sin());

        group.bench_with_input(BenchmarkId::new("p_matrix_lower", s), &p, |b, p| {
            b.iter(|| construct_p_matrix(&CostModel::of(p), &times, Triangle::Lower))
        });

        group.bench_with_input(BenchmarkId::new("a_matrix", s), &p, |b, p| {
            b.iter(|| construct_a_matrix(p))
        });

        let n_con = construct_a_matrix(&p).n_con;
        let lmdy = DVector::from_element(n_con, 0.1);
        let lmdz = DVector::from_element(p.n_var(), -0.1);
        group.bench_with_input(BenchmarkId::new("gradient_from_a", s), &p, |b, p| {
            b.iter(|| gradient_from_a(p, &coef, &lmdy, &lmdz, &AssemblyCfg::default()))
        });

        let x = DVector::from_iterator(
            coef.len() + times.len(),
            coef.iter().copied().chain(times.iter().copied()),
        );
        group.bench_with_input(BenchmarkId::new("eval_nlp", s), &p, |b, p| {
            b.iter(|| eval_nlp(p, &x, NlpRequest::default()))
        });
    }
    group.finish();
}

criterion_group!(benches, bench_assembly);
criterion_main!(benches);
