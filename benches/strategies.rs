use std::collections::BTreeMap;
use std::time::Instant;

use criterion::{black_box, criterion_group, criterion_main, Bencher, BenchmarkId, Criterion};

use simbench::strategy::MATRIX_REDUCE;
use simbench::{RandomSource, Registry, Simulation, SimulationParams};

fn criterion_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("sample_means");
    let registry = Registry::with_defaults();

    for replications in [100, 1_000, 10_000] {
        let params = SimulationParams::new(9, replications);
        for strategy in registry.list().iter().filter(|s| !s.is_anti_pattern()) {
            group.bench_with_input(BenchmarkId::new(strategy.name(), replications), &params, |b, params| {
                let mut source = black_box(RandomSource::from_seed(123));
                b.iter(|| {
                    source.restart();
                    let mut simulation = Simulation::new(&mut source, params);
                    black_box(strategy.invoke(&mut simulation))
                })
            });
        }
    }

    group.finish();
}

// The quadratic strategies only at sizes where they finish in reasonable time.
fn anti_pattern_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("anti_patterns");
    let registry = Registry::with_defaults();

    for replications in [100, 1_000] {
        let params = SimulationParams::new(9, replications);
        for strategy in registry.list() {
            group.bench_with_input(BenchmarkId::new(strategy.name(), replications), &params, |b, params| {
                let mut source = black_box(RandomSource::from_seed(123));
                b.iter(|| {
                    source.restart();
                    let mut simulation = Simulation::new(&mut source, params);
                    black_box(strategy.invoke(&mut simulation))
                })
            });
        }
    }

    group.finish();
}

// Fails the bench run when matrix-reduce stops being the fastest competitive strategy.
fn ranking_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("ranking");
    let registry = Registry::with_defaults();
    let params = SimulationParams::new(9, 1_000);

    let mut mean_ns: BTreeMap<&str, f64> = BTreeMap::new();
    for strategy in registry.list().iter().filter(|s| !s.is_anti_pattern()) {
        let mut total_ns: u128 = 0;
        let mut total_iters: u64 = 0;
        group.bench_function(BenchmarkId::new("check_ranking", strategy.name()), |b: &mut Bencher| {
            b.iter_custom(|iters| {
                let mut source = black_box(RandomSource::from_seed(123));
                let start = Instant::now();
                for _ in 0..iters {
                    source.restart();
                    let mut simulation = Simulation::new(&mut source, &params);
                    let _ = black_box(strategy.invoke(&mut simulation));
                }
                let elapsed = start.elapsed();
                total_ns += elapsed.as_nanos();
                total_iters += iters;
                elapsed
            });
        });
        mean_ns.insert(strategy.name(), total_ns as f64 / total_iters.max(1) as f64);
    }

    println!("\nMean ns per iteration: {mean_ns:?}");

    let matrix_ns = mean_ns[MATRIX_REDUCE];
    for (name, ns) in mean_ns.iter().filter(|(name, _)| **name != MATRIX_REDUCE) {
        assert!(
            matrix_ns < *ns,
            "Ranking regression detected! {MATRIX_REDUCE} took {matrix_ns:.0} ns, {name} took {ns:.0} ns"
        );
    }

    group.finish();
}

criterion_group!(benches, criterion_benchmark, anti_pattern_benchmark, ranking_benchmark);
criterion_main!(benches);
