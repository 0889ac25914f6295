// Executor benchmarks for the adaptive quadrature engine and VEGAS
//
// Run with: cargo bench --bench executors

use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use quadrs::integrate::{
    AdaptiveQuadOptions, GaussKronrodAdaptiveQuadrature, ParallelExecutor, RuleOrder, Sequential,
    Threaded, VegasIntegrator, VegasOptions,
};

/// Oscillatory integrand that forces a few levels of refinement.
fn oscillatory(x: f64) -> f64 {
    (20.0 * x).sin() * (-x).exp() / (1.0 + x * x)
}

fn run_adaptive<E: ParallelExecutor>(executor: E, nbin: usize) -> f64 {
    let options = AdaptiveQuadOptions {
        tolerance: 1e-12,
        rule: RuleOrder::K21,
        nbin,
        ..Default::default()
    };
    let mut quad = GaussKronrodAdaptiveQuadrature::with_options(0.0, 10.0, options, executor)
        .expect("valid options");
    quad.integrate(oscillatory).value
}

// ============================================================================
// Adaptive quadrature
// ============================================================================

fn bench_adaptive(c: &mut Criterion) {
    let mut group = c.benchmark_group("gauss_kronrod_adaptive");

    for nbin in [10, 100, 1000] {
        group.bench_with_input(BenchmarkId::new("sequential", nbin), &nbin, |b, &n| {
            b.iter(|| run_adaptive(Sequential, black_box(n)));
        });
        group.bench_with_input(BenchmarkId::new("threaded", nbin), &nbin, |b, &n| {
            let executor = Threaded::new();
            b.iter(|| run_adaptive(executor.clone(), black_box(n)));
        });
    }

    group.finish();
}

// ============================================================================
// VEGAS
// ============================================================================

fn bench_vegas(c: &mut Criterion) {
    let mut group = c.benchmark_group("vegas");
    group.sample_size(20);

    let options = VegasOptions {
        calls: 50_000,
        iterations: 3,
        max_relative_error: 0.0,
        ..Default::default()
    };
    let f = |x: &[f64]| x.iter().map(|xi| (-(xi - 0.5).powi(2) * 50.0).exp()).product::<f64>();

    group.bench_function("sequential", |b| {
        b.iter(|| {
            let mut vegas =
                VegasIntegrator::new(vec![0.0; 4], vec![1.0; 4], options.clone(), Sequential)
                    .expect("valid options");
            black_box(vegas.integrate(f))
        });
    });
    group.bench_function("threaded", |b| {
        b.iter(|| {
            let mut vegas =
                VegasIntegrator::new(vec![0.0; 4], vec![1.0; 4], options.clone(), Threaded::new())
                    .expect("valid options");
            black_box(vegas.integrate(f))
        });
    });

    group.finish();
}

criterion_group!(benches, bench_adaptive, bench_vegas);
criterion_main!(benches);
