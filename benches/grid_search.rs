//! Benchmarks for SARIMA fitting and order selection.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use spend_forecast::config::GridSpec;
use spend_forecast::models::sarima::{GridSearch, SARIMA};

fn generate_increments(n: usize) -> Vec<f64> {
    (0..n)
        .map(|i| {
            let phase = 2.0 * std::f64::consts::PI * (i % 24) as f64 / 24.0;
            3.0 + 2.0 * phase.sin() + 0.3 * (i as f64 * 0.37).cos()
        })
        .collect()
}

fn bench_fallback_fit(c: &mut Criterion) {
    let mut group = c.benchmark_group("sarima_fit");

    for days in [3, 7, 14, 28].iter() {
        let values = generate_increments(days * 24);

        group.bench_with_input(BenchmarkId::new("fallback", days), days, |b, _| {
            b.iter(|| {
                let mut model = SARIMA::fallback();
                model.fit(black_box(&values)).unwrap();
                model.forecast(168, 0.95).unwrap()
            })
        });
    }

    group.finish();
}

fn bench_grid(c: &mut Criterion) {
    let mut group = c.benchmark_group("sarima_grid");
    group.sample_size(10);

    let values = generate_increments(7 * 24);
    for upper in [1, 2, 3].iter() {
        let search = GridSearch::new(GridSpec::from_upper_bound(*upper));
        group.bench_with_input(BenchmarkId::new("use_grid", upper), upper, |b, _| {
            b.iter(|| search.run(black_box(&values)).unwrap())
        });
    }

    group.finish();
}

criterion_group!(benches, bench_fallback_fit, bench_grid);
criterion_main!(benches);
