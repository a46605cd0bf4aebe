use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use ndarray::{Array1, Array2};
use rand::prelude::*;
use rand_chacha::ChaCha8Rng;
use regression_pipeline::config::CandidateSpec;
use regression_pipeline::training::{build_estimator, ModelSelector, Regressor};

fn create_regression_data(n_rows: usize, n_features: usize) -> (Vec<String>, Array2<f64>, Array1<f64>) {
    let mut rng = ChaCha8Rng::seed_from_u64(0);

    let x = Array2::from_shape_fn((n_rows, n_features), |_| rng.gen::<f64>() * 10.0);
    // Target as sum of features + noise
    let y = x.rows().into_iter().map(|row| row.sum() + rng.gen::<f64>() * 0.1).collect();
    let names = (0..n_features).map(|i| format!("num__feature_{}", i)).collect();

    (names, x, y)
}

fn candidate(name: &str, model_type: &str, params: &str) -> CandidateSpec {
    CandidateSpec {
        name: name.to_string(),
        model_type: model_type.to_string(),
        params: serde_yaml::from_str(params).unwrap(),
    }
}

fn bench_fit(c: &mut Criterion) {
    let mut group = c.benchmark_group("fit");
    group.sample_size(10); // Fewer samples for training benchmarks

    let models = [
        ("linear_regression", "{}"),
        ("random_forest", "{n_estimators: 20, max_depth: 8}"),
        ("gradient_boosting", "{n_estimators: 50}"),
    ];

    for n_rows in [1000, 5000].iter() {
        let (_, x, y) = create_regression_data(*n_rows, 10);

        for (model_type, params) in &models {
            let params = serde_yaml::from_str(params).unwrap();
            group.bench_with_input(BenchmarkId::new(*model_type, n_rows), &(&x, &y), |b, (x, y)| {
                b.iter(|| {
                    let (_, mut estimator) = build_estimator(model_type, &params, 42).unwrap();
                    estimator.fit(black_box(x), black_box(y)).unwrap();
                })
            });
        }
    }

    group.finish();
}

fn bench_selection(c: &mut Criterion) {
    let mut group = c.benchmark_group("selection");
    group.sample_size(10);

    let (names, x, y) = create_regression_data(2000, 10);
    let specs = vec![
        candidate("linear_regression", "linear_regression", "{}"),
        candidate("random_forest", "random_forest", "{n_estimators: 10}"),
        candidate("gradient_boosting", "gradient_boosting", "{n_estimators: 30}"),
    ];

    group.bench_function("three_candidates", |b| {
        b.iter(|| {
            let selector = ModelSelector::from_specs(&specs, 42).unwrap();
            selector.select(&names, black_box(&x), black_box(&y)).unwrap()
        })
    });

    group.finish();
}

criterion_group!(benches, bench_fit, bench_selection);
criterion_main!(benches);
