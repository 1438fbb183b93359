use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use earthfit::{
    display::render_flat,
    engine::{Earth, RegressionEngine},
    export::{export_code, CodeOptions},
    formula::assemble,
    nalgebra::DMatrix,
    Model,
};
use rand::{rngs::StdRng, Rng, SeedableRng};
use rand_distr::{Distribution, Normal};
use std::hint::black_box;

/// `n` noisy samples of a two-feature function with a kink in each variable
fn gen_sample_data(n: usize) -> (DMatrix<f64>, DMatrix<f64>) {
    let mut rng = StdRng::seed_from_u64(0xEA27);
    let noise = Normal::new(0.0, 0.1).expect("Invalid noise distribution");

    let x = DMatrix::from_fn(n, 2, |_, _| rng.random_range(0.0..10.0));
    let y = DMatrix::from_fn(n, 1, |i, _| {
        let (a, b) = (x[(i, 0)], x[(i, 1)]);
        (a - 4.0).max(0.0) * 2.0 + (6.0 - b).max(0.0) + 0.5 * a + noise.sample(&mut rng)
    });
    (x, y)
}

fn fit(x: &DMatrix<f64>, y: &DMatrix<f64>, degree: usize) -> Model {
    Earth::default()
        .with_max_degree(degree)
        .fit(x, y)
        .expect("Failed to fit data")
}

fn criterion_benchmark(c: &mut Criterion) {
    //
    // How the forward pass scales with the number of observations
    println!("Benchmarking fit vs n (degree=1)...");
    let mut group = c.benchmark_group("fit_vs_n");
    for n in [50, 100, 200, 400] {
        let (x, y) = gen_sample_data(n);
        group.bench_with_input(BenchmarkId::from_parameter(n), &(x, y), |b, (x, y)| {
            b.iter(|| fit(black_box(x), black_box(y), 1));
        });
    }
    group.finish();

    //
    // Now the same data with interactions allowed
    println!("Benchmarking fit vs degree (n=100)...");
    let (x, y) = gen_sample_data(100);
    let mut group = c.benchmark_group("fit_vs_degree");
    for degree in [1, 2, 3] {
        group.bench_with_input(BenchmarkId::from_parameter(degree), &degree, |b, &degree| {
            b.iter(|| fit(black_box(&x), black_box(&y), degree));
        });
    }
    group.finish();

    //
    // Turning a fitted model into text
    let model = fit(&x, &y, 2);
    let mut group = c.benchmark_group("export");
    group.bench_function("assemble", |b| b.iter(|| assemble(black_box(&model))));
    group.bench_function("flat", |b| {
        b.iter(|| render_flat(&assemble(black_box(&model))));
    });
    group.bench_function("code", |b| {
        b.iter(|| export_code(black_box(&model), &CodeOptions::default()));
    });
    group.finish();
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
