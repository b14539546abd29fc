use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rsmo::api::SVM;
use rsmo::{RBFKernel, Sample};

fn blobs(n_per_class: usize) -> Vec<Sample> {
    let mut rng = StdRng::seed_from_u64(0);
    (0..n_per_class)
        .flat_map(|_| {
            let pos = [1.0 + rng.random_range(-1.5..1.5), 1.0 + rng.random_range(-1.5..1.5)];
            let neg = [-1.0 + rng.random_range(-1.5..1.5), -1.0 + rng.random_range(-1.5..1.5)];
            [Sample::dense(&pos, 1.0), Sample::dense(&neg, -1.0)]
        })
        .collect()
}

fn bench_training(c: &mut Criterion) {
    let mut group = c.benchmark_group("smo_train");
    for &n in &[50, 200] {
        let samples = blobs(n);
        group.bench_with_input(BenchmarkId::new("linear", 2 * n), &samples, |b, samples| {
            b.iter(|| SVM::new().train(black_box(samples)))
        });
        group.bench_with_input(BenchmarkId::new("rbf", 2 * n), &samples, |b, samples| {
            b.iter(|| SVM::with_kernel(RBFKernel::new(0.5)).train(black_box(samples)))
        });
    }
    group.finish();
}

criterion_group!(benches, bench_training);
criterion_main!(benches);
