use cpmf::algorithms::{FactorStore, LossEvaluator, Momentum, RatingScaler};
use cpmf::*;
use criterion::{black_box, criterion_group, criterion_main, Criterion};
use ndarray::Array2;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

fn synthetic_ratings(count: usize, users: usize, products: usize) -> Vec<Rating> {
    let mut rng = StdRng::seed_from_u64(7);
    (0..count)
        .map(|_| {
            Rating::new(
                rng.gen_range(1..=users),
                rng.gen_range(1..=products),
                rng.gen_range(1..=5) as f64,
            )
        })
        .collect()
}

fn params() -> ModelConfig {
    ModelConfig {
        users: 943,
        products: 1682,
        epoch: 1,
        seed: Some(1),
        ..ModelConfig::default()
    }
}

fn benchmark_epoch(c: &mut Criterion) {
    let train = synthetic_ratings(20_000, 943, 1682);
    let test = synthetic_ratings(2_000, 943, 1682);

    c.bench_function("fit_single_epoch", |b| {
        b.iter(|| {
            let mut trainer = Trainer::new(params()).unwrap();
            let mut sink: Vec<EpochLosses> = Vec::new();
            black_box(trainer.fit(&train, &test, &mut sink).unwrap().len());
        });
    });
}

fn benchmark_batch_update(c: &mut Criterion) {
    let mut rng = StdRng::seed_from_u64(3);
    let mut store = FactorStore::new(944, 1683, 10, 0.1, &mut rng).unwrap();
    let optimizer = Momentum::new(0.5, 0.9);
    let user_ids: Vec<usize> = (0..1000).map(|i| i % 943 + 1).collect();
    let product_ids: Vec<usize> = (0..1000).map(|i| (i * 7) % 1682 + 1).collect();
    let gradients = Array2::from_elem((1000, 10), 0.01);

    c.bench_function("accumulate_and_apply_1000", |b| {
        b.iter(|| {
            store
                .accumulate_and_apply(
                    &user_ids,
                    &product_ids,
                    gradients.view(),
                    gradients.view(),
                    &optimizer,
                    1000,
                )
                .unwrap();
        });
    });
}

fn benchmark_rmse(c: &mut Criterion) {
    let mut rng = StdRng::seed_from_u64(5);
    let store = FactorStore::new(944, 1683, 10, 0.1, &mut rng).unwrap();
    let evaluator = LossEvaluator::new(RatingScaler::new(5.0).unwrap());
    let ratings = synthetic_ratings(10_000, 943, 1682);
    let user_ids: Vec<usize> = ratings.iter().map(|r| r.user).collect();
    let product_ids: Vec<usize> = ratings.iter().map(|r| r.product).collect();
    let values = ndarray::Array1::from_iter(ratings.iter().map(|r| (r.rating - 1.0) / 4.0));

    c.bench_function("rmse_10000", |b| {
        b.iter(|| {
            let (users, products) = store.gather(&user_ids, &product_ids).unwrap();
            black_box(
                evaluator
                    .rmse(users.view(), products.view(), values.view())
                    .unwrap(),
            );
        });
    });
}

criterion_group!(benches, benchmark_epoch, benchmark_batch_update, benchmark_rmse);
criterion_main!(benches);
