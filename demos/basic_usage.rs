use cpmf::services::dataset::train_test_split;
use cpmf::*;
use rand::rngs::StdRng;
use rand::SeedableRng;

fn main() -> anyhow::Result<()> {
    init_tracing();

    println!("CPMF basic usage");

    // Two taste groups: users 1-5 like products 1-4, users 6-10 like products 5-8.
    let mut ratings = Vec::new();
    for user in 1..=10 {
        for product in 1..=8 {
            let liked = (user <= 5) == (product <= 4);
            ratings.push(Rating::new(user, product, if liked { 5.0 } else { 1.0 }));
        }
    }
    println!("Generated {} ratings", ratings.len());

    let mut rng = StdRng::seed_from_u64(2024);
    let (train, test) = train_test_split(&ratings, 0.2, &mut rng)?;
    println!("Split into {} train / {} test", train.len(), test.len());

    let params = ModelConfig {
        users: 10,
        products: 8,
        features: 4,
        epoch: 200,
        lr: 0.5,
        lambda: 0.001,
        batch_size: 16,
        momentum: 0.9,
        init_std: 0.1,
        seed: Some(7),
        center_ratings: false,
    };

    let mut trainer = Trainer::new(params)?;
    let mut epochs: Vec<EpochLosses> = Vec::new();
    let history = trainer.fit(&train, &test, &mut epochs)?;

    if let Some((train_rmse, test_rmse)) = history.last() {
        println!("Final RMSE: train {:.4}, test {:.4}", train_rmse, test_rmse);
    }

    for (user, product) in [(1, 1), (1, 8), (9, 2), (9, 7)] {
        println!(
            "user {} -> product {}: predicted {:.2}",
            user,
            product,
            trainer.predict(user, product)?
        );
    }

    let report = trainer.report()?;
    println!("{}", serde_json::to_string_pretty(&report.epochs[..3])?);

    Ok(())
}
