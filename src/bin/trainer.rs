use anyhow::{bail, Context, Result};
use clap::Parser;
use cpmf::services::dataset::{load_ratings, train_test_split};
use cpmf::services::reporting::write_report;
use cpmf::{init_tracing, Config, Trainer, TracingSink};
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::info;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[arg(short, long, default_value = "config/default.toml")]
    config: String,

    /// Training ratings; overrides `data.train_path`
    #[arg(long)]
    train: Option<String>,

    /// Held-out ratings; without one, a random split of the training file is used
    #[arg(long)]
    test: Option<String>,

    #[arg(long)]
    epochs: Option<usize>,

    #[arg(long)]
    seed: Option<u64>,

    /// Where to write the JSON training report
    #[arg(long)]
    history_out: Option<String>,

    #[arg(short, long, default_value = "info")]
    log_level: String,
}

fn main() -> Result<()> {
    let args = Args::parse();

    std::env::set_var("RUST_LOG", &args.log_level);
    init_tracing();

    info!("Starting CPMF trainer");

    let mut config = if std::path::Path::new(&args.config).exists() {
        Config::from_file(&args.config)
            .with_context(|| format!("failed to load configuration from {}", args.config))?
    } else {
        info!("Config file not found, using default configuration");
        Config::default()
    };

    if let Some(train) = args.train {
        config.data.train_path = Some(train);
    }
    if let Some(test) = args.test {
        config.data.test_path = Some(test);
    }
    if let Some(epochs) = args.epochs {
        config.model.epoch = epochs;
    }
    if let Some(seed) = args.seed {
        config.model.seed = Some(seed);
    }
    if let Some(path) = args.history_out {
        config.report.history_path = Some(path);
    }
    config.validate()?;

    let Some(train_path) = config.data.train_path.as_deref() else {
        bail!("no training data given; pass --train or set data.train_path");
    };
    let ratings = load_ratings(train_path, &config.data)?;

    let (train, test) = match config.data.test_path.as_deref() {
        Some(test_path) => (ratings, load_ratings(test_path, &config.data)?),
        None => {
            let mut rng = match config.model.seed {
                Some(seed) => StdRng::seed_from_u64(seed),
                None => StdRng::from_entropy(),
            };
            train_test_split(&ratings, config.data.test_fraction, &mut rng)?
        }
    };

    let mut trainer = Trainer::new(config.model.clone())?;
    info!("Model configuration: {:?}", trainer.params());
    trainer.fit(&train, &test, &mut TracingSink)?;

    if let Some(path) = config.report.history_path.as_deref() {
        write_report(&trainer.report()?, path)?;
    }

    info!("Training finished");
    Ok(())
}
