pub mod algorithms;
pub mod config;
pub mod error;
pub mod models;
pub mod services;
pub mod utils;

pub use config::{Config, ModelConfig};
pub use error::{PmfError, PmfResult};
pub use models::*;
pub use services::reporting::{ReportingSink, TracingSink};
pub use services::training::{Trainer, TrainerState};

pub fn init_tracing() {
    // A subscriber may already be installed by an embedding application or a test.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();
}
