use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

use tracing::info;

use crate::error::PmfResult;
use crate::models::{EpochLosses, TrainingReport};

/// Receives the losses of every completed epoch.
pub trait ReportingSink {
    fn on_epoch(&mut self, losses: &EpochLosses);
}

/// Logs per-epoch progress through `tracing`.
#[derive(Debug, Clone, Default)]
pub struct TracingSink;

impl ReportingSink for TracingSink {
    fn on_epoch(&mut self, losses: &EpochLosses) {
        info!(
            "Epoch {} finished. Current training RMSE: {:.6} Current validation RMSE: {:.6}",
            losses.epoch, losses.train_rmse, losses.test_rmse
        );
    }
}

impl ReportingSink for Vec<EpochLosses> {
    fn on_epoch(&mut self, losses: &EpochLosses) {
        self.push(*losses);
    }
}

pub fn write_report(report: &TrainingReport, path: impl AsRef<Path>) -> PmfResult<()> {
    let path = path.as_ref();
    let writer = BufWriter::new(File::create(path)?);
    serde_json::to_writer_pretty(writer, report)?;
    info!("Training report written to {}", path.display());
    Ok(())
}

pub fn read_report(path: impl AsRef<Path>) -> PmfResult<TrainingReport> {
    let file = File::open(path)?;
    Ok(serde_json::from_reader(BufReader::new(file))?)
}
