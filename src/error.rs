//! Error types for the factorization trainer.

use thiserror::Error;

use crate::models::{Entity, Split};

/// Result type for trainer operations.
pub type PmfResult<T> = Result<T, PmfError>;

/// Errors that can occur while configuring, loading data for, or running a training.
#[derive(Debug, Error)]
pub enum PmfError {
    /// A hyperparameter is outside its valid range
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// A configuration source is missing an option or has an ill-typed value
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    /// The rating scale collapses to a single value
    #[error("Degenerate rating scale: maximum rating {max_rating} must be finite and greater than 1")]
    DegenerateScale { max_rating: f64 },

    #[error("The {0} split contains no ratings")]
    EmptyDataset(Split),

    /// A rating row refers to an entity outside the allocated factor rows
    #[error("{entity} id {id} is out of range (factor matrix has {limit} rows)")]
    IndexOutOfRange { entity: Entity, id: usize, limit: usize },

    #[error("Row {row} of the {split} split has a non-finite rating {value}")]
    InvalidRating { split: Split, row: usize, value: f64 },

    #[error("Shape mismatch: expected {expected}, got {got}")]
    ShapeMismatch { expected: String, got: String },

    /// Training produced non-finite losses
    #[error("Numeric instability at epoch {epoch}: training RMSE {train_rmse}, validation RMSE {test_rmse}")]
    NumericInstability {
        epoch: usize,
        train_rmse: f64,
        test_rmse: f64,
    },

    #[error("Model has not been trained yet - call fit() first")]
    NotTrained,

    #[error("Parse error on line {line}: {message}")]
    Parse { line: u64, message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}

impl PmfError {
    pub fn invalid_config(msg: impl Into<String>) -> Self {
        Self::InvalidConfig(msg.into())
    }

    pub fn shape_mismatch(expected: impl Into<String>, got: impl Into<String>) -> Self {
        Self::ShapeMismatch {
            expected: expected.into(),
            got: got.into(),
        }
    }

    pub fn parse(line: u64, message: impl Into<String>) -> Self {
        Self::Parse {
            line,
            message: message.into(),
        }
    }
}
