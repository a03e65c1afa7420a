use serde::{Deserialize, Serialize};

use crate::error::{PmfError, PmfResult};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub model: ModelConfig,
    #[serde(default)]
    pub data: DataConfig,
    #[serde(default)]
    pub report: ReportConfig,
}

/// Hyperparameters of a factorization run.
///
/// The first eight fields have no serde default: a configuration source that
/// omits any of them fails to deserialize.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelConfig {
    /// Largest user id; factor rows are allocated for `0..=users`.
    pub users: usize,
    /// Largest product id; factor rows are allocated for `0..=products`.
    pub products: usize,
    pub features: usize,
    #[serde(alias = "epochs")]
    pub epoch: usize,
    #[serde(alias = "learning_rate")]
    pub lr: f64,
    pub lambda: f64,
    pub batch_size: usize,
    pub momentum: f64,
    #[serde(default = "default_init_std")]
    pub init_std: f64,
    #[serde(default)]
    pub seed: Option<u64>,
    /// Train against mean-centered targets. Off unless explicitly requested.
    #[serde(default)]
    pub center_ratings: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DataConfig {
    pub train_path: Option<String>,
    pub test_path: Option<String>,
    pub delimiter: char,
    pub has_headers: bool,
    pub test_fraction: f64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    pub history_path: Option<String>,
}

fn default_init_std() -> f64 {
    0.1
}

impl ModelConfig {
    /// Number of user factor rows.
    pub fn user_rows(&self) -> usize {
        self.users + 1
    }

    /// Number of product factor rows.
    pub fn product_rows(&self) -> usize {
        self.products + 1
    }

    pub fn validate(&self) -> PmfResult<()> {
        if self.features == 0 {
            return Err(PmfError::invalid_config("features must be at least 1"));
        }

        if self.epoch == 0 {
            return Err(PmfError::invalid_config("epoch must be at least 1"));
        }

        if self.batch_size == 0 {
            return Err(PmfError::invalid_config("batch_size must be at least 1"));
        }

        if !self.lr.is_finite() || self.lr <= 0.0 {
            return Err(PmfError::invalid_config(format!(
                "lr must be a positive finite number, got {}",
                self.lr
            )));
        }

        if !self.lambda.is_finite() || self.lambda < 0.0 {
            return Err(PmfError::invalid_config(format!(
                "lambda must be a non-negative finite number, got {}",
                self.lambda
            )));
        }

        if !self.momentum.is_finite() || !(0.0..1.0).contains(&self.momentum) {
            return Err(PmfError::invalid_config(format!(
                "momentum must lie in [0, 1), got {}",
                self.momentum
            )));
        }

        if !self.init_std.is_finite() || self.init_std <= 0.0 {
            return Err(PmfError::invalid_config(format!(
                "init_std must be a positive finite number, got {}",
                self.init_std
            )));
        }

        Ok(())
    }
}

impl DataConfig {
    pub fn delimiter_byte(&self) -> PmfResult<u8> {
        if !self.delimiter.is_ascii() {
            return Err(PmfError::invalid_config(format!(
                "delimiter must be a single ASCII character, got {:?}",
                self.delimiter
            )));
        }
        Ok(self.delimiter as u8)
    }

    pub fn validate(&self) -> PmfResult<()> {
        self.delimiter_byte()?;

        if !(self.test_fraction > 0.0 && self.test_fraction < 1.0) {
            return Err(PmfError::invalid_config(format!(
                "test_fraction must lie in (0, 1), got {}",
                self.test_fraction
            )));
        }

        Ok(())
    }
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            train_path: None,
            test_path: None,
            delimiter: '\t',
            has_headers: false,
            test_fraction: 0.2,
        }
    }
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            users: 943,
            products: 1682,
            features: 10,
            epoch: 30,
            lr: 0.5,
            lambda: 0.01,
            batch_size: 1000,
            momentum: 0.9,
            init_std: default_init_std(),
            seed: None,
            center_ratings: false,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            model: ModelConfig::default(),
            data: DataConfig::default(),
            report: ReportConfig::default(),
        }
    }
}

impl Config {
    pub fn from_file(path: &str) -> PmfResult<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(path))
            .add_source(
                config::Environment::with_prefix("CPMF")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        Ok(settings.try_deserialize()?)
    }

    pub fn validate(&self) -> PmfResult<()> {
        self.model.validate()?;
        self.data.validate()
    }
}
