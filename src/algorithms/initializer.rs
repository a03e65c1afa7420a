use ndarray::Array2;
use rand::Rng;
use rand_distr::{Distribution, Normal};

use crate::error::{PmfError, PmfResult};

/// Matrix of independent draws from `N(mean, std_dev²)`.
pub fn normal<R: Rng + ?Sized>(
    rows: usize,
    cols: usize,
    mean: f64,
    std_dev: f64,
    rng: &mut R,
) -> PmfResult<Array2<f64>> {
    if !std_dev.is_finite() || std_dev <= 0.0 {
        return Err(PmfError::invalid_config(format!(
            "normal initializer: standard deviation must be finite and positive, got {}",
            std_dev
        )));
    }
    let distribution = Normal::new(mean, std_dev)
        .map_err(|e| PmfError::invalid_config(format!("normal initializer: {}", e)))?;
    Ok(Array2::from_shape_fn((rows, cols), |_| {
        distribution.sample(&mut *rng)
    }))
}
