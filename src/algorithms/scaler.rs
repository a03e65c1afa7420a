use ndarray::{Array1, ArrayView1};

use crate::error::{PmfError, PmfResult};
use crate::models::Rating;

/// Affine map between raw ratings in `[1, K]` and the sigmoid range `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RatingScaler {
    k: f64,
}

impl RatingScaler {
    pub fn new(k: f64) -> PmfResult<Self> {
        if !k.is_finite() || k <= 1.0 {
            return Err(PmfError::DegenerateScale { max_rating: k });
        }
        Ok(Self { k })
    }

    /// Derives K as the largest raw rating across both splits.
    pub fn from_ratings(train: &[Rating], test: &[Rating]) -> PmfResult<Self> {
        let k = train
            .iter()
            .chain(test)
            .map(|r| r.rating)
            .fold(f64::NEG_INFINITY, f64::max);
        Self::new(k)
    }

    pub fn k(&self) -> f64 {
        self.k
    }

    pub fn to_internal(&self, rating: f64) -> f64 {
        (rating - 1.0) / (self.k - 1.0)
    }

    pub fn to_external(&self, value: f64) -> f64 {
        value * (self.k - 1.0) + 1.0
    }

    pub fn to_internal_all(&self, ratings: ArrayView1<f64>) -> Array1<f64> {
        ratings.mapv(|r| self.to_internal(r))
    }

    pub fn to_external_all(&self, values: ArrayView1<f64>) -> Array1<f64> {
        values.mapv(|v| self.to_external(v))
    }
}
