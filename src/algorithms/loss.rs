use ndarray::{Array1, ArrayView1, ArrayView2};

use crate::algorithms::scaler::RatingScaler;
use crate::error::{PmfError, PmfResult};
use crate::utils::{row_dot, sigmoid, squared_norm};
use crate::utils::validation::validate_shape;

/// Loss functions over matched slices of user rows, product rows and
/// internal-scale ratings.
#[derive(Debug, Clone, Copy)]
pub struct LossEvaluator {
    scaler: RatingScaler,
    // Added to every sigmoid prediction; non-zero only with mean-centered training.
    offset: f64,
}

impl LossEvaluator {
    pub fn new(scaler: RatingScaler) -> Self {
        Self {
            scaler,
            offset: 0.0,
        }
    }

    pub fn with_offset(mut self, offset: f64) -> Self {
        self.offset = offset;
        self
    }

    pub fn scaler(&self) -> &RatingScaler {
        &self.scaler
    }

    /// Internal-scale predictions for each matched row.
    pub fn predict(
        &self,
        users: ArrayView2<f64>,
        products: ArrayView2<f64>,
    ) -> PmfResult<Array1<f64>> {
        validate_shape(users.dim(), products.dim())?;
        Ok(row_dot(users, products).mapv(|x| sigmoid(x) + self.offset))
    }

    /// `(‖σ(u·p) − r‖² + ½λ(‖U‖² + ‖P‖²)) / n`, with the norms taken over the supplied slices.
    pub fn regularized_objective(
        &self,
        users: ArrayView2<f64>,
        products: ArrayView2<f64>,
        ratings: ArrayView1<f64>,
        lambda: f64,
    ) -> PmfResult<f64> {
        let n = self.check_rows(users, ratings)?;
        let prediction = self.predict(users, products)?;

        let squared_error = (&prediction - &ratings).mapv(|e| e * e).sum();
        let regularization = 0.5 * lambda * (squared_norm(users) + squared_norm(products));
        Ok((squared_error + regularization) / n as f64)
    }

    /// Root-mean-square error on the external rating scale.
    ///
    /// Computed as `‖r_ext − p_ext‖ / √n`, which equals `√(mean((r_ext − p_ext)²))`.
    pub fn rmse(
        &self,
        users: ArrayView2<f64>,
        products: ArrayView2<f64>,
        ratings: ArrayView1<f64>,
    ) -> PmfResult<f64> {
        let n = self.check_rows(users, ratings)?;
        let prediction = self.scaler.to_external_all(self.predict(users, products)?.view());
        let truth = self.scaler.to_external_all(ratings);

        let residual_norm = (&truth - &prediction).mapv(|e| e * e).sum().sqrt();
        Ok(residual_norm / (n as f64).sqrt())
    }

    fn check_rows(&self, users: ArrayView2<f64>, ratings: ArrayView1<f64>) -> PmfResult<usize> {
        if ratings.is_empty() {
            return Err(PmfError::shape_mismatch("at least one rating", "0"));
        }
        if users.nrows() != ratings.len() {
            return Err(PmfError::shape_mismatch(
                format!("{} factor rows", ratings.len()),
                format!("{}", users.nrows()),
            ));
        }
        Ok(ratings.len())
    }
}
