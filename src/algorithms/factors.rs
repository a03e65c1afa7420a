use ndarray::{Array1, Array2, ArrayView2, Axis};
use rand::Rng;

use crate::algorithms::initializer;
use crate::algorithms::optimizer::Momentum;
use crate::error::PmfResult;
use crate::models::Entity;
use crate::utils::validation::{validate_entity_id, validate_entity_ids, validate_shape};

/// Latent factors of one entity kind together with their momentum buffer.
#[derive(Debug, Clone)]
pub struct FactorMatrix {
    entity: Entity,
    weights: Array2<f64>,
    velocity: Array2<f64>,
    // Scratch space for per-entity gradient sums, zeroed at the start of every batch.
    accumulator: Array2<f64>,
}

impl FactorMatrix {
    pub fn from_weights(entity: Entity, weights: Array2<f64>) -> Self {
        let shape = weights.dim();
        Self {
            entity,
            weights,
            velocity: Array2::zeros(shape),
            accumulator: Array2::zeros(shape),
        }
    }

    pub fn random<R: Rng + ?Sized>(
        entity: Entity,
        rows: usize,
        features: usize,
        std_dev: f64,
        rng: &mut R,
    ) -> PmfResult<Self> {
        let weights = initializer::normal(rows, features, 0.0, std_dev, rng)?;
        Ok(Self::from_weights(entity, weights))
    }

    pub fn rows(&self) -> usize {
        self.weights.nrows()
    }

    pub fn features(&self) -> usize {
        self.weights.ncols()
    }

    pub fn weights(&self) -> &Array2<f64> {
        &self.weights
    }

    pub fn velocity(&self) -> &Array2<f64> {
        &self.velocity
    }

    pub fn row(&self, id: usize) -> PmfResult<Array1<f64>> {
        validate_entity_id(self.entity, id, self.rows())?;
        Ok(self.weights.row(id).to_owned())
    }

    /// Rows for `ids` in the given order; repeated ids yield repeated rows.
    pub fn gather(&self, ids: &[usize]) -> PmfResult<Array2<f64>> {
        validate_entity_ids(self.entity, ids, self.rows())?;
        Ok(self.weights.select(Axis(0), ids))
    }

    /// Sums the per-occurrence `gradients` into one row per entity id, then
    /// applies a momentum step to the whole matrix.
    pub fn accumulate_and_apply(
        &mut self,
        ids: &[usize],
        gradients: ArrayView2<f64>,
        optimizer: &Momentum,
        batch_size: usize,
    ) -> PmfResult<()> {
        validate_shape((ids.len(), self.features()), gradients.dim())?;
        validate_entity_ids(self.entity, ids, self.rows())?;

        self.accumulator.fill(0.0);
        for (&id, gradient) in ids.iter().zip(gradients.rows()) {
            let mut target = self.accumulator.row_mut(id);
            target += &gradient;
        }

        optimizer.update(
            &mut self.weights,
            &mut self.velocity,
            &self.accumulator,
            batch_size,
        );
        Ok(())
    }
}

/// User and product factor matrices of one model.
#[derive(Debug, Clone)]
pub struct FactorStore {
    users: FactorMatrix,
    products: FactorMatrix,
}

impl FactorStore {
    pub fn new<R: Rng + ?Sized>(
        user_rows: usize,
        product_rows: usize,
        features: usize,
        std_dev: f64,
        rng: &mut R,
    ) -> PmfResult<Self> {
        Ok(Self {
            users: FactorMatrix::random(Entity::User, user_rows, features, std_dev, rng)?,
            products: FactorMatrix::random(Entity::Product, product_rows, features, std_dev, rng)?,
        })
    }

    pub fn from_weights(users: Array2<f64>, products: Array2<f64>) -> PmfResult<Self> {
        validate_shape((products.nrows(), users.ncols()), products.dim())?;
        Ok(Self {
            users: FactorMatrix::from_weights(Entity::User, users),
            products: FactorMatrix::from_weights(Entity::Product, products),
        })
    }

    pub fn users(&self) -> &FactorMatrix {
        &self.users
    }

    pub fn products(&self) -> &FactorMatrix {
        &self.products
    }

    pub fn features(&self) -> usize {
        self.users.features()
    }

    pub fn gather(
        &self,
        user_ids: &[usize],
        product_ids: &[usize],
    ) -> PmfResult<(Array2<f64>, Array2<f64>)> {
        Ok((
            self.users.gather(user_ids)?,
            self.products.gather(product_ids)?,
        ))
    }

    pub fn accumulate_and_apply(
        &mut self,
        user_ids: &[usize],
        product_ids: &[usize],
        user_gradients: ArrayView2<f64>,
        product_gradients: ArrayView2<f64>,
        optimizer: &Momentum,
        batch_size: usize,
    ) -> PmfResult<()> {
        // Validate both sides before touching either matrix.
        validate_shape((user_ids.len(), self.features()), user_gradients.dim())?;
        validate_shape((product_ids.len(), self.features()), product_gradients.dim())?;
        validate_entity_ids(Entity::User, user_ids, self.users.rows())?;
        validate_entity_ids(Entity::Product, product_ids, self.products.rows())?;

        self.users
            .accumulate_and_apply(user_ids, user_gradients, optimizer, batch_size)?;
        self.products
            .accumulate_and_apply(product_ids, product_gradients, optimizer, batch_size)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PmfError;
    use ndarray::array;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn sample_matrix() -> FactorMatrix {
        FactorMatrix::from_weights(
            Entity::User,
            array![[0.1, 0.2], [0.3, 0.4], [0.5, 0.6], [0.7, 0.8]],
        )
    }

    #[test]
    fn test_new_store_shapes() {
        let mut rng = StdRng::seed_from_u64(3);
        let store = FactorStore::new(5, 4, 2, 0.1, &mut rng).unwrap();

        assert_eq!(store.users().weights().dim(), (5, 2));
        assert_eq!(store.products().weights().dim(), (4, 2));
        assert_eq!(store.users().velocity().dim(), (5, 2));
        assert_eq!(store.products().velocity().dim(), (4, 2));
        assert!(store.users().velocity().iter().all(|&v| v == 0.0));
    }

    #[test]
    fn test_gather_preserves_order_and_duplicates() {
        let matrix = sample_matrix();
        let rows = matrix.gather(&[2, 0, 2]).unwrap();
        assert_eq!(rows, array![[0.5, 0.6], [0.1, 0.2], [0.5, 0.6]]);

        assert!(matches!(
            matrix.gather(&[4]),
            Err(PmfError::IndexOutOfRange { id: 4, limit: 4, .. })
        ));
    }

    #[test]
    fn test_duplicate_ids_are_summed() {
        let optimizer = Momentum::new(0.1, 0.9);
        let g1 = array![0.3, -0.2];
        let g2 = array![0.5, 0.7];

        let mut twice = sample_matrix();
        let mut stacked = Array2::zeros((2, 2));
        stacked.row_mut(0).assign(&g1);
        stacked.row_mut(1).assign(&g2);
        twice
            .accumulate_and_apply(&[1, 1], stacked.view(), &optimizer, 2)
            .unwrap();

        let mut once = sample_matrix();
        let mut combined = Array2::zeros((1, 2));
        combined.row_mut(0).assign(&(&g1 + &g2));
        once.accumulate_and_apply(&[1], combined.view(), &optimizer, 2)
            .unwrap();

        assert_eq!(twice.weights(), once.weights());
        assert_eq!(twice.velocity(), once.velocity());
    }

    #[test]
    fn test_unreferenced_rows_only_decay() {
        let optimizer = Momentum::new(0.5, 0.9);
        let mut matrix = sample_matrix();
        let before = matrix.weights().clone();

        matrix
            .accumulate_and_apply(&[1], array![[1.0, -1.0]].view(), &optimizer, 1)
            .unwrap();

        for untouched in [0, 2, 3] {
            assert_eq!(matrix.weights().row(untouched), before.row(untouched));
            assert!(matrix.velocity().row(untouched).iter().all(|&v| v == 0.0));
        }
        let velocity = matrix.velocity().row(1).to_owned();
        assert_eq!(velocity, array![0.5, -0.5]);

        // An empty batch carries no learning-rate contribution.
        matrix
            .accumulate_and_apply(&[], Array2::zeros((0, 2)).view(), &optimizer, 1)
            .unwrap();
        assert_eq!(matrix.velocity().row(1), &velocity * 0.9);
        assert_eq!(matrix.weights().row(0), before.row(0));
    }

    #[test]
    fn test_momentum_persists_across_calls() {
        let optimizer = Momentum::new(1.0, 0.5);
        let mut matrix = sample_matrix();

        matrix
            .accumulate_and_apply(&[0], array![[0.2, 0.0]].view(), &optimizer, 1)
            .unwrap();
        matrix
            .accumulate_and_apply(&[0], array![[0.2, 0.0]].view(), &optimizer, 1)
            .unwrap();

        // 0.5 * 0.2 + 0.2
        assert!((matrix.velocity()[[0, 0]] - 0.3).abs() < 1e-12);
        assert!((matrix.weights()[[0, 0]] - (0.1 - 0.2 - 0.3)).abs() < 1e-12);
    }

    #[test]
    fn test_store_rejects_bad_batches_before_mutating() {
        let mut rng = StdRng::seed_from_u64(11);
        let mut store = FactorStore::new(3, 3, 2, 0.1, &mut rng).unwrap();
        let users_before = store.users().weights().clone();
        let optimizer = Momentum::new(0.1, 0.9);

        let gradients = array![[0.1, 0.1]];
        let result = store.accumulate_and_apply(
            &[1],
            &[3],
            gradients.view(),
            gradients.view(),
            &optimizer,
            1,
        );
        assert!(matches!(
            result,
            Err(PmfError::IndexOutOfRange { entity: Entity::Product, .. })
        ));
        assert_eq!(store.users().weights(), &users_before);

        let result = store.accumulate_and_apply(
            &[1, 2],
            &[1],
            gradients.view(),
            gradients.view(),
            &optimizer,
            1,
        );
        assert!(matches!(result, Err(PmfError::ShapeMismatch { .. })));
    }
}
