use std::time::Instant;

use chrono::{DateTime, Utc};
use ndarray::{Array1, Axis};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::algorithms::{FactorStore, LossEvaluator, Momentum, RatingScaler};
use crate::config::ModelConfig;
use crate::error::{PmfError, PmfResult};
use crate::models::{EpochLosses, LossHistory, Rating, Split, TrainingReport};
use crate::services::reporting::ReportingSink;
use crate::utils::validation::{validate_epoch_losses, validate_ratings};
use crate::utils::{mean, row_dot, sigmoid};

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TrainerState {
    Uninitialized,
    ScaleDetermined { scale: f64 },
    Epoch(usize),
    EpochsExhausted,
}

/// Mini-batch momentum SGD over sigmoid-squashed user/product factors.
pub struct Trainer {
    params: ModelConfig,
    optimizer: Momentum,
    rng: StdRng,
    state: TrainerState,
    run_id: Uuid,
    started_at: DateTime<Utc>,
    finished_at: Option<DateTime<Utc>>,
    factors: Option<FactorStore>,
    evaluator: Option<LossEvaluator>,
    mean_rating: f64,
    epochs: Vec<EpochLosses>,
}

impl Trainer {
    pub fn new(params: ModelConfig) -> PmfResult<Self> {
        params.validate()?;

        let rng = match params.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        Ok(Self {
            optimizer: Momentum::new(params.lr, params.momentum),
            params,
            rng,
            state: TrainerState::Uninitialized,
            run_id: Uuid::new_v4(),
            started_at: Utc::now(),
            finished_at: None,
            factors: None,
            evaluator: None,
            mean_rating: 0.0,
            epochs: Vec::new(),
        })
    }

    pub fn params(&self) -> &ModelConfig {
        &self.params
    }

    pub fn state(&self) -> TrainerState {
        self.state
    }

    pub fn run_id(&self) -> Uuid {
        self.run_id
    }

    /// Rating scale constant K, once determined.
    pub fn scale(&self) -> Option<f64> {
        self.evaluator.map(|e| e.scaler().k())
    }

    /// Mean of the pre-processed training ratings.
    pub fn mean_rating(&self) -> f64 {
        self.mean_rating
    }

    /// Per-epoch RMSE sequences of the latest run.
    pub fn history(&self) -> LossHistory {
        self.epochs.iter().collect()
    }

    pub fn epochs(&self) -> &[EpochLosses] {
        &self.epochs
    }

    pub fn factors(&self) -> Option<&FactorStore> {
        self.factors.as_ref()
    }

    /// Trains fresh factors on `train`, evaluating on `test` after every epoch.
    ///
    /// Both splits are validated in full before any state is touched. Every
    /// call starts from newly initialized factors and an empty history.
    pub fn fit(
        &mut self,
        train: &[Rating],
        test: &[Rating],
        sink: &mut dyn ReportingSink,
    ) -> PmfResult<LossHistory> {
        let user_rows = self.params.user_rows();
        let product_rows = self.params.product_rows();

        let below_scale = validate_ratings(train, Split::Train, user_rows, product_rows)?
            + validate_ratings(test, Split::Test, user_rows, product_rows)?;
        let scaler = RatingScaler::from_ratings(train, test)?;

        self.reset();
        self.state = TrainerState::ScaleDetermined { scale: scaler.k() };
        if below_scale > 0 {
            warn!(
                "{} ratings fall below 1 and map outside [0, 1] (K = {})",
                below_scale,
                scaler.k()
            );
        }

        let mut train_set = to_internal(train, &scaler);
        let test_set = to_internal(test, &scaler);

        let (_, _, raw_train) = columns(train);
        self.mean_rating = mean(scaler.to_internal_all(raw_train.view()).view());
        debug!("Mean pre-processed training rating: {:.6}", self.mean_rating);

        let offset = if self.params.center_ratings {
            self.mean_rating
        } else {
            0.0
        };
        let evaluator = LossEvaluator::new(scaler).with_offset(offset);
        self.evaluator = Some(evaluator);

        let factors = self.factors.insert(FactorStore::new(
            user_rows,
            product_rows,
            self.params.features,
            self.params.init_std,
            &mut self.rng,
        )?);

        info!(
            "Starting run {}: {} train / {} test ratings, {}x{} users, {}x{} products, K = {}",
            self.run_id,
            train_set.len(),
            test_set.len(),
            user_rows,
            self.params.features,
            product_rows,
            self.params.features,
            scaler.k()
        );
        debug!(
            "Momentum SGD: learning rate {}, momentum {}, batch size {}, lambda {}",
            self.optimizer.learning_rate(),
            self.optimizer.momentum(),
            self.params.batch_size,
            self.params.lambda
        );

        for epoch in 0..self.params.epoch {
            self.state = TrainerState::Epoch(epoch);
            let epoch_start = Instant::now();

            shuffle_ratings(&mut train_set, &mut self.rng);
            for batch in train_set.chunks(self.params.batch_size) {
                train_batch(factors, batch, &self.params, &self.optimizer, offset)?;
            }

            let losses = EpochLosses {
                epoch,
                train_rmse: evaluate_rmse(factors, &evaluator, &train_set)?,
                test_rmse: evaluate_rmse(factors, &evaluator, &test_set)?,
                train_objective: evaluate_objective(
                    factors,
                    &evaluator,
                    &train_set,
                    self.params.lambda,
                )?,
            };
            debug!(
                "Epoch {} took {:?}, regularized objective {:.6}",
                epoch,
                epoch_start.elapsed(),
                losses.train_objective
            );

            self.epochs.push(losses);
            sink.on_epoch(&losses);
            validate_epoch_losses(&losses)?;
        }

        self.state = TrainerState::EpochsExhausted;
        self.finished_at = Some(Utc::now());
        if let Some(last) = self.epochs.last() {
            info!(
                "Run {} finished after {} epochs: training RMSE {:.6}, validation RMSE {:.6}",
                self.run_id, self.params.epoch, last.train_rmse, last.test_rmse
            );
        }

        Ok(self.history())
    }

    /// Predicted rating on the original scale.
    pub fn predict(&self, user: usize, product: usize) -> PmfResult<f64> {
        let (factors, evaluator) = self.trained()?;
        let (users, products) = factors.gather(&[user], &[product])?;
        let prediction = evaluator.predict(users.view(), products.view())?;
        Ok(evaluator.scaler().to_external(prediction[0]))
    }

    pub fn report(&self) -> PmfResult<TrainingReport> {
        let (_, evaluator) = self.trained()?;
        Ok(TrainingReport {
            run_id: self.run_id,
            started_at: self.started_at,
            finished_at: self.finished_at.ok_or(PmfError::NotTrained)?,
            scale: evaluator.scaler().k(),
            mean_rating: self.mean_rating,
            params: self.params.clone(),
            epochs: self.epochs.clone(),
            history: self.history(),
        })
    }

    fn trained(&self) -> PmfResult<(&FactorStore, &LossEvaluator)> {
        match (&self.factors, &self.evaluator, self.state) {
            (Some(factors), Some(evaluator), TrainerState::EpochsExhausted) => {
                Ok((factors, evaluator))
            }
            _ => Err(PmfError::NotTrained),
        }
    }

    fn reset(&mut self) {
        self.state = TrainerState::Uninitialized;
        self.run_id = Uuid::new_v4();
        self.started_at = Utc::now();
        self.finished_at = None;
        self.factors = None;
        self.evaluator = None;
        self.mean_rating = 0.0;
        self.epochs.clear();
    }
}

/// Uniform random permutation of the rows; each triple stays intact.
pub fn shuffle_ratings<R: Rng + ?Sized>(ratings: &mut [Rating], rng: &mut R) {
    ratings.shuffle(rng);
}

fn to_internal(ratings: &[Rating], scaler: &RatingScaler) -> Vec<Rating> {
    ratings
        .iter()
        .map(|r| Rating::new(r.user, r.product, scaler.to_internal(r.rating)))
        .collect()
}

fn columns(ratings: &[Rating]) -> (Vec<usize>, Vec<usize>, Array1<f64>) {
    let users = ratings.iter().map(|r| r.user).collect();
    let products = ratings.iter().map(|r| r.product).collect();
    let values = ratings.iter().map(|r| r.rating).collect();
    (users, products, values)
}

fn train_batch(
    factors: &mut FactorStore,
    batch: &[Rating],
    params: &ModelConfig,
    optimizer: &Momentum,
    offset: f64,
) -> PmfResult<()> {
    let (user_ids, product_ids, ratings) = columns(batch);
    let (users, products) = factors.gather(&user_ids, &product_ids)?;

    let prediction = row_dot(users.view(), products.view()).mapv(sigmoid);
    let residual = &prediction - &ratings.mapv(|r| r - offset);
    let slope = prediction.mapv(|p| p * (1.0 - p));
    let scale = (2.0 * &slope * &residual).insert_axis(Axis(1));

    // Weight decay uses the rows as gathered, one term per occurrence.
    let user_gradients = &products * &scale + &users * params.lambda;
    let product_gradients = &users * &scale + &products * params.lambda;

    factors.accumulate_and_apply(
        &user_ids,
        &product_ids,
        user_gradients.view(),
        product_gradients.view(),
        optimizer,
        params.batch_size,
    )
}

fn evaluate_rmse(
    factors: &FactorStore,
    evaluator: &LossEvaluator,
    ratings: &[Rating],
) -> PmfResult<f64> {
    let (user_ids, product_ids, values) = columns(ratings);
    let (users, products) = factors.gather(&user_ids, &product_ids)?;
    evaluator.rmse(users.view(), products.view(), values.view())
}

fn evaluate_objective(
    factors: &FactorStore,
    evaluator: &LossEvaluator,
    ratings: &[Rating],
    lambda: f64,
) -> PmfResult<f64> {
    let (user_ids, product_ids, values) = columns(ratings);
    let (users, products) = factors.gather(&user_ids, &product_ids)?;
    evaluator.regularized_objective(users.view(), products.view(), values.view(), lambda)
}
