use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::config::ModelConfig;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rating {
    pub user: usize,
    pub product: usize,
    pub rating: f64,
}

impl Rating {
    pub fn new(user: usize, product: usize, rating: f64) -> Self {
        Self {
            user,
            product,
            rating,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Entity {
    User,
    Product,
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Entity::User => write!(f, "user"),
            Entity::Product => write!(f, "product"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Split {
    Train,
    Test,
}

impl fmt::Display for Split {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Split::Train => write!(f, "training"),
            Split::Test => write!(f, "test"),
        }
    }
}

/// Losses recorded at the end of one epoch.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EpochLosses {
    pub epoch: usize,
    pub train_rmse: f64,
    pub test_rmse: f64,
    /// Regularized objective over the full training set, on the internal scale.
    pub train_objective: f64,
}

impl EpochLosses {
    pub fn is_finite(&self) -> bool {
        self.train_rmse.is_finite() && self.test_rmse.is_finite()
    }
}

/// Append-only per-epoch RMSE sequences.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LossHistory {
    pub train: Vec<f64>,
    pub test: Vec<f64>,
}

impl LossHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, losses: &EpochLosses) {
        self.train.push(losses.train_rmse);
        self.test.push(losses.test_rmse);
    }

    pub fn len(&self) -> usize {
        self.train.len()
    }

    pub fn is_empty(&self) -> bool {
        self.train.is_empty()
    }

    pub fn last(&self) -> Option<(f64, f64)> {
        Some((*self.train.last()?, *self.test.last()?))
    }
}

impl<'a> FromIterator<&'a EpochLosses> for LossHistory {
    fn from_iter<I: IntoIterator<Item = &'a EpochLosses>>(iter: I) -> Self {
        let mut history = LossHistory::new();
        for losses in iter {
            history.push(losses);
        }
        history
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainingReport {
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub scale: f64,
    pub mean_rating: f64,
    pub params: ModelConfig,
    pub epochs: Vec<EpochLosses>,
    pub history: LossHistory,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_loss_history_appends_in_order() {
        let mut history = LossHistory::new();
        assert!(history.is_empty());
        assert_eq!(history.last(), None);

        for (epoch, (train, test)) in [(1.2, 1.3), (1.0, 1.1)].into_iter().enumerate() {
            history.push(&EpochLosses {
                epoch,
                train_rmse: train,
                test_rmse: test,
                train_objective: 0.1,
            });
        }

        assert_eq!(history.len(), 2);
        assert_eq!(history.train, vec![1.2, 1.0]);
        assert_eq!(history.test, vec![1.3, 1.1]);
        assert_eq!(history.last(), Some((1.0, 1.1)));
    }

    #[test]
    fn test_history_collects_from_epochs() {
        let epochs: Vec<EpochLosses> = (0..3)
            .map(|epoch| EpochLosses {
                epoch,
                train_rmse: 1.0 + epoch as f64,
                test_rmse: 2.0 + epoch as f64,
                train_objective: 0.0,
            })
            .collect();

        let history: LossHistory = epochs.iter().collect();
        assert_eq!(history.train, vec![1.0, 2.0, 3.0]);
        assert_eq!(history.test, vec![2.0, 3.0, 4.0]);
        assert!(Vec::<EpochLosses>::new().iter().collect::<LossHistory>().is_empty());
    }

    #[test]
    fn test_epoch_losses_finiteness() {
        let mut losses = EpochLosses {
            epoch: 0,
            train_rmse: 0.9,
            test_rmse: 1.0,
            train_objective: 0.05,
        };
        assert!(losses.is_finite());

        losses.test_rmse = f64::NAN;
        assert!(!losses.is_finite());
    }
}
