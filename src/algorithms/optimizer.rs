use ndarray::{Array2, Zip};

/// Heavy-ball momentum step.
///
/// `velocity = momentum * velocity + learning_rate * gradient / batch_size`,
/// then `params -= velocity`, over every element of the matrix.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Momentum {
    learning_rate: f64,
    momentum: f64,
}

impl Momentum {
    pub fn new(learning_rate: f64, momentum: f64) -> Self {
        Self {
            learning_rate,
            momentum,
        }
    }

    pub fn learning_rate(&self) -> f64 {
        self.learning_rate
    }

    pub fn momentum(&self) -> f64 {
        self.momentum
    }

    pub fn update(
        &self,
        params: &mut Array2<f64>,
        velocity: &mut Array2<f64>,
        gradients: &Array2<f64>,
        batch_size: usize,
    ) {
        let batch_size = batch_size as f64;
        Zip::from(params)
            .and(velocity)
            .and(gradients)
            .for_each(|param, velocity, &gradient| {
                *velocity = self.momentum * *velocity + self.learning_rate * gradient / batch_size;
                *param -= *velocity;
            });
    }
}
