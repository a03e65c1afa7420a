pub mod factors;
pub mod initializer;
pub mod loss;
pub mod optimizer;
pub mod scaler;

pub use factors::{FactorMatrix, FactorStore};
pub use loss::LossEvaluator;
pub use optimizer::Momentum;
pub use scaler::RatingScaler;
