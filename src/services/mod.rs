pub mod dataset;
pub mod reporting;
pub mod training;
