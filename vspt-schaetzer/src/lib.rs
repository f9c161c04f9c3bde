//! Delay prediction: encodes schedule-adherence records into numeric
//! feature vectors and regresses expected delay minutes with a seeded
//! bagged-tree ensemble.
//!
//! Predictions are advisory. Everything past training degrades to a
//! zero vector rather than failing the caller's data path.

pub mod errors;
pub mod features;
pub mod forest;
pub mod predictor;

#[cfg(test)]
mod tests;

pub use crate::features::FeatureEncoder;
pub use crate::forest::Forest;
pub use crate::predictor::{DelayPredictor, TrainingReport};
