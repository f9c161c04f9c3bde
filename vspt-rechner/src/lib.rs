//! Normalizes raw train-position rows into canonical schedule-adherence
//! records: time parsing, signed delay arithmetic, and running-status
//! classification.

pub mod types;
pub mod zeit;
pub mod delay;
pub mod ingest;


pub use crate::types::{RawStatus, RunningStatus, TrackingRecord};
pub use crate::zeit::TimeNormalizer;
pub use crate::delay::DelayCalculator;
