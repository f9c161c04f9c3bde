//! Durable history of schedule-adherence records, plus detection of
//! recurring delay patterns per (train, station) pair.
//!
//! Pattern analysis is best-effort auxiliary analytics layered over the
//! primary history write: storage failures are caught at this crate's
//! boundary and reported as booleans, never propagated into the
//! calculation pipeline.

pub mod errors;
pub mod types;
pub mod store;
pub mod patterns;

#[cfg(test)]
mod tests;

pub use crate::store::{HistoryStore, SqliteHistoryStore};
pub use crate::patterns::{HistoryWriter, PatternAnalyzer};
