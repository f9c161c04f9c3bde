//! Signed delay arithmetic and running-status classification.

use chrono::NaiveTime;

use crate::types::RunningStatus;

/// Minutes either side of schedule still counted as on time.
pub const DEFAULT_THRESHOLD_MINS: i64 = 5;

/// Computes signed delays and classifies them against a lateness
/// threshold.
///
/// The threshold is fixed per instance; callers wanting a different
/// policy construct a new calculator with `with_threshold`.
pub struct DelayCalculator {
    threshold_mins: i64
}
impl DelayCalculator {
    pub fn new() -> Self {
        Self { threshold_mins: DEFAULT_THRESHOLD_MINS }
    }
    pub fn with_threshold(threshold_mins: i64) -> Self {
        Self { threshold_mins }
    }
    /// Signed difference `(actual - scheduled)` in whole minutes;
    /// positive means late. `None` if either side is absent.
    ///
    /// This is plain time-of-day arithmetic with no date component, so
    /// it does **not** handle midnight rollover: a schedule of 23:55
    /// against an actual of 00:05 yields a large negative value, not
    /// +10 minutes.
    pub fn delay(&self, scheduled: Option<NaiveTime>, actual: Option<NaiveTime>) -> Option<i64> {
        let scheduled = scheduled?;
        let actual = actual?;
        Some(actual.signed_duration_since(scheduled).num_minutes())
    }
    /// Classifies a signed delay. An absent delay is always `Unknown`.
    pub fn classify(&self, delay: Option<i64>) -> RunningStatus {
        match delay {
            None => RunningStatus::Unknown,
            Some(d) if d < -self.threshold_mins => RunningStatus::Early,
            Some(d) if d > self.threshold_mins => RunningStatus::Late,
            Some(_) => RunningStatus::OnTime
        }
    }
}
impl Default for DelayCalculator {
    fn default() -> Self {
        Self::new()
    }
}
