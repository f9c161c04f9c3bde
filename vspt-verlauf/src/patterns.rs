//! Delay pattern detection over the rolling history window.

use chrono::Utc;
use log::*;
use vspt_rechner::types::TrackingRecord;

use crate::errors::Result;
use crate::store::{HistoryStore, PatternUpdate};
use crate::types::{DelayPattern, HistoryRecord, PatternType};

/// Trailing window consulted when classifying a new delay.
pub const PATTERN_WINDOW_DAYS: i64 = 7;
/// A delay within this many minutes of the window average counts as
/// consistent.
pub const CONSISTENT_BAND_MINS: f64 = 5.0;
/// A delay this far beyond the average counts as a trend shift.
pub const TREND_SHIFT_MINS: f64 = 10.0;

/// Classifies new positive delays against recent observations and
/// upserts the resulting pattern row.
pub struct PatternAnalyzer<'a, S: HistoryStore> {
    store: &'a S
}
impl<'a, S: HistoryStore> PatternAnalyzer<'a, S> {
    pub fn new(store: &'a S) -> Self {
        Self { store }
    }
    /// Analyzes one positive delay observation and records the result.
    ///
    /// Only called for `delay_minutes > 0`: patterns track lateness
    /// trends, so on-time and early events are deliberately never
    /// analyzed.
    ///
    /// The returned value carries the computed classification; the
    /// persisted row's `frequency` may be higher if the key had been
    /// observed before.
    pub fn analyze_and_record(&self, train_id: &str, station: &str,
                              delay_minutes: i64) -> Result<DelayPattern> {
        let recent = self.store.query_recent_patterns(train_id, station,
                                                      PATTERN_WINDOW_DAYS)?;
        let mut pattern_type = PatternType::Irregular;
        let mut confidence = 0.5;
        let mut description = "Occasional delay detected".to_string();
        if !recent.is_empty() {
            let avg_delay = recent.iter().map(|o| o.delay_minutes as f64).sum::<f64>()
                / recent.len() as f64;
            let total_freq: i64 = recent.iter().map(|o| o.frequency).sum();
            let delay = delay_minutes as f64;
            if (delay - avg_delay).abs() <= CONSISTENT_BAND_MINS {
                pattern_type = PatternType::Consistent;
                confidence = (0.5 + total_freq as f64 / 20.0).min(0.9);
                description = format!("Regular delay pattern of {} minutes", avg_delay as i64);
            }
            else if delay > avg_delay + TREND_SHIFT_MINS {
                pattern_type = PatternType::Increasing;
                confidence = 0.7;
                description = "Increasing delay trend detected".to_string();
            }
            else if delay < avg_delay - TREND_SHIFT_MINS {
                pattern_type = PatternType::Decreasing;
                confidence = 0.7;
                description = "Decreasing delay trend detected".to_string();
            }
        }
        let update = PatternUpdate {
            train_id: train_id.to_string(),
            station: station.to_string(),
            delay_minutes,
            pattern_type,
            confidence,
            description: description.clone()
        };
        self.store.upsert_pattern(&update)?;
        Ok(DelayPattern {
            id: -1,
            train_id: update.train_id,
            station: update.station,
            delay_minutes,
            pattern_type,
            confidence,
            description,
            frequency: 1,
            recorded_at: Utc::now().naive_utc()
        })
    }
}

/// Writes a poll cycle's records into history, running pattern
/// analysis for every late observation on the way.
pub struct HistoryWriter<'a, S: HistoryStore> {
    store: &'a S
}
impl<'a, S: HistoryStore> HistoryWriter<'a, S> {
    pub fn new(store: &'a S) -> Self {
        Self { store }
    }
    /// Persists one cycle. Storage errors are caught here, logged and
    /// reported as `false`; they never abort the caller's pipeline.
    pub fn record_cycle(&self, records: &[TrackingRecord]) -> bool {
        let rows: Vec<HistoryRecord> = records.iter()
            .map(HistoryRecord::from_tracking)
            .collect();
        if let Err(e) = self.store.append_history(&rows) {
            error!("error saving history: {}", e);
            return false;
        }
        let analyzer = PatternAnalyzer::new(self.store);
        for rec in records {
            if let Some(delay) = rec.delay_minutes {
                if delay > 0 {
                    // Best-effort: a failed pattern write doesn't undo
                    // the history append above.
                    if let Err(e) = analyzer.analyze_and_record(&rec.train_id,
                                                               &rec.station, delay) {
                        error!("error analyzing pattern for ({}, {}): {}",
                               rec.train_id, rec.station, e);
                    }
                }
            }
        }
        true
    }
}
