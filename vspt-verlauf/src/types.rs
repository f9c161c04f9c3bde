//! Database types for history records and delay patterns.

use chrono::{Local, NaiveDate, NaiveDateTime, NaiveTime};
use vspt_rechner::types::{RawStatus, RunningStatus, TrackingRecord};
use vspt_sqlite::traits::*;
use vspt_sqlite::migrations::Migration;
use vspt_sqlite::migration;

pub static MIGRATIONS: [Migration; 1] = [
    migration!(0, "initial")
];

/// One persisted train-station observation. Append-only; never mutated
/// after insert.
#[derive(Debug, Clone, PartialEq)]
pub struct HistoryRecord {
    /// Internal primary key.
    pub id: i64,
    /// Train number.
    pub train_id: String,
    /// Full free-text train designation.
    pub train_name: String,
    /// Station code.
    pub station: String,
    /// Raw operational flag.
    pub status: RawStatus,
    /// Derived early/on-time/late classification.
    pub running_status: RunningStatus,
    /// Scheduled (WTT) time.
    pub scheduled_time: Option<NaiveTime>,
    /// Actual observed time.
    pub actual_time: Option<NaiveTime>,
    /// Signed delay in minutes, if both times were present.
    pub delay_minutes: Option<i64>,
    /// The date this observation was recorded on.
    pub recorded_date: NaiveDate
}
impl HistoryRecord {
    /// Snapshots a tracking record into a history row dated today.
    pub fn from_tracking(rec: &TrackingRecord) -> Self {
        Self {
            id: -1,
            train_id: rec.train_id.clone(),
            train_name: rec.train_name.clone(),
            station: rec.station.clone(),
            status: rec.status,
            running_status: rec.running_status,
            scheduled_time: rec.scheduled_time,
            actual_time: rec.actual_time,
            delay_minutes: rec.delay_minutes,
            recorded_date: Local::now().naive_local().date()
        }
    }
    /// Reconstructs the ephemeral record form, e.g. to feed stored
    /// history back into predictor training.
    pub fn to_tracking(&self) -> TrackingRecord {
        TrackingRecord {
            train_id: self.train_id.clone(),
            train_name: self.train_name.clone(),
            station: self.station.clone(),
            status: self.status,
            scheduled_time: self.scheduled_time,
            actual_time: self.actual_time,
            delay_minutes: self.delay_minutes,
            running_status: self.running_status
        }
    }
}
impl DbType for HistoryRecord {
    fn table_name() -> &'static str {
        "train_history"
    }
    fn from_row(row: &Row) -> RowResult<Self> {
        let status: String = row.get(4)?;
        let running: String = row.get(5)?;
        Ok(Self {
            id: row.get(0)?,
            train_id: row.get(1)?,
            train_name: row.get(2)?,
            station: row.get(3)?,
            status: RawStatus::parse(&status),
            running_status: RunningStatus::parse(&running),
            scheduled_time: row.get(6)?,
            actual_time: row.get(7)?,
            delay_minutes: row.get(8)?,
            recorded_date: row.get(9)?
        })
    }
}
impl InsertableDbType for HistoryRecord {
    type Id = i64;
    fn insert_self(&self, conn: &Connection) -> RowResult<i64> {
        let mut stmt = conn.prepare("INSERT INTO train_history
                                     (train_id, train_name, station, status,
                                      running_status, scheduled_time, actual_time,
                                      delay_minutes, recorded_date)
                                     VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)")?;
        let rid = stmt.insert(params![self.train_id, self.train_name,
                              self.station, self.status.as_str(),
                              self.running_status.as_str(), self.scheduled_time,
                              self.actual_time, self.delay_minutes,
                              self.recorded_date])?;
        Ok(rid)
    }
}

/// A recurring delay characterization.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PatternType {
    /// Delays hover around the recent average.
    Consistent,
    /// The new delay is well above the recent average.
    Increasing,
    /// The new delay is well below the recent average.
    Decreasing,
    /// Not enough signal to call it anything else.
    Irregular
}
impl PatternType {
    pub fn parse(token: &str) -> Self {
        match token {
            "Consistent" => PatternType::Consistent,
            "Increasing" => PatternType::Increasing,
            "Decreasing" => PatternType::Decreasing,
            _ => PatternType::Irregular
        }
    }
    pub fn as_str(&self) -> &'static str {
        match *self {
            PatternType::Consistent => "Consistent",
            PatternType::Increasing => "Increasing",
            PatternType::Decreasing => "Decreasing",
            PatternType::Irregular => "Irregular"
        }
    }
}

/// The persisted pattern row for a (train, station) pair. One logical
/// row per key; re-observations update it in place.
#[derive(Debug, Clone, PartialEq)]
pub struct DelayPattern {
    /// Internal primary key.
    pub id: i64,
    /// Train number.
    pub train_id: String,
    /// Station code.
    pub station: String,
    /// The latest observed delay, in minutes.
    pub delay_minutes: i64,
    /// Trend classification.
    pub pattern_type: PatternType,
    /// Confidence in the classification, 0 to 1.
    pub confidence: f64,
    /// Human-readable summary.
    pub description: String,
    /// How many times this pattern has been (re-)observed.
    pub frequency: i64,
    /// When the pattern was last observed.
    pub recorded_at: NaiveDateTime
}
impl DbType for DelayPattern {
    fn table_name() -> &'static str {
        "train_delay_patterns"
    }
    fn from_row(row: &Row) -> RowResult<Self> {
        let ptype: String = row.get(4)?;
        Ok(Self {
            id: row.get(0)?,
            train_id: row.get(1)?,
            station: row.get(2)?,
            delay_minutes: row.get(3)?,
            pattern_type: PatternType::parse(&ptype),
            confidence: row.get(5)?,
            description: row.get(6)?,
            frequency: row.get(7)?,
            recorded_at: row.get(8)?
        })
    }
}

/// One prior pattern observation inside the analysis window.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PatternObservation {
    pub delay_minutes: i64,
    pub frequency: i64
}

/// Per-date delay aggregates, for the statistics queries.
#[derive(Debug, Clone, PartialEq)]
pub struct DelayStats {
    pub recorded_date: NaiveDate,
    pub avg_delay: f64,
    pub max_delay: i64,
    pub min_delay: i64,
    pub total_records: i64
}
