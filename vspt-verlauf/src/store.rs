//! The history storage boundary.
//!
//! Everything the analyzer needs from durable storage goes through the
//! `HistoryStore` trait; `SqliteHistoryStore` is the real
//! implementation over a pooled SQLite database.

use chrono::{Duration, Local, NaiveDateTime, Utc};
use log::*;
use vspt_sqlite::VsptPool;
use vspt_sqlite::traits::*;
use vspt_sqlite::rusqlite::types::ToSql;

use crate::errors::Result;
use crate::types::{DelayPattern, DelayStats, HistoryRecord, PatternObservation, PatternType};

/// Fields written by a pattern upsert. The row's `frequency` and
/// `recorded_at` are managed by the store itself.
#[derive(Debug, Clone, PartialEq)]
pub struct PatternUpdate {
    pub train_id: String,
    pub station: String,
    pub delay_minutes: i64,
    pub pattern_type: PatternType,
    pub confidence: f64,
    pub description: String
}

/// Durable storage consumed by the pattern analyzer and history writer.
pub trait HistoryStore {
    /// Appends a batch of observations to the history log.
    fn append_history(&self, records: &[HistoryRecord]) -> Result<()>;
    /// Returns pattern observations for a (train, station) pair
    /// recorded within the trailing `window_days`.
    fn query_recent_patterns(&self, train_id: &str, station: &str,
                             window_days: i64) -> Result<Vec<PatternObservation>>;
    /// Inserts a pattern row with frequency 1, or - if one already
    /// exists for the key - overwrites its fields, increments
    /// `frequency` and refreshes `recorded_at`.
    fn upsert_pattern(&self, update: &PatternUpdate) -> Result<()>;
}

/// `HistoryStore` over a pooled SQLite database.
pub struct SqliteHistoryStore {
    pool: VsptPool
}
impl SqliteHistoryStore {
    pub fn new(pool: VsptPool) -> Self {
        Self { pool }
    }
    fn window_start(window_days: i64) -> NaiveDateTime {
        Utc::now().naive_utc() - Duration::days(window_days)
    }
    /// Recent history for one train, newest first.
    pub fn train_history(&self, train_id: &str, days: i64) -> Result<Vec<HistoryRecord>> {
        let db = self.pool.get()?;
        let cutoff = Local::now().naive_local().date() - Duration::days(days);
        Ok(HistoryRecord::from_select(&db,
            "WHERE train_id = ? AND recorded_date >= ?
             ORDER BY recorded_date DESC, actual_time DESC",
            params![train_id, cutoff])?)
    }
    /// Recent history for one station, newest first.
    pub fn station_history(&self, station: &str, days: i64) -> Result<Vec<HistoryRecord>> {
        let db = self.pool.get()?;
        let cutoff = Local::now().naive_local().date() - Duration::days(days);
        Ok(HistoryRecord::from_select(&db,
            "WHERE station = ? AND recorded_date >= ?
             ORDER BY recorded_date DESC, actual_time DESC",
            params![station, cutoff])?)
    }
    /// All recent history, newest first. Feeds predictor training.
    pub fn recent_history(&self, days: i64) -> Result<Vec<HistoryRecord>> {
        let db = self.pool.get()?;
        let cutoff = Local::now().naive_local().date() - Duration::days(days);
        Ok(HistoryRecord::from_select(&db,
            "WHERE recorded_date >= ?
             ORDER BY recorded_date DESC, actual_time DESC",
            params![cutoff])?)
    }
    /// The current pattern row for a key, if any.
    pub fn pattern_for(&self, train_id: &str, station: &str) -> Result<Option<DelayPattern>> {
        let db = self.pool.get()?;
        Ok(DelayPattern::from_select(&db,
            "WHERE train_id = ? AND station = ?",
            params![train_id, station])?
           .into_iter()
           .nth(0))
    }
    /// Per-date delay aggregates, optionally filtered by train and/or
    /// station, newest date first.
    pub fn delay_statistics(&self, train_id: Option<&str>, station: Option<&str>,
                            days: i64) -> Result<Vec<DelayStats>> {
        let db = self.pool.get()?;
        let cutoff = Local::now().naive_local().date() - Duration::days(days);
        let mut clauses = vec!["recorded_date >= ?".to_string()];
        let mut args: Vec<&dyn ToSql> = vec![&cutoff];
        if let Some(ref t) = train_id {
            clauses.push("train_id = ?".into());
            args.push(t);
        }
        if let Some(ref s) = station {
            clauses.push("station = ?".into());
            args.push(s);
        }
        let query = format!(
            "SELECT recorded_date,
                    AVG(delay_minutes) AS avg_delay,
                    MAX(delay_minutes) AS max_delay,
                    MIN(delay_minutes) AS min_delay,
                    COUNT(*) AS total_records
             FROM train_history
             WHERE delay_minutes IS NOT NULL AND {}
             GROUP BY recorded_date
             ORDER BY recorded_date DESC", clauses.join(" AND "));
        let mut stmt = db.prepare(&query)?;
        let rows = stmt.query_map(&args, |row| {
            Ok(DelayStats {
                recorded_date: row.get(0)?,
                avg_delay: row.get(1)?,
                max_delay: row.get(2)?,
                min_delay: row.get(3)?,
                total_records: row.get(4)?
            })
        })?;
        let mut ret = vec![];
        for row in rows {
            ret.push(row?);
        }
        Ok(ret)
    }
    /// Deletes history older than `days_to_keep` days. Returns the
    /// number of rows removed.
    pub fn cleanup_old_records(&self, days_to_keep: i64) -> Result<usize> {
        let db = self.pool.get()?;
        let cutoff = Local::now().naive_local().date() - Duration::days(days_to_keep);
        let rows = db.execute("DELETE FROM train_history WHERE recorded_date < ?",
                              params![cutoff])?;
        info!("cleaned up {} history rows older than {}", rows, cutoff);
        Ok(rows)
    }
}
impl HistoryStore for SqliteHistoryStore {
    fn append_history(&self, records: &[HistoryRecord]) -> Result<()> {
        let mut db = self.pool.get()?;
        let trans = db.transaction()?;
        for rec in records {
            rec.insert_self(&trans)?;
        }
        trans.commit()?;
        info!("saved {} records to history", records.len());
        Ok(())
    }
    fn query_recent_patterns(&self, train_id: &str, station: &str,
                             window_days: i64) -> Result<Vec<PatternObservation>> {
        let db = self.pool.get()?;
        let cutoff = Self::window_start(window_days);
        let mut stmt = db.prepare(
            "SELECT delay_minutes, frequency FROM train_delay_patterns
             WHERE train_id = ? AND station = ? AND recorded_at >= ?
             ORDER BY recorded_at DESC")?;
        let rows = stmt.query_map(params![train_id, station, cutoff], |row| {
            Ok(PatternObservation {
                delay_minutes: row.get(0)?,
                frequency: row.get(1)?
            })
        })?;
        let mut ret = vec![];
        for row in rows {
            ret.push(row?);
        }
        Ok(ret)
    }
    fn upsert_pattern(&self, update: &PatternUpdate) -> Result<()> {
        let db = self.pool.get()?;
        // Single statement, so the frequency increment is atomic at the
        // storage level even if the host application parallelizes cycles.
        db.execute(
            "INSERT INTO train_delay_patterns
             (train_id, station, delay_minutes, pattern_type, confidence,
              description, frequency, recorded_at)
             VALUES (?, ?, ?, ?, ?, ?, 1, ?)
             ON CONFLICT (train_id, station) DO UPDATE SET
                delay_minutes = excluded.delay_minutes,
                pattern_type = excluded.pattern_type,
                confidence = excluded.confidence,
                description = excluded.description,
                frequency = train_delay_patterns.frequency + 1,
                recorded_at = excluded.recorded_at",
            params![update.train_id, update.station, update.delay_minutes,
                    update.pattern_type.as_str(), update.confidence,
                    update.description, Utc::now().naive_utc()])?;
        Ok(())
    }
}
