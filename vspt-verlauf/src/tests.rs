use super::*;
use crate::errors::{Result, VerlaufError};
use crate::store::{HistoryStore, PatternUpdate, SqliteHistoryStore};
use crate::types::*;
use chrono::{Duration, Local, NaiveTime};
use std::cell::RefCell;
use std::sync::atomic::{AtomicUsize, Ordering};
use vspt_rechner::types::{RawStatus, RunningStatus, TrackingRecord};
use vspt_sqlite::{r2d2, VsptConnectionManager};
use vspt_sqlite::errors::SqlError;

/// In-memory store for exercising the analyzer without SQLite.
#[derive(Default)]
struct MemStore {
    history: RefCell<Vec<HistoryRecord>>,
    observations: RefCell<Vec<PatternObservation>>,
    upserts: RefCell<Vec<PatternUpdate>>,
    poisoned: bool
}
impl MemStore {
    fn with_delays(delays: &[i64]) -> Self {
        let store = Self::default();
        store.observations.borrow_mut().extend(
            delays.iter().map(|&d| PatternObservation {
                delay_minutes: d,
                frequency: 1
            }));
        store
    }
    fn poisoned() -> Self {
        Self { poisoned: true, ..Self::default() }
    }
    fn fail(&self) -> VerlaufError {
        VerlaufError::Sql(SqlError::DatabaseTooNew)
    }
}
impl HistoryStore for MemStore {
    fn append_history(&self, records: &[HistoryRecord]) -> Result<()> {
        if self.poisoned {
            return Err(self.fail());
        }
        self.history.borrow_mut().extend(records.iter().cloned());
        Ok(())
    }
    fn query_recent_patterns(&self, _train_id: &str, _station: &str,
                             _window_days: i64) -> Result<Vec<PatternObservation>> {
        if self.poisoned {
            return Err(self.fail());
        }
        Ok(self.observations.borrow().clone())
    }
    fn upsert_pattern(&self, update: &PatternUpdate) -> Result<()> {
        if self.poisoned {
            return Err(self.fail());
        }
        self.upserts.borrow_mut().push(update.clone());
        Ok(())
    }
}

fn t(h: u32, m: u32) -> NaiveTime {
    NaiveTime::from_hms(h, m, 0)
}

fn late_record(train: &str, station: &str, delay: i64) -> TrackingRecord {
    TrackingRecord {
        train_id: train.into(),
        train_name: format!("{} Test Express", train),
        station: station.into(),
        status: RawStatus::Terminated,
        scheduled_time: Some(t(9, 0)),
        actual_time: Some(t(9, delay.rem_euclid(60) as u32)),
        delay_minutes: Some(delay),
        running_status: if delay > 5 { RunningStatus::Late } else { RunningStatus::OnTime }
    }
}

#[test]
fn test_pattern_no_history_is_irregular() {
    let store = MemStore::default();
    let analyzer = PatternAnalyzer::new(&store);
    let pat = analyzer.analyze_and_record("100", "NDLS", 20).unwrap();
    assert_eq!(pat.pattern_type, PatternType::Irregular);
    assert_eq!(pat.confidence, 0.5);
    assert_eq!(pat.description, "Occasional delay detected");
    assert_eq!(store.upserts.borrow().len(), 1);
}

#[test]
fn test_pattern_consistent() {
    let store = MemStore::with_delays(&[10, 11, 9, 10, 12]);
    let analyzer = PatternAnalyzer::new(&store);
    let pat = analyzer.analyze_and_record("100", "NDLS", 10).unwrap();
    assert_eq!(pat.pattern_type, PatternType::Consistent);
    assert!(pat.confidence >= 0.5);
    // five prior observations, frequency 1 each: 0.5 + 5/20
    assert!((pat.confidence - 0.75).abs() < 1e-9);
}

#[test]
fn test_pattern_consistent_confidence_caps() {
    let store = MemStore::default();
    store.observations.borrow_mut().push(PatternObservation {
        delay_minutes: 10,
        frequency: 40
    });
    let analyzer = PatternAnalyzer::new(&store);
    let pat = analyzer.analyze_and_record("100", "NDLS", 10).unwrap();
    assert_eq!(pat.pattern_type, PatternType::Consistent);
    assert!((pat.confidence - 0.9).abs() < 1e-9);
}

#[test]
fn test_pattern_increasing_and_decreasing() {
    let store = MemStore::with_delays(&[10, 10, 10]);
    let analyzer = PatternAnalyzer::new(&store);
    let pat = analyzer.analyze_and_record("100", "NDLS", 25).unwrap();
    assert_eq!(pat.pattern_type, PatternType::Increasing);
    assert_eq!(pat.confidence, 0.7);

    let store = MemStore::with_delays(&[30, 30, 30]);
    let analyzer = PatternAnalyzer::new(&store);
    let pat = analyzer.analyze_and_record("100", "NDLS", 15).unwrap();
    assert_eq!(pat.pattern_type, PatternType::Decreasing);
    assert_eq!(pat.confidence, 0.7);
}

#[test]
fn test_pattern_between_bands_is_irregular() {
    // 8 above a 10-minute average: outside the consistent band, inside
    // the trend band.
    let store = MemStore::with_delays(&[10, 10, 10]);
    let analyzer = PatternAnalyzer::new(&store);
    let pat = analyzer.analyze_and_record("100", "NDLS", 18).unwrap();
    assert_eq!(pat.pattern_type, PatternType::Irregular);
    assert_eq!(pat.confidence, 0.5);
}

#[test]
fn test_record_cycle_analyzes_only_late_records() {
    let store = MemStore::default();
    let writer = HistoryWriter::new(&store);
    let records = vec![
        late_record("100", "NDLS", 12),
        late_record("200", "BCT", 0),
        late_record("300", "CSTM", -4),
    ];
    assert!(writer.record_cycle(&records));
    assert_eq!(store.history.borrow().len(), 3);
    let upserts = store.upserts.borrow();
    assert_eq!(upserts.len(), 1);
    assert_eq!(upserts[0].train_id, "100");
}

#[test]
fn test_record_cycle_reports_storage_failure() {
    let store = MemStore::poisoned();
    let writer = HistoryWriter::new(&store);
    assert!(!writer.record_cycle(&[late_record("100", "NDLS", 12)]));
}

static DB_COUNTER: AtomicUsize = AtomicUsize::new(0);

fn scratch_store() -> (SqliteHistoryStore, std::path::PathBuf) {
    let n = DB_COUNTER.fetch_add(1, Ordering::SeqCst);
    let path = std::env::temp_dir()
        .join(format!("vspt-verlauf-test-{}-{}.sqlite", std::process::id(), n));
    let _ = std::fs::remove_file(&path);
    let manager = VsptConnectionManager::initialize(path.to_str().unwrap(), &MIGRATIONS)
        .unwrap();
    let pool = r2d2::Pool::builder()
        .max_size(2)
        .build(manager)
        .unwrap();
    (SqliteHistoryStore::new(pool), path)
}

#[test]
fn test_sqlite_history_round_trip() {
    let (store, path) = scratch_store();
    let records: Vec<HistoryRecord> = vec![
        late_record("100", "NDLS", 12),
        late_record("100", "BCT", 3),
        late_record("200", "NDLS", 0),
    ].iter().map(HistoryRecord::from_tracking).collect();
    store.append_history(&records).unwrap();

    let hist = store.train_history("100", 7).unwrap();
    assert_eq!(hist.len(), 2);
    assert!(hist.iter().all(|h| h.train_id == "100"));

    let hist = store.station_history("NDLS", 7).unwrap();
    assert_eq!(hist.len(), 2);

    let all = store.recent_history(7).unwrap();
    assert_eq!(all.len(), 3);
    assert_eq!(all[0].to_tracking().train_name, records[0].train_name);

    let _ = std::fs::remove_file(&path);
}

#[test]
fn test_sqlite_upsert_increments_frequency() {
    let (store, path) = scratch_store();
    let update = PatternUpdate {
        train_id: "100".into(),
        station: "NDLS".into(),
        delay_minutes: 12,
        pattern_type: PatternType::Irregular,
        confidence: 0.5,
        description: "Occasional delay detected".into()
    };
    store.upsert_pattern(&update).unwrap();
    let mut second = update.clone();
    second.delay_minutes = 15;
    second.pattern_type = PatternType::Consistent;
    second.confidence = 0.75;
    store.upsert_pattern(&second).unwrap();

    let pat = store.pattern_for("100", "NDLS").unwrap().unwrap();
    assert_eq!(pat.frequency, 2);
    assert_eq!(pat.delay_minutes, 15);
    assert_eq!(pat.pattern_type, PatternType::Consistent);

    let obs = store.query_recent_patterns("100", "NDLS", 7).unwrap();
    assert_eq!(obs.len(), 1);
    assert_eq!(obs[0], PatternObservation { delay_minutes: 15, frequency: 2 });

    // other keys stay invisible
    assert!(store.pattern_for("100", "BCT").unwrap().is_none());

    let _ = std::fs::remove_file(&path);
}

#[test]
fn test_sqlite_statistics_and_cleanup() {
    let (store, path) = scratch_store();
    let mut old = HistoryRecord::from_tracking(&late_record("100", "NDLS", 20));
    old.recorded_date = Local::now().naive_local().date() - Duration::days(60);
    let recent: Vec<HistoryRecord> = vec![
        late_record("100", "NDLS", 10),
        late_record("100", "NDLS", 20),
    ].iter().map(HistoryRecord::from_tracking).collect();
    store.append_history(&[old]).unwrap();
    store.append_history(&recent).unwrap();

    let stats = store.delay_statistics(Some("100"), None, 7).unwrap();
    assert_eq!(stats.len(), 1);
    assert_eq!(stats[0].total_records, 2);
    assert_eq!(stats[0].max_delay, 20);
    assert_eq!(stats[0].min_delay, 10);
    assert!((stats[0].avg_delay - 15.0).abs() < 1e-9);

    let removed = store.cleanup_old_records(30).unwrap();
    assert_eq!(removed, 1);
    assert_eq!(store.recent_history(90).unwrap().len(), 2);

    let _ = std::fs::remove_file(&path);
}

#[test]
fn test_full_cycle_against_sqlite() {
    let (store, path) = scratch_store();
    let writer = HistoryWriter::new(&store);
    let records = vec![late_record("100", "NDLS", 10)];
    // two cycles: second observation lands in the consistent band
    assert!(writer.record_cycle(&records));
    assert!(writer.record_cycle(&records));
    let pat = store.pattern_for("100", "NDLS").unwrap().unwrap();
    assert_eq!(pat.frequency, 2);
    assert_eq!(pat.pattern_type, PatternType::Consistent);
    let _ = std::fs::remove_file(&path);
}
