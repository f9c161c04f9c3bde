use super::*;
use crate::errors::SchaetzerError;
use crate::features::{LabelEncoder, MISSING_TIME};
use chrono::NaiveTime;
use std::path::PathBuf;
use vspt_rechner::types::{RawStatus, RunningStatus, TrackingRecord};

fn t(h: u32, m: u32) -> NaiveTime {
    NaiveTime::from_hms(h, m, 0)
}

fn record(train: &str, station: &str, sched: Option<NaiveTime>,
          actual: Option<NaiveTime>, delay: Option<i64>) -> TrackingRecord {
    TrackingRecord {
        train_id: train.into(),
        train_name: format!("{} Test Express", train),
        station: station.into(),
        status: RawStatus::Terminated,
        scheduled_time: sched,
        actual_time: actual,
        delay_minutes: delay,
        running_status: match delay {
            None => RunningStatus::Unknown,
            Some(d) if d > 5 => RunningStatus::Late,
            Some(d) if d < -5 => RunningStatus::Early,
            Some(_) => RunningStatus::OnTime
        }
    }
}

/// A small deterministic dataset: train 100 runs ~10 late out of NDLS,
/// train 200 runs on time out of BCT.
fn training_set() -> Vec<TrackingRecord> {
    let mut recs = vec![];
    for i in 0..10 {
        recs.push(record("100", "NDLS",
                         Some(t(9, i)), Some(t(9, i + 10)), Some(10)));
        recs.push(record("200", "BCT",
                         Some(t(14, i)), Some(t(14, i)), Some(0)));
    }
    recs
}

fn scratch_path(name: &str) -> PathBuf {
    std::env::temp_dir().join(format!("vspt-schaetzer-{}-{}.json", name, std::process::id()))
}

#[test]
fn test_label_encoder() {
    let mut enc = LabelEncoder::default();
    enc.fit(vec!["NDLS", "BCT", "NDLS", "CSTM"]);
    assert_eq!(enc.len(), 3);
    assert_eq!(enc.transform("NDLS").unwrap(), 0);
    assert_eq!(enc.transform("CSTM").unwrap(), 2);
    match enc.transform("MAS") {
        Err(SchaetzerError::UnknownCategory(c)) => assert_eq!(c, "MAS"),
        other => panic!("expected UnknownCategory, got {:?}", other.map(|_| ()))
    }
}

#[test]
fn test_feature_layout() {
    let mut enc = FeatureEncoder::new();
    let recs = vec![
        record("100", "NDLS", Some(t(9, 0)), Some(t(9, 12)), Some(12)),
        record("200", "BCT", None, Some(t(14, 30)), None),
    ];
    let (matrix, labels) = enc.fit_transform(&recs);
    assert_eq!(matrix[0], vec![0.0, 0.0, 9.0, 0.0, 9.0, 12.0]);
    assert_eq!(matrix[1], vec![1.0, 1.0, MISSING_TIME, MISSING_TIME, 14.0, 30.0]);
    // absent delay keeps its row, labelled 0.0
    assert_eq!(labels, vec![12.0, 0.0]);
}

#[test]
fn test_train_on_empty_input_is_loud() {
    let mut pred = DelayPredictor::new(scratch_path("empty"));
    match pred.train(&[]) {
        Err(SchaetzerError::InsufficientData) => {},
        other => panic!("expected InsufficientData, got {:?}", other.map(|_| ()))
    }
    assert!(!pred.is_trained());
}

#[test]
fn test_predict_length_always_matches_input() {
    let path = scratch_path("lengths");
    let _ = std::fs::remove_file(&path);
    let recs = training_set();
    // untrained, no artifact on disk: all zeros, same length
    let mut pred = DelayPredictor::new(&path);
    assert_eq!(pred.predict(&recs), vec![0; recs.len()]);
    // trained: still one prediction per record
    pred.train(&recs).unwrap();
    assert_eq!(pred.predict(&recs).len(), recs.len());
    let _ = std::fs::remove_file(&path);
}

#[test]
fn test_trained_predictions_separate_trains() {
    let path = scratch_path("separate");
    let recs = training_set();
    let mut pred = DelayPredictor::new(&path);
    let report = pred.train(&recs).unwrap();
    assert!(pred.is_trained());
    assert!(report.n_train > 0);
    let preds = pred.predict(&recs);
    for (rec, p) in recs.iter().zip(&preds) {
        if rec.train_id == "100" {
            assert!(*p > 5, "late train predicted {}", p);
        }
        else {
            assert!(*p < 5, "on-time train predicted {}", p);
        }
    }
    let _ = std::fs::remove_file(&path);
}

#[test]
fn test_artifact_round_trip() {
    let path = scratch_path("roundtrip");
    let recs = training_set();
    let mut pred = DelayPredictor::new(&path);
    pred.train(&recs).unwrap();
    let before = pred.predict(&recs);
    // fresh predictor, same path: lazy load inside predict
    let mut restored = DelayPredictor::new(&path);
    assert!(!restored.is_trained());
    let after = restored.predict(&recs);
    assert!(restored.is_trained());
    assert_eq!(before, after);
    let _ = std::fs::remove_file(&path);
}

#[test]
fn test_unseen_category_degrades_to_zeros() {
    let path = scratch_path("unseen");
    let recs = training_set();
    let mut pred = DelayPredictor::new(&path);
    pred.train(&recs).unwrap();
    let unseen = vec![record("999", "XYZ", Some(t(9, 0)), Some(t(9, 30)), Some(30))];
    assert_eq!(pred.predict(&unseen), vec![0]);
    let _ = std::fs::remove_file(&path);
}

#[test]
fn test_failed_load_resets_trained_flag() {
    let path = scratch_path("badload");
    std::fs::write(&path, b"not json").unwrap();
    let mut pred = DelayPredictor::new(&path);
    assert!(pred.load().is_err());
    assert!(!pred.is_trained());
    assert_eq!(pred.predict(&training_set()).len(), 20);
    let _ = std::fs::remove_file(&path);
}
