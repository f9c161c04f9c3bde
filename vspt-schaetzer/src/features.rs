//! Label encoders and the fixed-layout feature encoding.

use chrono::{NaiveTime, Timelike};
use serde_derive::{Serialize, Deserialize};
use vspt_rechner::types::TrackingRecord;

use crate::errors::{Result, SchaetzerError};

/// Sentinel written for both components of a missing time.
pub const MISSING_TIME: f64 = -1.0;

/// Maps category strings to dense integer ids, in first-seen order.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct LabelEncoder {
    classes: Vec<String>
}
impl LabelEncoder {
    pub fn fit<'a, I: IntoIterator<Item = &'a str>>(&mut self, values: I) {
        self.classes.clear();
        for v in values {
            if !self.classes.iter().any(|c| c == v) {
                self.classes.push(v.to_string());
            }
        }
    }
    pub fn transform(&self, value: &str) -> Result<usize> {
        self.classes.iter()
            .position(|c| c == value)
            .ok_or_else(|| SchaetzerError::UnknownCategory(value.to_string()))
    }
    pub fn len(&self) -> usize {
        self.classes.len()
    }
    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }
}

fn time_features(time: Option<NaiveTime>) -> [f64; 2] {
    match time {
        Some(t) => [t.hour() as f64, t.minute() as f64],
        None => [MISSING_TIME, MISSING_TIME]
    }
}

/// Encodes records into the fixed feature layout
/// `[station_id, train_id, sched_hour, sched_min, actual_hour, actual_min]`.
///
/// `fit_transform` refits both label encoders from scratch on every call.
/// That mirrors the upstream behavior this was built against: categories
/// unseen since the last fit fail at inference time with
/// `UnknownCategory` rather than landing in a stable "unknown" bucket.
/// The predictor catches that failure and degrades to zeros.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct FeatureEncoder {
    stations: LabelEncoder,
    trains: LabelEncoder
}
impl FeatureEncoder {
    pub fn new() -> Self {
        Self::default()
    }
    /// Refits the encoders on `records` and produces the feature matrix
    /// plus the label vector of delay minutes.
    ///
    /// Records with an absent delay contribute a 0.0 label instead of
    /// being dropped, keeping feature and label rows aligned.
    pub fn fit_transform(&mut self, records: &[TrackingRecord]) -> (Vec<Vec<f64>>, Vec<f64>) {
        self.stations.fit(records.iter().map(|r| r.station.as_str()));
        self.trains.fit(records.iter().map(|r| r.train_id.as_str()));
        let mut matrix = Vec::with_capacity(records.len());
        let mut labels = Vec::with_capacity(records.len());
        for rec in records {
            // Can't fail: both encoders were just fit on these rows.
            let row = self.encode(rec)
                .expect("encoders fit on the same records");
            matrix.push(row);
            labels.push(rec.delay_minutes.unwrap_or(0) as f64);
        }
        (matrix, labels)
    }
    /// Encodes records with the already-fit encoders.
    pub fn transform(&self, records: &[TrackingRecord]) -> Result<Vec<Vec<f64>>> {
        records.iter().map(|r| self.encode(r)).collect()
    }
    fn encode(&self, rec: &TrackingRecord) -> Result<Vec<f64>> {
        let station = self.stations.transform(&rec.station)? as f64;
        let train = self.trains.transform(&rec.train_id)? as f64;
        let sched = time_features(rec.scheduled_time);
        let actual = time_features(rec.actual_time);
        Ok(vec![station, train, sched[0], sched[1], actual[0], actual[1]])
    }
    pub fn is_fit(&self) -> bool {
        !self.stations.is_empty()
    }
}
