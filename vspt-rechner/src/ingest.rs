//! Builds `TrackingRecord`s out of raw string-keyed source rows.
//!
//! The input source hands us an opaque sequence of string maps, columns
//! captioned as in the upstream sheet: `Train Name`, `Location`,
//! `Status`, `WTT TIME` (scheduled) and `JUST TIME` (actual).

use std::collections::HashMap;
use log::*;

use crate::delay::DelayCalculator;
use crate::types::{RawStatus, TrackingRecord};
use crate::zeit::TimeNormalizer;

pub const COL_TRAIN_NAME: &str = "Train Name";
pub const COL_LOCATION: &str = "Location";
pub const COL_STATUS: &str = "Status";
pub const COL_SCHEDULED: &str = "WTT TIME";
pub const COL_ACTUAL: &str = "JUST TIME";

/// Pulls the leading run of digits out of a free-text train name.
fn leading_numeric_token(name: &str) -> Option<String> {
    let digits: String = name.trim()
        .chars()
        .take_while(|c| c.is_ascii_digit())
        .collect();
    if digits.is_empty() {
        None
    }
    else {
        Some(digits)
    }
}

/// Validates and uppercases a 2-5 letter station code.
fn station_code(raw: &str) -> Option<String> {
    let code = raw.trim().to_uppercase();
    if code.len() >= 2 && code.len() <= 5 && code.chars().all(|c| c.is_ascii_alphabetic()) {
        Some(code)
    }
    else {
        None
    }
}

/// Normalizes one raw row into a `TrackingRecord`.
///
/// Rows without a usable train number or station code are skipped
/// (returned as `None`); missing or garbled times degrade to absent
/// fields instead.
pub fn parse_row(normalizer: &TimeNormalizer, calc: &DelayCalculator,
                 row: &HashMap<String, String>) -> Option<TrackingRecord> {
    let field = |key: &str| row.get(key).map(|s| s.as_str()).unwrap_or("");
    let train_name = field(COL_TRAIN_NAME).trim().to_string();
    let train_id = match leading_numeric_token(&train_name) {
        Some(t) => t,
        None => {
            debug!("skipping row with unusable train name {:?}", train_name);
            return None;
        }
    };
    let station = match station_code(field(COL_LOCATION)) {
        Some(s) => s,
        None => {
            debug!("skipping row for train {} with unusable location {:?}",
                   train_id, field(COL_LOCATION));
            return None;
        }
    };
    let scheduled_time = normalizer.normalize(field(COL_SCHEDULED));
    let actual_time = normalizer.normalize(field(COL_ACTUAL));
    let delay_minutes = calc.delay(scheduled_time, actual_time);
    let running_status = calc.classify(delay_minutes);
    Some(TrackingRecord {
        train_id,
        train_name,
        station,
        status: RawStatus::parse(field(COL_STATUS)),
        scheduled_time,
        actual_time,
        delay_minutes,
        running_status
    })
}

/// Normalizes a whole poll cycle's worth of raw rows, dropping the
/// unusable ones.
pub fn parse_rows(normalizer: &TimeNormalizer, calc: &DelayCalculator,
                  rows: &[HashMap<String, String>]) -> Vec<TrackingRecord> {
    let records: Vec<TrackingRecord> = rows.iter()
        .filter_map(|r| parse_row(normalizer, calc, r))
        .collect();
    if records.len() < rows.len() {
        info!("dropped {} unusable rows of {}", rows.len() - records.len(), rows.len());
    }
    records
}
