//! Core record types for schedule adherence.

use chrono::NaiveTime;
use serde_derive::{Serialize, Deserialize};

/// Raw operational flag attached to an observation.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum RawStatus {
    /// Train terminated at this location (`TER`).
    Terminated,
    /// Train handed over / held at this location (`HO`).
    Held,
    /// Anything else.
    Unknown
}
impl RawStatus {
    pub fn parse(token: &str) -> Self {
        match token.trim().to_uppercase().as_str() {
            "TER" => RawStatus::Terminated,
            "HO" => RawStatus::Held,
            _ => RawStatus::Unknown
        }
    }
    pub fn as_str(&self) -> &'static str {
        match *self {
            RawStatus::Terminated => "TER",
            RawStatus::Held => "HO",
            RawStatus::Unknown => "UNKNOWN"
        }
    }
}

/// Early/on-time/late classification, derived from signed delay.
///
/// Never set independently of `delay_minutes`; an absent delay always
/// classifies as `Unknown`.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunningStatus {
    Early,
    OnTime,
    Late,
    Unknown
}
impl RunningStatus {
    pub fn parse(token: &str) -> Self {
        match token.trim().to_uppercase().as_str() {
            "EARLY" => RunningStatus::Early,
            "ON TIME" | "ON_TIME" => RunningStatus::OnTime,
            "LATE" => RunningStatus::Late,
            _ => RunningStatus::Unknown
        }
    }
    pub fn as_str(&self) -> &'static str {
        match *self {
            RunningStatus::Early => "EARLY",
            RunningStatus::OnTime => "ON TIME",
            RunningStatus::Late => "LATE",
            RunningStatus::Unknown => "UNKNOWN"
        }
    }
}

/// One train-station observation, normalized from a raw source row.
///
/// Created per poll cycle and consumed immediately by the predictor and
/// pattern analyzer; durable storage is the history store's job.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct TrackingRecord {
    /// Leading numeric token of the train's free-text designation.
    pub train_id: String,
    /// The full free-text train designation.
    pub train_name: String,
    /// 2-5 letter station code, uppercased.
    pub station: String,
    /// Raw operational flag.
    pub status: RawStatus,
    /// Scheduled (WTT) time, if one parsed.
    pub scheduled_time: Option<NaiveTime>,
    /// Actual observed time, if one parsed.
    pub actual_time: Option<NaiveTime>,
    /// Signed delay in minutes; positive = late. Absent when either
    /// time is missing.
    pub delay_minutes: Option<i64>,
    /// Classification of `delay_minutes` against the lateness threshold.
    pub running_status: RunningStatus
}
