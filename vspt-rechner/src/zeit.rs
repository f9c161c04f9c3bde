//! Time normalization for heterogeneous time-like strings.

use chrono::NaiveTime;
use regex::Regex;

/// Column captions that sometimes get echoed into data rows; these are
/// treated as absent times, not parse failures.
static HEADER_TOKENS: &[&str] = &["WTT TIME", "JUST TIME", "TIME"];

/// Parses loosely-formatted time strings into canonical times.
///
/// Accepts `HH:MM`, the `HH;MM` semicolon typo, and times embedded in
/// noisier strings (trailing annotations and the like). Hours >= 24 and
/// minutes >= 60 are rejected rather than raised.
pub struct TimeNormalizer {
    embedded: Regex
}
impl TimeNormalizer {
    pub fn new() -> Self {
        Self {
            embedded: Regex::new(r"(\d{1,2})[:;](\d{2})")
                .expect("time pattern must compile")
        }
    }
    /// Extracts a canonical time from `raw`, if one is present.
    ///
    /// Idempotent over its own canonical rendering: normalizing an
    /// already-canonical `HH:MM` string returns the same time.
    pub fn normalize(&self, raw: &str) -> Option<NaiveTime> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return None;
        }
        if HEADER_TOKENS.iter().any(|h| trimmed.eq_ignore_ascii_case(h)) {
            return None;
        }
        let caps = self.embedded.captures(trimmed)?;
        let hour: u32 = caps[1].parse().ok()?;
        let minute: u32 = caps[2].parse().ok()?;
        // from_hms_opt rejects hour >= 24 / minute >= 60 for us.
        NaiveTime::from_hms_opt(hour, minute, 0)
    }
    /// Renders a time back out in the canonical `HH:MM` form.
    pub fn canonical(time: NaiveTime) -> String {
        time.format("%H:%M").to_string()
    }
}
impl Default for TimeNormalizer {
    fn default() -> Self {
        Self::new()
    }
}
