//! Time primitives shared by the task model, store and timer evaluator.
//!
//! # Responsibility
//! - Define the canonical timestamp type and its wire encoding.
//! - Provide injectable clocks so time-dependent logic stays testable.
//!
//! # Invariants
//! - Every timestamp produced by a `Clock` is truncated to milliseconds.
//! - Wire form is RFC 3339 with exactly three fractional digits and `Z`.
//! - Truncated timestamps round-trip through the wire form without loss.

use chrono::{DateTime, SecondsFormat, Timelike, Utc};
use std::sync::Mutex;

/// UTC instant used for `createdAt` and timer start times.
pub type Timestamp = DateTime<Utc>;

/// Source of "now" for the store and the recurring expiry check.
pub trait Clock: Send + Sync {
    fn now(&self) -> Timestamp;
}

/// Wall-clock time, truncated to millisecond precision.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Timestamp {
        truncate_to_millis(Utc::now())
    }
}

/// Manually driven clock for deterministic tests and replays.
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<Timestamp>,
}

impl ManualClock {
    pub fn new(start: Timestamp) -> Self {
        Self {
            now: Mutex::new(truncate_to_millis(start)),
        }
    }

    /// Moves the clock to an absolute instant.
    pub fn set(&self, instant: Timestamp) {
        *self.lock() = truncate_to_millis(instant);
    }

    /// Advances the clock by whole seconds.
    pub fn advance_secs(&self, seconds: i64) {
        let mut now = self.lock();
        *now += chrono::Duration::seconds(seconds);
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Timestamp> {
        self.now.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Timestamp {
        *self.lock()
    }
}

/// Drops sub-millisecond precision so the value survives the wire format.
pub fn truncate_to_millis(instant: Timestamp) -> Timestamp {
    let millis_only = (instant.nanosecond() / 1_000_000) * 1_000_000;
    instant.with_nanosecond(millis_only).unwrap_or(instant)
}

/// Formats a timestamp the way `Date.prototype.toISOString` does.
pub fn format_iso_millis(instant: &Timestamp) -> String {
    instant.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Parses any RFC 3339 timestamp into UTC.
pub fn parse_iso(value: &str) -> Result<Timestamp, chrono::ParseError> {
    DateTime::parse_from_rfc3339(value.trim()).map(|parsed| parsed.with_timezone(&Utc))
}

/// Serde adapter for `Timestamp` fields using the millisecond ISO form.
pub mod iso_millis {
    use super::{format_iso_millis, parse_iso, Timestamp};
    use serde::{de::Error, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Timestamp, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&format_iso_millis(value))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Timestamp, D::Error> {
        let raw = String::deserialize(deserializer)?;
        parse_iso(&raw).map_err(|err| D::Error::custom(format!("invalid timestamp `{raw}`: {err}")))
    }
}
