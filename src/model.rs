use chrono::{DateTime, NaiveDate, NaiveDateTime, Timelike};
use serde::{Deserialize, Serialize};

/// Naive wall-clock instant at whole-minute resolution. The only time type.
pub type Minute = NaiveDateTime;

/// Canonical text encoding for every emitted timestamp.
pub const MINUTE_FORMAT: &str = "%Y-%m-%dT%H:%M";

const NAIVE_FORMATS: &[&str] = &[
    MINUTE_FORMAT,
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
];

/// Parse a raw timestamp into a [`Minute`].
///
/// Accepts the `datetime-local` form (`2025-01-06T09:00`), optional seconds, a space
/// separator, RFC 3339 with an offset (the offset is dropped, wall-clock digits kept) and a
/// bare date (midnight). Non-zero seconds are rejected rather than rounded away.
pub fn parse_timestamp(raw: &str) -> Option<Minute> {
    let raw = raw.trim();
    let parsed = NAIVE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .or_else(|| DateTime::parse_from_rfc3339(raw).ok().map(|dt| dt.naive_local()))
        .or_else(|| {
            NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })?;
    (parsed.second() == 0 && parsed.nanosecond() == 0).then_some(parsed)
}

pub fn format_minute(t: &Minute) -> String {
    t.format(MINUTE_FORMAT).to_string()
}

/// Half-open interval `[start, end)` on the wall clock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TimeRange {
    #[serde(rename = "startTime", with = "minute_text")]
    pub start: Minute,
    #[serde(rename = "endTime", with = "minute_text")]
    pub end: Minute,
}

impl TimeRange {
    pub fn new(start: Minute, end: Minute) -> Self {
        debug_assert!(start < end, "TimeRange start must be before end");
        Self { start, end }
    }

    /// Touching endpoints do not overlap.
    pub fn overlaps(&self, other: &TimeRange) -> bool {
        self.start < other.end && self.end > other.start
    }

    /// Smallest range covering both `self` and `other`.
    pub fn union(&self, other: &TimeRange) -> TimeRange {
        TimeRange {
            start: self.start.min(other.start),
            end: self.end.max(other.end),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SlotStatus {
    Available,
    /// Never produced by the store; kept so clients can round-trip the full status set.
    Booked,
}

/// A stored slot. Serializes as `{id, providerName, startTime, endTime, status}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Slot {
    pub id: u64,
    #[serde(rename = "providerName")]
    pub owner: String,
    #[serde(flatten)]
    pub range: TimeRange,
    pub status: SlotStatus,
}

impl Slot {
    pub fn available(id: u64, owner: String, range: TimeRange) -> Self {
        Self {
            id,
            owner,
            range,
            status: SlotStatus::Available,
        }
    }
}

mod minute_text {
    use serde::{Deserialize, Deserializer, Serializer};

    use super::{format_minute, parse_timestamp, Minute};

    pub fn serialize<S: Serializer>(t: &Minute, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&format_minute(t))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Minute, D::Error> {
        let raw = String::deserialize(d)?;
        parse_timestamp(&raw)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid timestamp: {raw}")))
    }
}
