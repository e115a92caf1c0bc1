//! Canonical timestamp wire format.
//!
//! Timestamps serialize as ISO-8601 UTC with second precision and a `Z`
//! suffix. Inbound values accept any RFC 3339 offset (normalized to UTC)
//! as well as naive date-times, which are interpreted as UTC.

use chrono::{DateTime, NaiveDateTime, Utc};

const WIRE_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S",
];

/// Render a timestamp in the canonical wire format.
pub fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.format(WIRE_FORMAT).to_string()
}

/// Parse a wire timestamp, assuming UTC when no offset is given.
pub fn parse_timestamp(raw: &str) -> anyhow::Result<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Ok(dt.with_timezone(&Utc));
    }

    for format in NAIVE_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
            return Ok(DateTime::from_naive_utc_and_offset(naive, Utc));
        }
    }

    anyhow::bail!("Invalid timestamp '{raw}': expected ISO-8601, e.g. 2025-01-31T10:00:00Z")
}

/// Serde adapter for required timestamp fields.
pub mod utc_second {
    use super::*;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(ts: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&format_timestamp(ts))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<DateTime<Utc>, D::Error> {
        let raw = String::deserialize(deserializer)?;
        parse_timestamp(&raw).map_err(serde::de::Error::custom)
    }
}

/// Serde adapter for optional timestamp fields.
pub mod utc_second_opt {
    use super::*;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(
        ts: &Option<DateTime<Utc>>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match ts {
            Some(ts) => serializer.serialize_some(&format_timestamp(ts)),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<DateTime<Utc>>, D::Error> {
        match Option::<String>::deserialize(deserializer)? {
            Some(raw) => parse_timestamp(&raw)
                .map(Some)
                .map_err(serde::de::Error::custom),
            None => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn formats_with_second_precision_and_z_suffix() {
        let ts = Utc.with_ymd_and_hms(2025, 1, 31, 10, 30, 45).unwrap();
        assert_eq!(format_timestamp(&ts), "2025-01-31T10:30:45Z");
    }

    #[test]
    fn parses_utc_timestamps() {
        let ts = parse_timestamp("2025-01-31T10:30:45Z").unwrap();
        assert_eq!(ts, Utc.with_ymd_and_hms(2025, 1, 31, 10, 30, 45).unwrap());
    }

    #[test]
    fn normalizes_offsets_to_utc() {
        let ts = parse_timestamp("2025-01-31T13:30:45+03:00").unwrap();
        assert_eq!(ts, Utc.with_ymd_and_hms(2025, 1, 31, 10, 30, 45).unwrap());
    }

    #[test]
    fn naive_timestamps_are_assumed_utc() {
        let ts = parse_timestamp("2025-01-31T10:30:45").unwrap();
        assert_eq!(ts, Utc.with_ymd_and_hms(2025, 1, 31, 10, 30, 45).unwrap());
    }

    #[test]
    fn rejects_garbage() {
        assert!(parse_timestamp("31.01.2025 10:30").is_err());
        assert!(parse_timestamp("not-a-date").is_err());
    }
}
