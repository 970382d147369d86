//! Message timestamps.
//!
//! Archives store `ts` as a decimal string of Unix epoch seconds with a
//! microsecond fraction (`"1704412800.000200"`). Parsing into `f64` would
//! lose the last digits, so the integer and fractional parts are kept apart
//! for exact ordering.

use std::cmp::Ordering;
use std::fmt::Write as _;

use chrono::{DateTime, Local, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Time zone used to turn epoch timestamps into calendar dates.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Zone {
    /// The machine's local time zone.
    #[default]
    Local,
    Utc,
}

impl std::str::FromStr for Zone {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "local" => Ok(Self::Local),
            "utc" => Ok(Self::Utc),
            other => Err(format!("unknown time zone '{other}' (expected local or utc)")),
        }
    }
}

/// A parsed `ts` value. Ordering ignores the raw text.
#[derive(Debug, Clone)]
pub struct Timestamp {
    raw: String,
    seconds: i64,
    nanos: u32,
}

impl Timestamp {
    /// Parse a numeric epoch string. Returns `None` if it is not a number.
    pub fn parse(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        let (int_part, frac_part) = trimmed.split_once('.').unwrap_or((trimmed, ""));

        let exact = !int_part.is_empty()
            && int_part.bytes().all(|b| b.is_ascii_digit())
            && frac_part.bytes().all(|b| b.is_ascii_digit());

        if exact {
            let seconds: i64 = int_part.parse().ok()?;
            let mut digits: String = frac_part.chars().take(9).collect();
            while digits.len() < 9 {
                digits.push('0');
            }
            let nanos: u32 = digits.parse().ok()?;
            return Some(Self {
                raw: raw.to_string(),
                seconds,
                nanos,
            });
        }

        // Exponent notation, negative values, etc.
        let value: f64 = trimmed.parse().ok()?;
        if !value.is_finite() {
            return None;
        }
        let floor = value.floor();
        let nanos = (((value - floor) * 1e9).round() as u32).min(999_999_999);
        Some(Self {
            raw: raw.to_string(),
            seconds: floor as i64,
            nanos,
        })
    }

    /// The original `ts` text.
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub fn seconds(&self) -> i64 {
        self.seconds
    }

    /// UTC instant, or `None` if out of chrono's range.
    pub fn to_utc(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.seconds, self.nanos)
    }

    /// Calendar date of this timestamp in the given zone.
    pub fn date(&self, zone: Zone) -> Option<NaiveDate> {
        let utc = self.to_utc()?;
        Some(match zone {
            Zone::Local => utc.with_timezone(&Local).date_naive(),
            Zone::Utc => utc.date_naive(),
        })
    }

    /// Render with a `strftime` pattern, falling back to the raw text when
    /// the pattern is invalid or the instant is out of range.
    pub fn format(&self, zone: Zone, pattern: &str) -> String {
        let Some(utc) = self.to_utc() else {
            return self.raw.clone();
        };
        let mut out = String::new();
        let written = match zone {
            Zone::Local => write!(out, "{}", utc.with_timezone(&Local).format(pattern)),
            Zone::Utc => write!(out, "{}", utc.format(pattern)),
        };
        if written.is_err() {
            return self.raw.clone();
        }
        out
    }
}

impl PartialEq for Timestamp {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Timestamp {}

impl PartialOrd for Timestamp {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Timestamp {
    fn cmp(&self, other: &Self) -> Ordering {
        (self.seconds, self.nanos).cmp(&(other.seconds, other.nanos))
    }
}

impl Serialize for Timestamp {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.raw)
    }
}

impl std::fmt::Display for Timestamp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_keeps_microseconds() {
        let a = Timestamp::parse("1704412800.000200").unwrap();
        let b = Timestamp::parse("1704412800.000201").unwrap();
        assert!(a < b);
        assert_eq!(a.seconds(), 1_704_412_800);
        assert_eq!(a.as_str(), "1704412800.000200");
    }

    #[test]
    fn test_parse_integer_and_float_forms() {
        let a = Timestamp::parse("1704412800").unwrap();
        let b = Timestamp::parse("1.7044128e9").unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(Timestamp::parse("").is_none());
        assert!(Timestamp::parse("yesterday").is_none());
        assert!(Timestamp::parse("NaN").is_none());
    }

    #[test]
    fn test_date_utc() {
        let ts = Timestamp::parse("1704412800.000200").unwrap();
        assert_eq!(
            ts.date(Zone::Utc),
            NaiveDate::from_ymd_opt(2024, 1, 5)
        );
    }

    #[test]
    fn test_format_utc() {
        let ts = Timestamp::parse("1704456000").unwrap();
        assert_eq!(ts.format(Zone::Utc, "%Y-%m-%d %H:%M:%S"), "2024-01-05 12:00:00");
    }

    #[test]
    fn test_local_zone_within_a_day_of_utc() {
        let ts = Timestamp::parse("1704456000.000200").unwrap();
        let utc = ts.date(Zone::Utc).unwrap();
        let local = ts.date(Zone::Local).unwrap();
        assert!((local - utc).num_days().abs() <= 1);

        let rendered = ts.format(Zone::Local, "%Y-%m-%d %H:%M:%S%.6f");
        assert!(rendered.ends_with(".000200"), "got {rendered}");
        assert_eq!(Zone::default(), Zone::Local);
    }

    #[test]
    fn test_zone_from_str() {
        assert_eq!("UTC".parse::<Zone>(), Ok(Zone::Utc));
        assert_eq!("local".parse::<Zone>(), Ok(Zone::Local));
        assert!("mars".parse::<Zone>().is_err());
    }
}
