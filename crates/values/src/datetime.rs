//! Precision-tagged date/time values.
//!
//! A FHIR date/time literal carries its own granularity: `"2020"` means the
//! whole of 2020, not an instant inside it. [`PrecisionDateTime`] keeps the
//! decoded calendar fields together with the precision the literal was written
//! at, re-emits only the components that precision implies, and exposes the
//! half-open instant interval the literal denotes so mixed-precision values
//! can be ordered on a single axis.

use crate::{ValueError, ValueResult};
use chrono::{
    DateTime, Days, Duration, FixedOffset, Months, NaiveDate, NaiveDateTime, NaiveTime, Timelike,
    Utc,
};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// Granularity of a date/time literal.
///
/// Closed enumeration: every successfully parsed value carries exactly one of
/// these, so serialisation can never meet an unknown precision.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DateTimePrecision {
    /// `YYYY`
    Year,
    /// `YYYY-MM`
    YearMonth,
    /// `YYYY-MM-DD`
    Date,
    /// `HH:MM:SS` (time of day with no date)
    Time,
    /// Full RFC 3339 timestamp with offset.
    Timestamp,
}

/// A date/time value that remembers the precision it was written at.
///
/// The instant holds the wall-clock fields exactly as written, with
/// start-of-period placeholders for everything below the precision (January,
/// the 1st, midnight). Placeholders are never re-emitted: [`fmt::Display`]
/// projects through the precision only.
///
/// Values are immutable after construction; a changed value is a new value.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PrecisionDateTime {
    /// Wall-clock fields as written, placeholders below the precision.
    instant: NaiveDateTime,

    /// UTC offset carried by the literal; UTC for the four precisions whose
    /// grammar has no offset.
    offset: FixedOffset,

    /// Number of sub-second digits as written (0-9); always 0 below
    /// timestamp precision. Kept so a fraction re-emits at exactly the width
    /// it was written at. Invariant: the instant's nanoseconds are an exact
    /// multiple of `10^(9 - subsec_digits)`.
    subsec_digits: u8,

    /// Granularity the literal was written at.
    precision: DateTimePrecision,
}

/// Offset used for precisions whose grammar carries none.
fn utc_offset() -> FixedOffset {
    FixedOffset::east_opt(0).expect("zero offset is valid")
}

/// Reference date used to anchor time-of-day values on the instant axis.
fn reference_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(0, 1, 1).expect("reference date is valid")
}

fn starts_with_four_digit_year(text: &str) -> bool {
    text.len() >= 4 && text.as_bytes()[..4].iter().all(u8::is_ascii_digit)
}

/// Parses a strict `YYYY` literal to the first day of that year.
fn parse_year(text: &str) -> Option<NaiveDate> {
    if !starts_with_four_digit_year(text) {
        return None;
    }
    NaiveDate::from_ymd_opt(text.parse().ok()?, 1, 1)
}

/// Counts the sub-second digits written in a timestamp literal (0 if it has
/// no fraction). RFC 3339 permits a dot only as the fraction separator.
fn subsec_digit_count(text: &str) -> usize {
    match text.find('.') {
        Some(dot) => text[dot + 1..]
            .bytes()
            .take_while(|b| b.is_ascii_digit())
            .count(),
        None => 0,
    }
}

/// Parses a strict `YYYY-MM` literal to the first day of that month.
fn parse_year_month(text: &str) -> Option<NaiveDate> {
    if !starts_with_four_digit_year(text) {
        return None;
    }
    let month = text[4..].strip_prefix('-')?;
    if month.len() != 2 || !month.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    NaiveDate::from_ymd_opt(text[..4].parse().ok()?, month.parse().ok()?, 1)
}

impl PrecisionDateTime {
    /// Parse a date/time literal, inferring its precision from its shape.
    ///
    /// The five grammars are not prefix-compatible, so selection is driven by
    /// the literal's length, most precise first:
    /// - longer than a bare date: RFC 3339 timestamp -> [`DateTimePrecision::Timestamp`]
    /// - 10 characters: `YYYY-MM-DD` -> [`DateTimePrecision::Date`]
    /// - 7 characters: `YYYY-MM` -> [`DateTimePrecision::YearMonth`]
    /// - 4 characters: `YYYY` -> [`DateTimePrecision::Year`]
    /// - 8 characters: `HH:MM:SS` -> [`DateTimePrecision::Time`]
    ///
    /// # Errors
    ///
    /// Returns [`ValueError::MalformedDateTime`] naming the literal if no
    /// grammar matches or any calendar component is out of range (month 13,
    /// day 32, hour 24). Malformed input is never clamped or defaulted.
    pub fn parse(text: &str) -> ValueResult<Self> {
        let malformed = || ValueError::MalformedDateTime(text.to_owned());

        match text.len() {
            10 => {
                let date = NaiveDate::parse_from_str(text, "%Y-%m-%d")
                    .ok()
                    .filter(|_| starts_with_four_digit_year(text))
                    .ok_or_else(malformed)?;
                Ok(Self {
                    instant: date.and_time(NaiveTime::MIN),
                    offset: utc_offset(),
                    subsec_digits: 0,
                    precision: DateTimePrecision::Date,
                })
            }
            7 => {
                let date = parse_year_month(text).ok_or_else(malformed)?;
                Ok(Self {
                    instant: date.and_time(NaiveTime::MIN),
                    offset: utc_offset(),
                    subsec_digits: 0,
                    precision: DateTimePrecision::YearMonth,
                })
            }
            4 => {
                let date = parse_year(text).ok_or_else(malformed)?;
                Ok(Self {
                    instant: date.and_time(NaiveTime::MIN),
                    offset: utc_offset(),
                    subsec_digits: 0,
                    precision: DateTimePrecision::Year,
                })
            }
            8 => {
                let time =
                    NaiveTime::parse_from_str(text, "%H:%M:%S").map_err(|_| malformed())?;
                Ok(Self {
                    instant: reference_date().and_time(time),
                    offset: utc_offset(),
                    subsec_digits: 0,
                    precision: DateTimePrecision::Time,
                })
            }
            len if len > 10 => {
                // chrono tolerates lowercase 't'/'z', which this grammar does
                // not: the literal could no longer round-trip.
                if text.bytes().any(|b| b.is_ascii_lowercase()) {
                    return Err(malformed());
                }
                let subsec_digits = subsec_digit_count(text);
                if subsec_digits > 9 {
                    return Err(malformed());
                }
                let zoned = DateTime::parse_from_rfc3339(text).map_err(|_| malformed())?;
                Ok(Self {
                    instant: zoned.naive_local(),
                    offset: *zoned.offset(),
                    subsec_digits: subsec_digits as u8,
                    precision: DateTimePrecision::Timestamp,
                })
            }
            _ => Err(malformed()),
        }
    }

    /// Reconstruct a [`DateTimePrecision::Timestamp`] value from a stored
    /// absolute instant.
    ///
    /// The stored scalar carries no fraction width, so the narrowest width
    /// that represents the instant's nanoseconds exactly is used (none, 3, 6
    /// or 9 digits).
    pub fn from_instant(instant: DateTime<Utc>) -> Self {
        let nanos = instant.timestamp_subsec_nanos();
        let subsec_digits = if nanos == 0 {
            0
        } else if nanos % 1_000_000 == 0 {
            3
        } else if nanos % 1_000 == 0 {
            6
        } else {
            9
        };
        Self {
            instant: instant.naive_utc(),
            offset: utc_offset(),
            subsec_digits,
            precision: DateTimePrecision::Timestamp,
        }
    }

    /// The granularity the literal was written at.
    pub fn precision(&self) -> DateTimePrecision {
        self.precision
    }

    /// Wall-clock fields, with start-of-period placeholders below the
    /// precision.
    pub fn instant(&self) -> NaiveDateTime {
        self.instant
    }

    /// Earliest instant consistent with the value (inclusive), on the
    /// UTC-normalised axis.
    ///
    /// Precisions without an offset grammar are already on the reference axis;
    /// a timestamp folds its offset in so bounds from mixed precisions stay
    /// comparable.
    pub fn range_low(&self) -> NaiveDateTime {
        match self.precision {
            DateTimePrecision::Timestamp => self.instant - self.offset,
            _ => self.instant,
        }
    }

    /// Earliest instant not consistent with the value (exclusive): the lower
    /// bound plus one unit of the value's own precision.
    ///
    /// A timestamp has no coarser unit, so its interval collapses to a point:
    /// `range_high() == range_low()`.
    pub fn range_high(&self) -> NaiveDateTime {
        let low = self.range_low();
        match self.precision {
            DateTimePrecision::Year => low.checked_add_months(Months::new(12)),
            DateTimePrecision::YearMonth => low.checked_add_months(Months::new(1)),
            DateTimePrecision::Date => low.checked_add_days(Days::new(1)),
            DateTimePrecision::Time => low.checked_add_signed(Duration::seconds(1)),
            DateTimePrecision::Timestamp => return low,
        }
        .expect("four-digit years cannot overflow the calendar")
    }
}

impl fmt::Display for PrecisionDateTime {
    /// Re-emits the literal using the format implied solely by the precision.
    ///
    /// Sub-precision placeholder fields never appear in the output. A
    /// timestamp re-emits RFC 3339 with its original offset (`+00:00`
    /// normalised to `Z`) and its sub-second fraction at exactly the width
    /// it was written at.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.precision {
            DateTimePrecision::Year => write!(f, "{}", self.instant.format("%Y")),
            DateTimePrecision::YearMonth => write!(f, "{}", self.instant.format("%Y-%m")),
            DateTimePrecision::Date => write!(f, "{}", self.instant.format("%Y-%m-%d")),
            DateTimePrecision::Time => write!(f, "{}", self.instant.format("%H:%M:%S")),
            DateTimePrecision::Timestamp => {
                let mut rendered = self.instant.format("%Y-%m-%dT%H:%M:%S").to_string();
                if self.subsec_digits > 0 {
                    let width = usize::from(self.subsec_digits);
                    let frac =
                        self.instant.nanosecond() / 10u32.pow(9 - u32::from(self.subsec_digits));
                    rendered.push_str(&format!(".{frac:0width$}"));
                }
                rendered.push_str(&self.offset.to_string());
                match rendered.strip_suffix("+00:00") {
                    Some(head) => write!(f, "{head}Z"),
                    None => write!(f, "{rendered}"),
                }
            }
        }
    }
}

impl Serialize for PrecisionDateTime {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for PrecisionDateTime {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Self::parse(&s).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_every_precision() {
        let literals = [
            ("2020", DateTimePrecision::Year),
            ("2020-05", DateTimePrecision::YearMonth),
            ("2020-05-17", DateTimePrecision::Date),
            ("10:00:00", DateTimePrecision::Time),
            ("2020-05-17T10:00:00Z", DateTimePrecision::Timestamp),
            ("2020-05-17T10:00:00+02:00", DateTimePrecision::Timestamp),
            ("2020-05-17T10:00:00.123Z", DateTimePrecision::Timestamp),
            ("2020-05-17T10:00:00.123456789-05:00", DateTimePrecision::Timestamp),
        ];

        for (literal, precision) in literals {
            let value = PrecisionDateTime::parse(literal).expect("parse");
            assert_eq!(value.precision(), precision, "precision for {literal}");
            assert_eq!(value.to_string(), literal, "round trip for {literal}");
        }
    }

    #[test]
    fn placeholders_never_serialize() {
        let value = PrecisionDateTime::parse("2020").expect("parse year");
        // Instant carries Jan 1 midnight internally, output is the year only.
        assert_eq!(value.instant().to_string(), "2020-01-01 00:00:00");
        assert_eq!(value.to_string(), "2020");
    }

    #[test]
    fn year_month_range_matches_month_extent() {
        let value = PrecisionDateTime::parse("2020-05").expect("parse year-month");
        assert_eq!(value.range_low().to_string(), "2020-05-01 00:00:00");
        assert_eq!(value.range_high().to_string(), "2020-06-01 00:00:00");
    }

    #[test]
    fn year_range_matches_year_extent() {
        let value = PrecisionDateTime::parse("2020").expect("parse year");
        assert_eq!(value.range_low().to_string(), "2020-01-01 00:00:00");
        assert_eq!(value.range_high().to_string(), "2021-01-01 00:00:00");
    }

    #[test]
    fn date_range_is_one_day() {
        let value = PrecisionDateTime::parse("2020-12-31").expect("parse date");
        assert_eq!(value.range_low().to_string(), "2020-12-31 00:00:00");
        assert_eq!(value.range_high().to_string(), "2021-01-01 00:00:00");
    }

    #[test]
    fn time_range_is_one_second_and_rolls_over_midnight() {
        let value = PrecisionDateTime::parse("23:59:59").expect("parse time");
        assert_eq!(
            value.range_high(),
            value.range_low() + Duration::seconds(1)
        );
        assert_eq!(value.range_high().format("%H:%M:%S").to_string(), "00:00:00");
    }

    #[test]
    fn timestamp_range_collapses_to_a_point() {
        let value = PrecisionDateTime::parse("2020-05-17T10:00:00Z").expect("parse timestamp");
        assert_eq!(value.range_low(), value.range_high());
        assert_eq!(value.range_low().to_string(), "2020-05-17 10:00:00");
    }

    #[test]
    fn timestamp_offset_normalises_onto_utc_axis() {
        let value =
            PrecisionDateTime::parse("2020-05-17T10:00:00+02:00").expect("parse timestamp");
        assert_eq!(value.range_low().to_string(), "2020-05-17 08:00:00");
        // The wire literal keeps its offset untouched.
        assert_eq!(value.to_string(), "2020-05-17T10:00:00+02:00");
    }

    #[test]
    fn mixed_precision_values_order_by_interval() {
        let year = PrecisionDateTime::parse("2020").expect("parse year");
        let date = PrecisionDateTime::parse("2021-06-15").expect("parse date");
        assert!(year.range_high() <= date.range_low());
    }

    #[test]
    fn fraction_width_round_trips_exactly() {
        // Any written width re-emits at that width, including all-zero
        // fractions and widths the 3/6/9 groupings would otherwise pad.
        for literal in [
            "2020-05-17T10:00:00.1Z",
            "2020-05-17T10:00:00.90Z",
            "2020-05-17T10:00:00.000Z",
            "2020-05-17T10:00:00.12345+02:00",
        ] {
            let value = PrecisionDateTime::parse(literal).expect("parse");
            assert_eq!(value.to_string(), literal, "round trip for {literal}");
        }
    }

    #[test]
    fn rejects_lowercase_timestamp_markers() {
        for bad in [
            "2020-05-17t10:00:00z",
            "2020-05-17T10:00:00z",
            "2020-05-17t10:00:00Z",
        ] {
            let err = PrecisionDateTime::parse(bad).expect_err("should reject lowercase marker");
            assert!(
                matches!(err, ValueError::MalformedDateTime(ref msg) if msg == bad),
                "error should name the literal {bad:?}"
            );
        }
    }

    #[test]
    fn rejects_fraction_wider_than_nanoseconds() {
        let err = PrecisionDateTime::parse("2020-05-17T10:00:00.1234567890Z")
            .expect_err("should reject fraction wider than nanoseconds");
        assert!(matches!(err, ValueError::MalformedDateTime(_)));
    }

    #[test]
    fn rejects_malformed_literals() {
        for bad in [
            "",
            "2020-13",
            "2020-05-32",
            "24:00:00",
            "not-a-date",
            "2020-5-17",
            "20-05-17",
            "2020-05-17T25:00:00Z",
            "2020-05-17T10:00:00", // timestamp without offset
        ] {
            let err = PrecisionDateTime::parse(bad).expect_err("should reject literal");
            assert!(
                matches!(err, ValueError::MalformedDateTime(ref msg) if msg == bad),
                "error should name the literal {bad:?}"
            );
        }
    }

    #[test]
    fn serde_round_trips_as_json_string() {
        let value: PrecisionDateTime =
            serde_json::from_str("\"2020-05\"").expect("deserialize year-month");
        assert_eq!(value.precision(), DateTimePrecision::YearMonth);
        assert_eq!(
            serde_json::to_string(&value).expect("serialize"),
            "\"2020-05\""
        );
    }

    #[test]
    fn serde_rejects_malformed_json_string() {
        let result = serde_json::from_str::<PrecisionDateTime>("\"2020-13\"");
        assert!(result.is_err());
    }

    #[test]
    fn from_instant_reconstructs_timestamp_precision() {
        let parsed = PrecisionDateTime::parse("2020-05-17T10:00:00Z").expect("parse timestamp");
        let instant = DateTime::<Utc>::from_naive_utc_and_offset(parsed.range_low(), Utc);
        let rebuilt = PrecisionDateTime::from_instant(instant);
        assert_eq!(rebuilt, parsed);
        assert_eq!(rebuilt.to_string(), "2020-05-17T10:00:00Z");
    }
}
