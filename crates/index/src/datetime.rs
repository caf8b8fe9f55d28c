//! Stored shape for precision-tagged date/time values.
//!
//! A date/time field is persisted in one of three forms, and every consumer
//! of the stored data has to handle all of them, so the variants are explicit
//! rather than a runtime type-check:
//! - a compound `__from`/`__to`/`__strDate` record for the four precisions
//!   whose literal is ambiguous as a sortable scalar,
//! - a single absolute instant for timestamp precision, which has no coarser
//!   ambiguity to preserve,
//! - a bare literal string, as written by instant-typed fields.

use crate::{IndexError, IndexResult};
use chrono::{DateTime, NaiveDateTime, Utc};
use fhir_values::{DateTimePrecision, PrecisionDateTime};
use serde::{Deserialize, Serialize};

/// Compound stored record: the half-open instant interval plus the original
/// literal.
///
/// `__strDate` is always written when encoding; it is optional here only so
/// that a stored record missing it decodes into a distinguishable
/// [`IndexError::MissingDateLiteral`] instead of an opaque serde failure.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub struct StoredDateTimeRange {
    /// Earliest instant consistent with the literal (inclusive).
    #[serde(rename = "__from")]
    pub from: NaiveDateTime,

    /// Earliest instant not consistent with the literal (exclusive).
    #[serde(rename = "__to")]
    pub to: NaiveDateTime,

    /// The original literal; the interval alone cannot distinguish a year
    /// from a date that falls on January 1st.
    #[serde(rename = "__strDate", default)]
    pub literal: Option<String>,
}

/// The three forms a date/time value takes in the store.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
#[serde(untagged)]
pub enum StoredDateTime {
    /// Point form used for timestamp precision.
    Instant(DateTime<Utc>),

    /// Compound form used for every other precision.
    Range(StoredDateTimeRange),

    /// Bare literal, as written by instant-typed fields.
    Literal(String),
}

impl StoredDateTime {
    /// Encode a value into its stored shape.
    ///
    /// Timestamp precision stores the instant directly (its interval is a
    /// point, so there is nothing to widen); every other precision stores the
    /// interval and the original literal.
    pub fn encode(value: &PrecisionDateTime) -> Self {
        match value.precision() {
            DateTimePrecision::Timestamp => StoredDateTime::Instant(
                DateTime::<Utc>::from_naive_utc_and_offset(value.range_low(), Utc),
            ),
            _ => StoredDateTime::Range(StoredDateTimeRange {
                from: value.range_low(),
                to: value.range_high(),
                literal: Some(value.to_string()),
            }),
        }
    }

    /// Decode a stored shape back into a value.
    ///
    /// # Errors
    ///
    /// Returns [`IndexError::MissingDateLiteral`] if a compound record has no
    /// `__strDate`, or [`IndexError::Value`] if a stored literal fails to
    /// re-parse.
    pub fn decode(&self) -> IndexResult<PrecisionDateTime> {
        match self {
            StoredDateTime::Instant(instant) => Ok(PrecisionDateTime::from_instant(*instant)),
            StoredDateTime::Range(range) => {
                let literal = range
                    .literal
                    .as_deref()
                    .ok_or(IndexError::MissingDateLiteral)?;
                Ok(PrecisionDateTime::parse(literal)?)
            }
            StoredDateTime::Literal(literal) => Ok(PrecisionDateTime::parse(literal)?),
        }
    }

    /// The stored interval on the UTC-normalised axis.
    ///
    /// The point form yields `low == high`; the bare-literal form re-parses.
    fn bounds(&self) -> IndexResult<(NaiveDateTime, NaiveDateTime)> {
        match self {
            StoredDateTime::Instant(instant) => {
                let naive = instant.naive_utc();
                Ok((naive, naive))
            }
            StoredDateTime::Range(range) => Ok((range.from, range.to)),
            StoredDateTime::Literal(literal) => {
                let value = PrecisionDateTime::parse(literal)?;
                Ok((value.range_low(), value.range_high()))
            }
        }
    }

    /// True if this value's interval lies unambiguously before `other`'s,
    /// regardless of any precision mismatch.
    ///
    /// An interval's upper bound is exclusive, so touching at the boundary
    /// still counts as before; a point's single instant is inclusive, so it
    /// must lie strictly below the other's lower bound.
    ///
    /// # Errors
    ///
    /// Returns [`IndexError::Value`] if either side is a bare literal that
    /// fails to re-parse.
    pub fn is_before(&self, other: &StoredDateTime) -> IndexResult<bool> {
        let (low, high) = self.bounds()?;
        let (other_low, _) = other.bounds()?;
        if low == high {
            Ok(high < other_low)
        } else {
            Ok(high <= other_low)
        }
    }
}
