//! Precision-tagged decimal values.
//!
//! A decimal numeral's displayed precision bounds the set of true values it
//! could represent: `1.10` denotes `[1.10, 1.11)`, `1.1` denotes `[1.1, 1.2)`
//! and `1` denotes `[1, 2)`, even though the first two have the same binary
//! value. [`PrecisionDecimal`] keeps the original digit string for exact
//! re-serialisation alongside the float value and the implied interval.

use crate::{ValueError, ValueResult};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// A decimal numeral that preserves its original digit string.
///
/// Constructed only by [`PrecisionDecimal::parse`]; the digit string is
/// non-empty by construction, so re-serialisation is total.
#[derive(Clone, Debug, PartialEq)]
pub struct PrecisionDecimal {
    /// The exact original numeral text.
    digits: String,

    /// Binary floating-point equivalent of `digits`, for arithmetic.
    value: f64,

    /// Inclusive lower bound of the interval implied by the displayed
    /// precision.
    low: f64,

    /// Exclusive upper bound: `low` plus one unit in the last reported
    /// decimal place.
    high: f64,
}

/// Checks the numeral grammar: `-?(0|[1-9][0-9]*)(\.[0-9]+)?`.
///
/// This is the JSON number grammar minus exponents, so every accepted numeral
/// can be emitted back onto the wire as a raw JSON number.
fn is_plain_numeral(text: &str) -> bool {
    let unsigned = text.strip_prefix('-').unwrap_or(text);
    let (int_part, frac_part) = match unsigned.split_once('.') {
        Some((int_part, frac_part)) => (int_part, Some(frac_part)),
        None => (unsigned, None),
    };

    let int_ok = match int_part.as_bytes() {
        [] => false,
        [b'0'] => true,
        [b'1'..=b'9', rest @ ..] => rest.iter().all(u8::is_ascii_digit),
        _ => false,
    };
    let frac_ok = match frac_part {
        Some(frac) => !frac.is_empty() && frac.bytes().all(|b| b.is_ascii_digit()),
        None => true,
    };

    int_ok && frac_ok
}

impl PrecisionDecimal {
    /// Parse a decimal numeral, deriving the interval its displayed precision
    /// implies.
    ///
    /// With `k` digits after the decimal point (0 if none), the precision
    /// unit is `10^-k`; the interval is `[value, value + 10^-k)`.
    ///
    /// # Errors
    ///
    /// Returns [`ValueError::MalformedDecimal`] naming the literal for
    /// anything outside the plain numeral grammar: empty input, letters,
    /// multiple decimal points, exponent forms, a leading `+`, leading
    /// zeros, or a bare/trailing decimal point. Also rejected are numerals
    /// whose displayed precision is finer than `f64` can represent at that
    /// magnitude (the precision unit would vanish into rounding, leaving a
    /// degenerate interval). There is no best-effort interpretation.
    pub fn parse(text: &str) -> ValueResult<Self> {
        if !is_plain_numeral(text) {
            return Err(ValueError::MalformedDecimal(text.to_owned()));
        }

        let value: f64 = text
            .parse()
            .map_err(|_| ValueError::MalformedDecimal(text.to_owned()))?;

        let scale = text.split_once('.').map_or(0, |(_, frac)| frac.len());
        let unit = 10f64.powi(-(scale as i32));
        let high = value + unit;

        // Saturated addition (or an overflowed value) would break the
        // `low <= value < high` invariant.
        if !(value < high) {
            return Err(ValueError::MalformedDecimal(text.to_owned()));
        }

        Ok(Self {
            digits: text.to_owned(),
            value,
            low: value,
            high,
        })
    }

    /// The exact original numeral text.
    pub fn digits(&self) -> &str {
        &self.digits
    }

    /// Binary floating-point equivalent of the numeral.
    pub fn value(&self) -> f64 {
        self.value
    }

    /// Inclusive lower bound of the implied interval.
    pub fn low(&self) -> f64 {
        self.low
    }

    /// Exclusive upper bound of the implied interval.
    pub fn high(&self) -> f64 {
        self.high
    }
}

impl fmt::Display for PrecisionDecimal {
    /// Emits the original digit string verbatim, never a reformatted value.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.digits)
    }
}

impl Serialize for PrecisionDecimal {
    /// Serialises as a raw (unquoted) JSON number carrying the exact digit
    /// string.
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let number =
            serde_json::Number::from_str(&self.digits).map_err(serde::ser::Error::custom)?;
        number.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for PrecisionDecimal {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let number = serde_json::Number::deserialize(deserializer)?;
        Self::parse(&number.to_string()).map_err(serde::de::Error::custom)
    }
}
