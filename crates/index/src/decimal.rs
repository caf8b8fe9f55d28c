//! Stored shape for precision-tagged decimal values.
//!
//! When a decimal is persisted for range search it spreads into sibling
//! fields under reserved double-underscore names: the interval bounds for the
//! store's comparison operators, the float value for arithmetic, and the
//! original digit string so the displayed precision survives.

use crate::{IndexError, IndexResult};
use fhir_values::PrecisionDecimal;
use serde::{Deserialize, Serialize};

/// Compound stored record for a decimal numeral.
///
/// `__strNum` is always written when encoding; the `Option` exists so a
/// stored record missing it decodes into
/// [`IndexError::MissingDecimalLiteral`] rather than an opaque serde failure.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub struct StoredDecimal {
    /// Inclusive lower bound of the numeral's implied interval.
    #[serde(rename = "__from")]
    pub from: f64,

    /// Exclusive upper bound of the numeral's implied interval.
    #[serde(rename = "__to")]
    pub to: f64,

    /// Binary floating-point equivalent of the numeral.
    #[serde(rename = "__num")]
    pub num: f64,

    /// The original digit string.
    #[serde(rename = "__strNum", default)]
    pub literal: Option<String>,
}

impl StoredDecimal {
    /// Encode a decimal into its stored shape.
    pub fn encode(value: &PrecisionDecimal) -> Self {
        Self {
            from: value.low(),
            to: value.high(),
            num: value.value(),
            literal: Some(value.digits().to_owned()),
        }
    }

    /// Decode a stored shape back into a decimal by re-parsing its literal.
    ///
    /// # Errors
    ///
    /// Returns [`IndexError::MissingDecimalLiteral`] if `__strNum` is absent,
    /// or [`IndexError::Value`] if the stored literal fails to re-parse.
    pub fn decode(&self) -> IndexResult<PrecisionDecimal> {
        let literal = self
            .literal
            .as_deref()
            .ok_or(IndexError::MissingDecimalLiteral)?;
        Ok(PrecisionDecimal::parse(literal)?)
    }

    /// True if this numeral's interval lies unambiguously before `other`'s.
    ///
    /// The upper bound is exclusive, so intervals touching at the boundary
    /// still count as before.
    pub fn is_before(&self, other: &StoredDecimal) -> bool {
        self.to <= other.from
    }
}
