//! Precision-tagged FHIR search values.
//!
//! FHIR lets a sender write a date or a number at whatever granularity it
//! actually knows: `"2020"`, `"2020-05"`, `"2020-05-17T10:00:00Z"`, `1.50`.
//! The granularity is part of the value's meaning, so this crate provides
//! value types that keep it:
//! - [`PrecisionDateTime`]: a date/time literal plus the precision it was
//!   written at, with the half-open instant interval that precision implies.
//! - [`PrecisionDecimal`]: a decimal numeral preserved digit-for-digit, with
//!   the half-open numeric interval implied by its displayed precision.
//!
//! Both types round-trip their input literal exactly. The persistence-facing
//! range shapes built on top of these live in the `fhir-index` crate.

pub mod datetime;
pub mod decimal;

pub use datetime::{DateTimePrecision, PrecisionDateTime};
pub use decimal::PrecisionDecimal;

use thiserror::Error;

/// Errors returned when constructing a precision value from external input.
#[derive(Debug, Error)]
pub enum ValueError {
    #[error("unable to parse date/time: {0}")]
    MalformedDateTime(String),

    #[error("unable to parse decimal: {0}")]
    MalformedDecimal(String),
}

/// Type alias for Results that can fail with a [`ValueError`].
pub type ValueResult<T> = Result<T, ValueError>;
