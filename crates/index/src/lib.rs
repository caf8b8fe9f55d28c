//! Persistence-boundary shapes for precision-tagged search values.
//!
//! The document store has no idea what a precision is: it can only sort and
//! range-compare scalars. This crate adapts the `fhir-values` types into
//! stored shapes the store can index directly: an inclusive lower bound, an
//! exclusive upper bound, and the original literal so the exact precision is
//! recoverable on the way back out. The bound fields use reserved
//! double-underscore names so they cannot collide with user-supplied resource
//! content.

pub mod datetime;
pub mod decimal;

pub use datetime::{StoredDateTime, StoredDateTimeRange};
pub use decimal::StoredDecimal;

use fhir_values::ValueError;
use thiserror::Error;

/// Errors returned by the persistence-boundary adapters.
///
/// A missing stored literal is a corrupted or unexpected stored shape, kept
/// distinct from a malformed wire literal so callers can tell the two apart.
#[derive(Debug, Error)]
pub enum IndexError {
    #[error("stored date/time range is missing its __strDate literal")]
    MissingDateLiteral,

    #[error("stored decimal is missing its __strNum literal")]
    MissingDecimalLiteral,

    #[error(transparent)]
    Value(#[from] ValueError),
}

/// Type alias for Results that can fail with an [`IndexError`].
pub type IndexResult<T> = Result<T, IndexError>;
