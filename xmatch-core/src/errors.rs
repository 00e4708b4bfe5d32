//! Error types for catalog cross-matching.
//!
//! A single [`MatchError`] enum covers every failure mode in the pipeline:
//! configuration mistakes caught before any work starts, per-value domain
//! violations under strict validation, and merge-time schema conflicts.
//!
//! # Error Categories
//!
//! | Variant | Use Case | Caught |
//! |---------|----------|--------|
//! | [`InvalidColumn`](MatchError::InvalidColumn) | Requested column absent or unusable | Before extraction |
//! | [`InvalidCoordinate`](MatchError::InvalidCoordinate) | Coordinate out of domain (strict mode) | During extraction |
//! | [`InvalidTolerance`](MatchError::InvalidTolerance) | Negative or non-finite search radius | Before matching |
//! | [`EmptyCatalog`](MatchError::EmptyCatalog) | No usable rows on one side | Before matching |
//! | [`ColumnConflict`](MatchError::ColumnConflict) | Name collision under strict merge policy | Before merge rows are built |
//! | [`Schema`](MatchError::Schema) | Row violates a table's declared schema | During table construction |
//!
//! Every variant carries the row, column, or value that triggered it, so a
//! caller can fix the input data without re-running under instrumentation.
//!
//! # Usage
//!
//! Most fallible functions return [`CoreResult<T>`], which is
//! `Result<T, MatchError>`. Use the constructor methods for consistent
//! error creation:
//!
//! ```
//! use xmatch_core::MatchError;
//!
//! fn check_radius(arcsec: f64) -> Result<f64, MatchError> {
//!     if arcsec < 0.0 {
//!         return Err(MatchError::invalid_tolerance(arcsec));
//!     }
//!     Ok(arcsec)
//! }
//! ```

use thiserror::Error;

/// Unified error type for the cross-match pipeline.
///
/// Covers column lookup, coordinate validation, matcher configuration and
/// merge-time schema conflicts. Use the constructor methods
/// ([`invalid_column`](Self::invalid_column),
/// [`invalid_coordinate`](Self::invalid_coordinate), etc.) for consistent
/// error creation.
#[derive(Error, Debug)]
pub enum MatchError {
    /// A requested column is absent from the table's schema, or its
    /// declared type cannot serve the requested role.
    #[error("Invalid column '{column}': {message}")]
    InvalidColumn { column: String, message: String },

    /// A coordinate value is outside its valid domain and strict
    /// validation was requested.
    #[error("Invalid coordinate in column '{column}', row {row}: value {value} ({message})")]
    InvalidCoordinate {
        row: usize,
        column: String,
        value: String,
        message: String,
    },

    /// Negative or non-finite matching tolerance.
    #[error("Invalid tolerance: {arcsec} arcsec (must be finite and non-negative)")]
    InvalidTolerance { arcsec: f64 },

    /// A catalog has zero usable (non-null-key) rows.
    #[error("Empty {side} catalog: {message}")]
    EmptyCatalog { side: String, message: String },

    /// Column name collision under the strict merge policy.
    #[error("Column conflict: '{column}' exists in both tables")]
    ColumnConflict { column: String },

    /// A row violates the declared schema of the table it is added to.
    #[error("Schema violation in column '{column}', row {row}: {message}")]
    Schema {
        row: usize,
        column: String,
        message: String,
    },
}

/// Convenience alias for `Result<T, MatchError>`.
pub type CoreResult<T> = Result<T, MatchError>;

impl MatchError {
    /// Creates an [`InvalidColumn`](Self::InvalidColumn) error.
    pub fn invalid_column(column: &str, reason: &str) -> Self {
        Self::InvalidColumn {
            column: column.to_string(),
            message: reason.to_string(),
        }
    }

    /// Creates an [`InvalidCoordinate`](Self::InvalidCoordinate) error.
    pub fn invalid_coordinate(row: usize, column: &str, value: &str, reason: &str) -> Self {
        Self::InvalidCoordinate {
            row,
            column: column.to_string(),
            value: value.to_string(),
            message: reason.to_string(),
        }
    }

    /// Creates an [`InvalidTolerance`](Self::InvalidTolerance) error.
    pub fn invalid_tolerance(arcsec: f64) -> Self {
        Self::InvalidTolerance { arcsec }
    }

    /// Creates an [`EmptyCatalog`](Self::EmptyCatalog) error.
    pub fn empty_catalog(side: &str, reason: &str) -> Self {
        Self::EmptyCatalog {
            side: side.to_string(),
            message: reason.to_string(),
        }
    }

    /// Creates a [`ColumnConflict`](Self::ColumnConflict) error.
    pub fn column_conflict(column: &str) -> Self {
        Self::ColumnConflict {
            column: column.to_string(),
        }
    }

    /// Creates a [`Schema`](Self::Schema) error.
    pub fn schema(row: usize, column: &str, reason: &str) -> Self {
        Self::Schema {
            row,
            column: column.to_string(),
            message: reason.to_string(),
        }
    }

    /// Returns `true` if the error is a configuration mistake (bad column
    /// name, bad tolerance, strict-policy conflict) rather than a data
    /// problem in a specific row.
    pub fn is_config_error(&self) -> bool {
        match self {
            Self::InvalidColumn { .. } => true,
            Self::InvalidTolerance { .. } => true,
            Self::ColumnConflict { .. } => true,
            Self::InvalidCoordinate { .. } => false,
            Self::EmptyCatalog { .. } => false,
            Self::Schema { .. } => false,
        }
    }
}
