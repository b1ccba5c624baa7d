//! Error types for the CGNR crate.
//!
//! Dimension problems are reported eagerly, before any iteration runs.
//! Numerical degeneracies only become errors when the caller opts into
//! [`DegeneracyPolicy::Error`](crate::config::DegeneracyPolicy::Error); the
//! default lets NaN/Infinity flow through the floating-point values.

use std::fmt;

/// Primary error type for solver operations.
#[derive(Debug, thiserror::Error)]
pub enum SolverError {
    /// The caller supplied invalid input (dimensions, parameters, etc.).
    #[error("invalid input: {0}")]
    InvalidInput(#[from] ValidationError),

    /// A CG denominator was zero (or below the configured threshold).
    #[error(
        "degenerate division at iteration {iteration}: {denominator} = {value:.3e}"
    )]
    DegenerateDivision {
        /// Iteration (0-based) at which the division would have happened.
        iteration: usize,
        /// Which recurrence denominator vanished.
        denominator: Denominator,
        /// Observed value of the denominator.
        value: f64,
    },
}

/// Identifies the denominator of a CGNR recurrence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum Denominator {
    /// `w . w` in the step length `alpha = zz_old / (w . w)`.
    StepLength,
    /// `zz_old` in the direction update `beta = zz_new / zz_old`.
    DirectionUpdate,
}

impl fmt::Display for Denominator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Denominator::StepLength => write!(f, "w.w"),
            Denominator::DirectionUpdate => write!(f, "z.z"),
        }
    }
}

/// Validation errors for solver inputs and configuration.
///
/// These are raised before any computation begins so that callers get
/// clear diagnostics rather than silently wrong reconstructions.
#[derive(Debug, thiserror::Error)]
pub enum ValidationError {
    /// Operator and vector shapes are inconsistent.
    #[error("dimension mismatch: {0}")]
    DimensionMismatch(String),

    /// The operator has zero rows or zero columns.
    #[error("empty operator: {rows}x{cols}")]
    EmptyOperator {
        /// Number of rows.
        rows: usize,
        /// Number of columns.
        cols: usize,
    },

    /// A value is NaN or infinite where a finite number is required.
    #[error("non-finite value detected: {0}")]
    NonFiniteValue(String),

    /// A parameter is outside its valid range.
    #[error("parameter out of range: {name} = {value} (expected {expected})")]
    ParameterOutOfRange {
        /// Name of the parameter.
        name: String,
        /// The invalid value (as a string for flexibility).
        value: String,
        /// Human-readable description of the valid range.
        expected: String,
    },

    /// Operator size exceeds the implementation limit.
    #[error("operator size {rows}x{cols} exceeds maximum of {max_entries} entries")]
    OperatorTooLarge {
        /// Number of rows.
        rows: usize,
        /// Number of columns.
        cols: usize,
        /// Maximum supported number of dense entries.
        max_entries: usize,
    },
}

/// Errors raised while turning a solution vector into an image.
#[derive(Debug, thiserror::Error)]
pub enum ImageError {
    /// The solution length does not match `width * height`.
    #[error("invalid image shape: {0}")]
    Shape(#[from] ValidationError),

    /// Writing the encoded image failed.
    #[error("image write failed: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors raised while loading an operator or observation from text.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    /// Reading from the source failed.
    #[error("read failed: {0}")]
    Io(#[from] std::io::Error),

    /// A token could not be parsed as a number.
    #[error("line {line}: cannot parse {token:?} as a number")]
    Parse {
        /// 1-based line number.
        line: usize,
        /// The offending token.
        token: String,
    },

    /// The number of values does not match the requested shape.
    #[error("invalid shape: {0}")]
    Shape(#[from] ValidationError),
}
