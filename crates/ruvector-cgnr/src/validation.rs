//! Input validation for CGNR solves.
//!
//! All checks run before the iteration loop so a mismatched observation
//! vector is reported immediately instead of producing a silently wrong
//! reconstruction. Every function returns [`ValidationError`], which
//! converts into [`SolverError::InvalidInput`](crate::error::SolverError::InvalidInput)
//! via `From`.
//!
//! # Limits
//!
//! | Resource        | Limit          | Constant               |
//! |-----------------|----------------|------------------------|
//! | Dense entries   | 2^30           | [`MAX_DENSE_ENTRIES`]  |
//! | Iterations      | 1,000,000      | [`MAX_ITERATIONS`](crate::config::MAX_ITERATIONS) |

use crate::config::CgnrConfig;
use crate::error::ValidationError;
use crate::traits::LinearOperator;

/// Maximum number of dense coefficients (`S * N`) accepted by the solver.
pub const MAX_DENSE_ENTRIES: usize = 1 << 30;

/// Validate the operator shape.
///
/// Checks:
///
/// 1. `rows >= 1` and `cols >= 1`.
/// 2. `rows * cols` does not exceed [`MAX_DENSE_ENTRIES`].
///
/// # Errors
///
/// Returns [`ValidationError::EmptyOperator`] or
/// [`ValidationError::OperatorTooLarge`].
pub fn validate_operator<O: LinearOperator + ?Sized>(h: &O) -> Result<(), ValidationError> {
    let (rows, cols) = (h.rows(), h.cols());

    if rows == 0 || cols == 0 {
        return Err(ValidationError::EmptyOperator { rows, cols });
    }

    if rows.checked_mul(cols).map_or(true, |n| n > MAX_DENSE_ENTRIES) {
        return Err(ValidationError::OperatorTooLarge {
            rows,
            cols,
            max_entries: MAX_DENSE_ENTRIES,
        });
    }

    Ok(())
}

/// Validate the observation vector length against the operator.
///
/// Emits a [`tracing::warn`] for an all-zero observation: it is valid, but
/// the reconstruction will be trivially zero.
///
/// # Errors
///
/// Returns [`ValidationError::DimensionMismatch`] if
/// `g.len() != expected_len`.
pub fn validate_observation(g: &[f64], expected_len: usize) -> Result<(), ValidationError> {
    if g.len() != expected_len {
        return Err(ValidationError::DimensionMismatch(format!(
            "observation length {} does not match operator rows {}",
            g.len(),
            expected_len,
        )));
    }

    if !g.is_empty() && g.iter().all(|&v| v == 0.0) {
        tracing::warn!("observation vector is all zeros; reconstruction will be zero");
    }

    Ok(())
}

/// Reject NaN or infinite entries.
///
/// # Errors
///
/// Returns [`ValidationError::NonFiniteValue`] naming the first offending
/// index.
pub fn validate_finite(label: &str, values: &[f64]) -> Result<(), ValidationError> {
    match values.iter().position(|v| !v.is_finite()) {
        Some(i) => Err(ValidationError::NonFiniteValue(format!(
            "{}[{}] = {}",
            label, i, values[i],
        ))),
        None => Ok(()),
    }
}

/// Validate a complete solve request: configuration, operator shape,
/// observation length and, when the configuration asks for it, finiteness
/// of every input value.
///
/// # Errors
///
/// Returns the first [`ValidationError`] found.
pub fn validate_solver_input<O: LinearOperator + ?Sized>(
    h: &O,
    g: &[f64],
    config: &CgnrConfig,
) -> Result<(), ValidationError> {
    config.validate()?;
    validate_operator(h)?;
    validate_observation(g, h.rows())?;

    if config.check_finite_input {
        if let Some(coefficients) = h.coefficients() {
            validate_finite("H", coefficients)?;
        }
        validate_finite("g", g)?;
    }

    Ok(())
}
