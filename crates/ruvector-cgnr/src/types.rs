//! Core types: the dense forward operator and the solver result.
//!
//! Provides [`DenseMatrix`] for row-major storage of the operator `H` and
//! [`CgnrResult`] for the structured output of a solve.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::linalg::{axpy, dot};
use crate::traits::LinearOperator;

// ---------------------------------------------------------------------------
// DenseMatrix
// ---------------------------------------------------------------------------

/// Rows processed per task by the parallel transposed product. Fixed so the
/// partial sums are always combined in the same order.
#[cfg(feature = "parallel")]
const TRANSPOSE_BLOCK_ROWS: usize = 64;

/// Dense real matrix in row-major order.
///
/// Entry `(i, j)` lives at `data[i * cols + j]`.
#[derive(Debug, Clone, PartialEq)]
pub struct DenseMatrix {
    rows: usize,
    cols: usize,
    data: Vec<f64>,
}

impl DenseMatrix {
    /// Wrap row-major `data` as a `rows x cols` matrix.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::DimensionMismatch`] if
    /// `data.len() != rows * cols`.
    pub fn new(rows: usize, cols: usize, data: Vec<f64>) -> Result<Self, ValidationError> {
        let expected = rows.checked_mul(cols).ok_or_else(|| {
            ValidationError::DimensionMismatch(format!("{rows}x{cols} overflows usize"))
        })?;
        if data.len() != expected {
            return Err(ValidationError::DimensionMismatch(format!(
                "data length {} does not equal rows * cols = {}",
                data.len(),
                expected,
            )));
        }
        Ok(Self { rows, cols, data })
    }

    /// All-zero `rows x cols` matrix.
    pub fn zeros(rows: usize, cols: usize) -> Self {
        Self {
            rows,
            cols,
            data: vec![0.0; rows * cols],
        }
    }

    /// Square identity matrix of dimension `n`.
    pub fn identity(n: usize) -> Self {
        Self::from_fn(n, n, |i, j| if i == j { 1.0 } else { 0.0 })
    }

    /// Build a matrix by evaluating `f(i, j)` for every entry.
    pub fn from_fn(rows: usize, cols: usize, mut f: impl FnMut(usize, usize) -> f64) -> Self {
        let mut data = Vec::with_capacity(rows * cols);
        for i in 0..rows {
            for j in 0..cols {
                data.push(f(i, j));
            }
        }
        Self { rows, cols, data }
    }

    /// Build a matrix from a slice of equally long rows.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::DimensionMismatch`] if the rows are ragged.
    pub fn from_rows<R: AsRef<[f64]>>(rows: &[R]) -> Result<Self, ValidationError> {
        let cols = rows.first().map_or(0, |r| r.as_ref().len());
        let mut data = Vec::with_capacity(rows.len() * cols);
        for (i, row) in rows.iter().enumerate() {
            let row = row.as_ref();
            if row.len() != cols {
                return Err(ValidationError::DimensionMismatch(format!(
                    "row {} has length {} but row 0 has length {}",
                    i,
                    row.len(),
                    cols,
                )));
            }
            data.extend_from_slice(row);
        }
        Ok(Self {
            rows: rows.len(),
            cols,
            data,
        })
    }

    /// Number of rows (`S`).
    #[inline]
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Number of columns (`N`).
    #[inline]
    pub fn cols(&self) -> usize {
        self.cols
    }

    /// Row-major backing storage.
    #[inline]
    pub fn as_slice(&self) -> &[f64] {
        &self.data
    }

    /// Entry `(i, j)`.
    ///
    /// # Panics
    ///
    /// Panics if `i >= rows` or `j >= cols`.
    #[inline]
    pub fn get(&self, i: usize, j: usize) -> f64 {
        assert!(i < self.rows && j < self.cols, "index ({i}, {j}) out of bounds");
        self.data[i * self.cols + j]
    }

    /// Row `i` as a slice.
    #[inline]
    pub fn row(&self, i: usize) -> &[f64] {
        let start = i * self.cols;
        &self.data[start..start + self.cols]
    }

    /// Dense matrix-vector multiply: `y = H * x`.
    ///
    /// # Panics
    ///
    /// Panics if `x.len() != cols` or `y.len() != rows`.
    pub fn matvec(&self, x: &[f64], y: &mut [f64]) {
        assert_eq!(x.len(), self.cols, "matvec: x.len() must equal cols");
        assert_eq!(y.len(), self.rows, "matvec: y.len() must equal rows");

        if self.cols == 0 {
            y.fill(0.0);
            return;
        }

        #[cfg(feature = "parallel")]
        {
            use rayon::prelude::*;

            y.par_iter_mut()
                .zip(self.data.par_chunks_exact(self.cols))
                .for_each(|(yi, row)| *yi = dot(row, x));
        }

        #[cfg(not(feature = "parallel"))]
        {
            for (yi, row) in y.iter_mut().zip(self.data.chunks_exact(self.cols)) {
                *yi = dot(row, x);
            }
        }
    }

    /// Transposed matrix-vector multiply: `y = H^T * x`.
    ///
    /// Walks `H` row by row and accumulates `x[i] * row_i` into `y`, so the
    /// transpose is never materialised.
    ///
    /// # Panics
    ///
    /// Panics if `x.len() != rows` or `y.len() != cols`.
    pub fn matvec_transpose(&self, x: &[f64], y: &mut [f64]) {
        assert_eq!(x.len(), self.rows, "matvec_transpose: x.len() must equal rows");
        assert_eq!(y.len(), self.cols, "matvec_transpose: y.len() must equal cols");

        y.fill(0.0);
        if self.cols == 0 {
            return;
        }

        #[cfg(feature = "parallel")]
        {
            use rayon::prelude::*;

            let cols = self.cols;
            let partials: Vec<Vec<f64>> = self
                .data
                .par_chunks(cols * TRANSPOSE_BLOCK_ROWS)
                .zip(x.par_chunks(TRANSPOSE_BLOCK_ROWS))
                .map(|(block, xs)| {
                    let mut acc = vec![0.0f64; cols];
                    for (row, &xi) in block.chunks_exact(cols).zip(xs) {
                        axpy(xi, row, &mut acc);
                    }
                    acc
                })
                .collect();

            // Combine in block order so the result does not depend on
            // scheduling.
            for partial in &partials {
                axpy(1.0, partial, y);
            }
        }

        #[cfg(not(feature = "parallel"))]
        {
            for (row, &xi) in self.data.chunks_exact(self.cols).zip(x) {
                axpy(xi, row, y);
            }
        }
    }

    /// Materialise `H^T` as a new matrix.
    pub fn transpose(&self) -> DenseMatrix {
        DenseMatrix::from_fn(self.cols, self.rows, |i, j| self.data[j * self.cols + i])
    }
}

impl LinearOperator for DenseMatrix {
    #[inline]
    fn rows(&self) -> usize {
        self.rows
    }

    #[inline]
    fn cols(&self) -> usize {
        self.cols
    }

    #[inline]
    fn apply(&self, x: &[f64], y: &mut [f64]) {
        self.matvec(x, y)
    }

    #[inline]
    fn apply_transpose(&self, x: &[f64], y: &mut [f64]) {
        self.matvec_transpose(x, y)
    }

    fn stored_entries(&self) -> usize {
        self.data.len()
    }

    fn coefficients(&self) -> Option<&[f64]> {
        Some(&self.data)
    }
}

// ---------------------------------------------------------------------------
// Solver result types
// ---------------------------------------------------------------------------

/// Why the iteration loop ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StopReason {
    /// The configured iteration cap was reached. Always the case with the
    /// default fixed-iteration stopping rule.
    MaxIterations,
    /// The residual plateau rule fired.
    Converged {
        /// Iteration (0-based) at which the rule fired.
        iteration: usize,
    },
    /// A degenerate denominator halted the loop under
    /// [`DegeneracyPolicy::Halt`](crate::config::DegeneracyPolicy::Halt).
    ///
    /// The aborted iteration is not counted: [`CgnrResult::iterations`]
    /// equals `iteration`, the number of updates actually applied.
    Degenerate {
        /// Iteration (0-based) whose update was skipped.
        iteration: usize,
    },
}

/// Per-iteration convergence snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConvergenceInfo {
    /// Iteration index (0-based).
    pub iteration: usize,
    /// Recursively updated residual norm `‖r‖` after this iteration.
    pub residual_norm: f64,
    /// Normal-residual norm `‖H^T r‖` after this iteration.
    pub normal_residual_norm: f64,
}

/// Result of one CGNR solve.
#[derive(Debug, Clone)]
pub struct CgnrResult {
    /// Reconstructed image `f`, length `N`.
    pub image: Vec<f64>,
    /// Number of iterations performed, zero steps included.
    ///
    /// Equals `max_iterations` unless the loop ended early. When the
    /// plateau rule fires, the iteration that triggered it is counted. When
    /// a degenerate denominator halts the loop, the aborted iteration is
    /// not counted.
    pub iterations: usize,
    /// Wall-clock duration of the solve (monotonic clock).
    pub elapsed: Duration,
    /// Final residual norm `‖g - H f‖` as tracked by the recurrence.
    pub residual_norm: f64,
    /// Per-iteration history (empty when history recording is disabled).
    pub convergence_history: Vec<ConvergenceInfo>,
    /// Why the loop ended.
    pub stop_reason: StopReason,
    /// First iteration that divided by a zero or non-finite denominator.
    /// Only set under the propagating degeneracy policy.
    pub first_degenerate_iteration: Option<usize>,
}

impl CgnrResult {
    /// Elapsed wall-clock time in seconds.
    #[inline]
    pub fn elapsed_seconds(&self) -> f64 {
        self.elapsed.as_secs_f64()
    }

    /// `true` if every entry of the image is finite.
    pub fn is_finite(&self) -> bool {
        self.image.iter().all(|v| v.is_finite())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_2x3() -> DenseMatrix {
        DenseMatrix::from_rows(&[[1.0, 2.0, 3.0], [4.0, 5.0, 6.0]]).unwrap()
    }

    #[test]
    fn new_rejects_wrong_length() {
        let err = DenseMatrix::new(2, 3, vec![0.0; 5]).unwrap_err();
        assert!(matches!(err, ValidationError::DimensionMismatch(_)));
    }

    #[test]
    fn from_rows_rejects_ragged() {
        let rows: Vec<Vec<f64>> = vec![vec![1.0, 2.0], vec![3.0]];
        assert!(DenseMatrix::from_rows(&rows).is_err());
    }

    #[test]
    fn matvec_matches_hand_computation() {
        let h = sample_2x3();
        let mut y = vec![0.0; 2];
        h.matvec(&[1.0, 0.0, -1.0], &mut y);
        assert_eq!(y, vec![-2.0, -2.0]);
    }

    #[test]
    fn matvec_transpose_matches_hand_computation() {
        let h = sample_2x3();
        let mut y = vec![7.0; 3];
        h.matvec_transpose(&[1.0, 1.0], &mut y);
        assert_eq!(y, vec![5.0, 7.0, 9.0]);
    }

    #[test]
    fn transpose_roundtrip() {
        let h = sample_2x3();
        let t = h.transpose();
        assert_eq!(t.rows(), 3);
        assert_eq!(t.cols(), 2);
        assert_eq!(t.get(2, 1), 6.0);
        assert_eq!(t.transpose(), h);
    }

    #[test]
    fn row_accessor() {
        let h = sample_2x3();
        assert_eq!(h.row(1), &[4.0, 5.0, 6.0]);
    }

    #[test]
    fn identity_is_diagonal() {
        let eye = DenseMatrix::identity(3);
        assert_eq!(eye.get(1, 1), 1.0);
        assert_eq!(eye.get(0, 2), 0.0);
        assert_eq!(eye.stored_entries(), 9);
    }

    #[test]
    fn stop_reason_serializes_tagged() {
        let json = serde_json::to_string(&StopReason::Converged { iteration: 3 }).unwrap();
        assert_eq!(json, r#"{"kind":"converged","iteration":3}"#);
    }
}
