//! Operator abstraction consumed by the solver.
//!
//! The CGNR recurrence never looks at individual matrix entries; it only
//! needs the forward product `H * x` and the adjoint product `H^T * y`.
//! [`LinearOperator`] captures exactly that capability set.

/// A real linear map from `R^cols` (image space) to `R^rows` (observation
/// space) together with its transpose.
pub trait LinearOperator {
    /// Dimension of the observation space (`S`).
    fn rows(&self) -> usize;

    /// Dimension of the image space (`N`).
    fn cols(&self) -> usize;

    /// Forward product: `y = H * x`.
    ///
    /// `x.len() == cols()` and `y.len() == rows()`; `y` is overwritten.
    fn apply(&self, x: &[f64], y: &mut [f64]);

    /// Adjoint product: `y = H^T * x`.
    ///
    /// `x.len() == rows()` and `y.len() == cols()`; `y` is overwritten.
    fn apply_transpose(&self, x: &[f64], y: &mut [f64]);

    /// Number of stored scalar coefficients, used for logging.
    fn stored_entries(&self) -> usize {
        self.rows() * self.cols()
    }

    /// Every stored coefficient, used by the up-front finiteness check.
    /// Operators without explicit storage return `None`.
    fn coefficients(&self) -> Option<&[f64]> {
        None
    }
}

impl<T: LinearOperator + ?Sized> LinearOperator for &T {
    #[inline]
    fn rows(&self) -> usize {
        (**self).rows()
    }

    #[inline]
    fn cols(&self) -> usize {
        (**self).cols()
    }

    #[inline]
    fn apply(&self, x: &[f64], y: &mut [f64]) {
        (**self).apply(x, y)
    }

    #[inline]
    fn apply_transpose(&self, x: &[f64], y: &mut [f64]) {
        (**self).apply_transpose(x, y)
    }

    fn stored_entries(&self) -> usize {
        (**self).stored_entries()
    }

    fn coefficients(&self) -> Option<&[f64]> {
        (**self).coefficients()
    }
}
