//! Dense vector kernels used by the CGNR recurrence.
//!
//! All reductions use a 4-wide accumulator to shorten the floating-point
//! dependency chain. The accumulation order is fixed, so results are
//! bit-identical across repeated calls on the same inputs.

use crate::traits::LinearOperator;

/// Dot product of two `f64` slices with 4-wide accumulation.
///
/// # Panics
///
/// Panics if `a.len() != b.len()`.
#[inline]
pub fn dot(a: &[f64], b: &[f64]) -> f64 {
    assert_eq!(a.len(), b.len(), "dot: length mismatch");

    let n = a.len();
    let chunks = n / 4;
    let remainder = n % 4;

    let mut acc0: f64 = 0.0;
    let mut acc1: f64 = 0.0;
    let mut acc2: f64 = 0.0;
    let mut acc3: f64 = 0.0;

    for i in 0..chunks {
        let j = i * 4;
        acc0 += a[j] * b[j];
        acc1 += a[j + 1] * b[j + 1];
        acc2 += a[j + 2] * b[j + 2];
        acc3 += a[j + 3] * b[j + 3];
    }

    let base = chunks * 4;
    for i in 0..remainder {
        acc0 += a[base + i] * b[base + i];
    }

    (acc0 + acc1) + (acc2 + acc3)
}

/// Euclidean norm `sqrt(x . x)`.
#[inline]
pub fn norm2(x: &[f64]) -> f64 {
    dot(x, x).sqrt()
}

/// `y[i] += alpha * x[i]` (AXPY).
///
/// # Panics
///
/// Panics if `x.len() != y.len()`.
#[inline]
pub fn axpy(alpha: f64, x: &[f64], y: &mut [f64]) {
    assert_eq!(x.len(), y.len(), "axpy: length mismatch");

    let n = x.len();
    let chunks = n / 4;
    let base = chunks * 4;

    for i in 0..chunks {
        let j = i * 4;
        y[j] += alpha * x[j];
        y[j + 1] += alpha * x[j + 1];
        y[j + 2] += alpha * x[j + 2];
        y[j + 3] += alpha * x[j + 3];
    }
    for i in base..n {
        y[i] += alpha * x[i];
    }
}

/// `y[i] = x[i] + beta * y[i]`, the CG search-direction update.
///
/// # Panics
///
/// Panics if `x.len() != y.len()`.
#[inline]
pub fn xpby(x: &[f64], beta: f64, y: &mut [f64]) {
    assert_eq!(x.len(), y.len(), "xpby: length mismatch");

    for (yi, &xi) in y.iter_mut().zip(x) {
        *yi = xi + beta * *yi;
    }
}

/// Compute `g - H * f` for any linear operator.
///
/// # Panics
///
/// Panics if `f.len() != h.cols()` or `g.len() != h.rows()`.
pub fn residual<O: LinearOperator + ?Sized>(h: &O, f: &[f64], g: &[f64]) -> Vec<f64> {
    assert_eq!(f.len(), h.cols(), "residual: f length mismatch");
    assert_eq!(g.len(), h.rows(), "residual: g length mismatch");

    let mut r = vec![0.0f64; h.rows()];
    h.apply(f, &mut r);
    for (ri, &gi) in r.iter_mut().zip(g) {
        *ri = gi - *ri;
    }
    r
}

/// `‖g - H * f‖_2`, the data-fit error of a candidate solution.
pub fn residual_norm<O: LinearOperator + ?Sized>(h: &O, f: &[f64], g: &[f64]) -> f64 {
    norm2(&residual(h, f, g))
}
