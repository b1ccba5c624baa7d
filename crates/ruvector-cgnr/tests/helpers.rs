//! Shared test helpers for the ruvector-cgnr integration test suite.
//!
//! Provides deterministic random operators, a dense least-squares reference
//! solver, and floating-point comparison utilities.

use ruvector_cgnr::types::DenseMatrix;

// ---------------------------------------------------------------------------
// Random number generator (simple LCG for deterministic reproducibility)
// ---------------------------------------------------------------------------

/// A minimal linear congruential generator for deterministic test data.
pub struct Lcg {
    state: u64,
}

impl Lcg {
    pub fn new(seed: u64) -> Self {
        Self { state: seed }
    }

    pub fn next_u64(&mut self) -> u64 {
        self.state = self
            .state
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1442695040888963407);
        self.state
    }

    /// Uniform f64 in [0, 1).
    pub fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    /// Uniform f64 in [lo, hi).
    pub fn next_f64_range(&mut self, lo: f64, hi: f64) -> f64 {
        lo + (hi - lo) * self.next_f64()
    }
}

// ---------------------------------------------------------------------------
// Operator generators
// ---------------------------------------------------------------------------

/// Random `rows x cols` operator with entries in `[-1, 1)`.
pub fn random_dense(rows: usize, cols: usize, seed: u64) -> DenseMatrix {
    let mut rng = Lcg::new(seed);
    DenseMatrix::from_fn(rows, cols, |_, _| rng.next_f64_range(-1.0, 1.0))
}

/// Tall operator whose top `cols x cols` block is strongly diagonal, giving a
/// well-conditioned normal matrix.
pub fn well_conditioned_dense(rows: usize, cols: usize, seed: u64) -> DenseMatrix {
    assert!(rows >= cols, "well_conditioned_dense requires rows >= cols");
    let mut rng = Lcg::new(seed);
    DenseMatrix::from_fn(rows, cols, |i, j| {
        let noise = rng.next_f64_range(-0.1, 0.1);
        if i == j {
            4.0 + noise
        } else {
            noise
        }
    })
}

/// Random vector with entries in `[-1, 1)`.
pub fn random_vector(n: usize, seed: u64) -> Vec<f64> {
    let mut rng = Lcg::new(seed);
    (0..n).map(|_| rng.next_f64_range(-1.0, 1.0)).collect()
}

// ---------------------------------------------------------------------------
// Dense reference solver
// ---------------------------------------------------------------------------

/// Solve the least-squares problem `min ‖H f - g‖` exactly by forming the
/// normal equations `H^T H f = H^T g` and eliminating with partial pivoting.
///
/// # Panics
///
/// Panics if `H^T H` is singular.
pub fn dense_least_squares(h: &DenseMatrix, g: &[f64]) -> Vec<f64> {
    let (rows, n) = (h.rows(), h.cols());
    assert_eq!(g.len(), rows, "rhs length must match operator rows");

    // Augmented [H^T H | H^T g].
    let mut aug = vec![vec![0.0f64; n + 1]; n];
    for i in 0..n {
        for j in 0..n {
            aug[i][j] = (0..rows).map(|k| h.get(k, i) * h.get(k, j)).sum();
        }
        aug[i][n] = (0..rows).map(|k| h.get(k, i) * g[k]).sum();
    }

    for col in 0..n {
        let mut max_row = col;
        let mut max_val = aug[col][col].abs();
        for row in (col + 1)..n {
            if aug[row][col].abs() > max_val {
                max_val = aug[row][col].abs();
                max_row = row;
            }
        }
        assert!(max_val > 1e-15, "normal matrix is singular or near-singular");
        aug.swap(col, max_row);

        let pivot = aug[col][col];
        for row in (col + 1)..n {
            let factor = aug[row][col] / pivot;
            for j in col..=n {
                aug[row][j] -= factor * aug[col][j];
            }
        }
    }

    let mut x = vec![0.0f64; n];
    for i in (0..n).rev() {
        let mut sum = aug[i][n];
        for j in (i + 1)..n {
            sum -= aug[i][j] * x[j];
        }
        x[i] = sum / aug[i][i];
    }

    x
}

// ---------------------------------------------------------------------------
// Floating-point comparison utilities
// ---------------------------------------------------------------------------

pub fn l2_norm(v: &[f64]) -> f64 {
    v.iter().map(|&x| x * x).sum::<f64>().sqrt()
}

pub fn l2_distance(a: &[f64], b: &[f64]) -> f64 {
    assert_eq!(a.len(), b.len(), "vectors must have same length");
    a.iter()
        .zip(b.iter())
        .map(|(&ai, &bi)| (ai - bi) * (ai - bi))
        .sum::<f64>()
        .sqrt()
}

/// `‖approx - exact‖ / ‖exact‖`, or the absolute error when `exact` is zero.
pub fn relative_error(approx: &[f64], exact: &[f64]) -> f64 {
    let exact_norm = l2_norm(exact);
    let error = l2_distance(approx, exact);
    if exact_norm > 1e-15 {
        error / exact_norm
    } else {
        error
    }
}

/// `g - H f` computed independently of the crate's kernels.
pub fn compute_residual(h: &DenseMatrix, f: &[f64], g: &[f64]) -> Vec<f64> {
    (0..h.rows())
        .map(|i| g[i] - h.row(i).iter().zip(f).map(|(&a, &b)| a * b).sum::<f64>())
        .collect()
}
