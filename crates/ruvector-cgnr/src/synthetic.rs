//! Seeded random problem generators for tests, benches and demos.
//!
//! All generators draw from [`StdRng::seed_from_u64`], so a given
//! `(rows, cols, seed)` triple always produces the same problem.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::types::DenseMatrix;

/// A forward operator together with an observation vector.
#[derive(Debug, Clone)]
pub struct SyntheticProblem {
    /// Forward operator `H` (`rows x cols`).
    pub operator: DenseMatrix,
    /// Observation `g` (length `rows`).
    pub observation: Vec<f64>,
    /// Image that generated `observation`, when the problem is consistent.
    pub ground_truth: Option<Vec<f64>>,
}

impl SyntheticProblem {
    /// `H` and `g` with independent uniform `[0, 1)` entries.
    ///
    /// `g` is generally not in the range of `H`, so the least-squares
    /// residual is non-zero.
    pub fn uniform(rows: usize, cols: usize, seed: u64) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);
        let operator = random_matrix(rows, cols, &mut rng);
        let observation = (0..rows).map(|_| rng.gen::<f64>()).collect();

        Self {
            operator,
            observation,
            ground_truth: None,
        }
    }

    /// Uniform `H`, a random image `f_true` in `[-1, 1)` and `g = H * f_true`.
    pub fn consistent(rows: usize, cols: usize, seed: u64) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);
        let operator = random_matrix(rows, cols, &mut rng);
        let truth: Vec<f64> = (0..cols).map(|_| rng.gen_range(-1.0..1.0)).collect();

        let mut observation = vec![0.0f64; rows];
        operator.matvec(&truth, &mut observation);

        Self {
            operator,
            observation,
            ground_truth: Some(truth),
        }
    }

    /// `(rows, cols)` of the operator.
    pub fn shape(&self) -> (usize, usize) {
        (self.operator.rows(), self.operator.cols())
    }
}

fn random_matrix(rows: usize, cols: usize, rng: &mut StdRng) -> DenseMatrix {
    DenseMatrix::from_fn(rows, cols, |_, _| rng.gen::<f64>())
}
