//! Fixed-iteration CGNR least-squares reconstruction.
//!
//! Approximates `argmin_f ‖H f - g‖²` for a dense rectangular forward
//! operator `H` (`S x N`, typically `S >= N`) by running Conjugate Gradients
//! on the normal equations. The default configuration performs exactly ten
//! iterations with no early exit, giving a bounded and predictable runtime
//! for image reconstruction from indirect measurements.
//!
//! # Modules
//!
//! - [`cgnr`] -- the solver.
//! - [`config`] -- iteration cap, stopping rule, degeneracy handling.
//! - [`types`] -- [`DenseMatrix`] and the solve result.
//! - [`traits`] -- the [`LinearOperator`] seam the solver is generic over.
//! - [`linalg`] -- dot/axpy kernels and residual helpers.
//! - [`io`] -- delimited-text and binary-cache loaders for `H` and `g`.
//! - [`gain`] -- depth-dependent signal gain for raw observations.
//! - [`image`] -- normalisation, background suppression and PGM output.
//! - [`synthetic`] -- seeded random problems.
//!
//! # Example
//!
//! ```
//! use ruvector_cgnr::{CgnrSolver, DenseMatrix};
//!
//! let h = DenseMatrix::identity(3);
//! let g = [1.0, 2.0, 3.0];
//!
//! let result = CgnrSolver::with_max_iterations(1).solve(&h, &g).unwrap();
//! assert_eq!(result.image, vec![1.0, 2.0, 3.0]);
//! assert_eq!(result.iterations, 1);
//! ```
//!
//! # Feature flags
//!
//! | Feature    | Description                                              |
//! |------------|----------------------------------------------------------|
//! | `parallel` | Rayon mat-vec kernels and parallel [`CgnrSolver::solve_batch`] |

pub mod cgnr;
pub mod config;
pub mod error;
pub mod gain;
pub mod image;
pub mod io;
pub mod linalg;
pub mod synthetic;
pub mod traits;
pub mod types;
pub mod validation;

pub use cgnr::CgnrSolver;
pub use config::{CgnrConfig, DegeneracyPolicy, StoppingRule};
pub use error::{Denominator, ImageError, LoadError, SolverError, ValidationError};
pub use gain::{apply_signal_gain, signal_gain};
pub use image::ImageFrame;
pub use io::{load_with_cache, read_observation, read_values};
pub use synthetic::SyntheticProblem;
pub use traits::LinearOperator;
pub use types::{CgnrResult, ConvergenceInfo, DenseMatrix, StopReason};
