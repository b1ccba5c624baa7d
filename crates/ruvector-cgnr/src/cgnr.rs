//! Conjugate Gradient on the Normal Residual (CGNR).
//!
//! Approximately minimises `‖H f - g‖²` for a rectangular forward operator
//! `H` (`S x N`) by running conjugate gradients on the normal equations
//! `H^T H f = H^T g` without ever forming `H^T H`.
//!
//! # Algorithm
//!
//! ```text
//! f = 0
//! r = g - H*f
//! z = H^T * r
//! p = z
//! zz = z . z
//!
//! for k in 0..max_iterations:
//!     w     = H * p
//!     alpha = zz / (w . w)
//!     f     = f + alpha * p
//!     r     = r - alpha * w
//!     z     = H^T * r
//!     zz'   = z . z
//!     beta  = zz' / zz
//!     p     = z + beta * p
//!     zz    = zz'
//! ```
//!
//! With the default [`CgnrConfig`] the loop runs exactly `max_iterations`
//! times (10) and never exits early, trading accuracy for a bounded,
//! predictable runtime. Division is unguarded by default; see
//! [`DegeneracyPolicy`] for the alternatives.
//!
//! # Stationary points
//!
//! When `z . z` is exactly zero the search direction is the zero vector, so
//! the update `alpha * p` is zero regardless of `alpha`. Such iterations are
//! executed as zero steps (and counted) without evaluating `0 / 0`. This is
//! what keeps a zero observation, or an exactly solved system, from turning
//! into NaN on the next iteration.
//!
//! Under the guarded policies ([`DegeneracyPolicy::Halt`] and
//! [`DegeneracyPolicy::Error`]) the same zero step is taken once `z . z`
//! falls to `degeneracy_threshold` times its initial value: the system is
//! solved to rounding level, which is convergence, not degeneracy. Only a
//! non-finite `z . z`, or a `w . w` at or below the threshold relative to
//! its first value, counts as degenerate. Both cut-offs are relative, so
//! the outcome does not depend on the scale of `H` or `g`.

use std::time::Instant;

use tracing::{debug, trace, warn};

use crate::config::{CgnrConfig, DegeneracyPolicy, StoppingRule};
use crate::error::{Denominator, SolverError};
use crate::linalg::{axpy, dot, xpby};
use crate::traits::LinearOperator;
use crate::types::{CgnrResult, ConvergenceInfo, StopReason};
use crate::validation::validate_solver_input;

/// Fixed-iteration CGNR solver.
///
/// Holds only its configuration. A solve allocates its own working vectors,
/// so one solver may be shared across threads and invoked concurrently on
/// unrelated problems.
#[derive(Debug, Clone, Default)]
pub struct CgnrSolver {
    config: CgnrConfig,
}

impl CgnrSolver {
    /// Create a solver from a configuration.
    pub fn new(config: CgnrConfig) -> Self {
        Self { config }
    }

    /// Default configuration with a different iteration cap.
    pub fn with_max_iterations(max_iterations: usize) -> Self {
        Self::new(CgnrConfig::default().with_max_iterations(max_iterations))
    }

    /// The active configuration.
    #[inline]
    pub fn config(&self) -> &CgnrConfig {
        &self.config
    }

    /// The configured iteration cap.
    #[inline]
    pub fn max_iterations(&self) -> usize {
        self.config.max_iterations
    }

    /// Reconstruct `f` from the operator `h` and observation `g`.
    ///
    /// # Errors
    ///
    /// * [`SolverError::InvalidInput`] -- `g.len() != h.rows()`, an empty
    ///   operator, or an invalid configuration. Raised before iterating.
    /// * [`SolverError::DegenerateDivision`] -- a vanishing denominator under
    ///   [`DegeneracyPolicy::Error`].
    pub fn solve<O: LinearOperator + ?Sized>(
        &self,
        h: &O,
        g: &[f64],
    ) -> Result<CgnrResult, SolverError> {
        validate_solver_input(h, g, &self.config)?;
        self.solve_inner(h, g)
    }

    /// Solve a batch of independent problems.
    ///
    /// Results are returned in input order. With the `parallel` feature the
    /// problems are distributed across the rayon thread pool.
    pub fn solve_batch<O>(&self, problems: &[(&O, &[f64])]) -> Vec<Result<CgnrResult, SolverError>>
    where
        O: LinearOperator + Sync + ?Sized,
    {
        #[cfg(feature = "parallel")]
        {
            use rayon::prelude::*;

            problems
                .par_iter()
                .map(|(h, g)| self.solve(*h, g))
                .collect()
        }

        #[cfg(not(feature = "parallel"))]
        {
            problems.iter().map(|(h, g)| self.solve(*h, g)).collect()
        }
    }

    // -------------------------------------------------------------------
    // Degeneracy screening
    // -------------------------------------------------------------------

    /// Apply the configured [`DegeneracyPolicy`] to a denominator.
    ///
    /// Guarded policies compare `value` against `degeneracy_threshold * scale`,
    /// where `scale` is the same denominator's value at the start of the
    /// solve. Returns `Ok(true)` when the loop must halt before the update.
    fn screen_denominator(
        &self,
        iteration: usize,
        denominator: Denominator,
        value: f64,
        scale: f64,
        first_degenerate: &mut Option<usize>,
    ) -> Result<bool, SolverError> {
        match self.config.degeneracy {
            DegeneracyPolicy::Propagate => {
                if (value == 0.0 || !value.is_finite()) && first_degenerate.is_none() {
                    warn!(
                        "CGNR: {denominator} = {value:.3e} at iteration {iteration}; \
                         non-finite values will propagate"
                    );
                    *first_degenerate = Some(iteration);
                }
                Ok(false)
            }
            policy => {
                if !value.is_finite() || value <= self.config.degeneracy_threshold * scale {
                    warn!(
                        "CGNR: degenerate {denominator} = {value:.3e} at iteration {iteration}"
                    );
                    if policy == DegeneracyPolicy::Error {
                        return Err(SolverError::DegenerateDivision {
                            iteration,
                            denominator,
                            value,
                        });
                    }
                    return Ok(true);
                }
                Ok(false)
            }
        }
    }

    /// Under a guarded policy, `z . z` this small relative to its initial
    /// value means the normal equations are solved to rounding level.
    fn negligible_normal_residual(&self, zz: f64, zz_initial: f64) -> bool {
        self.config.degeneracy != DegeneracyPolicy::Propagate
            && zz.is_finite()
            && zz_initial.is_finite()
            && zz <= self.config.degeneracy_threshold * zz_initial
    }

    // -------------------------------------------------------------------
    // Core CGNR loop
    // -------------------------------------------------------------------

    fn solve_inner<O: LinearOperator + ?Sized>(
        &self,
        h: &O,
        g: &[f64],
    ) -> Result<CgnrResult, SolverError> {
        let start_time = Instant::now();
        let config = &self.config;
        let (rows, cols) = (h.rows(), h.cols());

        // --- Working vectors ---
        let mut f = vec![0.0f64; cols]; // image estimate
        let mut r = g.to_vec(); // residual g - H*f (f = 0)
        let mut z = vec![0.0f64; cols]; // normal residual H^T r
        let mut w = vec![0.0f64; rows]; // H * p scratch

        h.apply_transpose(&r, &mut z);
        let mut p = z.clone(); // search direction

        let mut zz_old = dot(&z, &z);
        let mut rr_old = dot(&r, &r);
        let zz_initial = zz_old;
        let mut ww_initial: Option<f64> = None;

        let mut convergence_history = if config.record_history {
            Vec::with_capacity(config.max_iterations.min(256))
        } else {
            Vec::new()
        };
        let mut iterations = 0usize;
        let mut stop_reason = StopReason::MaxIterations;
        let mut first_degenerate_iteration = None;

        debug!(
            "CGNR: {}x{}, entries={}, max_iter={}, stopping={:?}, degeneracy={:?}",
            rows,
            cols,
            h.stored_entries(),
            config.max_iterations,
            config.stopping,
            config.degeneracy,
        );

        for k in 0..config.max_iterations {
            let stationary =
                zz_old == 0.0 || self.negligible_normal_residual(zz_old, zz_initial);

            let zz_new = if stationary {
                trace!("CGNR iter {k}: normal residual vanished ({zz_old:.3e}), zero step");
                0.0
            } else {
                if self.screen_denominator(
                    k,
                    Denominator::DirectionUpdate,
                    zz_old,
                    zz_initial,
                    &mut first_degenerate_iteration,
                )? {
                    stop_reason = StopReason::Degenerate { iteration: k };
                    break;
                }

                // --- w = H * p ---
                h.apply(&p, &mut w);
                let ww = dot(&w, &w);
                let ww_scale = *ww_initial.get_or_insert(ww);

                if self.screen_denominator(
                    k,
                    Denominator::StepLength,
                    ww,
                    ww_scale,
                    &mut first_degenerate_iteration,
                )? {
                    stop_reason = StopReason::Degenerate { iteration: k };
                    break;
                }

                let alpha = zz_old / ww;

                // --- f = f + alpha * p ---
                axpy(alpha, &p, &mut f);

                // --- r = r - alpha * w ---
                axpy(-alpha, &w, &mut r);

                // --- z = H^T * r ---
                h.apply_transpose(&r, &mut z);
                dot(&z, &z)
            };

            iterations = k + 1;
            let rr_new = dot(&r, &r);

            if config.record_history {
                convergence_history.push(ConvergenceInfo {
                    iteration: k,
                    residual_norm: rr_new.sqrt(),
                    normal_residual_norm: zz_new.sqrt(),
                });
            }

            trace!(
                "CGNR iter {k}: ||r|| = {:.6e}, ||H^T r|| = {:.6e}",
                rr_new.sqrt(),
                zz_new.sqrt(),
            );

            if let StoppingRule::ResidualPlateau { tolerance } = config.stopping {
                let delta = (rr_new - rr_old).abs();
                if k > 0 && delta < tolerance {
                    debug!("CGNR: residual plateau at iteration {k} (delta = {delta:.3e})");
                    stop_reason = StopReason::Converged { iteration: k };
                    break;
                }
            }

            // --- p = z + beta * p ---
            if !stationary {
                let beta = zz_new / zz_old;
                xpby(&z, beta, &mut p);
            }

            zz_old = zz_new;
            rr_old = rr_new;
        }

        let elapsed = start_time.elapsed();
        let residual_norm = dot(&r, &r).sqrt();

        debug!(
            "CGNR: {} iterations in {:?}, ||r|| = {:.6e}, stop = {:?}",
            iterations, elapsed, residual_norm, stop_reason,
        );

        Ok(CgnrResult {
            image: f,
            iterations,
            elapsed,
            residual_norm,
            convergence_history,
            stop_reason,
            first_degenerate_iteration,
        })
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// Tests
// ═══════════════════════════════════════════════════════════════════════════
