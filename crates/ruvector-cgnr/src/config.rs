//! Solver configuration.
//!
//! The defaults give the classic fixed-budget reconstruction:
//! ten iterations, no early exit, unguarded division. Every field can be
//! overridden, and the whole struct deserialises from partial documents
//! (missing fields fall back to their defaults).
//!
//! ```
//! use ruvector_cgnr::config::{CgnrConfig, StoppingRule};
//!
//! let config = CgnrConfig::default().with_max_iterations(25);
//! assert_eq!(config.max_iterations, 25);
//! assert_eq!(config.stopping, StoppingRule::FixedIterations);
//! ```

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Iteration cap used when none is configured.
pub const DEFAULT_MAX_ITERATIONS: usize = 10;

/// Upper bound on the iteration cap to prevent runaway computation.
pub const MAX_ITERATIONS: usize = 1_000_000;

/// Residual-plateau tolerance used by [`CgnrConfig::strict`].
pub const DEFAULT_PLATEAU_TOLERANCE: f64 = 1e-4;

/// Relative cut-off used by the guarded degeneracy policies.
pub const DEFAULT_DEGENERACY_THRESHOLD: f64 = 1e-20;

/// Rule deciding whether the loop may end before the iteration cap.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "rule", rename_all = "snake_case")]
pub enum StoppingRule {
    /// Always run exactly `max_iterations` iterations.
    #[default]
    FixedIterations,
    /// Stop once the squared residual norm stops changing:
    /// `|‖r_k‖² - ‖r_{k-1}‖²| < tolerance`, checked from the second
    /// iteration on.
    ResidualPlateau {
        /// Absolute tolerance on the change of `‖r‖²`.
        tolerance: f64,
    },
}

/// What to do when a CG denominator vanishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DegeneracyPolicy {
    /// Divide anyway; NaN/Infinity propagate through the remaining
    /// iterations. The first such iteration is recorded on the result.
    #[default]
    Propagate,
    /// Stop before the degenerate update and return the current image.
    /// The aborted iteration is not counted.
    Halt,
    /// Fail with [`SolverError::DegenerateDivision`](crate::error::SolverError::DegenerateDivision).
    Error,
}

/// Configuration for [`CgnrSolver`](crate::cgnr::CgnrSolver).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CgnrConfig {
    /// Number of CG update steps to perform.
    pub max_iterations: usize,
    /// Early-exit rule.
    pub stopping: StoppingRule,
    /// Zero-denominator handling.
    pub degeneracy: DegeneracyPolicy,
    /// Relative cut-off for the guarded degeneracy policies.
    ///
    /// `z . z` at or below `threshold * (initial z . z)` is treated as
    /// converged and taken as a zero step. `w . w` at or below
    /// `threshold * (first w . w)`, or any non-finite denominator, is
    /// degenerate.
    pub degeneracy_threshold: f64,
    /// Keep per-iteration residual norms on the result.
    pub record_history: bool,
    /// Reject NaN/Infinity in the operator and observation up front.
    pub check_finite_input: bool,
}

impl Default for CgnrConfig {
    fn default() -> Self {
        Self {
            max_iterations: DEFAULT_MAX_ITERATIONS,
            stopping: StoppingRule::FixedIterations,
            degeneracy: DegeneracyPolicy::Propagate,
            degeneracy_threshold: DEFAULT_DEGENERACY_THRESHOLD,
            record_history: true,
            check_finite_input: false,
        }
    }
}

impl CgnrConfig {
    /// Convergence-checked, degeneracy-guarded configuration.
    ///
    /// Also enables finiteness checks on the operator and observation.
    pub fn strict() -> Self {
        Self {
            stopping: StoppingRule::ResidualPlateau {
                tolerance: DEFAULT_PLATEAU_TOLERANCE,
            },
            degeneracy: DegeneracyPolicy::Error,
            check_finite_input: true,
            ..Self::default()
        }
    }

    /// Override the iteration cap.
    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    /// Override the stopping rule.
    pub fn with_stopping(mut self, stopping: StoppingRule) -> Self {
        self.stopping = stopping;
        self
    }

    /// Override the degeneracy policy.
    pub fn with_degeneracy(mut self, degeneracy: DegeneracyPolicy) -> Self {
        self.degeneracy = degeneracy;
        self
    }

    /// Enable or disable convergence history recording.
    pub fn with_history(mut self, record_history: bool) -> Self {
        self.record_history = record_history;
        self
    }

    /// Enable or disable the up-front finiteness check.
    pub fn with_finite_check(mut self, check_finite_input: bool) -> Self {
        self.check_finite_input = check_finite_input;
        self
    }

    /// Check parameter ranges.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::ParameterOutOfRange`] for an iteration cap
    /// above [`MAX_ITERATIONS`], a non-finite or negative plateau tolerance,
    /// or a non-finite or negative degeneracy threshold.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.max_iterations > MAX_ITERATIONS {
            return Err(ValidationError::ParameterOutOfRange {
                name: "max_iterations".into(),
                value: self.max_iterations.to_string(),
                expected: format!("[0, {}]", MAX_ITERATIONS),
            });
        }

        if let StoppingRule::ResidualPlateau { tolerance } = self.stopping {
            if !tolerance.is_finite() || tolerance < 0.0 {
                return Err(ValidationError::ParameterOutOfRange {
                    name: "tolerance".into(),
                    value: format!("{tolerance:.2e}"),
                    expected: "finite non-negative value".into(),
                });
            }
        }

        if !self.degeneracy_threshold.is_finite() || self.degeneracy_threshold < 0.0 {
            return Err(ValidationError::ParameterOutOfRange {
                name: "degeneracy_threshold".into(),
                value: format!("{:.2e}", self.degeneracy_threshold),
                expected: "finite non-negative value".into(),
            });
        }

        Ok(())
    }
}
