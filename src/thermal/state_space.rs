//! State-space builder for the two-state thermal RC network.
//!
//! Purpose
//! -------
//! Map a [`TargetParams`] record and an output selector to the continuous
//! LTI matrices `(A, B, C, D)` with states `x = [core temperature, air
//! temperature]` and inputs `u = [ambient temperature, generated heat]`.
//!
//! Key behaviors
//! -------------
//! - With `rt = rin + rout`:
//!   - `A = [[-1/(cp·rt), 1/(cp·rt)], [1/(cair·rt), -(rair+rt)/(cair·rair·rt)]]`
//!   - `B = [[0, 1/cp], [1/(cair·rair), 0]]`
//!   - `C` selects surface temperature `[rout/rt, rin/rt]`, air temperature
//!     `[0, 1]`, or both rows, depending on [`OutputMode`].
//!   - `D` is all zeros with one row per output.
//! - Unknown selector strings fall back to [`OutputMode::Both`] with a
//!   `tracing` warning instead of failing the run.
//! - Observability of `(A, C)` is checked through the rank of `[C; C·A]`.
//!
//! Invariants & assumptions
//! ------------------------
//! - Parameters are validated (finite, > 0) before any division, so a bad
//!   record surfaces as [`ThermalError::NonPositiveParam`] instead of
//!   NaN/inf matrices.
//! - Matrices are rebuilt on every call and never mutated in place.
use crate::thermal::{errors::ThermalResult, params::TargetParams};
use nalgebra::DMatrix;
use ndarray::{Array2, Axis, array, concatenate};
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Number of states (core temperature, air temperature).
pub const N_STATES: usize = 2;

/// Number of inputs (ambient temperature, generated heat).
pub const N_INPUTS: usize = 2;

/// Which measured temperatures the output matrix `C` selects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputMode {
    /// Surface temperature only (single output).
    Surface,
    /// Air temperature only (single output).
    Air,
    /// Surface and air temperature, in that column order.
    #[default]
    Both,
}

impl OutputMode {
    /// Lenient selector parsing.
    ///
    /// Accepts `"surface"`/`"sf"`, `"air"` and `"both"` (case-insensitive).
    /// Anything else logs a warning and returns [`OutputMode::Both`].
    pub fn from_selector(selector: &str) -> Self {
        match selector.to_lowercase().as_str() {
            "surface" | "sf" => OutputMode::Surface,
            "air" => OutputMode::Air,
            "both" => OutputMode::Both,
            _ => {
                warn!(selector, "output selector not recognized, defaulting to 'both'");
                OutputMode::Both
            }
        }
    }

    /// Number of output channels (rows of `C`).
    pub fn n_outputs(self) -> usize {
        match self {
            OutputMode::Surface | OutputMode::Air => 1,
            OutputMode::Both => 2,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            OutputMode::Surface => "surface",
            OutputMode::Air => "air",
            OutputMode::Both => "both",
        }
    }
}

impl From<&str> for OutputMode {
    fn from(selector: &str) -> Self {
        OutputMode::from_selector(selector)
    }
}

/// Continuous-time state-space matrices of the thermal network.
#[derive(Debug, Clone, PartialEq)]
pub struct StateSpace {
    /// State transition, `N_STATES × N_STATES`.
    pub a: Array2<f64>,
    /// Input coupling, `N_STATES × N_INPUTS`.
    pub b: Array2<f64>,
    /// Output selection, `n_outputs × N_STATES`.
    pub c: Array2<f64>,
    /// Feed-through, all zeros, `n_outputs × N_INPUTS`.
    pub d: Array2<f64>,
    /// Selector the matrices were built for.
    pub mode: OutputMode,
}

impl StateSpace {
    /// Build `(A, B, C, D)` for validated parameters.
    ///
    /// # Errors
    /// [`ThermalError::NonPositiveParam`](crate::thermal::errors::ThermalError::NonPositiveParam)
    /// if any field is ≤ 0 or non-finite.
    pub fn new(params: &TargetParams, mode: OutputMode) -> ThermalResult<Self> {
        params.validate()?;
        let TargetParams { cp, cair, rair, rin, rout } = *params;
        let rt = params.total_resistance();

        let a = array![
            [-1.0 / (cp * rt), 1.0 / (cp * rt)],
            [1.0 / (cair * rt), -(rair + rt) / (cair * rair * rt)],
        ];
        let b = array![[0.0, 1.0 / cp], [1.0 / (cair * rair), 0.0]];
        let c = match mode {
            OutputMode::Surface => array![[rout / rt, rin / rt]],
            OutputMode::Air => array![[0.0, 1.0]],
            OutputMode::Both => array![[rout / rt, rin / rt], [0.0, 1.0]],
        };
        let d = Array2::zeros((mode.n_outputs(), N_INPUTS));
        Ok(Self { a, b, c, d, mode })
    }

    /// Consume into the `(A, B, C, D)` tuple.
    pub fn into_matrices(self) -> (Array2<f64>, Array2<f64>, Array2<f64>, Array2<f64>) {
        (self.a, self.b, self.c, self.d)
    }

    pub fn n_outputs(&self) -> usize {
        self.c.nrows()
    }

    /// Stacked observability matrix `[C; C·A]`.
    pub fn observability_matrix(&self) -> Array2<f64> {
        let ca = self.c.dot(&self.a);
        // Shapes agree on the column axis by construction.
        concatenate(Axis(0), &[self.c.view(), ca.view()])
            .unwrap_or_else(|_| Array2::zeros((0, N_STATES)))
    }

    /// Numerical rank of [`observability_matrix`](Self::observability_matrix),
    /// using the usual `σ_max · max(m, n) · ε` singular-value cutoff.
    pub fn observability_rank(&self) -> usize {
        let obs = self.observability_matrix();
        let (rows, cols) = obs.dim();
        let m = DMatrix::<f64>::from_fn(rows, cols, |i, j| obs[[i, j]]);
        let svd = m.svd(false, false);
        let sigma_max = svd.singular_values.max();
        let eps = sigma_max * rows.max(cols) as f64 * f64::EPSILON;
        svd.rank(eps)
    }

    /// `true` when `rank([C; C·A]) == N_STATES`.
    pub fn is_observable(&self) -> bool {
        self.observability_rank() == N_STATES
    }
}

/// Build the state-space matrices; free-function form of [`StateSpace::new`].
pub fn build_state_space(params: &TargetParams, mode: OutputMode) -> ThermalResult<StateSpace> {
    StateSpace::new(params, mode)
}
