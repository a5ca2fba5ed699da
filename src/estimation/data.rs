//! Validated time-series bundle consumed by error functionals and the
//! fitting driver.
//!
//! Purpose
//! -------
//! Collect `(t, u, y, x0)` once, check them once, and hand read-only views to
//! every cost evaluation. Error functionals borrow a [`FitData`] for the
//! length of a fit; nothing here is mutated after construction.
//!
//! Invariants & assumptions
//! ------------------------
//! - `t` is finite, increasing and equally spaced with at least 2 samples.
//! - `u` is `N × 2` with columns (ambient temperature, generated heat).
//! - `y` has `N` samples; its layout (vector or `N × 2`) is checked against
//!   an output mode only when a functional is bound to it.
//! - `x0` holds 1 (broadcast) or 2 finite entries.
use crate::thermal::{
    errors::{ThermalError, ThermalResult},
    response::initial_state,
    series::{OutputSeries, uniform_step},
    state_space::{N_INPUTS, OutputMode},
};
use ndarray::{Array1, Array2, ArrayView1};

/// Measured series for one identification run.
///
/// Fields
/// ------
/// - `t`: sample times in seconds.
/// - `u`: inputs, `N × 2` (ambient temperature, generated heat).
/// - `y`: expected (measured) outputs.
/// - `x0`: initial state as supplied (length 1 or 2).
#[derive(Debug, Clone, PartialEq)]
pub struct FitData {
    pub t: Array1<f64>,
    pub u: Array2<f64>,
    pub y: OutputSeries,
    pub x0: Array1<f64>,
    dt: f64,
}

impl FitData {
    /// Construct a validated bundle.
    ///
    /// # Errors
    /// - [`ThermalError::TooFewSamples`] / [`ThermalError::NonUniformTimeStep`]
    ///   for a bad time grid.
    /// - [`ThermalError::ShapeMismatch`] when `u` is not `N × 2` or `y` does
    ///   not have `N` samples.
    /// - [`ThermalError::NonFiniteData`] for NaN/±inf in `u` or `y`.
    /// - [`ThermalError::InvalidInitialState`] for a bad `x0`.
    pub fn new(
        t: Array1<f64>, u: Array2<f64>, y: impl Into<OutputSeries>, x0: Array1<f64>,
    ) -> ThermalResult<Self> {
        let y = y.into();
        let dt = uniform_step(t.view())?;
        let n = t.len();
        if u.dim() != (n, N_INPUTS) {
            return Err(ThermalError::ShapeMismatch {
                what: "inputs u",
                expected: format!("({n}, {N_INPUTS})"),
                found: format!("({}, {})", u.nrows(), u.ncols()),
            });
        }
        if y.len() != n {
            return Err(ThermalError::ShapeMismatch {
                what: "expected output y",
                expected: format!("{n} samples"),
                found: y.shape_label(),
            });
        }
        check_finite("u", u.iter())?;
        check_finite("y", y.iter())?;
        initial_state(x0.view())?;
        Ok(Self { t, u, y, x0, dt })
    }

    /// Number of samples `N`.
    pub fn len(&self) -> usize {
        self.t.len()
    }

    pub fn is_empty(&self) -> bool {
        self.t.is_empty()
    }

    /// Grid step in seconds.
    pub fn dt(&self) -> f64 {
        self.dt
    }

    /// Last sample time.
    pub fn end_time(&self) -> f64 {
        self.t[self.t.len() - 1]
    }

    /// Ambient temperature column of `u`.
    pub fn ambient(&self) -> ArrayView1<'_, f64> {
        self.u.column(0)
    }

    /// Generated heat column of `u`.
    pub fn power(&self) -> ArrayView1<'_, f64> {
        self.u.column(1)
    }

    /// `true` when `x0` has more than one entry; selects the multivariate
    /// likelihood branch.
    pub fn is_multistate(&self) -> bool {
        self.x0.len() > 1
    }

    /// Check that `y` has the layout `mode` produces.
    ///
    /// # Errors
    /// [`ThermalError::ShapeMismatch`].
    pub fn check_mode(&self, mode: OutputMode) -> ThermalResult<()> {
        self.y.expect_layout(self.len(), mode, "expected output y")
    }
}

fn check_finite<'a>(
    what: &'static str, values: impl Iterator<Item = &'a f64>,
) -> ThermalResult<()> {
    match values.enumerate().find(|(_, v)| !v.is_finite()) {
        Some((index, &value)) => Err(ThermalError::NonFiniteData { what, index, value }),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // These tests cover:
    // - Happy-path construction and derived accessors.
    // - Rejection of malformed inputs, outputs and initial states.
    // - Layout checks against output modes.
    // -------------------------------------------------------------------------

    fn grid() -> (Array1<f64>, Array2<f64>) {
        (array![0.0, 1.0, 2.0], array![[20.0, 0.5], [20.0, 0.5], [21.0, 0.0]])
    }

    #[test]
    // Purpose
    // -------
    // A consistent bundle is accepted and exposes its step, end time and
    // input columns.
    fn new_accepts_consistent_bundle() {
        // Arrange
        let (t, u) = grid();

        // Act
        let data = FitData::new(t, u, array![20.0, 20.1, 20.2], array![20.0]).unwrap();

        // Assert
        assert_eq!(data.len(), 3);
        assert_eq!(data.dt(), 1.0);
        assert_eq!(data.end_time(), 2.0);
        assert_eq!(data.ambient(), array![20.0, 20.0, 21.0]);
        assert_eq!(data.power(), array![0.5, 0.5, 0.0]);
        assert!(!data.is_multistate());
        assert!(data.check_mode(OutputMode::Surface).is_ok());
        assert!(data.check_mode(OutputMode::Both).is_err());
    }

    #[test]
    // Purpose
    // -------
    // Each kind of malformed input maps to its own error.
    fn new_rejects_malformed_inputs() {
        let (t, u) = grid();
        let y = array![20.0, 20.1, 20.2];

        let err = FitData::new(t.clone(), u.clone(), array![20.0, 20.1], array![20.0]).unwrap_err();
        assert!(matches!(err, ThermalError::ShapeMismatch { what: "expected output y", .. }));

        let narrow = u.slice(ndarray::s![.., ..1]).to_owned();
        let err = FitData::new(t.clone(), narrow, y.clone(), array![20.0]).unwrap_err();
        assert!(matches!(err, ThermalError::ShapeMismatch { what: "inputs u", .. }));

        let mut bad_u = u.clone();
        bad_u[[1, 1]] = f64::NAN;
        let err = FitData::new(t.clone(), bad_u, y.clone(), array![20.0]).unwrap_err();
        assert!(matches!(err, ThermalError::NonFiniteData { what: "u", index: 3, .. }));

        let err = FitData::new(t.clone(), u.clone(), y.clone(), array![1.0, 2.0, 3.0]).unwrap_err();
        assert_eq!(err, ThermalError::InvalidInitialState { len: 3 });

        let err = FitData::new(array![0.0, 1.0, 3.0], u, y, array![20.0]).unwrap_err();
        assert!(matches!(err, ThermalError::NonUniformTimeStep { index: 1, .. }));
    }

    #[test]
    // Purpose
    // -------
    // A two-column `y` is checked against the `Both` layout.
    fn two_channel_output_matches_both_mode() {
        let (t, u) = grid();
        let y = array![[20.0, 20.0], [20.1, 20.0], [20.2, 20.1]];
        let data = FitData::new(t, u, y, array![20.0, 20.0]).unwrap();
        assert!(data.is_multistate());
        assert!(data.check_mode(OutputMode::Both).is_ok());
        assert!(data.check_mode(OutputMode::Air).is_err());
    }
}
