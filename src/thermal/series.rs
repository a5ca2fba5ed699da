//! Output series and time-grid helpers shared by the response, the error
//! functionals, and post-fit evaluation.
//!
//! Purpose
//! -------
//! Model outputs are vector-valued for single-output systems and
//! matrix-valued (`N × 2`, columns surface/air) for the two-output system.
//! [`OutputSeries`] makes that distinction explicit so consumers branch on a
//! checked variant instead of guessing from array dimensionality.
//!
//! Conventions
//! -----------
//! - Rows index time; `len()` is always the number of samples `N`.
//! - Residuals are `expected − obtained` and require identical shapes.
use crate::thermal::{
    errors::{ThermalError, ThermalResult},
    state_space::OutputMode,
};
use ndarray::{Array1, Array2, ArrayView1, ArrayView2, Axis, s};

/// Absolute tolerance on time-step spacing.
pub const STEP_ATOL: f64 = 1e-8;

/// Relative tolerance on time-step spacing.
pub const STEP_RTOL: f64 = 1e-5;

/// Modeled or measured temperatures over time.
#[derive(Debug, Clone, PartialEq)]
pub enum OutputSeries {
    /// Single output channel, length `N`.
    Vector(Array1<f64>),
    /// Several output channels, shape `N × channels`.
    Matrix(Array2<f64>),
}

impl OutputSeries {
    /// Number of time samples.
    pub fn len(&self) -> usize {
        match self {
            OutputSeries::Vector(v) => v.len(),
            OutputSeries::Matrix(m) => m.nrows(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of output channels.
    pub fn n_channels(&self) -> usize {
        match self {
            OutputSeries::Vector(_) => 1,
            OutputSeries::Matrix(m) => m.ncols(),
        }
    }

    /// NumPy-style shape label, used in error messages.
    pub fn shape_label(&self) -> String {
        match self {
            OutputSeries::Vector(v) => format!("({},)", v.len()),
            OutputSeries::Matrix(m) => format!("({}, {})", m.nrows(), m.ncols()),
        }
    }

    /// Collapse an `N × 1` matrix into a vector; other shapes are unchanged.
    pub fn normalized(self) -> Self {
        match self {
            OutputSeries::Matrix(m) if m.ncols() == 1 => {
                OutputSeries::Vector(m.index_axis_move(Axis(1), 0))
            }
            other => other,
        }
    }

    /// Check that the series has `n` samples and the layout `mode` produces:
    /// a vector for single-output modes, an `n × 2` matrix for `Both`.
    ///
    /// # Errors
    /// [`ThermalError::ShapeMismatch`] with both shapes spelled out.
    pub fn expect_layout(
        &self, n: usize, mode: OutputMode, what: &'static str,
    ) -> ThermalResult<()> {
        let ok = match (self, mode) {
            (OutputSeries::Vector(v), OutputMode::Surface | OutputMode::Air) => v.len() == n,
            (OutputSeries::Matrix(m), OutputMode::Both) => m.dim() == (n, 2),
            _ => false,
        };
        if ok {
            return Ok(());
        }
        let expected = match mode {
            OutputMode::Both => format!("({n}, 2)"),
            _ => format!("({n},)"),
        };
        Err(ThermalError::ShapeMismatch { what, expected, found: self.shape_label() })
    }

    /// Elementwise residual `self − obtained`.
    ///
    /// # Errors
    /// [`ThermalError::ShapeMismatch`] if variants or shapes differ.
    pub fn residual(&self, obtained: &OutputSeries) -> ThermalResult<OutputSeries> {
        match (self, obtained) {
            (OutputSeries::Vector(e), OutputSeries::Vector(o)) if e.len() == o.len() => {
                Ok(OutputSeries::Vector(e - o))
            }
            (OutputSeries::Matrix(e), OutputSeries::Matrix(o)) if e.dim() == o.dim() => {
                Ok(OutputSeries::Matrix(e - o))
            }
            _ => Err(ThermalError::ShapeMismatch {
                what: "residual",
                expected: self.shape_label(),
                found: obtained.shape_label(),
            }),
        }
    }

    /// Column `channel` as a vector view (`0` for vector series).
    pub fn channel(&self, channel: usize) -> Option<ArrayView1<'_, f64>> {
        match self {
            OutputSeries::Vector(v) if channel == 0 => Some(v.view()),
            OutputSeries::Matrix(m) if channel < m.ncols() => Some(m.column(channel)),
            _ => None,
        }
    }

    /// Matrix view with one column per channel.
    pub fn as_matrix(&self) -> ArrayView2<'_, f64> {
        match self {
            OutputSeries::Vector(v) => v.view().insert_axis(Axis(1)),
            OutputSeries::Matrix(m) => m.view(),
        }
    }

    /// All values, row-major.
    pub fn iter(&self) -> Box<dyn Iterator<Item = &f64> + '_> {
        match self {
            OutputSeries::Vector(v) => Box::new(v.iter()),
            OutputSeries::Matrix(m) => Box::new(m.iter()),
        }
    }

    /// Copy with every value shifted by `offset`.
    pub fn offset(&self, offset: f64) -> OutputSeries {
        match self {
            OutputSeries::Vector(v) => OutputSeries::Vector(v + offset),
            OutputSeries::Matrix(m) => OutputSeries::Matrix(m + offset),
        }
    }

    /// Copy without the first sample.
    pub fn skip_first(&self) -> OutputSeries {
        match self {
            OutputSeries::Vector(v) => OutputSeries::Vector(v.slice(s![1..]).to_owned()),
            OutputSeries::Matrix(m) => OutputSeries::Matrix(m.slice(s![1.., ..]).to_owned()),
        }
    }
}

impl From<Array1<f64>> for OutputSeries {
    fn from(v: Array1<f64>) -> Self {
        OutputSeries::Vector(v)
    }
}

impl From<Array2<f64>> for OutputSeries {
    fn from(m: Array2<f64>) -> Self {
        OutputSeries::Matrix(m).normalized()
    }
}

/// Validate an equally spaced, increasing time grid and return its step.
///
/// Spacing is accepted when every step is within
/// `STEP_ATOL + STEP_RTOL · |dt|` of the first step.
///
/// # Errors
/// - [`ThermalError::TooFewSamples`] for fewer than two samples.
/// - [`ThermalError::NonFiniteData`] for NaN/±inf time stamps.
/// - [`ThermalError::NonUniformTimeStep`] for a non-positive first step or
///   any step outside tolerance.
pub fn uniform_step(t: ArrayView1<'_, f64>) -> ThermalResult<f64> {
    if t.len() < 2 {
        return Err(ThermalError::TooFewSamples { len: t.len() });
    }
    if let Some((index, &value)) = t.iter().enumerate().find(|(_, v)| !v.is_finite()) {
        return Err(ThermalError::NonFiniteData { what: "t", index, value });
    }
    let dt = t[1] - t[0];
    if dt <= 0.0 {
        return Err(ThermalError::NonUniformTimeStep { index: 0, step: dt, expected: dt });
    }
    let tol = STEP_ATOL + STEP_RTOL * dt.abs();
    for (index, pair) in t.windows(2).into_iter().enumerate() {
        let step = pair[1] - pair[0];
        if (step - dt).abs() > tol {
            return Err(ThermalError::NonUniformTimeStep { index, step, expected: dt });
        }
    }
    Ok(dt)
}
