//! Gaussian-likelihood error functional.
//!
//! Purpose
//! -------
//! Score candidate parameters by the (negated) Gaussian likelihood of the
//! residual under known sensor noise, optionally weighted by a prior. The
//! optimizer minimizes the score, so better fits are more negative.
//!
//! Key behaviors
//! -------------
//! The branch is chosen by the length of the initial state:
//!
//! - **Multivariate** (`x0.len() > 1`):
//!   `−prior(p) · exp(−½ · trace(eᵀe · Σ⁻¹))`, with `e` the `N × c`
//!   residual and `Σ` a `c × c` covariance.
//! - **Univariate** (`x0.len() == 1`):
//!   `−prior(p) · Π exp(−eᵢ² / (2σ²)) / √(2πσ²)` over every residual entry.
//!
//! Known limitation
//! ----------------
//! The multivariate score is not normalized: the constant
//! `((2π)^c · |Σ|)^N` under the square root is taken as 1. Scores from the
//! two branches are therefore not comparable, and long records drive the
//! exponential towards zero.
use std::{fmt, sync::Arc};

use crate::{
    estimation::{
        data::FitData,
        error_fn::{ErrorFunctional, closed_form_residual},
    },
    thermal::{
        errors::{ThermalError, ThermalResult},
        params::TargetParams,
        state_space::OutputMode,
    },
};
use nalgebra::DMatrix;
use ndarray::Array2;
use statrs::distribution::{Continuous, Normal};

/// Prior weight over parameters; `None` means a constant weight of 1.
pub type Prior = Arc<dyn Fn(&TargetParams) -> f64 + Send + Sync>;

/// Sensor noise level.
#[derive(Debug, Clone, PartialEq)]
pub enum SensorNoise {
    /// Scalar variance `σ²`; used as `σ² · I` by the multivariate branch.
    Variance(f64),
    /// Full covariance, one row/column per output channel.
    Covariance(Array2<f64>),
}

#[derive(Clone)]
pub struct LikelihoodConfig {
    pub sensor_noise: SensorNoise,
    pub prior: Option<Prior>,
}

impl fmt::Debug for LikelihoodConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LikelihoodConfig")
            .field("sensor_noise", &self.sensor_noise)
            .field("prior", &self.prior.as_ref().map(|_| "<fn>"))
            .finish()
    }
}

impl LikelihoodConfig {
    pub fn new(sensor_noise: SensorNoise) -> Self {
        Self { sensor_noise, prior: None }
    }

    pub fn with_prior(
        mut self, prior: impl Fn(&TargetParams) -> f64 + Send + Sync + 'static,
    ) -> Self {
        self.prior = Some(Arc::new(prior));
        self
    }
}

#[derive(Debug, Clone)]
enum Branch {
    Multivariate { cov_inv: Array2<f64> },
    Univariate { density: Normal },
}

pub struct LikelihoodError<'a> {
    data: &'a FitData,
    mode: OutputMode,
    prior: Option<&'a Prior>,
    branch: Branch,
}

impl<'a> LikelihoodError<'a> {
    /// Bind the functional and precompute `Σ⁻¹` or the scalar density.
    ///
    /// # Errors
    /// - `ShapeMismatch` if `y` does not have the layout of `mode`.
    /// - [`ThermalError::InvalidSensorNoise`] for a zero or non-finite
    ///   variance, a covariance whose size differs from the channel count
    ///   (or is not 1×1 in the univariate branch), or a singular covariance.
    pub fn new(
        data: &'a FitData, mode: OutputMode, config: &'a LikelihoodConfig,
    ) -> ThermalResult<Self> {
        data.check_mode(mode)?;
        let branch = if data.is_multistate() {
            let channels = data.y.n_channels();
            let cov = match &config.sensor_noise {
                SensorNoise::Variance(v) => Array2::eye(channels) * checked_variance(*v)?,
                SensorNoise::Covariance(c) if c.dim() == (channels, channels) => c.clone(),
                SensorNoise::Covariance(_) => {
                    return Err(ThermalError::InvalidSensorNoise {
                        reason: "covariance must be square with one row per output channel",
                    });
                }
            };
            Branch::Multivariate { cov_inv: invert(&cov)? }
        } else {
            let variance = match &config.sensor_noise {
                SensorNoise::Variance(v) => checked_variance(*v)?,
                SensorNoise::Covariance(c) if c.dim() == (1, 1) => checked_variance(c[[0, 0]])?,
                SensorNoise::Covariance(_) => {
                    return Err(ThermalError::InvalidSensorNoise {
                        reason: "a single-state fit needs a scalar variance or a 1x1 covariance",
                    });
                }
            };
            let density = Normal::new(0.0, variance.sqrt()).map_err(|_| {
                ThermalError::InvalidSensorNoise {
                    reason: "variance does not define a normal density",
                }
            })?;
            Branch::Univariate { density }
        };
        Ok(Self { data, mode, prior: config.prior.as_ref(), branch })
    }
}

impl ErrorFunctional for LikelihoodError<'_> {
    fn evaluate(&self, params: &TargetParams) -> ThermalResult<f64> {
        let prior = self.prior.map_or(1.0, |p| p(params));
        let residual = closed_form_residual(self.data, self.mode, params)?;
        let likelihood = match &self.branch {
            Branch::Multivariate { cov_inv } => {
                let e = residual.as_matrix();
                let quad = e.t().dot(&e).dot(cov_inv).diag().sum();
                (-0.5 * quad).exp()
            }
            Branch::Univariate { density } => residual.iter().map(|&r| density.pdf(r)).product(),
        };
        Ok(-prior * likelihood)
    }

    fn name(&self) -> &'static str {
        "likelihood"
    }
}

fn checked_variance(value: f64) -> ThermalResult<f64> {
    let variance = value.abs();
    if !variance.is_finite() || variance == 0.0 {
        return Err(ThermalError::InvalidSensorNoise {
            reason: "variance must be finite and non-zero",
        });
    }
    Ok(variance)
}

fn invert(cov: &Array2<f64>) -> ThermalResult<Array2<f64>> {
    if cov.iter().any(|v| !v.is_finite()) {
        return Err(ThermalError::InvalidSensorNoise { reason: "covariance must be finite" });
    }
    let (rows, cols) = cov.dim();
    let inv = DMatrix::from_fn(rows, cols, |i, j| cov[[i, j]])
        .try_inverse()
        .ok_or(ThermalError::InvalidSensorNoise { reason: "covariance is singular" })?;
    Ok(Array2::from_shape_fn((rows, cols), |(i, j)| inv[(i, j)]))
}
