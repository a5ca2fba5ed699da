//! error_fn — the error-functional family.
//!
//! Purpose
//! -------
//! An error functional binds a dataset once and maps candidate parameters
//! to a scalar cost, many times, inside the optimizer loop. Four variants
//! share the [`ErrorFunctional`] capability:
//!
//! - [`AbsoluteError`]: `Σ|e| / N` on the closed-form response.
//! - [`SquaredError`]: `trace(eᵀe) / N` (matrix) or `eᵀe / N` (vector).
//! - [`SimulationSquaredError`]: squared error against an external engine's
//!   surface-temperature trajectory, scaled by a gain.
//! - [`LikelihoodError`]: negative Gaussian likelihood score.
//!
//! The variant is chosen by the closed [`ErrorKind`] enum and bound with
//! [`ErrorKind::bind`].
//!
//! Invariants & assumptions
//! ------------------------
//! - Functionals never mutate the bound data; `evaluate` takes `&self`.
//! - Shape disagreements between expected and modeled outputs are explicit
//!   [`ThermalError::ShapeMismatch`](crate::thermal::errors::ThermalError::ShapeMismatch)
//!   errors, checked at bind time where possible.

pub mod absolute;
pub mod likelihood;
pub mod simulation;
pub mod squared;

use std::fmt;

use crate::{
    estimation::{data::FitData, simulation::SimulationConfig},
    thermal::{
        errors::ThermalResult, params::TargetParams, response::target_response,
        series::OutputSeries, state_space::OutputMode,
    },
};

pub use self::absolute::AbsoluteError;
pub use self::likelihood::{LikelihoodConfig, LikelihoodError, Prior, SensorNoise};
pub use self::simulation::SimulationSquaredError;
pub use self::squared::SquaredError;

/// A cost bound to one dataset.
pub trait ErrorFunctional {
    /// Cost of `params` against the bound data.
    fn evaluate(&self, params: &TargetParams) -> ThermalResult<f64>;

    /// Short label for diagnostics.
    fn name(&self) -> &'static str;
}

/// Closed choice of error functional.
#[derive(Clone, Default)]
pub enum ErrorKind {
    Absolute,
    #[default]
    Squared,
    SquaredSimulation(SimulationConfig),
    Likelihood(LikelihoodConfig),
}

impl fmt::Debug for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorKind::Absolute => f.write_str("Absolute"),
            ErrorKind::Squared => f.write_str("Squared"),
            ErrorKind::SquaredSimulation(config) => {
                f.debug_tuple("SquaredSimulation").field(config).finish()
            }
            ErrorKind::Likelihood(config) => f.debug_tuple("Likelihood").field(config).finish(),
        }
    }
}

impl ErrorKind {
    pub fn name(&self) -> &'static str {
        match self {
            ErrorKind::Absolute => "absolute",
            ErrorKind::Squared => "squared",
            ErrorKind::SquaredSimulation(_) => "squared_simulation",
            ErrorKind::Likelihood(_) => "likelihood",
        }
    }

    /// Bind the chosen functional to `data` for output `mode`.
    ///
    /// # Errors
    /// Shape and configuration errors of the chosen variant's constructor.
    pub fn bind<'a>(
        &'a self, data: &'a FitData, mode: OutputMode,
    ) -> ThermalResult<Box<dyn ErrorFunctional + 'a>> {
        Ok(match self {
            ErrorKind::Absolute => Box::new(AbsoluteError::new(data, mode)?),
            ErrorKind::Squared => Box::new(SquaredError::new(data, mode)?),
            ErrorKind::SquaredSimulation(config) => {
                Box::new(SimulationSquaredError::new(data, mode, config)?)
            }
            ErrorKind::Likelihood(config) => Box::new(LikelihoodError::new(data, mode, config)?),
        })
    }
}

// ---- Helper Methods ----

/// Residual `y − ŷ` of the closed-form response for `params`.
pub(crate) fn closed_form_residual(
    data: &FitData, mode: OutputMode, params: &TargetParams,
) -> ThermalResult<OutputSeries> {
    let response = target_response(params, mode, data.u.view(), data.t.view(), data.x0.view())?;
    data.y.residual(&response.outputs)
}

/// Sum of squared residuals: `trace(eᵀe)` for a matrix, `eᵀe` for a vector.
pub(crate) fn sum_of_squares(residual: &OutputSeries) -> f64 {
    match residual {
        OutputSeries::Matrix(e) => e.t().dot(e).diag().sum(),
        OutputSeries::Vector(e) => e.dot(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ndarray::array;

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // These tests cover:
    // - The two branches of `sum_of_squares`.
    // - Dispatch from `ErrorKind` to the bound variants.
    // -------------------------------------------------------------------------

    #[test]
    // Purpose
    // -------
    // Matrix and vector residuals give the same sum of squares for the same
    // entries.
    fn sum_of_squares_branches_agree() {
        let m = OutputSeries::Matrix(array![[1.0, 2.0], [3.0, -1.0]]);
        let v = OutputSeries::Vector(array![1.0, 2.0, 3.0, -1.0]);
        assert_relative_eq!(sum_of_squares(&m), 15.0);
        assert_relative_eq!(sum_of_squares(&v), 15.0);
    }

    #[test]
    // Purpose
    // -------
    // `bind` returns the variant named by the kind and checks the layout.
    fn bind_dispatches_on_kind() {
        let data = FitData::new(
            array![0.0, 1.0, 2.0],
            array![[20.0, 0.0], [20.0, 0.0], [20.0, 0.0]],
            array![20.0, 20.0, 20.0],
            array![20.0],
        )
        .unwrap();
        for kind in [ErrorKind::Absolute, ErrorKind::Squared] {
            let functional = kind.bind(&data, OutputMode::Surface).unwrap();
            assert_eq!(functional.name(), kind.name());
            assert_relative_eq!(
                functional.evaluate(&TargetParams::default()).unwrap(),
                0.0,
                epsilon = 1e-9
            );
        }
        assert!(ErrorKind::Squared.bind(&data, OutputMode::Both).is_err());
        assert_eq!(format!("{:?}", ErrorKind::default()), "Squared");
    }
}
