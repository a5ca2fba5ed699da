//! estimation — fitting the thermal model to measured series.
//!
//! Purpose
//! -------
//! Turn measured `(t, u, y, x0)` into fitted [`TargetParams`] and the
//! matching state-space matrices, and report how well they explain the
//! data.
//!
//! Key behaviors
//! -------------
//! - `data`: validated series bundle ([`FitData`](data::FitData)).
//! - `error_fn`: the error-functional family, selected by
//!   [`ErrorKind`](error_fn::ErrorKind).
//! - `simulation`: contract for the external simulation engine used by the
//!   simulation-backed functional.
//! - `driver`: [`fit`](driver::fit) / [`fit_with`](driver::fit_with),
//!   single-shot and reentrant.
//! - `evaluation`: residuals, state trajectories, MSE and observability
//!   after a fit.
//!
//! Conventions
//! -----------
//! - Functional and data errors are [`ThermalError`]s; the driver returns
//!   them wrapped in `OptError::Model` alongside optimizer errors.
//! - Nothing here spawns threads. Distinct fits may run concurrently as
//!   long as each binds its own functional.
//!
//! [`TargetParams`]: crate::thermal::params::TargetParams
//! [`ThermalError`]: crate::thermal::errors::ThermalError

pub mod data;
pub mod driver;
pub mod error_fn;
pub mod evaluation;
pub mod simulation;

pub mod prelude {
    pub use super::data::FitData;
    pub use super::driver::{FitOptions, FitOutcome, fit, fit_with};
    pub use super::error_fn::{
        ErrorFunctional, ErrorKind, LikelihoodConfig, Prior, SensorNoise,
    };
    pub use super::evaluation::{EvaluationReport, Evaluator};
    pub use super::simulation::{
        ModelId, NamedValues, SimulationConfig, SimulationEngine, SimulationHandle,
    };
}
