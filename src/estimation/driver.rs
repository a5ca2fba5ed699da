//! Optimization driver: fit thermal parameters to measured series.
//!
//! Purpose
//! -------
//! Compose the parameter merger, a bound error functional and a minimizer
//! into a single-shot fit. The driver owns no state between calls; each
//! [`fit`] binds a fresh functional.
//!
//! Key behaviors
//! -------------
//! 1. Validate the fixed-parameter map and bind the chosen
//!    [`ErrorKind`] to the data and output mode.
//! 2. Project the initial guess onto the free coordinates.
//! 3. Minimize `x ↦ cost(merge(x, fixed))` once within the configured
//!    bounds (default: every free parameter `> 1e-12`).
//! 4. Merge the optimum with the fixed values and rebuild `(A, B, C, D)`.
//!
//! Invariants & assumptions
//! ------------------------
//! - Fixed values are returned exactly as given.
//! - A non-converged run is not an error; it is reported through
//!   [`FitOutcome::converged`] and [`FitOutcome::status`].
//! - Errors from the functional, the simulation engine or the minimizer
//!   propagate unmodified (thermal errors as
//!   [`OptError::Model`](crate::optimization::errors::OptError::Model)).
//! - When every parameter is fixed the minimizer is not called; the cost is
//!   evaluated once.
use crate::{
    estimation::{
        data::FitData,
        error_fn::{ErrorFunctional, ErrorKind},
    },
    optimization::{
        errors::OptResult,
        minimizer::{
            Bounds, FnEvalMap, Minimizer, Objective, OptimOutcome, OptimizerBackend,
            types::{Cost, Theta},
        },
    },
    thermal::{
        merge::{FixedParams, free_projection, merge_params},
        params::{DEFAULT_PARAMS, TargetParams},
        state_space::{OutputMode, StateSpace},
    },
};
use ndarray::Array2;
use tracing::{debug, info};

/// Status reported when no parameter is left free.
pub const ALL_FIXED_STATUS: &str = "AllParametersFixed";

/// Everything that configures one fit.
///
/// Default: start from [`DEFAULT_PARAMS`], nothing fixed, both outputs,
/// squared error, L-BFGS, free parameters bounded below by `1e-12`.
#[derive(Debug, Clone)]
pub struct FitOptions {
    pub initial_guess: TargetParams,
    pub fixed: FixedParams,
    pub output_mode: OutputMode,
    pub error_kind: ErrorKind,
    pub backend: OptimizerBackend,
    pub bounds: Bounds,
}

impl Default for FitOptions {
    fn default() -> Self {
        Self {
            initial_guess: DEFAULT_PARAMS,
            fixed: FixedParams::new(),
            output_mode: OutputMode::Both,
            error_kind: ErrorKind::Squared,
            backend: OptimizerBackend::default(),
            bounds: Bounds::default(),
        }
    }
}

/// Result of a fit.
///
/// - `state_space`: `(A, B, C, D)` rebuilt from `params` for the fit's
///   output mode.
/// - `params`: fitted parameters with fixed values in place.
/// - `cost`: error-functional value at `params`.
/// - `converged`, `status`, `iterations`, `fn_evals`: minimizer diagnostics.
#[derive(Debug, Clone, PartialEq)]
pub struct FitOutcome {
    pub state_space: StateSpace,
    pub params: TargetParams,
    pub cost: f64,
    pub converged: bool,
    pub status: String,
    pub iterations: usize,
    pub fn_evals: FnEvalMap,
}

impl FitOutcome {
    /// `(A, B, C, D)` as owned matrices.
    pub fn matrices(&self) -> (Array2<f64>, Array2<f64>, Array2<f64>, Array2<f64>) {
        self.state_space.clone().into_matrices()
    }
}

/// Fit with the backend named in `options`.
///
/// # Errors
/// See [`fit_with`].
pub fn fit(data: &FitData, options: &FitOptions) -> OptResult<FitOutcome> {
    fit_with(data, options, &options.backend)
}

/// Fit with a caller-supplied minimizer; `options.backend` is ignored.
///
/// # Errors
/// - `OptError::Model` for invalid fixed parameters, shape mismatches
///   between `y` and the output mode, invalid functional configuration,
///   and any thermal or simulation error raised while evaluating the cost.
/// - Minimizer errors (options, bounds, initial point, solver failures).
pub fn fit_with(
    data: &FitData, options: &FitOptions, minimizer: &dyn Minimizer,
) -> OptResult<FitOutcome> {
    options.fixed.validate()?;
    debug!(
        error_kind = options.error_kind.name(),
        mode = options.output_mode.as_str(),
        "binding error functional"
    );
    let functional = options.error_kind.bind(data, options.output_mode)?;
    let objective = MergedObjective { functional: functional.as_ref(), fixed: &options.fixed };
    let x0 = free_projection(&options.initial_guess, &options.fixed);
    info!(
        error_kind = functional.name(),
        free = x0.len(),
        fixed = options.fixed.len(),
        samples = data.len(),
        "starting fit"
    );

    let (params, cost, converged, status, iterations, fn_evals) = if x0.is_empty() {
        let params = merge_params(x0.view(), &options.fixed)?;
        let cost = functional.evaluate(&params)?;
        (params, cost, true, ALL_FIXED_STATUS.to_string(), 0, FnEvalMap::new())
    } else {
        let outcome = minimizer.minimize(&objective, &x0, &options.bounds)?;
        let params = merge_params(outcome.theta_hat.view(), &options.fixed)?;
        let OptimOutcome { value, converged, status, iterations, fn_evals, .. } = outcome;
        (params, value, converged, status, iterations, fn_evals)
    };

    let state_space = StateSpace::new(&params, options.output_mode)?;
    info!(converged, status = %status, iterations, cost, "fit finished");
    debug!(a = ?state_space.a, b = ?state_space.b, c = ?state_space.c, "fitted matrices");
    Ok(FitOutcome { state_space, params, cost, converged, status, iterations, fn_evals })
}

/// Cost over the free coordinates: merge with the fixed values, then
/// evaluate the bound functional.
struct MergedObjective<'a> {
    functional: &'a dyn ErrorFunctional,
    fixed: &'a FixedParams,
}

impl Objective for MergedObjective<'_> {
    fn value(&self, x: &Theta) -> OptResult<Cost> {
        let params = merge_params(x.view(), self.fixed)?;
        Ok(self.functional.evaluate(&params)?)
    }
}
