//! Public API surface for bounded minimization.
//!
//! - [`Objective`]: the scalar cost users implement.
//! - [`Minimizer`]: the backend contract, `minimize(objective, x0, bounds)`.
//! - [`Tolerances`], [`LbfgsOptions`], [`NelderMeadOptions`]: one typed,
//!   validated options struct per backend.
//! - [`OptimizerBackend`]: closed choice of built-in backends.
//! - [`OptimOutcome`]: normalized result returned by every backend.
//!
//! Convention: the objective is *minimized* directly; there is no sign flip.
//! Objective parameters are the bounded values; the unconstrained solver
//! coordinates never leave the minimizer.
use crate::optimization::{
    errors::{OptError, OptResult},
    minimizer::{
        bounds::Bounds,
        types::{Cost, DEFAULT_LBFGS_MEM, FnEvalMap, Grad, Theta},
        validation::{
            validate_theta_hat, validate_value, verify_max_iter, verify_sd_tolerance,
            verify_simplex_step, verify_tol_cost, verify_tol_grad,
        },
    },
};
use argmin::core::{TerminationReason, TerminationStatus};
use argmin_math::ArgminL2Norm;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// User-implemented scalar cost.
///
/// Required:
/// - `value(&Theta) -> OptResult<Cost>`: evaluate the cost at bounded
///   parameters `x`. Return a descriptive `OptError` for invalid inputs or
///   model failures; they reach the caller unmodified.
///
/// Optional:
/// - `grad(&Theta) -> OptResult<Grad>`: analytic gradient `∇c(x)`. If not
///   implemented, finite differences are used automatically.
pub trait Objective {
    fn value(&self, x: &Theta) -> OptResult<Cost>;

    fn grad(&self, _x: &Theta) -> OptResult<Grad> {
        Err(OptError::GradientNotImplemented)
    }
}

/// Backend contract: minimize `objective` from `x0` within `bounds`.
///
/// Implement this for a custom optimizer and pass it to
/// [`fit_with`](crate::estimation::driver::fit_with); the driver calls it
/// exactly once per fit.
pub trait Minimizer {
    fn minimize(
        &self, objective: &dyn Objective, x0: &Theta, bounds: &Bounds,
    ) -> OptResult<OptimOutcome>;
}

/// Choice of line search used inside the L-BFGS solver.
///
/// Parsing accepts case-insensitive `"MoreThuente"` / `"HagerZhang"`;
/// anything else returns `OptError::InvalidLineSearch`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum LineSearcher {
    #[default]
    MoreThuente,
    HagerZhang,
}

impl FromStr for LineSearcher {
    type Err = OptError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "morethuente" => Ok(LineSearcher::MoreThuente),
            "hagerzhang" => Ok(LineSearcher::HagerZhang),
            _ => Err(OptError::InvalidLineSearch {
                name: s.to_string(),
                reason: "Valid options are case insensitive 'MoreThuente' or 'HagerZhang'.",
            }),
        }
    }
}

/// Numerical tolerances and iteration limits used by L-BFGS.
///
/// - `tol_grad`: terminate when the gradient norm falls below this threshold.
/// - `tol_cost`: terminate when the change in cost falls below this threshold.
/// - `max_iter`: hard cap on the number of iterations.
///
/// At least one of the three must be provided (see [`Tolerances::new`]).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Tolerances {
    pub tol_grad: Option<f64>,
    pub tol_cost: Option<f64>,
    pub max_iter: Option<usize>,
}

impl Tolerances {
    /// Construct validated tolerances.
    ///
    /// # Rules
    /// - At least one of `tol_grad`, `tol_cost`, or `max_iter` must be `Some`.
    /// - If provided, tolerances must be **finite and strictly positive**.
    /// - If provided, `max_iter` must be `> 0`.
    ///
    /// # Errors
    /// - [`OptError::NoTolerancesProvided`] if all three are `None`.
    /// - [`OptError::InvalidTolGrad`] / [`OptError::InvalidTolCost`] for
    ///   non-finite or non-positive tolerances.
    /// - [`OptError::InvalidMaxIter`] if `max_iter == 0`.
    pub fn new(
        tol_grad: Option<f64>, tol_cost: Option<f64>, max_iter: Option<usize>,
    ) -> OptResult<Self> {
        if tol_grad.is_none() && tol_cost.is_none() && max_iter.is_none() {
            return Err(OptError::NoTolerancesProvided);
        }
        verify_tol_cost(tol_cost)?;
        verify_tol_grad(tol_grad)?;
        if let Some(max_iter) = max_iter {
            verify_max_iter(max_iter)?;
        }
        Ok(Self { tol_grad, tol_cost, max_iter })
    }
}

/// L-BFGS configuration.
///
/// Default:
/// - `tols`: `tol_grad = 1e-8`, `tol_cost = None`, `max_iter = 500`
/// - `line_searcher`: `MoreThuente`
/// - `lbfgs_mem`: `None` (uses [`DEFAULT_LBFGS_MEM`])
/// - `verbose`: `false`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LbfgsOptions {
    pub tols: Tolerances,
    pub line_searcher: LineSearcher,
    pub lbfgs_mem: Option<usize>,
    /// Attach a terminal observer (behind the `obs_slog` feature).
    pub verbose: bool,
}

impl LbfgsOptions {
    /// # Errors
    /// [`OptError::InvalidLBFGSMem`] when `lbfgs_mem == Some(0)`.
    pub fn new(
        tols: Tolerances, line_searcher: LineSearcher, lbfgs_mem: Option<usize>, verbose: bool,
    ) -> OptResult<Self> {
        let opts = Self { tols, line_searcher, lbfgs_mem, verbose };
        opts.validate()?;
        Ok(opts)
    }

    /// Re-check invariants, e.g. after deserialization.
    pub fn validate(&self) -> OptResult<()> {
        Tolerances::new(self.tols.tol_grad, self.tols.tol_cost, self.tols.max_iter)?;
        if let Some(mem) = self.lbfgs_mem {
            if mem == 0 {
                return Err(OptError::InvalidLBFGSMem {
                    mem,
                    reason: "L-BFGS memory must be greater than zero.",
                });
            }
        }
        Ok(())
    }

    /// History size actually used.
    pub fn memory(&self) -> usize {
        self.lbfgs_mem.unwrap_or(DEFAULT_LBFGS_MEM)
    }
}

impl Default for LbfgsOptions {
    fn default() -> Self {
        Self {
            tols: Tolerances { tol_grad: Some(1e-8), tol_cost: None, max_iter: Some(500) },
            line_searcher: LineSearcher::MoreThuente,
            lbfgs_mem: None,
            verbose: false,
        }
    }
}

/// Nelder–Mead configuration.
///
/// - `max_iter`: iteration cap.
/// - `initial_step`: relative perturbation used to build the initial simplex
///   around the starting point (in solver coordinates).
/// - `sd_tolerance`: stop when the standard deviation of the simplex costs
///   falls below this value.
///
/// Default: `max_iter = 2000`, `initial_step = 0.05`, `sd_tolerance = 1e-12`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NelderMeadOptions {
    pub max_iter: usize,
    pub initial_step: f64,
    pub sd_tolerance: f64,
    pub verbose: bool,
}

impl NelderMeadOptions {
    pub fn new(
        max_iter: usize, initial_step: f64, sd_tolerance: f64, verbose: bool,
    ) -> OptResult<Self> {
        let opts = Self { max_iter, initial_step, sd_tolerance, verbose };
        opts.validate()?;
        Ok(opts)
    }

    pub fn validate(&self) -> OptResult<()> {
        verify_max_iter(self.max_iter)?;
        verify_simplex_step(self.initial_step)?;
        verify_sd_tolerance(self.sd_tolerance)
    }
}

impl Default for NelderMeadOptions {
    fn default() -> Self {
        Self { max_iter: 2000, initial_step: 0.05, sd_tolerance: 1e-12, verbose: false }
    }
}

/// Built-in optimizer backends, each with its own options.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum OptimizerBackend {
    /// Quasi-Newton with finite-difference gradients.
    Lbfgs(LbfgsOptions),
    /// Derivative-free simplex search.
    NelderMead(NelderMeadOptions),
}

impl Default for OptimizerBackend {
    fn default() -> Self {
        OptimizerBackend::Lbfgs(LbfgsOptions::default())
    }
}

impl OptimizerBackend {
    pub fn name(&self) -> &'static str {
        match self {
            OptimizerBackend::Lbfgs(_) => "L-BFGS",
            OptimizerBackend::NelderMead(_) => "Nelder-Mead",
        }
    }

    pub fn validate(&self) -> OptResult<()> {
        match self {
            OptimizerBackend::Lbfgs(opts) => opts.validate(),
            OptimizerBackend::NelderMead(opts) => opts.validate(),
        }
    }
}

/// Canonical result returned by every backend.
///
/// - `theta_hat`: best point found, in the objective's (bounded) space.
/// - `value`: objective value at `theta_hat`.
/// - `converged`: `true` only if the solver met its own stopping criterion
///   (or a target cost); hitting `max_iter` is *not* convergence.
/// - `status`: human-readable termination status.
/// - `iterations`: number of optimizer iterations performed.
/// - `fn_evals`: function-evaluation counters reported by `argmin`.
/// - `grad_norm`: norm of the last available gradient, if present.
#[derive(Debug, Clone, PartialEq)]
pub struct OptimOutcome {
    pub theta_hat: Theta,
    pub value: f64,
    pub converged: bool,
    pub status: String,
    pub iterations: usize,
    pub fn_evals: FnEvalMap,
    pub grad_norm: Option<f64>,
}

impl OptimOutcome {
    /// Build a validated [`OptimOutcome`] from raw solver state.
    ///
    /// # Errors
    /// Propagates validation errors for `theta_hat` or `value`.
    pub fn new(
        theta_hat_opt: Option<Theta>, value: f64, termination: TerminationStatus, iterations: u64,
        fn_evals: FnEvalMap, grad: Option<Grad>,
    ) -> OptResult<Self> {
        let theta_hat = validate_theta_hat(theta_hat_opt)?;
        validate_value(value)?;
        let (converged, status) = match termination {
            TerminationStatus::NotTerminated => (false, "Not terminated".to_string()),
            TerminationStatus::Terminated(reason) => {
                let converged = matches!(
                    reason,
                    TerminationReason::SolverConverged | TerminationReason::TargetCostReached
                );
                (converged, format!("{reason:?}"))
            }
        };
        let iterations = iterations as usize;
        let grad_norm = grad.map(|g| g.l2_norm());
        Ok(Self { theta_hat, value, converged, status, iterations, fn_evals, grad_norm })
    }
}
