//! High-level entry point for bounded minimization.
//!
//! [`OptimizerBackend`] implements [`Minimizer`]: it validates its options,
//! builds the [`BoundTransform`] around `x0`, wraps the objective in an
//! [`ObjectiveAdapter`] and delegates the run to the matching runner.
use crate::optimization::{
    errors::OptResult,
    minimizer::{
        adapter::ObjectiveAdapter,
        bounds::{BoundTransform, Bounds},
        builders::{build_lbfgs_hager_zhang, build_lbfgs_more_thuente, build_nelder_mead},
        run::{run_lbfgs, run_nelder_mead},
        traits::{LineSearcher, Minimizer, Objective, OptimOutcome, OptimizerBackend},
        types::Theta,
    },
};
use tracing::debug;

impl Minimizer for OptimizerBackend {
    /// Minimize `objective` from `x0` within `bounds`.
    ///
    /// # Behavior
    /// - Validates the backend options.
    /// - Builds the bound reparameterization scaled around `x0` and starts
    ///   the solver at the preimage of `x0`.
    /// - L-BFGS picks its line search from `opts.line_searcher`;
    ///   Nelder–Mead builds its simplex around the starting coordinates.
    ///
    /// # Errors
    /// - Option validation errors.
    /// - `InvalidBounds`, `EmptyInitialPoint`, `InitialOutsideBounds` from
    ///   the transform.
    /// - Objective and solver errors raised during the run.
    fn minimize(
        &self, objective: &dyn Objective, x0: &Theta, bounds: &Bounds,
    ) -> OptResult<OptimOutcome> {
        self.validate()?;
        let transform = BoundTransform::new(bounds, x0)?;
        let theta0 = transform.to_unconstrained(x0);
        let problem = ObjectiveAdapter::new(objective, &transform);
        debug!(backend = self.name(), dim = transform.dim(), "starting minimization");
        match self {
            OptimizerBackend::Lbfgs(opts) => match opts.line_searcher {
                LineSearcher::MoreThuente => {
                    let solver = build_lbfgs_more_thuente(opts)?;
                    run_lbfgs(theta0, opts.tols.max_iter, opts.verbose, problem, solver)
                }
                LineSearcher::HagerZhang => {
                    let solver = build_lbfgs_hager_zhang(opts)?;
                    run_lbfgs(theta0, opts.tols.max_iter, opts.verbose, problem, solver)
                }
            },
            OptimizerBackend::NelderMead(opts) => {
                let solver = build_nelder_mead(&theta0, opts)?;
                run_nelder_mead(opts.max_iter, opts.verbose, problem, solver)
            }
        }
    }
}

/// Minimize with the given backend. Shorthand for
/// `backend.minimize(objective, x0, bounds)`.
pub fn minimize(
    backend: &OptimizerBackend, objective: &dyn Objective, x0: &Theta, bounds: &Bounds,
) -> OptResult<OptimOutcome> {
    backend.minimize(objective, x0, bounds)
}
