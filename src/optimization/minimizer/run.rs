//! Execution helpers that run an `argmin` solver on an
//! [`ObjectiveAdapter`] and return a crate-friendly [`OptimOutcome`].
//!
//! The solver's best point lives in unconstrained coordinates; both runners
//! map it back through the bound transform before building the outcome, so
//! callers only ever see bounded parameters.
use crate::optimization::{
    errors::OptResult,
    minimizer::{
        adapter::ObjectiveAdapter,
        traits::OptimOutcome,
        types::{Grad, Theta},
    },
};
use argmin::core::{Executor, IterState, Solver, State};
use tracing::debug;

/// Run an L-BFGS solver (either line search).
///
/// # Arguments
/// - `theta0`: initial solver coordinates, consumed by `state.param`.
/// - `max_iter`: optional iteration cap.
/// - `verbose`: attach the slog terminal observer (`obs_slog` feature).
/// - `problem`: the adapted objective.
/// - `solver`: a fully constructed solver from
///   [`builders`](crate::optimization::minimizer::builders).
///
/// # Errors
/// - Argmin runtime errors (line-search failures, objective errors) via
///   `From<argmin::core::Error>`.
/// - Validation errors from [`OptimOutcome::new`].
pub fn run_lbfgs<'a, S>(
    theta0: Theta, max_iter: Option<usize>, verbose: bool, problem: ObjectiveAdapter<'a>,
    solver: S,
) -> OptResult<OptimOutcome>
where
    S: Solver<ObjectiveAdapter<'a>, IterState<Theta, Grad, (), (), (), f64>> + Send + 'static,
{
    let transform = problem.transform;
    #[cfg(feature = "obs_slog")]
    if verbose {
        log_initial_state(&theta0, &problem)?;
    }
    #[cfg(not(feature = "obs_slog"))]
    let _ = verbose;

    let mut optimizer = Executor::new(problem, solver);
    optimizer = optimizer.configure(|state| state.param(theta0));
    #[cfg(feature = "obs_slog")]
    if verbose {
        let observer = argmin_observer_slog::SlogLogger::term_noblock();
        optimizer = optimizer.add_observer(observer, argmin::core::observers::ObserverMode::Always);
    }
    if let Some(max_iter) = max_iter {
        optimizer = optimizer.configure(|state| state.max_iters(max_iter as u64));
    }

    let mut result = optimizer.run()?.state().clone();
    let iterations = result.get_iter();
    let function_counts = result.get_func_counts().clone();
    let termination = result.get_termination_status().clone();
    let grad = result.take_gradient();
    debug!(iterations, status = ?termination, "L-BFGS finished");
    OptimOutcome::new(
        result.take_best_param().map(|theta| transform.to_constrained(&theta)),
        result.get_best_cost(),
        termination,
        iterations,
        function_counts,
        grad,
    )
}

/// Run a Nelder–Mead solver. The initial simplex is already inside the
/// solver, so only the iteration cap is configured here.
///
/// # Errors
/// As for [`run_lbfgs`].
pub fn run_nelder_mead<'a, S>(
    max_iter: usize, verbose: bool, problem: ObjectiveAdapter<'a>, solver: S,
) -> OptResult<OptimOutcome>
where
    S: Solver<ObjectiveAdapter<'a>, IterState<Theta, (), (), (), (), f64>> + Send + 'static,
{
    let transform = problem.transform;
    #[cfg(not(feature = "obs_slog"))]
    let _ = verbose;

    let mut optimizer = Executor::new(problem, solver);
    optimizer = optimizer.configure(|state| state.max_iters(max_iter as u64));
    #[cfg(feature = "obs_slog")]
    if verbose {
        let observer = argmin_observer_slog::SlogLogger::term_noblock();
        optimizer = optimizer.add_observer(observer, argmin::core::observers::ObserverMode::Always);
    }

    let mut result = optimizer.run()?.state().clone();
    let iterations = result.get_iter();
    let function_counts = result.get_func_counts().clone();
    let termination = result.get_termination_status().clone();
    debug!(iterations, status = ?termination, "Nelder-Mead finished");
    OptimOutcome::new(
        result.take_best_param().map(|theta| transform.to_constrained(&theta)),
        result.get_best_cost(),
        termination,
        iterations,
        function_counts,
        None,
    )
}

// ---- Helper Methods ----

#[cfg(feature = "obs_slog")]
fn log_initial_state(theta0: &Theta, problem: &ObjectiveAdapter<'_>) -> OptResult<()> {
    use argmin::core::{CostFunction, Gradient};
    use argmin_math::ArgminL2Norm;

    let c0 = problem.cost(theta0)?;
    let g0n = problem.gradient(theta0).ok().map(|g| g.l2_norm());
    debug!(cost = c0, grad_norm = ?g0n, "initial state");
    Ok(())
}
