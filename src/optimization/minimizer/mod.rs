//! minimizer — argmin-powered bounded minimization.
//!
//! Purpose
//! -------
//! Provide a small, backend-agnostic layer for **minimizing a scalar cost**
//! over a box-bounded parameter vector. Callers implement [`Objective`],
//! pick an [`OptimizerBackend`] (L-BFGS or Nelder–Mead) and call
//! [`Minimizer::minimize`].
//!
//! Key behaviors
//! -------------
//! - Enforce bounds by reparameterization ([`bounds::BoundTransform`]): the
//!   solver works on unconstrained coordinates and every evaluation maps
//!   them into the box.
//! - Bridge the objective into Argmin via [`adapter::ObjectiveAdapter`],
//!   with central/forward finite-difference gradients when no analytic
//!   gradient exists.
//! - Build solvers in [`builders`], run them in [`run`] and normalize the
//!   final state into an [`OptimOutcome`].
//!
//! Invariants & assumptions
//! ------------------------
//! - Objective values must be finite; NaN/±inf is an error, not a value.
//! - `converged` is `true` only when the solver's own criterion fired.
//!   Exhausting `max_iter` returns the best point with `converged = false`.
//! - Options are validated before any solver is built.
//!
//! Conventions
//! -----------
//! - Parameters, gradients and costs use the aliases in [`types`].
//! - Errors bubble up as [`OptResult<T>`](crate::optimization::errors::OptResult);
//!   nothing here panics on bad input.
//!
//! Testing notes
//! -------------
//! - Unit tests cover bound maps, gradient chaining, option validation and
//!   end-to-end runs on quadratics in [`api`].

pub mod adapter;
pub mod api;
pub mod bounds;
pub mod builders;
pub mod run;
pub mod traits;
pub mod types;
pub mod validation;

// ---- Re-exports (primary public surface) ----------------------------------

pub use self::api::minimize;
pub use self::bounds::{Bounds, DEFAULT_LOWER_BOUND};
pub use self::traits::{
    LbfgsOptions, LineSearcher, Minimizer, NelderMeadOptions, Objective, OptimOutcome,
    OptimizerBackend, Tolerances,
};
pub use self::types::{Cost, DEFAULT_LBFGS_MEM, FnEvalMap, Grad, Theta};

pub mod prelude {
    pub use super::api::minimize;
    pub use super::bounds::Bounds;
    pub use super::traits::{
        LbfgsOptions, LineSearcher, Minimizer, NelderMeadOptions, Objective, OptimOutcome,
        OptimizerBackend, Tolerances,
    };
    pub use super::types::{Cost, Grad, Theta};
}
