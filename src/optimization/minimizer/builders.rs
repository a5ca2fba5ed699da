//! minimizer::builders — solver construction helpers.
//!
//! Purpose
//! -------
//! Provide small, focused builders for the Argmin solvers behind
//! [`OptimizerBackend`](crate::optimization::minimizer::traits::OptimizerBackend).
//! These helpers hide Argmin's generic wiring and apply the typed options so
//! higher-level code can request a configured solver without touching
//! Argmin-specific types.
//!
//! Key behaviors
//! -------------
//! - Construct L-BFGS solvers with either Hager–Zhang or More–Thuente line
//!   search, then apply optional gradient/cost tolerances via
//!   [`configure_lbfgs`].
//! - Construct a Nelder–Mead solver from an initial simplex built around
//!   the starting point, the way common scientific libraries do: one vertex
//!   at `θ₀` plus one per coordinate, perturbed by `initial_step · |θ₀ᵢ|`
//!   (or a small absolute step when `θ₀ᵢ = 0`).
//!
//! Invariants & assumptions
//! ------------------------
//! - Builders do not set the initial parameter vector or `max_iters`; the
//!   runner applies those.
//! - Invalid tolerances rejected by Argmin surface as [`OptError`] through
//!   the crate's `From<Error>` implementation.
//!
//! [`OptError`]: crate::optimization::errors::OptError
use argmin::solver::quasinewton::LBFGS;

use crate::optimization::{
    errors::OptResult,
    minimizer::{
        traits::{LbfgsOptions, NelderMeadOptions},
        types::{
            Cost, Grad, HagerZhangLS, LbfgsHagerZhang, LbfgsMoreThuente, MoreThuenteLS,
            NelderMeadSimplex, Theta,
        },
    },
};

/// Absolute simplex step used for coordinates that start at exactly zero.
pub const ZERO_COORD_STEP: f64 = 0.00025;

/// Construct L-BFGS with Hager–Zhang line search.
///
/// # Errors
/// `OptError` (via `From<argmin::core::Error>`) if Argmin rejects a
/// tolerance.
pub fn build_lbfgs_hager_zhang(opts: &LbfgsOptions) -> OptResult<LbfgsHagerZhang> {
    let lbfgs = LbfgsHagerZhang::new(HagerZhangLS::new(), opts.memory());
    configure_lbfgs(lbfgs, opts)
}

/// Construct L-BFGS with More–Thuente line search.
///
/// # Errors
/// `OptError` (via `From<argmin::core::Error>`) if Argmin rejects a
/// tolerance.
pub fn build_lbfgs_more_thuente(opts: &LbfgsOptions) -> OptResult<LbfgsMoreThuente> {
    let lbfgs = LbfgsMoreThuente::new(MoreThuenteLS::new(), opts.memory());
    configure_lbfgs(lbfgs, opts)
}

/// Apply optional tolerances to an L-BFGS solver, whatever its line search.
///
/// When a tolerance is `None` the corresponding `with_tolerance_*` method is
/// not called and Argmin's default remains in effect.
pub fn configure_lbfgs<L>(
    mut solver: LBFGS<L, Theta, Grad, Cost>, opts: &LbfgsOptions,
) -> OptResult<LBFGS<L, Theta, Grad, Cost>> {
    if let Some(g) = opts.tols.tol_grad {
        solver = solver.with_tolerance_grad(g)?;
    }
    if let Some(c) = opts.tols.tol_cost {
        solver = solver.with_tolerance_cost(c)?;
    }
    Ok(solver)
}

/// Initial simplex around `theta0`: `theta0` itself plus one perturbed
/// vertex per coordinate.
pub fn initial_simplex(theta0: &Theta, initial_step: f64) -> Vec<Theta> {
    let mut vertices = Vec::with_capacity(theta0.len() + 1);
    vertices.push(theta0.clone());
    for i in 0..theta0.len() {
        let mut vertex = theta0.clone();
        vertex[i] = if vertex[i] != 0.0 {
            vertex[i] * (1.0 + initial_step)
        } else {
            ZERO_COORD_STEP
        };
        vertices.push(vertex);
    }
    vertices
}

/// Construct a Nelder–Mead solver started around `theta0`.
///
/// # Errors
/// `OptError` if Argmin rejects the standard-deviation tolerance.
pub fn build_nelder_mead(theta0: &Theta, opts: &NelderMeadOptions) -> OptResult<NelderMeadSimplex> {
    let solver = NelderMeadSimplex::new(initial_simplex(theta0, opts.initial_step))
        .with_sd_tolerance(opts.sd_tolerance)?;
    Ok(solver)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::optimization::minimizer::traits::{LineSearcher, Tolerances};
    use ndarray::array;

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // These tests cover:
    // - Construction of both L-BFGS variants with and without explicit memory.
    // - Tolerance wiring through `configure_lbfgs`.
    // - Shape of the Nelder–Mead initial simplex.
    //
    // End-to-end solver behavior is tested in `api`.
    // -------------------------------------------------------------------------

    #[test]
    // Purpose
    // -------
    // Both L-BFGS builders succeed with default and explicit memory.
    fn lbfgs_builders_accept_valid_options() {
        let tols = Tolerances::new(Some(1e-6), Some(1e-8), Some(50)).unwrap();
        let opts = LbfgsOptions::new(tols, LineSearcher::HagerZhang, None, false).unwrap();
        assert!(build_lbfgs_hager_zhang(&opts).is_ok());
        assert!(build_lbfgs_more_thuente(&opts).is_ok());

        let opts = LbfgsOptions::new(tols, LineSearcher::MoreThuente, Some(11), false).unwrap();
        assert!(build_lbfgs_more_thuente(&opts).is_ok());
    }

    #[test]
    // Purpose
    // -------
    // `configure_lbfgs` leaves Argmin defaults in place when both tolerances
    // are absent.
    fn configure_lbfgs_respects_absent_tolerances() {
        let raw = LBFGS::new(MoreThuenteLS::new(), 7);
        let tols = Tolerances::new(None, None, Some(50)).unwrap();
        let opts = LbfgsOptions::new(tols, LineSearcher::MoreThuente, None, false).unwrap();
        assert!(configure_lbfgs(raw, &opts).is_ok());
    }

    #[test]
    // Purpose
    // -------
    // The simplex has n + 1 vertices, each differing from θ₀ in at most one
    // coordinate by the relative step (or the absolute step at zero).
    fn initial_simplex_perturbs_one_coordinate_per_vertex() {
        let theta0 = array![2.0, 0.0, -4.0];
        let simplex = initial_simplex(&theta0, 0.05);
        assert_eq!(simplex.len(), 4);
        assert_eq!(simplex[0], theta0);
        assert_eq!(simplex[1], array![2.1, 0.0, -4.0]);
        assert_eq!(simplex[2], array![2.0, ZERO_COORD_STEP, -4.0]);
        assert_eq!(simplex[3], array![2.0, 0.0, -4.2]);
        assert!(build_nelder_mead(&theta0, &NelderMeadOptions::default()).is_ok());
    }
}
