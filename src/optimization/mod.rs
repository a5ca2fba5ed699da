//! optimization — bounded minimizers, numerical helpers, and error surface.
//!
//! Purpose
//! -------
//! Provide the optimization layer used to identify thermal parameters:
//! an Argmin-backed bounded minimizer, numerically stable transforms for
//! the bound reparameterization, and a single error/result surface.
//!
//! Key behaviors
//! -------------
//! - `minimizer`: the [`Objective`](minimizer::Objective) /
//!   [`Minimizer`](minimizer::Minimizer) contracts and the built-in
//!   L-BFGS and Nelder–Mead backends.
//! - `numerical_stability`: overflow-safe softplus and logistic maps.
//! - `errors`: configuration issues, numerical failures, model errors and
//!   backend solver errors normalized into [`OptError`](errors::OptError).
//!
//! Conventions
//! -----------
//! - The cost is minimized as given; there is no sign flip.
//! - Public entrypoints that can fail return `OptResult<T>`; callers never
//!   see raw Argmin errors.

pub mod errors;
pub mod minimizer;
pub mod numerical_stability;

pub mod prelude {
    pub use super::errors::{OptError, OptResult};
    pub use super::minimizer::prelude::*;
    pub use super::numerical_stability::prelude::*;
}
