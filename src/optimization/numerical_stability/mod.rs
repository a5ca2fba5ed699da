//! numerical_stability — guarded nonlinear maps for bounded optimization.
//!
//! Purpose
//! -------
//! Provide overflow-safe softplus/logistic transforms and their inverses,
//! used by the minimizer to map unconstrained solver coordinates into
//! parameter intervals.
//!
//! Downstream usage
//! ----------------
//! - [`BoundTransform`](crate::optimization::minimizer::bounds::BoundTransform)
//!   builds its one- and two-sided maps on these primitives.

pub mod transformations;

pub use self::transformations::{
    LOGIT_EPS, safe_logistic, safe_logit, safe_softplus, safe_softplus_deriv, safe_softplus_inv,
};

pub mod prelude {
    pub use super::transformations::{
        safe_logistic, safe_logit, safe_softplus, safe_softplus_inv,
    };
}
