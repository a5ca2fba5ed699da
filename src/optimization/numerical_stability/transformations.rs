//! Numerical stability utilities.
//!
//! Safe implementations of the nonlinear maps used to keep optimizer
//! coordinates unconstrained while the physical parameters stay inside their
//! bounds. Each guard uses an explicit cutoff (`|x| > 20.0`) to keep `f64`
//! arithmetic in a well-conditioned regime.
//!
//! # Provided items
//! - [`safe_softplus`] / [`safe_softplus_inv`]: ℝ ↔ (0, ∞).
//! - [`safe_logistic`] / [`safe_logit`]: ℝ ↔ (0, 1).
//! - [`LOGIT_EPS`]: clamp used by [`safe_logit`] at the edges of (0, 1).

/// Clamp applied to logistic inputs/outputs near 0 and 1.
pub const LOGIT_EPS: f64 = 1e-15;

/// Numerically stable softplus: `softplus(x) = ln(1 + exp(x))`.
///
/// - For sufficiently large `x`, `softplus(x) ≈ x`.
/// - Otherwise `ln1p(exp(x))`, which is accurate for large negative `x`.
pub fn safe_softplus(x: f64) -> f64 {
    if x > 20.0 { x } else { x.exp().ln_1p() }
}

/// Stable inverse of softplus on `(0, ∞)`: `t = ln(exp(x) - 1)`.
///
/// For large `x` returns `x`; otherwise `ln(expm1(x))`. Inputs must be
/// finite and `> 0`.
pub fn safe_softplus_inv(x: f64) -> f64 {
    if x > 20.0 { x } else { x.exp_m1().ln() }
}

/// Derivative of softplus, i.e. the logistic function.
pub fn safe_softplus_deriv(x: f64) -> f64 {
    safe_logistic(x)
}

/// Numerically stable logistic: `1 / (1 + exp(-x))`.
///
/// Evaluated through `exp(-|x|)` so neither branch overflows.
pub fn safe_logistic(x: f64) -> f64 {
    if x >= 0.0 {
        1.0 / (1.0 + (-x).exp())
    } else {
        let e = x.exp();
        e / (1.0 + e)
    }
}

/// Inverse of [`safe_logistic`] on `(0, 1)`: `ln(p / (1 - p))`.
///
/// `p` is clamped to `[LOGIT_EPS, 1 - LOGIT_EPS]` so boundary inputs map to
/// large finite values instead of ±∞.
pub fn safe_logit(p: f64) -> f64 {
    let p = p.clamp(LOGIT_EPS, 1.0 - LOGIT_EPS);
    p.ln() - (-p).ln_1p()
}
