//! Box bounds and the smooth reparameterization that enforces them.
//!
//! Purpose
//! -------
//! Argmin's L-BFGS and Nelder–Mead solvers are unconstrained. Bounds are
//! therefore enforced by optimizing over unconstrained coordinates `θ` and
//! mapping each one into its interval:
//!
//! | bounds            | map `x(θ)`                        |
//! |-------------------|-----------------------------------|
//! | `(l, +∞)`         | `l + s·softplus(θ)`               |
//! | `(−∞, u)`         | `u − s·softplus(θ)`               |
//! | `(l, u)`          | `l + (u − l)·logistic(θ)`         |
//! | `(−∞, +∞)`        | `s·θ`                             |
//!
//! The scale `s` is taken from the starting point (its distance to the
//! finite bound, or its magnitude), so every solver coordinate starts at
//! O(1) regardless of the physical units of the parameter.
//!
//! Invariants & assumptions
//! ------------------------
//! - The starting point must lie strictly inside the bounds; boundary
//!   values have no finite preimage.
//! - `x(θ)` is monotone and smooth, so gradients chain through
//!   [`BoundTransform::jacobian_diag`].
use crate::optimization::{
    errors::{OptError, OptResult},
    minimizer::types::Theta,
    numerical_stability::{
        safe_logistic, safe_logit, safe_softplus, safe_softplus_deriv, safe_softplus_inv,
    },
};
use ndarray::Array1;
use serde::{Deserialize, Serialize};

/// Default lower bound applied to every free parameter.
pub const DEFAULT_LOWER_BOUND: f64 = 1e-12;

/// Bounds applied to every coordinate of the search vector.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub lower: f64,
    pub upper: f64,
}

impl Default for Bounds {
    fn default() -> Self {
        Self { lower: DEFAULT_LOWER_BOUND, upper: f64::INFINITY }
    }
}

impl Bounds {
    /// Validated constructor.
    ///
    /// # Errors
    /// [`OptError::InvalidBounds`] if either end is NaN or `lower >= upper`.
    pub fn new(lower: f64, upper: f64) -> OptResult<Self> {
        let bounds = Self { lower, upper };
        bounds.validate()?;
        Ok(bounds)
    }

    /// No constraint at all.
    pub fn unbounded() -> Self {
        Self { lower: f64::NEG_INFINITY, upper: f64::INFINITY }
    }

    pub fn validate(&self) -> OptResult<()> {
        if self.lower.is_nan() || self.upper.is_nan() {
            return Err(OptError::InvalidBounds {
                lower: self.lower,
                upper: self.upper,
                reason: "Bounds must not be NaN.",
            });
        }
        if self.lower >= self.upper {
            return Err(OptError::InvalidBounds {
                lower: self.lower,
                upper: self.upper,
                reason: "Lower bound must be strictly below the upper bound.",
            });
        }
        Ok(())
    }

    /// `true` when `x` lies strictly inside the bounds.
    pub fn contains(&self, x: f64) -> bool {
        x.is_finite() && x > self.lower && x < self.upper
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum CoordMap {
    Lower { lower: f64, scale: f64 },
    Upper { upper: f64, scale: f64 },
    Interval { lower: f64, upper: f64 },
    Free { scale: f64 },
}

impl CoordMap {
    fn forward(&self, theta: f64) -> f64 {
        match *self {
            CoordMap::Lower { lower, scale } => lower + scale * safe_softplus(theta),
            CoordMap::Upper { upper, scale } => upper - scale * safe_softplus(theta),
            CoordMap::Interval { lower, upper } => {
                (lower + (upper - lower) * safe_logistic(theta)).clamp(lower, upper)
            }
            CoordMap::Free { scale } => scale * theta,
        }
    }

    fn inverse(&self, x: f64) -> f64 {
        match *self {
            CoordMap::Lower { lower, scale } => safe_softplus_inv((x - lower) / scale),
            CoordMap::Upper { upper, scale } => safe_softplus_inv((upper - x) / scale),
            CoordMap::Interval { lower, upper } => safe_logit((x - lower) / (upper - lower)),
            CoordMap::Free { scale } => x / scale,
        }
    }

    fn derivative(&self, theta: f64) -> f64 {
        match *self {
            CoordMap::Lower { scale, .. } => scale * safe_softplus_deriv(theta),
            CoordMap::Upper { scale, .. } => -scale * safe_softplus_deriv(theta),
            CoordMap::Interval { lower, upper } => {
                let s = safe_logistic(theta);
                (upper - lower) * s * (1.0 - s)
            }
            CoordMap::Free { scale } => scale,
        }
    }
}

/// Per-coordinate map between solver space `θ` and bounded space `x`.
#[derive(Debug, Clone, PartialEq)]
pub struct BoundTransform {
    maps: Vec<CoordMap>,
}

impl BoundTransform {
    /// Build the transform for `bounds`, scaled around the starting point.
    ///
    /// # Errors
    /// - [`OptError::InvalidBounds`] for malformed bounds.
    /// - [`OptError::EmptyInitialPoint`] when `x0` is empty.
    /// - [`OptError::InitialOutsideBounds`] for the first coordinate of `x0`
    ///   that is non-finite or not strictly inside the bounds.
    pub fn new(bounds: &Bounds, x0: &Theta) -> OptResult<Self> {
        bounds.validate()?;
        if x0.is_empty() {
            return Err(OptError::EmptyInitialPoint);
        }
        let Bounds { lower, upper } = *bounds;
        let mut maps = Vec::with_capacity(x0.len());
        for (index, &value) in x0.iter().enumerate() {
            if !bounds.contains(value) {
                return Err(OptError::InitialOutsideBounds { index, value, lower, upper });
            }
            let map = match (lower.is_finite(), upper.is_finite()) {
                (true, true) => CoordMap::Interval { lower, upper },
                (true, false) => CoordMap::Lower { lower, scale: value - lower },
                (false, true) => CoordMap::Upper { upper, scale: upper - value },
                (false, false) => {
                    CoordMap::Free { scale: if value != 0.0 { value.abs() } else { 1.0 } }
                }
            };
            maps.push(map);
        }
        Ok(Self { maps })
    }

    pub fn dim(&self) -> usize {
        self.maps.len()
    }

    /// Map bounded values into solver coordinates.
    pub fn to_unconstrained(&self, x: &Theta) -> Theta {
        self.maps.iter().zip(x.iter()).map(|(map, &v)| map.inverse(v)).collect()
    }

    /// Map solver coordinates into bounded values.
    pub fn to_constrained(&self, theta: &Theta) -> Theta {
        self.maps.iter().zip(theta.iter()).map(|(map, &t)| map.forward(t)).collect()
    }

    /// Diagonal of `dx/dθ`, used to chain analytic gradients.
    pub fn jacobian_diag(&self, theta: &Theta) -> Array1<f64> {
        self.maps.iter().zip(theta.iter()).map(|(map, &t)| map.derivative(t)).collect()
    }
}
