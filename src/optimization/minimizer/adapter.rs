//! Adapter that exposes a user [`Objective`] as a bounded `argmin` problem.
//!
//! The solver works in unconstrained coordinates `θ`; every evaluation maps
//! `θ` into the bounded space with the [`BoundTransform`] before calling the
//! objective. Analytic gradients are chained through the diagonal Jacobian of
//! the transform; otherwise the composed cost is finite-differenced directly
//! in `θ`.
use std::cell::RefCell;

use crate::optimization::{
    errors::OptError,
    minimizer::{
        bounds::BoundTransform,
        traits::Objective,
        types::{Cost, Grad, Theta},
        validation::validate_grad,
    },
};
use argmin::core::{CostFunction, Error, Gradient};
use finitediff::FiniteDiff;

/// Bridges a user [`Objective`] and a [`BoundTransform`] to `argmin`'s
/// `CostFunction` and `Gradient`.
pub struct ObjectiveAdapter<'a> {
    pub f: &'a dyn Objective,
    pub transform: &'a BoundTransform,
}

impl<'a> CostFunction for ObjectiveAdapter<'a> {
    type Param = Theta;
    type Output = Cost;

    /// Evaluate `c(x(θ))`.
    ///
    /// # Errors
    /// Propagates the objective's error; returns `NonFiniteCost` if the
    /// value is NaN/±inf.
    fn cost(&self, theta: &Self::Param) -> Result<Self::Output, Error> {
        let x = self.transform.to_constrained(theta);
        let output = self.f.value(&x)?;
        if !output.is_finite() {
            return Err((OptError::NonFiniteCost { value: output }).into());
        }
        Ok(output)
    }
}

impl<'a> Gradient for ObjectiveAdapter<'a> {
    type Param = Theta;
    type Gradient = Grad;

    /// Evaluate `∂c/∂θ`.
    ///
    /// Behavior:
    /// - If the objective implements `grad(x)`, validate it and multiply by
    ///   `dx/dθ`.
    /// - Otherwise finite-difference the composed cost:
    ///   - Try *central* differences first.
    ///   - If any cost evaluation failed, or the result is not finite, retry
    ///     with *forward* differences.
    ///
    /// The FD closure must return `f64`, so the first error it meets is
    /// stashed in `closure_err` and `NaN` is returned in its place.
    fn gradient(&self, theta: &Self::Param) -> Result<Self::Gradient, Error> {
        let dim = theta.len();
        match self.f.grad(&self.transform.to_constrained(theta)) {
            Ok(g) => {
                validate_grad(&g, dim)?;
                Ok(g * self.transform.jacobian_diag(theta))
            }
            Err(OptError::GradientNotImplemented) => {
                let closure_err: RefCell<Option<Error>> = RefCell::new(None);
                let cost_func = |theta: &Theta| -> f64 {
                    match self.cost(theta) {
                        Ok(val) => val,
                        Err(e) => {
                            let mut slot = closure_err.borrow_mut();
                            if slot.is_none() {
                                *slot = Some(e);
                            }
                            f64::NAN
                        }
                    }
                };
                let fd_grad = theta.central_diff(&cost_func);
                if closure_err.borrow().is_some() || validate_grad(&fd_grad, dim).is_err() {
                    return run_fd_diff(theta, &cost_func, &closure_err);
                }
                Ok(fd_grad)
            }
            Err(e) => Err(e.into()),
        }
    }
}

impl<'a> ObjectiveAdapter<'a> {
    pub fn new(f: &'a dyn Objective, transform: &'a BoundTransform) -> Self {
        Self { f, transform }
    }
}

/// Forward-difference gradient of `func` at `theta`, with error capture.
///
/// Clears `closure_err`, runs `forward_diff`, returns any captured error,
/// then validates the result.
fn run_fd_diff<G: Fn(&Theta) -> f64>(
    theta: &Theta, func: &G, closure_err: &RefCell<Option<Error>>,
) -> Result<Grad, Error> {
    closure_err.replace(None);
    let fd_grad = theta.forward_diff(func);
    if let Some(err) = closure_err.take() {
        return Err(err);
    }
    validate_grad(&fd_grad, theta.len())?;
    Ok(fd_grad)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::optimization::{
        errors::OptResult,
        minimizer::bounds::Bounds,
    };
    use approx::assert_relative_eq;
    use ndarray::array;

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // These tests cover:
    // - Cost evaluation through the bound transform.
    // - Analytic gradients chained through the Jacobian versus FD gradients.
    // - Error propagation from the objective.
    // -------------------------------------------------------------------------

    struct Quadratic {
        target: Theta,
        analytic: bool,
    }

    impl Objective for Quadratic {
        fn value(&self, x: &Theta) -> OptResult<Cost> {
            Ok((x - &self.target).mapv(|d| d * d).sum())
        }

        fn grad(&self, x: &Theta) -> OptResult<Grad> {
            if self.analytic {
                Ok((x - &self.target) * 2.0)
            } else {
                Err(OptError::GradientNotImplemented)
            }
        }
    }

    struct Failing;

    impl Objective for Failing {
        fn value(&self, _x: &Theta) -> OptResult<Cost> {
            Err(OptError::BackendError { text: "boom".into() })
        }
    }

    #[test]
    // Purpose
    // -------
    // Analytic and finite-difference gradients agree in θ-space.
    //
    // Given
    // -----
    // - A quadratic with a positive target and the default lower bound.
    //
    // Expect
    // ------
    // - Chained analytic gradient ≈ FD gradient to 1e-5 relative.
    fn analytic_and_fd_gradients_agree() {
        // Arrange
        let x0 = array![2.0, 0.5];
        let tr = BoundTransform::new(&Bounds::default(), &x0).unwrap();
        let theta = tr.to_unconstrained(&x0);
        let analytic = Quadratic { target: array![1.0, 3.0], analytic: true };
        let numeric = Quadratic { target: array![1.0, 3.0], analytic: false };

        // Act
        let g_a = ObjectiveAdapter::new(&analytic, &tr).gradient(&theta).unwrap();
        let g_n = ObjectiveAdapter::new(&numeric, &tr).gradient(&theta).unwrap();

        // Assert
        for (a, n) in g_a.iter().zip(g_n.iter()) {
            assert_relative_eq!(*a, *n, max_relative = 1e-5);
        }
        let c = ObjectiveAdapter::new(&analytic, &tr).cost(&theta).unwrap();
        assert_relative_eq!(c, 1.0 + 6.25, max_relative = 1e-10);
    }

    #[test]
    // Purpose
    // -------
    // Objective errors surface from both cost and FD gradient evaluation.
    fn objective_errors_propagate() {
        let x0 = array![1.0];
        let tr = BoundTransform::new(&Bounds::default(), &x0).unwrap();
        let adapter = ObjectiveAdapter::new(&Failing, &tr);
        let theta = tr.to_unconstrained(&x0);

        let err = OptError::from(adapter.cost(&theta).unwrap_err());
        assert_eq!(err, OptError::BackendError { text: "boom".into() });
        let err = OptError::from(adapter.gradient(&theta).unwrap_err());
        assert_eq!(err, OptError::BackendError { text: "boom".into() });
    }
}
