//! Mean squared error of the closed-form response.
//!
//! The cost is `trace(eᵀe) / N` when the residual is `N × 2` and `eᵀe / N`
//! when it is a vector; both are sums of squares over every channel,
//! averaged over the `N` time samples.
use crate::{
    estimation::{
        data::FitData,
        error_fn::{ErrorFunctional, closed_form_residual, sum_of_squares},
    },
    thermal::{errors::ThermalResult, params::TargetParams, state_space::OutputMode},
};

#[derive(Debug, Clone, Copy)]
pub struct SquaredError<'a> {
    data: &'a FitData,
    mode: OutputMode,
}

impl<'a> SquaredError<'a> {
    /// # Errors
    /// `ShapeMismatch` if `y` does not have the layout of `mode`.
    pub fn new(data: &'a FitData, mode: OutputMode) -> ThermalResult<Self> {
        data.check_mode(mode)?;
        Ok(Self { data, mode })
    }
}

impl ErrorFunctional for SquaredError<'_> {
    fn evaluate(&self, params: &TargetParams) -> ThermalResult<f64> {
        let residual = closed_form_residual(self.data, self.mode, params)?;
        Ok(sum_of_squares(&residual) / self.data.len() as f64)
    }

    fn name(&self) -> &'static str {
        "squared"
    }
}
