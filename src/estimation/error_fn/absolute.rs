//! Mean absolute error of the closed-form response.
use crate::{
    estimation::{
        data::FitData,
        error_fn::{ErrorFunctional, closed_form_residual},
    },
    thermal::{errors::ThermalResult, params::TargetParams, state_space::OutputMode},
};

/// `Σ|y − ŷ| / N`, summed over every output channel and averaged over the
/// `N` time samples.
#[derive(Debug, Clone, Copy)]
pub struct AbsoluteError<'a> {
    data: &'a FitData,
    mode: OutputMode,
}

impl<'a> AbsoluteError<'a> {
    /// # Errors
    /// `ShapeMismatch` if `y` does not have the layout of `mode`.
    pub fn new(data: &'a FitData, mode: OutputMode) -> ThermalResult<Self> {
        data.check_mode(mode)?;
        Ok(Self { data, mode })
    }
}

impl ErrorFunctional for AbsoluteError<'_> {
    fn evaluate(&self, params: &TargetParams) -> ThermalResult<f64> {
        let residual = closed_form_residual(self.data, self.mode, params)?;
        Ok(residual.iter().map(|e| e.abs()).sum::<f64>() / self.data.len() as f64)
    }

    fn name(&self) -> &'static str {
        "absolute"
    }
}
