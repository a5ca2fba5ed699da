//! Post-fit evaluation and diagnostics.
//!
//! [`Evaluator`] binds `(y, u, t, x0, mode)` and maps fitted parameters to an
//! [`EvaluationReport`]: expected and obtained outputs, their residual and
//! the full state trajectory. It is meant for reporting after a fit, not for
//! the optimizer loop.
use crate::{
    estimation::data::FitData,
    thermal::{
        errors::ThermalResult,
        params::{TargetParams, TargetParamsExtended},
        response::{LtiResponse, target_response, target_response_with_offset},
        series::OutputSeries,
        state_space::{OutputMode, StateSpace},
    },
};
use ndarray::{Array2, Axis};

/// Expected vs. modeled outputs for one parameter set.
#[derive(Debug, Clone, PartialEq)]
pub struct EvaluationReport {
    pub expected: OutputSeries,
    pub obtained: OutputSeries,
    /// `expected − obtained`.
    pub residual: OutputSeries,
    /// State trajectory, `N × 2` (core, air).
    pub states: Array2<f64>,
}

impl EvaluationReport {
    /// Mean of the squared residual over every sample and channel.
    pub fn mse(&self) -> f64 {
        let count = self.residual.len() * self.residual.n_channels();
        self.residual.iter().map(|e| e * e).sum::<f64>() / count as f64
    }

    /// Mean squared residual of each output channel.
    pub fn channel_mse(&self) -> Vec<f64> {
        self.residual
            .as_matrix()
            .map(|e| e * e)
            .mean_axis(Axis(0))
            .map(|m| m.to_vec())
            .unwrap_or_default()
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Evaluator<'a> {
    data: &'a FitData,
    mode: OutputMode,
}

impl<'a> Evaluator<'a> {
    /// # Errors
    /// `ShapeMismatch` if `y` does not have the layout of `mode`.
    pub fn new(data: &'a FitData, mode: OutputMode) -> ThermalResult<Self> {
        data.check_mode(mode)?;
        Ok(Self { data, mode })
    }

    /// Recompute the closed-form response for `params` and compare.
    ///
    /// # Errors
    /// Parameter validation and response errors.
    pub fn evaluate(&self, params: &TargetParams) -> ThermalResult<EvaluationReport> {
        let response = target_response(
            params,
            self.mode,
            self.data.u.view(),
            self.data.t.view(),
            self.data.x0.view(),
        )?;
        self.report(response)
    }

    /// As [`evaluate`](Self::evaluate), for parameters with an output offset.
    pub fn evaluate_extended(
        &self, params: &TargetParamsExtended,
    ) -> ThermalResult<EvaluationReport> {
        let response = target_response_with_offset(
            params,
            self.mode,
            self.data.u.view(),
            self.data.t.view(),
            self.data.x0.view(),
        )?;
        self.report(response)
    }

    /// Whether the two-state system is observable from this evaluator's
    /// outputs, `rank([C; C·A]) == 2`.
    ///
    /// # Errors
    /// Parameter validation errors.
    pub fn is_observable(&self, params: &TargetParams) -> ThermalResult<bool> {
        Ok(StateSpace::new(params, self.mode)?.is_observable())
    }

    fn report(&self, response: LtiResponse) -> ThermalResult<EvaluationReport> {
        let LtiResponse { outputs, states } = response;
        let residual = self.data.y.residual(&outputs)?;
        Ok(EvaluationReport { expected: self.data.y.clone(), obtained: outputs, residual, states })
    }
}
