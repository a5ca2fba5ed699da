//! Contract for the external nonlinear simulation engine and the typed
//! configuration of the simulation-backed error functional.
//!
//! Purpose
//! -------
//! The simulation-backed functional delegates the modeled surface
//! temperature to an engine the caller has already started. The core only
//! depends on the two-operation [`SimulationEngine`] contract; it never owns
//! or tears down the engine.
//!
//! Conventions
//! -----------
//! - Candidate parameters are passed as `cp, cair, rair, rin, rout`.
//! - Initial conditions use the keys `initial_soc`, `initial_in_temp` and
//!   (for two-output fits) `initial_air_temp`.
//! - Constants use the keys `internal_resistance` and `nominal_capacity`.
//! - `evaluate_model` returns one row per sample with columns
//!   `[time, internal_temperature, surface_temperature, ...]`.
use std::{collections::BTreeMap, fmt, sync::Arc};

use crate::{
    estimation::data::FitData,
    thermal::{
        errors::{ThermalError, ThermalResult},
        params::TargetParams,
    },
};
use ndarray::{Array2, ArrayView1};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Column of the engine output holding the surface temperature.
pub const SURFACE_TEMPERATURE_COLUMN: usize = 2;

/// Name → value map exchanged with the engine.
pub type NamedValues = BTreeMap<String, f64>;

/// Identifier of a model known to the engine.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ModelId(pub String);

impl From<&str> for ModelId {
    fn from(name: &str) -> Self {
        ModelId(name.to_string())
    }
}

/// Opaque handle to loaded simulation inputs, issued by the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SimulationHandle(pub u64);

/// External engine able to simulate the nonlinear cell model.
///
/// Implementations report their own failures as
/// [`ThermalError::SimulationFailed`]; the error functional passes them
/// through unmodified.
pub trait SimulationEngine: Send + Sync {
    /// Load the input signals for `model` and return a handle to them.
    fn load_model(
        &self, model: &ModelId, time_step: f64, end_time: f64, t: ArrayView1<'_, f64>,
        power: ArrayView1<'_, f64>, ambient: ArrayView1<'_, f64>,
    ) -> ThermalResult<SimulationHandle>;

    /// Run one simulation with candidate parameters.
    fn evaluate_model(
        &self, model: &ModelId, handle: SimulationHandle, params: &NamedValues,
        initial_conditions: &NamedValues, constants: &NamedValues,
    ) -> ThermalResult<Array2<f64>>;
}

/// Settings for the simulation-backed squared error.
///
/// Defaults for the physical constants are `0.0` and the gain is `1.0`.
#[derive(Clone)]
pub struct SimulationConfig {
    pub engine: Arc<dyn SimulationEngine>,
    pub model: ModelId,
    pub handle: SimulationHandle,
    /// State of charge at `t[0]`, in `[0, 1]`.
    pub initial_soc: f64,
    pub internal_resistance: f64,
    pub nominal_capacity: f64,
    /// Multiplier applied to the mean squared error.
    pub gain: f64,
}

impl fmt::Debug for SimulationConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SimulationConfig")
            .field("model", &self.model)
            .field("handle", &self.handle)
            .field("initial_soc", &self.initial_soc)
            .field("internal_resistance", &self.internal_resistance)
            .field("nominal_capacity", &self.nominal_capacity)
            .field("gain", &self.gain)
            .finish_non_exhaustive()
    }
}

impl SimulationConfig {
    /// # Errors
    /// [`ThermalError::InvalidSimulationConfig`] (see [`validate`](Self::validate)).
    pub fn new(
        engine: Arc<dyn SimulationEngine>, model: ModelId, handle: SimulationHandle,
        initial_soc: f64,
    ) -> ThermalResult<Self> {
        let config = Self {
            engine,
            model,
            handle,
            initial_soc,
            internal_resistance: 0.0,
            nominal_capacity: 0.0,
            gain: 1.0,
        };
        config.validate()?;
        Ok(config)
    }

    /// Load `data` into the engine and build a configuration around the
    /// returned handle.
    ///
    /// The time step and end time come from `t`; power is column 1 of `u`
    /// and ambient temperature column 0.
    ///
    /// # Errors
    /// Engine failures from `load_model`, then validation errors.
    pub fn load(
        engine: Arc<dyn SimulationEngine>, model: ModelId, data: &FitData, initial_soc: f64,
    ) -> ThermalResult<Self> {
        debug!(model = %model.0, samples = data.len(), "loading simulation inputs");
        let handle = engine.load_model(
            &model,
            data.dt(),
            data.end_time(),
            data.t.view(),
            data.power(),
            data.ambient(),
        )?;
        Self::new(engine, model, handle, initial_soc)
    }

    /// # Errors
    /// [`ThermalError::InvalidSimulationConfig`] for invalid constants.
    pub fn with_constants(
        mut self, internal_resistance: f64, nominal_capacity: f64,
    ) -> ThermalResult<Self> {
        self.internal_resistance = internal_resistance;
        self.nominal_capacity = nominal_capacity;
        self.validate()?;
        Ok(self)
    }

    /// # Errors
    /// [`ThermalError::InvalidSimulationConfig`] for a non-positive gain.
    pub fn with_gain(mut self, gain: f64) -> ThermalResult<Self> {
        self.gain = gain;
        self.validate()?;
        Ok(self)
    }

    /// Check the scalar settings.
    ///
    /// # Errors
    /// [`ThermalError::InvalidSimulationConfig`] when `initial_soc` is outside
    /// `[0, 1]`, a constant is negative or non-finite, or `gain` is not
    /// finite and positive.
    pub fn validate(&self) -> ThermalResult<()> {
        if !(0.0..=1.0).contains(&self.initial_soc) {
            return Err(ThermalError::InvalidSimulationConfig {
                reason: "initial_soc must lie in [0, 1].",
            });
        }
        if !self.internal_resistance.is_finite() || self.internal_resistance < 0.0 {
            return Err(ThermalError::InvalidSimulationConfig {
                reason: "internal_resistance must be finite and >= 0.",
            });
        }
        if !self.nominal_capacity.is_finite() || self.nominal_capacity < 0.0 {
            return Err(ThermalError::InvalidSimulationConfig {
                reason: "nominal_capacity must be finite and >= 0.",
            });
        }
        if !self.gain.is_finite() || self.gain <= 0.0 {
            return Err(ThermalError::InvalidSimulationConfig {
                reason: "gain must be finite and > 0.",
            });
        }
        Ok(())
    }

    /// Physical constants handed to every evaluation.
    pub fn constants(&self) -> NamedValues {
        BTreeMap::from([
            ("internal_resistance".to_string(), self.internal_resistance),
            ("nominal_capacity".to_string(), self.nominal_capacity),
        ])
    }
}

/// Candidate parameters as the engine expects them.
pub fn named_params(params: &TargetParams) -> NamedValues {
    params.named().into_iter().map(|(name, value)| (name.to_string(), value)).collect()
}
